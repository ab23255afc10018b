//! Modelo uniforme de registros de metadata compartido por todos los analizadores.

use crate::taxonomy::{Category, CategorySet, TagClass, Visibility};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Par numerador/denominador usado por EXIF para codificar fracciones.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Rational {
    pub num: u32,
    pub denom: u32,
}

impl Rational {
    pub fn new(num: u32, denom: u32) -> Self {
        Self { num, denom }
    }

    /// `None` cuando el denominador es cero.
    pub fn to_f64(self) -> Option<f64> {
        if self.denom == 0 {
            return None;
        }
        Some(f64::from(self.num) / f64::from(self.denom))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GpsCoordinate {
    pub degrees: f64,
    pub reference: char,
}

impl GpsCoordinate {
    pub fn new(degrees: f64, reference: char) -> Self {
        Self { degrees, reference }
    }
}

impl fmt::Display for GpsCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_decimal(self.degrees), self.reference)
    }
}

/// Texto de un decimal; los valores enteros conservan `.0` (`48.0`, no `48`).
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Valor numérico exacto que algunos analizadores conservan junto al texto.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TypedValue {
    Coordinate(GpsCoordinate),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MetadataRecord {
    pub key: String,
    pub value: String,
    pub description: String,
    pub categories: CategorySet,
    pub visibility: Visibility,
    #[serde(skip)]
    pub typed: Option<TypedValue>,
}

impl MetadataRecord {
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        description: impl Into<String>,
        class: TagClass,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description: description.into(),
            categories: class.categories,
            visibility: class.visibility,
            typed: None,
        }
    }

    pub fn with_typed(mut self, typed: TypedValue) -> Self {
        self.typed = Some(typed);
        self
    }

    pub fn has_category(&self, category: Category) -> bool {
        self.categories.contains(category)
    }

    pub fn coordinate(&self) -> Option<GpsCoordinate> {
        match self.typed {
            Some(TypedValue::Coordinate(coordinate)) => Some(coordinate),
            _ => None,
        }
    }
}

/// Registros de un archivo, en orden de analizador y luego de extracción.
#[derive(Clone, Debug, Serialize)]
pub struct FileResult {
    pub path: PathBuf,
    pub records: Vec<MetadataRecord>,
}

impl FileResult {
    pub fn new(path: impl Into<PathBuf>, records: Vec<MetadataRecord>) -> Self {
        Self {
            path: path.into(),
            records,
        }
    }
}
