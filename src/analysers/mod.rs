//! Analizadores de metadata, uno por familia de formato.
//!
//! Todos cumplen el mismo contrato: nunca fallan. Si el archivo no es del
//! formato esperado, está dañado o no se puede leer, devuelven una lista vacía.

mod gps;
mod image;
mod office;
mod pdf;
mod xmp;

pub use gps::dms_to_decimal;
pub use image::ExifAnalyser;
pub use office::OfficeAnalyser;
pub use pdf::PdfAnalyser;
pub use xmp::{XmpAnalyser, flatten_xmp_packet};

use crate::record::MetadataRecord;
use crate::taxonomy::{TagRule, classify};
use std::path::Path;

pub trait Analyser: Send + Sync {
    /// Identificador estable usado para seleccionar analizadores.
    fn name(&self) -> &'static str;

    /// Extrae los registros del archivo; vacío ante cualquier problema.
    fn extract(&self, path: &Path) -> Vec<MetadataRecord>;

    /// Con `false` el agregador no ejecuta el analizador.
    fn supports_platform(&self) -> bool {
        true
    }
}

/// Tripleta cruda antes de asignar categorías.
pub(crate) struct RawEntry {
    pub key: String,
    pub value: String,
    pub description: &'static str,
}

impl RawEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>, description: &'static str) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            description,
        }
    }
}

/// Asigna categorías y visibilidad a cada entrada según la tabla del analizador.
pub(crate) fn enrich_with_categories(
    table: &[TagRule],
    entries: Vec<RawEntry>,
) -> Vec<MetadataRecord> {
    entries
        .into_iter()
        .map(|entry| {
            let class = classify(table, &entry.key);
            MetadataRecord::new(entry.key, entry.value, entry.description, class)
        })
        .collect()
}
