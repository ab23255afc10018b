//! Opciones de ejecución, con valores por defecto y carga desde JSON.

use crate::error::MetadumpError;
use crate::processing::{DEFAULT_LIMIT, ProcessingOptions};
use crate::taxonomy::{Category, CategorySet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Opciones de filtrado y presentación de una ejecución.
///
/// Los campos ausentes en el archivo toman el valor por defecto; los
/// argumentos de línea de comandos se aplican encima.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpOptions {
    pub verbosity: u8,
    pub categories: Vec<Category>,
    /// `0` desactiva el recorte de valores.
    pub limit: usize,
    pub order: bool,
    pub print_categories: bool,
    pub show_empty_files: bool,
    pub stream: bool,
    pub plugins: Vec<String>,
    pub recursive: bool,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            verbosity: 1,
            categories: Vec::new(),
            limit: DEFAULT_LIMIT,
            order: false,
            print_categories: false,
            show_empty_files: false,
            stream: false,
            plugins: Vec::new(),
            recursive: false,
        }
    }
}

impl DumpOptions {
    pub fn load(path: &Path) -> Result<Self, MetadumpError> {
        let contents = fs::read_to_string(path).map_err(|source| MetadumpError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| MetadumpError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn processing(&self) -> ProcessingOptions {
        ProcessingOptions {
            verbosity: self.verbosity.max(1),
            categories: (!self.categories.is_empty())
                .then(|| self.categories.iter().copied().collect::<CategorySet>()),
            limit: (self.limit > 0).then_some(self.limit),
        }
    }

    /// `None` ejecuta todos los analizadores.
    pub fn plugin_selection(&self) -> Option<&[String]> {
        (!self.plugins.is_empty()).then_some(self.plugins.as_slice())
    }
}
