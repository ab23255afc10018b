//! Errores de la herramienta.
//!
//! Los analizadores nunca devuelven errores; estos cubren la entrada del
//! usuario, la configuración y la exportación.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetadumpError {
    #[error("La ruta `{0}` no existe")]
    InputNotFound(PathBuf),

    #[error("No se pudo leer la configuración `{path}`: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuración inválida en `{path}`: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Formato de exportación no soportado: {0}")]
    UnsupportedExportFormat(String),

    #[error("No se pudo escribir `{path}`: {source}")]
    ExportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error al serializar JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error al escribir CSV: {0}")]
    Csv(#[from] csv::Error),
}
