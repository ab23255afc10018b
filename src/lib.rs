//! Extracción, clasificación y filtrado de metadata embebida en imágenes,
//! PDFs, documentos Office y paquetes XMP.
//!
//! Cada formato lo resuelve un [`analysers::Analyser`]; el [`registry::Registry`]
//! los ejecuta en orden fijo y [`aggregator::extract_metadata_of_file`] une sus
//! registros. Sobre esa lista uniforme trabajan los filtros de
//! [`processing`], los hechos derivados de [`facts`] y el [`presenter`].

pub mod aggregator;
pub mod analysers;
pub mod app;
pub mod config;
pub mod directory;
pub mod error;
pub mod facts;
pub mod presenter;
pub mod processing;
pub mod record;
pub mod registry;
pub mod taxonomy;

pub use aggregator::extract_metadata_of_file;
pub use error::MetadumpError;
pub use record::{FileResult, GpsCoordinate, MetadataRecord, Rational, TypedValue};
pub use taxonomy::{Category, CategorySet, Visibility};
