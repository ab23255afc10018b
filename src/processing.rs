//! Filtros aplicados a los registros antes de mostrarlos.

use crate::record::MetadataRecord;
use crate::taxonomy::CategorySet;

pub const DEFAULT_LIMIT: usize = 30;

/// Parámetros de post-procesado: verbosidad, filtro de categorías y límite de longitud.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessingOptions {
    pub verbosity: u8,
    pub categories: Option<CategorySet>,
    /// `None` desactiva el recorte.
    pub limit: Option<usize>,
}

impl Default for ProcessingOptions {
    fn default() -> Self {
        Self {
            verbosity: 1,
            categories: None,
            limit: Some(DEFAULT_LIMIT),
        }
    }
}

impl ProcessingOptions {
    /// Visibilidad, luego categorías, luego longitud.
    pub fn apply(&self, records: &[MetadataRecord]) -> Vec<MetadataRecord> {
        let mut processed = filter_by_visibility(records, self.verbosity);
        if let Some(categories) = &self.categories {
            processed = filter_by_categories(&processed, categories);
        }
        if let Some(limit) = self.limit {
            processed = limit_length(&processed, limit);
        }
        processed
    }
}

/// Descarta registros por encima de `verbosity`; por debajo de 3 también los de valor vacío.
pub fn filter_by_visibility(records: &[MetadataRecord], verbosity: u8) -> Vec<MetadataRecord> {
    records
        .iter()
        .filter(|record| record.visibility.level() <= verbosity)
        .filter(|record| verbosity >= 3 || !record.value.is_empty())
        .cloned()
        .collect()
}

pub fn filter_by_categories(
    records: &[MetadataRecord],
    categories: &CategorySet,
) -> Vec<MetadataRecord> {
    records
        .iter()
        .filter(|record| record.categories.intersects(categories))
        .cloned()
        .collect()
}

/// Recorta cada valor a `limit` caracteres; `0` deja los valores intactos.
pub fn limit_length(records: &[MetadataRecord], limit: usize) -> Vec<MetadataRecord> {
    records
        .iter()
        .map(|record| {
            let mut record = record.clone();
            if limit > 0
                && let Some((cut, _)) = record.value.char_indices().nth(limit)
            {
                record.value.truncate(cut);
            }
            record
        })
        .collect()
}
