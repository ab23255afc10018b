//! Ejecución de los analizadores sobre un archivo.

use crate::record::MetadataRecord;
use crate::registry::Registry;
use std::path::Path;

/// Concatena, en orden de registro, los registros de todos los analizadores
/// seleccionados. Sin selección se ejecutan todos. Los analizadores que no
/// soportan la plataforma se omiten. No elimina duplicados.
pub fn extract_metadata_of_file(path: &Path, selected: Option<&[String]>) -> Vec<MetadataRecord> {
    extract_with_registry(&Registry::builtin(), path, selected)
}

pub fn extract_with_registry(
    registry: &Registry,
    path: &Path,
    selected: Option<&[String]>,
) -> Vec<MetadataRecord> {
    let analysers = match selected {
        Some(names) => registry.select(names),
        None => registry.analysers().to_vec(),
    };

    let mut records = Vec::new();
    for analyser in analysers {
        if !analyser.supports_platform() {
            log::debug!("{}: no soportado en esta plataforma", analyser.name());
            continue;
        }
        let extracted = analyser.extract(path);
        log::debug!(
            "{}: {} registros en `{}`",
            analyser.name(),
            extracted.len(),
            path.display()
        );
        records.extend(extracted);
    }
    records
}
