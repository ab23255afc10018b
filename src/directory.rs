//! Resolución de la ruta de entrada en la lista ordenada de archivos a analizar.

use crate::error::MetadumpError;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Archivos a analizar a partir de `input`.
///
/// Un archivo se devuelve tal cual. En un directorio se listan primero sus
/// archivos (ordenados por nombre) y después, solo con `recursive`, los de
/// cada subdirectorio nivel por nivel.
pub fn collect_files(input: &Path, recursive: bool) -> Result<Vec<PathBuf>, MetadumpError> {
    if !input.exists() {
        return Err(MetadumpError::InputNotFound(input.to_path_buf()));
    }
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut pending = VecDeque::from([input.to_path_buf()]);

    while let Some(directory) = pending.pop_front() {
        let (directory_files, subdirectories) = read_level(&directory);
        files.extend(directory_files);
        if recursive {
            pending.extend(subdirectories);
        }
    }

    Ok(files)
}

/// Archivos y subdirectorios directos de `directory`, ordenados por nombre.
fn read_level(directory: &Path) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let mut files = Vec::new();
    let mut subdirectories = Vec::new();

    for entry in WalkDir::new(directory)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                log::warn!("Se omite una entrada de `{}`: {error}", directory.display());
                continue;
            }
        };
        if entry.file_type().is_dir() {
            subdirectories.push(entry.into_path());
        } else if entry.path().is_file() {
            files.push(entry.into_path());
        }
    }

    (files, subdirectories)
}

/// Ruta que se muestra para `file`: relativa a la entrada o el nombre del archivo.
pub fn display_path(input: &Path, file: &Path) -> String {
    match file.strip_prefix(input) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.display().to_string(),
        _ => file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file.display().to_string()),
    }
}
