//! Lectura de metadata en documentos Office empaquetados en ZIP.

use super::{Analyser, RawEntry, enrich_with_categories};
use crate::record::MetadataRecord;
use crate::taxonomy::{Category, TagRule, Visibility};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use xmltree::{Element, XMLNode};
use zip::ZipArchive;

const CORE_PART: &str = "docProps/core.xml";
const APP_PART: &str = "docProps/app.xml";
const CORE_DESCRIPTION: &str = "Microsoft Office - docProps/core.xml";
const APP_DESCRIPTION: &str = "Microsoft Office - docProps/app.xml";

const TAXONOMY: &[TagRule] = &[
    TagRule::new("lastPrinted", &[Category::Time], Visibility::Always),
    TagRule::new(
        "created",
        &[Category::Time, Category::CreationTime],
        Visibility::Always,
    ),
    TagRule::new(
        "modified",
        &[Category::Time, Category::ModifyTime],
        Visibility::Always,
    ),
    TagRule::new(
        "Application",
        &[Category::Tool, Category::Software],
        Visibility::Always,
    ),
    TagRule::new(
        "AppVersion",
        &[Category::Tool, Category::Software],
        Visibility::Always,
    ),
    TagRule::new(
        "lastModifiedBy",
        &[Category::Author, Category::AuthorName],
        Visibility::Always,
    ),
    TagRule::new(
        "creator",
        &[Category::Author, Category::AuthorName],
        Visibility::Always,
    ),
    TagRule::new("Company", &[Category::Author], Visibility::Always),
];

/// Propiedades de `docProps/core.xml` y `docProps/app.xml` de documentos OOXML.
#[derive(Debug, Default)]
pub struct OfficeAnalyser;

impl Analyser for OfficeAnalyser {
    fn name(&self) -> &'static str {
        "Office"
    }

    fn extract(&self, path: &Path) -> Vec<MetadataRecord> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(error) => {
                log::debug!("Office: no se pudo abrir `{}`: {error}", path.display());
                return Vec::new();
            }
        };
        let mut archive = match ZipArchive::new(file) {
            Ok(archive) => archive,
            Err(error) => {
                log::debug!("Office: `{}` no es un ZIP válido: {error}", path.display());
                return Vec::new();
            }
        };

        let mut entries = properties_from_part(&mut archive, CORE_PART, CORE_DESCRIPTION);
        entries.extend(properties_from_part(&mut archive, APP_PART, APP_DESCRIPTION));

        enrich_with_categories(TAXONOMY, entries)
    }
}

/// Una entrada por hijo directo del elemento raíz; vacío si la parte falta o no es XML.
fn properties_from_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    part: &str,
    description: &'static str,
) -> Vec<RawEntry> {
    let mut contents = String::new();
    match archive.by_name(part) {
        Ok(mut part_file) => {
            if part_file.read_to_string(&mut contents).is_err() {
                return Vec::new();
            }
        }
        Err(_) => return Vec::new(),
    }

    let root = match Element::parse(contents.as_bytes()) {
        Ok(root) => root,
        Err(error) => {
            log::debug!("Office: `{part}` no es XML válido: {error}");
            return Vec::new();
        }
    };

    root.children
        .iter()
        .filter_map(|node| match node {
            XMLNode::Element(child) => Some(RawEntry::new(
                child.name.clone(),
                element_text_content(child),
                description,
            )),
            _ => None,
        })
        .collect()
}

/// Texto propio del elemento (sin descender a sus hijos).
fn element_text_content(element: &Element) -> String {
    let mut content = String::new();
    for node in &element.children {
        if let XMLNode::Text(text) | XMLNode::CData(text) = node {
            content.push_str(text);
        }
    }
    content.trim().to_string()
}
