//! Extracción de metadata en PDFs mediante lectura del diccionario Info.

use super::{Analyser, RawEntry, enrich_with_categories};
use crate::record::MetadataRecord;
use crate::taxonomy::{Category, TagRule, Visibility};
use lopdf::{Dictionary, Document, Object};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const DESCRIPTION: &str = "embedded PDF metadata";

/// Bytes iniciales donde se tolera basura antes de `%PDF-`.
const HEADER_WINDOW: u64 = 1024;

const TAXONOMY: &[TagRule] = &[
    TagRule::new(
        "/Author",
        &[Category::Author, Category::AuthorName],
        Visibility::Always,
    ),
    TagRule::new(
        "/Producer",
        &[
            Category::Author,
            Category::AuthorName,
            Category::Tool,
            Category::Software,
        ],
        Visibility::Always,
    ),
    TagRule::new(
        "/CreationDate",
        &[Category::Time, Category::CreationTime],
        Visibility::Always,
    ),
    TagRule::new(
        "/ModDate",
        &[Category::Time, Category::ModifyTime],
        Visibility::Always,
    ),
];

/// Una entrada por clave del diccionario Info del documento.
#[derive(Debug, Default)]
pub struct PdfAnalyser;

impl Analyser for PdfAnalyser {
    fn name(&self) -> &'static str {
        "PDF"
    }

    fn extract(&self, path: &Path) -> Vec<MetadataRecord> {
        match has_pdf_header(path) {
            Ok(true) => {}
            Ok(false) => return Vec::new(),
            Err(error) => {
                log::debug!("PDF: no se pudo leer `{}`: {error}", path.display());
                return Vec::new();
            }
        }

        let doc = match Document::load(path) {
            Ok(doc) => doc,
            Err(error) => {
                log::debug!("PDF: no se pudo leer `{}`: {error}", path.display());
                return Vec::new();
            }
        };

        let Some(info_dict) = doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|info| deref_dictionary(&doc, info))
        else {
            log::debug!("PDF: `{}` no tiene diccionario Info", path.display());
            return Vec::new();
        };

        let entries = info_dict
            .iter()
            .map(|(key, value)| {
                RawEntry::new(
                    format!("/{}", String::from_utf8_lossy(key)),
                    object_to_string(&doc, value, 0),
                    DESCRIPTION,
                )
            })
            .collect();

        enrich_with_categories(TAXONOMY, entries)
    }
}

fn has_pdf_header(path: &Path) -> io::Result<bool> {
    let mut head = Vec::with_capacity(HEADER_WINDOW as usize);
    File::open(path)?.take(HEADER_WINDOW).read_to_end(&mut head)?;
    Ok(head.windows(5).any(|window| window == b"%PDF-"))
}

fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

// Evita ciclos de referencias en documentos mal formados.
const MAX_DEPTH: usize = 8;

fn object_to_string(doc: &Document, obj: &Object, depth: usize) -> String {
    if depth > MAX_DEPTH {
        return String::new();
    }
    match obj {
        Object::String(bytes, _) => decode_text_string(bytes).trim().to_string(),
        Object::Name(name) => String::from_utf8_lossy(name).trim().to_string(),
        Object::Integer(value) => value.to_string(),
        Object::Real(value) => value.to_string(),
        Object::Boolean(value) => value.to_string(),
        Object::Array(items) => items
            .iter()
            .map(|item| object_to_string(doc, item, depth + 1))
            .collect::<Vec<_>>()
            .join(", "),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .map(|inner| object_to_string(doc, inner, depth + 1))
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Cadenas de texto PDF: UTF-16BE con BOM o bytes de un solo octeto.
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|byte| *byte as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;
    use tempfile::tempdir;

    fn create_pdf(path: &Path, info: Option<Dictionary>) -> Result<(), Box<dyn std::error::Error>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1_i64,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        if let Some(info) = info {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }
        doc.save(path)?;
        Ok(())
    }

    #[test]
    fn extracts_info_dictionary() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("report.pdf");
        create_pdf(
            &source,
            Some(dictionary! {
                "Author" => Object::string_literal("Jane Doe"),
                "Producer" => Object::string_literal("LibreOffice 7.0"),
                "CreationDate" => Object::string_literal("D:20200101100000+01'00'"),
                "Trapped" => "False",
            }),
        )?;

        let records = PdfAnalyser.extract(&source);
        assert_eq!(records.len(), 4);

        let author = records
            .iter()
            .find(|r| r.key == "/Author")
            .ok_or("falta /Author")?;
        assert_eq!(author.value, "Jane Doe");
        assert_eq!(author.description, DESCRIPTION);
        assert!(author.has_category(Category::AuthorName));

        let producer = records
            .iter()
            .find(|r| r.key == "/Producer")
            .ok_or("falta /Producer")?;
        assert!(producer.has_category(Category::Software));
        assert!(producer.has_category(Category::AuthorName));

        let trapped = records
            .iter()
            .find(|r| r.key == "/Trapped")
            .ok_or("falta /Trapped")?;
        assert_eq!(trapped.value, "False");
        assert!(trapped.categories.is_empty());
        assert_eq!(trapped.visibility, Visibility::Full);
        Ok(())
    }

    #[test]
    fn pdf_without_info_yields_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let source = dir.path().join("bare.pdf");
        create_pdf(&source, None)?;

        assert!(PdfAnalyser.extract(&source).is_empty());
        Ok(())
    }

    #[test]
    fn malformed_files_yield_nothing() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"")?;
        let text = dir.path().join("fake.pdf");
        std::fs::write(&text, b"%PDF-1.4\nthis is not really a pdf")?;

        assert!(PdfAnalyser.extract(&empty).is_empty());
        assert!(PdfAnalyser.extract(&text).is_empty());
        Ok(())
    }

    #[test]
    fn header_is_checked_before_loading() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let real = dir.path().join("report.pdf");
        create_pdf(&real, None)?;
        let video = dir.path().join("clip.mp4");
        let mut bytes = b"\0\0\0\x18ftypmp42".to_vec();
        bytes.extend(std::iter::repeat_n(0u8, 4096));
        bytes.extend_from_slice(b"%PDF-1.4");
        std::fs::write(&video, bytes)?;
        let prefixed = dir.path().join("prefixed.pdf");
        std::fs::write(&prefixed, b"garbage\n%PDF-1.7\n")?;

        assert!(has_pdf_header(&real)?);
        assert!(has_pdf_header(&prefixed)?);
        assert!(!has_pdf_header(&video)?);
        assert!(PdfAnalyser.extract(&video).is_empty());
        assert!(has_pdf_header(&dir.path().join("missing.pdf")).is_err());
        Ok(())
    }

    #[test]
    fn utf16_text_strings_are_decoded() {
        let mut bytes = vec![0xFE, 0xFF];
        for unit in "Zoë".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(decode_text_string(&bytes), "Zoë");
        assert_eq!(decode_text_string(&[0x4A, 0xE9]), "Jé");
    }
}
