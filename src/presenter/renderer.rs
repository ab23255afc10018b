//! Tablas por archivo, planas o agrupadas por categoría principal.

use super::ui::{base_table, key_cell};
use crate::directory::display_path;
use crate::record::{FileResult, MetadataRecord};
use crate::taxonomy::Category;
use comfy_table::{Cell, Color, Row, Table};
use console::style;
use std::path::Path;

const NO_METADATA: &str = "No se encontró metadata";
const SEPARATOR_WIDTH: usize = 100;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderOptions {
    /// Agrupa por categoría principal.
    pub order: bool,
    pub print_categories: bool,
    pub show_empty_files: bool,
}

/// Registros de una categoría principal (o `OTHER`) en modo agrupado.
#[derive(Debug)]
pub struct Bucket<'a> {
    pub label: String,
    pub records: Vec<&'a MetadataRecord>,
}

/// Reparte los registros en TIME, AUTHOR, TOOL, LOCATION y OTHER.
///
/// Un registro aparece en cada categoría principal que contiene; si no
/// contiene ninguna va a OTHER. Los grupos vacíos se omiten.
///
/// Dentro de cada grupo los registros se ordenan de forma estable por la
/// lista de nombres de sus categorías.
pub fn group_by_category(records: &[MetadataRecord]) -> Vec<Bucket<'_>> {
    let mut sorted: Vec<&MetadataRecord> = records.iter().collect();
    sorted.sort_by_cached_key(|record| {
        record
            .categories
            .iter()
            .map(Category::name)
            .collect::<Vec<_>>()
    });

    let mut buckets: Vec<Bucket<'_>> = Category::MAIN
        .iter()
        .map(|main| Bucket {
            label: main.name().to_uppercase(),
            records: sorted
                .iter()
                .copied()
                .filter(|record| record.has_category(*main))
                .collect(),
        })
        .collect();

    buckets.push(Bucket {
        label: "OTHER".to_string(),
        records: sorted
            .iter()
            .copied()
            .filter(|record| !Category::MAIN.iter().any(|main| record.has_category(*main)))
            .collect(),
    });

    buckets.retain(|bucket| !bucket.records.is_empty());
    buckets
}

fn records_table(records: &[&MetadataRecord], print_categories: bool) -> Table {
    let mut headers = vec!["KEY", "VALUE", "DESCRIPTION"];
    if print_categories {
        headers.push("CATEGORIES");
    }
    let mut table = base_table(&headers);

    for record in records {
        let mut cells = vec![
            key_cell(&record.key),
            Cell::new(&record.value).fg(Color::White),
            Cell::new(&record.description).fg(Color::DarkGrey),
        ];
        if print_categories {
            cells.push(Cell::new(record.categories.joined()).fg(Color::Yellow));
        }
        table.add_row(Row::from(cells));
    }
    table
}

/// Bloque de salida de un archivo; `None` si no tiene registros y no se muestran vacíos.
pub fn format_file(
    display: &str,
    records: &[MetadataRecord],
    options: &RenderOptions,
) -> Option<String> {
    if records.is_empty() && !options.show_empty_files {
        return None;
    }

    let mut output = format!(
        "{}\n{} {}\n",
        style("=".repeat(SEPARATOR_WIDTH)).dim(),
        style("Archivo:").cyan().bold(),
        display
    );

    if records.is_empty() {
        output.push_str(&format!("  {}\n", style(NO_METADATA).yellow()));
        return Some(output);
    }

    if options.order {
        for bucket in group_by_category(records) {
            output.push_str(&format!(
                "\n  {} {}\n",
                style("CATEGORÍA:").cyan(),
                style(&bucket.label).bold()
            ));
            output.push_str(&format!(
                "{}\n",
                records_table(&bucket.records, options.print_categories)
            ));
        }
    } else {
        let all: Vec<&MetadataRecord> = records.iter().collect();
        output.push_str(&format!(
            "\n{}\n",
            records_table(&all, options.print_categories)
        ));
    }

    Some(output)
}

/// Muestra un lote completo; sin nada que mostrar imprime [`NO_METADATA`].
pub fn render_batch(input: &Path, results: &[FileResult], options: &RenderOptions) {
    let blocks: Vec<String> = results
        .iter()
        .filter_map(|result| {
            format_file(&display_path(input, &result.path), &result.records, options)
        })
        .collect();

    if blocks.is_empty() {
        println!("{}", style(NO_METADATA).yellow());
        return;
    }
    for block in blocks {
        println!("{block}");
    }
}

/// Muestra un archivo apenas se analiza (modo `--stream`).
pub fn render_stream_entry(input: &Path, result: &FileResult, options: &RenderOptions) {
    if let Some(block) = format_file(&display_path(input, &result.path), &result.records, options) {
        println!("{block}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{CategorySet, TagClass, Visibility};

    fn record(key: &str, categories: &[Category]) -> MetadataRecord {
        MetadataRecord::new(
            key,
            "value",
            "test",
            TagClass {
                categories: CategorySet::from_slice(categories),
                visibility: Visibility::Always,
            },
        )
    }

    fn labels(buckets: &[Bucket<'_>]) -> Vec<String> {
        buckets.iter().map(|bucket| bucket.label.clone()).collect()
    }

    #[test]
    fn multi_category_record_lands_in_every_bucket() {
        let records = vec![
            record("photoshop:History", &[Category::Author, Category::Time]),
            record("Make", &[Category::Tool, Category::Hardware]),
            record("revision", &[]),
        ];
        let buckets = group_by_category(&records);
        assert_eq!(labels(&buckets), vec!["TIME", "AUTHOR", "TOOL", "OTHER"]);
        assert_eq!(buckets[0].records[0].key, "photoshop:History");
        assert_eq!(buckets[1].records[0].key, "photoshop:History");
        assert_eq!(buckets[3].records[0].key, "revision");
    }

    #[test]
    fn records_inside_a_bucket_are_sorted_by_categories() {
        let records = vec![
            record("ModifyDate", &[Category::Time, Category::ModifyTime]),
            record("CreateDate", &[Category::Time, Category::CreationTime]),
            record("History", &[Category::Author, Category::Time]),
        ];
        let buckets = group_by_category(&records);
        let time: Vec<&str> = buckets[0].records.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(buckets[0].label, "TIME");
        assert_eq!(time, vec!["History", "CreateDate", "ModifyDate"]);

        let plain = format_file("a.jpg", &records, &RenderOptions::default()).expect("bloque visible");
        let modify = plain.find("ModifyDate").expect("falta ModifyDate");
        let create = plain.find("CreateDate").expect("falta CreateDate");
        assert!(modify < create);
    }

    #[test]
    fn subcategory_without_main_goes_to_other() {
        let records = vec![record("odd", &[Category::Hardware])];
        assert_eq!(labels(&group_by_category(&records)), vec!["OTHER"]);
    }

    #[test]
    fn empty_files_are_hidden_unless_requested() {
        let hidden = RenderOptions::default();
        assert!(format_file("a.jpg", &[], &hidden).is_none());

        let shown = RenderOptions {
            show_empty_files: true,
            ..RenderOptions::default()
        };
        let block = format_file("a.jpg", &[], &shown).expect("bloque visible");
        assert!(block.contains("a.jpg"));
        assert!(block.contains(NO_METADATA));
    }

    #[test]
    fn grouped_block_lists_categories() {
        let records = vec![record("creator", &[Category::Author, Category::AuthorName])];
        let options = RenderOptions {
            order: true,
            print_categories: true,
            show_empty_files: false,
        };
        let block = format_file("doc.docx", &records, &options).expect("bloque visible");
        assert!(block.contains("Archivo:"));
        assert!(block.contains("CATEGORÍA:"));
        assert!(block.contains("AUTHOR"));
        assert!(block.contains("creator"));
        assert!(block.contains("CATEGORIES"));
        assert!(block.contains("author_name"));
        assert!(!block.contains("OTHER"));
    }
}
