//! Exportación de los resultados procesados a JSON o CSV.

use crate::error::MetadumpError;
use crate::record::FileResult;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Json => "JSON",
            ExportFormat::Csv => "CSV",
        }
    }

    /// Formato deducido de la extensión del destino.
    pub fn from_path(path: &Path) -> Result<Self, MetadumpError> {
        let extension = path
            .extension()
            .map(|value| value.to_string_lossy().into_owned())
            .unwrap_or_default();
        parse_export_format(&extension)
    }
}

pub fn parse_export_format(input: &str) -> Result<ExportFormat, MetadumpError> {
    match input.to_lowercase().as_str() {
        "json" => Ok(ExportFormat::Json),
        "csv" => Ok(ExportFormat::Csv),
        _ => Err(MetadumpError::UnsupportedExportFormat(input.to_string())),
    }
}

pub fn export_results(
    results: &[FileResult],
    format: ExportFormat,
    path: &Path,
) -> Result<(), MetadumpError> {
    match format {
        ExportFormat::Json => export_json(results, path),
        ExportFormat::Csv => export_csv(results, path),
    }
}

fn export_json(results: &[FileResult], path: &Path) -> Result<(), MetadumpError> {
    let json = serde_json::to_string_pretty(results)?;
    fs::write(path, json).map_err(|source| MetadumpError::ExportWrite {
        path: path.to_path_buf(),
        source,
    })
}

fn export_csv(results: &[FileResult], path: &Path) -> Result<(), MetadumpError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "path",
        "key",
        "value",
        "description",
        "categories",
        "visibility",
    ])?;

    for result in results {
        let file = result.path.display().to_string();
        for record in &result.records {
            let categories = record
                .categories
                .iter()
                .map(|category| category.name())
                .collect::<Vec<_>>()
                .join(";");
            let visibility = record.visibility.level().to_string();
            writer.write_record([
                file.as_str(),
                record.key.as_str(),
                record.value.as_str(),
                record.description.as_str(),
                categories.as_str(),
                visibility.as_str(),
            ])?;
        }
    }

    writer.flush().map_err(|source| MetadumpError::ExportWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::MetadataRecord;
    use crate::taxonomy::{Category, CategorySet, TagClass, Visibility};
    use tempfile::tempdir;

    fn sample() -> Vec<FileResult> {
        let creator = MetadataRecord::new(
            "creator",
            "Jane Doe",
            "Microsoft Office - docProps/core.xml",
            TagClass {
                categories: CategorySet::from_slice(&[Category::Author, Category::AuthorName]),
                visibility: Visibility::Always,
            },
        );
        vec![
            FileResult::new("docs/report.docx", vec![creator]),
            FileResult::new("docs/empty.txt", Vec::new()),
        ]
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/run.JSON")).ok(),
            Some(ExportFormat::Json)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("run.csv")).ok(),
            Some(ExportFormat::Csv)
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("run.xlsx")),
            Err(MetadumpError::UnsupportedExportFormat(_))
        ));
    }

    #[test]
    fn json_export_lists_files_and_records() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("run.json");
        export_results(&sample(), ExportFormat::Json, &path)?;

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(value[0]["path"], "docs/report.docx");
        assert_eq!(value[0]["records"][0]["key"], "creator");
        assert_eq!(
            value[0]["records"][0]["categories"],
            serde_json::json!(["author", "author_name"])
        );
        assert_eq!(value[0]["records"][0]["visibility"], 1);
        assert!(value[0]["records"][0].get("typed").is_none());
        assert_eq!(value[1]["records"], serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn csv_export_has_one_row_per_record() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("run.csv");
        export_results(&sample(), ExportFormat::Csv, &path)?;

        let contents = fs::read_to_string(&path)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "path,key,value,description,categories,visibility");
        assert_eq!(
            lines[1],
            "docs/report.docx,creator,Jane Doe,Microsoft Office - docProps/core.xml,author;author_name,1"
        );
        assert_eq!(lines.len(), 2);
        Ok(())
    }
}
