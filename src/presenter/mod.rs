//! Presentación de resultados en consola y exportación a archivo.

mod export;
mod renderer;
mod ui;

pub use export::{ExportFormat, export_results, parse_export_format};
pub use renderer::{
    Bucket, RenderOptions, format_file, group_by_category, render_batch, render_stream_entry,
};
pub use ui::{analysis_progress, render_banner};
