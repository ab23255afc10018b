//! Bucle de análisis por lotes o en flujo, con cancelación por archivo.

use crate::aggregator::extract_metadata_of_file;
use crate::config::DumpOptions;
use crate::directory::collect_files;
use crate::error::MetadumpError;
use crate::presenter::{
    ExportFormat, RenderOptions, analysis_progress, export_results, render_batch,
    render_stream_entry,
};
use crate::processing::ProcessingOptions;
use crate::record::FileResult;
use console::style;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Token de cancelación compartido con el manejador de Ctrl-C.
pub type CancellationToken = Arc<AtomicBool>;

#[inline]
pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

/// Todo lo necesario para una ejecución ya resuelto desde la línea de comandos.
#[derive(Clone, Debug)]
pub struct RunSettings {
    pub input: PathBuf,
    pub options: DumpOptions,
    pub export: Option<(PathBuf, ExportFormat)>,
}

/// Resultado del recorrido de archivos.
#[derive(Debug, Default)]
pub struct Analysis {
    pub results: Vec<FileResult>,
    pub interrupted: bool,
}

/// Analiza y filtra cada archivo en orden, avisando a `on_file` tras cada uno.
///
/// El token se consulta antes de cada archivo; si está activo se detiene y
/// conserva lo ya procesado.
pub fn analyse_files(
    files: &[PathBuf],
    selection: Option<&[String]>,
    processing: &ProcessingOptions,
    token: &CancellationToken,
    mut on_file: impl FnMut(&FileResult),
) -> Analysis {
    let mut analysis = Analysis::default();
    for file in files {
        if is_cancelled(token) {
            analysis.interrupted = true;
            break;
        }
        let records = extract_metadata_of_file(file, selection);
        let result = FileResult::new(file, processing.apply(&records));
        on_file(&result);
        analysis.results.push(result);
    }
    analysis
}

pub fn run(settings: &RunSettings, token: &CancellationToken) -> Result<(), MetadumpError> {
    let options = &settings.options;
    let files = collect_files(&settings.input, options.recursive)?;
    if files.is_empty() {
        println!("{}", style("No se encontraron archivos").yellow());
        return Ok(());
    }
    log::info!("{} archivos para analizar", files.len());

    let processing = options.processing();
    let render = RenderOptions {
        order: options.order,
        print_categories: options.print_categories,
        show_empty_files: options.show_empty_files,
    };
    let selection = options.plugin_selection();

    let analysis = if options.stream {
        analyse_files(&files, selection, &processing, token, |result| {
            render_stream_entry(&settings.input, result, &render)
        })
    } else {
        let progress = analysis_progress(files.len());
        let analysis = analyse_files(&files, selection, &processing, token, |_| progress.inc(1));
        progress.finish_and_clear();
        analysis
    };

    if analysis.interrupted {
        println!(
            "\n{}",
            style("Interrupción por teclado: se detiene el análisis").yellow().bold()
        );
    }
    if !options.stream {
        render_batch(&settings.input, &analysis.results, &render);
    }

    if let Some((path, format)) = &settings.export {
        export_results(&analysis.results, *format, path)?;
        print_export_notice(path, *format);
    }
    Ok(())
}

fn print_export_notice(path: &Path, format: ExportFormat) {
    println!(
        "{} {} {}",
        style(format!("Exportado {}", format.label())).green().bold(),
        style("→").dim(),
        path.display()
    );
}
