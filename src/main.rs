use clap::{ArgAction, CommandFactory, Parser};
use console::style;
use metadump::app::{self, CancellationToken, RunSettings};
use metadump::config::DumpOptions;
use metadump::presenter::{ExportFormat, parse_export_format, render_banner};
use metadump::registry::Registry;
use metadump::taxonomy::{Category, category_tree};
use metadump::MetadumpError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

#[derive(Parser, Debug)]
#[command(
    name = "metadump",
    version,
    about = "Metadata dump utility: extrae y clasifica la metadata de imágenes, PDFs y documentos Office"
)]
struct Cli {
    /// Archivo o directorio a analizar
    #[arg(short, long, value_name = "PATH")]
    input: Option<PathBuf>,

    /// Muestra solo la metadata de estas categorías
    #[arg(short, long, num_args = 1.., value_name = "CATEGORY")]
    filter: Vec<Category>,

    /// Muestra el árbol de categorías disponibles para --filter
    #[arg(long)]
    filteroptions: bool,

    /// Nivel de verbosidad (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count, conflicts_with = "verbosity")]
    verbose: u8,

    /// Nivel de verbosidad explícito (1 a 3)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=3))]
    verbosity: Option<u8>,

    /// Máximo de caracteres por valor (0 = sin límite)
    #[arg(short, long, value_name = "N")]
    limit: Option<usize>,

    /// Agrupa la salida por categoría
    #[arg(short, long)]
    order: bool,

    /// Incluye los subdirectorios
    #[arg(short, long)]
    recursive: bool,

    /// Añade la columna de categorías
    #[arg(short = 'c', long)]
    printcategories: bool,

    /// Muestra cada archivo en cuanto se analiza
    #[arg(short, long)]
    stream: bool,

    /// Lista los analizadores disponibles
    #[arg(long)]
    showplugins: bool,

    /// Usa solo estos analizadores
    #[arg(short, long, num_args = 1.., value_name = "NAME")]
    plugins: Vec<String>,

    /// Muestra también los archivos sin metadata
    #[arg(long)]
    showemptyfiles: bool,

    /// Exporta los resultados procesados a un archivo JSON o CSV
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Formato de exportación (por defecto, según la extensión)
    #[arg(long = "export-format", value_name = "FORMAT", requires = "export")]
    export_format: Option<String>,

    /// Archivo JSON con opciones por defecto
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Opciones del archivo de configuración con los argumentos aplicados encima.
    fn options(&self) -> Result<DumpOptions, MetadumpError> {
        let mut options = match &self.config {
            Some(path) => DumpOptions::load(path)?,
            None => DumpOptions::default(),
        };

        if let Some(level) = self.verbosity {
            options.verbosity = level;
        } else if self.verbose > 0 {
            options.verbosity = self.verbose.min(3);
        }
        if !self.filter.is_empty() {
            options.categories = self.filter.clone();
        }
        if let Some(limit) = self.limit {
            options.limit = limit;
        }
        if !self.plugins.is_empty() {
            options.plugins = self.plugins.clone();
        }
        options.order |= self.order;
        options.recursive |= self.recursive;
        options.print_categories |= self.printcategories;
        options.stream |= self.stream;
        options.show_empty_files |= self.showemptyfiles;
        Ok(options)
    }

    fn action(&self) -> Result<Action, MetadumpError> {
        if self.filteroptions {
            return Ok(Action::ListCategories);
        }
        if self.showplugins {
            return Ok(Action::ListAnalysers);
        }
        let Some(input) = self.input.clone() else {
            return Ok(Action::MissingInput);
        };
        Ok(Action::Analyse(RunSettings {
            input,
            options: self.options()?,
            export: self.export_target()?,
        }))
    }

    fn export_target(&self) -> Result<Option<(PathBuf, ExportFormat)>, MetadumpError> {
        let Some(path) = &self.export else {
            return Ok(None);
        };
        let format = match &self.export_format {
            Some(name) => parse_export_format(name)?,
            None => ExportFormat::from_path(path)?,
        };
        Ok(Some((path.clone(), format)))
    }
}

fn init_logging(verbosity: u8) {
    let level = if verbosity >= 3 { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn cancellation_token() -> CancellationToken {
    let token = CancellationToken::default();
    let handler_token = token.clone();
    if let Err(error) = ctrlc::set_handler(move || handler_token.store(true, Ordering::SeqCst)) {
        log::warn!("No se pudo instalar el manejador de Ctrl-C: {error}");
    }
    token
}

/// Acción pedida por los argumentos, resuelta antes de ejecutar nada.
enum Action {
    ListCategories,
    ListAnalysers,
    MissingInput,
    Analyse(RunSettings),
}

impl Action {
    /// Código de salida cuando la acción se completa.
    fn exit_code(&self) -> u8 {
        match self {
            Action::MissingInput => EXIT_USAGE,
            _ => EXIT_OK,
        }
    }
}

const EXIT_OK: u8 = 0;
const EXIT_FAILURE: u8 = 1;
const EXIT_USAGE: u8 = 2;

fn perform(action: &Action) -> Result<(), MetadumpError> {
    let verbosity = match action {
        Action::Analyse(settings) => settings.options.verbosity,
        _ => 1,
    };
    init_logging(verbosity);

    match action {
        Action::ListCategories => {
            println!("{}", style("Categorías disponibles para --filter:").cyan().bold());
            print!("{}", category_tree());
        }
        Action::ListAnalysers => {
            println!("{}", style("Analizadores cargados:").cyan().bold());
            for name in Registry::builtin().names() {
                println!("  {} {name}", style("•").dim());
            }
        }
        Action::MissingInput => {
            eprintln!("{}", style("ERROR: Debe indicar la ruta de entrada").red().bold());
            if let Err(error) = Cli::command().print_help() {
                log::warn!("No se pudo mostrar la ayuda: {error}");
            }
        }
        Action::Analyse(settings) => app::run(settings, &cancellation_token())?,
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    render_banner();

    let outcome = cli.action().and_then(|action| {
        perform(&action)?;
        Ok(action.exit_code())
    });
    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("{}", style(format!("ERROR: {error}")).red().bold());
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
