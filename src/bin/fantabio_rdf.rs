use std::io::{self, BufRead, IsTerminal, Write};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use fantabio_rdf::app::{App, ConvertOptions, selected_species};
use fantabio_rdf::config::ConfigLoader;
use fantabio_rdf::domain::Species;
use fantabio_rdf::download::{ArchiveClient, HttpArchiveClient};
use fantabio_rdf::error::FantaError;
use fantabio_rdf::output::{JsonOutput, LogSink, OutputMode};
use fantabio_rdf::sparql::{SparqlClient, SparqlHttpClient, SparqlResults};

#[derive(Parser)]
#[command(name = "fantabio-rdf")]
#[command(about = "Convert Fanta.bio cis-regulatory element annotations into RDF Turtle")]
#[command(version, author)]
struct Cli {
    /// Print a JSON summary to stdout instead of progress logs.
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: fantabio.json).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Restrict to one species; repeatable. Defaults to all.
    #[arg(long, global = true, value_enum)]
    species: Vec<Species>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        about = "Download and decompress the Fanta.bio archives",
        visible_aliases = ["dl:fanta", "dl-fanta"]
    )]
    Download,
    #[command(
        about = "Fetch gene symbol tables from the SPARQL endpoint",
        visible_aliases = ["dl:tsv", "dl-tsv"]
    )]
    Symbols,
    #[command(about = "Convert JSONL and TSV inputs to Turtle", visible_alias = "convert:ttl")]
    Convert(ConvertArgs),
    #[command(about = "Download, fetch symbols and convert", visible_alias = "run:all")]
    All(ConvertArgs),
}

#[derive(Args, Clone)]
struct ConvertArgs {
    /// Version recorded in metadata.ttl (prompted when omitted).
    #[arg(long)]
    release: Option<String>,

    /// Do not write metadata.ttl.
    #[arg(long)]
    skip_metadata: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<FantaError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &FantaError) -> u8 {
    match error {
        FantaError::MissingConfig | FantaError::MissingSource(_) | FantaError::InputMissing(_) => {
            2
        }
        FantaError::DownloadHttp(_)
        | FantaError::DownloadStatus { .. }
        | FantaError::Decompress(_)
        | FantaError::SparqlHttp(_)
        | FantaError::SparqlStatus { .. }
        | FantaError::SparqlResponse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Interactive
    };
    let species = selected_species(&cli.species);

    match cli.command {
        Commands::Download => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            let archives = HttpArchiveClient::new()?;
            let app = App::new(config, archives, NopSparql);
            match output_mode {
                OutputMode::Json => {
                    let result = app.download(&species, &JsonOutput)?;
                    JsonOutput::print_download(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    app.download(&species, &LogSink)?;
                    Ok(())
                }
            }
        }
        Commands::Symbols => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            let sparql = SparqlHttpClient::new()?;
            let app = App::new(config, NopArchive, sparql);
            match output_mode {
                OutputMode::Json => {
                    let result = app.fetch_symbols(&species, &JsonOutput)?;
                    JsonOutput::print_symbols(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    app.fetch_symbols(&species, &LogSink)?;
                    Ok(())
                }
            }
        }
        Commands::Convert(args) => {
            let config = ConfigLoader::resolve_or_default(cli.config.as_deref())?;
            let options = convert_options(&args)?;
            let app = App::new(config, NopArchive, NopSparql);
            run_convert(&app, &species, &options, output_mode)
        }
        Commands::All(args) => {
            let config = ConfigLoader::resolve(cli.config.as_deref())?;
            // Ask for the release up front so the pipeline runs unattended.
            let options = convert_options(&args)?;
            let archives = HttpArchiveClient::new()?;
            let sparql = SparqlHttpClient::new()?;
            let app = App::new(config, archives, sparql);
            match output_mode {
                OutputMode::Json => {
                    let result = app.run_all(&species, &options, &JsonOutput)?;
                    JsonOutput::print_all(&result).into_diagnostic()
                }
                OutputMode::Interactive => {
                    app.run_all(&species, &options, &LogSink)?;
                    eprintln!("== Done ==");
                    Ok(())
                }
            }
        }
    }
}

fn run_convert<A: ArchiveClient, Q: SparqlClient>(
    app: &App<A, Q>,
    species: &[Species],
    options: &ConvertOptions,
    output_mode: OutputMode,
) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => {
            let result = app.convert(species, options, &JsonOutput)?;
            JsonOutput::print_convert(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.convert(species, options, &LogSink)?;
            for item in &result.items {
                println!("Wrote {}", item.output_path);
            }
            if let Some(path) = &result.metadata_path {
                println!("Wrote {path}");
            }
            Ok(())
        }
    }
}

fn convert_options(args: &ConvertArgs) -> miette::Result<ConvertOptions> {
    if args.skip_metadata {
        return Ok(ConvertOptions { release: None });
    }
    let release = match &args.release {
        Some(release) => Some(release.clone()),
        None => prompt_release().into_diagnostic()?,
    };
    Ok(ConvertOptions { release })
}

fn prompt_release() -> io::Result<Option<String>> {
    let stdin = io::stdin();
    if !stdin.is_terminal() {
        warn!("no --release given and stdin is not a terminal; metadata.ttl not written");
        return Ok(None);
    }
    let mut stderr = io::stderr();
    write!(stderr, "Version (e.g. v1.2.0): ")?;
    stderr.flush()?;
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    let release = line.trim().to_string();
    Ok((!release.is_empty()).then_some(release))
}

struct NopArchive;
struct NopSparql;

impl ArchiveClient for NopArchive {
    fn download_gz(&self, _url: &str, _destination: &std::path::Path) -> Result<(), FantaError> {
        Err(FantaError::DownloadHttp(
            "download client not configured".to_string(),
        ))
    }
}

impl SparqlClient for NopSparql {
    fn select(&self, _endpoint: &str, _query: &str) -> Result<SparqlResults, FantaError> {
        Err(FantaError::SparqlHttp(
            "SPARQL client not configured".to_string(),
        ))
    }
}
