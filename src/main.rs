//! CLI entry point for the SNCF punctuality dashboard.
//!
//! Two independent subcommands: `clean` turns the raw open-data export into the
//! cleaned CSV, and `dashboard` opens an interactive session on the cleaned data.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sncf_dashboard::{
    cleaner::clean_reader,
    config::Paths,
    dataset::Dataset,
    fetch::{BasicClient, read_source},
    map::StationCoords,
    normalize::normalize,
    output::{log_preview, write_records},
    record::Route,
    session::Session,
    simulator::Simulator,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sncf_dashboard")]
#[command(about = "Clean and explore SNCF monthly punctuality statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean the raw semicolon-delimited export and write the cleaned CSV
    Clean {
        /// Path or URL of the raw export
        #[arg(short, long, value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// Cleaned CSV to write
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Explore a route interactively and simulate adding or removing trains
    Dashboard {
        /// Cleaned CSV produced by `clean`
        #[arg(short, long)]
        data: Option<PathBuf>,

        /// Origin station (defaults to the first one in the data)
        #[arg(long)]
        origin: Option<String>,

        /// Destination station (defaults to the first one served from the origin)
        #[arg(long)]
        destination: Option<String>,

        /// JSON file with extra station coordinates
        #[arg(long)]
        stations: Option<PathBuf>,

        /// Print KPIs and charts as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sncf_dashboard.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sncf_dashboard.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Clean { source, output } => {
            let paths = Paths::from_env(source, output, None);
            clean(&paths.raw_source, &paths.clean_path).await?;
        }
        Commands::Dashboard {
            data,
            origin,
            destination,
            stations,
            json,
        } => {
            let paths = Paths::from_env(None, data, stations);
            dashboard(&paths, origin, destination, json)?;
        }
    }

    Ok(())
}

/// Cleans the raw export at `source` and writes the result to `output`.
#[tracing::instrument]
async fn clean(source: &str, output: &Path) -> Result<()> {
    let client = BasicClient::new()?;
    let bytes = read_source(&client, source).await?;

    let report = clean_reader(bytes.as_slice())
        .with_context(|| format!("cannot clean {source}"))?;
    write_records(output, &report.records)?;

    info!(
        path = %output.display(),
        records = report.records.len(),
        "Cleaned file written"
    );
    log_preview(&report.records, 10);
    Ok(())
}

/// Picks the starting route from the flags, falling back to the data.
fn starting_route(
    dataset: &Dataset,
    origin: Option<String>,
    destination: Option<String>,
) -> Option<Route> {
    let origin = origin
        .map(|o| normalize(&o))
        .or_else(|| dataset.default_route().map(|r| r.origin))?;
    let destination = destination
        .map(|d| normalize(&d))
        .or_else(|| dataset.destinations_from(&origin).into_iter().next())?;
    Some(Route::new(&origin, &destination))
}

fn dashboard(
    paths: &Paths,
    origin: Option<String>,
    destination: Option<String>,
    json: bool,
) -> Result<()> {
    let dataset = Dataset::load(&paths.clean_path)?;

    let coords = match &paths.stations_path {
        Some(path) => StationCoords::load(path)?,
        None => StationCoords::default(),
    };

    let Some(route) = starting_route(&dataset, origin, destination) else {
        warn!("No route to show, check the data file and the selected stations");
        return Ok(());
    };

    info!(route = %route, records = dataset.len(), "Starting dashboard");
    let mut session = Session::new(Simulator::new(dataset, route), coords, json);

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    session.run(stdin.lock(), &mut stdout)
}
