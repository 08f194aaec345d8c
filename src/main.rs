use cassette::batch::error::{ErrorKind, Result};
use cassette::{AnnotationStatus, BatchEvent, BatchOrchestrator, BatchResult, Services};
use cassette_config::Config;
use cassette_model::{Field, Format, mmss};
use clap::{Args, Parser, Subcommand};
use exn::ResultExt;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cassette", version, about)]
struct Cli {
    /// Configuration file (`.toml`, `.yaml` or `.json`).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
    /// Log more (`-v` debug, `-vv` trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List what a playlist or video reference resolves to.
    Resolve { reference: String },
    /// Show the tags every item would be written with.
    Annotate { reference: String },
    /// Download, convert and tag every item.
    Download(DownloadArgs),
}

#[derive(Args)]
struct DownloadArgs {
    reference: String,
    /// Directory to write the finished files into.
    #[arg(short, long)]
    dest: Option<PathBuf>,
    /// `mp3`, or `m4a` to keep the downloaded stream unconverted.
    #[arg(short, long, value_parser = parse_format)]
    format: Option<Format>,
    /// Look every item up in the metadata provider first.
    #[arg(short, long)]
    annotate: bool,
    #[arg(short, long)]
    workers: Option<usize>,
    /// Album for every item, replacing anything the lookup found.
    #[arg(long)]
    album: Option<String>,
    /// Artist for every item, replacing anything the lookup found.
    #[arg(long)]
    artist: Option<String>,
    /// Genre for every item, replacing anything the lookup found.
    #[arg(long)]
    genre: Option<String>,
}

fn parse_format(value: &str) -> std::result::Result<Format, String> {
    value.parse().map_err(|_| format!("unsupported format `{value}` (expected mp3 or m4a)"))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!(error = ?err, "Batch failed");
            eprintln!("error: {}", *err);
            ExitCode::FAILURE
        },
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config =
        Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Setup("could not load configuration".into()))?;
    match cli.command {
        Command::Resolve { reference } => {
            let orchestrator = BatchOrchestrator::new(config.clone(), Services::production(&config, false)?);
            let playlist = orchestrator.resolve(&reference).await?;
            for item in playlist.items() {
                println!("{}  {}", mmss(item.duration_seconds), item.title);
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Annotate { reference } => {
            let orchestrator = BatchOrchestrator::new(config.clone(), Services::production(&config, false)?);
            let mut playlist = orchestrator.resolve(&reference).await?;
            let status = orchestrator.annotate(&mut playlist).await;
            for entry in &playlist {
                let p = &entry.properties;
                println!(
                    "{}\n    song: {}\n    album: {}\n    artist: {}\n    genre: {}",
                    entry.item.title, p.song, p.album, p.artist, p.genre
                );
            }
            if status == AnnotationStatus::NoMetadata {
                println!("No metadata available.");
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Download(args) => {
            if let Some(dest) = args.dest {
                config.destination = dest;
            }
            if let Some(format) = args.format {
                config.format = format;
            }
            if let Some(workers) = args.workers {
                config.workers = workers;
            }
            config.annotate |= args.annotate;
            config.validate().or_raise(|| ErrorKind::Setup("invalid configuration".into()))?;

            let services = Services::production(&config, config.format.needs_transcode())?;
            let orchestrator =
                BatchOrchestrator::new(config.clone(), services).with_observer(Arc::new(report_progress));
            let started = std::time::Instant::now();
            let mut prepared = orchestrator.prepare(&args.reference).await?;
            if prepared.annotation == AnnotationStatus::NoMetadata {
                println!("No metadata available; using defaults.");
            }
            let overrides = [(Field::Album, args.album), (Field::Artist, args.artist), (Field::Genre, args.genre)];
            for (field, value) in overrides {
                if let Some(value) = value {
                    prepared.playlist.set_all(field, &value);
                }
            }
            let mut result = orchestrator.acquire(&prepared.playlist, &config.destination, config.format).await?;
            result.annotation = prepared.annotation;
            result.elapsed = started.elapsed();
            Ok(summarise(&result))
        },
    }
}

fn report_progress(event: &BatchEvent) {
    match event {
        BatchEvent::ResolveAttempt { attempt, of } if *attempt > 1 => println!("Reattempting ({attempt}/{of})..."),
        BatchEvent::Resolved { items } => println!("Found {items} item(s)."),
        BatchEvent::ItemFinished { title, ok: false } => println!("Failed: {title}"),
        _ => {},
    }
}

fn summarise(result: &BatchResult) -> ExitCode {
    let total = result.succeeded + result.failed_titles.len();
    println!("Downloaded {} of {} in {}", result.succeeded, total, elapsed(result.elapsed));
    if result.is_complete_success() { ExitCode::SUCCESS } else { ExitCode::from(2) }
}

/// `N min. S sec.`
fn elapsed(duration: Duration) -> String {
    let seconds = duration.as_secs();
    format!("{} min. {} sec.", seconds / 60, seconds % 60)
}
