//! ferrosync - incremental directory synchronization to remote file stores
//!
//! Mirrors a local directory to an FTP server, S3 bucket, WebDAV share or
//! local path, transferring only the files that changed since the last
//! successful run.

mod display;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use ferrosync_config::{Config, ConfigLoader, LoggingConfig};
use ferrosync_sync::{ProgressReporter, SyncEngine, SyncOptions, SyncRequest};
use ferrosync_transport::OperatorConnector;
use ferrosync_types::{Concurrency, SessionConnector};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

/// ferrosync - incremental directory synchronization to remote file stores
#[derive(Parser, Debug)]
#[command(
    name = "ferrosync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Incrementally synchronize a local directory to a remote file store",
    long_about = "ferrosync mirrors a local directory to a remote destination.\n\
                  Files are fingerprinted by content and compared with the index of the\n\
                  last successful run, so only new and modified files are uploaded and\n\
                  only files deleted locally are removed remotely."
)]
struct Cli {
    /// Local directory to synchronize
    source: PathBuf,

    /// Destination address, e.g. user:password@host/path or s3://bucket/prefix
    #[arg(required_unless_present = "skip_upload")]
    destination: Option<String>,

    /// Write the index without uploading anything, marking the current tree as synchronized
    #[arg(long)]
    skip_upload: bool,

    /// Number of transfers in flight at once
    #[arg(short, long, value_parser = parse_jobs)]
    jobs: Option<Concurrency>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,
}

fn parse_jobs(value: &str) -> std::result::Result<Concurrency, String> {
    let jobs: usize = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    Concurrency::new(jobs)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    init_logging(&cli, &config.logging)?;

    info!("ferrosync v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Effective configuration: {:?}", config);

    let mut options = SyncOptions::from(&config.sync);
    if let Some(jobs) = cli.jobs {
        options.transfer_concurrency = jobs;
    }
    let request = SyncRequest::new(&cli.source).with_options(options);

    if cli.skip_upload {
        index_command(&cli, &request).await
    } else {
        let address = cli
            .destination
            .as_deref()
            .context("a destination is required unless --skip-upload is given")?;
        let connector = OperatorConnector::from_address(address, config.transfer.clone())?;
        sync_command(&cli, &request, &connector).await
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("failed to load configuration")?,
    };
    Ok(config)
}

fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log level '{}'", level))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(logging.colored_output)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    Ok(())
}

async fn sync_command(
    cli: &Cli,
    request: &SyncRequest,
    connector: &dyn SessionConnector,
) -> Result<()> {
    if !cli.quiet {
        println!(
            "{} Synchronizing {} to {}",
            style("⟲").blue().bold(),
            style(request.source.display()).cyan(),
            style(connector.endpoint()).cyan()
        );
    }

    let mut reporter = ProgressReporter::new(request.request_id);
    let events = reporter.take_event_receiver();
    let display = progress::ProgressDisplay::new(cli.quiet);
    let display_task = events.map(|events| tokio::spawn(display.run(events)));

    let engine = SyncEngine::new().with_progress(reporter);
    let result = engine.sync(request, connector).await;
    drop(engine);

    if let Some(task) = display_task {
        task.await.context("progress display task panicked")?;
    }

    let result = result?;
    if !cli.quiet {
        display::print_sync_summary(&result);
    }
    Ok(())
}

async fn index_command(cli: &Cli, request: &SyncRequest) -> Result<()> {
    if !cli.quiet {
        println!(
            "{} Indexing {} without uploading",
            style("ℹ").yellow(),
            style(request.source.display()).cyan()
        );
    }

    let result = SyncEngine::new().build_index(request).await?;

    if !cli.quiet {
        display::print_index_summary(&result, &request.options.index_file);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_destination_required_without_skip_upload() {
        assert!(Cli::try_parse_from(["ferrosync", "public_html"]).is_err());

        let cli = Cli::try_parse_from(["ferrosync", "public_html", "--skip-upload"]).unwrap();
        assert!(cli.skip_upload);
        assert!(cli.destination.is_none());
    }

    #[test]
    fn test_full_invocation() {
        let cli = Cli::try_parse_from([
            "ferrosync",
            "-v",
            "-j",
            "4",
            "--config",
            "ferrosync.toml",
            "site",
            "deploy@example.com/www",
        ])
        .unwrap();

        assert_eq!(cli.source, PathBuf::from("site"));
        assert_eq!(cli.destination.as_deref(), Some("deploy@example.com/www"));
        assert_eq!(cli.jobs.map(Concurrency::get), Some(4));
        assert_eq!(cli.config, Some(PathBuf::from("ferrosync.toml")));
        assert!(cli.verbose);
    }

    #[test]
    fn test_invalid_jobs() {
        assert!(parse_jobs("0").is_err());
        assert!(parse_jobs("many").is_err());
        assert_eq!(parse_jobs("8").unwrap().get(), 8);
    }
}
