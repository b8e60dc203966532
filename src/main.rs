use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use tokio::runtime::Runtime;

use s3_batch_writer::cli::Args;
use s3_batch_writer::cloud::S3StoreFactory;
use s3_batch_writer::config::JobManifest;
use s3_batch_writer::error::log_and_exit;
use s3_batch_writer::writer::BatchUploader;

fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.verbose)?;

    let manifest = JobManifest::from_yaml_file(&args.jobs)?;
    let endpoint_override = args.resolve_endpoint(manifest.endpoint_url.as_deref());
    if let Some(endpoint) = &endpoint_override {
        info!("Using custom S3 endpoint {}", endpoint);
    }

    let mut uploader = BatchUploader::new(
        manifest.jobs,
        endpoint_override,
        S3StoreFactory::new(args.profile.clone()),
    )
    .with_pool_size(args.pool_size);

    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;

    for batch in 0..args.batches {
        if batch > 0 && args.interval_secs > 0 {
            std::thread::sleep(Duration::from_secs(args.interval_secs));
        }

        match runtime.block_on(uploader.upload()) {
            Ok(summary) => info!(
                "Batch {} complete: {} uploaded, {} skipped, {} local files removed",
                summary.batch, summary.uploaded, summary.skipped, summary.deleted
            ),
            Err(e) => log_and_exit(&e),
        }
    }

    info!("Finished {} upload batches", uploader.upload_count());
    Ok(())
}

/// Initialize logging with the specified verbosity level
fn initialize_logging(verbose: bool) -> Result<()> {
    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };
    TermLogger::init(
        log_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .context("Failed to initialize logger")?;
    Ok(())
}
