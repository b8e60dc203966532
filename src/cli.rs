use clap::Parser;
use std::path::PathBuf;

use crate::constants::UPLOAD_POOL_SIZE;

/// Command-line arguments for the s3-batch-writer tool.
///
/// Jobs come from a YAML manifest; the remaining options tune the endpoint,
/// credentials, worker pool and how many batches to run.
#[derive(Parser, Debug)]
#[clap(name = "s3-batch-writer", about = "Upload local files to S3 in parallel batches")]
pub struct Args {
    /// Path to the YAML job manifest
    #[clap(short, long)]
    pub jobs: PathBuf,

    /// Custom S3 endpoint URL (overrides the manifest's endpoint_url)
    #[clap(long)]
    pub endpoint_url: Option<String>,

    /// AWS profile to use for S3 uploads
    #[clap(long)]
    pub profile: Option<String>,

    /// Number of concurrent upload workers
    #[clap(long, default_value_t = UPLOAD_POOL_SIZE)]
    pub pool_size: usize,

    /// Number of upload batches to run
    #[clap(long, default_value = "1")]
    pub batches: u64,

    /// Seconds to wait between batches
    #[clap(long, default_value = "0")]
    pub interval_secs: u64,

    /// Verbose logging
    #[clap(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Endpoint to use: the command line wins over the manifest
    pub fn resolve_endpoint(&self, manifest_endpoint: Option<&str>) -> Option<String> {
        self.endpoint_url
            .clone()
            .or_else(|| manifest_endpoint.map(str::to_string))
    }
}
