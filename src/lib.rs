//! # s3-batch-writer
//!
//! Uploads batches of locally produced files (metrics, logs, checkpoints) to
//! Amazon S3 or an S3-compatible endpoint in parallel, then deletes the local
//! copies.
//!
//! ## Overview
//!
//! A [`writer::BatchUploader`] owns a fixed list of upload jobs. Every call to
//! `upload()` is one batch:
//!
//! - Jobs are dispatched to a fixed-size worker pool
//! - Jobs whose local file does not exist are skipped silently
//! - Each remaining job gets its own store client and uploads to
//!   `<prefix>/<directory>/<batch>-<filename>`, with per-agent directories
//!   (`agent/`, `agent_<n>/`) removed from the key
//! - Once every worker settles, all job paths are deleted and the batch
//!   counter advances
//!
//! Any fault escaping the pool aborts the batch with a
//! [`error::FatalBatchError`]. The binary reports it and exits.
//!
//! ## Usage
//!
//! ```no_run
//! use s3_batch_writer::cloud::S3StoreFactory;
//! use s3_batch_writer::config::UploadJob;
//! use s3_batch_writer::writer::BatchUploader;
//!
//! # async fn example() -> Result<(), s3_batch_writer::error::FatalBatchError> {
//! let jobs = vec![
//!     UploadJob::new("sim-metrics", "runs/42", "us-east-1", "/tmp/metrics/agent_0/training.json"),
//!     UploadJob::new("sim-metrics", "runs/42", "us-east-1", "/tmp/metrics/agent_0/eval.json"),
//! ];
//!
//! let mut uploader = BatchUploader::new(jobs, None, S3StoreFactory::default());
//! let summary = uploader.upload().await?;
//! println!("Uploaded {} files in batch {}", summary.uploaded, summary.batch);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions
//! - [`config`]: Upload jobs and the YAML job manifest
//! - [`cloud`]: Object store traits and the S3 implementation
//! - [`writer`]: Worker pool, key derivation and the batch uploader
//! - [`error`]: Fatal batch errors and the report-and-exit policy
//! - [`constants`]: Application-wide constants

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Upload jobs and job manifest loading
pub mod config;

/// Object store integration (S3)
pub mod cloud;

/// Parallel batch upload
pub mod writer;

/// Fatal error type and reporting
pub mod error;

/// Application constants and configuration values
pub mod constants;
