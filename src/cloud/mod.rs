//! Object store integration for batch uploads.
//!
//! The batch writer only talks to the [`ObjectStore`] trait. A new store is
//! built for every job through a [`StoreFactory`], which keeps each worker's
//! connection state private and lets tests substitute an in-memory store.
//!
//! ## Amazon S3
//!
//! [`S3StoreFactory`] is the production factory. It creates a rusoto
//! `S3Client` per job using the job's region, or a custom region when an
//! endpoint override is configured (MinIO, LocalStack and similar).
//!
//! ```no_run
//! use s3_batch_writer::cloud::{ObjectStore, S3StoreFactory, StoreFactory};
//! use s3_batch_writer::config::UploadJob;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let job = UploadJob::new("sim-metrics", "runs/42", "us-east-1", "/tmp/metrics.json");
//! let store = S3StoreFactory::default().create(&job, None)?;
//! store.upload_file("runs/42/0-metrics.json", Path::new("/tmp/metrics.json")).await?;
//! # Ok(())
//! # }
//! ```

/// S3 client construction and region resolution
pub mod client;

/// Amazon S3 object store with multipart and retry support
pub mod s3;

/// Object store and factory traits
pub mod store;

pub use s3::{S3ObjectStore, S3StoreFactory};
pub use store::{ObjectStore, StoreFactory};
