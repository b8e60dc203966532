//! Parallel batch writer.
//!
//! [`BatchUploader`] fans a job list out over a fixed [`WorkerPool`], uploads
//! every file that exists under a key derived by [`object_key`], and removes
//! the local files once every worker has settled.

/// Batch upload orchestration and local cleanup
pub mod batch;

/// Object key derivation
pub mod key;

/// Bounded worker pool over a shared task queue
pub mod pool;

pub use batch::{BatchSummary, BatchUploader};
pub use key::{object_key, strip_agent_dirs};
pub use pool::WorkerPool;
