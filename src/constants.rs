//! Global constants for the s3-batch-writer application.
//!
//! This module centralizes hardcoded values so pool sizing, upload tuning and
//! fatal error classification live in one place.

// Worker pool constants
/// Number of concurrent upload workers per batch
pub const UPLOAD_POOL_SIZE: usize = 4;

// Cloud storage constants
/// S3 upload chunk size (8MB, S3 minimum is 5MB)
pub const S3_UPLOAD_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Large file threshold for multipart uploads (50MB)
pub const LARGE_FILE_THRESHOLD: u64 = 50 * 1024 * 1024;

/// Upper bound on multipart parts uploaded at once
pub const MAX_CONCURRENT_PARTS: usize = 4;

// Timeout and retry constants
/// Maximum upload retry attempts
pub const MAX_UPLOAD_RETRIES: usize = 3;

/// Base retry delay in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 250;

// Fatal error classification
/// Error code attached to every fault escaping a batch
pub const SIMULATION_WORKER_EXCEPTION: &str = "simulation_worker.exceptions";

/// Severity attached to every fault escaping a batch
pub const EVENT_ERROR_CODE_500: &str = "500";

/// Exit status used when a batch fails
pub const FATAL_EXIT_CODE: i32 = 1;

// Key derivation
/// Directories matching this are per-agent worker folders collapsed out of object keys
pub const AGENT_DIR_PATTERN: &str = r"^(?:.*/)?agent(?:_\d+)?/";
