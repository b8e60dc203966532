mod env_vars;
mod job_manifest;

// Re-export job manifest types
pub use job_manifest::{JobManifest, UploadJob};

// Re-export environment variable expansion
pub use env_vars::expand_env_vars;
