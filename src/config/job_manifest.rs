use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::env_vars::expand_env_vars;

/// A single file to ship to the object store.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub bucket: String,
    #[serde(default)]
    pub prefix: String,
    pub region: String,
    pub local_path: PathBuf,
}

impl UploadJob {
    pub fn new(bucket: &str, prefix: &str, region: &str, local_path: impl Into<PathBuf>) -> Self {
        UploadJob {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
            region: region.to_string(),
            local_path: local_path.into(),
        }
    }
}

/// Job manifest consumed by the command line tool.
///
/// ```yaml
/// endpoint_url: http://localhost:9000
/// jobs:
///   - bucket: sim-metrics
///     prefix: runs/${RUN_ID}
///     region: us-east-1
///     local_path: /tmp/metrics/agent_0/training.json
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct JobManifest {
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub jobs: Vec<UploadJob>,
}

impl JobManifest {
    /// Load a manifest from a YAML file, expanding environment variables and validating jobs
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .context(format!("Failed to read job manifest: {}", path.display()))?;

        let mut manifest = Self::from_yaml_str(&content)
            .context(format!("Invalid job manifest: {}", path.display()))?;
        manifest.process_environment_variables();
        manifest.validate()?;

        debug!("Loaded {} upload jobs from {}", manifest.jobs.len(), path.display());
        Ok(manifest)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).context("Failed to parse YAML job manifest")
    }

    /// Expand `$VAR` / `${VAR}` references in prefixes and local paths
    pub fn process_environment_variables(&mut self) {
        for job in &mut self.jobs {
            job.prefix = expand_env_vars(&job.prefix).into_owned();
            let expanded = PathBuf::from(expand_env_vars(&job.local_path.to_string_lossy()).as_ref());
            job.local_path = expanded;
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (index, job) in self.jobs.iter().enumerate() {
            if job.bucket.trim().is_empty() {
                bail!("Job {} has an empty bucket", index);
            }
            if job.region.trim().is_empty() {
                bail!("Job {} ({}) has an empty region", index, job.bucket);
            }
            if job.local_path.as_os_str().is_empty() {
                bail!("Job {} ({}) has an empty local_path", index, job.bucket);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
endpoint_url: http://localhost:9000
jobs:
  - bucket: sim-metrics
    prefix: runs/eval
    region: us-east-1
    local_path: /tmp/metrics/agent_0/training.json
  - bucket: sim-metrics
    region: us-west-2
    local_path: /tmp/metrics/eval.json
"#;

    #[test]
    fn test_parse_manifest() {
        let manifest = JobManifest::from_yaml_str(MANIFEST).unwrap();

        assert_eq!(manifest.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(manifest.jobs.len(), 2);
        assert_eq!(
            manifest.jobs[0],
            UploadJob::new("sim-metrics", "runs/eval", "us-east-1", "/tmp/metrics/agent_0/training.json")
        );
        // Prefix defaults to empty
        assert_eq!(manifest.jobs[1].prefix, "");
    }

    #[test]
    fn test_parse_manifest_without_jobs() {
        let manifest = JobManifest::from_yaml_str("endpoint_url: null\n").unwrap();
        assert!(manifest.endpoint_url.is_none());
        assert!(manifest.jobs.is_empty());
    }

    #[test]
    fn test_parse_manifest_missing_bucket() {
        let result = JobManifest::from_yaml_str("jobs:\n  - region: us-east-1\n    local_path: /tmp/x\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let mut manifest = JobManifest::default();
        manifest.jobs.push(UploadJob::new(" ", "p", "us-east-1", "/tmp/a"));
        let err = manifest.validate().unwrap_err();
        assert!(err.to_string().contains("empty bucket"));

        manifest.jobs[0] = UploadJob::new("b", "p", "", "/tmp/a");
        assert!(manifest.validate().unwrap_err().to_string().contains("empty region"));

        manifest.jobs[0] = UploadJob::new("b", "p", "us-east-1", "");
        assert!(manifest.validate().unwrap_err().to_string().contains("empty local_path"));
    }

    #[test]
    fn test_from_yaml_file_expands_env_vars() -> Result<()> {
        std::env::set_var("S3W_MANIFEST_RUN", "run-7");
        std::env::set_var("S3W_MANIFEST_DIR", "/var/sim");

        let mut file = NamedTempFile::new()?;
        writeln!(
            file,
            "jobs:\n  - bucket: b\n    prefix: runs/${{S3W_MANIFEST_RUN}}\n    region: us-east-1\n    local_path: $S3W_MANIFEST_DIR/metrics.json"
        )?;
        file.flush()?;

        let manifest = JobManifest::from_yaml_file(file.path())?;
        assert_eq!(manifest.jobs[0].prefix, "runs/run-7");
        assert_eq!(manifest.jobs[0].local_path, PathBuf::from("/var/sim/metrics.json"));

        std::env::remove_var("S3W_MANIFEST_RUN");
        std::env::remove_var("S3W_MANIFEST_DIR");
        Ok(())
    }

    #[test]
    fn test_from_yaml_file_missing() {
        let result = JobManifest::from_yaml_file(Path::new("/nonexistent/manifest.yaml"));
        assert!(result.unwrap_err().to_string().contains("Failed to read job manifest"));
    }
}
