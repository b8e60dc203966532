use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::UploadJob;

/// Destination for uploaded files.
///
/// A fresh store is created for every job so that workers never share
/// connection state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local_path` under `key`
    async fn upload_file(&self, key: &str, local_path: &Path) -> Result<()>;
}

/// Builds an [`ObjectStore`] for a job.
pub trait StoreFactory: Send + Sync + 'static {
    type Store: ObjectStore + 'static;

    /// Construct the store for `job`, honouring an optional endpoint override
    fn create(&self, job: &UploadJob, endpoint_override: Option<&str>) -> Result<Self::Store>;
}
