use std::fs;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::cloud::{ObjectStore, StoreFactory};
use crate::config::UploadJob;
use crate::constants::UPLOAD_POOL_SIZE;
use crate::error::FatalBatchError;
use crate::writer::key::object_key;
use crate::writer::pool::WorkerPool;

/// Outcome of a batch that settled without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    /// Batch number used in the object keys
    pub batch: u64,
    pub uploaded: usize,
    /// Jobs whose local file did not exist
    pub skipped: usize,
    /// Local files removed after the uploads
    pub deleted: usize,
}

#[derive(Default)]
struct BatchStats {
    uploaded: AtomicUsize,
    skipped: AtomicUsize,
}

/// Uploads a fixed list of files in parallel and removes the local copies.
///
/// Every call to [`BatchUploader::upload`] is one batch. Keys are numbered with
/// the batch counter, which only advances when a batch settles successfully.
pub struct BatchUploader<F: StoreFactory> {
    jobs: Vec<UploadJob>,
    upload_count: u64,
    endpoint_override: Option<String>,
    factory: Arc<F>,
    pool_size: usize,
}

impl<F: StoreFactory> BatchUploader<F> {
    pub fn new(jobs: Vec<UploadJob>, endpoint_override: Option<String>, factory: F) -> Self {
        BatchUploader {
            jobs,
            upload_count: 0,
            endpoint_override,
            factory: Arc::new(factory),
            pool_size: UPLOAD_POOL_SIZE,
        }
    }

    /// Override the number of upload workers
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn jobs(&self) -> &[UploadJob] {
        &self.jobs
    }

    /// Number of batches that completed without a fatal error
    pub fn upload_count(&self) -> u64 {
        self.upload_count
    }

    pub fn endpoint_override(&self) -> Option<&str> {
        self.endpoint_override.as_deref()
    }

    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// Upload every existing file, then delete all job paths and advance the counter.
    ///
    /// Missing files are skipped. Any other fault aborts the batch before
    /// cleanup: no file is deleted and the counter stays where it was.
    pub async fn upload(&mut self) -> Result<BatchSummary, FatalBatchError> {
        let upload_num = self.upload_count;
        info!("Uploading {} files to S3 (batch {})", self.jobs.len(), upload_num);

        let stats = Arc::new(BatchStats::default());
        self.dispatch(upload_num, &stats)
            .await
            .map_err(|e| FatalBatchError::from_fault(&e))?;

        let deleted = remove_local_files(&self.jobs).map_err(|e| FatalBatchError::from_fault(&e))?;
        self.upload_count += 1;

        let summary = BatchSummary {
            batch: upload_num,
            uploaded: stats.uploaded.load(Ordering::SeqCst),
            skipped: stats.skipped.load(Ordering::SeqCst),
            deleted,
        };
        debug!("Batch {} settled: {:?}", upload_num, summary);
        Ok(summary)
    }

    async fn dispatch(&self, upload_num: u64, stats: &Arc<BatchStats>) -> Result<()> {
        let pool = WorkerPool::new(self.pool_size)?;
        let factory = Arc::clone(&self.factory);
        let endpoint_override = self.endpoint_override.clone();
        let stats = Arc::clone(stats);

        pool.run(self.jobs.clone(), move |job: UploadJob| {
            let factory = Arc::clone(&factory);
            let endpoint_override = endpoint_override.clone();
            let stats = Arc::clone(&stats);
            async move {
                upload_job(
                    factory.as_ref(),
                    &job,
                    endpoint_override.as_deref(),
                    upload_num,
                    &stats,
                )
                .await
            }
        })
        .await
    }
}

async fn upload_job<F: StoreFactory>(
    factory: &F,
    job: &UploadJob,
    endpoint_override: Option<&str>,
    upload_num: u64,
    stats: &BatchStats,
) -> Result<()> {
    if !job.local_path.exists() {
        debug!("Skipping {}: file does not exist", job.local_path.display());
        stats.skipped.fetch_add(1, Ordering::SeqCst);
        return Ok(());
    }

    let store = factory.create(job, endpoint_override)?;
    let key = object_key(&job.prefix, &job.local_path, upload_num);

    info!("Uploading {}", key);
    store
        .upload_file(&key, &job.local_path)
        .await
        .context(format!(
            "Failed to upload {} to s3://{}/{}",
            job.local_path.display(),
            job.bucket,
            key
        ))?;
    info!("Uploaded {}", key);

    stats.uploaded.fetch_add(1, Ordering::SeqCst);
    Ok(())
}

/// Delete every job path; paths that never existed are ignored
fn remove_local_files(jobs: &[UploadJob]) -> Result<usize> {
    let mut removed = 0;
    for job in jobs {
        match fs::remove_file(&job.local_path) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).context(format!("Failed to remove {}", job.local_path.display()));
            }
        }
    }
    Ok(removed)
}
