use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::future;
use log::{debug, warn};
use rusoto_core::ByteStream;
use rusoto_s3::{
    AbortMultipartUploadRequest, CompleteMultipartUploadRequest, CompletedMultipartUpload,
    CompletedPart, CreateMultipartUploadRequest, PutObjectRequest, S3Client, UploadPartRequest, S3,
};
use tokio::fs::File as AsyncFile;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio::time::sleep;

use crate::cloud::client::create_s3_client;
use crate::cloud::store::{ObjectStore, StoreFactory};
use crate::config::UploadJob;
use crate::constants::{
    LARGE_FILE_THRESHOLD, MAX_CONCURRENT_PARTS, MAX_UPLOAD_RETRIES, RETRY_BASE_DELAY_MS,
    S3_UPLOAD_CHUNK_SIZE as UPLOAD_CHUNK_SIZE,
};

/// Delay before retry number `attempt` (1-based)
pub fn retry_delay(attempt: usize) -> Duration {
    Duration::from_millis(RETRY_BASE_DELAY_MS * 2u64.pow(attempt as u32))
}

/// Number of multipart parts needed for a file of `file_size` bytes
pub fn part_count(file_size: u64) -> u64 {
    (file_size + UPLOAD_CHUNK_SIZE as u64 - 1) / UPLOAD_CHUNK_SIZE as u64
}

/// S3 bucket bound to a single job.
///
/// Small files go up with one `PutObject`, files above [`LARGE_FILE_THRESHOLD`]
/// use multipart upload. Every request is retried with exponential backoff.
pub struct S3ObjectStore {
    bucket: String,
    client: S3Client,
}

impl fmt::Debug for S3ObjectStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3ObjectStore")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl S3ObjectStore {
    pub fn new(bucket: &str, client: S3Client) -> Self {
        S3ObjectStore {
            bucket: bucket.to_string(),
            client,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload a small file using PutObject
    async fn upload_small_file(&self, file_path: &Path, key: &str) -> Result<()> {
        let contents = tokio::fs::read(file_path)
            .await
            .context(format!("Failed to read {} for S3 upload", file_path.display()))?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            // ByteStream consumes its buffer, so every attempt gets its own copy
            let request = PutObjectRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                body: Some(ByteStream::from(contents.clone())),
                ..Default::default()
            };

            match self.client.put_object(request).await {
                Ok(_) => return Ok(()),
                Err(e) => {
                    if attempt >= MAX_UPLOAD_RETRIES {
                        return Err(anyhow!(
                            "Failed to upload to S3 after {} attempts: {}",
                            MAX_UPLOAD_RETRIES,
                            e
                        ));
                    }
                    let delay = retry_delay(attempt);
                    warn!("S3 upload attempt {} failed, retrying in {:?}: {}", attempt, delay, e);
                    sleep(delay).await;
                }
            }
        }
    }

    /// Upload a large file using multipart upload
    async fn upload_large_file(&self, file_path: &Path, key: &str, file_size: u64) -> Result<()> {
        let create_result = self
            .client
            .create_multipart_upload(CreateMultipartUploadRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                ..Default::default()
            })
            .await
            .context("Failed to initialize multipart upload")?;

        let upload_id = create_result
            .upload_id
            .ok_or_else(|| anyhow!("No upload ID returned from S3"))?;

        debug!("Started multipart upload with ID: {} for {}", upload_id, file_path.display());

        match self.upload_parts(file_path, key, &upload_id, file_size).await {
            Ok(parts) => {
                let complete_request = CompleteMultipartUploadRequest {
                    bucket: self.bucket.clone(),
                    key: key.to_string(),
                    upload_id: upload_id.clone(),
                    multipart_upload: Some(CompletedMultipartUpload { parts: Some(parts) }),
                    ..Default::default()
                };
                self.client
                    .complete_multipart_upload(complete_request)
                    .await
                    .context("Failed to complete multipart upload")?;
                debug!("Completed multipart upload for {}", file_path.display());
                Ok(())
            }
            Err(e) => {
                let _ = self
                    .client
                    .abort_multipart_upload(AbortMultipartUploadRequest {
                        bucket: self.bucket.clone(),
                        key: key.to_string(),
                        upload_id,
                        ..Default::default()
                    })
                    .await;
                Err(anyhow!("Part upload failed, aborting multipart upload: {}", e))
            }
        }
    }

    async fn upload_parts(
        &self,
        file_path: &Path,
        key: &str,
        upload_id: &str,
        file_size: u64,
    ) -> Result<Vec<CompletedPart>> {
        let num_parts = part_count(file_size);
        let concurrency_limit = std::cmp::min(MAX_CONCURRENT_PARTS, num_cpus::get()).max(1) as u64;
        let mut completed_parts = Vec::with_capacity(num_parts as usize);

        debug!("Uploading {} parts for {}", num_parts, file_path.display());

        for chunk_start in (1..=num_parts).step_by(concurrency_limit as usize) {
            let chunk_end = std::cmp::min(chunk_start + concurrency_limit - 1, num_parts);
            let chunk_futures = (chunk_start..=chunk_end)
                .map(|part_number| self.upload_part(file_path, key, upload_id, part_number, file_size));

            for result in future::join_all(chunk_futures).await {
                completed_parts.push(result?);
            }
        }

        completed_parts.sort_by_key(|part| part.part_number);
        Ok(completed_parts)
    }

    async fn upload_part(
        &self,
        file_path: &Path,
        key: &str,
        upload_id: &str,
        part_number: u64,
        file_size: u64,
    ) -> Result<CompletedPart> {
        let start_byte = (part_number - 1) * UPLOAD_CHUNK_SIZE as u64;
        let end_byte = std::cmp::min(part_number * UPLOAD_CHUNK_SIZE as u64, file_size);
        let part_size = (end_byte - start_byte) as usize;

        let mut attempts = 0;
        loop {
            attempts += 1;

            let mut file = AsyncFile::open(file_path).await?;
            file.seek(std::io::SeekFrom::Start(start_byte)).await?;
            let mut buffer = vec![0u8; part_size];
            file.read_exact(&mut buffer).await?;

            let request = UploadPartRequest {
                bucket: self.bucket.clone(),
                key: key.to_string(),
                upload_id: upload_id.to_string(),
                part_number: part_number as i64,
                body: Some(ByteStream::from(buffer)),
                ..Default::default()
            };

            match self.client.upload_part(request).await {
                Ok(output) => {
                    let e_tag = output
                        .e_tag
                        .ok_or_else(|| anyhow!("No ETag in upload part response"))?;
                    return Ok(CompletedPart {
                        e_tag: Some(e_tag),
                        part_number: Some(part_number as i64),
                    });
                }
                Err(e) => {
                    if attempts >= MAX_UPLOAD_RETRIES {
                        return Err(anyhow!(
                            "Failed to upload part {} after {} attempts: {}",
                            part_number,
                            MAX_UPLOAD_RETRIES,
                            e
                        ));
                    }
                    let delay = retry_delay(attempts);
                    warn!(
                        "Part {} upload attempt {} failed, retrying in {:?}: {}",
                        part_number, attempts, delay, e
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload_file(&self, key: &str, local_path: &Path) -> Result<()> {
        let metadata = tokio::fs::metadata(local_path)
            .await
            .context(format!("Failed to get metadata for {}", local_path.display()))?;
        let file_size = metadata.len();
        let start_time = Instant::now();

        if file_size > LARGE_FILE_THRESHOLD {
            self.upload_large_file(local_path, key, file_size).await?;
        } else {
            self.upload_small_file(local_path, key).await?;
        }

        debug!(
            "Uploaded {} ({} bytes) to s3://{}/{} in {:?}",
            local_path.display(),
            file_size,
            self.bucket,
            key,
            start_time.elapsed()
        );
        Ok(())
    }
}

/// Creates one [`S3ObjectStore`] per job.
#[derive(Debug, Clone, Default)]
pub struct S3StoreFactory {
    profile: Option<String>,
}

impl S3StoreFactory {
    pub fn new(profile: Option<String>) -> Self {
        S3StoreFactory { profile }
    }
}

impl StoreFactory for S3StoreFactory {
    type Store = S3ObjectStore;

    fn create(&self, job: &UploadJob, endpoint_override: Option<&str>) -> Result<S3ObjectStore> {
        let client = create_s3_client(&job.region, endpoint_override, self.profile.as_deref())
            .context(format!("Failed to create S3 client for bucket {}", job.bucket))?;
        Ok(S3ObjectStore::new(&job.bucket, client))
    }
}
