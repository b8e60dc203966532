use anyhow::{anyhow, Context, Result};
use log::debug;
use rusoto_core::{HttpClient, Region};
use rusoto_credential::{DefaultCredentialsProvider, ProfileProvider};
use rusoto_s3::S3Client;

/// Resolve the region for a job.
///
/// With an endpoint override the region name is kept for request signing and
/// the requests go to the custom endpoint.
pub fn resolve_region(region_name: &str, endpoint_override: Option<&str>) -> Result<Region> {
    match endpoint_override {
        Some(endpoint) => Ok(Region::Custom {
            name: region_name.to_string(),
            endpoint: endpoint.to_string(),
        }),
        None => region_name
            .parse::<Region>()
            .map_err(|_| anyhow!("Invalid AWS region '{}'", region_name)),
    }
}

/// Create an S3 client with the specified region, endpoint override and profile
pub fn create_s3_client(
    region_name: &str,
    endpoint_override: Option<&str>,
    profile: Option<&str>,
) -> Result<S3Client> {
    let region = resolve_region(region_name, endpoint_override)?;
    debug!("Creating S3 client for region {:?}", region);

    let http_client = HttpClient::new().context("Failed to create HTTP client")?;

    let s3_client = match profile {
        Some(profile_name) => {
            let mut provider = ProfileProvider::new()
                .context("Failed to create AWS profile provider")?;
            provider.set_profile(profile_name);
            S3Client::new_with(http_client, provider, region)
        }
        None => {
            let provider = DefaultCredentialsProvider::new()
                .context("Failed to create AWS credentials provider")?;
            S3Client::new_with(http_client, provider, region)
        }
    };

    Ok(s3_client)
}
