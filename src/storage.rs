use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageFetchError {
    #[error("failed to download s3://{bucket}/{key}: {source}")]
    Download {
        bucket: String,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Fetches the raw encoded bytes of the object at `bucket`/`key`.
    async fn fetch_image(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ImageFetchError>;
}

pub struct S3ImageStore {
    client: aws_sdk_s3::Client,
}

impl S3ImageStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ImageStore for S3ImageStore {
    #[tracing::instrument(skip(self))]
    async fn fetch_image(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ImageFetchError> {
        let download_error =
            |source: Box<dyn std::error::Error + Send + Sync>| ImageFetchError::Download {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            };

        let object = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| download_error(Box::new(e)))?;

        let bytes = object
            .body
            .collect()
            .await
            .map_err(|e| download_error(Box::new(e)))?
            .into_bytes();
        tracing::debug!("Fetched {} bytes from s3://{}/{}", bytes.len(), bucket, key);

        Ok(bytes.to_vec())
    }
}
