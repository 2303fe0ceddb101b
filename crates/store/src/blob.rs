//! S3-backed blob storage for uploaded documents pending ingestion.
//! Not named as a port in `support_agent_core` (parsing is the opaque
//! boundary, not storage of the raw upload), so this is a concrete
//! helper the gateway/ingestion binary wiring uses directly.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

use support_agent_core::{Error, Result};

pub struct BlobStore {
    client: Client,
    bucket: String,
}

impl BlobStore {
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    pub async fn put(&self, key: &str, bytes: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("blob upload failed: {err}")))?;
        Ok(())
    }

    pub async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("blob download failed: {err}")))?;
        let bytes = object
            .body
            .collect()
            .await
            .map_err(|err| Error::Other(anyhow::anyhow!("blob body read failed: {err}")))?;
        Ok(bytes.into_bytes().to_vec())
    }
}
