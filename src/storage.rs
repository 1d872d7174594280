//! S3-compatible object storage. Clients upload straight to the bucket with a
//! presigned PUT URL; the server only signs and deletes.

use std::time::Duration;

use aws_sdk_s3::{presigning::PresigningConfig, Client};
use thiserror::Error;
use uuid::Uuid;

const UPLOAD_URL_TTL: Duration = Duration::from_secs(360);

#[derive(Debug, Error)]
pub enum StorageError{
    #[error("presigning failed: {0}")]
    Presign(String),
    #[error("delete failed: {0}")]
    Delete(String),
}

pub struct ObjectStore{
    client: Client,
    bucket: String,
}

impl ObjectStore {
    pub fn new(client: Client, bucket: String) -> Self {
        ObjectStore { client, bucket }
    }

    /// Builds the client from the ambient AWS configuration; `endpoint` switches to
    /// path-style addressing for S3-compatible providers.
    pub async fn from_env(bucket: String, endpoint: Option<&str>) -> Self {
        let shared = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        ObjectStore::new(Client::from_conf(builder.build()), bucket)
    }

    /// Returns `(presigned_url, key)`.
    pub async fn presign_upload(&self, file_name: &str, content_type: &str, size: i64) -> Result<(String, String), StorageError> {
        let key = object_key(file_name);
        let presigning = PresigningConfig::expires_in(UPLOAD_URL_TTL)
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .content_length(size)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok((presigned.uri().to_string(), key))
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::Delete(e.to_string()))?;

        Ok(())
    }
}

/// `<uuid>-<file name>`, with path separators and whitespace flattened.
pub fn object_key(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' || c.is_whitespace() { '-' } else { c })
        .collect();
    format!("{}-{}", Uuid::new_v4(), cleaned)
}

#[cfg(test)]
pub(crate) fn offline_client() -> Client {
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("auto"))
        .credentials_provider(Credentials::new("test-key", "test-secret", None, None, "test"))
        .endpoint_url("http://127.0.0.1:9000")
        .force_path_style(true)
        .build();
    Client::from_conf(config)
}

#[cfg(test)]
mod tests{
    use super::*;

    #[test]
    fn test_object_key_is_unique_and_flat(){
        let a = object_key("my cover/image.png");
        let b = object_key("my cover/image.png");
        assert_ne!(a, b);
        assert!(a.ends_with("-my-cover-image.png"));
        assert!(!a.contains('/'));
    }

    #[actix_web::test]
    async fn test_presign_upload_signs_key(){
        let store = ObjectStore::new(offline_client(), "course-media".to_string());
        let (url, key) = store.presign_upload("intro.mp4", "video/mp4", 1024).await.unwrap();

        assert!(url.starts_with("http://127.0.0.1:9000/course-media/"));
        assert!(url.contains(&key));
        assert!(url.contains("X-Amz-Signature="));
    }
}
