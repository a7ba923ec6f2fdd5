use log::info;
use once_cell::sync::OnceCell;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("storage responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

/// Client for the object-storage bucket holding event images.
///
/// Objects are addressed as `{base_url}/storage/v1/object/{bucket}/{path}` and
/// served publicly under `{base_url}/storage/v1/object/public/{bucket}/{path}`.
#[derive(Clone)]
pub struct StorageManager {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

static INSTANCE: OnceCell<StorageManager> = OnceCell::new();

impl StorageManager {
    pub fn new(base_url: &str, bucket: &str, service_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            service_key: service_key.to_string(),
        }
    }

    pub fn init_global(base_url: &str, bucket: &str, service_key: &str) -> &'static StorageManager {
        INSTANCE.get_or_init(|| Self::new(base_url, bucket, service_key))
    }

    pub fn global() -> Option<&'static StorageManager> {
        INSTANCE.get()
    }

    /// Uploads an object, replacing any existing object at the same path so
    /// re-running a migration lands on the same name.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("Uploaded {} to bucket {}", path, self.bucket);
        Ok(())
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_has_bucket_and_path() {
        let store = StorageManager::new("https://backend.example.com/", "event-images", "key");
        assert_eq!(
            store.public_url("migrated-42.png"),
            "https://backend.example.com/storage/v1/object/public/event-images/migrated-42.png"
        );
    }
}
