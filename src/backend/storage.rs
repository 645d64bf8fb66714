use reqwest::Method;

use super::{BackendClient, BackendError};

const CACHE_CONTROL_SECS: u32 = 3600;

impl BackendClient {
    /// Uploads an object into the configured bucket, replacing any object at `path`.
    pub async fn upload_object(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<(), BackendError> {
        let bucket = &self.config().bucket;
        let request = self
            .request(
                Method::POST,
                &format!("storage/v1/object/{bucket}/{}", path.trim_start_matches('/')),
            )
            .header("x-upsert", "true")
            .header("cache-control", format!("max-age={CACHE_CONTROL_SECS}"))
            .header("content-type", content_type)
            .body(bytes);
        self.send(&format!("upload:{bucket}"), request).await?;
        Ok(())
    }

    /// Public URL of an object in the configured bucket.
    pub fn public_url(&self, path: &str) -> String {
        self.config().endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            self.config().bucket,
            path.trim_start_matches('/')
        ))
    }
}
