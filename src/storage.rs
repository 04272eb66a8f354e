//! File storage backend boundary.
//!
//! URLs are per-user application-data rooted (`files/<home>/<name>`); the
//! storage service resolves them against the caller's credentials.

use crate::{Error, Result};

/// A downloaded file: original filename plus raw bytes.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Boundary trait for the file storage backend. Credentials are per call.
#[async_trait::async_trait]
pub trait FileStorage: Send + Sync {
    async fn download(&self, url: &str, api_key: &str) -> Result<DownloadedFile>;

    async fn upload(&self, url: &str, bytes: Vec<u8>, api_key: &str) -> Result<()>;

    /// Root of the caller's application-data namespace.
    async fn appdata_home(&self, api_key: &str) -> Result<String>;
}

/// Production storage client.
pub struct HttpFileStorage {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFileStorage {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(crate::config::http_timeout_from_env())
            .build()
            .map_err(|e| Error::configuration(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl FileStorage for HttpFileStorage {
    async fn download(&self, url: &str, api_key: &str) -> Result<DownloadedFile> {
        let endpoint = format!("{}/v1/{}", self.base_url, url.trim_start_matches('/'));
        let response = self
            .client
            .get(&endpoint)
            .header("Api-Key", api_key)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::storage(format!(
                "download of `{url}` failed with HTTP {status}"
            )));
        }
        let filename = filename_from_disposition(
            response
                .headers()
                .get(reqwest::header::CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok()),
        )
        .unwrap_or_else(|| filename_from_url(url));
        let bytes = response.bytes().await?.to_vec();
        Ok(DownloadedFile { filename, bytes })
    }

    async fn upload(&self, url: &str, bytes: Vec<u8>, api_key: &str) -> Result<()> {
        let endpoint = format!("{}/v1/{}", self.base_url, url.trim_start_matches('/'));
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename_from_url(url));
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .client
            .put(&endpoint)
            .header("Api-Key", api_key)
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::storage(format!(
                "upload of `{url}` failed with HTTP {status}"
            )));
        }
        Ok(())
    }

    async fn appdata_home(&self, api_key: &str) -> Result<String> {
        let endpoint = format!("{}/v1/bucket", self.base_url);
        let response = self
            .client
            .get(&endpoint)
            .header("Api-Key", api_key)
            .send()
            .await?
            .error_for_status()
            .map_err(Error::from)?;
        let body: serde_json::Value = response.json().await?;
        let bucket = body
            .get("bucket")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| Error::storage("bucket response carried no bucket id"))?;
        Ok(format!("{bucket}/appdata"))
    }
}

fn filename_from_url(url: &str) -> String {
    url.rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("file")
        .to_string()
}

fn filename_from_disposition(header: Option<&str>) -> Option<String> {
    let header = header?;
    header.split(';').find_map(|part| {
        let part = part.trim();
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
    })
}
