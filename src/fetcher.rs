//! Fetcher: abstracts `ingest_resource`'s artifact retrieval (spec §4.2).
//!
//! One built-in implementation covers both modes named in the spec: a local
//! filesystem path is copied into the blob directory, anything else (e.g. an
//! `http(s)://` URL) is passed through untouched as its own `local_path` —
//! network fetchers are explicitly out of scope (spec §1). Writes land via a
//! temp name then rename so readers never see a partial file (spec §5).

use async_trait::async_trait;

use crate::error::{ErrorKind, MemoryError};

#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `resource_url` into `resources_dir/<resource_id>/` and
    /// returns the resulting `local_path`. Failures are terminal
    /// (`FetchFailed`, spec §4.2).
    async fn fetch(
        &self,
        resource_url: &str,
        resources_dir: &str,
        resource_id: &str,
    ) -> Result<String, MemoryError>;
}

pub struct LocalFetcher;

fn fetch_failed(message: impl Into<String>) -> MemoryError {
    MemoryError::new(ErrorKind::FetchFailed, message.into())
}

#[async_trait]
impl Fetcher for LocalFetcher {
    async fn fetch(
        &self,
        resource_url: &str,
        resources_dir: &str,
        resource_id: &str,
    ) -> Result<String, MemoryError> {
        if resource_url.starts_with("http://") || resource_url.starts_with("https://") {
            return Ok(resource_url.to_string());
        }

        let source = std::path::Path::new(resource_url);
        if !source.exists() {
            return Err(fetch_failed(format!("resource not found: {resource_url}")));
        }
        let basename = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("resource")
            .to_string();

        let dest_dir = std::path::Path::new(resources_dir).join(resource_id);
        tokio::fs::create_dir_all(&dest_dir)
            .await
            .map_err(|e| fetch_failed(format!("could not create blob directory: {e}")))?;

        let dest = dest_dir.join(&basename);
        let tmp = dest_dir.join(format!(".{basename}.tmp"));
        tokio::fs::copy(source, &tmp)
            .await
            .map_err(|e| fetch_failed(format!("could not copy resource: {e}")))?;
        tokio::fs::rename(&tmp, &dest)
            .await
            .map_err(|e| fetch_failed(format!("could not finalize resource: {e}")))?;

        Ok(dest.to_string_lossy().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passthrough_url_is_not_copied() {
        let fetcher = LocalFetcher;
        let local_path = fetcher.fetch("https://example.com/a.png", "/tmp/irrelevant", "r1").await.unwrap();
        assert_eq!(local_path, "https://example.com/a.png");
    }

    #[tokio::test]
    async fn local_file_is_copied_into_resource_subdirectory() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("source.txt");
        tokio::fs::write(&source_path, b"hello").await.unwrap();

        let blob_dir = dir.path().join("blobs");
        let fetcher = LocalFetcher;
        let local_path = fetcher
            .fetch(source_path.to_str().unwrap(), blob_dir.to_str().unwrap(), "res-1")
            .await
            .unwrap();

        assert!(local_path.ends_with("res-1/source.txt"));
        let contents = tokio::fs::read_to_string(&local_path).await.unwrap();
        assert_eq!(contents, "hello");
    }

    #[tokio::test]
    async fn missing_local_file_fails_with_fetch_failed() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = LocalFetcher;
        let err = fetcher
            .fetch("/no/such/file.txt", dir.path().to_str().unwrap(), "res-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::FetchFailed);
    }
}
