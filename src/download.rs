//! HTTP archive fetcher.
//!
//! Downloads one compressed snapshot to a local path, replacing whatever
//! file was there before. The client refuses anything below TLS 1.2; that
//! is a design constraint of the pipeline, not a per-call option.

use std::fs;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::contract::Downloader;

/// Bound on one archive fetch, connection included. The pipeline is
/// strictly sequential, so a stalled remote would otherwise block every
/// remaining source.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug)]
pub enum DownloadError {
    /// Transport-level failure: connection, TLS, timeout.
    Http(reqwest::Error),
    /// The server answered with a non-success status.
    Status(reqwest::StatusCode),
    /// The destination could not be prepared or written.
    Io(std::io::Error),
}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        DownloadError::Http(e)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        DownloadError::Io(e)
    }
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DownloadError::Http(e) => write!(f, "http transport failure: {e}"),
            DownloadError::Status(s) => write!(f, "server returned {s}"),
            DownloadError::Io(e) => write!(f, "filesystem failure: {e}"),
        }
    }
}

impl std::error::Error for DownloadError {}

/// Downloader backed by a shared reqwest client.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Result<Self, DownloadError> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), DownloadError> {
        info!(url = %url, dest = %dest.display(), "Fetching archive");

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        if dest.exists() {
            debug!(dest = %dest.display(), "Removing previous archive");
            fs::remove_file(dest)?;
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(url = %url, status = %status, "Archive fetch rejected by server");
            return Err(DownloadError::Status(status));
        }

        let body = response.bytes().await?;
        fs::write(dest, &body)?;
        info!(
            dest = %dest.display(),
            bytes = body.len(),
            "Archive fetched successfully"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fetch_fails_on_unresolvable_host() {
        let downloader = HttpDownloader::new().expect("client builds");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("archive.zip");

        let err = downloader
            .fetch("http://invalid.invalid/archive.zip", &dest)
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Http(_)), "got: {err:?}");
        // Ancestors are created before the request goes out.
        assert!(dest.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn fetch_times_out_on_a_stalled_server() {
        use tokio::io::AsyncReadExt;

        // Accepts the connection, reads the request and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        let downloader = HttpDownloader::with_timeout(Duration::from_millis(300))
            .expect("client builds");
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("archive.zip");

        let err = downloader
            .fetch(&format!("http://{addr}/archive.zip"), &dest)
            .await
            .unwrap_err();
        match err {
            DownloadError::Http(e) => assert!(e.is_timeout(), "expected timeout, got: {e:?}"),
            other => panic!("expected http error, got: {other:?}"),
        }
        server.abort();
    }
}
