use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::error::FantaError;

pub trait ArchiveClient: Send + Sync {
    /// Fetches a gzip-compressed file and writes the decompressed bytes to
    /// `destination`.
    fn download_gz(&self, url: &str, destination: &Path) -> Result<(), FantaError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new() -> Result<Self, FantaError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("fantabio-rdf/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| FantaError::Filesystem(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(600))
            .build()
            .map_err(|err| FantaError::DownloadHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn send_with_retries(&self, url: &str) -> Result<reqwest::blocking::Response, FantaError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        debug!(url, status, attempt, "retrying download");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        debug!(url, attempt, error = %err, "retrying download");
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(FantaError::DownloadHttp(err.to_string()));
                }
            }
        }
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn download_gz(&self, url: &str, destination: &Path) -> Result<(), FantaError> {
        let response = self.send_with_retries(url)?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "download failed".to_string());
            return Err(FantaError::DownloadStatus { status, message });
        }
        write_gunzipped(response, destination)
    }
}

/// Streams a gzip reader into `destination` through a temp file in the same
/// directory, so a truncated download never replaces an existing file.
pub fn write_gunzipped<R: io::Read>(reader: R, destination: &Path) -> Result<(), FantaError> {
    let parent = destination
        .parent()
        .ok_or_else(|| FantaError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| FantaError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("fantabio-download")
        .tempfile_in(parent)
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    let mut decoder = GzDecoder::new(reader);
    io::copy(&mut decoder, temp.as_file_mut())
        .map_err(|err| FantaError::Decompress(err.to_string()))?;
    temp.persist(destination)
        .map_err(|err| FantaError::Filesystem(err.to_string()))?;
    Ok(())
}

/// `https://host/path/human.jsonl.gz` -> `human.jsonl`
pub fn archive_file_name(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    let name = path.trim_end_matches('/').rsplit('/').next()?;
    let name = name.strip_suffix(".gz").unwrap_or(name);
    (!name.is_empty()).then_some(name)
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
