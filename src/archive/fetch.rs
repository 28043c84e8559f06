//! # Archive retrieval
//!
//! Download of product files from an HTTP archive protected by a login host.
//!
//! ## Redirects and credentials
//! -----------------
//! Archive requests are answered by a redirect chain through the login host and back. Redirects
//! are followed by hand (at most [`MAX_REDIRECTS`] hops) so that the basic credentials go only
//! where [`keep_auth_header`] allows them; once dropped they are not sent again in the chain.
//! Session cookies set along the way are kept by the client.
//!
//! ## Retries
//! -----------------
//! A failed attempt is retried after a delay that doubles every time, up to the configured number
//! of attempts. Data is streamed to `<file>.partial` and renamed once complete, so an existing
//! file in the download directory is always whole and is reused without a request.
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::{header::LOCATION, redirect::Policy, Client, Url};
use tokio::{fs::File, io::AsyncWriteExt};
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::{config::ArchiveConfig, constants::MAX_REDIRECTS, snxroster_errors::SnxRosterError};

/// Source of product files.
pub trait Fetch {
    /// Make the file at `url` available locally and return its path.
    fn fetch(&self, url: &str) -> Result<Utf8PathBuf, SnxRosterError>;
}

/// Whether the `Authorization` header may follow a redirect.
///
/// Arguments
/// -----------------
/// * `original_host`: host of the request being redirected.
/// * `redirect_host`: host named by the `Location` header.
/// * `auth_host`: login host of the archive.
///
/// Return
/// ----------
/// * `true` when the redirect stays on the same host, or when either side is the login host.
pub fn keep_auth_header(original_host: &str, redirect_host: &str, auth_host: &str) -> bool {
    original_host == redirect_host || original_host == auth_host || redirect_host == auth_host
}

/// Last path segment of a URL, used as the local file name.
pub fn file_name_from_url(url: &str) -> Result<String, SnxRosterError> {
    let parsed = Url::parse(url).map_err(|e| SnxRosterError::InvalidUrl(format!("{url}: {e}")))?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SnxRosterError::InvalidUrl(format!("{url}: no file name")))
}

/// HTTP client of the product archive.
#[derive(Debug, Clone)]
pub struct ArchiveClient {
    client: Client,
    config: ArchiveConfig,
}

impl ArchiveClient {
    pub fn new(config: ArchiveConfig) -> Result<Self, SnxRosterError> {
        let client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(ArchiveClient { client, config })
    }

    /// Download `url` into the download directory, retrying on failure.
    pub async fn download(&self, url: &str) -> Result<Utf8PathBuf, SnxRosterError> {
        let file_name = file_name_from_url(url)?;
        tokio::fs::create_dir_all(&self.config.download_dir).await?;
        let final_path = self.config.download_dir.join(&file_name);
        let partial_path = self.config.download_dir.join(format!("{file_name}.partial"));

        if final_path.exists() {
            info!(path = %final_path, "file already downloaded");
            return Ok(final_path);
        }

        let attempts = self.config.attempts.max(1);
        let mut delay = Duration::from_secs(self.config.retry_delay_secs);

        for attempt in 1..=attempts {
            match self.download_once(url, &partial_path).await {
                Ok(bytes) => {
                    tokio::fs::rename(&partial_path, &final_path).await?;
                    info!(url, path = %final_path, bytes, attempt, "download completed");
                    return Ok(final_path);
                }
                Err(e @ SnxRosterError::InvalidUrl(_)) => return Err(e),
                Err(e) if attempt == attempts => {
                    let _ = tokio::fs::remove_file(&partial_path).await;
                    return Err(SnxRosterError::DownloadFailed {
                        url: url.to_string(),
                        attempts,
                        reason: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(
                        url,
                        error = %e,
                        attempt,
                        attempts,
                        delay_secs = delay.as_secs(),
                        "download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }

        Err(SnxRosterError::DownloadFailed {
            url: url.to_string(),
            attempts,
            reason: "no attempt made".to_string(),
        })
    }

    /// One pass over the redirect chain, streaming the final body to `path`.
    async fn download_once(&self, url: &str, path: &Utf8Path) -> Result<u64, SnxRosterError> {
        let mut current =
            Url::parse(url).map_err(|e| SnxRosterError::InvalidUrl(format!("{url}: {e}")))?;
        let mut send_auth = true;

        for _ in 0..=MAX_REDIRECTS {
            let mut request = self.client.get(current.clone());
            if send_auth {
                if let Some(username) = &self.config.username {
                    request = request.basic_auth(username, self.config.password.as_deref());
                }
            }

            let response = request.send().await?;
            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| {
                        SnxRosterError::InvalidUrl(format!("{current}: redirect without location"))
                    })?;
                let next = current
                    .join(location)
                    .map_err(|e| SnxRosterError::InvalidUrl(format!("{location}: {e}")))?;

                send_auth = send_auth
                    && keep_auth_header(
                        current.host_str().unwrap_or_default(),
                        next.host_str().unwrap_or_default(),
                        &self.config.auth_host,
                    );
                debug!(from = %current, to = %next, send_auth, "following redirect");
                current = next;
                continue;
            }

            let response = response.error_for_status()?;
            let mut file = File::create(path).await?;
            let mut stream = response.bytes_stream();
            let mut written = 0u64;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            return Ok(written);
        }

        Err(SnxRosterError::TooManyRedirects(url.to_string()))
    }
}

impl Fetch for ArchiveClient {
    /// Blocking download on a private runtime.
    fn fetch(&self, url: &str) -> Result<Utf8PathBuf, SnxRosterError> {
        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(self.download(url))
    }
}

/// Archive mirrored in a local directory: a URL resolves to the file of the same name.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    root: Utf8PathBuf,
}

impl LocalMirror {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        LocalMirror { root: root.into() }
    }
}

impl Fetch for LocalMirror {
    fn fetch(&self, url: &str) -> Result<Utf8PathBuf, SnxRosterError> {
        let path = self.root.join(file_name_from_url(url)?);
        if !path.exists() {
            return Err(SnxRosterError::DownloadFailed {
                url: url.to_string(),
                attempts: 1,
                reason: format!("{path} not found in mirror"),
            });
        }
        Ok(path)
    }
}

#[cfg(test)]
mod fetch_test {
    use super::*;

    #[test]
    fn test_keep_auth_header() {
        let auth = "urs.earthdata.nasa.gov";
        assert!(keep_auth_header("cddis.nasa.gov", "cddis.nasa.gov", auth));
        assert!(keep_auth_header("cddis.nasa.gov", auth, auth));
        assert!(keep_auth_header(auth, "cddis.nasa.gov", auth));
        assert!(!keep_auth_header("cddis.nasa.gov", "cdn.example.org", auth));
    }

    #[test]
    fn test_file_name_from_url() {
        assert_eq!(
            file_name_from_url("https://cddis.nasa.gov/archive/gnss/products/2305/igs24P23053.snx.Z")
                .unwrap(),
            "igs24P23053.snx.Z"
        );
        assert!(matches!(
            file_name_from_url("https://cddis.nasa.gov/archive/"),
            Err(SnxRosterError::InvalidUrl(_))
        ));
        assert!(matches!(
            file_name_from_url("not a url"),
            Err(SnxRosterError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_existing_download_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().to_path_buf();
        std::fs::write(dir.join("igs24P23053.snx.Z"), b"cached").unwrap();

        let client = ArchiveClient::new(ArchiveConfig {
            download_dir: dir.clone(),
            ..ArchiveConfig::default()
        })
        .unwrap();
        let path = client
            .fetch("https://cddis.nasa.gov/archive/gnss/products/2305/igs24P23053.snx.Z")
            .unwrap();
        assert_eq!(path, dir.join("igs24P23053.snx.Z"));
    }

    #[test]
    fn test_local_mirror() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = Utf8Path::from_path(tmp.path()).unwrap().to_path_buf();
        std::fs::write(dir.join("igs24P23053.snx"), b"%=SNX").unwrap();

        let mirror = LocalMirror::new(dir.clone());
        assert_eq!(
            mirror.fetch("https://host/2305/igs24P23053.snx").unwrap(),
            dir.join("igs24P23053.snx")
        );
        assert!(matches!(
            mirror.fetch("https://host/2305/missing.snx"),
            Err(SnxRosterError::DownloadFailed { attempts: 1, .. })
        ));
    }
}
