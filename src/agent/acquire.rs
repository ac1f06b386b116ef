//! Package acquisition.
//!
//! Download mode fetches the package with manual redirect handling, so every
//! hop can be logged and bounded. Bundled mode resolves the package from the
//! resources directory.

use super::{AgentError, options::AgentOptions, state::Reporter};
use crate::utils::fs as fsutil;
use reqwest::{StatusCode, header::LOCATION, redirect};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Maximum number of redirects followed before giving up.
pub const MAX_REDIRECTS: usize = 10;

/// Streaming HTTP downloader with bounded, logged redirects.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    response_timeout: std::time::Duration,
    chunk_timeout: std::time::Duration,
}

impl Downloader {
    pub fn new(options: &AgentOptions) -> Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .connect_timeout(options.connect_timeout)
            .user_agent(concat!("installer_genie/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AgentError::acquisition("<client>", e))?;
        Ok(Self {
            client,
            response_timeout: options.response_timeout,
            chunk_timeout: options.chunk_timeout,
        })
    }

    /// Download `url` into `dest`, returning the number of bytes written.
    ///
    /// `on_progress` receives `Some(percent)` when the size is known and
    /// `None` otherwise. Any failure removes the partial file.
    pub async fn fetch(
        &self,
        url: &str,
        dest: &Path,
        reporter: &mut Reporter,
        cancel: &CancellationToken,
        mut on_progress: impl FnMut(&mut Reporter, Option<u8>),
    ) -> Result<u64, AgentError> {
        let result = self
            .fetch_inner(url, dest, reporter, cancel, &mut on_progress)
            .await;
        if result.is_err() {
            if let Err(e) = fsutil::remove_file(dest).await {
                log::warn!("failed to remove partial download {}: {e}", dest.display());
            }
        }
        result
    }

    async fn fetch_inner(
        &self,
        url: &str,
        dest: &Path,
        reporter: &mut Reporter,
        cancel: &CancellationToken,
        on_progress: &mut impl FnMut(&mut Reporter, Option<u8>),
    ) -> Result<u64, AgentError> {
        let mut current = Url::parse(url).map_err(|e| AgentError::acquisition(url, e))?;
        reporter.log(format!(
            "Downloading installer from {}",
            current.host_str().unwrap_or("<unknown host>")
        ));

        let mut hops = 0;
        let mut response = loop {
            let request = self.client.get(current.clone()).send();
            let response = tokio::select! {
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                r = tokio::time::timeout(self.response_timeout, request) => match r {
                    Ok(Ok(response)) => response,
                    Ok(Err(e)) => return Err(AgentError::acquisition(url, describe(&e))),
                    Err(_) => return Err(AgentError::acquisition(url, "timed out waiting for the server")),
                },
            };

            if !response.status().is_redirection() {
                break response;
            }

            hops += 1;
            if hops > MAX_REDIRECTS {
                return Err(AgentError::acquisition(
                    url,
                    format!("more than {MAX_REDIRECTS} redirects"),
                ));
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .ok_or_else(|| AgentError::acquisition(url, "redirect without a Location header"))?;
            current = current
                .join(location)
                .map_err(|e| AgentError::acquisition(url, format!("bad redirect target: {e}")))?;
            reporter.log(format!(
                "Redirected to {}",
                current.host_str().unwrap_or("<unknown host>")
            ));
        };

        if response.status() != StatusCode::OK {
            return Err(AgentError::acquisition(
                url,
                format!("server answered {}", response.status()),
            ));
        }

        let total = response.content_length().filter(|len| *len > 0);
        if total.is_none() {
            on_progress(reporter, None);
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| AgentError::io(format!("creating {}", dest.display()), e))?;
        let mut written: u64 = 0;
        let mut last_percent = None;

        loop {
            let chunk = tokio::select! {
                _ = cancel.cancelled() => return Err(AgentError::Cancelled),
                c = tokio::time::timeout(self.chunk_timeout, response.chunk()) => match c {
                    Ok(Ok(chunk)) => chunk,
                    Ok(Err(e)) => return Err(AgentError::acquisition(url, describe(&e))),
                    Err(_) => return Err(AgentError::acquisition(url, "timed out while receiving data")),
                },
            };
            let Some(chunk) = chunk else { break };

            file.write_all(&chunk)
                .await
                .map_err(|e| AgentError::io(format!("writing {}", dest.display()), e))?;
            written += chunk.len() as u64;

            if let Some(total) = total {
                let percent = (written.min(total) * 100 / total) as u8;
                if last_percent != Some(percent) {
                    on_progress(reporter, Some(percent));
                    if percent % 25 == 0 {
                        reporter.log(format!("Downloaded {percent}%"));
                    }
                    last_percent = Some(percent);
                }
            }
        }

        file.flush()
            .await
            .map_err(|e| AgentError::io(format!("flushing {}", dest.display()), e))?;
        drop(file);

        if let Some(total) = total {
            if written < total {
                return Err(AgentError::acquisition(
                    url,
                    format!("connection closed after {written} of {total} bytes"),
                ));
            }
        }

        reporter.log(format!("Download complete ({written} bytes)"));
        Ok(written)
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "connection timed out".to_string()
    } else if error.is_connect() {
        format!("could not connect: {error}")
    } else {
        error.to_string()
    }
}

/// Locate the bundled package under the resources directory.
pub async fn resolve_bundled(options: &AgentOptions, file_name: &str) -> Result<PathBuf, AgentError> {
    let path = options.resources.resource(file_name);
    match tokio::fs::try_exists(&path).await {
        Ok(true) => Ok(path),
        _ => Err(AgentError::BundledPackageMissing { path }),
    }
}
