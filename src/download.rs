//! Hand-off of the download form to the Download Endpoint.
//!
//! The controller never learns how a submission ends: implementations log the
//! outcome and the controller falls back to a timed reset.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderMap, HeaderName};
use tokio::io::AsyncWriteExt;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::FormError;
use crate::model::DownloadForm;

const FALLBACK_FILENAME: &str = "download.bin";
const MAX_NAME_SUFFIX: usize = 999;

pub trait DownloadEndpoint {
    /// Submits `form` without waiting for the transfer.
    fn submit(&self, form: DownloadForm);
}

#[derive(Debug, Clone)]
pub struct HttpDownloadEndpoint {
    client: reqwest::Client,
    endpoint: Url,
    output_dir: PathBuf,
    tracker: TaskTracker,
    failures: Arc<AtomicUsize>,
}

impl HttpDownloadEndpoint {
    pub fn new(config: &ClientConfig) -> Result<Self, FormError> {
        // No overall timeout: the server extracts and transcodes before it
        // starts streaming.
        let client = reqwest::Client::builder()
            .connect_timeout(config.request_timeout)
            .build()
            .map_err(|error| FormError::config(format!("Could not build HTTP client: {error}")))?;

        Ok(Self::with_client(
            client,
            config.download_endpoint.clone(),
            config.download_dir.clone(),
        ))
    }

    #[must_use]
    pub fn with_client(client: reqwest::Client, endpoint: Url, output_dir: PathBuf) -> Self {
        Self {
            client,
            endpoint,
            output_dir,
            tracker: TaskTracker::new(),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Posts the form and streams the answer into the output directory.
    pub async fn transfer(&self, form: &DownloadForm) -> Result<PathBuf, FormError> {
        let mut response = self
            .client
            .post(self.endpoint.clone())
            .form(&[
                ("url", form.url.as_str()),
                ("format_id", form.format_id.as_str()),
            ])
            .send()
            .await
            .map_err(|error| FormError::transfer(format!("Download request failed: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FormError::transfer(format!(
                "Download endpoint answered {status}"
            )));
        }

        let content_type = header_text(response.headers(), CONTENT_TYPE).unwrap_or_default();
        let disposition = header_text(response.headers(), CONTENT_DISPOSITION);

        // The server redirects back to its index page when a download fails.
        if disposition.is_none() && content_type.to_ascii_lowercase().starts_with("text/html") {
            return Err(FormError::transfer(
                "Download endpoint answered with a page instead of a file",
            ));
        }

        let filename = disposition
            .as_deref()
            .and_then(filename_from_disposition)
            .map(|name| sanitize_filename(&name))
            .unwrap_or_else(|| FALLBACK_FILENAME.to_string());

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|error| {
                FormError::transfer(format!(
                    "Could not create {}: {error}",
                    self.output_dir.display()
                ))
            })?;
        let (mut file, path) = create_unique(&self.output_dir, &filename).await?;

        let written = match write_body(&mut response, &mut file, &path).await {
            Ok(written) => written,
            Err(error) => {
                drop(file);
                let _ = tokio::fs::remove_file(&path).await;
                return Err(error);
            }
        };

        info!("Saved {} ({written} bytes)", path.display());
        Ok(path)
    }

    /// Resolves once every submitted transfer has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }

    /// Number of submitted transfers that ended in an error.
    #[must_use]
    pub fn failed_transfers(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}

impl DownloadEndpoint for HttpDownloadEndpoint {
    fn submit(&self, form: DownloadForm) {
        let endpoint = self.clone();
        self.tracker.spawn(async move {
            if let Err(error) = endpoint.transfer(&form).await {
                endpoint.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Download of format {} for {} failed: {error}",
                    form.format_id, form.url
                );
            }
        });
    }
}

/// Creates `name` in `dir` without touching existing files, numbering the
/// name when it is taken.
async fn create_unique(dir: &Path, name: &str) -> Result<(tokio::fs::File, PathBuf), FormError> {
    for attempt in 0..=MAX_NAME_SUFFIX {
        let path = dir.join(numbered_name(name, attempt));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, path)),
            Err(error) if error.kind() == IoErrorKind::AlreadyExists => {}
            Err(error) => {
                return Err(FormError::transfer(format!(
                    "Could not create {}: {error}",
                    path.display()
                )));
            }
        }
    }

    Err(FormError::transfer(format!(
        "No free file name for {name} in {}",
        dir.display()
    )))
}

fn numbered_name(name: &str, attempt: usize) -> String {
    if attempt == 0 {
        return name.to_string();
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem} ({attempt}).{ext}"),
        _ => format!("{name} ({attempt})"),
    }
}

async fn write_body(
    response: &mut reqwest::Response,
    file: &mut tokio::fs::File,
    path: &Path,
) -> Result<u64, FormError> {
    let mut written = 0_u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|error| FormError::transfer(format!("Download interrupted: {error}")))?
    {
        file.write_all(&chunk).await.map_err(|error| {
            FormError::transfer(format!("Could not write {}: {error}", path.display()))
        })?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|error| FormError::transfer(format!("Could not flush file: {error}")))?;
    Ok(written)
}

fn header_text(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string)
}

/// Prefers the RFC 5987 `filename*` parameter over the ASCII `filename`.
fn filename_from_disposition(value: &str) -> Option<String> {
    let params: Vec<(String, &str)> = value
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.trim().to_ascii_lowercase(), value.trim()))
        })
        .collect();

    let extended = params
        .iter()
        .find(|(key, _)| key == "filename*")
        .and_then(|(_, value)| {
            let (charset, rest) = value.split_once('\'')?;
            let (_, encoded) = rest.split_once('\'')?;
            if !charset.eq_ignore_ascii_case("utf-8") {
                return None;
            }
            urlencoding::decode(encoded).ok().map(|name| name.into_owned())
        });

    extended
        .or_else(|| {
            params
                .iter()
                .find(|(key, _)| key == "filename")
                .map(|(_, value)| value.trim_matches('"').to_string())
        })
        .filter(|name| !name.trim().is_empty())
}

fn sanitize_filename(value: &str) -> String {
    let mut sanitized = String::with_capacity(value.len());

    for character in value.chars() {
        if character.is_control()
            || matches!(character, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|')
        {
            sanitized.push('_');
        } else {
            sanitized.push(character);
        }
    }

    let compact = sanitized.trim().trim_start_matches('.').trim();
    if compact.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        compact.to_string()
    }
}
