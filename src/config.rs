use std::path::PathBuf;

use tokio::time::Duration;
use tracing::warn;
use url::Url;

use crate::error::FormError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_METADATA_PATH: &str = "get_video_info";
pub const DEFAULT_DOWNLOAD_PATH: &str = "download";
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 120;
pub const DEFAULT_DOWNLOAD_RESET_MS: u64 = 3_000;
pub const DEFAULT_DOWNLOAD_DIR: &str = "downloads";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub metadata_endpoint: Url,
    pub download_endpoint: Url,
    pub request_timeout: Duration,
    /// How long the download trigger stays busy after a submission.
    pub download_reset_delay: Duration,
    pub download_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, FormError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, FormError> {
        let read = |name: &str| {
            lookup(name).and_then(|value| non_empty(&value).map(ToString::to_string))
        };

        let base_raw = read("VIDFORM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut base = Url::parse(&base_raw).map_err(|error| {
            FormError::config(format!("Invalid VIDFORM_BASE_URL {base_raw:?}: {error}"))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(FormError::config(format!(
                "VIDFORM_BASE_URL must use http or https, got {base_raw:?}"
            )));
        }
        // Relative endpoint paths resolve under the base path.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        let metadata_path =
            read("VIDFORM_METADATA_PATH").unwrap_or_else(|| DEFAULT_METADATA_PATH.to_string());
        let download_path =
            read("VIDFORM_DOWNLOAD_PATH").unwrap_or_else(|| DEFAULT_DOWNLOAD_PATH.to_string());

        let request_timeout_seconds = read_u64(&read, "VIDFORM_REQUEST_TIMEOUT_SECONDS")
            .filter(|value| *value > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS);
        let download_reset_ms =
            read_u64(&read, "VIDFORM_DOWNLOAD_RESET_MS").unwrap_or(DEFAULT_DOWNLOAD_RESET_MS);
        let download_dir = read("VIDFORM_DOWNLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR));

        Ok(Self {
            metadata_endpoint: join_endpoint(&base, &metadata_path)?,
            download_endpoint: join_endpoint(&base, &download_path)?,
            request_timeout: Duration::from_secs(request_timeout_seconds),
            download_reset_delay: Duration::from_millis(download_reset_ms),
            download_dir,
        })
    }

    /// Configuration pointing both endpoints at `base`, with default timings.
    pub fn for_base_url(base: &str) -> Result<Self, FormError> {
        Self::from_lookup(|name| (name == "VIDFORM_BASE_URL").then(|| base.to_string()))
    }
}

fn read_u64(read: &impl Fn(&str) -> Option<String>, name: &str) -> Option<u64> {
    let value = read(name)?;
    match value.parse::<u64>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!("Ignoring {name}={value:?}: not a whole number");
            None
        }
    }
}

fn join_endpoint(base: &Url, path: &str) -> Result<Url, FormError> {
    base.join(path).map_err(|error| {
        FormError::config(format!("Invalid endpoint path {path:?}: {error}"))
    })
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
