use serde::{Deserialize, Deserializer};

/// Video information returned by the Metadata Service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    #[serde(default)]
    pub uploader: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default, deserialize_with = "optional_count")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "optional_count")]
    pub view_count: Option<u64>,
    #[serde(default)]
    pub formats: Vec<FormatOption>,
}

impl VideoMetadata {
    pub fn find_format(&self, format_id: &str) -> Option<&FormatOption> {
        self.formats
            .iter()
            .find(|format| format.format_id == format_id)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormatOption {
    pub format_id: String,
    pub quality: String,
    pub ext: String,
    #[serde(default, deserialize_with = "optional_count")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "optional_count")]
    pub fps: Option<u64>,
}

/// Fields posted to the Download Endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadForm {
    pub url: String,
    pub format_id: String,
}

// The service passes extractor numbers through untouched, so fps and duration
// can arrive as floats.
fn optional_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|number| number.is_finite() && *number >= 0.0)
        .map(|number| number.trunc() as u64))
}
