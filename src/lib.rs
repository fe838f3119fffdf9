//! Controller for a video download form: validates a pasted video URL, loads
//! its metadata, renders selectable format cards and hands the chosen format
//! to the download endpoint.

pub mod config;
pub mod controller;
pub mod download;
pub mod driver;
pub mod error;
pub mod format;
pub mod model;
pub mod render;
pub mod service;
pub mod validate;
pub mod view;

pub use config::ClientConfig;
pub use controller::FormController;
pub use download::{DownloadEndpoint, HttpDownloadEndpoint};
pub use driver::{FormDriver, FormEvent};
pub use error::{ErrorKind, FormError};
pub use model::{DownloadForm, FormatOption, VideoMetadata};
pub use render::{FormatCard, MetadataView, QualityTier};
pub use service::{HttpMetadataService, MetadataService};
pub use validate::validate_url;
pub use view::{FormView, Trigger};
