use tracing::{debug, info, warn};

use crate::download::DownloadEndpoint;
use crate::error::FormError;
use crate::model::{DownloadForm, VideoMetadata};
use crate::render::{MetadataView, render_cards};
use crate::service::MetadataService;
use crate::validate::{fetch_trigger_enabled, validate_url, video_id};
use crate::view::{FormView, Trigger};

pub const EMPTY_URL_MESSAGE: &str = "Please enter a YouTube URL";
pub const INVALID_URL_MESSAGE: &str = "Please enter a valid YouTube URL";
pub const DOWNLOAD_PRECONDITION_MESSAGE: &str =
    "Please select a format and ensure video information is loaded";

/// Mediates between user input, the Metadata Service and the Download
/// Endpoint, keeping the view consistent with its own state.
pub struct FormController<V, S, D> {
    view: V,
    service: S,
    endpoint: D,
    current_url: Option<String>,
    selected_format: Option<String>,
    metadata: Option<VideoMetadata>,
}

impl<V, S, D> FormController<V, S, D>
where
    V: FormView,
    S: MetadataService,
    D: DownloadEndpoint,
{
    pub fn new(mut view: V, service: S, endpoint: D) -> Self {
        view.set_enabled(Trigger::Fetch, false);
        view.set_enabled(Trigger::Download, false);

        Self {
            view,
            service,
            endpoint,
            current_url: None,
            selected_format: None,
            metadata: None,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn endpoint(&self) -> &D {
        &self.endpoint
    }

    pub fn into_view(self) -> V {
        self.view
    }

    pub fn current_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }

    pub fn selected_format(&self) -> Option<&str> {
        self.selected_format.as_deref()
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    fn download_ready(&self) -> bool {
        self.selected_format.is_some() && self.current_url.is_some()
    }

    /// Showing an error always takes the metadata panel down with it.
    fn report(&mut self, error: FormError) -> FormError {
        self.view.set_error(&error.message);
        self.view.hide_metadata();
        error
    }

    pub fn on_url_input(&mut self, input: &str) {
        self.view
            .set_enabled(Trigger::Fetch, fetch_trigger_enabled(input));
    }

    pub async fn fetch_metadata(&mut self, input: &str) -> Result<&VideoMetadata, FormError> {
        let url = input.trim();
        if url.is_empty() {
            return Err(self.report(FormError::validation(EMPTY_URL_MESSAGE)));
        }
        if !validate_url(url) {
            debug!("Rejected URL before fetching: {url:?}");
            return Err(self.report(FormError::validation(INVALID_URL_MESSAGE)));
        }

        self.view.set_enabled(Trigger::Fetch, false);
        self.view.set_busy(Trigger::Fetch, true);
        self.view.clear_error();

        let result = self.service.fetch(url).await;

        self.view.set_enabled(Trigger::Fetch, true);
        self.view.set_busy(Trigger::Fetch, false);

        match result {
            Ok(metadata) => {
                info!(
                    "Loaded metadata for {}: {} format(s)",
                    video_id(url).unwrap_or(url),
                    metadata.formats.len()
                );
                self.current_url = Some(url.to_string());
                self.selected_format = None;
                self.view.set_enabled(Trigger::Download, false);
                self.view.show_metadata(&MetadataView::from_metadata(&metadata));
                self.view.render_formats(&render_cards(&metadata.formats));
                Ok(self.metadata.insert(metadata))
            }
            Err(error) => {
                warn!("Fetching metadata for {url} failed: {error}");
                Err(self.report(error))
            }
        }
    }

    pub fn select_format(&mut self, format_id: &str) -> Result<(), FormError> {
        let known = self
            .metadata
            .as_ref()
            .is_some_and(|metadata| metadata.find_format(format_id).is_some());
        if !known {
            return Err(self.report(FormError::precondition(format!(
                "Unknown format {format_id}"
            ))));
        }

        if self.selected_format.as_deref() != Some(format_id) {
            debug!("Selected format {format_id}");
            self.view.mark_selected(format_id);
            self.selected_format = Some(format_id.to_string());
        }
        self.view
            .set_enabled(Trigger::Download, self.download_ready());
        Ok(())
    }

    /// Hands the form to the Download Endpoint. The trigger stays busy until
    /// [`Self::finish_download`] runs.
    pub fn submit_download(&mut self) -> Result<DownloadForm, FormError> {
        let ready = self
            .current_url
            .clone()
            .zip(self.selected_format.clone())
            .map(|(url, format_id)| DownloadForm { url, format_id });
        let Some(form) = ready else {
            return Err(self.report(FormError::precondition(DOWNLOAD_PRECONDITION_MESSAGE)));
        };

        self.view.set_busy(Trigger::Download, true);
        self.view.set_enabled(Trigger::Download, false);

        info!("Submitting download of format {} for {}", form.format_id, form.url);
        self.endpoint.submit(form.clone());
        Ok(form)
    }

    pub fn finish_download(&mut self) {
        self.view.set_busy(Trigger::Download, false);
        self.view
            .set_enabled(Trigger::Download, self.download_ready());
    }
}
