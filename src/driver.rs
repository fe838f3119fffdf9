//! Event loop feeding user actions to a [`FormController`].
//!
//! Events are handled one at a time. A metadata fetch is awaited inline, and
//! fetch requests that piled up behind it are dropped: the fetch trigger was
//! disabled for their whole wait.

use std::collections::VecDeque;

use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Duration, Instant, sleep_until};
use tracing::debug;

use crate::controller::FormController;
use crate::download::DownloadEndpoint;
use crate::service::MetadataService;
use crate::view::FormView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    UrlInput(String),
    SubmitUrl(String),
    SelectFormat(String),
    Download,
}

enum Step {
    Event(FormEvent),
    ResetDue,
    Closed,
}

pub struct FormDriver<V, S, D> {
    controller: FormController<V, S, D>,
    events: UnboundedReceiver<FormEvent>,
    backlog: VecDeque<FormEvent>,
    reset_delay: Duration,
    reset_at: Option<Instant>,
}

impl<V, S, D> FormDriver<V, S, D>
where
    V: FormView,
    S: MetadataService,
    D: DownloadEndpoint,
{
    pub fn new(
        controller: FormController<V, S, D>,
        events: UnboundedReceiver<FormEvent>,
        reset_delay: Duration,
    ) -> Self {
        Self {
            controller,
            events,
            backlog: VecDeque::new(),
            reset_delay,
            reset_at: None,
        }
    }

    /// Runs until every event sender is dropped and any pending download
    /// reset has fired, then hands the controller back.
    pub async fn run(mut self) -> FormController<V, S, D> {
        loop {
            let step = match self.backlog.pop_front() {
                Some(event) => Step::Event(event),
                None => {
                    let deadline = self.reset_at;
                    tokio::select! {
                        event = self.events.recv() => event.map_or(Step::Closed, Step::Event),
                        () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => Step::ResetDue,
                    }
                }
            };

            match step {
                Step::Event(event) => self.handle(event).await,
                Step::ResetDue => self.reset_download(),
                Step::Closed => break,
            }
        }

        if let Some(deadline) = self.reset_at {
            sleep_until(deadline).await;
            self.reset_download();
        }
        self.controller
    }

    async fn handle(&mut self, event: FormEvent) {
        match event {
            FormEvent::UrlInput(input) => self.controller.on_url_input(&input),
            FormEvent::SubmitUrl(input) => {
                if let Err(error) = self.controller.fetch_metadata(&input).await {
                    debug!("Fetch ended with an error: {error}");
                }
                self.drop_queued_fetches();
            }
            FormEvent::SelectFormat(format_id) => {
                if let Err(error) = self.controller.select_format(&format_id) {
                    debug!("Selection refused: {error}");
                }
            }
            FormEvent::Download => match self.controller.submit_download() {
                Ok(_) => self.reset_at = Some(Instant::now() + self.reset_delay),
                Err(error) => debug!("Download refused: {error}"),
            },
        }
    }

    fn drop_queued_fetches(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            if let FormEvent::SubmitUrl(input) = &event {
                debug!("Ignoring fetch of {input:?} queued behind another fetch");
                continue;
            }
            self.backlog.push_back(event);
        }
    }

    fn reset_download(&mut self) {
        self.reset_at = None;
        self.controller.finish_download();
    }
}
