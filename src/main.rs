use tokio::sync::mpsc::unbounded_channel;
use vidform::{
    ClientConfig, FormController, FormDriver, FormError, FormEvent, FormView, FormatCard,
    HttpDownloadEndpoint, HttpMetadataService, MetadataView, Trigger,
};

const USAGE: &str = "Usage: vidform <video-url> [format-id]";

/// Prints the form state to the terminal.
#[derive(Debug, Default)]
struct TerminalView {
    error: Option<String>,
}

impl FormView for TerminalView {
    fn set_error(&mut self, message: &str) {
        eprintln!("Error: {message}");
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn show_metadata(&mut self, metadata: &MetadataView) {
        println!("{}", metadata.title);
        println!("  by {}", metadata.uploader);
        println!(
            "  {} · {} views",
            metadata.duration_text, metadata.views_text
        );
        if !metadata.thumbnail.is_empty() {
            println!("  {}", metadata.thumbnail);
        }
    }

    fn hide_metadata(&mut self) {}

    fn render_formats(&mut self, cards: &[FormatCard]) {
        println!("Formats:");
        for card in cards {
            let mut details = vec![card.badge_text.clone()];
            details.extend(card.size_text.iter().cloned());
            details.extend(card.fps_text.iter().cloned());
            println!(
                "  {} {:<24} {:<12} {}",
                card.glyph,
                card.quality,
                card.format_id,
                details.join(" · ")
            );
        }
    }

    fn mark_selected(&mut self, format_id: &str) {
        println!("Selected format {format_id}");
    }

    fn set_busy(&mut self, trigger: Trigger, busy: bool) {
        if busy {
            match trigger {
                Trigger::Fetch => println!("Fetching video information..."),
                Trigger::Download => println!("Downloading..."),
            }
        }
    }

    fn set_enabled(&mut self, _trigger: Trigger, _enabled: bool) {}
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "vidform=info".to_string()),
        )
        .init();

    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(error) => {
            eprintln!("Error: {}", error.message);
            std::process::exit(2);
        }
    }
}

/// Returns whether the form finished without an error or a failed download.
async fn run() -> Result<bool, FormError> {
    let mut args = std::env::args().skip(1);
    let url = args.next().ok_or_else(|| FormError::validation(USAGE))?;
    let format_id = args.next();

    let config = ClientConfig::from_env()?;
    let service = HttpMetadataService::new(&config)?;
    let endpoint = HttpDownloadEndpoint::new(&config)?;
    let controller = FormController::new(TerminalView::default(), service, endpoint.clone());

    let (tx, rx) = unbounded_channel();
    let mut events = vec![FormEvent::UrlInput(url.clone()), FormEvent::SubmitUrl(url)];
    if let Some(format_id) = format_id {
        events.push(FormEvent::SelectFormat(format_id));
        events.push(FormEvent::Download);
    }
    for event in events {
        let _ = tx.send(event);
    }
    drop(tx);

    let controller = FormDriver::new(controller, rx, config.download_reset_delay)
        .run()
        .await;
    endpoint.wait_idle().await;

    let failed = endpoint.failed_transfers();
    if failed > 0 {
        eprintln!("Error: {failed} download(s) failed");
    }

    Ok(controller.into_view().error.is_none() && failed == 0)
}
