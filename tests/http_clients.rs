//! HTTP client tests against an in-process mock of the download site.

use std::time::Duration;

use axum::{
    Form, Json, Router,
    http::{StatusCode, header},
    response::{Html, IntoResponse},
    routing::post,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc::unbounded_channel;
use vidform::error::GENERIC_FETCH_FAILURE;
use vidform::{
    ClientConfig, DownloadEndpoint, DownloadForm, ErrorKind, FormController, FormDriver,
    FormEvent, FormView, FormatCard, HttpDownloadEndpoint, HttpMetadataService, MetadataService,
    MetadataView, Trigger,
};

const VIDEO_URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

#[derive(Debug, Deserialize)]
struct InfoFields {
    url: String,
}

#[derive(Debug, Deserialize)]
struct DownloadFields {
    url: String,
    format_id: String,
}

async fn spawn_server(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind mock server");
    let addr = listener.local_addr().expect("mock server has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock server failed");
    });
    format!("http://{addr}")
}

fn metadata_body(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "uploader": "Rick Astley",
        "thumbnail": "https://i.ytimg.com/vi/dQw4w9WgXcQ/hqdefault.jpg",
        "duration": 213,
        "view_count": 1500000,
        "formats": [
            {"format_id": "22", "quality": "720p", "ext": "mp4", "filesize": 1572864, "fps": 30},
            {"format_id": "18", "quality": "360p", "ext": "mp4", "filesize": null, "fps": 30},
            {"format_id": "bestaudio", "quality": "Audio Only (MP3)", "ext": "mp3", "filesize": null, "fps": null}
        ]
    })
}

fn metadata_router() -> Router {
    Router::new().route(
        "/get_video_info",
        post(|Form(fields): Form<InfoFields>| async move {
            Json(metadata_body(&format!("echo {}", fields.url)))
        }),
    )
}

fn download_router() -> Router {
    metadata_router().route(
        "/download",
        post(|Form(fields): Form<DownloadFields>| async move {
            let body = format!("{}|{}", fields.format_id, fields.url);
            (
                [
                    (header::CONTENT_TYPE, "video/mp4"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"Never_Gonna.mp4\"; filename*=UTF-8''Never%20Gonna%20%E2%99%AA.mp4",
                    ),
                ],
                body,
            )
        }),
    )
}

async fn metadata_service(router: Router) -> HttpMetadataService {
    let base = spawn_server(router).await;
    let config = ClientConfig::for_base_url(&base).expect("invalid mock base url");
    HttpMetadataService::new(&config).expect("failed to build metadata client")
}

#[derive(Debug, Default)]
struct NoticeView {
    error: Option<String>,
    metadata: Option<MetadataView>,
    cards: Vec<FormatCard>,
    fetch_enabled: bool,
    fetch_busy: bool,
}

impl FormView for NoticeView {
    fn set_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
    }

    fn clear_error(&mut self) {
        self.error = None;
    }

    fn show_metadata(&mut self, metadata: &MetadataView) {
        self.metadata = Some(metadata.clone());
    }

    fn hide_metadata(&mut self) {
        self.metadata = None;
    }

    fn render_formats(&mut self, cards: &[FormatCard]) {
        self.cards = cards.to_vec();
    }

    fn mark_selected(&mut self, _format_id: &str) {}

    fn set_busy(&mut self, trigger: Trigger, busy: bool) {
        if trigger == Trigger::Fetch {
            self.fetch_busy = busy;
        }
    }

    fn set_enabled(&mut self, trigger: Trigger, enabled: bool) {
        if trigger == Trigger::Fetch {
            self.fetch_enabled = enabled;
        }
    }
}

#[tokio::test]
async fn metadata_request_posts_the_url_as_a_form_field() {
    let service = metadata_service(metadata_router()).await;

    let metadata = service.fetch(VIDEO_URL).await.expect("fetch failed");
    assert_eq!(metadata.title, format!("echo {VIDEO_URL}"));
    assert_eq!(metadata.duration, Some(213));
    let ids: Vec<_> = metadata
        .formats
        .iter()
        .map(|format| format.format_id.as_str())
        .collect();
    assert_eq!(ids, ["22", "18", "bestaudio"]);
}

#[tokio::test]
async fn server_error_text_reaches_the_notice() {
    let router = Router::new().route(
        "/get_video_info",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "video unavailable"})),
            )
        }),
    );
    let service = metadata_service(router).await;
    let mut controller = FormController::new(
        NoticeView::default(),
        service,
        HttpDownloadEndpoint::with_client(
            reqwest::Client::new(),
            "http://127.0.0.1:9/download".parse().unwrap(),
            std::env::temp_dir(),
        ),
    );

    let error = controller.fetch_metadata(VIDEO_URL).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Service);

    let view = controller.view();
    assert_eq!(view.error.as_deref(), Some("video unavailable"));
    assert!(view.metadata.is_none());
    assert!(view.fetch_enabled);
    assert!(!view.fetch_busy);
    assert_eq!(controller.current_url(), None);
}

#[tokio::test]
async fn error_status_without_message_is_generic() {
    let router = Router::new().route(
        "/get_video_info",
        post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({"detail": "upstream"}))) }),
    );
    let service = metadata_service(router).await;

    let error = service.fetch(VIDEO_URL).await.unwrap_err();
    assert_eq!(error.message, GENERIC_FETCH_FAILURE);
}

#[tokio::test]
async fn non_json_body_is_generic() {
    let router = Router::new().route(
        "/get_video_info",
        post(|| async { Html("<html><body>Internal error</body></html>") }),
    );
    let service = metadata_service(router).await;

    let error = service.fetch(VIDEO_URL).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Service);
    assert_eq!(error.message, GENERIC_FETCH_FAILURE);
}

#[tokio::test]
async fn unexpected_json_shape_is_generic() {
    let router = Router::new().route(
        "/get_video_info",
        post(|| async { Json(json!({"formats": []})) }),
    );
    let service = metadata_service(router).await;

    let error = service.fetch(VIDEO_URL).await.unwrap_err();
    assert_eq!(error.message, GENERIC_FETCH_FAILURE);
}

#[tokio::test]
async fn unreachable_service_is_generic() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::for_base_url(&format!("http://{addr}")).unwrap();
    let service = HttpMetadataService::new(&config).unwrap();

    let error = service.fetch(VIDEO_URL).await.unwrap_err();
    assert_eq!(error.kind, ErrorKind::Service);
    assert_eq!(error.message, GENERIC_FETCH_FAILURE);
}

#[tokio::test]
async fn transfer_saves_file_under_decoded_name() {
    let base = spawn_server(download_router()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().join("out");
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();

    let path = endpoint
        .transfer(&DownloadForm {
            url: VIDEO_URL.to_string(),
            format_id: "22".to_string(),
        })
        .await
        .expect("transfer failed");

    assert_eq!(path, dir.path().join("out").join("Never Gonna ♪.mp4"));
    let saved = std::fs::read_to_string(&path).unwrap();
    assert_eq!(saved, format!("22|{VIDEO_URL}"));
}

#[tokio::test]
async fn transfer_rejects_html_answers() {
    let router = Router::new().route(
        "/download",
        post(|| async { Html("<html><body>Download failed</body></html>").into_response() }),
    );
    let base = spawn_server(router).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().to_path_buf();
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();

    let error = endpoint
        .transfer(&DownloadForm {
            url: VIDEO_URL.to_string(),
            format_id: "22".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(error.kind, ErrorKind::Transfer);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn transfer_keeps_existing_files() {
    let base = spawn_server(download_router()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().to_path_buf();
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();
    let existing = dir.path().join("Never Gonna ♪.mp4");
    std::fs::write(&existing, "user data").unwrap();

    let form = DownloadForm {
        url: VIDEO_URL.to_string(),
        format_id: "18".to_string(),
    };
    let first = endpoint.transfer(&form).await.expect("transfer failed");
    let second = endpoint.transfer(&form).await.expect("transfer failed");

    assert_eq!(std::fs::read_to_string(&existing).unwrap(), "user data");
    assert_eq!(first, dir.path().join("Never Gonna ♪ (1).mp4"));
    assert_eq!(second, dir.path().join("Never Gonna ♪ (2).mp4"));
    assert_eq!(
        std::fs::read_to_string(&second).unwrap(),
        format!("18|{VIDEO_URL}")
    );
}

#[tokio::test]
async fn failed_submissions_are_counted() {
    let router = Router::new().route(
        "/download",
        post(|| async { Html("<html><body>Download failed</body></html>").into_response() }),
    );
    let base = spawn_server(router).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().to_path_buf();
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();

    endpoint.submit(DownloadForm {
        url: VIDEO_URL.to_string(),
        format_id: "22".to_string(),
    });
    endpoint.wait_idle().await;

    assert_eq!(endpoint.failed_transfers(), 1);
}

#[tokio::test]
async fn submitted_download_finishes_in_background() {
    let base = spawn_server(download_router()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().to_path_buf();
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();

    endpoint.submit(DownloadForm {
        url: VIDEO_URL.to_string(),
        format_id: "bestaudio".to_string(),
    });
    endpoint.wait_idle().await;

    let saved = std::fs::read_to_string(dir.path().join("Never Gonna ♪.mp4")).unwrap();
    assert!(saved.starts_with("bestaudio|"));
    assert_eq!(endpoint.failed_transfers(), 0);
}

#[tokio::test]
async fn driver_runs_the_whole_form_over_http() {
    let base = spawn_server(download_router()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = ClientConfig::for_base_url(&base).unwrap();
    config.download_dir = dir.path().to_path_buf();
    config.download_reset_delay = Duration::from_millis(10);

    let service = HttpMetadataService::new(&config).unwrap();
    let endpoint = HttpDownloadEndpoint::new(&config).unwrap();
    let controller = FormController::new(NoticeView::default(), service, endpoint.clone());

    let (tx, rx) = unbounded_channel();
    tx.send(FormEvent::UrlInput(VIDEO_URL.to_string())).unwrap();
    tx.send(FormEvent::SubmitUrl(VIDEO_URL.to_string())).unwrap();
    tx.send(FormEvent::SelectFormat("18".to_string())).unwrap();
    tx.send(FormEvent::Download).unwrap();
    drop(tx);

    let controller = FormDriver::new(controller, rx, config.download_reset_delay)
        .run()
        .await;
    endpoint.wait_idle().await;

    assert_eq!(controller.current_url(), Some(VIDEO_URL));
    assert_eq!(controller.selected_format(), Some("18"));
    let view = controller.view();
    assert_eq!(view.error, None);
    assert_eq!(view.cards.len(), 3);
    assert_eq!(view.cards[0].size_text.as_deref(), Some("1.5 MB"));
    assert_eq!(view.metadata.as_ref().unwrap().views_text, "1.5M");

    let saved = std::fs::read_to_string(dir.path().join("Never Gonna ♪.mp4")).unwrap();
    assert_eq!(saved, format!("18|{VIDEO_URL}"));
}
