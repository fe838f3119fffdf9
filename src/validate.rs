use regex::Regex;
use std::sync::OnceLock;

/// Inputs of this many characters or fewer keep the fetch trigger disabled.
pub const MIN_FETCH_INPUT_LEN: usize = 10;

fn video_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(https?://)?(www\.)?(youtube|youtu|youtube-nocookie)\.(com|be)/(watch\?v=|embed/|v/|.+\?v=)?([^&=%\?]{11})",
        )
        .expect("Invalid video URL regex")
    })
}

/// Returns true when `url` looks like a supported video page URL.
#[must_use]
pub fn validate_url(url: &str) -> bool {
    video_url_regex().is_match(url.trim())
}

/// The 11-character video id, when `url` is a supported video URL.
#[must_use]
pub fn video_id(url: &str) -> Option<&str> {
    video_url_regex()
        .captures(url.trim())
        .and_then(|caps| caps.get(6))
        .map(|id| id.as_str())
}

#[must_use]
pub fn fetch_trigger_enabled(input: &str) -> bool {
    input.trim().chars().count() > MIN_FETCH_INPUT_LEN
}
