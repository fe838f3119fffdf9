//! View-models for the metadata panel and the format cards.
//!
//! Everything here is pure so the classification and text rules can be
//! checked without any rendering surface.

use crate::format::{format_count, format_duration, format_file_size};
use crate::model::{FormatOption, VideoMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    Audio,
    Ultra,
    FullHd,
    Hd,
    Sd,
    Lowest,
    Generic,
}

impl QualityTier {
    /// First matching rung wins, so `fhd` never falls through to `hd`.
    #[must_use]
    pub fn classify(quality: &str) -> Self {
        let quality = quality.to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| quality.contains(needle));

        if has(&["audio"]) {
            Self::Audio
        } else if has(&["4k", "2160p"]) {
            Self::Ultra
        } else if has(&["1080p", "fhd"]) {
            Self::FullHd
        } else if has(&["720p", "hd"]) {
            Self::Hd
        } else if has(&["480p", "sd"]) {
            Self::Sd
        } else if has(&["360p", "lowest"]) {
            Self::Lowest
        } else {
            Self::Generic
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Audio => "fas fa-music",
            Self::Ultra => "fas fa-star",
            Self::FullHd => "fas fa-play-circle",
            Self::Hd => "fas fa-play",
            Self::Sd => "fas fa-circle",
            Self::Lowest => "fas fa-dot-circle",
            Self::Generic => "fas fa-file-video",
        }
    }

    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Audio => "success",
            Self::Ultra => "warning",
            Self::FullHd => "info",
            Self::Hd | Self::Generic => "primary",
            Self::Sd => "secondary",
            Self::Lowest => "muted",
        }
    }

    #[must_use]
    pub const fn badge_class(self) -> &'static str {
        match self {
            Self::Audio => "bg-success",
            Self::Ultra => "bg-warning",
            Self::FullHd => "bg-info",
            Self::Hd | Self::Generic => "bg-primary",
            Self::Sd => "bg-secondary",
            Self::Lowest => "bg-dark",
        }
    }

    /// Shown when the icon font is unavailable.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Audio => "🎵",
            Self::Ultra => "⭐",
            Self::FullHd => "🎬",
            Self::Hd => "▶️",
            Self::Sd => "⚪",
            Self::Lowest => "🔵",
            Self::Generic => "📹",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCard {
    pub format_id: String,
    pub quality: String,
    pub tier: QualityTier,
    pub icon: &'static str,
    pub color: &'static str,
    pub badge_class: &'static str,
    pub glyph: &'static str,
    pub badge_text: String,
    pub size_text: Option<String>,
    pub fps_text: Option<String>,
}

impl FormatCard {
    #[must_use]
    pub fn from_option(option: &FormatOption) -> Self {
        let tier = QualityTier::classify(&option.quality);

        Self {
            format_id: option.format_id.clone(),
            quality: option.quality.clone(),
            tier,
            icon: tier.icon(),
            color: tier.color(),
            badge_class: tier.badge_class(),
            glyph: tier.glyph(),
            badge_text: option.ext.to_uppercase(),
            size_text: option
                .filesize
                .filter(|bytes| *bytes > 0)
                .map(|bytes| format_file_size(Some(bytes))),
            fps_text: option
                .fps
                .filter(|fps| *fps > 0)
                .map(|fps| format!("{fps} FPS")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataView {
    pub title: String,
    pub uploader: String,
    pub thumbnail: String,
    pub duration_text: String,
    pub views_text: String,
}

impl MetadataView {
    #[must_use]
    pub fn from_metadata(metadata: &VideoMetadata) -> Self {
        Self {
            title: metadata.title.clone(),
            uploader: metadata.uploader.clone(),
            thumbnail: metadata.thumbnail.clone(),
            duration_text: format_duration(metadata.duration),
            views_text: format_count(metadata.view_count),
        }
    }
}

#[must_use]
pub fn render_cards(formats: &[FormatOption]) -> Vec<FormatCard> {
    formats.iter().map(FormatCard::from_option).collect()
}
