//! Human-readable text for durations, view counts and file sizes.

const SIZE_UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

#[must_use]
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(seconds) = seconds.filter(|value| *value > 0) else {
        return "Unknown".to_string();
    };

    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

#[must_use]
pub fn format_count(count: Option<u64>) -> String {
    match count.unwrap_or_default() {
        0 => "0".to_string(),
        value if value >= 1_000_000 => format!("{:.1}M", one_decimal(value, 1_000_000.0)),
        value if value >= 1_000 => format!("{:.1}K", one_decimal(value, 1_000.0)),
        value => value.to_string(),
    }
}

/// Rounds half away from zero; `{:.1}` alone rounds ties to even.
#[allow(clippy::cast_precision_loss)]
fn one_decimal(value: u64, scale: f64) -> f64 {
    (value as f64 / scale * 10.0).round() / 10.0
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_file_size(bytes: Option<u64>) -> String {
    let Some(bytes) = bytes.filter(|value| *value > 0) else {
        return "Unknown size".to_string();
    };

    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1024_u64.pow(unit as u32 + 1) {
        unit += 1;
    }

    let scaled = bytes as f64 / 1024_u64.pow(unit as u32) as f64;
    let rounded = (scaled * 100.0).round() / 100.0;
    format!("{rounded} {}", SIZE_UNITS[unit])
}
