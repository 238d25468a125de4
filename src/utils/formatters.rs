use std::time::Duration;

/// Formats a byte count with a binary unit, e.g. "1.50 MB"
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    #[allow(clippy::cast_precision_loss)]
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{bytes} {}", UNITS[unit_index])
    } else {
        format!("{size:.2} {}", UNITS[unit_index])
    }
}

/// Formats a duration at millisecond precision, e.g. "1s 204ms"
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    if millis.is_zero() {
        return "0ms".to_string();
    }
    humantime::format_duration(millis).to_string()
}
