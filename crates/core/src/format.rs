// crates/core/src/format.rs
//! Human-readable formatting for sizes, rates, and durations.

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count, e.g. `1536` -> `"1.5 KB"`.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes <= 0.0 {
        return "0 B".to_string();
    }
    let mut idx = 0;
    let mut value = bytes;
    while value >= 1024.0 && idx < SIZE_UNITS.len() - 1 {
        value /= 1024.0;
        idx += 1;
    }
    format!("{:.1} {}", value, SIZE_UNITS[idx])
}

/// Format a transfer rate in bytes/second. Missing or zero rates read `"0 B/s"`.
pub fn format_speed(bytes_per_sec: Option<f64>) -> String {
    format!("{}/s", format_bytes(bytes_per_sec.unwrap_or(0.0)))
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` past the hour. Zero or absent is `"Unknown"`.
pub fn format_duration(seconds: Option<u64>) -> String {
    let Some(total) = seconds.filter(|s| *s > 0) else {
        return "Unknown".to_string();
    };
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Format an estimated time remaining. Negative or absent is `"Unknown"`.
pub fn format_eta(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => format_duration(Some(s as u64)),
        _ => "Unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0.0), "0 B");
        assert_eq!(format_bytes(512.0), "512.0 B");
        assert_eq!(format_bytes(1536.0), "1.5 KB");
        assert_eq!(format_bytes(5.0 * 1024.0 * 1024.0), "5.0 MB");
        assert_eq!(format_bytes(3.0 * 1024f64.powi(5)), "3072.0 TB");
    }

    #[test]
    fn test_format_speed() {
        assert_eq!(format_speed(None), "0 B/s");
        assert_eq!(format_speed(Some(0.0)), "0 B/s");
        assert_eq!(format_speed(Some(2048.0)), "2.0 KB/s");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(None), "Unknown");
        assert_eq!(format_duration(Some(0)), "Unknown");
        assert_eq!(format_duration(Some(65)), "01:05");
        assert_eq!(format_duration(Some(3725)), "01:02:05");
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(None), "Unknown");
        assert_eq!(format_eta(Some(-1.0)), "Unknown");
        assert_eq!(format_eta(Some(90.7)), "01:30");
    }
}
