// crates/core/src/sanitize.rs
//! Filename sanitization for media titles.

use std::sync::OnceLock;

use regex_lite::Regex;

/// Characters reserved on Windows/macOS/Linux filesystems, plus the
/// full-width colon, comma, exclamation and question marks common in titles.
fn reserved_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[<>:"/\\|?*\x00-\x1f\u{ff1a}\u{ff0c}\u{ff01}\u{ff1f}]"#)
            .expect("static regex is valid")
    })
}

/// Strip reserved characters from a media title and trim surrounding whitespace.
///
/// Result is capped at 200 bytes so `{title}_{tier}.mp4` stays under NAME_MAX.
pub fn sanitize_filename(title: &str) -> String {
    const MAX_BYTES: usize = 200;

    let cleaned = reserved_chars().replace_all(title, "");
    let trimmed = cleaned.trim().trim_end_matches('.');

    if trimmed.len() > MAX_BYTES {
        let mut take = MAX_BYTES;
        while take > 0 && !trimmed.is_char_boundary(take) {
            take -= 1;
        }
        trimmed[..take].trim_end().to_string()
    } else {
        trimmed.to_string()
    }
}
