//! Raw preview generation

/// Maximum number of characters shown in the raw preview.
pub const MAX_PREVIEW_CHARS: usize = 2000;

/// Best-effort decode of uploaded bytes into a display string.
///
/// Undecodable byte sequences become replacement characters rather than
/// errors; the result is truncated to [`MAX_PREVIEW_CHARS`] from the start.
pub fn render_preview(data: &[u8]) -> String {
    String::from_utf8_lossy(data)
        .chars()
        .take(MAX_PREVIEW_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_utf8_passes_through() {
        assert_eq!(render_preview(b"<scroll/>"), "<scroll/>");
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let preview = render_preview(b"ok\xff\xfeok");
        assert!(preview.starts_with("ok"));
        assert!(preview.ends_with("ok"));
        assert!(preview.contains('\u{FFFD}'));
    }

    #[test]
    fn long_input_truncates_from_the_start() {
        let data = "a".repeat(MAX_PREVIEW_CHARS + 500);
        let preview = render_preview(data.as_bytes());
        assert_eq!(preview.chars().count(), MAX_PREVIEW_CHARS);
        assert_eq!(preview, "a".repeat(MAX_PREVIEW_CHARS));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let data = "桜".repeat(MAX_PREVIEW_CHARS + 10);
        let preview = render_preview(data.as_bytes());
        assert_eq!(preview.chars().count(), MAX_PREVIEW_CHARS);
    }

    #[test]
    fn empty_input_yields_empty_preview() {
        assert_eq!(render_preview(b""), "");
    }
}
