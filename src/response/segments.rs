//! Splitting reply text into chat bubbles

/// Separator the backend uses between bubbles of a single reply
pub const SEGMENT_DELIMITER: char = '|';

/// Split reply text into ordered, trimmed, non-empty segments.
pub fn split(text: &str) -> Vec<String> {
    text.split(SEGMENT_DELIMITER)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
