//! Filename sanitization.

/// Characters that are invalid in filenames on at least one major platform
const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Strip illegal and control characters, collapse whitespace runs to a
/// single space, and trim.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Longest prefix of `s` that fits in `max_bytes` without splitting a char
pub fn truncate_to_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
