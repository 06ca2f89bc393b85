/// Upper bound for raw response payloads quoted in error messages.
pub const MAX_PAYLOAD_BYTES: usize = 2048;

pub fn truncate_string(text: &str, max_bytes: usize) -> String {
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut truncated = String::new();
    for ch in text.chars() {
        if truncated.len() + ch.len_utf8() > max_bytes {
            break;
        }
        truncated.push(ch);
    }
    truncated.push_str("...");
    truncated
}

/// Trimmed, length-bounded copy of a response body for diagnostics.
pub fn payload_snippet(body: &str) -> String {
    truncate_string(body.trim(), MAX_PAYLOAD_BYTES)
}

/// File name without its final extension (`clip.final.mp4` -> `clip.final`).
/// Storage names may contain `/`, so the name is not treated as a path.
pub fn display_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    }
}
