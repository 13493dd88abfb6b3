/// Maximum characters per outbound message (Telegram's hard limit is 4096).
pub const CHUNK_MAX: usize = 4000;

/// Split `text` into contiguous pieces of at most `chunk_size` characters.
///
/// Counts chars, so a multi-byte code point is never cut. Boundaries ignore
/// words and markup. An empty string yields no chunks.
pub fn split_message(text: &str, chunk_size: usize) -> Vec<String> {
    let size = chunk_size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == size {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }

    chunks
}
