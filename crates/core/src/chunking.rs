use crate::models::TextChunk;

/// Page tracking is not implemented: extraction flattens the document, so
/// every chunk reports this same page number.
pub const PLACEHOLDER_PAGE: u32 = 1;

#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub window_chars: usize,
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_chars: 1_000,
            overlap_chars: 200,
        }
    }
}

/// Splits text into overlapping windows counted in characters.
///
/// Consecutive windows overlap by `overlap_chars`; the final window may be
/// shorter. Windows that trim down to nothing are dropped without consuming
/// an index. When the overlap would keep the window from advancing, the next
/// start is forced forward by a full window so the walk always terminates.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<TextChunk> {
    let chars: Vec<char> = text.chars().collect();
    let window = config.window_chars.max(1);

    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut index = 0usize;

    while start < chars.len() {
        let end = (start + window).min(chars.len());
        let piece: String = chars[start..end].iter().collect();
        let trimmed = piece.trim();

        if !trimmed.is_empty() {
            chunks.push(TextChunk {
                content: trimmed.to_string(),
                index,
                page: PLACEHOLDER_PAGE,
            });
            index += 1;
        }

        if end == chars.len() {
            break;
        }

        let mut next = start + window.saturating_sub(config.overlap_chars);
        if next <= start {
            next = start + window;
        }
        start = next;
    }

    chunks
}
