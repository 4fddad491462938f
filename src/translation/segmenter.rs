/*!
 * Text segmentation.
 *
 * Splits raw document text into ordered chunks of bounded size. Paragraphs
 * (blank-line delimited) are packed together until the next one would overflow
 * the limit; a paragraph that is too large on its own is split after `". "`.
 * A single sentence longer than the limit is emitted as one oversized chunk.
 *
 * Sizes are measured in characters, not bytes.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Separator placed between paragraphs packed into the same chunk
pub const PARAGRAPH_SEPARATOR: &str = "\n\n";

const SENTENCE_BOUNDARY: &str = ". ";

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Split `text` into chunks of at most `max_size` characters
pub fn split(text: &str, max_size: usize) -> Vec<String> {
    let max_size = max_size.max(1);
    let normalized = text.replace("\r\n", "\n");
    let mut builder = ChunkBuilder::new(max_size, PARAGRAPH_SEPARATOR);

    for paragraph in PARAGRAPH_BREAK
        .split(&normalized)
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        if char_len(paragraph) <= max_size {
            builder.push(paragraph);
            continue;
        }

        builder.flush();
        let mut pieces = split_sentences(paragraph, max_size);
        // The tail of a long paragraph may still share a chunk with what follows
        if let Some(last) = pieces.pop() {
            builder.extend_closed(pieces);
            builder.push(&last);
        }
    }

    builder.finish()
}

/// Split one paragraph at sentence boundaries, packing sentences up to `max_size`
fn split_sentences(paragraph: &str, max_size: usize) -> Vec<String> {
    let mut builder = ChunkBuilder::new(max_size, " ");

    for sentence in paragraph
        .split_inclusive(SENTENCE_BOUNDARY)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        builder.push(sentence);
    }

    builder.finish()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Greedy packer shared by the paragraph and sentence passes
struct ChunkBuilder<'a> {
    max_size: usize,
    separator: &'a str,
    chunks: Vec<String>,
    current: String,
    current_len: usize,
}

impl<'a> ChunkBuilder<'a> {
    fn new(max_size: usize, separator: &'a str) -> Self {
        Self {
            max_size,
            separator,
            chunks: Vec::new(),
            current: String::new(),
            current_len: 0,
        }
    }

    fn push(&mut self, piece: &str) {
        let piece_len = char_len(piece);

        if self.current.is_empty() {
            self.current.push_str(piece);
            self.current_len = piece_len;
            return;
        }

        let joined_len = self.current_len + char_len(self.separator) + piece_len;
        if joined_len <= self.max_size {
            self.current.push_str(self.separator);
            self.current.push_str(piece);
            self.current_len = joined_len;
        } else {
            self.flush();
            self.current.push_str(piece);
            self.current_len = piece_len;
        }
    }

    fn extend_closed(&mut self, pieces: Vec<String>) {
        self.flush();
        self.chunks.extend(pieces);
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.chunks.push(std::mem::take(&mut self.current));
            self.current_len = 0;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
