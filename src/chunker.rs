/*!
 * Document chunking with carry-over context.
 *
 * The primary path encodes the whole document once and walks the token
 * sequence, so every chunk boundary is exact in the unit the remote service
 * understands. Each chunk after the first starts `context_size` tokens before
 * the previous chunk's end; the duplicated prefix keeps terminology and style
 * consistent across chunk boundaries and is stripped again during reassembly.
 *
 * When the token codec is unavailable the chunker falls back to sentence
 * accumulation with approximate word counts. That path preserves every byte
 * of the input but places boundaries less precisely, and token offsets are
 * not meaningful on it.
 */

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ChunkError;
use crate::tokenizer::TokenCodec;

/// Default chunk size in tokens.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

/// Default carry-over context size in tokens.
pub const DEFAULT_CONTEXT_SIZE: usize = 1000;

/// One translation unit of the source document.
///
/// Immutable once produced. Chunks ordered by `id` cover the whole token
/// sequence with no gaps; `token_end[i] == token_start[i+1] + context_size[i+1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Dense 0-based ordinal, the only ordering authority downstream.
    pub id: usize,
    /// Chunk text, including the duplicated context prefix.
    pub text: String,
    /// Start offset into the whole-document token sequence (context included).
    pub token_start: usize,
    /// End offset (exclusive) into the whole-document token sequence.
    pub token_end: usize,
    /// Whether this is the first chunk of the document.
    pub is_first: bool,
    /// Whether this is the last chunk of the document.
    pub is_last: bool,
    /// Whether `text` starts with context duplicated from the previous chunk.
    pub has_prefix_context: bool,
    /// Number of tokens (words on the fallback path) of duplicated context.
    pub context_size: usize,
}

/// One planned token range, before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSpan {
    /// First token index, context included.
    pub start: usize,
    /// One past the last token index.
    pub end: usize,
    /// How many leading tokens duplicate the previous span.
    pub context: usize,
}

/// Plan the cursor walk over a token sequence of `total_tokens` tokens.
///
/// Pure so the coverage invariants can be tested without a tokenizer: `end`
/// values are strictly increasing, the last `end` equals `total_tokens`, and
/// consecutive spans overlap by exactly `context` tokens.
pub fn plan_spans(total_tokens: usize, chunk_size: usize, context_size: usize) -> Vec<TokenSpan> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let mut spans = Vec::new();
    let mut i = 0;
    while i < total_tokens {
        let end = (i + chunk_size).min(total_tokens);
        let start = if i == 0 { 0 } else { i.saturating_sub(context_size) };
        spans.push(TokenSpan {
            start,
            end,
            context: i - start,
        });
        i = end;
    }
    spans
}

/// Splits documents into token-bounded, context-overlapping chunks.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    context_size: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            context_size: DEFAULT_CONTEXT_SIZE,
        }
    }
}

impl Chunker {
    /// Create a chunker with explicit sizes, both in tokens.
    pub fn new(chunk_size: usize, context_size: usize) -> Result<Self, ChunkError> {
        if chunk_size == 0 || context_size == 0 {
            return Err(ChunkError::InvalidParameters(format!(
                "chunk_size and context_size must be positive, got {} and {}",
                chunk_size, context_size
            )));
        }
        if context_size >= chunk_size {
            return Err(ChunkError::InvalidParameters(format!(
                "context_size ({}) must be smaller than chunk_size ({})",
                context_size, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            context_size,
        })
    }

    /// Split `text` into ordered chunks.
    ///
    /// Uses token-exact slicing when the codec is available and falls back to
    /// sentence accumulation otherwise. Either way at least one chunk is
    /// emitted for non-empty input and no input text is lost.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if let Some(codec) = TokenCodec::cl100k() {
            match self.chunk_tokens(&codec, text) {
                Ok(chunks) => return chunks,
                Err(e) => {
                    warn!("Token-based chunking failed ({}), falling back to sentence chunking", e);
                }
            }
        } else {
            warn!("Token codec unavailable, falling back to sentence chunking");
        }
        self.chunk_sentences(text)
    }

    /// Token-exact chunking: encode once, slice spans, decode each span.
    fn chunk_tokens(&self, codec: &TokenCodec, text: &str) -> Result<Vec<Chunk>, ChunkError> {
        let tokens = codec.encode(text);
        let total = tokens.len();
        let spans = plan_spans(total, self.chunk_size, self.context_size);

        let mut chunks = Vec::with_capacity(spans.len());
        for (id, span) in spans.iter().enumerate() {
            let chunk_text = codec.decode(&tokens[span.start..span.end])?;
            chunks.push(Chunk {
                id,
                text: chunk_text,
                token_start: span.start,
                token_end: span.end,
                is_first: id == 0,
                is_last: span.end == total,
                has_prefix_context: id > 0,
                context_size: span.context,
            });
        }
        Ok(chunks)
    }

    /// Fallback chunking: accumulate whole sentences until the approximate
    /// word count exceeds the chunk size, carrying the last `context_size`
    /// words of each emitted chunk as the next chunk's prefix context.
    fn chunk_sentences(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut carried_context = String::new();
        let mut id = 0;

        for sentence in split_sentences(text) {
            let candidate_words = word_count(&current) + word_count(sentence);
            if !current.is_empty() && candidate_words > self.chunk_size {
                chunks.push(self.fallback_chunk(id, &carried_context, &current, false));

                let words: Vec<&str> = current.split_whitespace().collect();
                carried_context = if words.len() > self.context_size {
                    format!("{} ", words[words.len() - self.context_size..].join(" "))
                } else {
                    format!("{} ", current.trim_end())
                };
                current = sentence.to_string();
                id += 1;
            } else {
                current.push_str(sentence);
            }
        }

        if !current.is_empty() {
            chunks.push(self.fallback_chunk(id, &carried_context, &current, true));
        }
        chunks
    }

    fn fallback_chunk(&self, id: usize, context: &str, body: &str, is_last: bool) -> Chunk {
        // Token offsets are approximations on this path and must not be
        // relied upon; they stay zeroed.
        Chunk {
            id,
            text: format!("{}{}", context, body),
            token_start: 0,
            token_end: 0,
            is_first: id == 0,
            is_last,
            has_prefix_context: !context.is_empty(),
            context_size: word_count(context),
        }
    }
}

/// Sentence boundary: terminal punctuation followed by whitespace.
static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary regex is valid"));

/// Split text after `.`/`!`/`?` followed by whitespace.
///
/// The trailing whitespace stays attached to the preceding sentence so that
/// concatenating the pieces reproduces the input byte for byte.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last = 0;
    for boundary in SENTENCE_BOUNDARY.find_iter(text) {
        sentences.push(&text[last..boundary.end()]);
        last = boundary.end();
    }
    if last < text.len() {
        sentences.push(&text[last..]);
    }
    sentences
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
