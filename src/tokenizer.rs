/*!
 * Token counting and encoding for chunk boundary computation.
 *
 * Wraps the `cl100k_base` BPE vocabulary so chunk boundaries line up with the
 * token unit the remote translation service actually bills and truncates in.
 * When the codec cannot be constructed, callers degrade to the word-count
 * estimate and sentence-based chunking.
 */

use once_cell::sync::OnceCell;
use tiktoken_rs::{CoreBPE, cl100k_base};

use crate::errors::ChunkError;

/// Global codec singleton.
///
/// Building the BPE ranks table is expensive, so it is done once per process
/// and shared by the chunker and the reassembler.
static CL100K: OnceCell<CoreBPE> = OnceCell::new();

/// Adapter over the shared `cl100k_base` encoder.
#[derive(Clone, Copy)]
pub struct TokenCodec {
    bpe: &'static CoreBPE,
}

impl TokenCodec {
    /// Get the cl100k codec, initializing the shared instance on first use.
    ///
    /// Returns `None` when the vocabulary cannot be loaded; callers must then
    /// use [`estimate_tokens`] and sentence-based chunking instead.
    pub fn cl100k() -> Option<Self> {
        let bpe = CL100K.get_or_try_init(cl100k_base).ok()?;
        Some(Self { bpe })
    }

    /// Number of tokens in the text.
    pub fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }

    /// Encode text into the whole-document token sequence.
    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_with_special_tokens(text)
    }

    /// Decode a token slice back to text.
    ///
    /// Fails when the slice does not end up on a valid UTF-8 boundary, which
    /// can happen for arbitrary mid-character slices.
    pub fn decode(&self, tokens: &[u32]) -> Result<String, ChunkError> {
        self.bpe
            .decode(tokens.to_vec())
            .map_err(|e| ChunkError::DecodeFailed(e.to_string()))
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

/// Approximate token count when no codec is available.
///
/// Subword vocabularies average a bit more than one token per word for
/// natural-language text, hence the 1.3 multiplier.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * 1.3).ceil() as usize
}
