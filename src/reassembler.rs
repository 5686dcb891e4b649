/*!
 * Reassembly of translated chunks into the final document.
 *
 * The dispatcher makes no ordering promise, so results are first sorted by
 * chunk id. Each chunk after the first may begin with a translated copy of
 * the previous chunk's tail; that overlap is removed best-effort in three
 * tiers, because translation does not guarantee token alignment with the
 * source:
 *
 * 1. exact match against the previous result's last tokens,
 * 2. skip an estimated `context_size * CHARS_PER_TOKEN` characters,
 * 3. append unmodified and accept possible visible duplication.
 */

use log::debug;

use crate::tokenizer::TokenCodec;
use crate::translator::TranslationResult;

/// How many tokens of the previous result anchor the overlap search.
pub const OVERLAP_REFERENCE_TOKENS: usize = 100;

/// Characters skipped per context token when the anchor search misses.
///
/// A rough average for alphabetic scripts; a tunable default, not a
/// guaranteed ratio.
pub const CHARS_PER_TOKEN: usize = 4;

/// Joins completed chunk results, stripping duplicated overlap.
#[derive(Debug, Clone, Copy)]
pub struct Reassembler {
    reference_tokens: usize,
    chars_per_token: usize,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self {
            reference_tokens: OVERLAP_REFERENCE_TOKENS,
            chars_per_token: CHARS_PER_TOKEN,
        }
    }
}

impl Reassembler {
    /// Create a reassembler with explicit tuning.
    pub fn new(reference_tokens: usize, chars_per_token: usize) -> Self {
        Self {
            reference_tokens,
            chars_per_token,
        }
    }

    /// Join results into the final text, ordered by chunk id.
    ///
    /// Failed sentinel results participate like any other; deciding what a
    /// partially failed document means is up to the caller.
    pub fn join(&self, results: &[TranslationResult]) -> String {
        let mut sorted: Vec<&TranslationResult> = results.iter().collect();
        sorted.sort_by_key(|r| r.id);

        let codec = TokenCodec::cl100k();
        let mut final_text = String::new();

        for (index, result) in sorted.iter().enumerate() {
            let text = result.translated_text.as_str();

            if index == 0 || !result.has_prefix_context {
                final_text.push_str(text);
                continue;
            }

            match &codec {
                Some(codec) => {
                    let previous = sorted[index - 1].translated_text.as_str();
                    let appended = self.strip_overlap(codec, previous, text, result.context_size);
                    if appended.len() == text.len() {
                        debug!("Chunk {}: no overlap removed", result.id);
                    }
                    final_text.push_str(appended);
                }
                // Without a codec there is no anchor to search for; keep the
                // text whole rather than guess wrong.
                None => final_text.push_str(text),
            }
        }

        final_text
    }

    /// Drop the translated copy of the previous chunk's tail from `current`.
    fn strip_overlap<'a>(
        &self,
        codec: &TokenCodec,
        previous: &str,
        current: &'a str,
        context_size: usize,
    ) -> &'a str {
        // Tier 1: find the previous result's tail verbatim.
        let previous_tokens = codec.encode(previous);
        let take = previous_tokens.len().min(self.reference_tokens);
        if take > 0 {
            if let Ok(reference) = codec.decode(&previous_tokens[previous_tokens.len() - take..]) {
                if !reference.is_empty() {
                    if let Some(position) = current.find(&reference) {
                        return &current[position + reference.len()..];
                    }
                }
            }
        }

        // Tier 2: translation drift broke the exact match; skip roughly the
        // context's worth of characters instead.
        if context_size > 0 {
            let skip = context_size * self.chars_per_token;
            return match current.char_indices().nth(skip) {
                Some((byte_index, _)) => &current[byte_index..],
                None => "",
            };
        }

        current
    }
}
