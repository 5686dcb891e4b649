/*!
 * Tests for document chunking against the real token codec
 */

use doctrans::chunker::{Chunker, plan_spans};
use doctrans::tokenizer::TokenCodec;

use crate::common;

#[test]
fn test_chunk_withRealCodec_shouldCoverAllTokensWithoutGaps() {
    let text = common::sample_document(300);
    let codec = TokenCodec::cl100k().expect("cl100k vocabulary should load");
    let total = codec.count(&text);
    assert!(total > 2000, "sample document should be several chunks long");

    let chunker = Chunker::new(1000, 250).unwrap();
    let chunks = chunker.chunk(&text);
    assert!(chunks.len() >= 2);

    let first = &chunks[0];
    assert!(first.is_first);
    assert!(!first.has_prefix_context);
    assert_eq!(first.token_start, 0);
    assert_eq!(first.context_size, 0);

    let last = chunks.last().unwrap();
    assert!(last.is_last);
    assert_eq!(last.token_end, total);

    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.id, index, "ids must be dense ordinals");
    }
    for pair in chunks.windows(2) {
        assert!(pair[1].token_end > pair[0].token_end, "token_end must strictly increase");
        assert!(pair[1].has_prefix_context);
        assert_eq!(pair[1].context_size, 250);
        // Overlap relationship: the next chunk starts context_size tokens
        // before this chunk's end.
        assert_eq!(pair[0].token_end, pair[1].token_start + pair[1].context_size);
    }
}

#[test]
fn test_chunk_withRealCodec_shouldMatchPlannedSpans() {
    let text = common::sample_document(200);
    let codec = TokenCodec::cl100k().unwrap();
    let total = codec.count(&text);

    let chunker = Chunker::new(512, 128).unwrap();
    let chunks = chunker.chunk(&text);
    let spans = plan_spans(total, 512, 128);

    assert_eq!(chunks.len(), spans.len());
    for (chunk, span) in chunks.iter().zip(spans.iter()) {
        assert_eq!(chunk.token_start, span.start);
        assert_eq!(chunk.token_end, span.end);
        assert_eq!(chunk.context_size, span.context);
    }
}

#[test]
fn test_chunk_strippingContextPrefixes_shouldReconstructDocument() {
    let text = common::sample_document(250);
    let codec = TokenCodec::cl100k().unwrap();
    let tokens = codec.encode(&text);

    let chunker = Chunker::new(800, 200).unwrap();
    let chunks = chunker.chunk(&text);

    // Dropping each chunk's duplicated context prefix and concatenating the
    // remainders must reproduce the document byte for byte.
    let mut rebuilt = String::new();
    for chunk in &chunks {
        let body = codec
            .decode(&tokens[chunk.token_start + chunk.context_size..chunk.token_end])
            .unwrap();
        rebuilt.push_str(&body);
    }
    assert_eq!(rebuilt, text);
}

#[test]
fn test_chunk_withShortDocument_shouldEmitSingleChunk() {
    let text = "Just a handful of words, nowhere near one chunk.";
    let codec = TokenCodec::cl100k().unwrap();

    let chunker = Chunker::new(4000, 1000).unwrap();
    let chunks = chunker.chunk(text);

    assert_eq!(chunks.len(), 1);
    let only = &chunks[0];
    assert!(only.is_first && only.is_last);
    assert!(!only.has_prefix_context);
    assert_eq!(only.text, text);
    assert_eq!(only.token_end, codec.count(text));
}

#[test]
fn test_chunk_withEmptyInput_shouldEmitNothing() {
    let chunker = Chunker::new(4000, 1000).unwrap();
    assert!(chunker.chunk("").is_empty());
}
