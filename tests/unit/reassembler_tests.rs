/*!
 * Tests for overlap-stripping reassembly
 */

use doctrans::reassembler::Reassembler;
use doctrans::translator::TranslationResult;

fn result(id: usize, text: &str, context_size: usize) -> TranslationResult {
    TranslationResult {
        id,
        original_text: String::new(),
        translated_text: text.to_string(),
        has_prefix_context: context_size > 0,
        context_size,
        failed: false,
    }
}

#[test]
fn test_join_withExactOverlap_shouldRemoveDuplicatedTail() {
    let previous = "The committee approved measure forty-two on a rainy Tuesday.";
    // The whole previous result (well under the 100-token reference window)
    // reappears at the head of the next chunk's translation.
    let current = format!("{} The mayor signed it the following week.", previous);

    let reassembler = Reassembler::default();
    let joined = reassembler.join(&[result(0, previous, 0), result(1, &current, 120)]);

    assert_eq!(
        joined,
        "The committee approved measure forty-two on a rainy Tuesday. The mayor signed it the following week."
    );
}

#[test]
fn test_join_withUnmatchedOverlap_shouldSkipEstimatedChars() {
    let previous = "completely unrelated earlier translation that will not reappear";
    // context_size 2 tokens -> 8 characters skipped from the front.
    let current = format!("{}{}", "x".repeat(8), "NEW CONTENT");

    let reassembler = Reassembler::default();
    let joined = reassembler.join(&[result(0, previous, 0), result(1, &current, 2)]);

    assert_eq!(joined, format!("{}NEW CONTENT", previous));
}

#[test]
fn test_join_withUnsortedResults_shouldOrderById() {
    let reassembler = Reassembler::default();
    let joined = reassembler.join(&[
        result(2, "three", 0),
        result(0, "one ", 0),
        result(1, "two ", 0),
    ]);
    assert_eq!(joined, "one two three");
}

#[test]
fn test_join_withFailedSentinel_shouldKeepSentinelVisible() {
    let reassembler = Reassembler::default();
    let sentinel = TranslationResult {
        id: 1,
        original_text: String::new(),
        translated_text: "[TRANSLATION ERROR] Failed to translate chunk 1".to_string(),
        has_prefix_context: false,
        context_size: 0,
        failed: true,
    };
    let joined = reassembler.join(&[result(0, "fine text. ", 0), sentinel]);
    assert!(joined.contains("[TRANSLATION ERROR] Failed to translate chunk 1"));
}

#[test]
fn test_join_withMultibyteText_shouldSkipOnCharBoundaries() {
    let previous = "предыдущий фрагмент перевода который нигде больше не встречается";
    // Cyrillic chars are two bytes each; a raw byte slice at context*4 would
    // land mid-character and panic. context_size 1 -> skip 4 chars.
    let current = "абвгNEW";

    let reassembler = Reassembler::default();
    let joined = reassembler.join(&[result(0, previous, 0), result(1, current, 1)]);

    assert_eq!(joined, format!("{}NEW", previous));
}

#[test]
fn test_join_withEmptyResults_shouldReturnEmptyString() {
    assert_eq!(Reassembler::default().join(&[]), "");
}
