//! Response normalization.
//!
//! Strips code-fence markup from model replies and decodes the cleaned text
//! into flashcards or quiz questions. Decoding never fails: a reply that is
//! not the expected JSON array becomes a call-site specific fallback value.

use crate::models::{Flashcard, QuizQuestion, StructuredResult};
use crate::task::CancelToken;
use serde_json::Value;

const FENCE: &str = "```";
const FENCE_LANG: &str = "json";

/// Which structured shape a reply is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredKind {
    Flashcards,
    Quiz,
}

/// Remove every "```json" and "```" marker, then trim surrounding whitespace.
///
/// `None` and empty input both yield an empty string.
pub fn clean(raw: Option<&str>) -> String {
    let Some(raw) = raw else {
        return String::new();
    };

    strip_fence_markers(raw).trim().to_string()
}

/// One left-to-right pass, preferring "```json" over "```" at each match.
fn strip_fence_markers(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find(FENCE) {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + FENCE.len()..];
        rest = after.strip_prefix(FENCE_LANG).unwrap_or(after);
    }

    out.push_str(rest);
    out
}

/// Parse cleaned text as a JSON array. Only a failure here triggers a fallback;
/// element shapes are never validated.
fn parse_array(cleaned: &str) -> serde_json::Result<Vec<Value>> {
    serde_json::from_str::<Vec<Value>>(cleaned)
}

/// Decode cleaned text as a flashcard array, falling back to a single `Info` card.
pub fn decode_flashcards(cleaned: &str) -> Vec<Flashcard> {
    match parse_array(cleaned) {
        Ok(items) => {
            tracing::debug!("Parsed {} flashcards", items.len());
            items.into_iter().map(Flashcard::from_value).collect()
        }
        Err(e) => {
            tracing::warn!("Could not parse flashcards JSON, returning text: {}", e);
            vec![Flashcard::info(cleaned)]
        }
    }
}

/// Decode cleaned text as a quiz, falling back to a single placeholder question.
pub fn decode_quiz(cleaned: &str) -> Vec<QuizQuestion> {
    match parse_array(cleaned) {
        Ok(items) => {
            tracing::debug!("Parsed {} quiz questions", items.len());
            items.into_iter().map(QuizQuestion::from_value).collect()
        }
        Err(e) => {
            tracing::warn!("Could not parse quiz JSON: {}", e);
            vec![QuizQuestion::placeholder()]
        }
    }
}

/// Clean a raw reply and decode it as `kind`.
pub fn decode(kind: StructuredKind, raw: &str) -> StructuredResult {
    let cleaned = clean(Some(raw));
    match kind {
        StructuredKind::Flashcards => StructuredResult::Flashcards(decode_flashcards(&cleaned)),
        StructuredKind::Quiz => StructuredResult::Quiz(decode_quiz(&cleaned)),
    }
}

/// Like [`decode`], but yields nothing once `token` is cancelled so a torn-down
/// caller never receives a value to apply.
pub fn decode_unless_cancelled(
    token: &CancelToken,
    kind: StructuredKind,
    raw: &str,
) -> Option<StructuredResult> {
    if token.is_cancelled() {
        tracing::debug!("Skipping {:?} decode for cancelled request", kind);
        return None;
    }
    Some(decode(kind, raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clean_strips_fences_and_trims() {
        assert_eq!(clean(Some("```json\n[1, 2]\n```")), "[1, 2]");
        assert_eq!(clean(Some("  plain text  ")), "plain text");
        assert_eq!(clean(Some("a ``` b ```json c")), "a  b  c");
    }

    #[test]
    fn test_clean_empty_and_missing() {
        assert_eq!(clean(None), "");
        assert_eq!(clean(Some("")), "");
        assert_eq!(clean(Some("```")), "");
    }

    /// Call `check` with every string over `alphabet` of length `0..=max_len`.
    fn for_each_string(alphabet: &[char], max_len: usize, mut check: impl FnMut(&str)) {
        let base = alphabet.len();
        let mut buf = String::with_capacity(max_len);
        for len in 0..=max_len {
            for mut n in 0..base.pow(len as u32) {
                buf.clear();
                for _ in 0..len {
                    buf.push(alphabet[n % base]);
                    n /= base;
                }
                check(&buf);
            }
        }
    }

    #[test]
    fn test_clean_is_fence_free_and_idempotent_for_all_short_inputs() {
        let alphabet = ['`', 'j', 's', 'o', 'n', ' '];
        let mut checked = 0usize;
        for_each_string(&alphabet, 8, |input| {
            let once = clean(Some(input));
            assert!(!once.contains(FENCE), "fence left in {:?} from {:?}", once, input);
            assert_eq!(clean(Some(&once)), once, "not idempotent for {:?}", input);
            checked += 1;
        });
        // 6^0 + 6^1 + ... + 6^8
        assert_eq!(checked, 2_015_539);
    }

    #[test]
    fn test_clean_never_leaves_fences() {
        let samples = [
            "````json``",
            "``````",
            "`````json`",
            "x``` ```y",
            "``\n```json\n{}\n```\n``",
            "`` ```json` ``",
        ];
        for sample in samples {
            let once = clean(Some(sample));
            assert!(!once.contains(FENCE), "fence left in {:?}", once);
            assert_eq!(clean(Some(&once)), once);
        }
    }

    #[test]
    fn test_clean_prefers_leftmost_marker() {
        assert_eq!(clean(Some("a`````b")), "a``b");
        assert_eq!(clean(Some("`x```json``")), "`x``");
    }

    #[test]
    fn test_flashcards_valid_array_is_unchanged() {
        let cards = decode_flashcards(
            r#"[{"title":"Gravity","detail":"Mass attracts mass"},{"title":"Light","detail":"Fast"}]"#,
        );
        assert_eq!(
            cards,
            vec![
                Flashcard::new("Gravity", "Mass attracts mass"),
                Flashcard::new("Light", "Fast"),
            ]
        );
    }

    #[test]
    fn test_flashcards_invalid_text_falls_back_to_info() {
        assert_eq!(
            decode_flashcards("not json"),
            vec![Flashcard::new("Info", "not json")]
        );
    }

    #[test]
    fn test_flashcards_object_is_not_an_array() {
        let text = r#"{"title":"Solo","detail":"Not wrapped"}"#;
        assert_eq!(decode_flashcards(text), vec![Flashcard::info(text)]);
    }

    #[test]
    fn test_flashcard_with_null_detail_is_kept() {
        let cards = decode_flashcards(r#"[{"title":"Osmosis","detail":null}]"#);
        assert_eq!(cards, vec![Flashcard::new("Osmosis", "")]);
    }

    #[test]
    fn test_quiz_numeric_answer_is_not_replaced() {
        let quiz = decode_quiz(
            r#"[{"question":"Which index?","options":["0) first","1) second"],"answer":0}]"#,
        );
        assert_eq!(quiz.len(), 1);
        assert_ne!(quiz[0], QuizQuestion::placeholder());
        assert_eq!(quiz[0].question, "Which index?");
        assert_eq!(quiz[0].answer, "0");
        assert!(quiz[0].is_correct("0) first"));
    }

    #[test]
    fn test_quiz_extra_fields_survive() {
        let quiz = decode_quiz(
            r#"[{"question":"Q","options":["A) 1","B) 2"],"answer":"A","explanation":"One comes first"}]"#,
        );
        assert_eq!(
            quiz[0].extra.get("explanation"),
            Some(&Value::from("One comes first"))
        );

        let out = serde_json::to_value(&quiz[0]).unwrap();
        assert_eq!(out["explanation"], "One comes first");
        assert_eq!(out["answer"], "A");
    }

    #[test]
    fn test_flashcard_extra_fields_survive() {
        let cards = decode_flashcards(r#"[{"title":"T","detail":"D","source":"textbook"}]"#);
        assert_eq!(cards[0].title, "T");
        assert_eq!(cards[0].extra.get("source"), Some(&Value::from("textbook")));
    }

    #[test]
    fn test_array_of_scalars_is_not_a_fallback() {
        assert_eq!(
            decode_flashcards(r#"["Mitochondria make ATP"]"#),
            vec![Flashcard::new("", "Mitochondria make ATP")]
        );
    }

    #[test]
    fn test_quiz_invalid_text_falls_back_to_placeholder() {
        let quiz = decode_quiz("Sorry, I can't do that.");
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].answer, quiz[0].options[0]);
    }

    #[test]
    fn test_decode_fenced_quiz() {
        let raw = "```json\n[{\"question\":\"Q\",\"options\":[\"A) 1\",\"B) 2\",\"C) 3\",\"D) 4\"],\"answer\":\"A\"}]\n```";
        match decode(StructuredKind::Quiz, raw) {
            StructuredResult::Quiz(questions) => {
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].question, "Q");
                assert_eq!(questions[0].answer, "A");
                assert!(questions[0].is_correct("A) 1"));
            }
            other => panic!("expected quiz, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_fenced_flashcards() {
        let raw = "```json\n[{\"title\":\"T\",\"detail\":\"D\"}]\n```";
        assert_eq!(
            decode(StructuredKind::Flashcards, raw),
            StructuredResult::Flashcards(vec![Flashcard::new("T", "D")])
        );
    }

    #[test]
    fn test_decode_unless_cancelled() {
        let token = CancelToken::new();
        assert!(decode_unless_cancelled(&token, StructuredKind::Quiz, "[]").is_some());

        token.cancel();
        assert!(decode_unless_cancelled(&token, StructuredKind::Quiz, "[]").is_none());
    }
}
