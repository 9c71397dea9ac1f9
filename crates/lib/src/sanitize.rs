//! Reply sanitization: strip assistant citation markers before delivery.
//!
//! Assistant replies backed by file search carry citation annotations in
//! full-width brackets (e.g. `【4:0†source】`). Chat2Desk renders them as
//! garbage, so they are removed before the text goes out.

use std::sync::LazyLock;

static ANNOTATION: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"【.*?】").expect("valid regex"));

/// Remove every `【...】` annotation (shortest match). Text without markers is
/// returned unchanged.
pub fn sanitize(text: &str) -> String {
    ANNOTATION.replace_all(text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_citation_marker() {
        assert_eq!(sanitize("Answer【1:source】here"), "Answerhere");
        assert_eq!(sanitize("Answer 【1:source】here"), "Answer here");
    }

    #[test]
    fn clean_text_is_unchanged() {
        assert_eq!(sanitize("no markers at all"), "no markers at all");
        assert_eq!(sanitize(""), "");
    }

    #[test]
    fn strips_multiple_markers() {
        assert_eq!(sanitize("a【4:0†file.md】b【4:1†file.md】c"), "abc");
    }

    #[test]
    fn shortest_match_between_markers() {
        // Two separate annotations, not one greedy span.
        assert_eq!(sanitize("【x】keep【y】"), "keep");
    }

    #[test]
    fn unpaired_bracket_is_left_alone() {
        assert_eq!(sanitize("open 【 only"), "open 【 only");
    }
}
