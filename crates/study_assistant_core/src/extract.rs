//! crates/study_assistant_core/src/extract.rs
//!
//! Isolates the JSON object inside the backend's generated text. The backend
//! often wraps its answer in markdown fences or a sentence of commentary.

/// Returns the slice from the first `{` to the last `}` inclusive.
///
/// Text without a usable brace pair is returned unchanged; decoding then fails
/// with a `DecodeFailure`.
pub fn isolate_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_object_is_unchanged() {
        let json = r#"{"questions": []}"#;
        assert_eq!(isolate_json(json), json);
    }

    #[test]
    fn strips_code_fences_and_commentary() {
        let text = "Here is the result:\n```json\n{\"a\": {\"b\": 1}}\n```\nLet me know if you need more.";
        assert_eq!(isolate_json(text), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn text_without_braces_is_returned_as_is() {
        let text = "I cannot help with that.";
        assert_eq!(isolate_json(text), text);
    }

    #[test]
    fn reversed_braces_are_not_sliced() {
        let text = "} nothing here {";
        assert_eq!(isolate_json(text), text);
    }

    #[test]
    fn handles_multibyte_text_around_the_object() {
        let text = "Voilà — résumé: {\"k\": \"é\"} ✓";
        assert_eq!(isolate_json(text), "{\"k\": \"é\"}");
    }
}
