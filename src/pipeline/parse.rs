//! Parsing of the model's reply text into JSON.
//!
//! Despite the prompt, models often wrap their JSON in a ```` ```json ````
//! fence. Only the two literal markers ```` ```json ```` and ```` ``` ```` are
//! removed; anything else is left for the JSON parser to accept or reject.

use crate::error::FileError;
use serde_json::Value;

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// Remove every ```` ```json ```` marker, then every remaining ```` ``` ````,
/// then trim.
pub fn strip_json_fences(content: &str) -> String {
    content
        .trim()
        .replace(JSON_FENCE, "")
        .replace(FENCE, "")
        .trim()
        .to_string()
}

/// Parse a reply into JSON after fence stripping.
///
/// # Errors
/// [`FileError::ResponseFormat`] carrying the untouched `content`.
pub fn parse_model_output(content: &str) -> Result<Value, FileError> {
    let cleaned = strip_json_fences(content);
    serde_json::from_str(&cleaned).map_err(|e| FileError::ResponseFormat {
        detail: e.to_string(),
        raw: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_json_fence() {
        let input = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_json_fences(input), "{\"a\": 1}");
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_json_fences("```\n{}\n```\n"), "{}");
    }

    #[test]
    fn leaves_other_fence_languages_alone() {
        // Only the "json" tag is removed; "javascript" leaves a stray word.
        assert_eq!(strip_json_fences("```javascript\n{}\n```"), "javascript\n{}");
        assert!(parse_model_output("```javascript\n{}\n```").is_err());
    }

    #[test]
    fn tagged_marker_is_removed_before_bare_markers() {
        // "````json" loses "```json" first, leaving one backtick behind.
        assert_eq!(strip_json_fences("````json\n{}"), "`\n{}");
        assert_eq!(strip_json_fences("``````json{}"), "{}");
    }

    #[test]
    fn unfenced_json_parses() {
        let v = parse_model_output("  {\"category\": \"other\"}  ").unwrap();
        assert_eq!(v, json!({"category": "other"}));
    }

    #[test]
    fn fenced_reply_parses_to_object() {
        let content = "```json\n{\"category\":\"invoice\",\"extracted_content\":{},\"description\":\"x\"}\n```";
        let v = parse_model_output(content).unwrap();
        assert_eq!(
            v,
            json!({"category": "invoice", "extracted_content": {}, "description": "x"})
        );
    }

    #[test]
    fn invalid_json_keeps_raw_text() {
        let err = parse_model_output("not json").unwrap_err();
        match err {
            FileError::ResponseFormat { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn raw_text_is_untouched_even_when_fenced() {
        let content = "```json\n{oops}\n```";
        let err = parse_model_output(content).unwrap_err();
        assert_eq!(err.raw_response(), Some(content));
    }
}
