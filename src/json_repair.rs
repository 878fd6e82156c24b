//! The FT API occasionally emits JSON with trailing commas (`{"a":1,}`).
//! These helpers patch that up before handing the text to serde.

use std::borrow::Cow;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::error::{DeskError, Result};

const EXCERPT_LEN: usize = 200;

/// Matches either a whole string literal or a comma sitting right before a
/// closing brace or bracket. Only the second kind (group 1) is rewritten.
fn trailing_comma() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""(?:[^"\\]|\\.)*"|,(\s*[}\]])"#).expect("static regex")
    })
}

fn has_trailing_comma(re: &Regex, text: &str) -> bool {
    re.captures_iter(text).any(|caps| caps.get(1).is_some())
}

/// Strips a BOM and surrounding whitespace and drops commas directly
/// before a closing brace or bracket. String literals are left untouched.
/// Borrows when nothing changes.
pub fn repair_json(raw: &str) -> Cow<'_, str> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    let re = trailing_comma();
    if !has_trailing_comma(re, trimmed) {
        return Cow::Borrowed(trimmed);
    }

    let mut text = trimmed.to_string();
    // `,,}` needs more than one pass
    while has_trailing_comma(re, &text) {
        text = re
            .replace_all(&text, |caps: &Captures| match caps.get(1) {
                Some(closing) => closing.as_str().to_string(),
                None => caps[0].to_string(),
            })
            .into_owned();
    }
    Cow::Owned(text)
}

pub fn parse_lenient(raw: &str) -> Result<Value> {
    let trimmed = raw.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(DeskError::MalformedPayload("empty body".to_string()));
    }
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }
    let repaired = repair_json(trimmed);
    serde_json::from_str(&repaired)
        .map_err(|e| DeskError::MalformedPayload(format!("{} in `{}`", e, excerpt(&repaired))))
}

pub fn excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_json_is_borrowed() {
        let raw = r#"{"Information":{"Info":"No reservations"}}"#;
        assert!(matches!(repair_json(raw), Cow::Borrowed(_)));
    }

    #[test]
    fn trailing_commas_are_removed() {
        let raw = "{\"Details\":{\"Amount\":\"1000000.00\",\n},\"List\":[1,2,],}";
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"Details": {"Amount": "1000000.00"}, "List": [1, 2]}));
    }

    #[test]
    fn doubled_commas_are_removed() {
        assert_eq!(repair_json("[1,,]"), "[1]");
    }

    #[test]
    fn commas_inside_strings_are_kept() {
        let raw = r#"{"Information":{"Info":"Queued: A, ]B"}}"#;
        assert!(matches!(repair_json(raw), Cow::Borrowed(_)));
        let value = parse_lenient(raw).unwrap();
        assert_eq!(value, json!({"Information": {"Info": "Queued: A, ]B"}}));
    }

    #[test]
    fn repair_skips_strings_but_fixes_structure() {
        let raw = r#"{"AccountName":"Smith, }Co","Note":"say \"x, ]\"",}"#;
        let value = parse_lenient(raw).unwrap();
        assert_eq!(
            value,
            json!({"AccountName": "Smith, }Co", "Note": "say \"x, ]\""})
        );
    }

    #[test]
    fn bom_and_whitespace_are_stripped() {
        let value = parse_lenient("\u{feff}  {\"a\": true}\r\n").unwrap();
        assert_eq!(value, json!({"a": true}));
    }

    #[test]
    fn empty_body_is_malformed() {
        assert!(matches!(parse_lenient("  "), Err(DeskError::MalformedPayload(_))));
    }

    #[test]
    fn html_body_is_malformed() {
        let err = parse_lenient("<html>Service Unavailable</html>").unwrap_err();
        assert!(err.to_string().contains("Service Unavailable"));
    }
}
