//! JSON extraction utilities for parsing LLM responses.
//!
//! Models asked for "ONLY the JSON" still wrap it in markdown fences or put a
//! sentence in front of it. [`extract_json_payload`] locates the payload.
//!
//! # Extraction Strategies
//!
//! Tried in order, each candidate must parse as JSON:
//! 1. Direct JSON (content starts with '{' or '[')
//! 2. A ```` ```json ```` fenced block
//! 3. A generic ```` ``` ```` fenced block
//! 4. The first balanced object/array anywhere in the content
//!
//! # Example
//!
//! ```
//! use content_forge::utils::json_extraction::extract_json_payload;
//!
//! let response = "Sure! Here you go:\n```json\n[{\"question\": \"What is it?\"}]\n```";
//! let json = extract_json_payload(response).unwrap();
//! assert!(json.starts_with('['));
//! ```

use thiserror::Error;

/// Error type for JSON extraction failures
#[derive(Debug, Clone, Error, PartialEq)]
pub enum JsonExtractionError {
    #[error("JSON appears truncated: {unclosed_braces} unclosed braces, {unclosed_brackets} unclosed brackets. Partial: {partial_preview}...")]
    Truncated {
        partial_preview: String,
        unclosed_braces: usize,
        unclosed_brackets: usize,
    },
    #[error("No JSON content found in response. Content starts with: '{content_preview}'")]
    NotFound { content_preview: String },
}

/// Analysis result for JSON structure
#[derive(Debug, Clone, PartialEq)]
pub struct JsonStructureAnalysis {
    /// Number of unclosed braces ('{' without matching '}')
    pub unclosed_braces: usize,
    /// Number of unclosed brackets ('[' without matching ']')
    pub unclosed_brackets: usize,
    /// Whether we ended inside a string literal
    pub in_string: bool,
    /// The position where JSON-like content starts (first '{' or '[')
    pub json_start: Option<usize>,
}

impl JsonStructureAnalysis {
    fn is_truncated(&self) -> bool {
        self.unclosed_braces > 0 || self.unclosed_brackets > 0 || self.in_string
    }
}

/// Scans the content tracking brace/bracket depth outside string literals.
pub fn analyze_json_structure(s: &str) -> JsonStructureAnalysis {
    let mut brace_depth: isize = 0;
    let mut bracket_depth: isize = 0;
    let mut in_string = false;
    let mut escape_next = false;
    let mut json_start: Option<usize> = None;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match c {
            '\\' if in_string => escape_next = true,
            '"' if json_start.is_some() => in_string = !in_string,
            '{' if !in_string => {
                json_start.get_or_insert(i);
                brace_depth += 1;
            }
            '}' if !in_string => brace_depth -= 1,
            '[' if !in_string => {
                json_start.get_or_insert(i);
                bracket_depth += 1;
            }
            ']' if !in_string => bracket_depth -= 1,
            _ => {}
        }
    }

    JsonStructureAnalysis {
        unclosed_braces: brace_depth.max(0) as usize,
        unclosed_brackets: bracket_depth.max(0) as usize,
        in_string,
        json_start,
    }
}

/// Finds the byte index of the delimiter closing the one at position 0.
///
/// `s` must start with `open`. Nested delimiters and string literals
/// (including escaped quotes) are skipped.
pub fn find_matching_close(s: &str, open: char, close: char) -> Option<usize> {
    if !s.starts_with(open) {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, c) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match c {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

/// Returns the body of the first ```` ```json ```` fenced block.
pub fn extract_from_json_code_block(content: &str) -> Option<String> {
    let start = content.find("```json")? + "```json".len();
    let end = content[start..].find("```")?;
    Some(content[start..start + end].trim().to_string())
}

/// Returns the body of the first generic fenced block, skipping its info line.
pub fn extract_from_generic_code_block(content: &str) -> Option<String> {
    let fence = content.find("```")? + 3;
    let body_start = content[fence..]
        .find('\n')
        .map(|i| fence + i + 1)
        .unwrap_or(fence);
    let end = content[body_start..].find("```")?;
    Some(content[body_start..body_start + end].trim().to_string())
}

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(candidate).is_ok()
}

fn balanced_span_from(content: &str, start: usize) -> Option<&str> {
    let rest = &content[start..];
    let (open, close) = if rest.starts_with('{') {
        ('{', '}')
    } else {
        ('[', ']')
    };
    find_matching_close(rest, open, close).map(|end| &rest[..=end])
}

/// Locates the JSON payload in an LLM response.
///
/// # Errors
///
/// Returns [`JsonExtractionError::Truncated`] when JSON starts but never
/// closes (typically a `max_tokens` cut-off), and
/// [`JsonExtractionError::NotFound`] when the content holds nothing JSON-like.
pub fn extract_json_payload(content: &str) -> Result<String, JsonExtractionError> {
    let trimmed = content.trim();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        if let Some(span) = balanced_span_from(trimmed, 0) {
            if parses(span) {
                return Ok(span.to_string());
            }
        }
    }

    for fenced in [
        extract_from_json_code_block(trimmed),
        extract_from_generic_code_block(trimmed),
    ]
    .into_iter()
    .flatten()
    {
        if parses(&fenced) {
            return Ok(fenced);
        }
    }

    // First object or array anywhere; try each opening position in order.
    for (start, c) in trimmed.char_indices() {
        if c != '{' && c != '[' {
            continue;
        }
        if let Some(span) = balanced_span_from(trimmed, start) {
            if parses(span) {
                return Ok(span.to_string());
            }
        }
    }

    let analysis = analyze_json_structure(trimmed);
    if let Some(start) = analysis.json_start {
        if analysis.is_truncated() {
            let partial = &trimmed[start..];
            let partial_preview: String = partial.chars().take(100).collect();
            return Err(JsonExtractionError::Truncated {
                partial_preview,
                unclosed_braces: analysis.unclosed_braces,
                unclosed_brackets: analysis.unclosed_brackets,
            });
        }
    }

    Err(JsonExtractionError::NotFound {
        content_preview: trimmed.chars().take(50).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_object() {
        let json = extract_json_payload(r#"{"tagline": "Glow up"}"#).unwrap();
        assert_eq!(json, r#"{"tagline": "Glow up"}"#);
    }

    #[test]
    fn test_direct_array_with_trailing_text() {
        let json = extract_json_payload(r#"["a", "b"] hope this helps"#).unwrap();
        assert_eq!(json, r#"["a", "b"]"#);
    }

    #[test]
    fn test_direct_json_wins_over_fence_inside_string() {
        let content = r#"{"description": "Reply with ```json [1, 2] ``` only", "ok": true}"#;
        assert_eq!(extract_json_payload(content).unwrap(), content);
    }

    #[test]
    fn test_json_code_block() {
        let content = "Here it is:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json_payload(content).unwrap(), "{\"a\": 1}");
    }

    #[test]
    fn test_generic_code_block() {
        let content = "```\n[1, 2, 3]\n```";
        assert_eq!(extract_json_payload(content).unwrap(), "[1, 2, 3]");
    }

    #[test]
    fn test_embedded_object_after_prose() {
        let content = "The comparison follows {\"winner\": \"A\", \"note\": \"uses {braces}\"} end";
        let json = extract_json_payload(content).unwrap();
        assert_eq!(json, "{\"winner\": \"A\", \"note\": \"uses {braces}\"}");
    }

    #[test]
    fn test_skips_unparseable_bracket_prefix() {
        let content = "[note] result: {\"ok\": true}";
        assert_eq!(extract_json_payload(content).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn test_truncated() {
        let err = extract_json_payload(r#"{"questions": [{"category": "Usage""#).unwrap_err();
        match err {
            JsonExtractionError::Truncated {
                unclosed_braces,
                unclosed_brackets,
                ..
            } => {
                assert_eq!(unclosed_braces, 2);
                assert_eq!(unclosed_brackets, 1);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn test_not_found() {
        let err = extract_json_payload("I cannot help with that.").unwrap_err();
        assert!(matches!(err, JsonExtractionError::NotFound { .. }));
    }

    #[test]
    fn test_find_matching_close_handles_escapes() {
        let s = r#"{"a": "quote \" and } brace"} tail"#;
        let end = find_matching_close(s, '{', '}').unwrap();
        assert_eq!(&s[..=end], r#"{"a": "quote \" and } brace"}"#);
    }

    #[test]
    fn test_multibyte_content_is_preserved() {
        let content = "Price follows: {\"price\": \"₹699\"}";
        assert_eq!(extract_json_payload(content).unwrap(), "{\"price\": \"₹699\"}");
    }
}
