//! Shared utility functions for the crewforge crate.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static NON_NAME_CHARS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\s]").unwrap());
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Fallback project name when a goal has no usable characters.
pub const DEFAULT_PROJECT_NAME: &str = "my_project";

/// Derive a filesystem-safe project name from a free-text goal.
///
/// Lowercases, keeps the first 50 characters, drops everything except ASCII
/// letters, digits and whitespace, and joins words with underscores.
pub fn sanitize_project_name(goal: &str) -> String {
    let head: String = goal.to_lowercase().chars().take(50).collect();
    let kept = NON_NAME_CHARS.replace_all(&head, "");
    let name = WHITESPACE_RUN.replace_all(kept.trim(), "_").into_owned();

    if name.is_empty() {
        DEFAULT_PROJECT_NAME.to_string()
    } else {
        name
    }
}

/// Extract a JSON object from text that may contain other content.
/// Uses brace-counting to find the outermost JSON object.
pub fn extract_json_object(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse a JSON object out of a model response.
///
/// Tries the whole response with markdown fences stripped first, then the
/// outermost `{...}` object found anywhere in the text.
pub fn parse_json_object(text: &str) -> Option<Map<String, Value>> {
    let cleaned = text.replace("```json", "").replace("```", "");
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(cleaned.trim()) {
        return Some(map);
    }

    let candidate = extract_json_object(&cleaned)?;
    match serde_json::from_str::<Value>(&candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Truncate text to at most `max_chars` characters, marking the cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars).collect();
    format!("{}\n... (truncated)", kept)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_project_name() {
        assert_eq!(sanitize_project_name("Build a Todo App!"), "build_a_todo_app");
        assert_eq!(
            sanitize_project_name("  REST   api\tfor notes  "),
            "rest_api_for_notes"
        );
        assert_eq!(sanitize_project_name("!!!"), DEFAULT_PROJECT_NAME);
        assert_eq!(sanitize_project_name(""), DEFAULT_PROJECT_NAME);
    }

    #[test]
    fn test_sanitize_project_name_keeps_first_fifty_chars() {
        let goal = "a".repeat(80);
        assert_eq!(sanitize_project_name(&goal).len(), 50);
    }

    #[test]
    fn test_extract_json_object_with_prefix() {
        let text = r#"Here is the JSON: {"key": "value"}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"key": "value"}"#.to_string()));
    }

    #[test]
    fn test_extract_json_object_with_suffix() {
        let text = r#"{"key": "value"} and some more text"#;
        assert_eq!(extract_json_object(text), Some(r#"{"key": "value"}"#.to_string()));
    }

    #[test]
    fn test_extract_json_object_nested() {
        let text = r#"{"outer": {"inner": "value"}}"#;
        assert_eq!(extract_json_object(text), Some(r#"{"outer": {"inner": "value"}}"#.to_string()));
    }

    #[test]
    fn test_extract_json_object_ignores_braces_in_strings() {
        let text = r#"{"tree": "src/{a,b}.rs", "n": 1} trailing }"#;
        assert_eq!(
            extract_json_object(text),
            Some(r#"{"tree": "src/{a,b}.rs", "n": 1}"#.to_string())
        );
    }

    #[test]
    fn test_extract_json_object_unclosed() {
        assert_eq!(extract_json_object(r#"{"key": "value""#), None);
        assert_eq!(extract_json_object("No JSON here"), None);
    }

    #[test]
    fn test_parse_json_object_strips_fences() {
        let text = "```json\n{\"language\": \"python\"}\n```";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["language"], "python");
    }

    #[test]
    fn test_parse_json_object_from_chatty_response() {
        let text = "Sure! Here you go:\n{\"commands\": [\"npm install\"]}\nGood luck.";
        let map = parse_json_object(text).unwrap();
        assert_eq!(map["commands"][0], "npm install");
    }

    #[test]
    fn test_parse_json_object_rejects_arrays_and_garbage() {
        assert!(parse_json_object("[1, 2, 3]").is_none());
        assert!(parse_json_object("not json at all").is_none());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdef", 3), "abc\n... (truncated)");
    }
}
