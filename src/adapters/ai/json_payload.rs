//! Pulls a JSON object out of model output.
//!
//! Models asked for JSON still wrap it in prose or code fences now and
//! then. Tried in order: the whole text, the first fenced block, the first
//! balanced `{...}` span.

use serde::de::DeserializeOwned;
use serde_json::Value;

pub fn extract_json_object(text: &str) -> Option<Value> {
    let text = text.trim();
    parse_object(text)
        .or_else(|| fenced_block(text).and_then(parse_object))
        .or_else(|| balanced_object(text).and_then(parse_object))
}

/// Extracts and deserializes the payload.
pub fn parse_payload<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let value = extract_json_object(text).ok_or_else(|| "no JSON object in response".to_string())?;
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate.trim())
        .ok()
        .filter(Value::is_object)
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip the language tag line.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}
