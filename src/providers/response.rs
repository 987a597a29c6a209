//! Parsing of raw model output.
//!
//! Models wrap JSON in fences, prefix it with prose, or emit literal tabs and
//! newlines inside string values. Each of those is tolerated here so the
//! provider backends only deal with transport.

use serde::Deserialize;

use super::ProviderError;
use crate::models::comment::AiFeedback;

/// Maximum length of model output to include in parse error messages.
const PARSE_ERROR_PREVIEW_LEN: usize = 500;

/// One entry of the `reviews` array.
#[derive(Debug, Deserialize)]
struct ReviewEntry {
    #[serde(rename = "lineNumber", default)]
    line_number: i64,
    #[serde(rename = "reviewComment", default)]
    review_comment: String,
    #[serde(rename = "lineText", default)]
    line_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReviewEnvelope {
    #[serde(default)]
    reviews: Vec<ReviewEntry>,
}

impl From<ReviewEntry> for AiFeedback {
    fn from(entry: ReviewEntry) -> Self {
        let anchor_text = entry
            .line_text
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        AiFeedback {
            position: entry.line_number,
            body: entry.review_comment,
            anchor_text,
        }
    }
}

/// Parse a file-review response into feedback items, in model order.
pub fn parse_review_response(response: &str) -> Result<Vec<AiFeedback>, ProviderError> {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    for candidate in extract_json_candidates(trimmed) {
        let sanitized = escape_control_chars(&candidate);
        if let Ok(envelope) = serde_json::from_str::<ReviewEnvelope>(&sanitized) {
            return Ok(envelope.reviews.into_iter().map(AiFeedback::from).collect());
        }
        if let Ok(entries) = serde_json::from_str::<Vec<ReviewEntry>>(&sanitized) {
            return Ok(entries.into_iter().map(AiFeedback::from).collect());
        }
    }

    Err(ProviderError::ParseError(format!(
        "could not parse review JSON. Response: {}",
        preview(trimmed)
    )))
}

/// Clean up a summary response: strip an enclosing code fence and trim.
pub fn parse_summary_response(response: &str) -> String {
    let mut text = response.trim();
    for opener in ["```markdown", "```md", "```json", "```"] {
        if let Some(rest) = text.strip_prefix(opener) {
            text = rest;
            break;
        }
    }
    text = text.strip_suffix("```").unwrap_or(text);
    text.trim().to_string()
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(PARSE_ERROR_PREVIEW_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Regex for extracting content inside markdown code fences.
///
/// The closing ``` must start a line so fences inside JSON string values
/// (suggested code in a review comment) are not mistaken for the end.
static FENCE_RE: std::sync::LazyLock<regex::Regex> =
    std::sync::LazyLock::new(|| regex::Regex::new(r"(?s)```(?:json)?\s*\n(.*?)\n```").unwrap());

/// Candidate JSON strings, most literal first.
fn extract_json_candidates(text: &str) -> Vec<String> {
    let mut candidates = vec![text.to_string()];

    for cap in FENCE_RE.captures_iter(text) {
        if let Some(inner) = cap.get(1) {
            let inner = inner.as_str().trim();
            if !inner.is_empty() {
                candidates.push(inner.to_string());
            }
        }
    }

    // Prose around the payload: slice the outermost object, then array.
    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (text.find(open), text.rfind(close)) {
            if start < end {
                candidates.push(text[start..=end].to_string());
            }
        }
    }

    candidates
}

/// Escape raw control characters that appear inside JSON string literals.
///
/// Characters outside strings are left alone so structural whitespace
/// survives.
pub fn escape_control_chars(json: &str) -> String {
    let mut out = String::with_capacity(json.len() + 16);
    let mut in_string = false;
    let mut backslashes = 0usize;

    for ch in json.chars() {
        match ch {
            '\\' => {
                backslashes += 1;
                out.push(ch);
                continue;
            }
            '"' => {
                if backslashes % 2 == 0 {
                    in_string = !in_string;
                }
                out.push(ch);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => out.push_str("\\r"),
            '\t' if in_string => out.push_str("\\t"),
            c if in_string && (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
        backslashes = 0;
    }

    out
}
