//! Comment types flowing in and out of the review core.

use serde::{Deserialize, Serialize};

/// A comment already present on a pull request, as reported by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawComment {
    pub body: String,
    /// Whether the comment is attached to a file line.
    #[serde(default)]
    pub is_inline: bool,
    #[serde(default)]
    pub path: Option<String>,
    /// Destination-side line the comment is attached to.
    #[serde(default)]
    pub to_line: Option<i64>,
    #[serde(default)]
    pub author_id: String,
}

impl RawComment {
    /// A pull-request level comment.
    pub fn general(body: impl Into<String>, author_id: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            author_id: author_id.into(),
            ..Self::default()
        }
    }

    /// A comment attached to `path:to_line`.
    pub fn inline(
        body: impl Into<String>,
        path: impl Into<String>,
        to_line: i64,
        author_id: impl Into<String>,
    ) -> Self {
        Self {
            body: body.into(),
            is_inline: true,
            path: Some(path.into()),
            to_line: Some(to_line),
            author_id: author_id.into(),
        }
    }
}

/// One feedback item returned by the AI for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiFeedback {
    /// 1-based index into the flattened diff lines shown to the model.
    pub position: i64,
    pub body: String,
    /// Verbatim snippet of the line the model meant.
    #[serde(default)]
    pub anchor_text: Option<String>,
}

/// A resolved comment placed on a concrete destination line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub path: String,
    /// Destination file line number (always ≥ 1).
    pub position: i64,
    pub body: String,
    /// Source file line, or `-1` for added lines.
    pub from_line: i64,
}

impl Candidate {
    /// Dedup key shared with [`crate::state::ReviewState::existing_inline_keys`].
    pub fn key(&self) -> String {
        location_key(&self.path, self.position)
    }
}

/// Build the `path:line` key used to detect already-commented locations.
pub fn location_key(path: &str, line: i64) -> String {
    format!("{path}:{line}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_key_format() {
        let c = Candidate {
            path: "src/lib.rs".into(),
            position: 12,
            body: "b".into(),
            from_line: -1,
        };
        assert_eq!(c.key(), "src/lib.rs:12");
    }

    #[test]
    fn raw_comment_deserializes_with_defaults() {
        let c: RawComment = serde_json::from_str(r#"{"body": "LGTM"}"#).unwrap();
        assert!(!c.is_inline);
        assert!(c.path.is_none());
        assert!(c.author_id.is_empty());
    }
}
