//! Markdown clean-up for bodies produced by the model.
//!
//! Models routinely flatten structured text onto one line. Bitbucket renders
//! Markdown strictly, so headings and bullets are put back on their own
//! lines before posting.

use regex::Regex;

/// Headings of a structured review comment.
const REVIEW_HEADINGS: &[&str] = &[
    "Why:",
    "How (step-by-step):",
    "Suggested change (Before/After):",
    "Notes:",
];

/// Section names of a pull-request summary, in display order.
const SUMMARY_SECTIONS: &[&str] = &[
    "New Features",
    "Bug Fixes",
    "Documentation",
    "Refactor",
    "Performance",
    "Tests",
    "Chores",
];

static REVIEW_HEADING_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    let alternation = REVIEW_HEADINGS
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"[ \t]*({alternation})")).unwrap()
});

/// A bold section header preceded by other text on the same line.
static INLINE_SECTION_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    let alternation = SUMMARY_SECTIONS
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"([^\n])[ \t]*(\*\*(?:{alternation})\*\*)")).unwrap()
});

static BLANK_RUN_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").unwrap());

/// Put review headings on their own paragraphs.
pub fn format_review_body(body: &str) -> String {
    let body = body.replace("\r\n", "\n");
    if body.trim().is_empty() {
        return String::new();
    }
    let spaced = REVIEW_HEADING_RE.replace_all(&body, "\n\n$1");
    let collapsed = BLANK_RUN_RE.replace_all(&spaced, "\n\n");
    collapsed.trim_start_matches(['\n', ' ', '\t']).trim_end().to_string()
}

/// Normalize a summary: one header per line, one bullet per line.
pub fn format_summary_body(body: &str) -> String {
    let body = body.replace("\r\n", "\n");
    if body.trim().is_empty() {
        return String::new();
    }
    let body = INLINE_SECTION_RE.replace_all(&body, "$1\n$2");

    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;
    for line in body.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            lines.push(line.to_string());
            continue;
        }
        if in_fence {
            lines.push(line.to_string());
            continue;
        }

        match split_section_header(line) {
            Some((section, rest)) => {
                lines.push(String::new());
                lines.push(format!("**{section}**"));
                lines.push(String::new());
                if !rest.is_empty() {
                    lines.push(split_bullets(rest));
                }
            }
            None if line.trim_start().starts_with('|') => lines.push(line.to_string()),
            None => lines.push(split_bullets(line)),
        }
    }

    let joined = lines.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

/// Recognize `**Section**`, `Section:` or `Section - item` at line start.
///
/// Returns the section name and whatever followed it on the line.
fn split_section_header(line: &str) -> Option<(&'static str, &str)> {
    let trimmed = line.trim_start();
    for section in SUMMARY_SECTIONS {
        let bold = format!("**{section}**");
        if let Some(rest) = trimmed.strip_prefix(bold.as_str()) {
            return Some((section, rest.trim_start_matches(':').trim()));
        }
        if let Some(rest) = trimmed.strip_prefix(section) {
            let rest = rest.trim_start();
            if rest.is_empty() {
                return Some((section, rest));
            }
            if let Some(after_colon) = rest.strip_prefix(':') {
                return Some((section, after_colon.trim()));
            }
            if rest.starts_with("- ") {
                return Some((section, rest));
            }
        }
    }
    None
}

fn split_bullets(text: &str) -> String {
    text.replace(" - ", "\n- ")
}
