//! Prompt construction for file reviews and pull-request summaries.
//!
//! The file prompt numbers every flattened diff line with its 1-based
//! position; that number is what the model reports back as `lineNumber`.

use crate::models::pull_request::PullRequest;

/// System prompt for per-file reviews.
pub const REVIEW_SYSTEM_PROMPT: &str = "You are an expert code reviewer. \
You review one file of a pull request at a time and reply with JSON only.";

/// System prompt for pull-request summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert code reviewer. \
You write concise, high-signal pull request overviews in Markdown.";

/// Build the user prompt for reviewing one file.
pub fn build_file_prompt(path: &str, flat_lines: &[String], pr: &PullRequest) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "## Instructions\n\n\
        Review the unified diff for file `{path}` below.\n\n\
        Reply strictly with this JSON shape:\n\
        {{\"reviews\": [{{\"lineNumber\": <diff line number>, \"lineText\": \"<exact line>\", \"reviewComment\": \"<comment>\"}}]}}\n\n\
        - `lineNumber` is the number printed before each diff line (1-based, counting \
        context, added and removed lines). Do not use file line numbers.\n\
        - `lineText` is the exact text of that line, copied from the diff, so the \
        comment can be anchored even if the number is off.\n\
        - Only comment on added or unchanged lines; removed lines cannot carry comments.\n\
        - Structure each `reviewComment` as:\n\
        \x20 [<Potential issue|Refactor|Nitpick>] [<Critical|Major|Minor|Trivial|Info>] <one-sentence title>\n\
        \x20 Why:\n\
        \x20   - <reasoning or risk>\n\
        \x20 How (step-by-step):\n\
        \x20   - <precise steps>\n\
        \x20 Suggested change (Before/After):\n\
        \x20   <minimal before and after snippets in fenced code blocks>\n\
        - Focus on bugs, logic errors, security (especially committed secrets and \
        reversible encodings such as base64), performance and maintainability.\n\
        - Do NOT suggest adding code comments or a trailing newline.\n\
        - Check whether the change matches the pull request title and description.\n\
        - Never reply with shell commands.\n\
        - If nothing needs improving, return {{\"reviews\": []}}.\n\n"
    ));

    push_pr_context(&mut prompt, pr);

    prompt.push_str(&format!("## Diff for: {path}\n\n```diff\n"));
    let width = flat_lines.len().to_string().len();
    for (i, line) in flat_lines.iter().enumerate() {
        prompt.push_str(&format!("{:>width$} | {line}\n", i + 1));
    }
    prompt.push_str("```\n");

    prompt
}

/// Build the user prompt asking for a sectioned pull-request summary.
pub fn build_summary_prompt(pr: &PullRequest, diff: &str) -> String {
    let mut prompt = String::from(
        "## Instructions\n\n\
        Produce a pull request overview in Markdown with these sections, in order:\n\n\
        ## Summary\n\
        A grouped bullet list. Each section header is a standalone bold line \
        followed by a blank line, then hyphen bullets:\n\n\
        **New Features**\n\n\
        - <Item starting with a verb, ending with a period.>\n\n\
        Allowed headers, in this order: **New Features**, **Bug Fixes**, \
        **Documentation**, **Refactor**, **Performance**, **Tests**, **Chores**. \
        Omit empty sections. 2-6 items per section, each at most 140 characters.\n\n\
        ## Walkthrough\n\
        One short paragraph (3-6 sentences) on the intent of the change and the \
        main areas touched.\n\n\
        ## Changes\n\
        A two-column table: File(s) | Change Summary. Group related files.\n\n\
        Be concise. No shell commands. Output valid Markdown only.\n\n",
    );

    push_pr_context(&mut prompt, pr);

    prompt.push_str(&format!("## Unified Diff\n\n```diff\n{}\n```\n", diff.trim_end()));
    prompt
}

fn push_pr_context(prompt: &mut String, pr: &PullRequest) {
    prompt.push_str(&format!("## Pull Request\n\nTitle: {}\n\n", pr.title));
    if !pr.description.trim().is_empty() {
        prompt.push_str(&format!("Description:\n---\n{}\n---\n\n", pr.description.trim()));
    }
}
