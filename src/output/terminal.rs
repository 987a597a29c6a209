//! Terminal renderer: styled flowing text, no tables.

use colored::Colorize;

use crate::models::LineMapping;
use crate::orchestrator::{PullRequestOutcome, PullRequestReport, RepositoryReport};
use crate::output::{FileMap, OutputRenderer, ResolveReport};

/// Terminal output renderer with colored, flowing text.
pub struct TerminalRenderer;

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

fn side(line: i64) -> String {
    if line > 0 {
        line.to_string()
    } else {
        "-".to_string()
    }
}

fn render_pull_request(output: &mut String, pr: &PullRequestReport) {
    let marker = match pr.outcome {
        PullRequestOutcome::Reviewed => "✔".green().bold(),
        PullRequestOutcome::Failed(_) => "✖".red().bold(),
        _ => "·".dimmed(),
    };
    output.push_str(&format!(
        "   {} #{} {} {}\n",
        marker,
        pr.id,
        pr.title.bold(),
        format!("({})", pr.outcome.label()).dimmed()
    ));

    if let PullRequestOutcome::Failed(ref reason) = pr.outcome {
        output.push_str(&format!("     {} {}\n", "→".red(), reason));
        return;
    }
    if pr.outcome != PullRequestOutcome::Reviewed {
        return;
    }

    if pr.summary_posted {
        output.push_str(&format!("     {} summary posted\n", "→".cyan()));
    }
    for (path, file) in &pr.files {
        match file.error {
            Some(ref err) => output.push_str(&format!(
                "     {} {}\n",
                path,
                format!("error: {err}").yellow()
            )),
            None => output.push_str(&format!(
                "     {} {} resolved, {} discarded\n",
                path,
                file.resolved,
                file.discarded.total()
            )),
        }
    }
    output.push_str(&format!(
        "     {} {}, {}",
        "→".cyan(),
        plural(pr.posted, "comment posted", "comments posted"),
        plural(pr.gate.total(), "skipped", "skipped")
    ));
    if pr.failed_posts > 0 {
        output.push_str(&format!(
            ", {}",
            plural(pr.failed_posts, "failed", "failed").red()
        ));
    }
    output.push('\n');
}

impl OutputRenderer for TerminalRenderer {
    fn render_run(&self, reports: &[RepositoryReport]) -> String {
        if reports.is_empty() {
            return format!("{}", "  No repositories configured.\n".yellow());
        }

        let mut output = String::new();
        for repo in reports {
            output.push_str(&format!(" {}\n", repo.name.bold()));
            if repo.pull_requests.is_empty() {
                output.push_str(&format!("   {}\n", "no open pull requests".dimmed()));
            }
            for pr in &repo.pull_requests {
                render_pull_request(&mut output, pr);
            }
            output.push('\n');
        }

        let posted: usize = reports.iter().map(|r| r.total_posted()).sum();
        let failed: usize = reports.iter().map(|r| r.total_failed_posts()).sum();
        let prs: usize = reports.iter().map(|r| r.pull_requests.len()).sum();
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} across {}, {} posted, {} failed\n",
            plural(prs, "pull request", "pull requests").bold(),
            plural(reports.len(), "repository", "repositories"),
            posted.to_string().green().bold(),
            failed.to_string().red().bold(),
        ));
        output
    }

    fn render_map(&self, files: &[FileMap]) -> String {
        if files.is_empty() {
            return format!("{}", "  No files in diff.\n".yellow());
        }

        let mut output = String::new();
        for file in files {
            let path = if file.path.is_empty() {
                "(deleted file)".to_string()
            } else {
                file.path.clone()
            };
            output.push_str(&format!(" {}\n", path.bold()));
            let width = file.index.len().to_string().len();
            for (i, (text, m)) in file.index.flat_lines.iter().zip(&file.index.mapping).enumerate() {
                let LineMapping { from_line, to_line } = *m;
                let nums = format!("{:>5} {:>5}", side(from_line), side(to_line)).dimmed();
                let text = match text.as_bytes().first() {
                    Some(b'+') => text.green(),
                    Some(b'-') => text.red(),
                    _ => text.normal(),
                };
                output.push_str(&format!(" {:>width$} {} │ {}\n", i + 1, nums, text));
            }
            output.push('\n');
        }
        output
    }

    fn render_resolve(&self, report: &ResolveReport) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            " {} {}\n",
            report.path.bold(),
            format!("({})", plural(report.feedback, "feedback item", "feedback items")).dimmed()
        ));

        if report.accepted.is_empty() {
            output.push_str(&format!("   {}\n", "no comments would be posted".dimmed()));
        }
        for c in &report.accepted {
            let first = c.body.lines().next().unwrap_or_default();
            output.push_str(&format!(
                "   {} {} {}\n",
                "✔".green().bold(),
                format!("{}:{}", c.path, c.position).bold(),
                first
            ));
        }

        let d = &report.discarded;
        let s = &report.skipped;
        output.push_str(&format!("{}\n", "───────────────────────────────────".dimmed()));
        output.push_str(&format!(
            " {} accepted; discarded: {} out of range, {} deleted line, {} missing location; \
             skipped: {} empty, {} command-like, {} duplicate, {} over cap\n",
            report.accepted.len().to_string().green().bold(),
            d.out_of_range,
            d.deleted_line,
            d.missing_location,
            s.empty_body,
            s.command_like,
            s.duplicate,
            s.cap_reached,
        ));
        output
    }
}
