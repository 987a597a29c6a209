//! JSON output renderer.
//!
//! `run` prints `{"repositories": [...], "summary": {...}}`, `map` prints
//! `{"files": [...]}` and `resolve` prints the report object as is.

use crate::orchestrator::RepositoryReport;
use crate::output::{FileMap, OutputRenderer, ResolveReport};

/// JSON output renderer.
pub struct JsonRenderer;

fn to_pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

impl OutputRenderer for JsonRenderer {
    fn render_run(&self, reports: &[RepositoryReport]) -> String {
        let pull_requests: usize = reports.iter().map(|r| r.pull_requests.len()).sum();
        let posted: usize = reports.iter().map(|r| r.total_posted()).sum();
        let failed_posts: usize = reports.iter().map(|r| r.total_failed_posts()).sum();

        to_pretty(&serde_json::json!({
            "repositories": reports,
            "summary": {
                "repositories": reports.len(),
                "pull_requests": pull_requests,
                "posted": posted,
                "failed_posts": failed_posts,
            },
        }))
    }

    fn render_map(&self, files: &[FileMap]) -> String {
        let files: Vec<_> = files
            .iter()
            .map(|f| {
                let lines: Vec<_> = f
                    .index
                    .flat_lines
                    .iter()
                    .zip(&f.index.mapping)
                    .enumerate()
                    .map(|(i, (text, m))| {
                        serde_json::json!({
                            "position": i + 1,
                            "from_line": m.from_line,
                            "to_line": m.to_line,
                            "text": text,
                        })
                    })
                    .collect();
                serde_json::json!({ "path": f.path, "lines": lines })
            })
            .collect();
        to_pretty(&serde_json::json!({ "files": files }))
    }

    fn render_resolve(&self, report: &ResolveReport) -> String {
        to_pretty(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{build_index, parse_unified_diff};
    use crate::orchestrator::{PullRequestOutcome, PullRequestReport};

    #[test]
    fn render_run_summary() {
        let mut pr = PullRequestReport::new(7, "Add cache", PullRequestOutcome::Reviewed);
        pr.posted = 3;
        pr.failed_posts = 1;
        let reports = vec![RepositoryReport {
            name: "acme/api".into(),
            pull_requests: vec![pr],
        }];

        let parsed: serde_json::Value =
            serde_json::from_str(&JsonRenderer.render_run(&reports)).unwrap();
        assert_eq!(parsed["summary"]["posted"], 3);
        assert_eq!(parsed["summary"]["failed_posts"], 1);
        assert_eq!(
            parsed["repositories"][0]["pull_requests"][0]["outcome"]["status"],
            "reviewed"
        );
    }

    #[test]
    fn render_map_positions() {
        let diff = "diff --git a/a.rs b/a.rs\n+++ b/a.rs\n@@ -1,2 +1,2 @@\n-old\n+new\n ctx\n";
        let files: Vec<_> = parse_unified_diff(diff)
            .into_iter()
            .map(|f| FileMap {
                index: build_index(&f.hunks),
                path: f.path,
            })
            .collect();

        let parsed: serde_json::Value =
            serde_json::from_str(&JsonRenderer.render_map(&files)).unwrap();
        let lines = parsed["files"][0]["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["position"], 1);
        assert_eq!(lines[0]["to_line"], -1);
        assert_eq!(lines[1]["from_line"], -1);
        assert_eq!(lines[2]["to_line"], 2);
    }
}
