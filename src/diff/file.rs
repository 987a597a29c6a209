//! Diff input for the offline commands (`map`, `resolve`).

use std::path::Path;

use tokio::io::AsyncReadExt;

use super::DiffError;
use super::parser::parse_unified_diff;
use crate::models::diff::FileDiff;

/// Path argument that means "read standard input".
pub const STDIN_PATH: &str = "-";

/// Read a unified diff from `source`, or from stdin when it is `-`.
pub async fn read_diff_source(source: &Path) -> Result<String, DiffError> {
    if source == Path::new(STDIN_PATH) {
        let mut text = String::new();
        tokio::io::stdin().read_to_string(&mut text).await?;
        return Ok(text);
    }
    if !source.is_file() {
        return Err(DiffError::PathNotFound(source.display().to_string()));
    }
    Ok(tokio::fs::read_to_string(source).await?)
}

/// Read and parse a diff into its files.
pub async fn load_diff(source: &Path) -> Result<Vec<FileDiff>, DiffError> {
    let text = read_diff_source(source).await?;
    let files = parse_unified_diff(&text);
    tracing::debug!(source = %source.display(), files = files.len(), "loaded diff");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn load_parses_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pr.diff");
        std::fs::write(
            &path,
            "diff --git a/a.rs b/a.rs\n+++ b/a.rs\n@@ -1 +1 @@\n-x\n+y\n\
             diff --git a/b.rs b/b.rs\n+++ b/b.rs\n@@ -3 +3,2 @@\n z\n+w\n",
        )
        .unwrap();

        let files = load_diff(&path).await.unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, ["a.rs", "b.rs"]);
        assert_eq!(files[1].hunks[0].dest_start, 3);
    }

    #[tokio::test]
    async fn missing_file_and_directories_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = load_diff(&dir.path().join("absent.diff")).await;
        assert!(matches!(missing, Err(DiffError::PathNotFound(_))));

        let directory = read_diff_source(dir.path()).await;
        assert!(matches!(directory, Err(DiffError::PathNotFound(_))));
    }
}
