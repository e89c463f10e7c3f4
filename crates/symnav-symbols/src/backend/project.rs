//! File-system backed project.

use crate::collab::{Project, Snippet};
use crate::error::{SymbolError, SymbolResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A project rooted at a directory on disk.
#[derive(Debug, Clone)]
pub struct FsProject {
    root: PathBuf,
}

impl FsProject {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub(crate) async fn read_file(&self, relative_path: &str) -> SymbolResult<String> {
        read_project_file(&self.root, relative_path).await
    }
}

/// Read a project file, mapping a missing file to [`SymbolError::NotFound`].
pub(crate) async fn read_project_file(root: &Path, relative_path: &str) -> SymbolResult<String> {
    match tokio::fs::read_to_string(root.join(relative_path)).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(SymbolError::not_found(
            format!("File {relative_path} does not exist in the project."),
        )),
        Err(e) => Err(e.into()),
    }
}

#[async_trait]
impl Project for FsProject {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn retrieve_content_around_line(
        &self,
        relative_path: &str,
        line: u32,
        context_lines_before: usize,
        context_lines_after: usize,
    ) -> SymbolResult<Snippet> {
        let content = self.read_file(relative_path).await?;
        Ok(Snippet::around(
            &content,
            line as usize,
            context_lines_before,
            context_lines_after,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_retrieve_content_around_line() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "a\nb\nc\nd\ne\n").unwrap();

        let project = FsProject::new(dir.path());
        let snippet = project
            .retrieve_content_around_line("src/lib.rs", 2, 1, 1)
            .await
            .unwrap();
        assert_eq!(snippet.to_display_string(), " 2|b\n>3|c\n 4|d");
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let project = FsProject::new(dir.path());
        let err = project
            .retrieve_content_around_line("nope.rs", 0, 1, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, SymbolError::NotFound(_)));
    }
}
