//! Test fixtures for creating reproducible test environments.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory, removed when dropped.
///
/// # Example
///
/// ```rust
/// use symnav_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_file("src/lib.rs", "pub fn answer() -> u32 { 42 }\n")
///     .with_dir("docs")
///     .build();
///
/// assert!(project.path().join("src/lib.rs").exists());
/// assert!(project.path().join("docs").is_dir());
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    files: Vec<(PathBuf, String)>,
    dirs: Vec<PathBuf>,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a file; parent directories are created on build.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files
            .push((path.as_ref().to_path_buf(), contents.into()));
        self
    }

    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// A small Python package with a class and a caller.
    pub fn with_python_sample(self) -> Self {
        self.with_file(
            "pkg/shapes.py",
            "class Circle:\n    def __init__(self, r):\n        self.r = r\n\n    def area(self):\n        return 3.14 * self.r * self.r\n",
        )
        .with_file(
            "pkg/main.py",
            "from pkg.shapes import Circle\n\ndef main():\n    c = Circle(2)\n    print(c.area())\n",
        )
    }

    /// Write everything to disk.
    pub fn build(self) -> BuiltProject {
        let root = self.temp_dir.path();
        for dir in &self.dirs {
            fs::create_dir_all(root.join(dir)).expect("Failed to create directory");
        }
        for (path, contents) in &self.files {
            let full = root.join(path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).expect("Failed to create parent directory");
            }
            fs::write(&full, contents).expect("Failed to write file");
        }
        BuiltProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A project written to disk.
pub struct BuiltProject {
    temp_dir: TempDir,
}

impl BuiltProject {
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn read(&self, relative_path: &str) -> String {
        fs::read_to_string(self.path().join(relative_path)).expect("Failed to read file")
    }
}
