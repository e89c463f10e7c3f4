//! Location entries for definition and reference answers.

use crate::collab::Project;
use crate::format::format_range;
use lsp_types::Range;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Lines of context shown on each side of a location.
pub const ENTRY_CONTEXT_LINES: usize = 2;

/// A location as returned by a language server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawLocation {
    pub uri: String,
    pub absolute_path: Option<PathBuf>,
    pub relative_path: Option<String>,
    pub range: Option<Range>,
}

/// A location prepared for output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocationEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    /// Set only when the location could not be placed in the project.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
}

/// Project-relative, `/`-separated form of `path`; `None` outside `root`.
pub fn relative_path_string(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn resolve_relative_path(raw: &RawLocation, root: &Path) -> Option<String> {
    raw.relative_path
        .clone()
        .filter(|p| !p.is_empty())
        .or_else(|| {
            raw.absolute_path
                .as_deref()
                .and_then(|abs| relative_path_string(abs, root))
        })
}

/// Turn raw locations into entries with formatted ranges and snippets.
///
/// Snippet failures leave the snippet out. Entries that resolve to neither a
/// relative path nor a URI are dropped.
pub async fn build_entries(raw: Vec<RawLocation>, project: &dyn Project) -> Vec<LocationEntry> {
    let mut entries = Vec::with_capacity(raw.len());
    for location in raw {
        let relative_path = resolve_relative_path(&location, project.root());
        let range = location.range.as_ref().map(format_range);

        let snippet = match (&relative_path, &location.range) {
            (Some(path), Some(r)) => match project
                .retrieve_content_around_line(
                    path,
                    r.start.line,
                    ENTRY_CONTEXT_LINES,
                    ENTRY_CONTEXT_LINES,
                )
                .await
            {
                Ok(snippet) => Some(snippet.to_display_string()),
                Err(e) => {
                    warn!(path = %path, line = r.start.line, error = %e, "Could not read snippet");
                    None
                }
            },
            _ => None,
        };

        let uri = if relative_path.is_none() && !location.uri.is_empty() {
            Some(location.uri)
        } else {
            None
        };

        if relative_path.is_none() && uri.is_none() {
            warn!(?range, "Dropping location without path or uri");
            continue;
        }

        entries.push(LocationEntry {
            relative_path,
            range,
            snippet,
            uri,
        });
    }
    entries
}
