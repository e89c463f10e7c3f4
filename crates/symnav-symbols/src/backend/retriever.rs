//! Symbol retrieval through document symbol requests.

use super::project::read_project_file;
use super::text;
use crate::collab::SymbolRetriever;
use crate::entry::relative_path_string;
use crate::error::{SymbolError, SymbolResult};
use crate::name_path::{KindFilter, NamePathPattern, SymbolQuery};
use crate::symbol::{
    assign_overload_indices, smallest_enclosing, ReferenceInSymbol, Symbol, SymbolLocation,
};
use async_trait::async_trait;
use lsp_types::{Location, Position};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use symnav_lsp::{uri_to_path, DocumentSymbolInfo, LspClient};
use tracing::{debug, warn};

/// Load the symbol tree of one file, with overload indices assigned.
pub(crate) async fn load_file_symbols(
    client: &LspClient,
    relative_path: &str,
    include_body: bool,
) -> SymbolResult<Vec<Symbol>> {
    let root = client.project_root();
    let infos = client.document_symbols(&root.join(relative_path)).await?;
    let source = if include_body {
        Some(read_project_file(root, relative_path).await?)
    } else {
        None
    };
    let mut symbols = convert(infos, &[], relative_path, source.as_deref());
    assign_overload_indices(&mut symbols);
    Ok(symbols)
}

fn convert(
    infos: Vec<DocumentSymbolInfo>,
    parent: &[String],
    relative_path: &str,
    source: Option<&str>,
) -> Vec<Symbol> {
    infos
        .into_iter()
        .map(|info| {
            let mut name_path = parent.to_vec();
            name_path.push(info.name.clone());
            let children = convert(info.children, &name_path, relative_path, source);
            Symbol {
                name: info.name,
                kind: info.kind.into(),
                range: Some(info.range),
                selection_range: Some(info.selection_range),
                location: SymbolLocation {
                    relative_path: Some(relative_path.to_string()),
                    range: Some(info.selection_range),
                },
                body: source.map(|s| text::slice(s, &info.range).to_string()),
                overload_idx: None,
                children,
                name_path,
            }
        })
        .collect()
}

/// The one symbol `pattern` selects in a file.
pub(crate) fn find_unique<'a>(
    symbols: &'a [Symbol],
    pattern: &NamePathPattern,
    relative_path: &str,
) -> SymbolResult<&'a Symbol> {
    let query = SymbolQuery::new(pattern.clone());
    let matches = query.select(symbols);
    match matches.as_slice() {
        [] => Err(SymbolError::not_found(format!(
            "No symbol with name path '{pattern}' found in file {relative_path}"
        ))),
        [single] => Ok(single),
        many => {
            let candidates: Vec<String> = many.iter().map(|s| s.name_path_string()).collect();
            Err(SymbolError::invalid_argument(format!(
                "Name path '{pattern}' is ambiguous in {relative_path}; candidates: {}",
                candidates.join(", ")
            )))
        }
    }
}

/// Project-relative paths of source files under `scope`, in sorted order.
async fn source_files(client: &LspClient, scope: Option<&str>) -> SymbolResult<Vec<String>> {
    let root = client.project_root().to_path_buf();
    let start = match scope {
        Some(scope) => root.join(scope),
        None => root.clone(),
    };

    let found: Vec<PathBuf> = tokio::task::spawn_blocking(move || {
        ignore::WalkBuilder::new(&start)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .collect()
    })
    .await
    .map_err(std::io::Error::other)?;

    let mut files: Vec<String> = found
        .iter()
        .filter(|path| client.handles_file(path))
        .filter_map(|path| relative_path_string(path, &root))
        .collect();
    files.sort();
    Ok(files)
}

/// [`SymbolRetriever`] backed by a language server client.
#[derive(Clone)]
pub struct LspSymbolRetriever {
    client: Arc<LspClient>,
}

impl LspSymbolRetriever {
    pub fn new(client: Arc<LspClient>) -> Self {
        Self { client }
    }

    fn root(&self) -> &Path {
        self.client.project_root()
    }
}

/// Reference locations inside the project, keyed by relative path. The
/// declaration itself (`declaration` in `relative_path`) is dropped.
fn references_in_project(
    locations: Vec<Location>,
    root: &Path,
    relative_path: &str,
    declaration: Position,
) -> Vec<(String, Location)> {
    locations
        .into_iter()
        .filter_map(|location| {
            let Some(ref_path) =
                uri_to_path(&location.uri).and_then(|p| relative_path_string(&p, root))
            else {
                debug!(uri = location.uri.as_str(), "Skipping reference outside the project");
                return None;
            };
            let is_declaration = ref_path == relative_path && location.range.start == declaration;
            (!is_declaration).then_some((ref_path, location))
        })
        .collect()
}

#[async_trait]
impl SymbolRetriever for LspSymbolRetriever {
    async fn get_overview(&self, relative_path: &str) -> SymbolResult<BTreeMap<String, Vec<Symbol>>> {
        let files = if self.root().join(relative_path).is_dir() {
            source_files(&self.client, Some(relative_path)).await?
        } else {
            vec![relative_path.to_string()]
        };

        let mut overview = BTreeMap::new();
        for file in files {
            let symbols = load_file_symbols(&self.client, &file, false).await?;
            overview.insert(file, symbols);
        }
        Ok(overview)
    }

    async fn find_by_name(&self, query: &SymbolQuery) -> SymbolResult<Vec<Symbol>> {
        let scope = query.within_path.as_deref();
        if let Some(scope) = scope {
            if !self.root().join(scope).exists() {
                return Err(SymbolError::not_found(format!(
                    "Path {scope} does not exist in the project."
                )));
            }
        }

        let mut found = Vec::new();
        for file in source_files(&self.client, scope).await? {
            if !query.in_scope(&file) {
                continue;
            }
            let symbols = match load_file_symbols(&self.client, &file, query.include_body).await {
                Ok(symbols) => symbols,
                Err(e @ SymbolError::Unavailable(_)) => return Err(e),
                Err(e) => {
                    warn!(file = %file, error = %e, "Skipping file during symbol search");
                    continue;
                }
            };
            found.extend(query.select(&symbols).into_iter().cloned());
        }
        Ok(found)
    }

    async fn find_referencing_symbols(
        &self,
        name_path: &NamePathPattern,
        relative_path: &str,
        include_body: bool,
        kinds: &KindFilter,
    ) -> SymbolResult<Vec<ReferenceInSymbol>> {
        let symbols = load_file_symbols(&self.client, relative_path, false).await?;
        let target = find_unique(&symbols, name_path, relative_path)?;
        let Some(position) = target.identifier_position() else {
            return Err(SymbolError::invariant(format!(
                "Symbol {} has no position",
                target.name_path_string()
            )));
        };

        let locations = self
            .client
            .find_references(
                &self.root().join(relative_path),
                position.line,
                position.character,
                false,
            )
            .await?;
        debug!(symbol = %name_path, count = locations.len(), "References");

        let mut trees: HashMap<String, Vec<Symbol>> = HashMap::new();
        let mut out = Vec::new();
        for (ref_path, location) in
            references_in_project(locations, self.root(), relative_path, position)
        {
            if !trees.contains_key(&ref_path) {
                let tree = load_file_symbols(&self.client, &ref_path, include_body).await?;
                trees.insert(ref_path.clone(), tree);
            }
            let Some(tree) = trees.get(&ref_path) else {
                continue;
            };
            let Some(containing) = smallest_enclosing(tree, location.range.start) else {
                continue;
            };
            if !kinds.accepts(containing.kind) {
                continue;
            }
            out.push(ReferenceInSymbol {
                symbol: containing.clone(),
                line: location.range.start.line,
                character: location.range.start.character,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::SymbolKind;
    use lsp_types::{Position, Range};

    fn info(name: &str, kind: lsp_types::SymbolKind, lines: (u32, u32)) -> DocumentSymbolInfo {
        let range = Range::new(Position::new(lines.0, 0), Position::new(lines.1, 1));
        DocumentSymbolInfo {
            name: name.to_string(),
            kind,
            range,
            selection_range: Range::new(Position::new(lines.0, 3), Position::new(lines.0, 4)),
            children: Vec::new(),
        }
    }

    #[test]
    fn test_convert_builds_name_paths_and_bodies() {
        let source = "impl A {\n  fn f() {}\n}\n";
        let mut outer = info("A", lsp_types::SymbolKind::CLASS, (0, 2));
        outer.children = vec![info("f", lsp_types::SymbolKind::METHOD, (1, 1))];

        let symbols = convert(vec![outer], &[], "src/a.rs", Some(source));
        assert_eq!(symbols[0].name_path, vec!["A".to_string()]);
        assert_eq!(symbols[0].kind.known(), Some(SymbolKind::Class));
        assert_eq!(
            symbols[0].children[0].name_path,
            vec!["A".to_string(), "f".to_string()]
        );
        assert_eq!(symbols[0].relative_path(), Some("src/a.rs"));
        assert_eq!(symbols[0].body.as_deref(), Some("impl A {\n  fn f() {}\n}"));
    }

    #[test]
    fn test_find_unique() {
        let mut symbols = convert(
            vec![
                info("f", lsp_types::SymbolKind::FUNCTION, (0, 0)),
                info("f", lsp_types::SymbolKind::FUNCTION, (2, 2)),
                info("g", lsp_types::SymbolKind::FUNCTION, (4, 4)),
            ],
            &[],
            "a.rs",
            None,
        );
        assign_overload_indices(&mut symbols);

        let g = NamePathPattern::parse("g").unwrap();
        assert_eq!(find_unique(&symbols, &g, "a.rs").unwrap().name, "g");

        let f1 = NamePathPattern::parse("f[1]").unwrap();
        let found = find_unique(&symbols, &f1, "a.rs").unwrap();
        assert_eq!(found.range.unwrap().start.line, 2);

        let f = NamePathPattern::parse("f").unwrap();
        assert!(matches!(
            find_unique(&symbols, &f, "a.rs"),
            Err(SymbolError::InvalidArgument(_))
        ));

        let missing = NamePathPattern::parse("h").unwrap();
        assert!(matches!(
            find_unique(&symbols, &missing, "a.rs"),
            Err(SymbolError::NotFound(_))
        ));
    }

    #[test]
    fn test_references_skip_declaration_and_outside_files() {
        let root = std::env::temp_dir().join("refs-project");
        let at = |path: PathBuf, line: u32, character: u32| {
            let start = Position::new(line, character);
            Location::new(
                symnav_lsp::path_to_uri(&path).unwrap(),
                Range::new(start, Position::new(line, character + 3)),
            )
        };
        let declaration = Position::new(0, 4);
        let locations = vec![
            at(root.join("src/a.py"), 0, 4),
            at(root.join("src/a.py"), 7, 4),
            at(root.join("src/b.py"), 0, 4),
            at(std::env::temp_dir().join("elsewhere/c.py"), 1, 0),
        ];

        let refs = references_in_project(locations, &root, "src/a.py", declaration);
        let found: Vec<(&str, u32)> = refs
            .iter()
            .map(|(path, loc)| (path.as_str(), loc.range.start.line))
            .collect();
        assert_eq!(found, vec![("src/a.py", 7), ("src/b.py", 0)]);
    }

    #[tokio::test]
    async fn test_source_files_respects_handled_extensions() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::write(dir.path().join("src/lib.rs"), "").unwrap();
        std::fs::write(dir.path().join("src/nested/mod.rs"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();

        let client = LspClient::with_defaults(dir.path());
        let files = source_files(&client, None).await.unwrap();
        assert_eq!(files, vec!["src/lib.rs", "src/nested/mod.rs"]);

        let files = source_files(&client, Some("src/nested")).await.unwrap();
        assert_eq!(files, vec!["src/nested/mod.rs"]);
    }
}
