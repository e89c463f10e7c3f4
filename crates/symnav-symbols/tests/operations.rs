//! Symbol operations against in-memory collaborators.

use serde_json::{json, Value};
use std::sync::Arc;
use symnav_symbols::{
    FindSymbolRequest, OperationSettings, OutputFormat, ReferenceInSymbol, SymbolError,
    SymbolKind, SymbolOperations, ANSWER_TOO_LONG, NO_HOVER_INFO, SUCCESS_RESULT,
};
use symnav_test_utils::fixtures::{BuiltProject, TestProject};
use symnav_test_utils::mocks::{MockCodeEditor, MockLspSession, MockProject, MockSymbolRetriever};
use symnav_test_utils::{raw_location, SymbolBuilder};

struct Harness {
    ops: SymbolOperations,
    retriever: MockSymbolRetriever,
    editor: MockCodeEditor,
    session: MockLspSession,
    _project: BuiltProject,
}

fn class_a() -> SymbolBuilder {
    SymbolBuilder::new("A", SymbolKind::Class)
        .range(0, 0, 9, 0)
        .selection(0, 6, 7)
        .body("class A:\n    def b(self):\n        pass")
        .child(SymbolBuilder::new("b", SymbolKind::Method).range(1, 4, 2, 12))
        .child(SymbolBuilder::new("c", SymbolKind::Method).range(3, 4, 4, 12))
        .child(SymbolBuilder::new("boost", SymbolKind::Method).range(5, 4, 6, 12))
}

fn class_x() -> SymbolBuilder {
    SymbolBuilder::new("X", SymbolKind::Class)
        .range(0, 0, 8, 0)
        .child(
            SymbolBuilder::new("A", SymbolKind::Class)
                .range(1, 4, 7, 0)
                .child(SymbolBuilder::new("b", SymbolKind::Function).range(2, 8, 3, 0)),
        )
}

fn overloads() -> SymbolBuilder {
    SymbolBuilder::new("A", SymbolKind::Class)
        .range(0, 0, 6, 0)
        .child(SymbolBuilder::new("f", SymbolKind::Method).range(1, 4, 2, 0))
        .child(SymbolBuilder::new("f", SymbolKind::Method).range(3, 4, 4, 0))
}

fn harness_with(session: MockLspSession, format: OutputFormat) -> Harness {
    let project = TestProject::new()
        .with_file("src/a.py", "class A:\n    def b(self):\n        pass\n")
        .with_file("src/x.py", "class X:\n    class A:\n        def b():\n            pass\n")
        .with_file("lib/over.java", "class A {\n  void f() {}\n  void f(int x) {}\n}\n")
        .with_dir("src/empty")
        .build();

    let retriever = MockSymbolRetriever::new()
        .with_file("src/a.py", vec![class_a().file("src/a.py").build()])
        .with_file("src/x.py", vec![class_x().file("src/x.py").build()])
        .with_file("lib/over.java", vec![overloads().file("lib/over.java").build()]);
    let editor = MockCodeEditor::new().with_file("src/a.py", vec![class_a().file("src/a.py").build()]);
    let mock_project = MockProject::new(project.path())
        .with_file("src/a.py", "class A:\n    def b(self):\n        pass\n")
        .with_file("src/main.py", "import a\n\nx = a.A()\nx.b()\n");

    let ops = SymbolOperations::new(
        Arc::new(retriever.clone()),
        Arc::new(editor.clone()),
        Arc::new(session.clone()),
        Arc::new(mock_project),
        OperationSettings {
            output_format: format,
            default_max_answer_chars: 100_000,
        },
    );
    Harness {
        ops,
        retriever,
        editor,
        session,
        _project: project,
    }
}

fn harness() -> Harness {
    harness_with(MockLspSession::new(), OutputFormat::Json)
}

fn name_paths(output: &str) -> Vec<String> {
    let value: Value = serde_json::from_str(output).unwrap();
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["name_path"].as_str().unwrap().to_string())
        .collect()
}

async fn find(h: &Harness, request: FindSymbolRequest) -> Vec<String> {
    name_paths(&h.ops.find_symbol(&request).await.unwrap())
}

#[tokio::test]
async fn test_overview_rejects_directory_and_missing_file() {
    let h = harness();
    let err = h.ops.get_symbols_overview("src/empty", -1).await.unwrap_err();
    assert!(matches!(err, SymbolError::InvalidArgument(_)));

    let err = h.ops.get_symbols_overview("src/missing.py", -1).await.unwrap_err();
    assert!(matches!(err, SymbolError::NotFound(_)));
}

#[tokio::test]
async fn test_overview_lists_top_level_symbols_only() {
    let h = harness();
    let out = h.ops.get_symbols_overview("src/a.py", -1).await.unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        value,
        json!([{
            "name_path": "A",
            "kind": "Class",
            "relative_path": "src/a.py",
            "range": "1:1-10:1"
        }])
    );
}

#[tokio::test]
async fn test_find_symbol_matches_name_path_suffixes() {
    let h = harness();
    let within = |p: &str| FindSymbolRequest {
        relative_path: Some("src".to_string()),
        ..FindSymbolRequest::new(p)
    };

    assert_eq!(find(&h, within("A/b")).await, vec!["A/b", "X/A/b"]);
    assert_eq!(find(&h, within("/A/b")).await, vec!["A/b"]);
    assert_eq!(find(&h, within("b")).await, vec!["A/b", "X/A/b"]);
}

#[tokio::test]
async fn test_find_symbol_scope_is_normalized() {
    let h = harness();
    let scoped = |scope: &str| FindSymbolRequest {
        relative_path: Some(scope.to_string()),
        ..FindSymbolRequest::new("/A")
    };

    assert_eq!(find(&h, scoped("./src")).await, vec!["A"]);
    assert_eq!(find(&h, scoped("src/./a.py")).await, vec!["A"]);
    assert_eq!(find(&h, scoped("lib/../src")).await, vec!["A"]);
    assert_eq!(h.retriever.queries()[0].within_path.as_deref(), Some("src"));

    let err = h.ops.find_symbol(&scoped("../elsewhere")).await.unwrap_err();
    assert!(matches!(err, SymbolError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_find_symbol_substring_matching() {
    let h = harness();
    let mut request = FindSymbolRequest::new("/A/bo");
    assert!(find(&h, request.clone()).await.is_empty());

    request.substring_matching = true;
    assert_eq!(find(&h, request).await, vec!["A/boost"]);
}

#[tokio::test]
async fn test_find_symbol_selects_overload() {
    let h = harness();
    let mut request = FindSymbolRequest::new("A/f");
    request.relative_path = Some("lib".to_string());
    assert_eq!(find(&h, request.clone()).await, vec!["A/f[0]", "A/f[1]"]);

    request.name_path_pattern = "A/f[1]".to_string();
    let out = h.ops.find_symbol(&request).await.unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 1);
    assert_eq!(value[0]["name_path"], "A/f[1]");
    assert_eq!(value[0]["range"], "4:5-5:1");
}

#[tokio::test]
async fn test_find_symbol_exclusion_beats_inclusion() {
    let h = harness();
    let mut request = FindSymbolRequest::new("b");
    request.include_kinds = vec![12];
    assert_eq!(find(&h, request.clone()).await, vec!["X/A/b"]);

    request.exclude_kinds = vec![12];
    assert!(find(&h, request).await.is_empty());
}

#[tokio::test]
async fn test_find_symbol_rejects_invalid_kind_before_searching() {
    let h = harness();
    let mut request = FindSymbolRequest::new("b");
    request.include_kinds = vec![0];
    let err = h.ops.find_symbol(&request).await.unwrap_err();
    assert!(matches!(err, SymbolError::InvalidArgument(_)));

    request.include_kinds = vec![];
    request.exclude_kinds = vec![27];
    assert!(h.ops.find_symbol(&request).await.is_err());
    assert!(h.retriever.queries().is_empty());
}

#[tokio::test]
async fn test_find_symbol_depth_and_body() {
    let h = harness();
    let mut request = FindSymbolRequest::new("/A");
    request.relative_path = Some("src/a.py".to_string());
    request.depth = 1;
    request.include_body = true;

    let out = h.ops.find_symbol(&request).await.unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    let class = &value[0];
    assert_eq!(class["body"], "class A:\ndef b(self):\n    pass");
    let children: Vec<&str> = class["children"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name_path"].as_str().unwrap())
        .collect();
    assert_eq!(children, vec!["A/b", "A/c", "A/boost"]);
    assert!(class.get("location").is_none());
    assert!(class.get("selection_range").is_none());
    assert!(class.get("name").is_none());
}

#[tokio::test]
async fn test_find_symbol_empty_result_is_not_an_error() {
    let h = harness();
    let out = h.ops.find_symbol(&FindSymbolRequest::new("nothing")).await.unwrap();
    assert_eq!(serde_json::from_str::<Value>(&out).unwrap(), json!([]));
}

#[tokio::test]
async fn test_referencing_symbols_carry_context() {
    let caller = SymbolBuilder::new("main", SymbolKind::Function)
        .file("src/main.py")
        .range(2, 0, 3, 5)
        .build();
    let h = harness();
    h.retriever.clone().with_references(vec![ReferenceInSymbol {
        symbol: caller,
        line: 3,
        character: 2,
    }]);

    let out = h
        .ops
        .find_referencing_symbols("A/b", "src/a.py", &[], &[], -1)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value[0]["name_path"], "main");
    assert_eq!(value[0]["content_around_reference"], " 3|x = a.A()\n>4|x.b()");
    assert!(value[0].get("body").is_none());
}

#[tokio::test]
async fn test_referencing_symbols_unknown_name_path() {
    let h = harness();
    let err = h
        .ops
        .find_referencing_symbols("A/nope", "src/a.py", &[], &[], -1)
        .await
        .unwrap_err();
    assert!(matches!(err, SymbolError::NotFound(_)));
}

#[tokio::test]
async fn test_referencing_symbol_without_path_is_invariant_violation() {
    let h = harness();
    h.retriever.clone().with_references(vec![ReferenceInSymbol {
        symbol: SymbolBuilder::new("orphan", SymbolKind::Function).build(),
        line: 0,
        character: 0,
    }]);

    let err = h
        .ops
        .find_referencing_symbols("A/b", "src/a.py", &[], &[], -1)
        .await
        .unwrap_err();
    assert!(matches!(err, SymbolError::InvariantViolation(_)));
}

#[tokio::test]
async fn test_hover_shapes() {
    let h = harness_with(
        MockLspSession::new().with_hover(json!({"contents": ["a", {"value": "b"}]})),
        OutputFormat::Json,
    );
    assert_eq!(h.ops.get_hover_info("src/a.py", 1, 8).await.unwrap(), "a\n\nb");

    let h = harness();
    assert_eq!(h.ops.get_hover_info("src/a.py", 1, 8).await.unwrap(), NO_HOVER_INFO);
}

#[tokio::test]
async fn test_definition_entries() {
    let mut outside = raw_location("ignored", 0, 0, 1);
    outside.relative_path = None;
    outside.uri = "jar:file:///deps/lib.jar!/A.class".to_string();
    let mut unresolvable = raw_location("ignored", 0, 0, 1);
    unresolvable.relative_path = None;
    unresolvable.uri = String::new();

    let session = MockLspSession::new().with_definitions(vec![
        raw_location("src/a.py", 1, 8, 9),
        outside,
        unresolvable,
    ]);
    let h = harness_with(session, OutputFormat::Json);

    let out = h
        .ops
        .get_definition_locations("src/main.py", 3, 2, -1)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(
        value,
        json!([
            {
                "relative_path": "src/a.py",
                "range": "2:9-2:10",
                "snippet": " 1|class A:\n>2|    def b(self):\n 3|        pass"
            },
            {
                "range": "1:1-1:2",
                "uri": "jar:file:///deps/lib.jar!/A.class"
            }
        ])
    );
}

#[tokio::test]
async fn test_reference_entries_tolerate_missing_snippets() {
    let session = MockLspSession::new().with_references(vec![raw_location("src/gone.py", 4, 0, 3)]);
    let h = harness_with(session, OutputFormat::Json);

    let out = h
        .ops
        .get_reference_locations("src/a.py", 1, 8, -1)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value, json!([{"relative_path": "src/gone.py", "range": "5:1-5:4"}]));
}

#[tokio::test]
async fn test_defining_symbol_absent_is_reported() {
    let h = harness();
    let out = h
        .ops
        .get_defining_symbol("src/a.py", 0, 0, false, -1)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value, json!({"error": "No defining symbol found."}));
}

#[tokio::test]
async fn test_defining_symbol_with_body() {
    let session = MockLspSession::new()
        .with_defining_symbol(class_a().file("src/a.py").build())
        .with_definitions(vec![raw_location("src/a.py", 0, 6, 7)]);
    let h = harness_with(session, OutputFormat::Json);

    let out = h
        .ops
        .get_defining_symbol("src/main.py", 2, 6, true, -1)
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["symbol"]["name_path"], "A");
    assert_eq!(value["symbol"]["body"], "class A:\ndef b(self):\n    pass");
    assert_eq!(value["definitions"][0]["relative_path"], "src/a.py");
    assert!(value.get("error").is_none());
}

#[tokio::test]
async fn test_answer_budget() {
    let h = harness();
    let request = FindSymbolRequest {
        max_answer_chars: 10,
        ..FindSymbolRequest::new("b")
    };
    assert_eq!(h.ops.find_symbol(&request).await.unwrap(), ANSWER_TOO_LONG);

    let request = FindSymbolRequest {
        max_answer_chars: 0,
        ..FindSymbolRequest::new("nothing")
    };
    assert_eq!(h.ops.find_symbol(&request).await.unwrap(), ANSWER_TOO_LONG);

    let request = FindSymbolRequest {
        max_answer_chars: 2,
        ..FindSymbolRequest::new("nothing")
    };
    assert_eq!(h.ops.find_symbol(&request).await.unwrap(), "[]");
}

#[tokio::test]
async fn test_yaml_output() {
    let h = harness_with(MockLspSession::new(), OutputFormat::Yaml);
    let out = h.ops.get_symbols_overview("src/a.py", -1).await.unwrap();
    assert!(out.contains("name_path: A"));
    assert!(out.contains("kind: Class"));
}

#[tokio::test]
async fn test_edits_return_ok_and_reach_editor() {
    let h = harness();
    assert_eq!(
        h.ops
            .replace_symbol_body("A/b", "src/a.py", "def b(self):\n    return 1")
            .await
            .unwrap(),
        SUCCESS_RESULT
    );
    assert_eq!(
        h.ops
            .insert_after_symbol("A", "src/a.py", "\nclass B:\n    pass")
            .await
            .unwrap(),
        SUCCESS_RESULT
    );
    assert_eq!(
        h.ops
            .insert_before_symbol("/A", "src/a.py", "import os")
            .await
            .unwrap(),
        SUCCESS_RESULT
    );

    let ops: Vec<&str> = h.editor.calls().iter().map(|c| c.operation).collect();
    assert_eq!(ops, vec!["replace_body", "insert_after", "insert_before"]);
}

#[tokio::test]
async fn test_edits_fail_for_unknown_or_malformed_name_path() {
    let h = harness();
    let err = h
        .ops
        .replace_symbol_body("A/zzz", "src/a.py", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, SymbolError::NotFound(_)));

    let err = h
        .ops
        .insert_after_symbol("A//b", "src/a.py", "x")
        .await
        .unwrap_err();
    assert!(matches!(err, SymbolError::InvalidArgument(_)));
    assert!(h.editor.calls().is_empty());
}

#[tokio::test]
async fn test_rename_returns_status() {
    let h = harness();
    let status = h.ops.rename_symbol("A/b", "src/a.py", "bee").await.unwrap();
    assert_eq!(status, "Successfully renamed 'b' to 'bee'.");

    let editor = MockCodeEditor::new()
        .with_file("src/a.py", vec![class_a().file("src/a.py").build()])
        .with_rename_status("Failed to rename 'b' to 'c': name already exists");
    let ops = SymbolOperations::new(
        Arc::new(h.retriever.clone()),
        Arc::new(editor),
        Arc::new(h.session.clone()),
        Arc::new(MockProject::new("/project")),
        OperationSettings::default(),
    );
    let status = ops.rename_symbol("A/b", "src/a.py", "c").await.unwrap();
    assert!(status.starts_with("Failed to rename"));
}

#[tokio::test]
async fn test_restart_recovers_unavailable_session() {
    let h = harness_with(MockLspSession::new().unavailable(), OutputFormat::Json);
    let err = h.ops.get_hover_info("src/a.py", 0, 0).await.unwrap_err();
    assert!(matches!(err, SymbolError::Unavailable(_)));

    assert_eq!(h.ops.restart_language_server().await.unwrap(), SUCCESS_RESULT);
    assert_eq!(h.session.restart_count(), 1);
    assert_eq!(h.ops.get_hover_info("src/a.py", 0, 0).await.unwrap(), NO_HOVER_INFO);
}
