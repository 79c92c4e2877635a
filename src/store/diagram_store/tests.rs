// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::{DiagramStore, ErrorKind, SessionError};
use crate::engine::{Backend, BuiltinEngine, Compiler, Editor, EngineError};
use crate::format::CompileError;
use crate::model::{EdgeView, Graph, IdDeltas, ObjectView};
use crate::ops::{EditOperation, EditRequest};
use crate::render::{ExportFormat, Theme};

static TEMP_DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

struct TempDir {
    path: std::path::PathBuf,
}

impl TempDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
        let counter = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut path = env::temp_dir();
        path.push(format!("trellis-{prefix}-{}-{nanos}-{counter}", std::process::id()));
        std::fs::create_dir_all(&path).unwrap();
        Self { path }
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.path);
    }
}

/// Built-in editor that panics on selected calls, standing in for an engine
/// that cannot handle them.
#[derive(Debug, Default)]
struct FaultyEditor {
    panic_on_connection_delete: bool,
    panic_on_object_delete: bool,
    panic_on_delete_deltas: bool,
}

impl Editor for FaultyEditor {
    fn create(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
    ) -> Result<(Graph, String), EngineError> {
        BuiltinEngine.create(graph, board, key)
    }

    fn set(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
        tag: Option<&str>,
        value: Option<&str>,
    ) -> Result<Graph, EngineError> {
        BuiltinEngine.set(graph, board, key, tag, value)
    }

    fn delete(&self, graph: &Graph, board: &[String], key: &str) -> Result<Graph, EngineError> {
        let is_connection = key.contains("->");
        if is_connection && self.panic_on_connection_delete {
            panic!("cannot delete connection {key}");
        }
        if !is_connection && self.panic_on_object_delete {
            panic!("cannot delete object {key}");
        }
        BuiltinEngine.delete(graph, board, key)
    }

    fn move_element(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
        new_key: &str,
        include_descendants: bool,
    ) -> Result<Graph, EngineError> {
        BuiltinEngine.move_element(graph, board, key, new_key, include_descendants)
    }

    fn rename(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<(Graph, String), EngineError> {
        BuiltinEngine.rename(graph, board, key, new_name)
    }

    fn delete_id_deltas(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
    ) -> Result<IdDeltas, EngineError> {
        if self.panic_on_delete_deltas {
            panic!("delete deltas unavailable");
        }
        BuiltinEngine.delete_id_deltas(graph, board, key)
    }

    fn rename_id_deltas(
        &self,
        graph: &Graph,
        board: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<IdDeltas, EngineError> {
        BuiltinEngine.rename_id_deltas(graph, board, key, new_name)
    }

    fn get_object(
        &self,
        graph: &Graph,
        board: &[String],
        id: &str,
    ) -> Result<Option<ObjectView>, EngineError> {
        BuiltinEngine.get_object(graph, board, id)
    }

    fn get_edge(
        &self,
        graph: &Graph,
        board: &[String],
        id: &str,
    ) -> Result<Option<EdgeView>, EngineError> {
        BuiltinEngine.get_edge(graph, board, id)
    }

    fn children_ids(
        &self,
        graph: &Graph,
        board: &[String],
        parent_id: &str,
    ) -> Result<Option<Vec<String>>, EngineError> {
        BuiltinEngine.children_ids(graph, board, parent_id)
    }
}

/// Compiler that refuses any text without a connection in it.
struct ConnectionsRequired;

impl Compiler for ConnectionsRequired {
    fn compile(&self, text: &str) -> Result<Graph, CompileError> {
        if !text.contains("->") {
            return Err(CompileError::Semantic {
                key: "board".to_owned(),
                message: "at least one connection is required".to_owned(),
            });
        }
        BuiltinEngine.compile(text)
    }
}

const ROOT: &[String] = &[];

#[fixture]
fn store() -> DiagramStore {
    DiagramStore::default()
}

#[fixture]
fn cancel() -> CancellationToken {
    CancellationToken::new()
}

fn faulty_store(editor: FaultyEditor) -> DiagramStore {
    DiagramStore::new(Backend::builtin().with_editor(Arc::new(editor)))
}

fn loaded(store: DiagramStore, text: &str) -> DiagramStore {
    store.load("d", text, &CancellationToken::new()).expect("fixture loads");
    store
}

#[rstest]
fn serialize_returns_loaded_text_verbatim(store: DiagramStore, cancel: CancellationToken) {
    let text = "# comment\na ->   b\n";
    store.load("d", text, &cancel).unwrap();
    assert_eq!(store.serialize("d", &cancel).unwrap(), text);
    assert!(store.session("d").is_none());
}

#[rstest]
fn empty_text_is_a_blank_diagram(store: DiagramStore, cancel: CancellationToken) {
    let view = store.load("blank", "", &cancel).unwrap();
    assert!(view.objects.is_empty());
    assert_eq!(store.get_children("blank", ROOT, "", &cancel).unwrap(), Vec::<String>::new());
}

#[rstest]
fn compile_failure_keeps_previous_record(store: DiagramStore, cancel: CancellationToken) {
    store.load("d", "a", &cancel).unwrap();
    let err = store.load("d", "a: {", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
    assert_eq!(store.serialize("d", &cancel).unwrap(), "a");
}

#[rstest]
fn reload_discards_the_session(store: DiagramStore, cancel: CancellationToken) {
    store.load("d", "a", &cancel).unwrap();
    store.create_element("d", ROOT, "b", &cancel).unwrap();
    assert!(store.session("d").is_some());

    store.load("d", "x", &cancel).unwrap();
    assert!(store.session("d").is_none());
    assert_eq!(store.serialize("d", &cancel).unwrap(), "x");
}

#[rstest]
#[case("serialize")]
#[case("create")]
#[case("delete")]
#[case("object")]
#[case("children")]
fn unknown_diagrams_are_not_found(
    store: DiagramStore,
    cancel: CancellationToken,
    #[case] call: &str,
) {
    let err = match call {
        "serialize" => store.serialize("ghost", &cancel).map(|_| ()),
        "create" => store.create_element("ghost", ROOT, "a", &cancel).map(|_| ()),
        "delete" => store.delete_element("ghost", ROOT, "a", &cancel).map(|_| ()),
        "object" => store.get_object("ghost", ROOT, "a", &cancel).map(|_| ()),
        "children" => store.get_children("ghost", ROOT, "", &cancel).map(|_| ()),
        other => panic!("unknown call {other}"),
    }
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.to_string(), "diagram not found: ghost");
}

#[rstest]
fn validation_happens_before_lookup(store: DiagramStore, cancel: CancellationToken) {
    let err = store.create_element("", ROOT, "a", &cancel).unwrap_err();
    assert_eq!(err.to_string(), "diagram ID is required");
    let err = store.rename_element("ghost", ROOT, "a", " ", &cancel).unwrap_err();
    assert_eq!(err.to_string(), "new name is required");
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[rstest]
fn create_reports_the_assigned_key(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a");
    let result = store.create_element("d", ROOT, "a", &cancel).unwrap();
    assert_eq!(result.new_key, "a 2");
    assert!(result.key_adjusted());
    assert!(result.graph.object("a 2").is_some());

    let result = store.create_element("d", ROOT, "a -> c", &cancel).unwrap();
    assert_eq!(result.new_key, "(a -> c)[0]");
    assert!(store.get_edge("d", ROOT, "a->c", &cancel).is_ok());
    assert!(store.get_object("d", ROOT, "c", &cancel).is_ok());
}

#[rstest]
fn created_nested_key_is_readable(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "");
    let result = store.create_element("d", ROOT, "System.Database", &cancel).unwrap();
    assert!(!result.key_adjusted());
    let object = store.get_object("d", ROOT, &result.new_key, &cancel).unwrap();
    assert_eq!(object.parent.as_deref(), Some("System"));
}

#[rstest]
fn set_value_none_clears_instead_of_emptying(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a: {\n  shape: circle\n}");
    store.set_attribute("d", ROOT, "a.label", None, Some(""), &cancel).unwrap();
    assert_eq!(store.get_object("d", ROOT, "a", &cancel).unwrap().label, "");

    store.set_attribute("d", ROOT, "a.shape", None, None, &cancel).unwrap();
    assert_eq!(store.get_object("d", ROOT, "a", &cancel).unwrap().shape, "rectangle");

    store.set_attribute("d", ROOT, "a.fill", Some("style"), Some("#fff"), &cancel).unwrap();
    let object = store.get_object("d", ROOT, "a", &cancel).unwrap();
    assert_eq!(object.attributes.get("style.fill").map(String::as_str), Some("#fff"));
}

#[rstest]
fn rejected_edits_leave_state_untouched(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a");
    let err = store.set_attribute("d", ROOT, "a.shape", None, Some("blob"), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditRejected);
    assert!(err.to_string().starts_with("failed to set element:"));
    assert!(store.session("d").is_none());
    assert_eq!(store.serialize("d", &cancel).unwrap(), "a");
}

#[rstest]
fn deleting_a_container_cascades(cancel: CancellationToken) {
    let store = loaded(
        DiagramStore::default(),
        "parent: {\n  child1\n  child2\n}\nstandalone\nparent.child1 -> standalone",
    );
    let result = store.delete_element("d", ROOT, "parent", &cancel).unwrap();

    for id in ["parent", "parent.child1", "parent.child2", "parent.child1->standalone"] {
        assert_eq!(result.id_deltas.get(id).map(String::as_str), Some(""), "{id}");
    }
    assert!(result.graph.edges.is_empty());
    for id in ["parent", "parent.child1", "parent.child2"] {
        let err = store.get_object("d", ROOT, id, &cancel).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert_eq!(store.serialize("d", &cancel).unwrap(), "standalone\n");
}

#[rstest]
fn delete_of_an_attribute_clears_it(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a: {\n  shape: circle\n}");
    let result = store.delete_element("d", ROOT, "a.shape", &cancel).unwrap();
    assert!(result.id_deltas.is_empty());
    assert_eq!(result.graph.object("a").unwrap().shape, "rectangle");
}

fn connection_faults() -> DiagramStore {
    faulty_store(FaultyEditor { panic_on_connection_delete: true, ..Default::default() })
}

#[rstest]
fn connection_delete_fault_falls_back_to_text(cancel: CancellationToken) {
    let store = loaded(connection_faults(), "a -> b: carries\nb -> c");
    store.create_element("d", ROOT, "x", &cancel).unwrap();
    assert_eq!(store.session("d").unwrap().history().len(), 1);

    let result = store.delete_element("d", ROOT, "a -> b", &cancel).unwrap();
    assert!(result.success);
    assert_eq!(result.id_deltas, IdDeltas::from([("a->b".to_owned(), String::new())]));
    assert!(result.graph.edge("a->b").is_none());
    assert!(result.graph.object("a").is_some());

    let text = store.serialize("d", &cancel).unwrap();
    assert!(!text.contains("a -> b"), "{text}");
    assert!(text.contains("b -> c"), "{text}");

    // The rebuilt record starts a fresh session holding only the delete.
    let session = store.session("d").unwrap();
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].operation, EditOperation::Delete);
}

#[rstest]
fn fallback_removes_only_the_indexed_parallel_edge(cancel: CancellationToken) {
    let store = loaded(connection_faults(), "a -> b: first\na -> b: second");

    let result = store.delete_element("d", ROOT, "(a -> b)[1]", &cancel).unwrap();
    assert_eq!(result.id_deltas, IdDeltas::from([("a->b".to_owned(), String::new())]));
    assert_eq!(result.graph.edges.len(), 1);
    assert_eq!(result.graph.edges[0].label.as_deref(), Some("first"));
    assert_eq!(result.graph.objects.len(), 2);

    let err = store.delete_element("d", ROOT, "(a -> b)[5]", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditRejected);
}

#[rstest]
fn fallback_keeps_the_rest_of_a_chain(cancel: CancellationToken) {
    let store = loaded(connection_faults(), "a -> b -> c");

    let result = store.delete_element("d", ROOT, "a -> b", &cancel).unwrap();
    assert_eq!(result.id_deltas, IdDeltas::from([("a->b".to_owned(), String::new())]));
    assert!(result.graph.edge("b->c").is_some());
    for id in ["a", "b", "c"] {
        assert!(store.get_object("d", ROOT, id, &cancel).is_ok(), "{id}");
    }
    assert_eq!(store.serialize("d", &cancel).unwrap(), "a\nb\nc\nb -> c\n");
}

#[rstest]
fn fallback_removes_a_styled_connection_with_its_block(cancel: CancellationToken) {
    let store = loaded(connection_faults(), "a -> b: {\n  style.stroke: red\n}\nb -> c");

    let result = store.delete_element("d", ROOT, "a -> b", &cancel).unwrap();
    assert_eq!(result.graph.edges.len(), 1);
    assert!(result.graph.edge("b->c").is_some());
    assert!(!store.serialize("d", &cancel).unwrap().contains("stroke"));
}

#[rstest]
fn fallback_without_matching_line_is_rejected(cancel: CancellationToken) {
    let store = loaded(connection_faults(), "a -> b");
    let err = store.delete_element("d", ROOT, "x -> y", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditRejected);
    assert_eq!(store.serialize("d", &cancel).unwrap(), "a -> b");
}

#[rstest]
fn fallback_recompile_failure_reports_the_text(cancel: CancellationToken) {
    let mut backend = Backend::builtin().with_editor(Arc::new(FaultyEditor {
        panic_on_connection_delete: true,
        ..Default::default()
    }));
    backend.compiler = Arc::new(ConnectionsRequired);
    let store = loaded(DiagramStore::new(backend), "a -> b");

    let err = store.delete_element("d", ROOT, "a -> b", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
    let SessionError::FallbackCompile { text, .. } = err else {
        panic!("expected a fallback compile error, got {err:?}");
    };
    assert_eq!(text, "a\nb\n");
    assert_eq!(store.serialize("d", &cancel).unwrap(), "a -> b");
}

#[rstest]
fn object_delete_fault_is_fatal(cancel: CancellationToken) {
    let store = loaded(
        faulty_store(FaultyEditor { panic_on_object_delete: true, ..Default::default() }),
        "a -> b",
    );
    let err = store.delete_element("d", ROOT, "a", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditRejected);
    assert!(err.to_string().contains("cannot delete object a"), "{err}");
    assert!(store.get_object("d", ROOT, "a", &cancel).is_ok());
}

#[rstest]
fn delta_fault_degrades_to_empty(cancel: CancellationToken) {
    let store = loaded(
        faulty_store(FaultyEditor { panic_on_delete_deltas: true, ..Default::default() }),
        "p: {\n  c\n}",
    );
    let result = store.delete_element("d", ROOT, "p", &cancel).unwrap();
    assert!(result.success);
    assert!(result.id_deltas.is_empty());
    assert!(result.graph.objects.is_empty());
}

#[rstest]
fn rename_reports_deltas_and_rewrites_text(cancel: CancellationToken) {
    let store = loaded(
        DiagramStore::default(),
        "oldname: {\n  shape: rectangle\n  inner\n}\noldname -> target",
    );
    let result = store.rename_element("d", ROOT, "oldname", "newname", &cancel).unwrap();

    assert_eq!(result.new_key, "newname");
    assert_eq!(result.id_deltas.get("oldname").map(String::as_str), Some("newname"));
    assert_eq!(result.id_deltas.get("oldname.inner").map(String::as_str), Some("newname.inner"));
    assert_eq!(
        result.id_deltas.get("oldname->target").map(String::as_str),
        Some("newname->target")
    );
    assert!(store.get_object("d", ROOT, "newname.inner", &cancel).is_ok());
    assert!(!store.serialize("d", &cancel).unwrap().contains("oldname"));
}

#[rstest]
fn failed_rename_changes_nothing(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a");
    let err = store.rename_element("d", ROOT, "ghost", "b", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EditRejected);
    assert!(store.session("d").is_none());
}

#[rstest]
fn move_without_descendants_leaves_children_behind(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a: {\n  b: {\n    c\n  }\n}\nz\na.b.c -> z");
    let result = store.move_element("d", ROOT, "a.b", "z.b", false, &cancel).unwrap();
    assert!(result.id_deltas.is_empty());
    assert_eq!(result.new_key, "z.b");

    assert!(store.get_object("d", ROOT, "z.b", &cancel).is_ok());
    assert!(store.get_object("d", ROOT, "a.c", &cancel).is_ok());
    assert_eq!(store.get_children("d", ROOT, "z.b", &cancel).unwrap(), Vec::<String>::new());
    assert!(store.get_edge("d", ROOT, "a.c->z", &cancel).is_ok());
}

#[rstest]
fn move_with_descendants_keeps_connections(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a: {\n  b: {\n    c\n  }\n}\nz\na.b.c -> z");
    store.move_element("d", ROOT, "a.b", "z.b", true, &cancel).unwrap();
    assert!(store.get_object("d", ROOT, "z.b.c", &cancel).is_ok());
    let edge = store.get_edge("d", ROOT, "z.b.c->z", &cancel).unwrap();
    assert_eq!(edge.from, "z.b.c");
}

#[rstest]
fn reads_report_missing_elements(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "p: {\n  c1\n  c2\n}");
    assert_eq!(store.get_children("d", ROOT, "p", &cancel).unwrap(), ["p.c1", "p.c2"]);
    assert_eq!(store.get_children("d", ROOT, "", &cancel).unwrap(), ["p"]);

    let err = store.get_children("d", ROOT, "nope", &cancel).unwrap_err();
    assert_eq!(err.to_string(), "parent not found: nope");
    let err = store.get_edge("d", ROOT, "p->c1", &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[rstest]
fn cancelled_calls_do_nothing(store: DiagramStore) {
    let cancel = CancellationToken::new();
    store.load("d", "a", &cancel).unwrap();
    cancel.cancel();

    assert!(matches!(store.create_element("d", ROOT, "b", &cancel), Err(SessionError::Cancelled)));
    assert!(matches!(store.load("d", "x", &cancel), Err(SessionError::Cancelled)));
    assert_eq!(store.serialize("d", &CancellationToken::new()).unwrap(), "a");
}

#[rstest]
fn execute_dispatches_requests(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a");
    let request = EditRequest::new("d", "a", EditOperation::Rename { new_name: "b".to_owned() });
    let result = store.execute(&request, &cancel).unwrap();
    assert_eq!(result.new_key, "b");

    let session = store.session("d").unwrap();
    assert_eq!(session.history(), [request]);
    assert!(session.last_modified() >= session.started());

    let summary = &store.list()[0];
    assert_eq!(summary.id.as_str(), "d");
    assert!(summary.has_session);
    assert_eq!(summary.history_len, 1);
}

#[rstest]
fn nested_boards_are_passed_through_and_rejected(cancel: CancellationToken) {
    let store = loaded(DiagramStore::default(), "a");
    let board = vec!["layers".to_owned(), "x".to_owned()];
    let err = store.create_element("d", &board, "b", &cancel).unwrap_err();
    assert_eq!(err.to_string(), "failed to create element: board not found: layers.x");
}

#[rstest]
fn serialized_text_is_a_fixed_point(cancel: CancellationToken) {
    let store = loaded(
        DiagramStore::default(),
        "x: {\n  y: Why?\n}\nx.y -> z: {\n  style.stroke: red\n}",
    );
    store.set_attribute("d", ROOT, "z.shape", None, Some("circle"), &cancel).unwrap();
    let first = store.serialize("d", &cancel).unwrap();

    store.load("d", &first, &cancel).unwrap();
    store.set_attribute("d", ROOT, "z.shape", None, Some("circle"), &cancel).unwrap();
    assert_eq!(store.serialize("d", &cancel).unwrap(), first);
}

#[rstest]
fn concurrent_edits_on_distinct_diagrams(store: DiagramStore) {
    let cancel = CancellationToken::new();
    let ids: Vec<String> = (0..8).map(|n| format!("d{n}")).collect();
    for id in &ids {
        store.load(id, "", &cancel).unwrap();
    }

    std::thread::scope(|scope| {
        for id in &ids {
            let store = &store;
            let cancel = &cancel;
            scope.spawn(move || {
                for n in 0..20 {
                    store.create_element(id, ROOT, &format!("n{n}"), cancel).unwrap();
                }
            });
        }
    });

    for id in &ids {
        assert_eq!(store.get_children(id, ROOT, "", &cancel).unwrap().len(), 20);
        assert_eq!(store.session(id).unwrap().history().len(), 20);
    }
}

#[rstest]
fn export_and_save_write_svg(cancel: CancellationToken) {
    let tmp = TempDir::new("save");
    let store = loaded(DiagramStore::default(), "a -> b").with_output_dir(tmp.path());

    let svg = store.export("d", ExportFormat::Svg, Theme::default(), &cancel).unwrap();
    assert!(String::from_utf8(svg).unwrap().contains("<svg"));

    let path = store.save("d", ExportFormat::Svg, Theme::default(), None, &cancel).unwrap();
    assert!(path.starts_with(tmp.path()));
    assert!(path.file_name().unwrap().to_string_lossy().starts_with("d_"));
    assert!(std::fs::read_to_string(&path).unwrap().contains("<svg"));

    let explicit = tmp.path().join("nested/out.svg");
    let saved =
        store.save("d", ExportFormat::Svg, Theme::default(), Some(&explicit), &cancel).unwrap();
    assert_eq!(saved, explicit);
    assert!(explicit.exists());
}

#[rstest]
fn stateless_render_validates_input(store: DiagramStore, cancel: CancellationToken) {
    let err = store.render("  ", ExportFormat::Svg, Theme::default(), &cancel).unwrap_err();
    assert_eq!(err.to_string(), "diagram content is required");
    let err = store.render("a", ExportFormat::Svg, Theme(42), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = store.render("a: {", ExportFormat::Svg, Theme::default(), &cancel).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
}

#[rstest]
fn render_to_file_uses_output_dir(cancel: CancellationToken) {
    let tmp = TempDir::new("render");
    let store = DiagramStore::default().with_output_dir(tmp.path().join("out"));
    let (path, bytes) =
        store.render_to_file("a", ExportFormat::Svg, Theme::default(), None, &cancel).unwrap();
    assert!(path.starts_with(tmp.path().join("out")));
    assert_eq!(std::fs::read(&path).unwrap(), bytes);
}
