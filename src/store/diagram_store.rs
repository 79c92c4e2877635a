// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{Backend, EngineError};
use crate::format::CompileError;
use crate::format::d2::{canonical_ast, print};
use crate::model::key::{connection_key, is_connection_key};
use crate::model::{DiagramId, EdgeView, Graph, GraphView, IdDeltas, ObjectView};
use crate::ops::{
    parse_diagram_id, strip_connection_lines, strip_nth_connection_line, EditOperation,
    EditRequest, EditResult, ValidationError,
};
use crate::render::{ExportFormat, RenderError, Theme};

pub const DEFAULT_OUTPUT_DIR_NAME: &str = "trellis_output";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("{what} not found: {id}")]
    NotFound { what: &'static str, id: String },
    #[error("failed to compile diagram: {0}")]
    Compile(#[from] CompileError),
    #[error("failed to compile diagram after removing connection: {source}")]
    FallbackCompile { source: CompileError, text: String },
    #[error("failed to {action} element: {message}")]
    EditRejected { action: &'static str, message: String },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("operation cancelled")]
    Cancelled,
}

/// Coarse error class, for mapping onto wire-level error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Compile,
    EditRejected,
    Render,
    Io,
    Cancelled,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Compile(_) | Self::FallbackCompile { .. } => ErrorKind::Compile,
            Self::Render(RenderError::Compile(_)) => ErrorKind::Compile,
            Self::Render(RenderError::UnsupportedFormat(_) | RenderError::UnknownTheme(_)) => {
                ErrorKind::Validation
            }
            Self::Render(_) => ErrorKind::Render,
            Self::EditRejected { .. } => ErrorKind::EditRejected,
            Self::Io { .. } => ErrorKind::Io,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    fn not_found(what: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { what, id: id.into() }
    }

    fn rejected(action: &'static str, err: EngineError) -> Self {
        Self::EditRejected { action, message: err.to_string() }
    }
}

/// Editing context for one diagram, created by its first successful structural edit.
#[derive(Debug, Clone)]
pub struct EditSession {
    started: SystemTime,
    last_modified: SystemTime,
    history: Vec<EditRequest>,
}

impl EditSession {
    fn new() -> Self {
        let now = SystemTime::now();
        Self { started: now, last_modified: now, history: Vec::new() }
    }

    fn record(&mut self, request: EditRequest) {
        self.last_modified = SystemTime::now();
        self.history.push(request);
    }

    pub fn started(&self) -> SystemTime {
        self.started
    }

    pub fn last_modified(&self) -> SystemTime {
        self.last_modified
    }

    pub fn history(&self) -> &[EditRequest] {
        &self.history
    }
}

#[derive(Debug, Clone)]
struct DiagramRecord {
    text: String,
    /// Single graph slot shared by readers and the edit session.
    graph: Graph,
    session: Option<EditSession>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramSummary {
    pub id: DiagramId,
    pub object_count: usize,
    pub edge_count: usize,
    pub has_session: bool,
    pub last_modified: Option<SystemTime>,
    pub history_len: usize,
}

/// Outcome of one engine edit, before it is committed to the record.
struct Applied {
    graph: Graph,
    new_key: String,
    id_deltas: IdDeltas,
    /// The graph was rebuilt from patched text rather than edited in place.
    rebuilt: bool,
}

impl Applied {
    fn edited(graph: Graph, new_key: String, id_deltas: IdDeltas) -> Self {
        Self { graph, new_key, id_deltas, rebuilt: false }
    }
}

#[derive(Debug)]
pub struct DiagramStore {
    backend: Backend,
    output_dir: PathBuf,
    diagrams: RwLock<BTreeMap<DiagramId, DiagramRecord>>,
}

impl Default for DiagramStore {
    fn default() -> Self {
        Self::new(Backend::builtin())
    }
}

impl DiagramStore {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            output_dir: std::env::temp_dir().join(DEFAULT_OUTPUT_DIR_NAME),
            diagrams: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<DiagramId, DiagramRecord>> {
        self.diagrams.read().expect("diagram store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<DiagramId, DiagramRecord>> {
        self.diagrams.write().expect("diagram store lock poisoned")
    }

    /// Compiles `text` and replaces whatever was stored under `diagram_id`, session included.
    ///
    /// On a compile error the previous record is left untouched.
    pub fn load(
        &self,
        diagram_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<GraphView, SessionError> {
        let diagram_id = parse_diagram_id(diagram_id)?;
        check_cancelled(cancel)?;

        let compiler = self.backend.compiler.clone();
        let graph = contain(|| compiler.compile(text))
            .map_err(|fault| SessionError::rejected("load", EngineError::Faulted(fault)))??;
        let view = GraphView::from_graph(&graph);

        let record = DiagramRecord { text: text.to_owned(), graph, session: None };
        let replaced = self.write().insert(diagram_id.clone(), record).is_some();
        info!(diagram_id = %diagram_id, replaced, objects = view.objects.len(), "diagram loaded");
        Ok(view)
    }

    pub fn contains(&self, diagram_id: &str) -> bool {
        self.read().contains_key(diagram_id.trim())
    }

    pub fn list(&self) -> Vec<DiagramSummary> {
        self.read()
            .iter()
            .map(|(id, record)| DiagramSummary {
                id: id.clone(),
                object_count: record.graph.object_count(),
                edge_count: record.graph.edges().len(),
                has_session: record.session.is_some(),
                last_modified: record.session.as_ref().map(EditSession::last_modified),
                history_len: record.session.as_ref().map_or(0, |s| s.history().len()),
            })
            .collect()
    }

    pub fn session(&self, diagram_id: &str) -> Option<EditSession> {
        self.read().get(diagram_id.trim()).and_then(|record| record.session.clone())
    }

    /// Canonical text of a diagram: formatted from the session graph once edits happened,
    /// otherwise the text it was loaded with.
    pub fn serialize(
        &self,
        diagram_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String, SessionError> {
        let diagram_id = parse_diagram_id(diagram_id)?;
        let diagrams = self.read();
        let record = diagrams
            .get(&diagram_id)
            .ok_or_else(|| SessionError::not_found("diagram", diagram_id.as_str()))?;
        check_cancelled(cancel)?;
        Ok(self.current_text(record))
    }

    fn current_text(&self, record: &DiagramRecord) -> String {
        if record.session.is_none() {
            return record.text.clone();
        }
        let formatter = self.backend.formatter.clone();
        match contain(|| formatter.format(&record.graph)) {
            Ok(Some(text)) => text,
            Ok(None) => record.text.clone(),
            Err(fault) => {
                warn!(%fault, "formatter faulted; using stored text");
                record.text.clone()
            }
        }
    }

    /// Serializes and renders. Rendering runs outside the store lock.
    pub fn export(
        &self,
        diagram_id: &str,
        format: ExportFormat,
        theme: Theme,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, SessionError> {
        let text = self.serialize(diagram_id, cancel)?;
        let bytes = self.render(&text, format, theme, cancel)?;
        info!(diagram_id = diagram_id.trim(), %format, bytes = bytes.len(), "diagram exported");
        Ok(bytes)
    }

    /// Renders diagram text that is not held by the store.
    pub fn render(
        &self,
        text: &str,
        format: ExportFormat,
        theme: Theme,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, SessionError> {
        if text.trim().is_empty() {
            return Err(ValidationError::MissingText.into());
        }
        check_cancelled(cancel)?;
        let renderer = self.backend.renderer.clone();
        contain(|| renderer.render(text, format, theme))
            .map_err(|fault| SessionError::rejected("render", EngineError::Faulted(fault)))?
            .map_err(SessionError::from)
    }

    /// Exports a stored diagram to `path`, or to `<output_dir>/<id>_<unix-secs>.<ext>`.
    pub fn save(
        &self,
        diagram_id: &str,
        format: ExportFormat,
        theme: Theme,
        path: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, SessionError> {
        let bytes = self.export(diagram_id, format, theme, cancel)?;
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path(diagram_id.trim(), format),
        };
        write_output(&path, &bytes)?;
        info!(diagram_id = diagram_id.trim(), path = %path.display(), "diagram saved");
        Ok(path)
    }

    /// Renders `text` to `path`, or to `<output_dir>/diagram_<unix-secs>.<ext>`.
    pub fn render_to_file(
        &self,
        text: &str,
        format: ExportFormat,
        theme: Theme,
        path: Option<&Path>,
        cancel: &CancellationToken,
    ) -> Result<(PathBuf, Vec<u8>), SessionError> {
        let bytes = self.render(text, format, theme, cancel)?;
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_output_path("diagram", format),
        };
        write_output(&path, &bytes)?;
        info!(path = %path.display(), "rendered diagram written");
        Ok((path, bytes))
    }

    fn default_output_path(&self, stem: &str, format: ExportFormat) -> PathBuf {
        let secs = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        self.output_dir.join(format!("{stem}_{secs}.{}", format.extension()))
    }

    pub fn create_element(
        &self,
        diagram_id: &str,
        board_path: &[String],
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let request = EditRequest::new(diagram_id, key, EditOperation::Create);
        self.execute(&request.with_board_path(board_path.to_vec()), cancel)
    }

    pub fn set_attribute(
        &self,
        diagram_id: &str,
        board_path: &[String],
        key: &str,
        tag: Option<&str>,
        value: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let operation = EditOperation::Set {
            tag: tag.map(str::to_owned),
            value: value.map(str::to_owned),
        };
        let request = EditRequest::new(diagram_id, key, operation);
        self.execute(&request.with_board_path(board_path.to_vec()), cancel)
    }

    pub fn delete_element(
        &self,
        diagram_id: &str,
        board_path: &[String],
        key: &str,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let request = EditRequest::new(diagram_id, key, EditOperation::Delete);
        self.execute(&request.with_board_path(board_path.to_vec()), cancel)
    }

    pub fn move_element(
        &self,
        diagram_id: &str,
        board_path: &[String],
        key: &str,
        new_key: &str,
        include_descendants: bool,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let operation =
            EditOperation::Move { new_key: new_key.to_owned(), include_descendants };
        let request = EditRequest::new(diagram_id, key, operation);
        self.execute(&request.with_board_path(board_path.to_vec()), cancel)
    }

    pub fn rename_element(
        &self,
        diagram_id: &str,
        board_path: &[String],
        key: &str,
        new_name: &str,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let operation = EditOperation::Rename { new_name: new_name.to_owned() };
        let request = EditRequest::new(diagram_id, key, operation);
        self.execute(&request.with_board_path(board_path.to_vec()), cancel)
    }

    /// Validates and applies one structural edit under the write lock.
    pub fn execute(
        &self,
        request: &EditRequest,
        cancel: &CancellationToken,
    ) -> Result<EditResult, SessionError> {
        let diagram_id = request.validate()?;
        let mut diagrams = self.write();
        let record = diagrams
            .get_mut(&diagram_id)
            .ok_or_else(|| SessionError::not_found("diagram", diagram_id.as_str()))?;
        check_cancelled(cancel)?;

        debug!(
            diagram_id = %diagram_id,
            op = request.operation.name(),
            key = %request.key,
            "applying edit"
        );
        let applied = self.apply_edit(record, request)?;

        if applied.rebuilt {
            record.session = None;
        }
        self.commit(record, request.clone(), applied.graph);
        Ok(EditResult {
            success: true,
            requested_key: request.key.clone(),
            new_key: applied.new_key,
            id_deltas: applied.id_deltas,
            graph: GraphView::from_graph(&record.graph),
        })
    }

    fn apply_edit(
        &self,
        record: &DiagramRecord,
        request: &EditRequest,
    ) -> Result<Applied, SessionError> {
        let graph = &record.graph;
        let editor = self.backend.editor.clone();
        let board = request.board_path.as_slice();
        let key = request.key.as_str();
        let action = request.operation.name();

        let applied = match &request.operation {
            EditOperation::Create => {
                let (graph, new_key) = guarded(|| editor.create(graph, board, key))
                    .map_err(|err| SessionError::rejected(action, err))?;
                Applied::edited(graph, new_key, IdDeltas::new())
            }
            EditOperation::Set { tag, value } => {
                let graph = guarded(|| {
                    editor.set(graph, board, key, tag.as_deref(), value.as_deref())
                })
                .map_err(|err| SessionError::rejected(action, err))?;
                Applied::edited(graph, key.to_owned(), IdDeltas::new())
            }
            EditOperation::Move { new_key, include_descendants } => {
                let graph = guarded(|| {
                    editor.move_element(graph, board, key, new_key, *include_descendants)
                })
                .map_err(|err| SessionError::rejected(action, err))?;
                Applied::edited(graph, new_key.clone(), IdDeltas::new())
            }
            EditOperation::Rename { new_name } => {
                // Deltas describe the pre-rename graph, so they are queried first.
                let id_deltas = guarded(|| editor.rename_id_deltas(graph, board, key, new_name))
                    .map_err(|err| SessionError::rejected(action, err))?;
                let (graph, new_key) = guarded(|| editor.rename(graph, board, key, new_name))
                    .map_err(|err| SessionError::rejected(action, err))?;
                Applied::edited(graph, new_key, id_deltas)
            }
            EditOperation::Delete => self.apply_delete(record, request)?,
        };
        Ok(applied)
    }

    fn apply_delete(
        &self,
        record: &DiagramRecord,
        request: &EditRequest,
    ) -> Result<Applied, SessionError> {
        let editor = self.backend.editor.clone();
        let board = request.board_path.as_slice();
        let key = request.key.as_str();

        let id_deltas = match guarded(|| editor.delete_id_deltas(&record.graph, board, key)) {
            Ok(deltas) => deltas,
            Err(err) => {
                warn!(key, error = %err, "delete deltas unavailable; reporting none");
                IdDeltas::new()
            }
        };

        match guarded(|| editor.delete(&record.graph, board, key)) {
            Ok(graph) => Ok(Applied::edited(graph, key.to_owned(), id_deltas)),
            Err(EngineError::Faulted(fault)) if is_connection_key(key) => {
                warn!(key, %fault, "connection delete faulted; patching diagram text");
                let graph = self.delete_connection_textually(record, key)?;
                let id_deltas = removed_ids(&record.graph, &graph);
                Ok(Applied { graph, new_key: key.to_owned(), id_deltas, rebuilt: true })
            }
            Err(err) => Err(SessionError::rejected("delete", err)),
        }
    }

    /// Removes the connection from the canonical text and recompiles it.
    ///
    /// Canonical text declares every object on its own and prints one edge per line, so the
    /// patch cannot take endpoints or neighbouring hops of a chain with it.
    fn delete_connection_textually(
        &self,
        record: &DiagramRecord,
        key: &str,
    ) -> Result<Graph, SessionError> {
        let edge = connection_key(key).map_err(|err| SessionError::EditRejected {
            action: "delete",
            message: err.to_string(),
        })?;
        let (src, dst) = (edge.src_id(), edge.dst_id());

        let text = print(&canonical_ast(&record.graph));
        let patched = match edge.index {
            Some(index) => strip_nth_connection_line(&text, &src, &dst, index),
            None => strip_connection_lines(&text, &src, edge.arrow, &dst),
        };
        let Some(patched) = patched else {
            return Err(SessionError::EditRejected {
                action: "delete",
                message: format!("connection '{}' not found in diagram text", key.trim()),
            });
        };

        let compiler = self.backend.compiler.clone();
        match contain(|| compiler.compile(&patched)) {
            Ok(Ok(graph)) => Ok(graph),
            Ok(Err(source)) => Err(SessionError::FallbackCompile { source, text: patched }),
            Err(fault) => Err(SessionError::rejected("delete", EngineError::Faulted(fault))),
        }
    }

    /// Stores the edited graph, its formatted text and the session history entry together.
    fn commit(&self, record: &mut DiagramRecord, request: EditRequest, graph: Graph) {
        let formatter = self.backend.formatter.clone();
        match contain(|| formatter.format(&graph)) {
            Ok(Some(text)) => record.text = text,
            Ok(None) => {}
            Err(fault) => warn!(%fault, "formatter faulted; keeping previous text"),
        }
        record.graph = graph;
        record.session.get_or_insert_with(EditSession::new).record(request);
    }

    pub fn get_object(
        &self,
        diagram_id: &str,
        board_path: &[String],
        object_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ObjectView, SessionError> {
        self.read_graph(diagram_id, cancel, |graph| {
            let editor = self.backend.editor.clone();
            guarded(|| editor.get_object(graph, board_path, object_id))
                .map_err(|err| SessionError::rejected("read", err))?
                .ok_or_else(|| SessionError::not_found("object", object_id))
        })
    }

    pub fn get_edge(
        &self,
        diagram_id: &str,
        board_path: &[String],
        edge_id: &str,
        cancel: &CancellationToken,
    ) -> Result<EdgeView, SessionError> {
        self.read_graph(diagram_id, cancel, |graph| {
            let editor = self.backend.editor.clone();
            guarded(|| editor.get_edge(graph, board_path, edge_id))
                .map_err(|err| SessionError::rejected("read", err))?
                .ok_or_else(|| SessionError::not_found("edge", edge_id))
        })
    }

    /// Immediate children of `parent_id`; `""` lists the root.
    pub fn get_children(
        &self,
        diagram_id: &str,
        board_path: &[String],
        parent_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, SessionError> {
        self.read_graph(diagram_id, cancel, |graph| {
            let editor = self.backend.editor.clone();
            guarded(|| editor.children_ids(graph, board_path, parent_id))
                .map_err(|err| SessionError::rejected("read", err))?
                .ok_or_else(|| SessionError::not_found("parent", parent_id))
        })
    }

    /// Snapshot of the current graph as the public view.
    pub fn graph_view(
        &self,
        diagram_id: &str,
        cancel: &CancellationToken,
    ) -> Result<GraphView, SessionError> {
        self.read_graph(diagram_id, cancel, |graph| Ok(GraphView::from_graph(graph)))
    }

    fn read_graph<T>(
        &self,
        diagram_id: &str,
        cancel: &CancellationToken,
        read: impl FnOnce(&Graph) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let diagram_id = parse_diagram_id(diagram_id)?;
        let diagrams = self.read();
        let record = diagrams
            .get(&diagram_id)
            .ok_or_else(|| SessionError::not_found("diagram", diagram_id.as_str()))?;
        check_cancelled(cancel)?;
        read(&record.graph)
    }
}

// Fault containment and output-file helpers.
include!("diagram_store/helpers.rs");

#[cfg(test)]
mod tests;
