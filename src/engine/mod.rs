// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Collaborator seams around the session core.
//!
//! The store only talks to these traits. Mutating [`Editor`] calls take the
//! current graph by reference and return a fresh one, so a failed call never
//! leaves a half-edited graph behind.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::format::CompileError;
use crate::model::{EdgeView, Graph, IdDeltas, ObjectView};
use crate::render::{ExportFormat, RenderError, Theme};

mod builtin;
mod edit;

pub use builtin::BuiltinEngine;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The engine understood the request and refused it.
    #[error("{0}")]
    Rejected(String),
    /// The engine failed internally (including a contained panic).
    #[error("engine fault: {0}")]
    Faulted(String),
}

pub trait Compiler: Send + Sync {
    fn compile(&self, text: &str) -> Result<Graph, CompileError>;
}

pub trait Formatter: Send + Sync {
    /// `None` when the graph has no syntax tree to print from.
    fn format(&self, graph: &Graph) -> Option<String>;
}

pub trait Editor: Send + Sync {
    /// Returns the new graph and the key actually assigned.
    fn create(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
    ) -> Result<(Graph, String), EngineError>;

    fn set(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        tag: Option<&str>,
        value: Option<&str>,
    ) -> Result<Graph, EngineError>;

    fn delete(&self, graph: &Graph, board_path: &[String], key: &str)
        -> Result<Graph, EngineError>;

    fn move_element(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_key: &str,
        include_descendants: bool,
    ) -> Result<Graph, EngineError>;

    /// Returns the new graph and the renamed element's new id.
    fn rename(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<(Graph, String), EngineError>;

    fn delete_id_deltas(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
    ) -> Result<IdDeltas, EngineError>;

    fn rename_id_deltas(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<IdDeltas, EngineError>;

    fn get_object(
        &self,
        graph: &Graph,
        board_path: &[String],
        id: &str,
    ) -> Result<Option<ObjectView>, EngineError>;

    fn get_edge(
        &self,
        graph: &Graph,
        board_path: &[String],
        id: &str,
    ) -> Result<Option<EdgeView>, EngineError>;

    /// Immediate children of `parent_id` (`""` = root); `None` if the parent is unknown.
    fn children_ids(
        &self,
        graph: &Graph,
        board_path: &[String],
        parent_id: &str,
    ) -> Result<Option<Vec<String>>, EngineError>;
}

pub trait Renderer: Send + Sync {
    fn render(&self, text: &str, format: ExportFormat, theme: Theme)
        -> Result<Vec<u8>, RenderError>;
}

/// One handle per collaborator. Cheap to clone.
#[derive(Clone)]
pub struct Backend {
    pub compiler: Arc<dyn Compiler>,
    pub formatter: Arc<dyn Formatter>,
    pub editor: Arc<dyn Editor>,
    pub renderer: Arc<dyn Renderer>,
}

impl Backend {
    pub fn builtin() -> Self {
        let engine = Arc::new(BuiltinEngine);
        Self {
            compiler: engine.clone(),
            formatter: engine.clone(),
            editor: engine,
            renderer: Arc::new(crate::render::SvgRenderer::default()),
        }
    }

    pub fn with_editor(mut self, editor: Arc<dyn Editor>) -> Self {
        self.editor = editor;
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }
}

impl Default for Backend {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
