// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use crate::format::d2::{self, refresh_ast, CompileError};
use crate::model::key::{parse_key, KeyPath};
use crate::model::{EdgeView, Graph, IdDeltas, ObjectView};

use super::{edit, Compiler, Editor, EngineError, Formatter};

/// In-process compiler, formatter and editor for the D2 subset in [`crate::format::d2`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEngine;

/// Only the root board exists.
fn check_board(board_path: &[String]) -> Result<(), EngineError> {
    if board_path.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Rejected(format!("board not found: {}", board_path.join("."))))
    }
}

/// Runs `op` on a copy of `graph` and regenerates the copy's syntax tree.
fn edit_copy<T>(
    graph: &Graph,
    board_path: &[String],
    op: impl FnOnce(&mut Graph) -> Result<T, EngineError>,
) -> Result<(Graph, T), EngineError> {
    check_board(board_path)?;
    let mut next = graph.clone();
    let out = op(&mut next)?;
    refresh_ast(&mut next);
    Ok((next, out))
}

impl Compiler for BuiltinEngine {
    fn compile(&self, text: &str) -> Result<Graph, CompileError> {
        d2::compile(text)
    }
}

impl Formatter for BuiltinEngine {
    fn format(&self, graph: &Graph) -> Option<String> {
        d2::format(graph)
    }
}

impl Editor for BuiltinEngine {
    fn create(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
    ) -> Result<(Graph, String), EngineError> {
        edit_copy(graph, board_path, |g| edit::create(g, key))
    }

    fn set(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        tag: Option<&str>,
        value: Option<&str>,
    ) -> Result<Graph, EngineError> {
        edit_copy(graph, board_path, |g| edit::set(g, key, tag, value)).map(|(g, ())| g)
    }

    fn delete(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
    ) -> Result<Graph, EngineError> {
        edit_copy(graph, board_path, |g| edit::delete(g, key)).map(|(g, ())| g)
    }

    fn move_element(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_key: &str,
        include_descendants: bool,
    ) -> Result<Graph, EngineError> {
        edit_copy(graph, board_path, |g| edit::move_element(g, key, new_key, include_descendants))
            .map(|(g, ())| g)
    }

    fn rename(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<(Graph, String), EngineError> {
        edit_copy(graph, board_path, |g| edit::rename(g, key, new_name))
    }

    fn delete_id_deltas(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
    ) -> Result<IdDeltas, EngineError> {
        check_board(board_path)?;
        edit::delete_id_deltas(graph, key)
    }

    fn rename_id_deltas(
        &self,
        graph: &Graph,
        board_path: &[String],
        key: &str,
        new_name: &str,
    ) -> Result<IdDeltas, EngineError> {
        check_board(board_path)?;
        edit::rename_id_deltas(graph, key, new_name)
    }

    fn get_object(
        &self,
        graph: &Graph,
        board_path: &[String],
        id: &str,
    ) -> Result<Option<ObjectView>, EngineError> {
        check_board(board_path)?;
        Ok(graph.object(id.trim()).map(ObjectView::from_object))
    }

    fn get_edge(
        &self,
        graph: &Graph,
        board_path: &[String],
        id: &str,
    ) -> Result<Option<EdgeView>, EngineError> {
        check_board(board_path)?;
        let id = id.trim();

        // Public ids first (`a->b`, positional fallbacks), then editor keys (`(a -> b)[1]`).
        let index = graph.find_edge(id).or_else(|| match parse_key(id) {
            Ok(KeyPath::Edge(edge)) if edge.attribute.is_empty() => {
                graph.nth_edge(&edge.src_id(), &edge.dst_id(), edge.index.unwrap_or(0))
            }
            _ => None,
        });

        Ok(index.and_then(|index| {
            let public_id = graph.edge_public_id(index)?;
            graph.edges().get(index).map(|edge| EdgeView::from_edge(public_id, edge))
        }))
    }

    fn children_ids(
        &self,
        graph: &Graph,
        board_path: &[String],
        parent_id: &str,
    ) -> Result<Option<Vec<String>>, EngineError> {
        check_board(board_path)?;
        let parent_id = parent_id.trim();
        if parent_id.is_empty() {
            return Ok(Some(graph.children_ids(None)));
        }
        Ok(graph.contains_object(parent_id).then(|| graph.children_ids(Some(parent_id))))
    }
}
