// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::ast::{Arrow, Ast};
use super::attr::{DEFAULT_SHAPE, LABEL, SHAPE};
use super::key::{edge_id, is_within, leaf_name, parent_id};

/// Old id -> new id, where `""` means the element is gone.
pub type IdDeltas = BTreeMap<String, String>;

/// Compiled structural snapshot of one diagram.
///
/// Objects are keyed by their absolute dotted id and kept in declaration order,
/// which is also the order children are reported and printed in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Graph {
    objects: IndexMap<String, GraphObject>,
    edges: Vec<GraphEdge>,
    board_attributes: BTreeMap<String, String>,
    ast: Option<Ast>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> impl Iterator<Item = &GraphObject> {
        self.objects.values()
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn object(&self, id: &str) -> Option<&GraphObject> {
        self.objects.get(id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut GraphObject> {
        self.objects.get_mut(id)
    }

    pub fn contains_object(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// Declares `id` and any missing ancestors. Returns `true` if `id` itself was new.
    pub fn ensure_object(&mut self, id: &str) -> bool {
        if self.objects.contains_key(id) {
            return false;
        }
        let parent = parent_id(id).map(str::to_owned);
        if let Some(parent) = parent.as_deref() {
            self.ensure_object(parent);
        }
        self.objects.insert(id.to_owned(), GraphObject::new(id.to_owned(), parent));
        true
    }

    /// Immediate children of `parent` (`None` = root), in declaration order.
    pub fn children_ids(&self, parent: Option<&str>) -> Vec<String> {
        self.objects
            .values()
            .filter(|object| object.parent() == parent)
            .map(|object| object.id().to_owned())
            .collect()
    }

    /// Every object strictly below `id`, in declaration order.
    pub fn descendant_ids(&self, id: &str) -> Vec<String> {
        self.objects
            .keys()
            .filter(|candidate| candidate.as_str() != id && is_within(candidate, id))
            .cloned()
            .collect()
    }

    /// Removes the given objects and every edge touching one of them.
    /// Returns the removed edges' positions (ascending, pre-removal).
    pub fn remove_objects(&mut self, ids: &[String]) -> Vec<usize> {
        for id in ids {
            self.objects.shift_remove(id.as_str());
        }

        let mut removed = Vec::new();
        let mut position = 0;
        self.edges.retain(|edge| {
            let keep = !ids.iter().any(|id| edge.src == *id || edge.dst == *id);
            if !keep {
                removed.push(position);
            }
            position += 1;
            keep
        });
        removed
    }

    /// Re-keys every object and edge endpoint through `remap`, preserving order.
    /// `remap` returns `None` for ids that keep their value.
    pub fn remap_ids(&mut self, remap: impl Fn(&str) -> Option<String>) {
        let apply = |id: &str| remap(id).unwrap_or_else(|| id.to_owned());

        let objects = std::mem::take(&mut self.objects);
        self.objects = objects
            .into_values()
            .map(|mut object| {
                object.id = apply(&object.id);
                object.parent = parent_id(&object.id).map(str::to_owned);
                (object.id.clone(), object)
            })
            .collect();

        for edge in &mut self.edges {
            edge.src = apply(&edge.src);
            edge.dst = apply(&edge.dst);
        }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn edge_mut(&mut self, index: usize) -> Option<&mut GraphEdge> {
        self.edges.get_mut(index)
    }

    /// Appends an edge and returns its position among edges between the same endpoints.
    pub fn push_edge(&mut self, edge: GraphEdge) -> usize {
        let ordinal = self.edges_between(&edge.src, &edge.dst).count();
        self.edges.push(edge);
        ordinal
    }

    pub fn remove_edge(&mut self, index: usize) -> Option<GraphEdge> {
        (index < self.edges.len()).then(|| self.edges.remove(index))
    }

    /// Positions (in `edges()`) of every edge from `src` to `dst`.
    pub fn edges_between<'a>(
        &'a self,
        src: &'a str,
        dst: &'a str,
    ) -> impl Iterator<Item = usize> + 'a {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, edge)| edge.src == src && edge.dst == dst)
            .map(|(index, _)| index)
    }

    /// Position of the `ordinal`-th edge from `src` to `dst`.
    pub fn nth_edge(&self, src: &str, dst: &str, ordinal: usize) -> Option<usize> {
        self.edges_between(src, dst).nth(ordinal)
    }

    /// Public id of the edge at `index`: `src->dst`, or the position when an
    /// endpoint does not resolve to an object.
    pub fn edge_public_id(&self, index: usize) -> Option<String> {
        let edge = self.edges.get(index)?;
        if self.contains_object(&edge.src) && self.contains_object(&edge.dst) {
            Some(edge.id())
        } else {
            Some(index.to_string())
        }
    }

    /// Resolves a public edge id (`a->b` or a positional fallback) to a position.
    pub fn find_edge(&self, public_id: &str) -> Option<usize> {
        (0..self.edges.len())
            .find(|index| self.edge_public_id(*index).as_deref() == Some(public_id))
    }

    pub fn board_attributes(&self) -> &BTreeMap<String, String> {
        &self.board_attributes
    }

    pub fn board_attributes_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.board_attributes
    }

    /// Syntax tree the formatter prints from; `None` means "no structured form".
    pub fn ast(&self) -> Option<&Ast> {
        self.ast.as_ref()
    }

    pub fn set_ast(&mut self, ast: Option<Ast>) {
        self.ast = ast;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphObject {
    id: String,
    parent: Option<String>,
    attributes: BTreeMap<String, String>,
}

impl GraphObject {
    pub fn new(id: String, parent: Option<String>) -> Self {
        Self { id, parent, attributes: BTreeMap::new() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        leaf_name(&self.id)
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Explicit label, or the object's own name.
    pub fn label(&self) -> &str {
        self.attributes.get(LABEL).map_or_else(|| self.name(), String::as_str)
    }

    pub fn shape(&self) -> &str {
        self.attributes.get(SHAPE).map_or(DEFAULT_SHAPE, String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match value {
            Some(value) => {
                self.attributes.insert(name, value);
            }
            None => {
                self.attributes.remove(&name);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphEdge {
    src: String,
    dst: String,
    arrow: Arrow,
    attributes: BTreeMap<String, String>,
}

impl GraphEdge {
    pub fn new(src: impl Into<String>, dst: impl Into<String>, arrow: Arrow) -> Self {
        Self { src: src.into(), dst: dst.into(), arrow, attributes: BTreeMap::new() }
    }

    pub fn id(&self) -> String {
        edge_id(&self.src, &self.dst)
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn dst(&self) -> &str {
        &self.dst
    }

    pub fn arrow(&self) -> Arrow {
        self.arrow
    }

    pub fn src_arrow(&self) -> bool {
        self.arrow.heads().0
    }

    pub fn dst_arrow(&self) -> bool {
        self.arrow.heads().1
    }

    pub fn label(&self) -> Option<&str> {
        self.attributes.get(LABEL).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: Option<String>) {
        let name = name.into();
        match value {
            Some(value) => {
                self.attributes.insert(name, value);
            }
            None => {
                self.attributes.remove(&name);
            }
        }
    }
}
