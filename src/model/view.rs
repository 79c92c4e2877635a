// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Public, serializable projection of a [`Graph`].

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::graph::{Graph, GraphEdge, GraphObject};

pub const SRC_ARROW: &str = "src_arrow";
pub const DST_ARROW: &str = "dst_arrow";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AttrValue {
    Bool(bool),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ObjectView {
    pub id: String,
    pub label: String,
    pub shape: String,
    pub parent: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl ObjectView {
    pub fn from_object(object: &GraphObject) -> Self {
        Self {
            id: object.id().to_owned(),
            label: object.label().to_owned(),
            shape: object.shape().to_owned(),
            parent: object.parent().map(str::to_owned),
            attributes: object.attributes().clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EdgeView {
    pub id: String,
    pub from: String,
    pub to: String,
    pub label: Option<String>,
    /// Edge attributes plus the `src_arrow`/`dst_arrow` head flags.
    pub attributes: BTreeMap<String, AttrValue>,
}

impl EdgeView {
    pub fn from_edge(id: String, edge: &GraphEdge) -> Self {
        let mut attributes: BTreeMap<String, AttrValue> = edge
            .attributes()
            .iter()
            .map(|(name, value)| (name.clone(), AttrValue::Text(value.clone())))
            .collect();
        attributes.insert(SRC_ARROW.to_owned(), AttrValue::Bool(edge.src_arrow()));
        attributes.insert(DST_ARROW.to_owned(), AttrValue::Bool(edge.dst_arrow()));

        Self {
            id,
            from: edge.src().to_owned(),
            to: edge.dst().to_owned(),
            label: edge.label().map(str::to_owned),
            attributes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct GraphView {
    pub objects: Vec<ObjectView>,
    pub edges: Vec<EdgeView>,
}

impl GraphView {
    pub fn from_graph(graph: &Graph) -> Self {
        let objects = graph.objects().map(ObjectView::from_object).collect();
        let edges = graph
            .edges()
            .iter()
            .enumerate()
            .map(|(index, edge)| {
                let id = graph.edge_public_id(index).unwrap_or_else(|| index.to_string());
                EdgeView::from_edge(id, edge)
            })
            .collect();
        Self { objects, edges }
    }

    pub fn object(&self, id: &str) -> Option<&ObjectView> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeView> {
        self.edges.iter().find(|edge| edge.id == id)
    }
}
