// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::model::{EdgeView, GraphView, ObjectView};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramCreateParams {
    pub diagram_id: String,
    /// Diagram source text.
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DiagramCreateResponse {
    pub diagram_id: String,
    pub graph: GraphView,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct McpDiagramSummary {
    pub diagram_id: String,
    pub objects: u64,
    pub edges: u64,
    pub has_session: bool,
    /// Unix milliseconds of the last committed edit.
    pub last_modified_ms: Option<u64>,
    pub history_len: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ListDiagramsResponse {
    pub diagrams: Vec<McpDiagramSummary>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct DiagramIdParams {
    pub diagram_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SerializeResponse {
    pub diagram_id: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ExportParams {
    pub diagram_id: String,
    /// `svg` (default), `png` or `pdf`.
    pub format: Option<String>,
    pub theme: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderedOutput {
    pub format: String,
    pub mime_type: String,
    /// SVG markup, or a `data:` URL for binary formats.
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExportResponse {
    pub diagram_id: String,
    pub output: RenderedOutput,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SaveParams {
    pub diagram_id: String,
    pub format: Option<String>,
    pub theme: Option<i64>,
    /// Target file; defaults to `<output_dir>/<diagram_id>_<unix-secs>.<ext>`.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SaveResponse {
    pub diagram_id: String,
    pub path: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenderParams {
    pub content: String,
    pub format: Option<String>,
    pub theme: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct RenderToFileParams {
    pub content: String,
    pub format: Option<String>,
    pub theme: Option<i64>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenderToFileResponse {
    pub path: String,
    pub format: String,
    pub bytes: u64,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ElementParams {
    pub diagram_id: String,
    /// Nested board path; empty for the root board.
    #[serde(default)]
    pub board_path: Vec<String>,
    pub key: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ElementSetParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    pub key: String,
    /// Optional attribute prefix, e.g. `style`.
    pub tag: Option<String>,
    /// New value; `null` clears the attribute.
    pub value: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ElementMoveParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    pub key: String,
    /// Target container id; `""` moves to the root.
    pub new_parent: String,
    /// Defaults to `true`.
    pub include_descendants: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ElementRenameParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    pub key: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EditResponse {
    pub success: bool,
    pub requested_key: String,
    pub new_key: String,
    /// `true` when the engine picked a different key than requested.
    pub key_adjusted: bool,
    /// Old id to new id; an empty new id means the element was removed.
    pub id_deltas: BTreeMap<String, String>,
    pub graph: GraphView,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ObjectReadParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    pub object_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectReadResponse {
    pub object: ObjectView,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EdgeReadParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    pub edge_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EdgeReadResponse {
    pub edge: EdgeView,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ObjectChildrenParams {
    pub diagram_id: String,
    #[serde(default)]
    pub board_path: Vec<String>,
    /// Parent object id; omitted or `""` lists root objects.
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ObjectChildrenResponse {
    pub parent_id: String,
    pub children: Vec<String>,
}
