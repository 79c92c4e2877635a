// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural edit operations.
//!
//! An [`EditRequest`] names a diagram, a board path, a key and one [`EditOperation`]. Requests
//! are validated before they touch any state; the store applies them and answers with an
//! [`EditResult`] carrying the key the engine actually used, the identifier deltas and a
//! snapshot of the resulting graph.

use std::fmt;

use crate::model::{Arrow, DiagramId, GraphView, IdDeltas, IdError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOperation {
    Create,
    Set { tag: Option<String>, value: Option<String> },
    Delete,
    Move { new_key: String, include_descendants: bool },
    Rename { new_name: String },
}

impl EditOperation {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Set { .. } => "set",
            Self::Delete => "delete",
            Self::Move { .. } => "move",
            Self::Rename { .. } => "rename",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    pub diagram_id: String,
    pub board_path: Vec<String>,
    pub key: String,
    pub operation: EditOperation,
}

impl EditRequest {
    pub fn new(
        diagram_id: impl Into<String>,
        key: impl Into<String>,
        operation: EditOperation,
    ) -> Self {
        Self {
            diagram_id: diagram_id.into(),
            board_path: Vec::new(),
            key: key.into(),
            operation,
        }
    }

    pub fn with_board_path(mut self, board_path: Vec<String>) -> Self {
        self.board_path = board_path;
        self
    }

    /// Checks required fields and returns the typed diagram id.
    pub fn validate(&self) -> Result<DiagramId, ValidationError> {
        let diagram_id = parse_diagram_id(&self.diagram_id)?;
        if self.key.trim().is_empty() {
            return Err(ValidationError::MissingKey);
        }
        match &self.operation {
            EditOperation::Move { new_key, .. } if new_key.trim().is_empty() => {
                Err(ValidationError::MissingNewKey)
            }
            EditOperation::Rename { new_name } if new_name.trim().is_empty() => {
                Err(ValidationError::MissingNewName)
            }
            _ => Ok(diagram_id),
        }
    }
}

pub fn parse_diagram_id(raw: &str) -> Result<DiagramId, ValidationError> {
    DiagramId::new(raw.trim()).map_err(ValidationError::DiagramId)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DiagramId(IdError),
    MissingKey,
    MissingNewKey,
    MissingNewName,
    MissingText,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DiagramId(err) => write!(f, "{err}"),
            Self::MissingKey => f.write_str("element key is required"),
            Self::MissingNewKey => f.write_str("new key is required"),
            Self::MissingNewName => f.write_str("new name is required"),
            Self::MissingText => f.write_str("diagram content is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    pub success: bool,
    pub requested_key: String,
    pub new_key: String,
    pub id_deltas: IdDeltas,
    pub graph: GraphView,
}

impl EditResult {
    /// `true` when the engine assigned a different key than the one requested.
    pub fn key_adjusted(&self) -> bool {
        self.new_key != self.requested_key
    }
}

// Text-level patch used when the engine cannot delete a connection.
include!("fallback_impl.rs");
