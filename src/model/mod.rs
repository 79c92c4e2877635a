// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model: ids, key paths, the structural graph and its public view.

pub mod ast;
pub mod attr;
pub mod graph;
pub mod ids;
pub mod key;
pub mod view;

pub use ast::{Arrow, Ast, Connection, Declaration, Statement};
pub use graph::{Graph, GraphEdge, GraphObject, IdDeltas};
pub use ids::{DiagramId, Id, IdError};
pub use key::{parse_key, EdgeKey, KeyError, KeyPath};
pub use view::{AttrValue, EdgeView, GraphView, ObjectView};
