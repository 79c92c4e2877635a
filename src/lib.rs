// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Trellis: incremental diagram editing sessions served over MCP.
//!
//! Diagrams are loaded from text into a [`store::DiagramStore`], edited structurally
//! (create, set, delete, move, rename) through the [`engine`] collaborators, and written back
//! as canonical text or rendered output.

pub mod engine;
pub mod format;
pub mod mcp;
pub mod model;
pub mod ops;
pub mod render;
pub mod store;
