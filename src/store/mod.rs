// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! In-memory diagram records and their edit sessions.
//!
//! The store maps diagram ids to their last formatted text and compiled graph, applies
//! structural edits through the engine collaborators, and recovers connection deletes the
//! engine cannot perform by patching the text and recompiling.

pub mod diagram_store;

pub use diagram_store::{
    DiagramStore, DiagramSummary, EditSession, ErrorKind, SessionError, DEFAULT_OUTPUT_DIR_NAME,
};
