// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! A D2-compatible subset: declarations, nested blocks, reserved attributes and
//! connections (`->`, `<-`, `<->`, `--`).

mod canonical;
mod lower;
mod parser;
mod printer;

pub use canonical::{canonical_ast, refresh_ast};
pub use lower::lower;
pub use parser::{parse, CompileError};
pub use printer::{print, quote_value};

use crate::model::graph::Graph;

/// Text -> graph; the graph keeps the parsed tree for formatting.
pub fn compile(text: &str) -> Result<Graph, CompileError> {
    lower(parse(text)?)
}

/// Graph -> text, or `None` when the graph carries no syntax tree.
pub fn format(graph: &Graph) -> Option<String> {
    graph.ast().map(print)
}
