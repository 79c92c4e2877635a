// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Regenerates a syntax tree from a graph after structural edits.
//!
//! Layout: board attributes, then the object tree (attributes before children,
//! `label` folded into `name: label`), then every edge at root with absolute ids.

use crate::model::ast::{Ast, Connection, Declaration, Statement};
use crate::model::attr::LABEL;
use crate::model::graph::{Graph, GraphObject};

fn segments(path: &str) -> Vec<String> {
    path.split('.').map(str::to_owned).collect()
}

fn attribute_statements<'a>(
    attributes: impl Iterator<Item = (&'a String, &'a String)>,
) -> Vec<Statement> {
    attributes
        .filter(|(name, _)| name.as_str() != LABEL)
        .map(|(name, value)| {
            Statement::Declaration(Declaration::new(segments(name)).with_value(Some(value.clone())))
        })
        .collect()
}

fn object_statement(graph: &Graph, object: &GraphObject) -> Statement {
    let mut body = attribute_statements(object.attributes().iter());
    for child in graph.children_ids(Some(object.id())) {
        if let Some(child) = graph.object(&child) {
            body.push(object_statement(graph, child));
        }
    }

    let decl = Declaration::new(vec![object.name().to_owned()])
        .with_value(object.attribute(LABEL).map(str::to_owned))
        .with_block((!body.is_empty()).then_some(body));
    Statement::Declaration(decl)
}

pub fn canonical_ast(graph: &Graph) -> Ast {
    let mut statements: Vec<Statement> = graph
        .board_attributes()
        .iter()
        .map(|(name, value)| {
            Statement::Declaration(Declaration::new(segments(name)).with_value(Some(value.clone())))
        })
        .collect();

    for root in graph.children_ids(None) {
        if let Some(object) = graph.object(&root) {
            statements.push(object_statement(graph, object));
        }
    }

    for edge in graph.edges() {
        let body = attribute_statements(edge.attributes().iter());
        statements.push(Statement::Connection(Connection {
            endpoints: vec![segments(edge.src()), segments(edge.dst())],
            arrows: vec![edge.arrow()],
            value: edge.label().map(str::to_owned),
            block: (!body.is_empty()).then_some(body),
        }));
    }

    Ast::new(statements)
}

/// Replaces the graph's syntax tree with its canonical regeneration.
pub fn refresh_ast(graph: &mut Graph) {
    let ast = canonical_ast(graph);
    graph.set_ast(Some(ast));
}
