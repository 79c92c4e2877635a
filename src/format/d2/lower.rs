// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Syntax tree -> [`Graph`].

use crate::model::ast::{Ast, Connection, Declaration, Statement};
use crate::model::attr::{
    first_reserved, validate_attribute_name, validate_attribute_value,
    validate_edge_attribute_name, STYLE,
};
use crate::model::graph::{Graph, GraphEdge};

use super::parser::CompileError;

#[derive(Debug, Clone)]
enum Scope {
    Root,
    Object(String),
    /// Positions of every edge declared by one (possibly chained) connection.
    Edges(Vec<usize>),
}

impl Scope {
    fn absolute(&self, segments: &[String]) -> String {
        match self {
            Self::Object(prefix) if !segments.is_empty() => {
                format!("{prefix}.{}", segments.join("."))
            }
            Self::Object(prefix) => prefix.clone(),
            Self::Root | Self::Edges(_) => segments.join("."),
        }
    }
}

/// Lowers a parsed syntax tree into a graph that keeps `ast` as its printable form.
pub fn lower(ast: Ast) -> Result<Graph, CompileError> {
    let mut graph = Graph::new();
    lower_block(&mut graph, ast.statements(), &Scope::Root)?;
    graph.set_ast(Some(ast));
    Ok(graph)
}

fn lower_block(
    graph: &mut Graph,
    statements: &[Statement],
    scope: &Scope,
) -> Result<(), CompileError> {
    for statement in statements {
        match statement {
            Statement::Declaration(decl) => lower_declaration(graph, decl, scope)?,
            Statement::Connection(conn) => lower_connection(graph, conn, scope)?,
        }
    }
    Ok(())
}

fn lower_declaration(
    graph: &mut Graph,
    decl: &Declaration,
    scope: &Scope,
) -> Result<(), CompileError> {
    if let Scope::Edges(indices) = scope {
        return lower_edge_attribute(graph, indices, &decl.key, decl);
    }

    let Some(split) = first_reserved(&decl.key) else {
        let id = scope.absolute(&decl.key);
        graph.ensure_object(&id);
        if let Some(label) = &decl.value {
            set_object_attribute(graph, &id, "label", label)?;
        }
        if let Some(block) = &decl.block {
            lower_block(graph, block, &Scope::Object(id))?;
        }
        return Ok(());
    };

    let (object_path, attribute_path) = decl.key.split_at(split);
    let target = match scope {
        Scope::Root if object_path.is_empty() => None,
        _ => Some(scope.absolute(object_path)),
    };

    if attribute_path.len() == 1 && attribute_path[0] == STYLE && decl.value.is_none() {
        let Some(block) = &decl.block else {
            return Err(CompileError::semantic(
                decl.key.join("."),
                "style requires a block or a property",
            ));
        };
        for entry in block {
            let Statement::Declaration(entry) = entry else {
                return Err(CompileError::semantic(
                    decl.key.join("."),
                    "connections are not allowed inside style",
                ));
            };
            let mut path = vec![STYLE.to_owned()];
            path.extend(entry.key.iter().cloned());
            set_attribute(graph, target.as_deref(), &path, entry)?;
        }
        return Ok(());
    }

    if decl.block.as_ref().is_some_and(|block| !block.is_empty()) {
        return Err(CompileError::semantic(decl.key.join("."), "attributes cannot open a block"));
    }
    set_attribute(graph, target.as_deref(), attribute_path, decl)
}

fn set_attribute(
    graph: &mut Graph,
    target: Option<&str>,
    attribute_path: &[String],
    decl: &Declaration,
) -> Result<(), CompileError> {
    let key = decl.key.join(".");
    let name =
        validate_attribute_name(attribute_path).map_err(|err| CompileError::semantic(&key, err))?;
    let Some(value) = decl.value.as_deref() else {
        return Err(CompileError::semantic(key, format!("{name} requires a value")));
    };
    validate_attribute_value(&name, value).map_err(|err| CompileError::semantic(&key, err))?;

    match target {
        Some(id) => {
            graph.ensure_object(id);
            set_object_attribute(graph, id, &name, value)
        }
        None => {
            graph.board_attributes_mut().insert(name, value.to_owned());
            Ok(())
        }
    }
}

fn set_object_attribute(
    graph: &mut Graph,
    id: &str,
    name: &str,
    value: &str,
) -> Result<(), CompileError> {
    let object = graph
        .object_mut(id)
        .ok_or_else(|| CompileError::semantic(id, "object was not declared"))?;
    object.set_attribute(name, Some(value.to_owned()));
    Ok(())
}

fn lower_connection(
    graph: &mut Graph,
    conn: &Connection,
    scope: &Scope,
) -> Result<(), CompileError> {
    if matches!(scope, Scope::Edges(_)) {
        return Err(CompileError::semantic(
            conn.endpoints.iter().map(|e| e.join(".")).collect::<Vec<_>>().join(" -> "),
            "connections cannot be nested inside a connection",
        ));
    }

    let endpoints: Vec<String> =
        conn.endpoints.iter().map(|segments| scope.absolute(segments)).collect();
    for endpoint in &endpoints {
        if first_reserved(&endpoint.split('.').map(str::to_owned).collect::<Vec<_>>()).is_some() {
            return Err(CompileError::semantic(
                endpoint,
                "connection endpoints cannot be attributes",
            ));
        }
        graph.ensure_object(endpoint);
    }

    let mut indices = Vec::with_capacity(conn.arrows.len());
    for (hop, arrow) in conn.arrows.iter().enumerate() {
        let mut edge = GraphEdge::new(endpoints[hop].clone(), endpoints[hop + 1].clone(), *arrow);
        if let Some(label) = &conn.value {
            edge.set_attribute("label", Some(label.clone()));
        }
        graph.push_edge(edge);
        indices.push(graph.edges().len() - 1);
    }

    if let Some(block) = &conn.block {
        lower_block(graph, block, &Scope::Edges(indices))?;
    }
    Ok(())
}

fn lower_edge_attribute(
    graph: &mut Graph,
    indices: &[usize],
    path: &[String],
    decl: &Declaration,
) -> Result<(), CompileError> {
    let key = path.join(".");

    if path.len() == 1 && path[0] == STYLE && decl.value.is_none() {
        for entry in decl.block.iter().flatten() {
            let Statement::Declaration(entry) = entry else {
                return Err(CompileError::semantic(
                    &key,
                    "connections are not allowed inside style",
                ));
            };
            let mut nested = vec![STYLE.to_owned()];
            nested.extend(entry.key.iter().cloned());
            lower_edge_attribute(graph, indices, &nested, entry)?;
        }
        return Ok(());
    }

    let name = validate_attribute_name(path).map_err(|err| CompileError::semantic(&key, err))?;
    validate_edge_attribute_name(&name).map_err(|err| CompileError::semantic(&key, err))?;
    let Some(value) = decl.value.as_deref() else {
        return Err(CompileError::semantic(key, format!("{name} requires a value")));
    };
    validate_attribute_value(&name, value).map_err(|err| CompileError::semantic(&key, err))?;

    for index in indices {
        if let Some(edge) = graph.edge_mut(*index) {
            edge.set_attribute(name.clone(), Some(value.to_owned()));
        }
    }
    Ok(())
}
