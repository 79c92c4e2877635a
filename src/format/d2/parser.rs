// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use thiserror::Error;

use crate::model::ast::{Ast, Connection, Declaration, Statement};
use crate::model::key::{split_chain, split_segments};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },
    #[error("{key}: {message}")]
    Semantic { key: String, message: String },
}

impl CompileError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax { line, message: message.into() }
    }

    pub(crate) fn semantic(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Semantic { key: key.into(), message: message.into() }
    }
}

struct OpenBlock {
    head: Statement,
    children: Vec<Statement>,
    line_no: usize,
}

pub fn parse(input: &str) -> Result<Ast, CompileError> {
    let mut root: Vec<Statement> = Vec::new();
    let mut open: Vec<OpenBlock> = Vec::new();

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        for piece in split_statements(trimmed, line_no)? {
            if piece == "}" {
                let Some(block) = open.pop() else {
                    return Err(CompileError::syntax(line_no, "unexpected '}'"));
                };
                let head = close_block(block.head, block.children);
                current(&mut root, &mut open).push(head);
                continue;
            }

            let (statement, opens_block) = parse_statement(piece, line_no)?;
            if opens_block {
                open.push(OpenBlock { head: statement, children: Vec::new(), line_no });
            } else {
                current(&mut root, &mut open).push(statement);
            }
        }
    }

    if let Some(block) = open.last() {
        return Err(CompileError::syntax(
            block.line_no,
            "block is never closed (missing '}')",
        ));
    }

    Ok(Ast::new(root))
}

fn current<'a>(root: &'a mut Vec<Statement>, open: &'a mut [OpenBlock]) -> &'a mut Vec<Statement> {
    match open.last_mut() {
        Some(block) => &mut block.children,
        None => root,
    }
}

fn close_block(head: Statement, children: Vec<Statement>) -> Statement {
    match head {
        Statement::Declaration(decl) => Statement::Declaration(decl.with_block(Some(children))),
        Statement::Connection(mut conn) => {
            conn.block = Some(children);
            Statement::Connection(conn)
        }
    }
}

/// Splits a line on `;` outside quoted values, also separating a leading `}`.
fn split_statements(line: &str, line_no: usize) -> Result<Vec<&str>, CompileError> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;

    for (idx, ch) in line.char_indices() {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ';' => {
                pieces.push(&line[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    if in_quotes {
        return Err(CompileError::syntax(line_no, "unterminated quoted string"));
    }
    pieces.push(&line[start..]);

    let mut out = Vec::new();
    for piece in pieces {
        let mut piece = piece.trim();
        while let Some(rest) = piece.strip_prefix('}') {
            out.push("}");
            piece = rest.trim_start();
        }
        if !piece.is_empty() {
            out.push(piece);
        }
    }
    Ok(out)
}

/// Byte offset of the first `:` that is not inside quotes.
fn find_colon(statement: &str) -> Option<usize> {
    let mut in_quotes = false;
    let mut escaped = false;
    for (idx, ch) in statement.char_indices() {
        if in_quotes {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quotes = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_quotes = true,
            ':' => return Some(idx),
            _ => {}
        }
    }
    None
}

enum BlockMarker {
    None,
    Empty,
    Open,
}

fn strip_block_marker(statement: &str) -> (&str, BlockMarker) {
    if let Some(rest) = statement.strip_suffix("{}") {
        return (rest.trim_end(), BlockMarker::Empty);
    }
    if let Some(rest) = statement.strip_suffix('{') {
        return (rest.trim_end(), BlockMarker::Open);
    }
    (statement, BlockMarker::None)
}

fn parse_statement(statement: &str, line_no: usize) -> Result<(Statement, bool), CompileError> {
    let (body, marker) = strip_block_marker(statement);

    let (key_raw, value) = match find_colon(body) {
        Some(idx) => (&body[..idx], parse_value(body[idx + 1..].trim(), line_no)?),
        None => (body, None),
    };

    let block = match marker {
        BlockMarker::Empty => Some(Vec::new()),
        BlockMarker::None | BlockMarker::Open => None,
    };
    let opens = matches!(marker, BlockMarker::Open);

    let key_raw = key_raw.trim();
    if key_raw.is_empty() {
        return Err(CompileError::syntax(line_no, format!("missing key in '{statement}'")));
    }

    if let Some((endpoints_raw, arrows)) = split_chain(key_raw) {
        let endpoints = endpoints_raw
            .into_iter()
            .map(|endpoint| {
                split_segments(endpoint).map_err(|err| {
                    CompileError::syntax(line_no, format!("invalid endpoint: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let conn = Connection { endpoints, arrows, value, block };
        return Ok((Statement::Connection(conn), opens));
    }

    let key = split_segments(key_raw)
        .map_err(|err| CompileError::syntax(line_no, format!("invalid key: {err}")))?;
    let decl = Declaration::new(key).with_value(value).with_block(block);
    Ok((Statement::Declaration(decl), opens))
}

fn parse_value(raw: &str, line_no: usize) -> Result<Option<String>, CompileError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let Some(inner) = raw.strip_prefix('"') else {
        return Ok(Some(raw.to_owned()));
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                let trailing: String = chars.collect();
                if !trailing.trim().is_empty() {
                    return Err(CompileError::syntax(
                        line_no,
                        format!("unexpected text after quoted value: '{}'", trailing.trim()),
                    ));
                }
                return Ok(Some(out));
            }
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => break,
            },
            _ => out.push(ch),
        }
    }
    Err(CompileError::syntax(line_no, "unterminated quoted string"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ast::Arrow;

    fn decl(statement: &Statement) -> &Declaration {
        match statement {
            Statement::Declaration(decl) => decl,
            Statement::Connection(_) => panic!("expected declaration, got {statement:?}"),
        }
    }

    #[test]
    fn parses_nested_blocks_and_semicolons() {
        let ast = parse("parent: {\n  child1; child2\n}\nstandalone").unwrap();
        assert_eq!(ast.statements().len(), 2);

        let parent = decl(&ast.statements()[0]);
        assert_eq!(parent.key, vec!["parent"]);
        assert_eq!(parent.value, None);
        let children = parent.block.as_ref().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(decl(&children[1]).key, vec!["child2"]);
    }

    #[test]
    fn quoted_values_keep_syntax_characters() {
        let ast = parse(r#"a: "x: {y}; \"z\"""#).unwrap();
        assert_eq!(decl(&ast.statements()[0]).value.as_deref(), Some(r#"x: {y}; "z""#));
    }

    #[test]
    fn empty_quoted_value_is_not_absent() {
        let ast = parse("a: \"\"\nb").unwrap();
        assert_eq!(decl(&ast.statements()[0]).value.as_deref(), Some(""));
        assert_eq!(decl(&ast.statements()[1]).value, None);
    }

    #[test]
    fn connections_with_label_and_block() {
        let ast = parse("a -> b <- c: flows {\n  style.stroke: red\n}").unwrap();
        let Statement::Connection(conn) = &ast.statements()[0] else {
            panic!("expected connection");
        };
        assert_eq!(conn.endpoints.len(), 3);
        assert_eq!(conn.arrows, vec![Arrow::Forward, Arrow::Backward]);
        assert_eq!(conn.value.as_deref(), Some("flows"));
        assert_eq!(conn.block.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn comments_and_inline_closers() {
        let ast = parse("# heading\na: {\n b: {\n  c\n }}\n").unwrap();
        assert_eq!(ast.statements().len(), 1);
    }

    #[test]
    fn structural_errors_report_lines() {
        assert_eq!(
            parse("a: {\n b").unwrap_err(),
            CompileError::syntax(1, "block is never closed (missing '}')")
        );
        assert_eq!(parse("a\n}").unwrap_err(), CompileError::syntax(2, "unexpected '}'"));
        assert!(matches!(parse("a: \"open").unwrap_err(), CompileError::Syntax { line: 1, .. }));
        assert!(matches!(parse("a..b").unwrap_err(), CompileError::Syntax { line: 1, .. }));
        assert!(matches!(parse("-> b").unwrap_err(), CompileError::Syntax { line: 1, .. }));
    }
}
