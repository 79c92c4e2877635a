// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt::Write as _;

use crate::model::ast::{Ast, Connection, Declaration, Statement};

const INDENT: &str = "  ";
const QUOTE_TRIGGERS: &[char] = &[';', '{', '}', '#', '"', '\\', '\n', '\t'];

pub fn print(ast: &Ast) -> String {
    let mut out = String::new();
    print_block(&mut out, ast.statements(), 0);
    out
}

fn print_block(out: &mut String, statements: &[Statement], depth: usize) {
    for statement in statements {
        match statement {
            Statement::Declaration(decl) => print_declaration(out, decl, depth),
            Statement::Connection(conn) => print_connection(out, conn, depth),
        }
    }
}

fn print_declaration(out: &mut String, decl: &Declaration, depth: usize) {
    push_indent(out, depth);
    out.push_str(&decl.key.join("."));
    print_tail(out, decl.value.as_deref(), decl.block.as_deref(), depth);
}

fn print_connection(out: &mut String, conn: &Connection, depth: usize) {
    push_indent(out, depth);
    for (idx, endpoint) in conn.endpoints.iter().enumerate() {
        if idx > 0 {
            if let Some(arrow) = conn.arrows.get(idx - 1) {
                let _ = write!(out, " {arrow} ");
            }
        }
        out.push_str(&endpoint.join("."));
    }
    print_tail(out, conn.value.as_deref(), conn.block.as_deref(), depth);
}

fn print_tail(out: &mut String, value: Option<&str>, block: Option<&[Statement]>, depth: usize) {
    if let Some(value) = value {
        out.push_str(": ");
        out.push_str(&quote_value(value));
    }
    match block {
        Some([]) => out.push_str(if value.is_some() { " {}\n" } else { ": {}\n" }),
        Some(children) => {
            out.push_str(if value.is_some() { " {\n" } else { ": {\n" });
            print_block(out, children, depth + 1);
            push_indent(out, depth);
            out.push_str("}\n");
        }
        None => out.push('\n'),
    }
}

fn push_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Values are written bare unless they would not read back unchanged.
pub fn quote_value(value: &str) -> String {
    let needs_quotes =
        value.is_empty() || value.trim() != value || value.contains(QUOTE_TRIGGERS);
    if !needs_quotes {
        return value.to_owned();
    }

    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}
