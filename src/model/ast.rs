// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

/// Syntax tree of a diagram text, as produced by the parser and consumed by the printer.
///
/// Keys are stored as already-split segments, relative to the enclosing block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ast {
    statements: Vec<Statement>,
}

impl Ast {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Declaration(Declaration),
    Connection(Connection),
}

/// `key[: value][ { ... }]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub key: Vec<String>,
    pub value: Option<String>,
    pub block: Option<Vec<Statement>>,
}

impl Declaration {
    pub fn new(key: Vec<String>) -> Self {
        Self { key, value: None, block: None }
    }

    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    pub fn with_block(mut self, block: Option<Vec<Statement>>) -> Self {
        self.block = block;
        self
    }
}

/// `a -> b [-> c ...][: label][ { ... }]`; `arrows.len() == endpoints.len() - 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub endpoints: Vec<Vec<String>>,
    pub arrows: Vec<Arrow>,
    pub value: Option<String>,
    pub block: Option<Vec<Statement>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
    /// `->`
    Forward,
    /// `<-`
    Backward,
    /// `<->`
    Both,
    /// `--`
    Undirected,
}

impl Arrow {
    /// Longest tokens first so `<->` is not read as `<-`.
    pub const TOKENS: [(&'static str, Arrow); 4] = [
        ("<->", Arrow::Both),
        ("->", Arrow::Forward),
        ("<-", Arrow::Backward),
        ("--", Arrow::Undirected),
    ];

    pub fn token(self) -> &'static str {
        match self {
            Self::Forward => "->",
            Self::Backward => "<-",
            Self::Both => "<->",
            Self::Undirected => "--",
        }
    }

    /// `(src_arrow, dst_arrow)`
    pub fn heads(self) -> (bool, bool) {
        match self {
            Self::Forward => (false, true),
            Self::Backward => (true, false),
            Self::Both => (true, true),
            Self::Undirected => (false, false),
        }
    }

    pub fn from_heads(src_arrow: bool, dst_arrow: bool) -> Self {
        match (src_arrow, dst_arrow) {
            (false, true) => Self::Forward,
            (true, false) => Self::Backward,
            (true, true) => Self::Both,
            (false, false) => Self::Undirected,
        }
    }
}

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}
