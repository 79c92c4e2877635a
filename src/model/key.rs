// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural key paths: `System.Database`, `a -> b`, `(a -> b)[0].style.stroke`.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use super::ast::Arrow;
use super::attr::first_reserved;

const FORBIDDEN_KEY_CHARS: &[char] = &[':', ';', '{', '}', '[', ']', '"', '#', '\n', '\r'];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("key must not be empty")]
    Empty,
    #[error("empty path segment in '{key}'")]
    EmptySegment { key: String },
    #[error("invalid character '{ch}' in key '{key}'")]
    InvalidCharacter { key: String, ch: char },
    #[error("connection endpoint '{endpoint}' addresses an attribute")]
    AttributeEndpoint { endpoint: String },
    #[error("expected a single connection, got a chain: '{key}'")]
    Chain { key: String },
    #[error("expected a connection key, got '{key}'")]
    NotAConnection { key: String },
    #[error("connection index '{index}' is out of range")]
    InvalidIndex { index: String },
}

/// A parsed key, split into the structural target and an optional attribute path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPath {
    Object { path: Vec<String>, attribute: Vec<String> },
    Edge(EdgeKey),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeKey {
    pub src: Vec<String>,
    pub dst: Vec<String>,
    pub arrow: Arrow,
    /// Position among the edges sharing `src`/`dst`; `None` means the first one.
    pub index: Option<usize>,
    pub attribute: Vec<String>,
}

impl EdgeKey {
    pub fn src_id(&self) -> String {
        self.src.join(".")
    }

    pub fn dst_id(&self) -> String {
        self.dst.join(".")
    }

    pub fn canonical_id(&self) -> String {
        edge_id(&self.src_id(), &self.dst_id())
    }
}

/// Canonical public edge id.
pub fn edge_id(src: &str, dst: &str) -> String {
    format!("{src}->{dst}")
}

/// Editor-facing edge key, as reported back from create.
pub fn indexed_edge_key(src: &str, arrow: Arrow, dst: &str, index: usize) -> String {
    format!("({src} {arrow} {dst})[{index}]")
}

pub fn is_connection_key(key: &str) -> bool {
    !find_arrows(key).is_empty()
}

/// Byte offsets and kinds of every arrow token in `raw`.
pub fn find_arrows(raw: &str) -> Vec<(usize, usize, Arrow)> {
    let mut found = Vec::new();
    let mut idx = 0;
    while idx < raw.len() {
        let rest = &raw[idx..];
        let hit = Arrow::TOKENS.iter().find(|(token, _)| rest.starts_with(token));
        match hit {
            Some((token, arrow)) => {
                found.push((idx, idx + token.len(), *arrow));
                idx += token.len();
            }
            None => {
                idx += rest.chars().next().map_or(1, char::len_utf8);
            }
        }
    }
    found
}

/// Splits `a -> b <- c` into `(["a", "b", "c"], [Forward, Backward])`.
pub fn split_chain(raw: &str) -> Option<(Vec<&str>, Vec<Arrow>)> {
    let arrows = find_arrows(raw);
    if arrows.is_empty() {
        return None;
    }

    let mut endpoints = Vec::with_capacity(arrows.len() + 1);
    let mut kinds = Vec::with_capacity(arrows.len());
    let mut start = 0;
    for (begin, end, arrow) in arrows {
        endpoints.push(raw[start..begin].trim());
        kinds.push(arrow);
        start = end;
    }
    endpoints.push(raw[start..].trim());
    Some((endpoints, kinds))
}

/// Splits a dotted path into trimmed segments.
pub fn split_segments(raw: &str) -> Result<Vec<String>, KeyError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Empty);
    }
    if let Some(ch) = trimmed.chars().find(|ch| FORBIDDEN_KEY_CHARS.contains(ch)) {
        return Err(KeyError::InvalidCharacter { key: trimmed.to_owned(), ch });
    }

    trimmed
        .split('.')
        .map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                Err(KeyError::EmptySegment { key: trimmed.to_owned() })
            } else {
                Ok(segment.to_owned())
            }
        })
        .collect()
}

fn endpoint_segments(raw: &str) -> Result<Vec<String>, KeyError> {
    let segments = split_segments(raw)?;
    if first_reserved(&segments).is_some() {
        return Err(KeyError::AttributeEndpoint { endpoint: raw.trim().to_owned() });
    }
    Ok(segments)
}

fn indexed_edge_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\((?P<inner>.+)\)\[(?P<index>\d+)\](?:\.(?P<attr>.+))?$")
            .expect("valid indexed edge regex")
    })
}

/// Parses every hop of a connection chain (`a -> b -> c` yields two hops).
pub fn parse_connection_chain(key: &str) -> Result<Vec<EdgeKey>, KeyError> {
    let trimmed = key.trim();
    let Some((endpoints, arrows)) = split_chain(trimmed) else {
        return Err(KeyError::NotAConnection { key: trimmed.to_owned() });
    };

    let endpoints =
        endpoints.into_iter().map(endpoint_segments).collect::<Result<Vec<_>, _>>()?;

    Ok(arrows
        .into_iter()
        .enumerate()
        .map(|(idx, arrow)| EdgeKey {
            src: endpoints[idx].clone(),
            dst: endpoints[idx + 1].clone(),
            arrow,
            index: None,
            attribute: Vec::new(),
        })
        .collect())
}

fn parse_single_edge(raw: &str) -> Result<EdgeKey, KeyError> {
    let mut hops = parse_connection_chain(raw)?;
    if hops.len() != 1 {
        return Err(KeyError::Chain { key: raw.trim().to_owned() });
    }
    Ok(hops.remove(0))
}

pub fn parse_key(key: &str) -> Result<KeyPath, KeyError> {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Empty);
    }

    if let Some(caps) = indexed_edge_regex().captures(trimmed) {
        let mut edge = parse_single_edge(&caps["inner"])?;
        let index = &caps["index"];
        edge.index = Some(
            index.parse().map_err(|_| KeyError::InvalidIndex { index: index.to_owned() })?,
        );
        if let Some(attr) = caps.name("attr") {
            edge.attribute = split_segments(attr.as_str())?;
        }
        return Ok(KeyPath::Edge(edge));
    }

    if is_connection_key(trimmed) {
        return parse_single_edge(trimmed).map(KeyPath::Edge);
    }

    let segments = split_segments(trimmed)?;
    let (path, attribute) = match first_reserved(&segments) {
        Some(idx) => (segments[..idx].to_vec(), segments[idx..].to_vec()),
        None => (segments, Vec::new()),
    };
    Ok(KeyPath::Object { path, attribute })
}

/// Parses a key that must name a connection, for text-level patching.
pub fn connection_key(key: &str) -> Result<EdgeKey, KeyError> {
    match parse_key(key)? {
        KeyPath::Edge(edge) => Ok(edge),
        KeyPath::Object { .. } => Err(KeyError::NotAConnection { key: key.trim().to_owned() }),
    }
}

/// Last segment of a dotted id.
pub fn leaf_name(id: &str) -> &str {
    id.rsplit('.').next().unwrap_or(id)
}

/// Parent id of a dotted id, `None` at root.
pub fn parent_id(id: &str) -> Option<&str> {
    id.rsplit_once('.').map(|(parent, _)| parent)
}

/// `true` when `id` is `prefix` itself or nested below it.
pub fn is_within(id: &str, prefix: &str) -> bool {
    id == prefix || (id.starts_with(prefix) && id.as_bytes().get(prefix.len()) == Some(&b'.'))
}
