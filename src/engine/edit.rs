// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Structural edit primitives over a [`Graph`], used by the built-in engine.
//!
//! Every function mutates the graph it is given; callers pass a clone so a
//! rejected edit leaves the original untouched.

use std::collections::{BTreeMap, HashSet};

use crate::model::attr::{
    is_reserved, validate_attribute_name, validate_attribute_value, validate_edge_attribute_name,
    LABEL,
};
use crate::model::graph::{Graph, GraphEdge, IdDeltas};
use crate::model::key::{
    indexed_edge_key, is_within, leaf_name, parent_id, parse_key, split_segments, EdgeKey, KeyPath,
};

use super::EngineError;

fn rejected(message: impl Into<String>) -> EngineError {
    EngineError::Rejected(message.into())
}

fn parse(key: &str) -> Result<KeyPath, EngineError> {
    parse_key(key).map_err(|err| rejected(err.to_string()))
}

fn join_id(parent: Option<&str>, name: &str) -> String {
    match parent {
        Some(parent) if !parent.is_empty() => format!("{parent}.{name}"),
        _ => name.to_owned(),
    }
}

/// `name`, or `name 2`, `name 3`, ... until the id is free under `parent`.
fn unique_id(graph: &Graph, parent: Option<&str>, name: &str) -> String {
    let candidate = join_id(parent, name);
    if !graph.contains_object(&candidate) {
        return candidate;
    }
    (2..)
        .map(|n| join_id(parent, &format!("{name} {n}")))
        .find(|id| !graph.contains_object(id))
        .unwrap_or(candidate)
}

fn existing_object(graph: &Graph, path: &[String]) -> Result<String, EngineError> {
    let id = path.join(".");
    if graph.contains_object(&id) {
        Ok(id)
    } else {
        Err(rejected(format!("object '{id}' does not exist")))
    }
}

fn resolve_edge(graph: &Graph, edge: &EdgeKey) -> Result<usize, EngineError> {
    let (src, dst) = (edge.src_id(), edge.dst_id());
    let ordinal = edge.index.unwrap_or(0);
    graph.nth_edge(&src, &dst, ordinal).ok_or_else(|| {
        let key = indexed_edge_key(&src, edge.arrow, &dst, ordinal);
        rejected(format!("connection '{key}' does not exist"))
    })
}

fn object_only(
    key: &str,
    path: Vec<String>,
    attribute: &[String],
) -> Result<Vec<String>, EngineError> {
    if attribute.is_empty() && !path.is_empty() {
        Ok(path)
    } else {
        Err(rejected(format!("'{key}' does not name an object")))
    }
}

fn object_key(key: &str) -> Result<String, EngineError> {
    match parse(key)? {
        KeyPath::Object { path, attribute } => Ok(object_only(key, path, &attribute)?.join(".")),
        KeyPath::Edge(_) => Err(rejected(format!("'{key}' is a connection, expected an object"))),
    }
}

pub fn create(graph: &mut Graph, key: &str) -> Result<String, EngineError> {
    match parse(key)? {
        KeyPath::Object { path, attribute } => {
            let path = object_only(key, path, &attribute).map_err(|_| {
                rejected(format!("cannot create attribute '{key}', use set instead"))
            })?;
            let (name, parent) = path.split_last().map_or(("", &[][..]), |(n, p)| (n.as_str(), p));
            let parent = (!parent.is_empty()).then(|| parent.join("."));
            let id = unique_id(graph, parent.as_deref(), name);
            graph.ensure_object(&id);
            Ok(id)
        }
        KeyPath::Edge(edge) => {
            if !edge.attribute.is_empty() {
                return Err(rejected(format!("cannot create attribute '{key}', use set instead")));
            }
            let (src, dst) = (edge.src_id(), edge.dst_id());
            graph.ensure_object(&src);
            graph.ensure_object(&dst);
            let ordinal = graph.push_edge(GraphEdge::new(src.clone(), dst.clone(), edge.arrow));
            Ok(indexed_edge_key(&src, edge.arrow, &dst, ordinal))
        }
    }
}

/// Applies `tag` as the attribute namespace: with tag `style`, `a.fill` and
/// `a.style.fill` address the same attribute.
fn apply_tag(
    mut path: Vec<String>,
    mut attribute: Vec<String>,
    tag: Option<&str>,
) -> (Vec<String>, Vec<String>) {
    let Some(tag) = tag.map(str::trim).filter(|tag| !tag.is_empty()) else {
        return (path, attribute);
    };
    if attribute.first().map(String::as_str) == Some(tag) {
        return (path, attribute);
    }
    if attribute.is_empty() {
        if let Some(last) = path.pop() {
            attribute.push(last);
        }
    }
    attribute.insert(0, tag.to_owned());
    (path, attribute)
}

pub fn set(
    graph: &mut Graph,
    key: &str,
    tag: Option<&str>,
    value: Option<&str>,
) -> Result<(), EngineError> {
    match parse(key)? {
        KeyPath::Object { path, attribute } => {
            let (path, attribute) = apply_tag(path, attribute, tag);
            if attribute.is_empty() {
                let id = path.join(".");
                graph.ensure_object(&id);
                set_object_attribute(graph, &id, LABEL, value)
            } else {
                let name = validate_attribute_name(&attribute).map_err(rejected)?;
                if let Some(value) = value {
                    validate_attribute_value(&name, value).map_err(rejected)?;
                }
                if path.is_empty() {
                    set_board_attribute(graph, name, value);
                    return Ok(());
                }
                let id = existing_object(graph, &path)?;
                set_object_attribute(graph, &id, &name, value)
            }
        }
        KeyPath::Edge(edge) => {
            let index = resolve_edge(graph, &edge)?;
            let name = match tag.map(str::trim).filter(|tag| !tag.is_empty()) {
                Some(tag) if edge.attribute.first().map(String::as_str) != Some(tag) => {
                    let mut attribute = vec![tag.to_owned()];
                    attribute.extend(edge.attribute.iter().cloned());
                    validate_attribute_name(&attribute).map_err(rejected)?
                }
                _ if edge.attribute.is_empty() => LABEL.to_owned(),
                _ => validate_attribute_name(&edge.attribute).map_err(rejected)?,
            };
            validate_edge_attribute_name(&name).map_err(rejected)?;
            if let Some(value) = value {
                validate_attribute_value(&name, value).map_err(rejected)?;
            }
            let edge = graph
                .edge_mut(index)
                .ok_or_else(|| EngineError::Faulted(format!("edge {index} vanished")))?;
            edge.set_attribute(name, value.map(str::to_owned));
            Ok(())
        }
    }
}

fn set_board_attribute(graph: &mut Graph, name: String, value: Option<&str>) {
    match value {
        Some(value) => {
            graph.board_attributes_mut().insert(name, value.to_owned());
        }
        None => {
            graph.board_attributes_mut().remove(&name);
        }
    }
}

fn set_object_attribute(
    graph: &mut Graph,
    id: &str,
    name: &str,
    value: Option<&str>,
) -> Result<(), EngineError> {
    let object = graph
        .object_mut(id)
        .ok_or_else(|| EngineError::Faulted(format!("object '{id}' vanished")))?;
    object.set_attribute(name, value.map(str::to_owned));
    Ok(())
}

pub fn delete(graph: &mut Graph, key: &str) -> Result<(), EngineError> {
    match parse(key)? {
        KeyPath::Object { path, attribute } if !attribute.is_empty() => {
            let name = validate_attribute_name(&attribute).map_err(rejected)?;
            if path.is_empty() {
                set_board_attribute(graph, name, None);
                return Ok(());
            }
            let id = existing_object(graph, &path)?;
            set_object_attribute(graph, &id, &name, None)
        }
        KeyPath::Object { path, .. } => {
            let id = existing_object(graph, &path)?;
            let mut doomed = vec![id.clone()];
            doomed.extend(graph.descendant_ids(&id));
            graph.remove_objects(&doomed);
            Ok(())
        }
        KeyPath::Edge(edge) if !edge.attribute.is_empty() => {
            let index = resolve_edge(graph, &edge)?;
            let name = validate_attribute_name(&edge.attribute).map_err(rejected)?;
            if let Some(edge) = graph.edge_mut(index) {
                edge.set_attribute(name, None);
            }
            Ok(())
        }
        KeyPath::Edge(edge) => {
            let index = resolve_edge(graph, &edge)?;
            graph.remove_edge(index);
            Ok(())
        }
    }
}

/// Every id that `delete(key)` would remove, mapped to `""`.
pub fn delete_id_deltas(graph: &Graph, key: &str) -> Result<IdDeltas, EngineError> {
    let mut deltas = IdDeltas::new();
    match parse(key)? {
        KeyPath::Object { attribute, .. } if !attribute.is_empty() => {}
        KeyPath::Object { path, .. } => {
            let id = existing_object(graph, &path)?;
            let mut doomed = vec![id.clone()];
            doomed.extend(graph.descendant_ids(&id));
            for (index, edge) in graph.edges().iter().enumerate() {
                if doomed.iter().any(|id| edge.src() == id || edge.dst() == id) {
                    if let Some(edge_id) = graph.edge_public_id(index) {
                        deltas.insert(edge_id, String::new());
                    }
                }
            }
            deltas.extend(doomed.into_iter().map(|id| (id, String::new())));
        }
        KeyPath::Edge(edge) if !edge.attribute.is_empty() => {}
        KeyPath::Edge(edge) => {
            let index = resolve_edge(graph, &edge)?;
            if let Some(edge_id) = graph.edge_public_id(index) {
                deltas.insert(edge_id, String::new());
            }
        }
    }
    Ok(deltas)
}

/// Checks that every remapped id is free (or vacated by the same remap) and unique.
fn check_remap(graph: &Graph, mapping: &BTreeMap<String, String>) -> Result<(), EngineError> {
    let mut targets = HashSet::new();
    for (old, new) in mapping {
        if !targets.insert(new.as_str()) {
            return Err(rejected(format!("'{new}' would be produced twice")));
        }
        if old != new && graph.contains_object(new) && !mapping.contains_key(new) {
            return Err(rejected(format!("object '{new}' already exists")));
        }
    }
    Ok(())
}

fn reprefix(id: &str, old: &str, new: &str) -> String {
    format!("{new}{}", &id[old.len()..])
}

/// Object-id mapping for re-rooting the subtree at `old` under `new`.
fn subtree_mapping(graph: &Graph, old: &str, new: &str) -> BTreeMap<String, String> {
    let mut mapping = BTreeMap::from([(old.to_owned(), new.to_owned())]);
    for id in graph.descendant_ids(old) {
        let moved = reprefix(&id, old, new);
        mapping.insert(id, moved);
    }
    mapping
}

fn apply_mapping(graph: &mut Graph, mapping: &BTreeMap<String, String>) {
    graph.remap_ids(|id| mapping.get(id).cloned());
}

pub fn move_element(
    graph: &mut Graph,
    key: &str,
    new_key: &str,
    include_descendants: bool,
) -> Result<(), EngineError> {
    let old = object_key(key)?;
    if !graph.contains_object(&old) {
        return Err(rejected(format!("object '{old}' does not exist")));
    }
    let new = object_key(new_key)?;
    if new == old {
        return Ok(());
    }
    if is_within(&new, &old) {
        return Err(rejected(format!("cannot move '{old}' into its own subtree '{new}'")));
    }

    let mapping = if include_descendants {
        subtree_mapping(graph, &old, &new)
    } else {
        let former_parent = parent_id(&old).map(str::to_owned);
        let mut mapping = BTreeMap::from([(old.clone(), new.clone())]);
        for child in graph.children_ids(Some(&old)) {
            let hoisted = join_id(former_parent.as_deref(), leaf_name(&child));
            mapping.extend(subtree_mapping(graph, &child, &hoisted));
        }
        mapping
    };
    check_remap(graph, &mapping)?;

    apply_mapping(graph, &mapping);
    if let Some(parent) = parent_id(&new) {
        graph.ensure_object(parent);
    }
    Ok(())
}

fn validate_new_name(new_name: &str) -> Result<String, EngineError> {
    let segments = split_segments(new_name).map_err(|err| rejected(err.to_string()))?;
    match segments.as_slice() {
        [name] if !is_reserved(name) => Ok(name.clone()),
        [name] => Err(rejected(format!("'{name}' is a reserved keyword"))),
        _ => Err(rejected(format!("new name '{}' must be a single segment", new_name.trim()))),
    }
}

/// `(old id, final new id)` for a rename, after disambiguation.
fn rename_target(
    graph: &Graph,
    key: &str,
    new_name: &str,
) -> Result<(String, String), EngineError> {
    if matches!(parse(key)?, KeyPath::Edge(_)) {
        return Err(rejected(format!("cannot rename connection '{key}'")));
    }
    let old = object_key(key)?;
    if !graph.contains_object(&old) {
        return Err(rejected(format!("object '{old}' does not exist")));
    }
    let name = validate_new_name(new_name)?;
    let parent = parent_id(&old);
    if join_id(parent, &name) == old {
        return Ok((old.clone(), old));
    }
    let new = unique_id(graph, parent, &name);
    Ok((old, new))
}

pub fn rename(graph: &mut Graph, key: &str, new_name: &str) -> Result<String, EngineError> {
    let (old, new) = rename_target(graph, key, new_name)?;
    if old != new {
        let mapping = subtree_mapping(graph, &old, &new);
        apply_mapping(graph, &mapping);
    }
    Ok(new)
}

/// Old id -> renamed id for the object, its descendants and every edge touching them.
pub fn rename_id_deltas(graph: &Graph, key: &str, new_name: &str) -> Result<IdDeltas, EngineError> {
    let (old, new) = rename_target(graph, key, new_name)?;
    if old == new {
        return Ok(IdDeltas::new());
    }
    let mapping = subtree_mapping(graph, &old, &new);

    let mut deltas: IdDeltas = mapping.clone();
    for (index, edge) in graph.edges().iter().enumerate() {
        let src = mapping.get(edge.src()).map_or(edge.src(), String::as_str);
        let dst = mapping.get(edge.dst()).map_or(edge.dst(), String::as_str);
        if src == edge.src() && dst == edge.dst() {
            continue;
        }
        if let Some(edge_id) = graph.edge_public_id(index) {
            deltas.insert(edge_id, crate::model::key::edge_id(src, dst));
        }
    }
    Ok(deltas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::compile;

    fn graph(text: &str) -> Graph {
        compile(text).expect("fixture compiles")
    }

    fn ids(graph: &Graph) -> Vec<&str> {
        graph.objects().map(|object| object.id()).collect()
    }

    #[test]
    fn create_disambiguates_existing_names() {
        let mut g = graph("a: {\n  b\n}");
        assert_eq!(create(&mut g, "a.b").unwrap(), "a.b 2");
        assert_eq!(create(&mut g, "a.b").unwrap(), "a.b 3");
        assert_eq!(create(&mut g, "x.y").unwrap(), "x.y");
        assert!(g.contains_object("x"));
    }

    #[test]
    fn create_connection_reports_indexed_key() {
        let mut g = graph("a -> b");
        assert_eq!(create(&mut g, "a -> b").unwrap(), "(a -> b)[1]");
        assert_eq!(create(&mut g, "b <- c").unwrap(), "(b <- c)[0]");
        assert!(g.contains_object("c"));
        assert!(create(&mut g, "a.shape").is_err());
    }

    #[test]
    fn set_label_auto_declares_and_tag_prefixes() {
        let mut g = graph("a");
        set(&mut g, "fresh", None, Some("Fresh")).unwrap();
        assert_eq!(g.object("fresh").unwrap().label(), "Fresh");

        set(&mut g, "a.fill", Some("style"), Some("red")).unwrap();
        set(&mut g, "a.style.stroke", Some("style"), Some("blue")).unwrap();
        let a = g.object("a").unwrap();
        assert_eq!(a.attribute("style.fill"), Some("red"));
        assert_eq!(a.attribute("style.stroke"), Some("blue"));

        set(&mut g, "a.style.fill", None, None).unwrap();
        assert_eq!(g.object("a").unwrap().attribute("style.fill"), None);
    }

    #[test]
    fn set_rejects_bad_targets_and_values() {
        let mut g = graph("a -> b");
        assert!(set(&mut g, "ghost.shape", None, Some("circle")).is_err());
        assert!(set(&mut g, "a.shape", None, Some("blob")).is_err());
        assert!(set(&mut g, "(a -> b)[3]", None, Some("x")).is_err());
        assert!(set(&mut g, "a -> b.shape", None, Some("circle")).is_err());

        set(&mut g, "a -> b", None, Some("calls")).unwrap();
        set(&mut g, "(a -> b)[0].style.stroke", None, Some("red")).unwrap();
        assert_eq!(g.edges()[0].label(), Some("calls"));
        assert_eq!(g.edges()[0].attribute("style.stroke"), Some("red"));
    }

    #[test]
    fn delete_cascades_to_descendants_and_edges() {
        let mut g =
            graph("parent: {\n  child1\n  child2\n}\nstandalone\nparent.child1 -> standalone");
        let deltas = delete_id_deltas(&g, "parent").unwrap();
        assert_eq!(
            deltas.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["parent", "parent.child1", "parent.child1->standalone", "parent.child2"]
        );
        assert!(deltas.values().all(String::is_empty));

        delete(&mut g, "parent").unwrap();
        assert_eq!(ids(&g), vec!["standalone"]);
        assert!(g.edges().is_empty());
    }

    #[test]
    fn delete_connection_and_attribute() {
        let mut g = graph("a -> b\na -> b: second\na.shape: circle");
        delete(&mut g, "(a -> b)[1]").unwrap();
        assert_eq!(g.edges().len(), 1);
        assert_eq!(g.edges()[0].label(), None);

        delete(&mut g, "a.shape").unwrap();
        assert_eq!(g.object("a").unwrap().shape(), "rectangle");
        assert!(delete(&mut g, "ghost").is_err());
        let deltas = delete_id_deltas(&g, "a -> b").unwrap();
        assert_eq!(deltas.get("a->b").map(String::as_str), Some(""));
    }

    #[test]
    fn move_with_descendants_repoints_edges() {
        let mut g = graph(
            "container1: {\n  item: {\n    leaf\n  }\n}\ncontainer2\ncontainer1.item.leaf -> container2",
        );
        move_element(&mut g, "container1.item", "container2.item", true).unwrap();
        assert!(g.contains_object("container2.item.leaf"));
        assert!(!g.contains_object("container1.item"));
        assert_eq!(g.edges()[0].id(), "container2.item.leaf->container2");
        assert_eq!(g.object("container2.item").unwrap().parent(), Some("container2"));
    }

    #[test]
    fn move_without_descendants_hoists_children() {
        let mut g = graph("p: {\n  x: {\n    y\n  }\n}\nq");
        move_element(&mut g, "p.x", "q.x", false).unwrap();
        assert!(g.contains_object("q.x"));
        assert!(g.contains_object("p.y"));
        assert!(!g.contains_object("p.x"));
    }

    #[test]
    fn move_rejects_collisions_and_cycles() {
        let mut g = graph("a: {\n  b\n}\nc: {\n  b\n}");
        assert!(move_element(&mut g, "a.b", "c.b", true).is_err());
        assert!(move_element(&mut g, "a", "a.b.a", true).is_err());
        assert!(move_element(&mut g, "a.b", "a.shape", true).is_err());
    }

    #[test]
    fn rename_remaps_subtree_and_reports_deltas() {
        let mut g = graph("oldname: {\n  shape: rectangle\n  inner\n}\noldname -> target");
        let deltas = rename_id_deltas(&g, "oldname", "newname").unwrap();
        assert_eq!(deltas.get("oldname").map(String::as_str), Some("newname"));
        assert_eq!(deltas.get("oldname.inner").map(String::as_str), Some("newname.inner"));
        assert_eq!(deltas.get("oldname->target").map(String::as_str), Some("newname->target"));

        assert_eq!(rename(&mut g, "oldname", "newname").unwrap(), "newname");
        assert!(g.contains_object("newname.inner"));
        assert_eq!(g.edges()[0].id(), "newname->target");
    }

    #[test]
    fn rename_disambiguates_and_validates() {
        let mut g = graph("a\nb\nx -> y");
        let deltas = rename_id_deltas(&g, "a", "b").unwrap();
        assert_eq!(deltas.get("a").map(String::as_str), Some("b 2"));
        assert_eq!(rename(&mut g, "a", "b").unwrap(), "b 2");
        assert!(rename(&mut g, "x -> y", "z").is_err());
        assert!(rename(&mut g, "b", "c.d").is_err());
        assert!(rename(&mut g, "b", "shape").is_err());
        assert_eq!(rename(&mut g, "b", "b").unwrap(), "b");
    }
}
