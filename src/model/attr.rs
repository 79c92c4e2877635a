// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reserved attribute keywords and typed attribute validation.

pub const LABEL: &str = "label";
pub const SHAPE: &str = "shape";
pub const STYLE: &str = "style";
pub const DIRECTION: &str = "direction";

/// Key segments that address an attribute rather than a child object.
pub const RESERVED_KEYWORDS: &[&str] =
    &[LABEL, SHAPE, "icon", "tooltip", "link", "near", "width", "height", DIRECTION, STYLE];

pub const STYLE_KEYWORDS: &[&str] = &[
    "fill",
    "stroke",
    "stroke-width",
    "stroke-dash",
    "opacity",
    "font-color",
    "font-size",
    "bold",
    "italic",
    "shadow",
    "border-radius",
    "animated",
    "3d",
    "multiple",
];

pub const SHAPES: &[&str] = &[
    "rectangle",
    "square",
    "page",
    "parallelogram",
    "document",
    "cylinder",
    "queue",
    "package",
    "step",
    "callout",
    "stored_data",
    "person",
    "diamond",
    "oval",
    "circle",
    "hexagon",
    "cloud",
    "text",
    "code",
    "class",
    "sql_table",
    "image",
    "sequence_diagram",
];

pub const DEFAULT_SHAPE: &str = "rectangle";

const DIRECTIONS: &[&str] = &["up", "down", "left", "right"];
const INTEGER_ATTRIBUTES: &[&str] =
    &["width", "height", "style.stroke-width", "style.font-size", "style.border-radius"];
const BOOLEAN_ATTRIBUTES: &[&str] =
    &["style.bold", "style.italic", "style.shadow", "style.animated", "style.3d", "style.multiple"];

/// Attributes an edge may carry (besides arrowhead flags, which come from the arrow token).
const EDGE_ATTRIBUTES: &[&str] = &[LABEL, "tooltip", "link"];

pub fn is_reserved(segment: &str) -> bool {
    RESERVED_KEYWORDS.contains(&segment)
}

/// Index of the first reserved segment, i.e. where the object path ends and the
/// attribute path begins.
pub fn first_reserved(segments: &[String]) -> Option<usize> {
    segments.iter().position(|segment| is_reserved(segment))
}

/// Checks that `path` (e.g. `["style", "fill"]`) names a known attribute.
pub fn validate_attribute_name(path: &[String]) -> Result<String, String> {
    match path {
        [] => Err("missing attribute name".to_owned()),
        [style] if style == STYLE => {
            Err("style requires a property (e.g. style.fill)".to_owned())
        }
        [style, prop] if style == STYLE => {
            if STYLE_KEYWORDS.contains(&prop.as_str()) {
                Ok(format!("{STYLE}.{prop}"))
            } else {
                Err(format!("unknown style property '{prop}'"))
            }
        }
        [single] if is_reserved(single) => Ok(single.clone()),
        _ => Err(format!("unknown attribute '{}'", path.join("."))),
    }
}

pub fn validate_edge_attribute_name(name: &str) -> Result<(), String> {
    if EDGE_ATTRIBUTES.contains(&name) || name.starts_with("style.") {
        Ok(())
    } else {
        Err(format!("attribute '{name}' is not valid on a connection"))
    }
}

/// Validates the value of a typed attribute. Free-form attributes accept anything.
pub fn validate_attribute_value(name: &str, value: &str) -> Result<(), String> {
    if name == SHAPE {
        if SHAPES.contains(&value) {
            return Ok(());
        }
        return Err(format!("unknown shape '{value}'"));
    }

    if name == DIRECTION {
        if DIRECTIONS.contains(&value) {
            return Ok(());
        }
        return Err(format!("invalid direction '{value}' (expected up, down, left or right)"));
    }

    if INTEGER_ATTRIBUTES.contains(&name) {
        return value
            .parse::<u32>()
            .map(|_| ())
            .map_err(|_| format!("{name} expects a non-negative integer, got '{value}'"));
    }

    if BOOLEAN_ATTRIBUTES.contains(&name) {
        return match value {
            "true" | "false" => Ok(()),
            _ => Err(format!("{name} expects true or false, got '{value}'")),
        };
    }

    if name == "style.opacity" {
        return match value.parse::<f64>() {
            Ok(opacity) if (0.0..=1.0).contains(&opacity) => Ok(()),
            _ => Err(format!("style.opacity expects a number between 0 and 1, got '{value}'")),
        };
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> Vec<String> {
        raw.split('.').map(str::to_owned).collect()
    }

    #[test]
    fn first_reserved_splits_object_from_attribute() {
        assert_eq!(first_reserved(&path("server.style.fill")), Some(1));
        assert_eq!(first_reserved(&path("shape")), Some(0));
        assert_eq!(first_reserved(&path("a.b.c")), None);
    }

    #[test]
    fn attribute_names_are_normalized_or_rejected() {
        assert_eq!(validate_attribute_name(&path("style.fill")).as_deref(), Ok("style.fill"));
        assert_eq!(validate_attribute_name(&path("label")).as_deref(), Ok("label"));
        assert!(validate_attribute_name(&path("style")).is_err());
        assert!(validate_attribute_name(&path("style.glow")).is_err());
        assert!(validate_attribute_name(&path("label.extra")).is_err());
    }

    #[test]
    fn typed_values_are_checked() {
        assert!(validate_attribute_value("shape", "cylinder").is_ok());
        assert!(validate_attribute_value("shape", "blob").is_err());
        assert!(validate_attribute_value("width", "120").is_ok());
        assert!(validate_attribute_value("width", "-1").is_err());
        assert!(validate_attribute_value("style.opacity", "0.4").is_ok());
        assert!(validate_attribute_value("style.opacity", "1.5").is_err());
        assert!(validate_attribute_value("style.bold", "yes").is_err());
        assert!(validate_attribute_value("style.fill", "#f0f0f0").is_ok());
        assert!(validate_attribute_value("label", "").is_ok());
    }
}
