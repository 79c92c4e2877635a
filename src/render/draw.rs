// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Nested-box layout and SVG emission.
//!
//! Siblings are stacked along one axis (columns by default, rows when the board
//! direction is `left`/`right`), containers wrap their children, and edges are
//! straight lines between box borders.

use std::collections::HashMap;

use svg::node::element as svg_element;
use svg::node::Text as SvgText;

use crate::model::attr::DIRECTION;
use crate::model::{Graph, GraphEdge, GraphObject};

use super::text::{display_label, label_width};
use super::Palette;

const MARGIN: f64 = 24.0;
const PADDING: f64 = 20.0;
const GAP: f64 = 48.0;
const LEAF_HEIGHT: f64 = 56.0;
const MIN_WIDTH: f64 = 80.0;
const HEADER: f64 = 28.0;
const FONT_SIZE: f64 = 15.0;
const MARKER_END: &str = "trellis-arrow-end";
const MARKER_START: &str = "trellis-arrow-start";

#[derive(Debug, Clone, Copy, PartialEq)]
struct Rect {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl Rect {
    fn center(self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Point where the ray from the centre towards `(dx, dy)` leaves the box.
    fn border_towards(self, dx: f64, dy: f64) -> (f64, f64) {
        let (cx, cy) = self.center();
        let tx = if dx == 0.0 { f64::INFINITY } else { (self.w / 2.0) / dx.abs() };
        let ty = if dy == 0.0 { f64::INFINITY } else { (self.h / 2.0) / dy.abs() };
        let t = tx.min(ty);
        if t.is_finite() {
            (cx + dx * t, cy + dy * t)
        } else {
            (cx, cy)
        }
    }
}

struct Layout<'a> {
    graph: &'a Graph,
    horizontal: bool,
    sizes: HashMap<String, (f64, f64)>,
    rects: HashMap<String, Rect>,
}

impl<'a> Layout<'a> {
    fn new(graph: &'a Graph) -> Self {
        let horizontal = matches!(
            graph.board_attributes().get(DIRECTION).map(String::as_str),
            Some("left" | "right")
        );
        Self { graph, horizontal, sizes: HashMap::new(), rects: HashMap::new() }
    }

    fn stack(&self, children: &[String]) -> (f64, f64) {
        let gaps = GAP * children.len().saturating_sub(1) as f64;
        let (mut along, mut across) = (gaps, 0.0_f64);
        for child in children {
            let (w, h) = self.sizes.get(child).copied().unwrap_or((MIN_WIDTH, LEAF_HEIGHT));
            let (a, b) = if self.horizontal { (w, h) } else { (h, w) };
            along += a;
            across = across.max(b);
        }
        if self.horizontal {
            (along, across)
        } else {
            (across, along)
        }
    }

    fn measure(&mut self, object: &GraphObject) -> (f64, f64) {
        let children = self.graph.children_ids(Some(object.id()));
        let text_width = label_width(&display_label(object.label())) + 2.0 * PADDING;

        let size = if children.is_empty() {
            let w = text_width.max(MIN_WIDTH);
            match object.shape() {
                "circle" | "square" => (w.max(LEAF_HEIGHT), w.max(LEAF_HEIGHT)),
                _ => (w, LEAF_HEIGHT),
            }
        } else {
            for child in &children {
                if let Some(child) = self.graph.object(child) {
                    let size = self.measure(child);
                    self.sizes.insert(child.id().to_owned(), size);
                }
            }
            let (w, h) = self.stack(&children);
            ((w + 2.0 * PADDING).max(text_width), h + 2.0 * PADDING + HEADER)
        };
        self.sizes.insert(object.id().to_owned(), size);
        size
    }

    fn place(&mut self, children: &[String], mut x: f64, mut y: f64) {
        for child in children {
            let (w, h) = self.sizes.get(child).copied().unwrap_or((MIN_WIDTH, LEAF_HEIGHT));
            self.rects.insert(child.clone(), Rect { x, y, w, h });

            let grandchildren = self.graph.children_ids(Some(child));
            if !grandchildren.is_empty() {
                self.place(&grandchildren, x + PADDING, y + HEADER + PADDING);
            }

            if self.horizontal {
                x += w + GAP;
            } else {
                y += h + GAP;
            }
        }
    }

    fn run(mut self) -> (HashMap<String, Rect>, f64, f64) {
        let roots = self.graph.children_ids(None);
        for root in &roots {
            if let Some(object) = self.graph.object(root) {
                self.measure(object);
            }
        }
        let (w, h) = self.stack(&roots);
        self.place(&roots, MARGIN, MARGIN);
        (self.rects, w + 2.0 * MARGIN, h + 2.0 * MARGIN)
    }
}

fn marker(id: &str, path: &str, palette: &Palette) -> svg_element::Marker {
    svg_element::Marker::new()
        .set("id", id)
        .set("viewBox", "0 0 10 10")
        .set("refX", 9)
        .set("refY", 5)
        .set("markerWidth", 8)
        .set("markerHeight", 8)
        .set("orient", "auto")
        .add(svg_element::Path::new().set("d", path).set("fill", palette.edge))
}

fn label_node(text: &str, x: f64, y: f64, color: &str, size: f64) -> svg_element::Text {
    svg_element::Text::new("")
        .set("x", x)
        .set("y", y)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-family", "sans-serif")
        .set("font-size", size)
        .set("fill", color)
        .add(SvgText::new(text))
}

fn object_node(
    object: &GraphObject,
    rect: Rect,
    is_container: bool,
    palette: &Palette,
) -> svg_element::Group {
    let default_fill = if is_container { palette.container_fill } else { palette.fill };
    let fill = object.attribute("style.fill").unwrap_or(default_fill);
    let stroke = object.attribute("style.stroke").unwrap_or(palette.stroke);
    let stroke_width = object.attribute("style.stroke-width").unwrap_or("2");
    let (cx, cy) = rect.center();

    let mut group = svg_element::Group::new().set("class", "shape").set("data-id", object.id());
    if let Some(opacity) = object.attribute("style.opacity") {
        group = group.set("opacity", opacity);
    }

    let dash = object.attribute("style.stroke-dash").unwrap_or("none");
    let radius = object.attribute("style.border-radius").unwrap_or("4");
    macro_rules! outlined {
        ($node:expr) => {
            group.add(
                $node
                    .set("fill", fill)
                    .set("stroke", stroke)
                    .set("stroke-width", stroke_width)
                    .set("stroke-dasharray", dash),
            )
        };
    }

    group = match object.shape() {
        "text" => group,
        "circle" | "oval" => outlined!(svg_element::Ellipse::new()
            .set("cx", cx)
            .set("cy", cy)
            .set("rx", rect.w / 2.0)
            .set("ry", rect.h / 2.0)),
        "diamond" => outlined!(svg_element::Polygon::new().set(
            "points",
            format!(
                "{cx},{} {},{cy} {cx},{} {},{cy}",
                rect.y,
                rect.x + rect.w,
                rect.y + rect.h,
                rect.x
            ),
        )),
        _ => outlined!(svg_element::Rectangle::new()
            .set("x", rect.x)
            .set("y", rect.y)
            .set("width", rect.w)
            .set("height", rect.h)
            .set("rx", radius)),
    };

    let text_color = object.attribute("style.font-color").unwrap_or(palette.text);
    let font_size = object
        .attribute("style.font-size")
        .and_then(|size| size.parse::<f64>().ok())
        .unwrap_or(FONT_SIZE);
    let label_y = if is_container { rect.y + HEADER / 2.0 + 4.0 } else { cy };
    group.add(label_node(&display_label(object.label()), cx, label_y, text_color, font_size))
}

fn edge_node(edge: &GraphEdge, src: Rect, dst: Rect, palette: &Palette) -> svg_element::Group {
    let stroke = edge.attribute("style.stroke").unwrap_or(palette.edge);
    let stroke_width = edge.attribute("style.stroke-width").unwrap_or("2");
    let mut group = svg_element::Group::new().set("class", "connection").set("data-id", edge.id());

    let (sx, sy) = src.center();
    let (tx, ty) = dst.center();
    let (path, label_at) = if src == dst {
        let right = src.x + src.w;
        let d = format!(
            "M {right} {} C {} {} {} {} {right} {}",
            sy - 10.0,
            right + 40.0,
            sy - 30.0,
            right + 40.0,
            sy + 30.0,
            sy + 10.0
        );
        (d, (right + 36.0, sy))
    } else {
        let (dx, dy) = (tx - sx, ty - sy);
        let (x1, y1) = src.border_towards(dx, dy);
        let (x2, y2) = dst.border_towards(-dx, -dy);
        (format!("M {x1} {y1} L {x2} {y2}"), ((x1 + x2) / 2.0, (y1 + y2) / 2.0))
    };

    let mut line = svg_element::Path::new()
        .set("d", path)
        .set("fill", "none")
        .set("stroke", stroke)
        .set("stroke-width", stroke_width);
    if let Some(dash) = edge.attribute("style.stroke-dash") {
        line = line.set("stroke-dasharray", dash);
    }
    if edge.dst_arrow() {
        line = line.set("marker-end", format!("url(#{MARKER_END})"));
    }
    if edge.src_arrow() {
        line = line.set("marker-start", format!("url(#{MARKER_START})"));
    }
    group = group.add(line);

    if let Some(label) = edge.label() {
        let color = edge.attribute("style.font-color").unwrap_or(palette.text);
        let text = display_label(label);
        group = group.add(label_node(&text, label_at.0, label_at.1 - 10.0, color, 13.0));
    }
    group
}

/// Renders `graph` to a standalone SVG document.
pub fn render_svg(graph: &Graph, palette: &Palette) -> String {
    let (rects, width, height) = Layout::new(graph).run();

    let mut document = svg::Document::new()
        .set("viewBox", format!("0 0 {width} {height}"))
        .set("width", width)
        .set("height", height)
        .add(
            svg_element::Rectangle::new()
                .set("width", "100%")
                .set("height", "100%")
                .set("fill", palette.background),
        )
        .add(
            svg_element::Definitions::new()
                .add(marker(MARKER_END, "M 0 0 L 10 5 L 0 10 z", palette))
                .add(marker(MARKER_START, "M 10 0 L 0 5 L 10 10 z", palette).set("refX", 1)),
        );

    // Pre-order so containers are painted beneath their children.
    let mut pending: Vec<String> = graph.children_ids(None).into_iter().rev().collect();
    while let Some(id) = pending.pop() {
        let children = graph.children_ids(Some(&id));
        if let (Some(object), Some(rect)) = (graph.object(&id), rects.get(&id)) {
            document = document.add(object_node(object, *rect, !children.is_empty(), palette));
        }
        pending.extend(children.into_iter().rev());
    }

    for edge in graph.edges() {
        if let (Some(src), Some(dst)) = (rects.get(edge.src()), rects.get(edge.dst())) {
            document = document.add(edge_node(edge, *src, *dst, palette));
        }
    }

    document.to_string()
}
