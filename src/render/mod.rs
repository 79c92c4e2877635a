// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram rendering.
//!
//! SVG is produced in-process from the compiled graph; PNG and PDF are converted
//! from that SVG by an external tool (`rsvg-convert`, falling back to ImageMagick).

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::engine::Renderer;
use crate::format::{compile, CompileError};

mod convert;
mod draw;
mod text;

pub use convert::{Converter, ConverterChain};
pub use draw::render_svg;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    #[default]
    Svg,
    Png,
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_binary(self) -> bool {
        !matches!(self, Self::Svg)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            "pdf" => Ok(Self::Pdf),
            other => Err(RenderError::UnsupportedFormat(other.to_owned())),
        }
    }
}

/// Colour scheme, addressed by the numeric theme ids D2 users already know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Theme(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub fill: &'static str,
    pub container_fill: &'static str,
    pub stroke: &'static str,
    pub text: &'static str,
    pub edge: &'static str,
}

impl Theme {
    pub fn palette(self) -> Result<Palette, RenderError> {
        let palette = match self.0 {
            // Neutral default
            0 => Palette {
                background: "#FFFFFF",
                fill: "#F7F8FE",
                container_fill: "#E3E9FD",
                stroke: "#0D32B2",
                text: "#0A0F25",
                edge: "#0D32B2",
            },
            // Neutral grey
            1 => Palette {
                background: "#FFFFFF",
                fill: "#F1F4F5",
                container_fill: "#DEE1EB",
                stroke: "#676C7E",
                text: "#0A0F25",
                edge: "#676C7E",
            },
            // Flagship
            3 => Palette {
                background: "#FFFFFF",
                fill: "#EDF0FD",
                container_fill: "#C5C9F1",
                stroke: "#000E3D",
                text: "#000E3D",
                edge: "#000E3D",
            },
            // Colorblind clear
            8 => Palette {
                background: "#FFFFFF",
                fill: "#FDF6E4",
                container_fill: "#E7E9EE",
                stroke: "#010E31",
                text: "#010E31",
                edge: "#010E31",
            },
            // Dark mauve
            200 => Palette {
                background: "#1E1E2E",
                fill: "#313244",
                container_fill: "#45475A",
                stroke: "#CBA6F7",
                text: "#CDD6F4",
                edge: "#CBA6F7",
            },
            // Terminal
            300 => Palette {
                background: "#FFFFFF",
                fill: "#FFFFFF",
                container_fill: "#FFFFFF",
                stroke: "#000410",
                text: "#000410",
                edge: "#000410",
            },
            other => return Err(RenderError::UnknownTheme(other)),
        };
        Ok(palette)
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("unsupported export format '{0}' (expected svg, png or pdf)")]
    UnsupportedFormat(String),
    #[error("unknown theme id {0}")]
    UnknownTheme(i64),
    #[error("failed to compile diagram: {0}")]
    Compile(#[from] CompileError),
    #[error("no converter available for {format} (install rsvg-convert or ImageMagick)")]
    ConverterUnavailable { format: ExportFormat },
    #[error("{tool} failed: {message}")]
    Converter { tool: String, message: String },
}

/// Built-in [`Renderer`]: compile, lay out as nested boxes, emit SVG, convert if needed.
#[derive(Debug, Clone, Default)]
pub struct SvgRenderer {
    converters: ConverterChain,
}

impl SvgRenderer {
    pub fn new(converters: ConverterChain) -> Self {
        Self { converters }
    }
}

impl Renderer for SvgRenderer {
    fn render(
        &self,
        text: &str,
        format: ExportFormat,
        theme: Theme,
    ) -> Result<Vec<u8>, RenderError> {
        let palette = theme.palette()?;
        let graph = compile(text)?;
        let svg = render_svg(&graph, &palette);
        match format {
            ExportFormat::Svg => Ok(svg.into_bytes()),
            ExportFormat::Png | ExportFormat::Pdf => {
                self.converters.convert(svg.as_bytes(), format)
            }
        }
    }
}
