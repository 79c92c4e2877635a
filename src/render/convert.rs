// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io::{self, Write as _};
use std::process::{Command, Stdio};

use super::{ExportFormat, RenderError};

/// External SVG-to-raster program, driven over stdin/stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converter {
    tool: String,
    kind: ConverterKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConverterKind {
    Rsvg,
    ImageMagick,
}

impl Converter {
    pub fn rsvg(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), kind: ConverterKind::Rsvg }
    }

    pub fn imagemagick(tool: impl Into<String>) -> Self {
        Self { tool: tool.into(), kind: ConverterKind::ImageMagick }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    fn args(&self, format: ExportFormat) -> Vec<String> {
        let ext = format.extension();
        match self.kind {
            ConverterKind::Rsvg => vec!["-f".to_owned(), ext.to_owned()],
            ConverterKind::ImageMagick => vec!["svg:-".to_owned(), format!("{ext}:-")],
        }
    }

    fn run(&self, svg: &[u8], format: ExportFormat) -> io::Result<std::process::Output> {
        let mut child = Command::new(&self.tool)
            .args(self.args(format))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(svg) {
                // The child may have exited early; reap it before reporting.
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(err);
            }
        }
        child.wait_with_output()
    }
}

/// Ordered list of converters; the first one that is installed wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterChain {
    converters: Vec<Converter>,
}

impl Default for ConverterChain {
    fn default() -> Self {
        Self::new(vec![Converter::rsvg("rsvg-convert"), Converter::imagemagick("convert")])
    }
}

impl ConverterChain {
    pub fn new(converters: Vec<Converter>) -> Self {
        Self { converters }
    }

    pub fn converters(&self) -> &[Converter] {
        &self.converters
    }

    pub fn convert(&self, svg: &[u8], format: ExportFormat) -> Result<Vec<u8>, RenderError> {
        if format == ExportFormat::Svg {
            return Ok(svg.to_vec());
        }

        for converter in &self.converters {
            let output = match converter.run(svg, format) {
                Ok(output) => output,
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    tracing::debug!(tool = converter.tool(), "converter not installed");
                    continue;
                }
                Err(err) => {
                    return Err(RenderError::Converter {
                        tool: converter.tool().to_owned(),
                        message: err.to_string(),
                    })
                }
            };

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(RenderError::Converter {
                    tool: converter.tool().to_owned(),
                    message: format!("{} ({})", stderr.trim(), output.status),
                });
            }
            if output.stdout.is_empty() {
                return Err(RenderError::Converter {
                    tool: converter.tool().to_owned(),
                    message: "produced no output".to_owned(),
                });
            }
            return Ok(output.stdout);
        }

        Err(RenderError::ConverterUnavailable { format })
    }
}
