// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// MCP server helper functions:
/// store error mapping, argument parsing, and response shaping.
fn session_error(err: SessionError) -> ErrorData {
    let message = err.to_string();
    match (&err, err.kind()) {
        (SessionError::FallbackCompile { text, .. }, _) => {
            ErrorData::invalid_params(message, Some(serde_json::json!({ "text": text })))
        }
        (_, ErrorKind::Validation | ErrorKind::Compile | ErrorKind::EditRejected) => {
            ErrorData::invalid_params(message, None)
        }
        (_, ErrorKind::NotFound) => ErrorData::resource_not_found(message, None),
        (_, ErrorKind::Render | ErrorKind::Io | ErrorKind::Cancelled) => {
            ErrorData::internal_error(message, None)
        }
    }
}

fn parse_format(raw: Option<&str>) -> Result<ExportFormat, ErrorData> {
    let raw = raw.unwrap_or_default();
    ExportFormat::from_str(raw).map_err(|err| {
        ErrorData::invalid_params(err.to_string(), Some(serde_json::json!({ "format": raw })))
    })
}

fn optional_path(raw: Option<String>) -> Option<PathBuf> {
    raw.filter(|path| !path.trim().is_empty()).map(PathBuf::from)
}

fn rendered_output(format: ExportFormat, bytes: Vec<u8>) -> Result<RenderedOutput, ErrorData> {
    let data = if format.is_binary() {
        format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(&bytes))
    } else {
        String::from_utf8(bytes).map_err(|err| {
            ErrorData::internal_error(format!("renderer produced invalid UTF-8: {err}"), None)
        })?
    };
    Ok(RenderedOutput {
        format: format.to_string(),
        mime_type: format.mime_type().to_owned(),
        data,
    })
}

/// `new_parent.<leaf of key>`, or the bare leaf when moving to the root.
fn move_target(key: &str, new_parent: &str) -> String {
    let leaf = leaf_name(key.trim());
    let new_parent = new_parent.trim();
    if new_parent.is_empty() {
        leaf.to_owned()
    } else {
        format!("{new_parent}.{leaf}")
    }
}

fn edit_response(result: EditResult) -> EditResponse {
    EditResponse {
        success: result.success,
        key_adjusted: result.key_adjusted(),
        requested_key: result.requested_key,
        new_key: result.new_key,
        id_deltas: result.id_deltas,
        graph: result.graph,
    }
}
