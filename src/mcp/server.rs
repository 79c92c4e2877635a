// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::{Json, Parameters};
use rmcp::model::{ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData, ServerHandler, ServiceExt};
use tokio_util::sync::CancellationToken;

use crate::model::key::leaf_name;
use crate::ops::EditResult;
use crate::render::{ExportFormat, Theme};
use crate::store::{DiagramStore, ErrorKind, SessionError};

use super::types::*;

#[derive(Clone)]
pub struct TrellisMcp {
    store: Arc<DiagramStore>,
    cancel: CancellationToken,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl TrellisMcp {
    pub fn new(store: DiagramStore) -> Self {
        Self::new_shared(Arc::new(store), CancellationToken::new())
    }

    /// Shares `store` with other handlers; cancelling `cancel` aborts in-flight operations.
    pub fn new_shared(store: Arc<DiagramStore>, cancel: CancellationToken) -> Self {
        Self { store, cancel, tool_router: Self::tool_router() }
    }

    pub fn store(&self) -> &Arc<DiagramStore> {
        &self.store
    }

    pub async fn serve_stdio(self) -> Result<(), rmcp::RmcpError> {
        let service = self.serve((tokio::io::stdin(), tokio::io::stdout())).await?;
        service.waiting().await?;
        Ok(())
    }

    /// Runs a rendering store call on the blocking pool.
    async fn blocking<T, F>(&self, call: F) -> Result<T, ErrorData>
    where
        T: Send + 'static,
        F: FnOnce(&DiagramStore, &CancellationToken) -> Result<T, SessionError> + Send + 'static,
    {
        let store = self.store.clone();
        let cancel = self.cancel.clone();
        tokio::task::spawn_blocking(move || call(&store, &cancel))
            .await
            .map_err(|err| ErrorData::internal_error(format!("render task failed: {err}"), None))?
            .map_err(session_error)
    }

    /// Load diagram text under an id, replacing any existing diagram and its edit session;
    /// start here, then edit with `element.*` and read back with `diagram.serialize`.
    #[tool(name = "diagram.create")]
    async fn diagram_create(
        &self,
        params: Parameters<DiagramCreateParams>,
    ) -> Result<Json<DiagramCreateResponse>, ErrorData> {
        let DiagramCreateParams { diagram_id, content } = params.0;
        let graph = self.store.load(&diagram_id, &content, &self.cancel).map_err(session_error)?;
        Ok(Json(DiagramCreateResponse { diagram_id: diagram_id.trim().to_owned(), graph }))
    }

    /// List loaded diagrams with their element counts and edit-session state.
    #[tool(name = "diagram.list")]
    async fn diagram_list(&self) -> Result<Json<ListDiagramsResponse>, ErrorData> {
        let diagrams = self
            .store
            .list()
            .into_iter()
            .map(|summary| McpDiagramSummary {
                diagram_id: summary.id.into_string(),
                objects: summary.object_count as u64,
                edges: summary.edge_count as u64,
                has_session: summary.has_session,
                last_modified_ms: summary
                    .last_modified
                    .and_then(|at| at.duration_since(UNIX_EPOCH).ok())
                    .map(|elapsed| elapsed.as_millis() as u64),
                history_len: summary.history_len as u64,
            })
            .collect();
        Ok(Json(ListDiagramsResponse { diagrams }))
    }

    /// Canonical diagram text, reflecting every committed edit.
    #[tool(name = "diagram.serialize")]
    async fn diagram_serialize(
        &self,
        params: Parameters<DiagramIdParams>,
    ) -> Result<Json<SerializeResponse>, ErrorData> {
        let DiagramIdParams { diagram_id } = params.0;
        let content = self.store.serialize(&diagram_id, &self.cancel).map_err(session_error)?;
        Ok(Json(SerializeResponse { diagram_id: diagram_id.trim().to_owned(), content }))
    }

    /// Render a stored diagram; svg comes back as markup, png/pdf as a base64 `data:` URL.
    #[tool(name = "diagram.export")]
    async fn diagram_export(
        &self,
        params: Parameters<ExportParams>,
    ) -> Result<Json<ExportResponse>, ErrorData> {
        let ExportParams { diagram_id, format, theme } = params.0;
        let format = parse_format(format.as_deref())?;
        let theme = Theme(theme.unwrap_or_default());

        let id = diagram_id.clone();
        let bytes = self
            .blocking(move |store, cancel| store.export(&id, format, theme, cancel))
            .await?;
        let output = rendered_output(format, bytes)?;
        Ok(Json(ExportResponse { diagram_id: diagram_id.trim().to_owned(), output }))
    }

    /// Render a stored diagram and write it to disk; returns the written path.
    #[tool(name = "diagram.save")]
    async fn diagram_save(
        &self,
        params: Parameters<SaveParams>,
    ) -> Result<Json<SaveResponse>, ErrorData> {
        let SaveParams { diagram_id, format, theme, path } = params.0;
        let format = parse_format(format.as_deref())?;
        let theme = Theme(theme.unwrap_or_default());
        let path = optional_path(path);

        let id = diagram_id.clone();
        let written = self
            .blocking(move |store, cancel| store.save(&id, format, theme, path.as_deref(), cancel))
            .await?;
        Ok(Json(SaveResponse {
            diagram_id: diagram_id.trim().to_owned(),
            path: written.display().to_string(),
            format: format.to_string(),
        }))
    }

    /// Render diagram text without storing it.
    #[tool(name = "diagram.render")]
    async fn diagram_render(
        &self,
        params: Parameters<RenderParams>,
    ) -> Result<Json<RenderedOutput>, ErrorData> {
        let RenderParams { content, format, theme } = params.0;
        let format = parse_format(format.as_deref())?;
        let theme = Theme(theme.unwrap_or_default());

        let bytes = self
            .blocking(move |store, cancel| store.render(&content, format, theme, cancel))
            .await?;
        Ok(Json(rendered_output(format, bytes)?))
    }

    /// Render diagram text without storing it and write the result to disk.
    #[tool(name = "diagram.render_to_file")]
    async fn diagram_render_to_file(
        &self,
        params: Parameters<RenderToFileParams>,
    ) -> Result<Json<RenderToFileResponse>, ErrorData> {
        let RenderToFileParams { content, format, theme, path } = params.0;
        let format = parse_format(format.as_deref())?;
        let theme = Theme(theme.unwrap_or_default());
        let path = optional_path(path);

        let (written, bytes) = self
            .blocking(move |store, cancel| {
                store.render_to_file(&content, format, theme, path.as_deref(), cancel)
            })
            .await?;
        Ok(Json(RenderToFileResponse {
            path: written.display().to_string(),
            format: format.to_string(),
            bytes: bytes.len() as u64,
        }))
    }

    /// Create an object (`a.b`) or connection (`a -> b`); the engine may pick a different
    /// key when the requested one is taken, see `new_key`.
    #[tool(name = "element.create")]
    async fn element_create(
        &self,
        params: Parameters<ElementParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let ElementParams { diagram_id, board_path, key } = params.0;
        let result = self
            .store
            .create_element(&diagram_id, &board_path, &key, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(edit_response(result)))
    }

    /// Set a label or attribute (`a.shape`, `(a -> b)[0].style.stroke`); `value: null` clears it.
    #[tool(name = "element.set")]
    async fn element_set(
        &self,
        params: Parameters<ElementSetParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let ElementSetParams { diagram_id, board_path, key, tag, value } = params.0;
        let result = self
            .store
            .set_attribute(
                &diagram_id,
                &board_path,
                &key,
                tag.as_deref(),
                value.as_deref(),
                &self.cancel,
            )
            .map_err(session_error)?;
        Ok(Json(edit_response(result)))
    }

    /// Delete an element; containers take their subtree and all incident connections along.
    /// Removed ids are reported in `id_deltas` with an empty new id.
    #[tool(name = "element.delete")]
    async fn element_delete(
        &self,
        params: Parameters<ElementParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let ElementParams { diagram_id, board_path, key } = params.0;
        let result = self
            .store
            .delete_element(&diagram_id, &board_path, &key, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(edit_response(result)))
    }

    /// Move an element under `new_parent` (`""` = root), keeping its name.
    #[tool(name = "element.move")]
    async fn element_move(
        &self,
        params: Parameters<ElementMoveParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let ElementMoveParams { diagram_id, board_path, key, new_parent, include_descendants } =
            params.0;
        let new_key = move_target(&key, &new_parent);
        let result = self
            .store
            .move_element(
                &diagram_id,
                &board_path,
                &key,
                &new_key,
                include_descendants.unwrap_or(true),
                &self.cancel,
            )
            .map_err(session_error)?;
        Ok(Json(edit_response(result)))
    }

    /// Rename an object in place; connections referencing it follow (see `id_deltas`).
    #[tool(name = "element.rename")]
    async fn element_rename(
        &self,
        params: Parameters<ElementRenameParams>,
    ) -> Result<Json<EditResponse>, ErrorData> {
        let ElementRenameParams { diagram_id, board_path, key, new_name } = params.0;
        let result = self
            .store
            .rename_element(&diagram_id, &board_path, &key, &new_name, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(edit_response(result)))
    }

    /// Read one object by absolute id.
    #[tool(name = "object.read")]
    async fn object_read(
        &self,
        params: Parameters<ObjectReadParams>,
    ) -> Result<Json<ObjectReadResponse>, ErrorData> {
        let ObjectReadParams { diagram_id, board_path, object_id } = params.0;
        let object = self
            .store
            .get_object(&diagram_id, &board_path, &object_id, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(ObjectReadResponse { object }))
    }

    /// Read one connection by id (`a -> b` or `(a -> b)[1]`).
    #[tool(name = "edge.read")]
    async fn edge_read(
        &self,
        params: Parameters<EdgeReadParams>,
    ) -> Result<Json<EdgeReadResponse>, ErrorData> {
        let EdgeReadParams { diagram_id, board_path, edge_id } = params.0;
        let edge = self
            .store
            .get_edge(&diagram_id, &board_path, &edge_id, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(EdgeReadResponse { edge }))
    }

    /// List the immediate children of an object, or the root objects when `parent_id` is empty.
    #[tool(name = "object.children")]
    async fn object_children(
        &self,
        params: Parameters<ObjectChildrenParams>,
    ) -> Result<Json<ObjectChildrenResponse>, ErrorData> {
        let ObjectChildrenParams { diagram_id, board_path, parent_id } = params.0;
        let parent_id = parent_id.unwrap_or_default();
        let children = self
            .store
            .get_children(&diagram_id, &board_path, &parent_id, &self.cancel)
            .map_err(session_error)?;
        Ok(Json(ObjectChildrenResponse { parent_id, children }))
    }
}

#[tool_handler]
impl ServerHandler for TrellisMcp {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Trellis diagram editing server (tools: diagram.create, diagram.list, diagram.serialize, diagram.export, diagram.save, diagram.render, diagram.render_to_file, element.create, element.set, element.delete, element.move, element.rename, object.read, edge.read, object.children)"
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

include!("server/helpers.rs");
