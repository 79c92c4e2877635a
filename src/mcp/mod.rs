// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! Each tool maps one named remote call onto a [`DiagramStore`](crate::store::DiagramStore)
//! operation and translates store errors into protocol error codes.

mod server;
mod types;

pub use server::TrellisMcp;
