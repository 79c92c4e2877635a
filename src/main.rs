// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Trellis-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Trellis and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Trellis CLI entrypoint.
//!
//! By default this serves MCP over streamable HTTP at `http://127.0.0.1:27436/mcp`.
//!
//! Use `--transport stdio` to serve MCP over stdio instead (intended for tool integrations).
//! Logs always go to stderr.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use clap::{Parser, ValueEnum};
use rmcp::transport::{
    streamable_http_server::session::local::LocalSessionManager, StreamableHttpServerConfig,
    StreamableHttpService,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use trellis::mcp::TrellisMcp;
use trellis::store::DiagramStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Transport {
    Stdio,
    Http,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// MCP transport to serve.
    #[arg(long, value_enum, default_value = "http")]
    transport: Transport,
    /// Bind address for the HTTP transport.
    #[arg(long, default_value = "127.0.0.1:27436")]
    addr: SocketAddr,
    /// Mount path of the MCP endpoint.
    #[arg(long, default_value = "/mcp")]
    endpoint_path: String,
    /// Directory for saved and rendered files (default: <tmp>/trellis_output).
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Log filter, e.g. `info` or `trellis=debug`; `RUST_LOG` wins when set.
    #[arg(long, env = "TRELLIS_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn store(&self) -> DiagramStore {
        match &self.output_dir {
            Some(dir) => DiagramStore::default().with_output_dir(dir.clone()),
            None => DiagramStore::default(),
        }
    }

    fn endpoint_path(&self) -> String {
        let path = self.endpoint_path.trim().trim_end_matches('/');
        if path.starts_with('/') {
            path.to_owned()
        } else {
            format!("/{path}")
        }
    }
}

fn setup_logging(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.trim()));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn serve_http(
    cli: &Cli,
    mcp: TrellisMcp,
    shutdown: CancellationToken,
) -> Result<(), Box<dyn Error>> {
    let listener = tokio::net::TcpListener::bind(cli.addr).await?;
    let path = cli.endpoint_path();
    info!(addr = %listener.local_addr()?, %path, "serving MCP over streamable HTTP");

    let config = StreamableHttpServerConfig {
        stateful_mode: true,
        cancellation_token: shutdown.child_token(),
        ..StreamableHttpServerConfig::default()
    };

    let session_manager = Arc::new(LocalSessionManager::default());
    let mcp_service = StreamableHttpService::new(move || Ok(mcp.clone()), session_manager, config);

    let router = Router::new().nest_service(&path, mcp_service);
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let result = (|| -> Result<(), Box<dyn Error>> {
        let shutdown = CancellationToken::new();
        let mcp = TrellisMcp::new_shared(Arc::new(cli.store()), shutdown.clone());
        info!(output_dir = %mcp.store().output_dir().display(), "diagram store ready");

        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(async {
            let signal = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutting down");
                    signal.cancel();
                }
            });

            match cli.transport {
                Transport::Stdio => mcp.serve_stdio().await?,
                Transport::Http => serve_http(&cli, mcp, shutdown).await?,
            }
            Ok::<(), Box<dyn Error>>(())
        })
    })();

    if let Err(err) = result {
        error!(%err, "trellis failed");
        eprintln!("trellis: {err}");
        std::process::exit(1);
    }
}
