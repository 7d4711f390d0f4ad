//! HTTP server command for the notes API

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use notesctl_server::config::{parse_addr, parse_duration};
use notesctl_server::db::MemoryNoteStore;
use notesctl_server::http::{run_server, ServerConfig};
use notesctl_server::Config;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to, `:PORT` binds all interfaces (overrides HTTP_ADDR)
    #[arg(long, short = 'b', value_parser = parse_bind)]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Serve from an in-process store instead of PostgreSQL; notes are lost on exit
    #[arg(long)]
    pub in_memory: bool,

    /// Deadline for each storage operation, e.g. 500ms or 10s (overrides REQUEST_TIMEOUT)
    #[arg(long, value_parser = parse_timeout)]
    pub request_timeout: Option<Duration>,
}

fn parse_bind(s: &str) -> Result<SocketAddr, String> {
    parse_addr(s).map_err(|e| e.to_string())
}

fn parse_timeout(s: &str) -> Result<Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration '{s}'"))
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(bind) = args.bind {
        config.http_addr = bind;
    }
    if let Some(url) = args.database_url {
        config.database_url = Some(url);
    }
    if let Some(timeout) = args.request_timeout {
        config.request_timeout = timeout;
    }

    if args.in_memory {
        tracing::warn!("Serving from the in-memory store; notes are lost on exit");
        let server_config = ServerConfig {
            bind_addr: config.http_addr,
            cors_permissive: args.cors_permissive,
            request_timeout: config.request_timeout,
        };
        run_server(Arc::new(MemoryNoteStore::new()), server_config)
            .await
            .context("Server error")?;
        return Ok(());
    }

    config.require_database_url().context(
        "Set the database via --database-url, DATABASE_URL or a .env file, or pass --in-memory",
    )?;

    tracing::info!("Starting notes API on {}", config.http_addr);

    // Blocks until shutdown
    notesctl_server::serve(config, args.cors_permissive)
        .await
        .context("Server error")?;

    Ok(())
}
