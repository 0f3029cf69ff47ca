use clap::Parser;
use std::sync::Arc;

use nextdns_mcp::app::App;
use nextdns_mcp::config::Settings;
use nextdns_mcp::constants::network;
use nextdns_mcp::errors::{ConfigError, ToolError};
use nextdns_mcp::mcp::http;
use nextdns_mcp::services::logger::init_tracing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Stdio,
    Http,
}

/// Unknown names fall back to stdio.
fn parse_transport(raw: &str) -> Result<Transport, String> {
    Ok(match raw.trim().to_ascii_lowercase().as_str() {
        "http" | "streamable-http" => Transport::Http,
        _ => Transport::Stdio,
    })
}

fn parse_port(raw: &str) -> Result<u16, ConfigError> {
    raw.trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or_else(|| ConfigError::InvalidPort(raw.to_string()))
}

#[derive(Debug, Parser)]
#[command(name = "nextdns-mcp", version, about = "MCP server for the NextDNS API")]
struct Cli {
    /// stdio or http
    #[arg(long, env = "MCP_TRANSPORT", default_value = "stdio", value_parser = parse_transport)]
    transport: Transport,

    #[arg(long, env = "MCP_HOST", default_value = network::DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "MCP_PORT", default_value_t = network::DEFAULT_PORT, value_parser = parse_port)]
    port: u16,
}

#[cfg(unix)]
fn spawn_policy_reload(app: Arc<App>) {
    use nextdns_mcp::services::policy::AccessPolicyConfig;
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = match signal(SignalKind::hangup()) {
        Ok(stream) => stream,
        Err(err) => {
            app.logger
                .warn(&format!("SIGHUP reload unavailable: {}", err), None);
            return;
        }
    };
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            app.reload_access_policy(AccessPolicyConfig::from_env());
        }
    });
}

#[cfg(not(unix))]
fn spawn_policy_reload(_app: Arc<App>) {}

async fn run(cli: Cli) -> Result<(), ToolError> {
    let settings = Settings::from_env()?;
    let app = Arc::new(App::initialize(&settings)?);
    spawn_policy_reload(app.clone());

    let server = app.mcp_server();
    match cli.transport {
        Transport::Stdio => server.run_stdio().await,
        Transport::Http => http::serve(Arc::new(server), &cli.host, cli.port).await,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting NextDNS MCP server");

    if let Err(err) = run(cli).await {
        eprintln!("nextdns-mcp: {}", err);
        std::process::exit(1);
    }
}
