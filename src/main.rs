use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use lanshare::config::{load_config, ShareConfig};
use lanshare::http::HttpServer;
use lanshare::observability::{init_logging, init_metrics};

#[derive(Parser, Debug)]
#[command(name = "lanshare", about = "Share a directory over HTTP on the local network")]
struct Args {
    /// Path to the TOML config file. Defaults are used when the file
    /// does not exist.
    #[arg(long, env = "LANSHARE_CONFIG", default_value = "lanshare.toml")]
    config: PathBuf,

    /// Override the configured bind address.
    #[arg(long, env = "LANSHARE_BIND")]
    bind: Option<String>,

    /// Override the configured root directory.
    #[arg(long, env = "LANSHARE_ROOT")]
    root: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        load_config(&args.config)?
    } else {
        ShareConfig::default()
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }
    if let Some(root) = args.root {
        config.serve.root_dir = root;
    }

    init_logging(&config.observability.log_level);
    if config.observability.metrics_enabled {
        init_metrics(config.observability.metrics_address.parse()?);
    }

    let addr: SocketAddr = config.listener.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;

    tracing::info!(root = %config.serve.root_dir.display(), "sharing directory");
    tracing::info!("local:   http://127.0.0.1:{}/", local.port());
    if let Some(ip) = local_ip() {
        tracing::info!("network: http://{ip}:{}/", local.port());
    }

    HttpServer::new(&config)?.run(listener).await?;
    Ok(())
}

/// Best-effort LAN address discovery: the kernel picks the outbound
/// interface for a UDP connect, no packet is sent.
fn local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}
