// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Portico — authenticated API gateway
//
//  Data plane:      HMAC-verified dispatch + reverse proxy
//  Management API:  REST surface over the route table
//  Event ingress:   identity events → key cache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use anyhow::Context;
use clap::Parser;
use portico_admin::{start_admin, AdminState};
use portico_core::config::GatewayConfig;
use portico_core::hosts;
use portico_core::table::RouteTable;
use portico_proxy::{router, Gateway};
use portico_store::{ControlPlane, EventListener, KeyStore, RedisCache, RoutePublisher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "portico", version, about = "Portico — authenticated API gateway")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ── Tracing ──
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with_target(false)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Portico starting");

    // ── Config ──
    let config = GatewayConfig::load(cli.config.as_deref())?;

    // ── Key cache ──
    let store: Arc<dyn KeyStore> = Arc::new(
        RedisCache::connect(&config.redis_url())
            .await
            .context("cannot reach key cache")?,
    );

    // ── Route table + control plane ──
    let table = Arc::new(RouteTable::new());
    let publisher = RoutePublisher::new(
        config.publish_bind.clone(),
        Duration::from_millis(config.publish_timeout_ms),
    );
    let control = Arc::new(ControlPlane::new(
        Arc::clone(&table),
        Arc::clone(&store),
        publisher,
    ));

    // ── Seed routes from the host list ──
    match hosts::load_hosts(&config.hosts_file) {
        Ok(entries) => {
            control.seed(&entries).await?;
        }
        Err(e) => {
            warn!(
                path = %config.hosts_file.display(),
                error = %e,
                "host list not loaded, starting with an empty table"
            );
        }
    }

    // ── Event ingress ──
    let ingress = EventListener::new(config.event_bind.clone(), Arc::clone(&store));
    tokio::spawn(async move {
        if let Err(e) = ingress.run().await {
            error!(error = %e, "event ingress stopped");
        }
    });

    // ── Management API ──
    let admin_state = Arc::new(AdminState {
        table: Arc::clone(&table),
        control: Arc::clone(&control),
    });
    let coreapi_addr = config.coreapi_addr()?;
    tokio::spawn(async move {
        if let Err(e) = start_admin(coreapi_addr, admin_state).await {
            error!(error = %e, "management API failed");
        }
    });
    info!(addr = %coreapi_addr, "api started");

    // ── Data plane ──
    let gateway = Arc::new(Gateway::new(Arc::clone(&table), store));
    let app = router(gateway);
    let router_addr = config.router_addr()?;
    let listener = tokio::net::TcpListener::bind(router_addr).await?;
    info!(addr = %router_addr, "router started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Portico stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
    }
}
