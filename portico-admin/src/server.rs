use crate::handlers;
use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router as AxumRouter;
use portico_core::table::RouteTable;
use portico_store::ControlPlane;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

/// Multipart registrations are capped at 16 MiB.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for the management API.
pub struct AdminState {
    pub table: Arc<RouteTable>,
    pub control: Arc<ControlPlane>,
}

/// Build the management router.
pub fn build_admin_router(state: Arc<AdminState>) -> AxumRouter {
    AxumRouter::new()
        .route("/core/v1/health", get(handlers::health::health_check))
        .route(
            "/core/v1/routes",
            get(handlers::routes::list_routes).post(handlers::routes::create_route),
        )
        .route("/core/v1/routes/{label}", get(handlers::routes::get_route))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Start the management API server.
pub async fn start_admin(addr: SocketAddr, state: Arc<AdminState>) -> anyhow::Result<()> {
    let app = build_admin_router(state);
    info!(addr = %addr, "starting management API");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
