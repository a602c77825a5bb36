use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::frame::{CONTENT_TYPE, CONTENT_TYPE_TEXT, encode_envelope};
use crate::mlmd::SERVICE_NAME;
use crate::status::StatusCode as GrpcStatus;

/// A pre-encoded response body for one method.
#[derive(Debug, Clone)]
pub struct Route {
    pub body: Bytes,
    pub status: u32,
}

pub type RouteTable = HashMap<String, Route>;

#[derive(Clone)]
pub struct AppState {
    start_time: Instant,
    port: u16,
    routes: Arc<RouteTable>,
}

impl AppState {
    pub fn new(port: u16, routes: RouteTable) -> Self {
        Self {
            start_time: Instant::now(),
            port,
            routes: Arc::new(routes),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime: u64,
    routes: usize,
    port: u16,
}

/// Encode every configured route once, up front.
pub fn build_routes(config: &AppConfig) -> anyhow::Result<RouteTable> {
    let mut table = RouteTable::new();
    for (method, route) in config.resolved_routes()? {
        let payload = route.load_payload()?;
        let body = encode_envelope(&payload, route.status, &route.message)
            .with_context(|| format!("Failed to encode response for {method}"))?;
        debug!(
            "Route {method}: {} byte payload, grpc-status {}",
            payload.len(),
            route.status
        );
        table.insert(
            method,
            Route {
                body: Bytes::from(body),
                status: route.status,
            },
        );
    }
    Ok(table)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        routes: state.routes.len(),
        port: state.port,
    })
}

fn wants_text(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(CONTENT_TYPE_TEXT))
}

async fn mlmd_handler(
    State(state): State<AppState>,
    Path((namespace, service, method)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    let body = match state.routes.get(&method) {
        Some(route) => {
            debug!(
                "{namespace}/{service} {method} -> grpc-status {}",
                route.status
            );
            route.body.clone()
        }
        None => {
            warn!("{namespace}/{service} requested unknown method {method}");
            let message = format!("unknown method: {method}");
            match encode_envelope(&[], GrpcStatus::Unimplemented.code(), &message) {
                Ok(body) => Bytes::from(body),
                Err(e) => return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
            }
        }
    };

    if wants_text(&headers) {
        ([(header::CONTENT_TYPE, CONTENT_TYPE_TEXT)], STANDARD.encode(&body)).into_response()
    } else {
        ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let mlmd_path = format!("/api/service/mlmd/{{namespace}}/{{service}}/{SERVICE_NAME}/{{method}}");
    Router::new()
        .route("/health", get(health_handler))
        .route(&mlmd_path, post(mlmd_handler))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Bind to localhost and serve until ctrl-c.
pub async fn start_server(config: &AppConfig) -> anyhow::Result<()> {
    let routes = build_routes(config)?;
    let port = config.port;

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::AddrInUse {
            anyhow::anyhow!("mlmd-mock is already running (port {} in use)", port)
        } else {
            anyhow::anyhow!("Failed to bind port {}: {}", port, e)
        }
    })?;

    info!(
        "Mock metadata store listening on http://{} ({} routes)",
        addr,
        routes.len()
    );

    let app = router(AppState::new(port, routes));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;
    Ok(())
}
