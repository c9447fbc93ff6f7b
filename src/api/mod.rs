mod admin;
mod comments;
mod location;

use crate::auth::AdminAuthService;
use crate::config::GuestbookConfig;
use crate::database::Database;
use crate::utils::now_utc_iso;
use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: GuestbookConfig,
    pub database: Database,
    pub http_client: reqwest::Client,
}

pub(crate) type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    NotFound(String),
    /// Server-side failure whose message is part of the API contract
    /// (restore errors carry the underlying cause to the caller).
    Server(String),
    Internal(anyhow::Error),
}

impl ApiError {
    fn into_response_parts(self) -> (StatusCode, ErrorResponse) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse { error: msg }),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ErrorResponse { error: msg }),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse { error: msg }),
            ApiError::Server(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse { error: msg }),
            ApiError::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.into_response_parts();
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

/// Extractor for admin-gated handlers. Rejects before the handler body runs
/// when the bearer token is missing, unknown, or expired; store errors fail
/// closed to unauthorized.
pub(crate) struct AdminToken;

#[axum::async_trait]
impl FromRequestParts<AppState> for AdminToken {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            return Err(ApiError::Unauthorized("Unauthorized".into()));
        };
        let auth = AdminAuthService::new(state.database.clone(), state.config.admin.clone());
        let authorized = auth.authorize(token).unwrap_or_else(|err| {
            tracing::error!("token check failed: {}", err);
            false
        });
        if !authorized {
            return Err(ApiError::Unauthorized("Invalid token".into()));
        }
        Ok(AdminToken)
    }
}

pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
    message: &'static str,
    database: &'static str,
    version: &'static str,
    timestamp: String,
    path: String,
}

pub(crate) async fn health_handler(State(state): State<AppState>, uri: Uri) -> Json<HealthResponse> {
    let database = match state.database.ping() {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!("database ping failed: {}", err);
            "not connected"
        }
    };
    Json(HealthResponse {
        status: "ok",
        message: "Comment API is running",
        database,
        version: env!("CARGO_PKG_VERSION"),
        timestamp: now_utc_iso(),
        path: uri.path().to_string(),
    })
}

async fn not_found_handler(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Not Found",
            "path": uri.path(),
            "method": method.as_str(),
        })),
    )
}

/// Tries to bind to the given port, or finds the next available port
async fn find_available_port(start_port: u16) -> Result<(TcpListener, u16)> {
    const MAX_PORT_ATTEMPTS: u16 = 100;

    for offset in 0..MAX_PORT_ATTEMPTS {
        let port = start_port + offset;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        match TcpListener::bind(addr).await {
            Ok(listener) => return Ok((listener, port)),
            Err(e) => {
                if offset == 0 {
                    tracing::debug!(port, error = %e, "Port in use, trying next port");
                }
                continue;
            }
        }
    }

    anyhow::bail!(
        "Could not find available port in range {}-{}",
        start_port,
        start_port + MAX_PORT_ATTEMPTS - 1
    )
}

pub async fn serve_http(config: GuestbookConfig, database: Database) -> Result<()> {
    let http_client = reqwest::Client::builder()
        .user_agent("Guestbook/0.1.0")
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("failed to build shared HTTP client")?;

    let state = AppState {
        config: config.clone(),
        database,
        http_client,
    };

    let router = Router::new()
        .route("/", get(health_handler))
        .route("/health", get(health_handler))
        .route("/api", get(health_handler))
        .route(
            "/api/comments",
            get(comments::list_comments).post(comments::submit_comment),
        )
        .route("/api/comments/:id/approve", post(comments::approve_comment))
        .route("/api/comments/:id/reply", post(comments::reply_comment))
        .route("/api/comments/:id/edit", put(comments::edit_comment))
        .route("/api/comments/:id", delete(comments::delete_comment))
        .route("/api/location", get(location::lookup_location))
        .route("/api/test-dingtalk", get(admin::test_dingtalk))
        .route("/api/admin/login", post(admin::login))
        .route("/api/admin/backup", get(admin::export_backup))
        .route("/api/admin/restore", post(admin::restore_backup))
        .fallback(not_found_handler)
        // restore documents can outgrow the default body cap
        .layer(DefaultBodyLimit::max(16 * 1024 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let (listener, actual_port) = find_available_port(config.api_port).await?;
    let addr = SocketAddr::from(([0, 0, 0, 0], actual_port));

    if actual_port != config.api_port {
        tracing::warn!(
            requested_port = config.api_port,
            actual_port = actual_port,
            "Configured port was in use, bound to next available port"
        );
    }

    tracing::info!(?addr, "HTTP server listening");
    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
