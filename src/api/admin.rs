use super::{AdminToken, ApiError, ApiResult, AppState};
use crate::auth::AdminAuthService;
use crate::backup::{BackupService, RestoreError};
use crate::notify::{CommentNotification, DingTalkNotifier};
use anyhow::Context;
use axum::extract::State;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginResponse {
    success: bool,
    token: String,
    #[serde(rename = "expiresAt")]
    expires_at: String,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Username and password are required".into(),
        ));
    }
    let auth = AdminAuthService::new(state.database.clone(), state.config.admin.clone());
    match auth.login(&username, &password)? {
        Some(issued) => Ok(Json(LoginResponse {
            success: true,
            token: issued.token,
            expires_at: issued.expires_at,
        })),
        None => Err(ApiError::Unauthorized("用户名或密码错误".into())),
    }
}

pub(crate) async fn export_backup(
    State(state): State<AppState>,
    _token: AdminToken,
) -> Result<Response, ApiError> {
    let service = BackupService::new(state.database.clone());
    let document = service.export()?;
    let filename = format!("guestbook_backup_{}.json", Utc::now().format("%Y-%m-%d"));
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .context("backup filename not header-safe")?;
    let mut response = Json(document).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    Ok(response)
}

pub(crate) async fn restore_backup(
    State(state): State<AppState>,
    _token: AdminToken,
    payload: Option<Json<Value>>,
) -> ApiResult<Value> {
    let Some(Json(document)) = payload else {
        return Err(ApiError::BadRequest("Backup data is required".into()));
    };
    let service = BackupService::new(state.database.clone());
    match service.restore(&document) {
        Ok(restored) => Ok(Json(json!({
            "success": true,
            "message": "Database restored successfully",
            "restoredCount": restored,
        }))),
        Err(RestoreError::Validation(msg)) => Err(ApiError::BadRequest(msg)),
        Err(RestoreError::Transaction(err)) => {
            tracing::error!(error = ?err, "restore transaction failed");
            Err(ApiError::Server(format!("Failed to restore database: {err:#}")))
        }
    }
}

/// Fires a canned notification so the robot wiring can be checked end to
/// end without submitting a real comment.
pub(crate) async fn test_dingtalk(
    State(state): State<AppState>,
    _token: AdminToken,
) -> ApiResult<Value> {
    let notifier = DingTalkNotifier::new(state.config.dingtalk.clone(), state.http_client.clone());
    let notification = CommentNotification {
        name: "QQ:123****678".into(),
        content: "这是一条测试留言".into(),
        ip: Some("220.128.168.9".into()),
        location: Some("广东省广州市".into()),
        comment_id: format!("test_{}", Utc::now().timestamp_millis()),
    };
    notifier.dispatch(notification).await;
    Ok(Json(json!({
        "success": true,
        "message": "测试通知已发送，请检查钉钉群",
    })))
}
