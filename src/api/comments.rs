use super::{bearer_token, AdminToken, ApiError, ApiResult, AppState};
use crate::auth::AdminAuthService;
use crate::comments::{CommentService, CreateCommentInput, SubmittedComment};
use crate::location::GeoLocator;
use crate::notify::{CommentNotification, DingTalkNotifier};
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct ListCommentsParams {
    // kept as raw strings so junk values fall back to defaults instead of
    // failing query extraction
    #[serde(default)]
    page: Option<String>,
    #[serde(default)]
    limit: Option<String>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    admin: Option<String>,
}

fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Query(params): Query<ListCommentsParams>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let service = CommentService::new(state.database.clone());

    match params.action.as_deref() {
        Some("replied-count") => {
            let count = service.replied_count()?;
            return Ok(Json(json!({ "count": count })).into_response());
        }
        Some("pending-count") => {
            let count = service.pending_count()?;
            return Ok(Json(json!({ "count": count })).into_response());
        }
        _ => {}
    }

    let admin = params.admin.as_deref() == Some("true");
    if admin {
        let Some(token) = bearer_token(&headers) else {
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
    }

    let page = positive_or(params.page.as_deref(), 1);
    let limit = positive_or(params.limit.as_deref(), 10);
    let page_view = service.list_page(page, limit, admin)?;
    Ok(Json(page_view).into_response())
}

pub(crate) async fn submit_comment(
    State(state): State<AppState>,
    Json(mut input): Json<CreateCommentInput>,
) -> ApiResult<SubmittedComment> {
    // fill in the region for clients that only send their address
    let needs_location = input
        .location
        .as_deref()
        .map_or(true, |location| location.is_empty());
    if needs_location {
        if let Some(ip) = input.ip.as_deref().filter(|ip| !ip.is_empty()) {
            let locator = GeoLocator::new(state.config.location.clone(), state.http_client.clone());
            input.location = Some(locator.locate(ip).await);
        }
    }
    let submitter_ip = input.ip.clone();

    let service = CommentService::new(state.database.clone());
    match service.create(input) {
        Ok(submitted) => {
            let notifier =
                DingTalkNotifier::new(state.config.dingtalk.clone(), state.http_client.clone());
            let notification = CommentNotification {
                name: submitted.name.clone(),
                content: submitted.content.clone(),
                ip: submitter_ip,
                location: submitted.location.clone(),
                comment_id: submitted.id.to_string(),
            };
            tokio::spawn(async move { notifier.dispatch(notification).await });
            Ok(Json(submitted))
        }
        Err(err) if err.to_string().contains("Missing required fields") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

pub(crate) async fn approve_comment(
    State(state): State<AppState>,
    _token: AdminToken,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = CommentService::new(state.database.clone());
    if !service.approve(id)? {
        return Err(ApiError::NotFound(format!("comment {id} not found")));
    }
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReplyRequest {
    #[serde(default)]
    reply: Option<String>,
}

pub(crate) async fn reply_comment(
    State(state): State<AppState>,
    _token: AdminToken,
    Path(id): Path<i64>,
    Json(payload): Json<ReplyRequest>,
) -> ApiResult<Value> {
    let service = CommentService::new(state.database.clone());
    let reply = payload.reply.unwrap_or_default();
    match service.reply(id, &reply) {
        Ok(true) => Ok(Json(json!({ "success": true }))),
        Ok(false) => Err(ApiError::NotFound(format!("comment {id} not found"))),
        Err(err) if err.to_string().contains("Missing reply content") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditRequest {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    approved: Option<bool>,
}

pub(crate) async fn edit_comment(
    State(state): State<AppState>,
    _token: AdminToken,
    Path(id): Path<i64>,
    Json(payload): Json<EditRequest>,
) -> ApiResult<Value> {
    let service = CommentService::new(state.database.clone());
    let content = payload.content.unwrap_or_default();
    match service.edit(id, &content, payload.approved) {
        Ok(true) => Ok(Json(json!({ "success": true }))),
        Ok(false) => Err(ApiError::NotFound(format!("comment {id} not found"))),
        Err(err) if err.to_string().contains("Missing content") => {
            Err(ApiError::BadRequest(err.to_string()))
        }
        Err(err) => Err(ApiError::Internal(err)),
    }
}

pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    _token: AdminToken,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let service = CommentService::new(state.database.clone());
    if !service.delete(id)? {
        return Err(ApiError::NotFound(format!("comment {id} not found")));
    }
    Ok(Json(json!({ "success": true })))
}
