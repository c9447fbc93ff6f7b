use super::{ApiError, ApiResult, AppState};
use crate::location::GeoLocator;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub(crate) struct LocationParams {
    #[serde(default)]
    ip: Option<String>,
}

pub(crate) async fn lookup_location(
    State(state): State<AppState>,
    Query(params): Query<LocationParams>,
) -> ApiResult<Value> {
    let Some(ip) = params.ip.filter(|ip| !ip.is_empty()) else {
        return Err(ApiError::BadRequest("Missing IP parameter".into()));
    };
    let locator = GeoLocator::new(state.config.location.clone(), state.http_client.clone());
    let location = locator.locate(&ip).await;
    Ok(Json(json!({ "ip": ip, "location": location })))
}
