//! Public page views.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::model::PageId;
use crate::resolver::Resolution;
use crate::service::PageView;

use super::super::{error::ApiError, state::AppState};

/// `GET /view/{page_id}`
pub async fn view_by_id(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<PageView>, ApiError> {
    let cancel = state.request_token();
    match state.service().view(&PageId::from(page_id.as_str()), &cancel).await {
        Some(view) => Ok(Json(view)),
        None if cancel.is_cancelled() => Err(ApiError::unavailable()),
        None => Err(ApiError::page_not_found(&page_id)),
    }
}

/// `GET /{slug}`
pub async fn view_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<PageView>, ApiError> {
    let page_id = match state.service().resolve(&slug).await {
        Resolution::Found { page_id, .. } => page_id,
        Resolution::NotFound => return Err(ApiError::slug_not_found(&slug)),
    };

    let cancel = state.request_token();
    match state.service().view(&page_id, &cancel).await {
        Some(view) => Ok(Json(view)),
        None if cancel.is_cancelled() => Err(ApiError::unavailable()),
        None => Err(ApiError::page_not_found(page_id.as_str())),
    }
}
