//! Slug availability handler.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::model::PageId;
use crate::writer::SlugCheck;

use super::super::state::AppState;

#[derive(Debug, Deserialize, Default)]
pub struct SlugQuery {
    /// Page being edited; its own mapping does not count as taken.
    pub page_id: Option<String>,
}

/// `GET /api/v1/slugs/{slug}[?page_id=]`
pub async fn check_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<SlugQuery>,
) -> Json<SlugCheck> {
    let current = query.page_id.map(PageId::from);
    Json(state.service().check_slug(&slug, current.as_ref()).await)
}
