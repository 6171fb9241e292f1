//! API routes and handlers.

mod pages;
mod slugs;
mod view;

use axum::{
    Json, Router,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, put},
};
use serde::Deserialize;

use crate::aggregate::Aggregation;
use crate::model::PageId;

use super::{error::ApiError, state::AppState};

/// Build the API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/pages", get(pages::list_pages).put(pages::create_page))
        .route(
            "/pages/{page_id}",
            put(pages::update_page).delete(pages::delete_page),
        )
        .route(
            "/pages/{page_id}/components/{component_id}",
            delete(pages::delete_component),
        )
        .route("/pages/{page_id}/navigation", get(pages::navigation))
        .route("/slugs/{slug}", get(slugs::check_slug));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/view/{page_id}", get(view::view_by_id))
        .route("/{slug}", get(view::view_by_slug))
        .nest("/api/v1", api)
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Query parameters accepted on `/`.
#[derive(Debug, Deserialize, Default)]
pub struct RootQuery {
    /// Old share links: `/?page=<id>`.
    pub page: Option<String>,
    /// Open a page in the editor.
    pub edit: Option<String>,
    pub author: Option<String>,
}

/// Page index, legacy `?page=` redirect, or editor state for `?edit=`.
async fn root(
    State(state): State<AppState>,
    Query(query): Query<RootQuery>,
) -> Result<Response, ApiError> {
    if let Some(page) = query.page.filter(|page| !page.is_empty()) {
        if !is_plain_id(&page) {
            return Err(ApiError::page_not_found(&page));
        }
        return Ok(Redirect::permanent(&format!("/view/{}", page)).into_response());
    }

    let cancel = state.request_token();

    if let Some(edit) = query.edit.filter(|edit| !edit.is_empty()) {
        let author = query
            .author
            .ok_or_else(|| ApiError::missing_parameter("author"))?;
        let page = state
            .service()
            .editor(&PageId::from(edit), &author, &cancel)
            .await?;
        return Ok(Json(page).into_response());
    }

    match state.service().index(&cancel).await {
        Aggregation::Committed { value, .. } => Ok(Json(value).into_response()),
        Aggregation::Cancelled => Err(ApiError::unavailable()),
    }
}

/// Ids that can be placed in a redirect target as-is.
fn is_plain_id(id: &str) -> bool {
    id.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
