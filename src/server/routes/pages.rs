//! Page listing, saving and deletion handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::aggregate::Aggregation;
use crate::model::{ComponentId, PageId, PageSummary};
use crate::navigation::Navigation;
use crate::writer::{PageDraft, SaveReport, WriteReport};

use super::super::{error::ApiError, state::AppState};

/// Query parameters for listing pages.
#[derive(Debug, Deserialize, Default)]
pub struct ListQuery {
    /// Only this author's pages, most recently updated first.
    pub author: Option<String>,
}

/// Query parameters identifying the acting author.
#[derive(Debug, Deserialize, Default)]
pub struct AuthorQuery {
    pub author: Option<String>,
}

impl AuthorQuery {
    fn require(self) -> Result<String, ApiError> {
        self.author
            .filter(|author| !author.is_empty())
            .ok_or_else(|| ApiError::missing_parameter("author"))
    }
}

/// `GET /api/v1/pages[?author=]`
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PageSummary>>, ApiError> {
    let cancel = state.request_token();
    let index = match state.service().index(&cancel).await {
        Aggregation::Committed { value, .. } => value,
        Aggregation::Cancelled => return Err(ApiError::unavailable()),
    };

    let pages = match query.author {
        Some(author) => index.by_author(&author),
        None => index.into_pages(),
    };
    Ok(Json(pages))
}

/// `PUT /api/v1/pages`
pub async fn create_page(
    State(state): State<AppState>,
    Json(draft): Json<PageDraft>,
) -> Result<(StatusCode, Json<SaveReport>), ApiError> {
    save(&state, draft).await
}

/// `PUT /api/v1/pages/{page_id}`
pub async fn update_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Json(mut draft): Json<PageDraft>,
) -> Result<(StatusCode, Json<SaveReport>), ApiError> {
    draft.id = Some(PageId::from(page_id));
    save(&state, draft).await
}

async fn save(
    state: &AppState,
    draft: PageDraft,
) -> Result<(StatusCode, Json<SaveReport>), ApiError> {
    let report = state.service().save(draft).await?;
    let status = if report.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(report)))
}

/// `DELETE /api/v1/pages/{page_id}?author=`
pub async fn delete_page(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<WriteReport>, ApiError> {
    let author = query.require()?;
    let report = state
        .service()
        .delete_page(&PageId::from(page_id), &author)
        .await?;
    Ok(Json(report))
}

/// `DELETE /api/v1/pages/{page_id}/components/{component_id}?author=`
pub async fn delete_component(
    State(state): State<AppState>,
    Path((page_id, component_id)): Path<(String, String)>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<WriteReport>, ApiError> {
    let author = query.require()?;
    let report = state
        .service()
        .delete_component(
            &PageId::from(page_id),
            &ComponentId::from(component_id),
            &author,
        )
        .await?;
    Ok(Json(report))
}

/// `GET /api/v1/pages/{page_id}/navigation`
pub async fn navigation(
    State(state): State<AppState>,
    Path(page_id): Path<String>,
) -> Result<Json<Navigation>, ApiError> {
    let cancel = state.request_token();
    let Some(navigation) = state
        .service()
        .navigation(&PageId::from(page_id.as_str()), &cancel)
        .await
    else {
        return Err(ApiError::unavailable());
    };

    if navigation.position.is_none() {
        return Err(ApiError::page_not_found(&page_id));
    }
    Ok(Json(navigation))
}
