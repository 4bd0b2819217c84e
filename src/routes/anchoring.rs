//! Anchoring API endpoints
//!
//! - `POST /:id/anchor` resolves selectors to a page range
//! - `POST /:id/describe` turns a page range into selectors
//! - `POST /:id/purge` drops the document's caches

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::anchoring::{AnchorError, PageSource, Strategy};
use crate::error::Result;
use crate::routes::documents::find_engine;
use crate::selectors::Selector;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/:id/anchor", post(anchor))
        .route("/:id/describe", post(describe))
        .route("/:id/purge", post(purge))
}

#[derive(Debug, Deserialize)]
pub struct AnchorRequest {
    pub selectors: Vec<Selector>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorResponse {
    pub page_index: usize,
    /// Start offset within the page's text
    pub start: usize,
    /// End offset within the page's text
    pub end: usize,
    /// Text covered by the range
    pub text: String,
    /// The page has not rendered and the range wraps a placeholder
    pub placeholder: bool,
    pub strategy: Strategy,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescribeRequest {
    pub page_index: usize,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Serialize)]
pub struct DescribeResponse {
    pub selectors: Vec<Selector>,
}

async fn anchor(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AnchorRequest>,
) -> Result<Json<AnchorResponse>> {
    let engine = find_engine(&state, &id).await?;
    let anchored = engine.anchor_detailed(&request.selectors).await?;
    let resolved = anchored.resolved;

    Ok(Json(AnchorResponse {
        page_index: resolved.page_index,
        start: resolved.start,
        end: resolved.end,
        text: engine.source().range_text(&resolved.range),
        placeholder: resolved.placeholder,
        strategy: anchored.strategy,
    }))
}

async fn describe(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DescribeRequest>,
) -> Result<Json<DescribeResponse>> {
    let engine = find_engine(&state, &id).await?;
    let document = engine.source().as_ref();

    let page_count = document.page_count();
    if request.page_index >= page_count {
        return Err(AnchorError::InvalidPageIndex {
            index: request.page_index,
            page_count,
        }
        .into());
    }

    let range = document.text_range(request.page_index, request.start, request.end);
    let selectors = engine.describe(document, &range).await?;

    Ok(Json(DescribeResponse {
        selectors: selectors.into_selectors(),
    }))
}

async fn purge(State(state): State<AppState>, Path(id): Path<String>) -> Result<StatusCode> {
    find_engine(&state, &id).await?.purge_cache();
    Ok(StatusCode::NO_CONTENT)
}
