//! Document API endpoints
//!
//! Registers extracted page text as an open document. Each document gets its
//! own anchoring engine, so loading a document again under the same id starts
//! from empty caches.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::anchoring::{AnchoringEngine, PageSource};
use crate::error::{AppError, Result};
use crate::memory::ExtractedDocument;
use crate::state::{AppState, DocumentEngine};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(load_document))
        .route("/:id", get(get_document).delete(unload_document))
}

/// Request body for loading a document
#[derive(Debug, Deserialize)]
pub struct LoadDocumentRequest {
    /// Document id; generated when absent
    pub id: Option<String>,
    /// Extracted text of each page, lines separated by `\n`
    pub pages: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentResponse {
    pub id: String,
    pub page_count: usize,
    pub has_text: bool,
}

/// Look up a registered document
pub(crate) async fn find_engine(state: &AppState, id: &str) -> Result<Arc<DocumentEngine>> {
    state
        .documents()
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Document not found: {}", id)))
}

async fn document_response(id: String, engine: &DocumentEngine) -> Result<DocumentResponse> {
    Ok(DocumentResponse {
        id,
        page_count: engine.source().page_count(),
        has_text: engine.document_has_text().await?,
    })
}

async fn load_document(
    State(state): State<AppState>,
    Json(request): Json<LoadDocumentRequest>,
) -> Result<(StatusCode, Json<DocumentResponse>)> {
    let id = match request.id {
        Some(id) if id.trim().is_empty() => {
            return Err(AppError::BadRequest("Document id must not be empty".to_string()))
        }
        Some(id) => id,
        None => uuid::Uuid::new_v4().to_string(),
    };

    let settings = &state.config().anchoring;
    let mut document = ExtractedDocument::from_pages(request.pages.as_slice())
        .with_context_chars(settings.context_chars);
    if settings.legacy_text_rendering {
        document = document.legacy_text_rendering();
    }

    let engine = Arc::new(AnchoringEngine::with_config(
        Arc::new(document),
        settings.engine_config(),
    ));
    let response = document_response(id.clone(), &engine).await?;

    if state.documents().contains(&id).await {
        tracing::info!("Reloading document {}", id);
    }
    state.documents().insert(id.clone(), engine).await;
    tracing::info!(
        "Loaded document {} ({} pages, has text: {})",
        id,
        response.page_count,
        response.has_text
    );

    Ok((StatusCode::CREATED, Json(response)))
}

async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>> {
    let engine = find_engine(&state, &id).await?;
    Ok(Json(document_response(id, &engine).await?))
}

async fn unload_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if !state.documents().remove(&id).await {
        return Err(AppError::NotFound(format!("Document not found: {}", id)));
    }
    tracing::info!("Unloaded document {}", id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::routes::{app, test_support::send};
    use serde_json::json;

    #[tokio::test]
    async fn test_load_and_get_document() {
        let state = AppState::new(Config::default());
        let app = app(state.clone());

        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/documents",
            Some(json!({ "id": "pride", "pages": ["It is a truth", "universally acknowledged"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["id"], "pride");
        assert_eq!(body["pageCount"], 2);
        assert_eq!(body["hasText"], true);

        let (status, body) = send(&app, "GET", "/api/v1/documents/pride", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pageCount"], 2);
        assert_eq!(state.documents().len().await, 1);
    }

    #[tokio::test]
    async fn test_generated_id_and_empty_document() {
        let app = app(AppState::new(Config::default()));
        let (status, body) = send(
            &app,
            "POST",
            "/api/v1/documents",
            Some(json!({ "pages": ["", "   "] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(uuid::Uuid::parse_str(body["id"].as_str().unwrap()).is_ok());
        assert_eq!(body["hasText"], false);
    }

    #[tokio::test]
    async fn test_unload_document() {
        let app = app(AppState::new(Config::default()));
        send(
            &app,
            "POST",
            "/api/v1/documents",
            Some(json!({ "id": "doc", "pages": ["text"] })),
        )
        .await;

        let (status, _) = send(&app, "DELETE", "/api/v1/documents/doc", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", "/api/v1/documents/doc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(&app, "DELETE", "/api/v1/documents/doc", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reload_replaces_engine() {
        let state = AppState::new(Config::default());
        let app = app(state.clone());
        let body = json!({ "id": "doc", "pages": ["text"] });

        send(&app, "POST", "/api/v1/documents", Some(body.clone())).await;
        let first = state.documents().get("doc").await.unwrap();
        send(&app, "POST", "/api/v1/documents", Some(body)).await;
        let second = state.documents().get("doc").await.unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(state.documents().len().await, 1);
    }
}
