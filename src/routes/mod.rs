//! Route modules for the anchoring server

pub mod anchoring;
pub mod documents;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api/v1/documents",
            documents::router().merge(anchoring::router()),
        )
        .with_state(state)
}


#[cfg(test)]
mod tests {
    use super::test_support::send;
    use super::*;
    use crate::config::Config;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_health() {
        let app = app(AppState::new(Config::default()));
        let (status, body) = send(&app, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
