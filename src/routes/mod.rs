pub mod health;
pub mod vitals;

use axum::Router;
use tower_http::cors::CorsLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest(
            "/api",
            Router::new()
                .merge(vitals::router())
                .merge(crate::openapi::router()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoints_report_ok() -> anyhow::Result<()> {
        let state = crate::test_support::test_state().await?;
        for uri in ["/health", "/healthz"] {
            let resp = router(state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty())?)
                .await?;
            assert_eq!(resp.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
            let body: serde_json::Value = serde_json::from_slice(&bytes)?;
            assert_eq!(body, serde_json::json!({ "status": "ok" }));
        }
        Ok(())
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() -> anyhow::Result<()> {
        let state = crate::test_support::test_state().await?;
        let resp = router(state)
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty())?)
            .await?;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        Ok(())
    }
}
