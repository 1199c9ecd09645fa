use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub mod handlers;
pub mod state;

pub use state::AppState;

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/discover", get(handlers::discover))
        .route("/api/stories/:id", get(handlers::get_story))
        .layer(cors)
        .with_state(Arc::new(state))
}

pub mod prelude {
    pub use sm_core::{DiscoveryResult, ExploreResult, Error, Result};
    pub use crate::{create_app, AppState};
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use sm_core::ArticleRecord;
    use sm_discovery::{DiscoveryConfig, DiscoveryEngine};
    use sm_inference::models::DummyModel;
    use sm_storage::InMemoryStorage;
    use tower::ServiceExt;

    fn article(id: &str, title: &str, year: i32) -> ArticleRecord {
        ArticleRecord {
            id: id.to_string(),
            title: Some(title.to_string()),
            content_preview: Some("The crowd filled the grandstand long before the first pitch. ".repeat(8)),
            content_length: 1800,
            publication_date: None,
            year,
            category: Some("sports".to_string()),
            existing_potential: None,
            existing_narrative_score: None,
        }
    }

    async fn app() -> Router {
        let storage = InMemoryStorage::with_articles(vec![
            article("s1", "Giants Win the Pennant in Ninth", 1951),
            article("s2", "Rookie Pitcher Shuts Out Champions", 1952),
            article("s3", "Marathon Runners Brave the Heat", 1953),
        ]).await;
        let engine = DiscoveryEngine::new(Arc::new(storage), Arc::new(DummyModel), DiscoveryConfig::default());
        create_app(AppState::new(Arc::new(engine)))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get_json(app().await, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_discover() {
        let (status, body) = get_json(app().await, "/api/discover?category=sports&yearRange=1950-1955&count=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["stories"].as_array().unwrap().len(), 2);
        assert_eq!(body["metadata"]["yearRange"], "1950-1955");
        assert_eq!(body["metadata"]["source"], "heuristic");
        assert_eq!(body["stories"][0]["origin"], "heuristic");
        assert!(body["stories"][0]["documentaryPotential"].is_u64());
    }

    #[tokio::test]
    async fn test_discover_rejects_bad_year_range() {
        let (status, body) = get_json(app().await, "/api/discover?yearRange=1955-1950").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("reversed"));
    }

    #[tokio::test]
    async fn test_discover_rejects_count_out_of_range() {
        for uri in ["/api/discover?count=0", "/api/discover?count=51"] {
            let (status, body) = get_json(app().await, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["success"], false);
            assert!(body["error"].as_str().unwrap().contains("count"));
        }
    }

    #[tokio::test]
    async fn test_get_story() {
        let (status, body) = get_json(app().await, "/api/stories/s2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["story"]["sourceArticleId"], "s2");

        let (status, body) = get_json(app().await, "/api/stories/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }
}
