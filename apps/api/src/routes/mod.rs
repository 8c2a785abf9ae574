pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::generation::handlers as generation;
use crate::history::handlers as history;
use crate::state::AppState;

/// Whole-request cap; individual files are limited separately (10 MB each,
/// 10 per field) by the multipart parser.
const MAX_REQUEST_BYTES: usize = 50 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/health", get(health::health_handler))
        .route("/api/generate", post(generation::handle_generate))
        .route("/api/ai-question", post(generation::handle_ai_question))
        .route("/api/subjects", get(history::handle_list_subjects))
        .route("/api/history", get(history::handle_list_history))
        .route("/api/review", post(history::handle_select_review))
        .fallback_service(ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BYTES))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::history::store::HistoryStore;
    use crate::llm_client::LlmClient;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    async fn test_app() -> Router {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let history = HistoryStore::new(pool);
        history.init_schema().await.unwrap();
        let state = AppState {
            history,
            llm: LlmClient::new("test-key".to_string()),
            config: Config::for_tests(),
        };
        build_router(state)
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "OK");
        assert_eq!(json["message"], "サーバーは正常に動作しています");
    }

    #[tokio::test]
    async fn test_generate_with_no_content_is_rejected_before_provider_call() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/generate")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"mode":"review","subject":"生物","additionalText":""}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "ファイルまたはテキストを入力してください");
    }

    #[tokio::test]
    async fn test_ai_question_requires_a_question() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/ai-question")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"question":"   ","context":[]}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "質問が入力されていません");
    }

    #[tokio::test]
    async fn test_review_with_empty_history_is_success_with_no_questions() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/review")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"subject":"数学","strategy":"latest","count":"all"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["questions"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_subjects_endpoint_starts_empty() {
        let app = test_app().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/subjects")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["subjects"].as_array().unwrap().len(), 0);
    }
}
