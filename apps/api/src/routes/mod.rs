pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/models", post(handlers::handle_list_models))
        // Tailoring API
        .route("/api/v1/tailor/job-title", post(handlers::handle_job_title))
        .route("/api/v1/tailor/summary", post(handlers::handle_summary))
        .route("/api/v1/tailor/experience", post(handlers::handle_experience))
        .route(
            "/api/v1/tailor/achievements/sort",
            post(handlers::handle_sort_achievements),
        )
        .route(
            "/api/v1/tailor/skills/sort",
            post(handlers::handle_sort_skills),
        )
        .route(
            "/api/v1/tailor/cover-letter",
            post(handlers::handle_cover_letter),
        )
        .route(
            "/api/v1/tailor/job-description/refine",
            post(handlers::handle_refine_job_description),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::llm_client::AgentConfig;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const JD: &str = "Acme is hiring a platform engineer to scale our Rust payment services, \
                      own reliability, and mentor a small team of backend engineers.";

    fn app(default_agent: Option<AgentConfig>) -> Router {
        build_router(AppState {
            config: Config {
                port: 0,
                rust_log: "info".to_string(),
                default_agent,
            },
        })
    }

    fn agent_json(api_url: &str) -> Value {
        json!({ "providerType": "openai-compatible", "apiKey": "sk-test", "apiUrl": api_url, "model": "gpt-4o" })
    }

    async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn completion(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": content } }]
        }))
    }

    #[tokio::test]
    async fn test_health() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_short_job_description_is_rejected() {
        let (status, body) = post_json(
            app(None),
            "/api/v1/tailor/summary",
            json!({
                "agentConfig": agent_json(""),
                "jobDescription": "Rust engineer",
                "currentSummary": "Engineer."
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("at least 100"));
    }

    #[tokio::test]
    async fn test_missing_agent_config_is_rejected() {
        let (status, body) = post_json(
            app(None),
            "/api/v1/tailor/job-title",
            json!({ "jobDescription": JD, "currentTitle": "Engineer" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("agentConfig"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_a_validation_error() {
        let (status, body) = post_json(
            app(None),
            "/api/v1/tailor/skills/sort",
            json!({ "jobDescription": JD, "skillGroups": "not a list" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_single_achievement_needs_no_provider() {
        let (status, body) = post_json(
            app(None),
            "/api/v1/tailor/achievements/sort",
            json!({
                "agentConfig": agent_json("http://127.0.0.1:9"),
                "jobDescription": JD,
                "achievements": ["Cut p99 latency by 40%"]
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"], json!({ "rankedIndices": [0] }));
        assert_eq!(body["progress"].as_array().unwrap().len(), 1);
        assert_eq!(body["progress"][0]["done"], true);
    }

    #[tokio::test]
    async fn test_cover_letter_end_to_end_with_default_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion("Dear Acme team,\n\nI scale Rust services.\n\nAda"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(completion("APPROVED"))
            .mount(&server)
            .await;

        let default_agent = AgentConfig {
            provider_type: Default::default(),
            api_key: "sk-test".to_string(),
            api_url: format!("{}/v1", server.uri()),
            model: "gpt-4o".to_string(),
        };
        let (status, body) = post_json(
            app(Some(default_agent)),
            "/api/v1/tailor/cover-letter",
            json!({ "jobDescription": JD, "resume": "Ada. Platform engineer.", "candidateName": "Ada" }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["result"],
            "Dear Acme team,\n\nI scale Rust services.\n\nAda"
        );
        let progress = body["progress"].as_array().unwrap();
        assert_eq!(progress.len(), 3);
        assert_eq!(progress[0]["content"], "Writing cover letter...");
        assert_eq!(progress[2]["done"], true);
    }

    #[tokio::test]
    async fn test_provider_auth_failure_is_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": { "message": "Incorrect API key provided" }
            })))
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app(None),
            "/api/v1/tailor/job-description/refine",
            json!({ "agentConfig": agent_json(&format!("{}/v1", server.uri())), "jobDescription": JD }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("Incorrect API key"));
    }

    #[tokio::test]
    async fn test_list_models_rejects_malformed_body() {
        let (status, body) = post_json(
            app(None),
            "/api/v1/models",
            json!({ "agentConfig": "sk-test" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

        let (status, body) = post_json(app(None), "/api/v1/models", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("agentConfig"));
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "id": "gpt-4o-mini" }, { "id": "gpt-4o" }, { "id": "gpt-4o" }]
            })))
            .mount(&server)
            .await;

        let (status, body) = post_json(
            app(None),
            "/api/v1/models",
            json!({ "agentConfig": {
                "providerType": "openai-compatible",
                "apiKey": "sk-test",
                "apiUrl": format!("{}/v1", server.uri())
            } }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"], json!(["gpt-4o", "gpt-4o-mini"]));
    }
}
