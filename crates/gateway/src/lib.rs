//! HTTP API gateway for cognitor.
//!
//! Two routes: `POST /api/query` runs a query through the cognitive loop,
//! `GET /health` answers liveness probes. Built on Axum.

use axum::extract::rejection::JsonRejection;
use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info, warn};

use cognitor_agent::CognitiveAgent;
use cognitor_config::GatewayConfig;
use cognitor_core::Preferences;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub agent: Arc<CognitiveAgent>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/query", post(query_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve `agent` until the process is stopped.
pub async fn start(agent: Arc<CognitiveAgent>, config: &GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_router(Arc::new(GatewayState { agent }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "healthy" })
}

#[derive(Deserialize)]
struct QueryRequest {
    #[serde(default)]
    query: Option<String>,

    #[serde(default)]
    preferences: Option<Preferences>,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum QueryResponse {
    Success { result: String, query: String },
    Error { message: String },
}

#[derive(Serialize)]
struct BadRequest {
    error: String,
}

fn bad_request(error: impl Into<String>) -> Response {
    (StatusCode::BAD_REQUEST, Json(BadRequest { error: error.into() })).into_response()
}

async fn query_handler(
    State(state): State<SharedState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            warn!(error = %rejection, "Rejected query body");
            return bad_request(rejection.body_text());
        }
    };
    let query = match request.query.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => q.to_string(),
        _ => return bad_request("No query provided"),
    };

    info!(query_len = query.len(), "Query received");
    let response = state.agent.process(&query, request.preferences.as_ref()).await;

    if response.success {
        let body = QueryResponse::Success {
            result: response.result,
            query: response.query,
        };
        (StatusCode::OK, Json(body)).into_response()
    } else {
        error!(result = %response.result, "Query failed");
        let body = QueryResponse::Error {
            message: response.result,
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use cognitor_core::{CapabilityRegistry, Planner, PlannerError};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Answers every prompt with the same reply.
    struct Fixed(Result<String, PlannerError>);

    #[async_trait]
    impl Planner for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String, PlannerError> {
            self.0.clone()
        }
    }

    fn app(reply: Result<String, PlannerError>) -> Router {
        let mut registry = CapabilityRegistry::new();
        for capability in cognitor_tools::arithmetic::capabilities() {
            registry.register(Box::new(capability)).unwrap();
        }
        let agent = CognitiveAgent::new(Arc::new(Fixed(reply)), Arc::new(registry)).with_perception(false);
        build_router(Arc::new(GatewayState { agent: Arc::new(agent) }))
    }

    fn sum_plan() -> String {
        json!({
            "action_plan": [
                {"step_number": 1, "action_type": "tool_call", "tool_name": "sum_list",
                 "parameters": {"input": {"numbers": [2, 3]}}},
                {"step_number": 2, "action_type": "response", "parameters": {"answer": "RESULT_FROM_STEP_1"}}
            ],
            "should_continue": false
        })
        .to_string()
    }

    fn post_query(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/query")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json(response: Response) -> Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app(Ok(sum_plan())).oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json(response).await, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn query_success() {
        let response = app(Ok(sum_plan()))
            .oneshot(post_query(r#"{"query": "What is 2 + 3?"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            read_json(response).await,
            json!({"status": "success", "result": "5", "query": "What is 2 + 3?"})
        );
    }

    #[tokio::test]
    async fn empty_or_missing_query_is_rejected() {
        for body in [r#"{"query": "  "}"#, r#"{}"#, "not json"] {
            let response = app(Ok(sum_plan())).oneshot(post_query(body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
            assert!(read_json(response).await.get("error").is_some());
        }
    }

    #[tokio::test]
    async fn planner_failure_is_500() {
        let failing = Err(PlannerError::Network("connection refused".into()));
        let response = app(failing)
            .oneshot(post_query(r#"{"query": "What is 2 + 3?", "preferences": {"format": "short"}}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_json(response).await;
        assert_eq!(body["status"], "error");
        assert!(body["message"].as_str().unwrap().contains("connection refused"));
    }
}
