//! HTTP plumbing shared by the planner backends.

use cognitor_core::error::PlannerError;
use std::time::Duration;
use tracing::warn;

/// Client with a generous transport timeout; the orchestrator applies the
/// real per-call bound.
pub(crate) fn client() -> Result<reqwest::Client, PlannerError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .map_err(|e| PlannerError::NotConfigured(format!("failed to create HTTP client: {e}")))
}

/// Map a non-success response to the planner error taxonomy.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PlannerError> {
    let status = response.status().as_u16();

    if status == 429 {
        return Err(PlannerError::RateLimited { retry_after_secs: 5 });
    }

    if status == 401 || status == 403 {
        return Err(PlannerError::AuthenticationFailed(
            "Invalid API key or insufficient permissions".into(),
        ));
    }

    if !(200..300).contains(&status) {
        let error_body = response.text().await.unwrap_or_default();
        warn!(status, body = %error_body, "Planner returned error");
        return Err(PlannerError::Api {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}
