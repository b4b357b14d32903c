//! Per-request deadline.
//!
//! Store calls have no timeout of their own beyond the pool acquire timeout,
//! so the whole request is bounded here. An elapsed deadline is reported as
//! an upstream failure (`503 UPSTREAM_FAILURE`), the same as any other store
//! outage, rather than a bare timeout status.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use portfolio_core::error::CoreError;

use crate::error::AppError;

/// Run the rest of the stack, giving up after `limit`.
pub async fn request_deadline(
    State(limit): State<Duration>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(
                %method,
                %path,
                limit_ms = limit.as_millis() as u64,
                "Request deadline elapsed"
            );
            AppError::Core(CoreError::Upstream(format!(
                "request exceeded {}ms",
                limit.as_millis()
            )))
            .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app(limit: Duration) -> Router {
        Router::new()
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .route("/fast", get(|| async { "done" }))
            .layer(from_fn_with_state(limit, request_deadline))
    }

    #[tokio::test]
    async fn elapsed_deadline_is_an_upstream_failure() {
        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_millis(20)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "UPSTREAM_FAILURE");
    }

    #[tokio::test]
    async fn requests_within_the_deadline_pass_through() {
        let request = Request::builder().uri("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(5)).oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
