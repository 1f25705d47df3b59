pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::apply::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/apply", post(handlers::handle_apply))
        .route(
            "/api/v1/applications",
            get(handlers::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(handlers::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/stage",
            patch(handlers::handle_change_stage),
        )
        .route("/api/v1/bus", post(handlers::handle_bus_post))
        .route(
            "/api/v1/throttle/:key",
            get(handlers::handle_throttle_status),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::config::Config;

    async fn test_router() -> Router {
        let config = Config {
            extension_bridge: false,
            ..Config::default()
        };
        build_router(AppState::from_config(config).await.unwrap())
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(b) => Body::from(b.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn indeed_body(opt_in: bool) -> Value {
        json!({
            "platform": "indeed",
            "jobUrl": "https://x.test/job/1",
            "company": "Acme",
            "mapperArgs": { "jobUrl": "https://x.test/job/1", "cvFile": "resume.pdf" },
            "optIn": opt_in
        })
    }

    #[tokio::test]
    async fn test_health() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_apply_without_opt_in_is_forbidden_and_stores_nothing() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::POST, "/api/v1/apply", Some(indeed_body(false))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["message"], "Auto-apply requires explicit opt-in.");

        let (_, list) = send(&router, Method::GET, "/api/v1/applications", None).await;
        assert_eq!(list, json!([]));
    }

    #[tokio::test]
    async fn test_apply_then_fetch_record() {
        let router = test_router().await;
        let (status, body) = send(&router, Method::POST, "/api/v1/apply", Some(indeed_body(true))).await;
        assert_eq!(status, StatusCode::CREATED);
        let id = body["applicationId"].as_str().unwrap().to_string();

        let (status, record) =
            send(&router, Method::GET, &format!("/api/v1/applications/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["stage"], "applied");
        assert_eq!(record["files"][0]["type"], "cv");
        assert!(record["logs"][0]["message"]
            .as_str()
            .unwrap()
            .contains("Submitted"));
    }

    #[tokio::test]
    async fn test_unknown_platform_is_bad_request() {
        let router = test_router().await;
        let mut body = indeed_body(true);
        body["platform"] = json!("monster");
        let (status, body) = send(&router, Method::POST, "/api/v1/apply", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_stage_change_appends_log() {
        let router = test_router().await;
        let (_, body) = send(&router, Method::POST, "/api/v1/apply", Some(indeed_body(true))).await;
        let id = body["applicationId"].as_str().unwrap().to_string();

        let (status, _) = send(
            &router,
            Method::PATCH,
            &format!("/api/v1/applications/{id}/stage"),
            Some(json!({ "stage": "interview" })),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, record) =
            send(&router, Method::GET, &format!("/api/v1/applications/{id}"), None).await;
        assert_eq!(record["stage"], "interview");
        let logs = record["logs"].as_array().unwrap();
        assert_eq!(logs.last().unwrap()["meta"]["to"], "interview");
    }

    #[tokio::test]
    async fn test_missing_application_is_not_found() {
        let router = test_router().await;
        let uri = format!("/api/v1/applications/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&router, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_throttle_bucket_visible_after_apply() {
        let router = test_router().await;
        send(&router, Method::POST, "/api/v1/apply", Some(indeed_body(true))).await;
        let (status, body) = send(&router, Method::GET, "/api/v1/throttle/indeed", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["capacity"], 20);
        assert_eq!(body["tokens"], 19);
    }

    #[tokio::test]
    async fn test_bus_accepts_unmarked_messages() {
        let router = test_router().await;
        let (status, body) = send(
            &router,
            Method::POST,
            "/api/v1/bus",
            Some(json!({ "hello": "world" })),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert!(body["delivered"].is_u64());
    }
}
