//! Webhook routes: every registered platform is served at `POST /webhook/:platform`.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;
use umbot_core::{Bot, Reply};

const NOT_FOUND: &str = "notFound";

pub fn router(bot: Arc<Bot>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/:platform", post(webhook))
        .with_state(bot)
}

async fn health(State(bot): State<Arc<Bot>>) -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "platforms": bot.registry().identifiers(),
    }))
}

async fn webhook(
    State(bot): State<Arc<Bot>>,
    Path(platform): Path<String>,
    body: Bytes,
) -> Response {
    let request: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(target: "umbot::gateway", "{platform}: body is not JSON: {e}");
            return (StatusCode::NOT_FOUND, NOT_FOUND).into_response();
        }
    };

    match bot.run(&platform, &request).await {
        Ok(Reply::Inline(body)) => Json(body).into_response(),
        Ok(Reply::Text(text)) | Ok(Reply::Push { ack: text, .. }) => text.into_response(),
        Err(e) => {
            tracing::warn!(target: "umbot::gateway", "{platform}: {e}");
            (StatusCode::NOT_FOUND, NOT_FOUND).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;
    use umbot_core::models::FileStorage;
    use umbot_core::{AppConfig, AppContext};

    use crate::skill::EchoSkill;

    fn app(dir: &std::path::Path) -> Router {
        let storage = Arc::new(FileStorage::open(dir).unwrap());
        let ctx = AppContext::with_storage(AppConfig::default(), storage).unwrap();
        router(Arc::new(Bot::new(Arc::new(ctx), Arc::new(EchoSkill))))
    }

    fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_lists_platforms() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(dir.path())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["status"], json!("ok"));
        assert!(body["platforms"].as_array().unwrap().contains(&json!("alisa")));
    }

    #[tokio::test]
    async fn alisa_webhook_answers_json() {
        let dir = tempfile::tempdir().unwrap();
        let request = json!({
            "meta": {"interfaces": {"screen": {}}},
            "session": {
                "message_id": 3,
                "session_id": "s1",
                "user": {"user_id": "u1"},
                "application": {"application_id": "a1"}
            },
            "request": {
                "command": "привет мир",
                "original_utterance": "Привет мир",
                "type": "SimpleUtterance"
            },
            "version": "1.0"
        });
        let response = app(dir.path())
            .oneshot(post("/webhook/alisa", request.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["response"]["text"], json!("Вы сказали: Привет мир"));
        assert_eq!(body["version"], json!("1.0"));
    }

    #[tokio::test]
    async fn ping_is_pong() {
        let dir = tempfile::tempdir().unwrap();
        let request = json!({
            "session": {"message_id": 1, "session_id": "s", "user_id": "u"},
            "request": {"command": "ping", "original_utterance": "ping"},
            "version": "1.0"
        });
        let response = app(dir.path())
            .oneshot(post("/webhook/alisa", request.to_string()))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["response"]["text"], json!("pong"));
    }

    #[tokio::test]
    async fn bad_requests_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        for (uri, body) in [
            ("/webhook/alisa", "{}"),
            ("/webhook/alisa", "not json"),
            ("/webhook/icq", r#"{"a": 1}"#),
        ] {
            let response = app(dir.path()).oneshot(post(uri, body)).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri} {body}");
            assert_eq!(body_string(response).await, NOT_FOUND);
        }
    }

    #[tokio::test]
    async fn messenger_events_are_acknowledged() {
        let dir = tempfile::tempdir().unwrap();
        let update = json!({"update_id": 1, "edited_message": {"text": "x"}});
        let response = app(dir.path())
            .oneshot(post("/webhook/telegram", update.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "ok");
    }
}
