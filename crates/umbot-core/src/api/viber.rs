use serde_json::{json, Value};

use super::{require_token, ApiClient};
use crate::config::PlatformParams;
use crate::error::ApiError;

const SERVICE: &str = "viber";
const API_BASE: &str = "https://chatapi.viber.com/pa";
const DEFAULT_SENDER: &str = "umbot";

/// Viber REST API (`X-Viber-Auth-Token`).
#[derive(Debug, Clone)]
pub struct ViberApi {
    client: ApiClient,
    token: String,
    sender: String,
    min_api_version: u8,
    base_url: String,
}

impl ViberApi {
    pub fn new(client: ApiClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            sender: DEFAULT_SENDER.to_string(),
            min_api_version: 2,
            base_url: API_BASE.to_string(),
        }
    }

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        let mut api = Self::new(client, require_token(SERVICE, params.viber_token.as_ref())?);
        if let Some(sender) = params.viber_sender.as_ref().filter(|s| !s.is_empty()) {
            api.sender = sender.clone();
        }
        api.min_api_version = params.viber_api_version;
        Ok(api)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// POST `method` and check Viber's `status` (0 is success).
    pub async fn call(&self, method: &str, body: &Value) -> Result<Value, ApiError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), method);
        let request = self
            .client
            .http()
            .post(url)
            .header("X-Viber-Auth-Token", &self.token)
            .json(body);
        let response = self.client.send_json(SERVICE, request).await?;
        check_status(response)
    }

    fn envelope(&self, receiver: &str, kind: &str) -> Value {
        json!({
            "receiver": receiver,
            "type": kind,
            "min_api_version": self.min_api_version,
            "sender": { "name": self.sender },
        })
    }

    pub async fn send_message(
        &self,
        receiver: &str,
        text: &str,
        keyboard: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut body = self.envelope(receiver, "text");
        body["text"] = json!(text);
        if let Some(keyboard) = keyboard.filter(|k| !k.is_null()) {
            body["keyboard"] = keyboard.clone();
        }
        self.call("send_message", &body).await
    }

    pub async fn rich_media(
        &self,
        receiver: &str,
        rich_media: &Value,
        keyboard: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut body = self.envelope(receiver, "rich_media");
        body["rich_media"] = rich_media.clone();
        if let Some(keyboard) = keyboard.filter(|k| !k.is_null()) {
            body["keyboard"] = keyboard.clone();
        }
        self.call("send_message", &body).await
    }

    /// Send a file by public URL; `size` in bytes is required by Viber.
    pub async fn send_file(
        &self,
        receiver: &str,
        media: &str,
        file_name: &str,
        size: u64,
    ) -> Result<Value, ApiError> {
        let mut body = self.envelope(receiver, "file");
        body["media"] = json!(media);
        body["file_name"] = json!(file_name);
        body["size"] = json!(size);
        self.call("send_message", &body).await
    }

    pub async fn set_webhook(&self, url: &str, event_types: &[&str]) -> Result<Value, ApiError> {
        let mut body = json!({ "url": url, "send_name": true, "send_photo": false });
        if !event_types.is_empty() {
            body["event_types"] = json!(event_types);
        }
        self.call("set_webhook", &body).await
    }

    pub async fn get_user_details(&self, id: &str) -> Result<Value, ApiError> {
        let response = self.call("get_user_details", &json!({ "id": id })).await?;
        Ok(response.get("user").cloned().unwrap_or(Value::Null))
    }
}

fn check_status(response: Value) -> Result<Value, ApiError> {
    match response.get("status").and_then(Value::as_i64) {
        Some(0) | None => Ok(response),
        Some(code) => {
            let message = response
                .get("status_message")
                .and_then(Value::as_str)
                .map(|m| format!("{code}: {m}"))
                .unwrap_or_else(|| code.to_string());
            tracing::warn!(target: "umbot::viber", "viber api error {message}");
            Err(ApiError::Upstream { service: SERVICE, message })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client, TestServer};

    #[tokio::test]
    async fn send_message_carries_token_and_envelope() {
        let server = TestServer::start(|_, _| json!({"status": 0, "message_token": 5})).await;
        let api = ViberApi::new(client(), "viber-token").with_base_url(&server.url);
        let keyboard = json!({"Type": "keyboard", "Buttons": []});

        let response = api.send_message("u1", "Привет", Some(&keyboard)).await.unwrap();
        assert_eq!(response["message_token"], 5);

        let request = &server.requests()[0];
        assert_eq!(request.path, "/send_message");
        assert_eq!(request.header("x-viber-auth-token"), "viber-token");
        assert_eq!(
            request.json(),
            json!({
                "receiver": "u1",
                "type": "text",
                "min_api_version": 2,
                "sender": {"name": "umbot"},
                "text": "Привет",
                "keyboard": keyboard
            })
        );
    }

    #[tokio::test]
    async fn rich_media_and_failed_status() {
        let server = TestServer::start(|_, _| {
            json!({"status": 6, "status_message": "receiverNotSubscribed"})
        })
        .await;
        let api = ViberApi::new(client(), "t").with_base_url(&server.url);
        let media = json!({"Type": "rich_media", "ButtonsGroupColumns": 6, "Buttons": []});

        let err = api.rich_media("u1", &media, None).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream { message, .. } if message == "6: receiverNotSubscribed"
        ));
        let body = server.requests()[0].json();
        assert_eq!(body["type"], "rich_media");
        assert_eq!(body["rich_media"], media);
        assert!(body.get("keyboard").is_none());
    }

    #[test]
    fn nonzero_status_is_error() {
        assert!(check_status(json!({"status": 0, "message_token": 1})).is_ok());
        let err = check_status(json!({"status": 2, "status_message": "invalidAuthToken"}))
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream { message, .. } if message == "2: invalidAuthToken"
        ));
    }

    #[test]
    fn envelope_uses_configured_sender() {
        let client = ApiClient::new(std::time::Duration::from_secs(1)).unwrap();
        let params = PlatformParams {
            viber_token: Some("t".into()),
            viber_sender: Some("Shop".into()),
            ..Default::default()
        };
        let api = ViberApi::from_params(client, &params).unwrap();
        let body = api.envelope("u1", "text");
        assert_eq!(body["sender"]["name"], json!("Shop"));
        assert_eq!(body["min_api_version"], json!(2));
    }
}
