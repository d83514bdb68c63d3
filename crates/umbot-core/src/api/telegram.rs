use serde_json::{json, Map, Value};
use std::path::Path;

use super::{require_token, ApiClient, Upload};
use crate::config::PlatformParams;
use crate::error::ApiError;

const SERVICE: &str = "telegram";
const API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API. Media arguments accept a `file_id`, a URL or a local path;
/// local paths are uploaded as multipart.
#[derive(Debug, Clone)]
pub struct TelegramApi {
    client: ApiClient,
    token: String,
    base_url: String,
}

impl TelegramApi {
    pub fn new(client: ApiClient, token: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        Ok(Self::new(client, require_token(SERVICE, params.telegram_token.as_ref())?))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url.trim_end_matches('/'), self.token, method)
    }

    /// Raw Bot API call with a JSON body; returns `result`.
    pub async fn call(&self, method: &str, body: &Value) -> Result<Value, ApiError> {
        let request = self.client.http().post(self.url(method)).json(body);
        let response = self.client.send_json(SERVICE, request).await?;
        check_ok(response)
    }

    async fn call_with_file(
        &self,
        method: &str,
        field: &'static str,
        file: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ApiError> {
        if !Path::new(file).is_file() {
            let mut body = params;
            body.insert(field.to_string(), json!(file));
            return self.call(method, &Value::Object(body)).await;
        }
        let mut form = Upload::path(file).into_form(field).await?;
        for (key, value) in params {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            form = form.text(key, text);
        }
        let request = self.client.http().post(self.url(method)).multipart(form);
        let response = self.client.send_json(SERVICE, request).await?;
        check_ok(response)
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(markup) = reply_markup.filter(|m| !m.is_null()) {
            body["reply_markup"] = markup.clone();
        }
        self.call("sendMessage", &body).await
    }

    pub async fn send_photo(
        &self,
        chat_id: &str,
        photo: &str,
        caption: Option<&str>,
        reply_markup: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let params = media_params(chat_id, "caption", caption, reply_markup);
        self.call_with_file("sendPhoto", "photo", photo, params).await
    }

    pub async fn send_audio(&self, chat_id: &str, audio: &str) -> Result<Value, ApiError> {
        let params = media_params(chat_id, "caption", None, None);
        self.call_with_file("sendAudio", "audio", audio, params).await
    }

    pub async fn send_document(
        &self,
        chat_id: &str,
        document: &str,
        caption: Option<&str>,
    ) -> Result<Value, ApiError> {
        let params = media_params(chat_id, "caption", caption, None);
        self.call_with_file("sendDocument", "document", document, params).await
    }

    /// Anonymous regular poll; at least two options.
    pub async fn send_poll(
        &self,
        chat_id: &str,
        question: &str,
        options: &[String],
        reply_markup: Option<&Value>,
    ) -> Result<Value, ApiError> {
        if options.len() < 2 {
            return Err(ApiError::Upstream {
                service: SERVICE,
                message: "poll needs at least two options".to_string(),
            });
        }
        let mut body = json!({ "chat_id": chat_id, "question": question, "options": options });
        if let Some(markup) = reply_markup.filter(|m| !m.is_null()) {
            body["reply_markup"] = markup.clone();
        }
        self.call("sendPoll", &body).await
    }

    pub async fn set_webhook(&self, url: &str) -> Result<Value, ApiError> {
        self.call("setWebhook", &json!({ "url": url })).await
    }

    /// `file_id` of the largest photo (or the audio/document) in a send result.
    pub fn file_id(result: &Value) -> Option<String> {
        let from_photo = result
            .get("photo")
            .and_then(Value::as_array)
            .and_then(|sizes| sizes.last())
            .and_then(|p| p.get("file_id"));
        from_photo
            .or_else(|| result.pointer("/audio/file_id"))
            .or_else(|| result.pointer("/document/file_id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn media_params(
    chat_id: &str,
    caption_key: &str,
    caption: Option<&str>,
    reply_markup: Option<&Value>,
) -> Map<String, Value> {
    let mut params = Map::new();
    params.insert("chat_id".into(), json!(chat_id));
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        params.insert(caption_key.into(), json!(caption));
    }
    if let Some(markup) = reply_markup.filter(|m| !m.is_null()) {
        params.insert("reply_markup".into(), markup.clone());
    }
    params
}

/// Bot API wraps everything in `{"ok": bool, "result" | "description"}`.
fn check_ok(response: Value) -> Result<Value, ApiError> {
    if response.get("ok").and_then(Value::as_bool) == Some(false) {
        let message = response
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("unknown error")
            .to_string();
        tracing::warn!(target: "umbot::telegram", "bot api error: {message}");
        return Err(ApiError::Upstream { service: SERVICE, message });
    }
    Ok(response.get("result").cloned().unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client, TestServer};

    #[tokio::test]
    async fn send_message_posts_json_to_the_bot_path() {
        let server =
            TestServer::start(|_, _| json!({"ok": true, "result": {"message_id": 3}})).await;
        let api = TelegramApi::new(client(), "123:abc").with_base_url(&server.url);
        let markup = json!({"inline_keyboard": [[{"text": "Да", "callback_data": "yes"}]]});

        let result = api.send_message("99", "Привет", Some(&markup)).await.unwrap();
        assert_eq!(result["message_id"], 3);

        let requests = server.requests();
        assert_eq!(requests[0].path, "/bot123:abc/sendMessage");
        assert_eq!(
            requests[0].json(),
            json!({"chat_id": "99", "text": "Привет", "reply_markup": markup})
        );
    }

    #[tokio::test]
    async fn local_photo_goes_multipart() {
        let server = TestServer::start(|_, _| {
            json!({"ok": true, "result": {"photo": [{"file_id": "s"}, {"file_id": "b"}]}})
        })
        .await;
        let api = TelegramApi::new(client(), "t").with_base_url(&server.url);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.png");
        std::fs::write(&path, b"png-bytes").unwrap();
        let markup = json!({"inline_keyboard": []});

        let result = api
            .send_photo("99", path.to_str().unwrap(), Some("Кот"), Some(&markup))
            .await
            .unwrap();
        assert_eq!(TelegramApi::file_id(&result).as_deref(), Some("b"));

        let request = &server.requests()[0];
        assert_eq!(request.path, "/bott/sendPhoto");
        assert!(request.header("content-type").starts_with("multipart/form-data"));
        let body = request.text();
        assert!(body.contains(r#"name="photo"; filename="cat.png""#));
        assert!(body.contains("png-bytes"));
        assert!(body.contains(r#"name="chat_id""#));
        assert!(body.contains("Кот"));
        assert!(body.contains(r#"{"inline_keyboard":[]}"#));
    }

    #[tokio::test]
    async fn remote_document_goes_as_json() {
        let server = TestServer::start(|_, _| {
            json!({"ok": true, "result": {"document": {"file_id": "doc-1"}}})
        })
        .await;
        let api = TelegramApi::new(client(), "t").with_base_url(&server.url);

        let result = api
            .send_document("99", "https://example.com/a.pdf", None)
            .await
            .unwrap();
        assert_eq!(TelegramApi::file_id(&result).as_deref(), Some("doc-1"));
        assert_eq!(
            server.requests()[0].json(),
            json!({"chat_id": "99", "document": "https://example.com/a.pdf"})
        );
    }

    #[tokio::test]
    async fn rejected_call_surfaces_the_description() {
        let server = TestServer::start(|_, _| {
            json!({"ok": false, "description": "Bad Request: poll question must be non-empty"})
        })
        .await;
        let api = TelegramApi::new(client(), "t").with_base_url(&server.url);
        let options = ["a".to_string(), "b".to_string()];

        let err = api.send_poll("99", "", &options, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Upstream { message, .. } if message.contains("poll")));
        assert_eq!(server.requests()[0].json()["options"], json!(["a", "b"]));
    }

    #[test]
    fn ok_false_is_error() {
        let err = check_ok(json!({"ok": false, "description": "chat not found"})).unwrap_err();
        assert!(matches!(err, ApiError::Upstream { message, .. } if message == "chat not found"));
        let result = check_ok(json!({"ok": true, "result": {"message_id": 5}})).unwrap();
        assert_eq!(result["message_id"], 5);
    }

    #[test]
    fn file_id_prefers_largest_photo() {
        let result = json!({"photo": [{"file_id": "small"}, {"file_id": "big"}]});
        assert_eq!(TelegramApi::file_id(&result).as_deref(), Some("big"));
        let audio = json!({"audio": {"file_id": "aud"}});
        assert_eq!(TelegramApi::file_id(&audio).as_deref(), Some("aud"));
    }

    #[test]
    fn missing_token_rejected() {
        let client = ApiClient::new(std::time::Duration::from_secs(1)).unwrap();
        let params = PlatformParams::default();
        assert!(matches!(
            TelegramApi::from_params(client, &params),
            Err(ApiError::MissingToken { service: "telegram" })
        ));
    }
}
