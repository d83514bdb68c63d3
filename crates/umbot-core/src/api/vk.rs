use rand::Rng;
use serde_json::{Map, Value};

use super::{require_token, ApiClient, Upload};
use crate::config::PlatformParams;
use crate::error::ApiError;

const SERVICE: &str = "vk";
const API_BASE: &str = "https://api.vk.com/method";

/// VK API methods used by the bot: messages, users and the photo/doc upload flows.
#[derive(Debug, Clone)]
pub struct VkApi {
    client: ApiClient,
    token: String,
    version: String,
    base_url: String,
}

impl VkApi {
    pub fn new(client: ApiClient, token: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            client,
            token: token.into(),
            version: version.into(),
            base_url: API_BASE.to_string(),
        }
    }

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        let token = require_token(SERVICE, params.vk_token.as_ref())?;
        Ok(Self::new(client, token, params.vk_api_version.clone()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Call `method` with form params; returns the `response` field.
    pub async fn call(&self, method: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("access_token", self.token.clone()));
        form.push(("v", self.version.clone()));
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), method);
        let request = self.client.http().post(url).form(&form);
        let body = self.client.send_json(SERVICE, request).await?;
        body.get("response")
            .cloned()
            .ok_or_else(|| ApiError::Parse(format!("{method}: no `response` field")))
    }

    /// `messages.send`. `extra` carries `keyboard`, `attachment`, `template`; objects and
    /// arrays are JSON-encoded as VK expects.
    pub async fn messages_send(
        &self,
        peer_id: &str,
        message: &str,
        extra: &Map<String, Value>,
    ) -> Result<Value, ApiError> {
        let random_id: i32 = rand::rng().random();
        let mut params = vec![
            ("peer_id", peer_id.to_string()),
            ("message", message.to_string()),
            ("random_id", random_id.to_string()),
        ];
        for (key, value) in extra {
            if value.is_null() {
                continue;
            }
            let encoded = match value {
                Value::String(s) => s.clone(),
                Value::Array(items) if key == "attachment" => items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
                other => other.to_string(),
            };
            params.push((key.as_str(), encoded));
        }
        self.call("messages.send", &params).await
    }

    pub async fn users_get(&self, user_id: &str) -> Result<Value, ApiError> {
        let users = self
            .call("users.get", &[("user_ids", user_id.to_string())])
            .await?;
        Ok(users.get(0).cloned().unwrap_or(Value::Null))
    }

    /// Upload flow: `photos.getMessagesUploadServer` → upload → `photos.saveMessagesPhoto`.
    /// Returns the attachment token `photo<owner>_<id>`.
    pub async fn upload_photo(&self, peer_id: &str, file: Upload) -> Result<String, ApiError> {
        let server = self
            .call("photos.getMessagesUploadServer", &[("peer_id", peer_id.to_string())])
            .await?;
        let uploaded = self.upload(&server, "photo", file).await?;
        let saved = self
            .call(
                "photos.saveMessagesPhoto",
                &[
                    ("server", field_string(&uploaded, "server")),
                    ("photo", field_string(&uploaded, "photo")),
                    ("hash", field_string(&uploaded, "hash")),
                ],
            )
            .await?;
        attachment_token("photo", saved.get(0).unwrap_or(&Value::Null))
    }

    /// Upload flow: `docs.getMessagesUploadServer` → upload → `docs.save`.
    /// `doc_type` is `doc` or `audio_message`. Returns `doc<owner>_<id>`.
    pub async fn upload_doc(
        &self,
        peer_id: &str,
        file: Upload,
        doc_type: &str,
    ) -> Result<String, ApiError> {
        let server = self
            .call(
                "docs.getMessagesUploadServer",
                &[("peer_id", peer_id.to_string()), ("type", doc_type.to_string())],
            )
            .await?;
        let uploaded = self.upload(&server, "file", file).await?;
        let saved = self
            .call("docs.save", &[("file", field_string(&uploaded, "file"))])
            .await?;
        let doc = saved
            .get(doc_type)
            .or_else(|| saved.get("doc"))
            .unwrap_or(&Value::Null);
        attachment_token("doc", doc)
    }

    pub(crate) async fn upload(
        &self,
        server: &Value,
        field: &'static str,
        file: Upload,
    ) -> Result<Value, ApiError> {
        let url = server
            .get("upload_url")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Parse("upload server without `upload_url`".to_string()))?;
        let form = file.into_form(field).await?;
        let request = self.client.http().post(url).multipart(form);
        self.client.send_json(SERVICE, request).await
    }
}

pub(crate) fn field_string(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn attachment_token(kind: &str, saved: &Value) -> Result<String, ApiError> {
    let owner = saved.get("owner_id").and_then(Value::as_i64);
    let id = saved.get("id").and_then(Value::as_i64);
    match (owner, id) {
        (Some(owner), Some(id)) => Ok(format!("{kind}{owner}_{id}")),
        _ => Err(ApiError::Parse(format!("{kind} save response without owner_id/id"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client, TestServer};
    use serde_json::json;

    fn api(server: &TestServer) -> VkApi {
        VkApi::new(client(), "vk-token", "5.131").with_base_url(&server.url)
    }

    #[tokio::test]
    async fn messages_send_encodes_extra_params() {
        let server = TestServer::start(|_, _| json!({"response": 77})).await;
        let mut extra = Map::new();
        extra.insert("attachment".into(), json!(["photo1_2", "doc3_4"]));
        extra.insert("keyboard".into(), json!({"one_time": false, "buttons": []}));
        extra.insert("template".into(), Value::Null);

        let sent = api(&server).messages_send("42", "Привет", &extra).await.unwrap();
        assert_eq!(sent, json!(77));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, "/messages.send");
        let form = requests[0].form().await;
        assert_eq!(form["peer_id"], "42");
        assert_eq!(form["message"], "Привет");
        assert_eq!(form["attachment"], "photo1_2,doc3_4");
        let keyboard: Value = serde_json::from_str(&form["keyboard"]).unwrap();
        assert_eq!(keyboard, json!({"one_time": false, "buttons": []}));
        assert!(!form.contains_key("template"));
        assert_eq!(form["access_token"], "vk-token");
        assert_eq!(form["v"], "5.131");
        assert!(form["random_id"].parse::<i32>().is_ok());
    }

    #[tokio::test]
    async fn error_payload_fails_the_call() {
        let server = TestServer::start(|_, _| {
            json!({"error": {"error_code": 5, "error_msg": "User authorization failed"}})
        })
        .await;
        let err = api(&server).users_get("1").await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::Upstream { message, .. } if message == "User authorization failed"
        ));
    }

    #[tokio::test]
    async fn photo_upload_chain_returns_attachment() {
        let server = TestServer::start(|path, base| match path {
            "/photos.getMessagesUploadServer" => {
                json!({"response": {"upload_url": format!("{base}/upload/photo")}})
            }
            "/upload/photo" => json!({"server": 101, "photo": "[{}]", "hash": "h1"}),
            "/photos.saveMessagesPhoto" => json!({"response": [{"owner_id": -5, "id": 9}]}),
            _ => json!({"error": "unexpected"}),
        })
        .await;
        let file = Upload::Bytes {
            file_name: "cat.png".into(),
            bytes: b"png-bytes".to_vec(),
        };

        let token = api(&server).upload_photo("42", file).await.unwrap();
        assert_eq!(token, "photo-5_9");
        assert_eq!(
            server.paths(),
            ["/photos.getMessagesUploadServer", "/upload/photo", "/photos.saveMessagesPhoto"]
        );

        let requests = server.requests();
        assert_eq!(requests[0].form().await["peer_id"], "42");
        assert!(requests[1].header("content-type").starts_with("multipart/form-data"));
        let upload = requests[1].text();
        assert!(upload.contains(r#"name="photo"; filename="cat.png""#));
        assert!(upload.contains("png-bytes"));
        let save = requests[2].form().await;
        assert_eq!(save["server"], "101");
        assert_eq!(save["photo"], "[{}]");
        assert_eq!(save["hash"], "h1");
    }

    #[tokio::test]
    async fn doc_upload_reads_the_typed_field() {
        let server = TestServer::start(|path, base| match path {
            "/docs.getMessagesUploadServer" => {
                json!({"response": {"upload_url": format!("{base}/upload/doc")}})
            }
            "/upload/doc" => json!({"file": "f1"}),
            "/docs.save" => json!({
                "response": {"type": "audio_message", "audio_message": {"owner_id": 7, "id": 8}}
            }),
            _ => json!({"error": "unexpected"}),
        })
        .await;
        let file = Upload::Bytes {
            file_name: "voice.ogg".into(),
            bytes: b"ogg".to_vec(),
        };

        let token = api(&server).upload_doc("42", file, "audio_message").await.unwrap();
        assert_eq!(token, "doc7_8");

        let requests = server.requests();
        let server_form = requests[0].form().await;
        assert_eq!(server_form["type"], "audio_message");
        assert_eq!(server_form["peer_id"], "42");
        assert!(requests[1].text().contains(r#"name="file"; filename="voice.ogg""#));
        assert_eq!(requests[2].form().await["file"], "f1");
    }

    #[test]
    fn attachment_tokens() {
        assert_eq!(
            attachment_token("photo", &json!({"owner_id": -12, "id": 34})).unwrap(),
            "photo-12_34"
        );
        assert!(attachment_token("doc", &json!({})).is_err());
    }

    #[test]
    fn field_string_stringifies_numbers() {
        let v = json!({"server": 123, "hash": "abc"});
        assert_eq!(field_string(&v, "server"), "123");
        assert_eq!(field_string(&v, "hash"), "abc");
        assert_eq!(field_string(&v, "photo"), "");
    }
}
