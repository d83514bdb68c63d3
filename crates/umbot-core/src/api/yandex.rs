use serde_json::{json, Value};

use super::{require_token, ApiClient, Upload};
use crate::config::PlatformParams;
use crate::error::ApiError;

const DIALOGS_BASE: &str = "https://dialogs.yandex.net/api/v1";
const SPEECH_KIT_URL: &str = "https://tts.api.cloud.yandex.net/speech/v1/tts:synthesize";

/// Shared part of the dialogs media storage clients.
#[derive(Debug, Clone)]
struct DialogsStorage {
    client: ApiClient,
    token: String,
    skill_id: String,
    base_url: String,
}

impl DialogsStorage {
    fn from_params(
        service: &'static str,
        client: ApiClient,
        params: &PlatformParams,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            token: require_token(service, params.yandex_token.as_ref())?,
            skill_id: require_token(service, params.app_id.as_ref())?,
            base_url: DIALOGS_BASE.to_string(),
        })
    }

    fn url(&self, collection: &str) -> String {
        format!(
            "{}/skills/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.skill_id,
            collection
        )
    }

    fn auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header("Authorization", format!("OAuth {}", self.token))
    }
}

/// Yandex dialogs image storage.
#[derive(Debug, Clone)]
pub struct YandexImageApi {
    inner: DialogsStorage,
}

impl YandexImageApi {
    const SERVICE: &'static str = "yandex_images";

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        Ok(Self {
            inner: DialogsStorage::from_params(Self::SERVICE, client, params)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner.base_url = base_url.into();
        self
    }

    /// Upload by public URL; returns the image id.
    pub async fn upload_url(&self, url: &str) -> Result<String, ApiError> {
        let s = &self.inner;
        let request = s.auth(s.client.http().post(s.url("images"))).json(&json!({ "url": url }));
        let body = s.client.send_json(Self::SERVICE, request).await?;
        image_id(&body, "image")
    }

    pub async fn upload_file(&self, file: Upload) -> Result<String, ApiError> {
        let s = &self.inner;
        let form = file.into_form("file").await?;
        let request = s.auth(s.client.http().post(s.url("images"))).multipart(form);
        let body = s.client.send_json(Self::SERVICE, request).await?;
        image_id(&body, "image")
    }

    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        let s = &self.inner;
        let request = s.auth(s.client.http().get(s.url("images")));
        let body = s.client.send_json(Self::SERVICE, request).await?;
        Ok(array_field(&body, "images"))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let s = &self.inner;
        let request = s.auth(s.client.http().delete(format!("{}/{}", s.url("images"), id)));
        let body = s.client.send_json(Self::SERVICE, request).await?;
        Ok(body.get("result").and_then(Value::as_str) == Some("ok"))
    }
}

/// Yandex dialogs sound storage.
#[derive(Debug, Clone)]
pub struct YandexSoundApi {
    inner: DialogsStorage,
}

impl YandexSoundApi {
    const SERVICE: &'static str = "yandex_sounds";

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        Ok(Self {
            inner: DialogsStorage::from_params(Self::SERVICE, client, params)?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.inner.base_url = base_url.into();
        self
    }

    /// Upload an audio file; returns the sound id used in `<speaker audio="dialogs-upload/...">`.
    pub async fn upload_file(&self, file: Upload) -> Result<String, ApiError> {
        let s = &self.inner;
        let form = file.into_form("file").await?;
        let request = s.auth(s.client.http().post(s.url("sounds"))).multipart(form);
        let body = s.client.send_json(Self::SERVICE, request).await?;
        image_id(&body, "sound")
    }

    pub async fn list(&self) -> Result<Vec<Value>, ApiError> {
        let s = &self.inner;
        let request = s.auth(s.client.http().get(s.url("sounds")));
        let body = s.client.send_json(Self::SERVICE, request).await?;
        Ok(array_field(&body, "sounds"))
    }

    pub async fn delete(&self, id: &str) -> Result<bool, ApiError> {
        let s = &self.inner;
        let request = s.auth(s.client.http().delete(format!("{}/{}", s.url("sounds"), id)));
        let body = s.client.send_json(Self::SERVICE, request).await?;
        Ok(body.get("result").and_then(Value::as_str) == Some("ok"))
    }

    pub(crate) fn skill_id(&self) -> &str {
        &self.inner.skill_id
    }
}

/// SpeechKit TTS: text to an OggOpus byte stream.
#[derive(Debug, Clone)]
pub struct YandexSpeechKit {
    client: ApiClient,
    token: String,
    url: String,
    pub voice: String,
    pub lang: String,
    pub emotion: String,
    pub speed: f32,
}

impl YandexSpeechKit {
    const SERVICE: &'static str = "yandex_speechkit";

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        Ok(Self {
            client,
            token: require_token(Self::SERVICE, params.yandex_speech_kit_token.as_ref())?,
            url: SPEECH_KIT_URL.to_string(),
            voice: "alena".to_string(),
            lang: "ru-RU".to_string(),
            emotion: "neutral".to_string(),
            speed: 1.0,
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>, ApiError> {
        let form = [
            ("text", text.to_string()),
            ("lang", self.lang.clone()),
            ("voice", self.voice.clone()),
            ("emotion", self.emotion.clone()),
            ("speed", self.speed.to_string()),
            ("format", "oggopus".to_string()),
        ];
        let request = self
            .client
            .http()
            .post(&self.url)
            .header("Authorization", format!("Api-Key {}", self.token))
            .form(&form);
        let response = self.client.send_raw(Self::SERVICE, request).await?;
        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}

fn image_id(body: &Value, key: &str) -> Result<String, ApiError> {
    body.get(key)
        .and_then(|item| item.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::Parse(format!("dialogs: response without `{key}.id`")))
}

fn array_field(body: &Value, key: &str) -> Vec<Value> {
    body.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client, TestServer};
    use axum::http::Method;

    fn params() -> PlatformParams {
        PlatformParams {
            yandex_token: Some("oauth".into()),
            app_id: Some("skill".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn image_by_url_and_delete() {
        let server = TestServer::start(|_, _| {
            json!({"image": {"id": "1234/abcd", "origUrl": "https://example.com/cat.png"},
                   "result": "ok"})
        })
        .await;
        let api = YandexImageApi::from_params(client(), &params())
            .unwrap()
            .with_base_url(&server.url);

        let id = api.upload_url("https://example.com/cat.png").await.unwrap();
        assert_eq!(id, "1234/abcd");
        assert!(api.delete("1234/abcd").await.unwrap());

        let requests = server.requests();
        assert_eq!(requests[0].path, "/skills/skill/images");
        assert_eq!(requests[0].header("authorization"), "OAuth oauth");
        assert_eq!(requests[0].json(), json!({"url": "https://example.com/cat.png"}));
        assert_eq!(requests[1].method, Method::DELETE);
        assert_eq!(requests[1].path, "/skills/skill/images/1234/abcd");
    }

    #[tokio::test]
    async fn sound_file_upload() {
        let server = TestServer::start(|_, _| json!({"sound": {"id": "snd-1"}})).await;
        let api = YandexSoundApi::from_params(client(), &params())
            .unwrap()
            .with_base_url(&server.url);
        let file = Upload::Bytes {
            file_name: "ding.mp3".into(),
            bytes: b"mp3".to_vec(),
        };

        assert_eq!(api.upload_file(file).await.unwrap(), "snd-1");
        let request = &server.requests()[0];
        assert_eq!(request.path, "/skills/skill/sounds");
        assert!(request.text().contains(r#"name="file"; filename="ding.mp3""#));
    }

    #[test]
    fn storage_needs_token_and_skill_id() {
        let client = ApiClient::new(std::time::Duration::from_secs(1)).unwrap();
        let mut params = PlatformParams {
            yandex_token: Some("oauth".into()),
            ..Default::default()
        };
        assert!(YandexImageApi::from_params(client.clone(), &params).is_err());
        params.app_id = Some("skill".into());
        let api = YandexImageApi::from_params(client, &params).unwrap();
        assert_eq!(
            api.inner.url("images"),
            "https://dialogs.yandex.net/api/v1/skills/skill/images"
        );
    }

    #[test]
    fn ids_from_upload_responses() {
        let body = json!({"image": {"id": "1234/abcd", "size": 1}});
        assert_eq!(image_id(&body, "image").unwrap(), "1234/abcd");
        assert!(image_id(&json!({}), "sound").is_err());
    }
}
