use serde_json::Value;

use super::vk::{field_string, VkApi};
use super::{require_token, ApiClient, Upload};
use crate::config::PlatformParams;
use crate::error::ApiError;

const SERVICE: &str = "marusia";

/// Marusia media storage, exposed through VK API `marusia.*` methods.
#[derive(Debug, Clone)]
pub struct MarusiaApi {
    vk: VkApi,
}

impl MarusiaApi {
    pub fn new(client: ApiClient, token: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            vk: VkApi::new(client, token, version),
        }
    }

    pub fn from_params(client: ApiClient, params: &PlatformParams) -> Result<Self, ApiError> {
        let token = require_token(SERVICE, params.marusia_token.as_ref())?;
        Ok(Self::new(client, token, params.vk_api_version.clone()))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.vk = self.vk.with_base_url(base_url);
        self
    }

    /// `getPictureUploadLink` → upload → `savePicture`; returns `picture_id`.
    pub async fn upload_picture(&self, file: Upload) -> Result<String, ApiError> {
        let link = self.vk.call("marusia.getPictureUploadLink", &[]).await?;
        let server = serde_json::json!({ "upload_url": link.get("picture_upload_link") });
        let uploaded = self.vk.upload(&server, "photo", file).await?;
        let saved = self
            .vk
            .call(
                "marusia.savePicture",
                &[
                    ("server", field_string(&uploaded, "server")),
                    ("photo", field_string(&uploaded, "photo")),
                    ("hash", field_string(&uploaded, "hash")),
                ],
            )
            .await?;
        id_string(&saved, "picture_id")
    }

    /// `getAudioUploadLink` → upload → `createAudio`; returns the audio id.
    pub async fn upload_audio(&self, file: Upload) -> Result<String, ApiError> {
        let link = self.vk.call("marusia.getAudioUploadLink", &[]).await?;
        let server = serde_json::json!({ "upload_url": link.get("audio_upload_link") });
        let uploaded = self.vk.upload(&server, "file", file).await?;
        let saved = self
            .vk
            .call("marusia.createAudio", &[("audio_meta", uploaded.to_string())])
            .await?;
        id_string(&saved, "id")
    }

    pub async fn get_pictures(&self) -> Result<Value, ApiError> {
        self.vk.call("marusia.getPictures", &[]).await
    }

    pub async fn delete_picture(&self, id: &str) -> Result<Value, ApiError> {
        self.vk.call("marusia.deletePicture", &[("id", id.to_string())]).await
    }
}

fn id_string(saved: &Value, key: &str) -> Result<String, ApiError> {
    let id = field_string(saved, key);
    if id.is_empty() {
        return Err(ApiError::Parse(format!("marusia: response without `{key}`")));
    }
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{client, TestServer};
    use serde_json::json;

    fn upload(name: &str) -> Upload {
        Upload::Bytes {
            file_name: name.into(),
            bytes: b"media".to_vec(),
        }
    }

    #[tokio::test]
    async fn picture_upload_returns_picture_id() {
        let server = TestServer::start(|path, base| match path {
            "/marusia.getPictureUploadLink" => {
                json!({"response": {"picture_upload_link": format!("{base}/upload")}})
            }
            "/upload" => json!({"server": 1, "photo": "p", "hash": "h"}),
            "/marusia.savePicture" => json!({"response": {"app_id": 1, "picture_id": 456239017}}),
            _ => json!({"error": "unexpected"}),
        })
        .await;
        let api = MarusiaApi::new(client(), "m-token", "5.131").with_base_url(&server.url);

        let id = api.upload_picture(upload("cat.png")).await.unwrap();
        assert_eq!(id, "456239017");

        let requests = server.requests();
        assert_eq!(requests[0].form().await["access_token"], "m-token");
        assert!(requests[1].text().contains(r#"name="photo"; filename="cat.png""#));
        let save = requests[2].form().await;
        assert_eq!(save["server"], "1");
        assert_eq!(save["photo"], "p");
        assert_eq!(save["hash"], "h");
    }

    #[tokio::test]
    async fn audio_upload_passes_meta_through() {
        let server = TestServer::start(|path, base| match path {
            "/marusia.getAudioUploadLink" => {
                json!({"response": {"audio_upload_link": format!("{base}/upload")}})
            }
            "/upload" => json!({"sha": "abc", "meta": {"duration": 2}}),
            "/marusia.createAudio" => json!({"response": {"id": "a-1", "title": ""}}),
            _ => json!({"error": "unexpected"}),
        })
        .await;
        let api = MarusiaApi::new(client(), "m-token", "5.131").with_base_url(&server.url);

        let id = api.upload_audio(upload("ding.mp3")).await.unwrap();
        assert_eq!(id, "a-1");

        let requests = server.requests();
        assert!(requests[1].text().contains(r#"name="file"; filename="ding.mp3""#));
        let meta: Value = serde_json::from_str(&requests[2].form().await["audio_meta"]).unwrap();
        assert_eq!(meta, json!({"sha": "abc", "meta": {"duration": 2}}));
    }

    #[tokio::test]
    async fn save_without_id_is_parse_error() {
        let server = TestServer::start(|path, base| match path {
            "/marusia.getPictureUploadLink" => {
                json!({"response": {"picture_upload_link": format!("{base}/upload")}})
            }
            "/upload" => json!({"server": 1, "photo": "p", "hash": "h"}),
            _ => json!({"response": {}}),
        })
        .await;
        let api = MarusiaApi::new(client(), "m-token", "5.131").with_base_url(&server.url);
        let err = api.upload_picture(upload("cat.png")).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
