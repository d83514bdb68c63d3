//! REST clients for platform APIs over one shared reqwest client.
//!
//! Every call goes through [`ApiClient::send_json`]: non-2xx statuses and payloads
//! carrying an `error` field become [`ApiError`] and are logged with a warning. Callers
//! decide how to degrade (an image without a token is skipped, a failed push is logged).

mod marusia;
mod telegram;
mod viber;
mod vk;
mod yandex;

#[cfg(test)]
pub(crate) mod test_server;

pub use marusia::MarusiaApi;
pub use telegram::TelegramApi;
pub use viber::ViberApi;
pub use vk::VkApi;
pub use yandex::{YandexImageApi, YandexSoundApi, YandexSpeechKit};

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ApiError;

/// Shared HTTP client with a fixed per-request timeout. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("umbot/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send and return the response body on 2xx.
    pub async fn send_raw(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, ApiError> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!(target: "umbot::api", service, "request failed: {e}");
            ApiError::Request(e)
        })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(
                target: "umbot::api",
                service,
                status = status.as_u16(),
                "upstream error: {body}"
            );
            return Err(ApiError::Status {
                service,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Send, parse JSON and reject payloads with an `error` field.
    pub async fn send_json(
        &self,
        service: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, ApiError> {
        let response = self.send_raw(service, request).await?;
        let body: Value = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(format!("{service}: {e}")))?;
        check_error_field(service, body)
    }

    /// Fetch a remote file for re-upload to a platform that only accepts files.
    pub async fn download(&self, service: &'static str, url: &str) -> Result<Upload, ApiError> {
        let response = self.send_raw(service, self.client.get(url)).await?;
        let file_name = file_name_of(url);
        let bytes = response.bytes().await?.to_vec();
        Ok(Upload::Bytes { file_name, bytes })
    }

    /// `Content-Length` of a remote file via HEAD; `None` when the server omits it.
    pub async fn content_length(
        &self,
        service: &'static str,
        url: &str,
    ) -> Result<Option<u64>, ApiError> {
        let response = self.send_raw(service, self.client.head(url)).await?;
        Ok(response.content_length())
    }
}

/// Last path segment of a URL or path, without the query string.
pub fn file_name_of(source: &str) -> String {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    path.rsplit(['/', '\\'])
        .find(|segment| !segment.is_empty())
        .unwrap_or("file")
        .to_string()
}

/// `{"error": ...}` in a 2xx body is still a failure (VK, Yandex dialogs).
pub(crate) fn check_error_field(service: &'static str, body: Value) -> Result<Value, ApiError> {
    let Some(error) = body.get("error").filter(|e| !e.is_null()) else {
        return Ok(body);
    };
    let message = match error {
        Value::String(s) => s.clone(),
        other => other
            .get("error_msg")
            .or_else(|| other.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| other.to_string()),
    };
    tracing::warn!(target: "umbot::api", service, "upstream returned error: {message}");
    Err(ApiError::Upstream { service, message })
}

/// File to upload: a local path or in-memory bytes.
#[derive(Debug, Clone)]
pub enum Upload {
    Path(PathBuf),
    Bytes { file_name: String, bytes: Vec<u8> },
}

impl Upload {
    pub fn path(path: impl AsRef<Path>) -> Self {
        Self::Path(path.as_ref().to_path_buf())
    }

    pub(crate) async fn into_part(self) -> Result<Part, ApiError> {
        match self {
            Self::Path(path) => {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "file".to_string());
                let bytes = tokio::fs::read(&path).await?;
                Ok(Part::bytes(bytes).file_name(file_name))
            }
            Self::Bytes { file_name, bytes } => Ok(Part::bytes(bytes).file_name(file_name)),
        }
    }

    pub(crate) async fn into_form(self, field: &'static str) -> Result<Form, ApiError> {
        Ok(Form::new().part(field, self.into_part().await?))
    }
}

/// Token or a `MissingToken` error naming the service.
pub(crate) fn require_token(
    service: &'static str,
    token: Option<&String>,
) -> Result<String, ApiError> {
    token
        .filter(|t| !t.is_empty())
        .cloned()
        .ok_or(ApiError::MissingToken { service })
}
