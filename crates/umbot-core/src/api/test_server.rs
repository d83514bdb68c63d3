//! Local HTTP server for client tests: records every request and answers with JSON
//! chosen by path.

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, Method, Uri};
use axum::{Form, Json, Router};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::ApiClient;

#[derive(Debug, Clone)]
pub(crate) struct Recorded {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub(crate) async fn form(&self) -> HashMap<String, String> {
        let request = Request::builder()
            .method(Method::POST)
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(self.body.clone()))
            .unwrap();
        let Form(form) = Form::<HashMap<String, String>>::from_request(request, &())
            .await
            .unwrap();
        form
    }

    pub(crate) fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub(crate) fn header(&self, name: &str) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }
}

pub(crate) struct TestServer {
    pub url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    /// `reply(path, base_url)` builds the answer; `base_url` lets upload servers point back here.
    pub(crate) async fn start<F>(reply: F) -> Self
    where
        F: Fn(&str, &str) -> Value + Send + Sync + 'static,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let reply = Arc::new(reply);
        let log = requests.clone();
        let base = url.clone();
        let app = Router::new().fallback(
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let reply = reply.clone();
                let log = log.clone();
                let base = base.clone();
                async move {
                    let path = uri.path().to_string();
                    let answer = reply(&path, &base);
                    log.lock().unwrap().push(Recorded { method, path, headers, body });
                    Json(answer)
                }
            },
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, requests }
    }

    pub(crate) fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn paths(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.path).collect()
    }
}

pub(crate) fn client() -> ApiClient {
    ApiClient::new(Duration::from_secs(5)).unwrap()
}
