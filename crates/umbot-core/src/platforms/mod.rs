//! Platform adapters and the registry that maps identifiers to them.
//!
//! An adapter is created per request. `init` maps the webhook onto the controller,
//! `get_context` maps the controller back onto a [`Reply`]. Adapters never touch the
//! network: messenger replies are returned as [`Outbound`] calls for the runner.

mod alisa;
mod dialogs;
mod marusia;
mod smart_app;
mod telegram;
mod viber;
mod vk;

pub use alisa::Alisa;
pub use marusia::Marusia;
pub use smart_app::SmartApp;
pub use telegram::Telegram;
pub use viber::Viber;
pub use vk::Vk;

use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Alisa,
    Marusia,
    SmartApp,
    Vk,
    Telegram,
    Viber,
    /// Adapter registered by the application.
    Custom(String),
}

impl PlatformKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Alisa => "alisa",
            Self::Marusia => "marusia",
            Self::SmartApp => "smart-app",
            Self::Vk => "vk",
            Self::Telegram => "telegram",
            Self::Viber => "viber",
            Self::Custom(id) => id,
        }
    }

    /// Platforms that speak the response.
    pub fn is_voice(&self) -> bool {
        matches!(self, Self::Alisa | Self::Marusia | Self::SmartApp)
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Platform REST call produced by an adapter and delivered by the runner.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    TelegramMessage {
        chat_id: String,
        text: String,
        reply_markup: Value,
    },
    TelegramPhoto {
        chat_id: String,
        photo: String,
        caption: String,
        reply_markup: Value,
    },
    TelegramPoll {
        chat_id: String,
        question: String,
        options: Vec<String>,
    },
    TelegramAudio {
        chat_id: String,
        audio: String,
    },
    VkMessage {
        peer_id: String,
        message: String,
        extra: Map<String, Value>,
    },
    ViberMessage {
        receiver: String,
        text: String,
        keyboard: Value,
    },
    ViberRichMedia {
        receiver: String,
        rich_media: Value,
        keyboard: Value,
    },
    ViberFile {
        receiver: String,
        media: String,
        file_name: String,
    },
}

/// What the webhook answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// JSON body (voice platforms).
    Inline(Value),
    /// Plain-text body (VK confirmation, acknowledgements).
    Text(String),
    /// Calls the runner delivers, then answers the webhook with `ack`.
    Push { ack: String, calls: Vec<Outbound> },
}

impl Reply {
    pub(crate) fn ack() -> Self {
        Self::Text("ok".to_string())
    }
}

pub trait Platform: Send + Sync {
    fn kind(&self) -> PlatformKind;

    /// Parse the webhook onto the controller; malformed input is an error.
    fn init(
        &mut self,
        ctx: &AppContext,
        request: &Value,
        ctrl: &mut BotController,
    ) -> Result<(), PlatformError>;

    /// Answer without running the skill (health checks, confirmations, ignored events).
    fn intercept(&self, _ctx: &AppContext, _ctrl: &mut BotController) -> Option<Reply> {
        None
    }

    fn get_context(&self, ctx: &AppContext, ctrl: &BotController) -> Reply;

    /// User data lives in the platform session state instead of the store.
    fn uses_platform_state(&self, _ctx: &AppContext) -> bool {
        false
    }

    /// Elapsed time after which the platform drops the answer.
    fn time_budget(&self) -> Option<Duration> {
        None
    }
}

type Factory = Arc<dyn Fn() -> Box<dyn Platform> + Send + Sync>;

/// Identifier → adapter factory.
#[derive(Clone, Default)]
pub struct PlatformRegistry {
    factories: HashMap<String, Factory>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the six built-in platforms.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("alisa", || Box::new(Alisa::default()))
            .register("marusia", || Box::new(Marusia::default()))
            .register("smart-app", || Box::new(SmartApp::default()))
            .register("vk", || Box::new(Vk::default()))
            .register("telegram", || Box::new(Telegram::default()))
            .register("viber", || Box::new(Viber::default()));
        registry
    }

    /// Add or replace an adapter.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Platform> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
        self
    }

    pub fn create(&self, id: &str) -> Result<Box<dyn Platform>, PlatformError> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| PlatformError::Unknown(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for PlatformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformRegistry")
            .field("platforms", &self.identifiers())
            .finish()
    }
}

/// String field at `pointer`, empty when absent.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> &'a str {
    value.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

/// Id-like field at `pointer` as a string; numbers are formatted.
pub(crate) fn id_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Button payloads arrive as JSON strings on messengers.
pub(crate) fn parse_payload(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

pub(crate) fn normalize_command(raw: &str) -> String {
    raw.trim().to_lowercase()
}
