//! Application configuration: storage backend, platform tokens, texts and intents.
//!
//! Loaded from defaults, then an optional TOML file (`UMBOT_CONFIG`, default
//! `config/umbot.toml`), then `UMBOT__*` environment variables.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | UMBOT__STORAGE__MODE | file | `file` (JSON per table) or `embedded` (sled trees). |
//! | UMBOT__STORAGE__PATH | ./data | Directory for JSON tables or the sled database. |
//! | UMBOT__LOG_DIR | ./logs | Directory for the gateway log file. |
//! | UMBOT__BIND_ADDR | 127.0.0.1:8000 | Gateway listen address. |
//! | UMBOT__PARAMS__TELEGRAM_TOKEN | unset | Bot API token. |

use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::error::BotResult;

pub const WELCOME_INTENT_NAME: &str = "welcome";
pub const HELP_INTENT_NAME: &str = "help";

const DEFAULT_CONFIG_PATH: &str = "config/umbot.toml";

/// Which persistence backend the models write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// One JSON file per table.
    #[default]
    File,
    /// One sled tree per collection.
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::File,
            path: default_storage_path(),
        }
    }
}

/// A named user command matched by keyword slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    pub name: String,
    #[serde(default)]
    pub slots: Vec<String>,
    /// Slots are regular expressions instead of plain substrings.
    #[serde(default)]
    pub is_pattern: bool,
}

/// Platform tokens, texts and intents (the former `mmApp.params`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformParams {
    #[serde(default = "default_welcome_text", deserialize_with = "one_or_many")]
    pub welcome_text: Vec<String>,
    #[serde(default = "default_help_text", deserialize_with = "one_or_many")]
    pub help_text: Vec<String>,
    #[serde(default = "default_intents")]
    pub intents: Vec<IntentConfig>,

    #[serde(default)]
    pub telegram_token: Option<String>,

    #[serde(default)]
    pub vk_token: Option<String>,
    #[serde(default)]
    pub vk_confirmation_token: Option<String>,
    #[serde(default = "default_vk_api_version")]
    pub vk_api_version: String,

    #[serde(default)]
    pub viber_token: Option<String>,
    /// Sender name shown by Viber.
    #[serde(default)]
    pub viber_sender: Option<String>,
    #[serde(default = "default_viber_api_version")]
    pub viber_api_version: u8,

    /// OAuth token for dialogs image/sound storage.
    #[serde(default)]
    pub yandex_token: Option<String>,
    #[serde(default)]
    pub yandex_speech_kit_token: Option<String>,

    #[serde(default)]
    pub marusia_token: Option<String>,

    /// Skill id in the Yandex dialogs console (needed for image/sound upload).
    #[serde(default)]
    pub app_id: Option<String>,
}

impl Default for PlatformParams {
    fn default() -> Self {
        Self {
            welcome_text: default_welcome_text(),
            help_text: default_help_text(),
            intents: default_intents(),
            telegram_token: None,
            vk_token: None,
            vk_confirmation_token: None,
            vk_api_version: default_vk_api_version(),
            viber_token: None,
            viber_sender: None,
            viber_api_version: default_viber_api_version(),
            yandex_token: None,
            yandex_speech_kit_token: None,
            marusia_token: None,
            app_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub params: PlatformParams,
    /// Keep user data in the platform session state (Alisa) instead of the store.
    #[serde(default)]
    pub use_platform_state: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            log_dir: default_log_dir(),
            params: PlatformParams::default(),
            use_platform_state: false,
            request_timeout_secs: default_request_timeout_secs(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl AppConfig {
    /// Load config from file and environment. Precedence: env > `UMBOT_CONFIG` file > defaults.
    pub fn load() -> BotResult<Self> {
        let config_path =
            std::env::var("UMBOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    pub fn load_from(path: &Path) -> BotResult<Self> {
        let builder = config::Config::builder()
            .set_default("storage.mode", "file")?
            .set_default("storage.path", "./data")?
            .set_default("log_dir", "./logs")?
            .set_default("bind_addr", default_bind_addr())?
            .set_default("request_timeout_secs", 10_i64)?;

        let builder = if path.exists() {
            builder.add_source(config::File::from(path))
        } else {
            builder
        };

        let built = builder
            .add_source(config::Environment::with_prefix("UMBOT").separator("__"))
            .build()?;

        Ok(built.try_deserialize()?)
    }

    /// Parse a TOML document directly (tests, embedded configs).
    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_vk_api_version() -> String {
    "5.131".to_string()
}

fn default_viber_api_version() -> u8 {
    2
}

fn default_welcome_text() -> Vec<String> {
    vec!["Привет! Чем я могу помочь?".to_string()]
}

fn default_help_text() -> Vec<String> {
    vec!["Я умею отвечать на ваши вопросы. Просто спросите меня.".to_string()]
}

fn default_intents() -> Vec<IntentConfig> {
    vec![IntentConfig {
        name: HELP_INTENT_NAME.to_string(),
        slots: vec!["помощь".to_string(), "что ты умеешь".to_string()],
        is_pattern: false,
    }]
}

/// Texts may be given as a single string or a list of variants.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
