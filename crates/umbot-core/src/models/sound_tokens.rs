use serde::{Deserialize, Serialize};

use super::{require, Model, Storage};
use crate::error::BotResult;

/// Platform-issued audio id cached by source path/URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundTokens {
    pub token: String,
    pub path: String,
    pub platform: String,
}

impl SoundTokens {
    pub fn new(
        token: impl Into<String>,
        path: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            path: path.into(),
            platform: platform.into(),
        }
    }

    pub fn lookup(storage: &dyn Storage, path: &str, platform: &str) -> BotResult<Option<String>> {
        Ok(Self::find(storage, &format!("{platform}:{path}"))?.map(|t| t.token))
    }
}

impl Model for SoundTokens {
    const TABLE: &'static str = "SoundTokens";

    fn key(&self) -> String {
        format!("{}:{}", self.platform, self.path)
    }

    fn validate(&self) -> BotResult<()> {
        require("SoundTokens", "token", &self.token, 150)?;
        require("SoundTokens", "path", &self.path, 1024)?;
        require("SoundTokens", "platform", &self.platform, 32)
    }
}
