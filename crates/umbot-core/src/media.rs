//! Resolve card images and custom sounds into platform-issued tokens before rendering.
//!
//! Lookup order: hot cache, then the token models, then an upload through the
//! platform API. Failures are logged and the item stays unresolved; renderers skip it.

use crate::api::{ApiClient, MarusiaApi, Upload, VkApi, YandexImageApi, YandexSoundApi};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::ApiError;
use crate::models::{ImageTokens, Model, SoundTokens};
use crate::platforms::PlatformKind;
use crate::text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Sound,
}

impl MediaKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Sound => "sound",
        }
    }
}

pub struct MediaResolver<'a> {
    ctx: &'a AppContext,
    platform: &'a PlatformKind,
}

impl<'a> MediaResolver<'a> {
    pub fn new(ctx: &'a AppContext, platform: &'a PlatformKind) -> Self {
        Self { ctx, platform }
    }

    /// Fill `image_token` on card images and swap custom sound sources for tokens.
    pub async fn resolve(&self, ctrl: &mut BotController) {
        // Viber and SmartApp take public URLs as they are.
        if !self.keeps_tokens() {
            return;
        }
        let peer = ctrl.user_id.clone();

        for image in &mut ctrl.card.images {
            if image.image_token.is_some() {
                continue;
            }
            let Some(source) = image.image_dir.clone() else {
                continue;
            };
            image.image_token = self.token(MediaKind::Image, &source, &peer).await;
        }

        for sound in &mut ctrl.sound.sounds {
            for source in &mut sound.sounds {
                if source.starts_with('<') || !is_file_source(source) {
                    continue;
                }
                if let Some(token) = self.token(MediaKind::Sound, source, &peer).await {
                    *source = self.sound_markup(&token);
                }
            }
        }
    }

    /// Cached or freshly uploaded token for `source`.
    pub async fn token(&self, kind: MediaKind, source: &str, peer: &str) -> Option<String> {
        let platform = self.platform.as_str();
        let cache_key = format!("{platform}:{}:{source}", kind.as_str());
        if let Some(token) = self.ctx.media_cache.get(&cache_key) {
            return Some(token.clone());
        }

        let stored = match kind {
            MediaKind::Image => ImageTokens::lookup(self.ctx.storage.as_ref(), source, platform),
            MediaKind::Sound => SoundTokens::lookup(self.ctx.storage.as_ref(), source, platform),
        };
        match stored {
            Ok(Some(token)) => {
                self.ctx.media_cache.insert(cache_key, token.clone());
                return Some(token);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(target: "umbot::media", "{platform}: token lookup failed: {e}")
            }
        }

        let token = match self.upload(kind, source, peer).await {
            Ok(Some(token)) => token,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(
                    target: "umbot::media",
                    "{platform}: upload of {source} failed: {e}"
                );
                return None;
            }
        };
        self.remember(kind, source, &token);
        Some(token)
    }

    /// Store a token issued outside the resolver (Telegram `file_id` after a send).
    pub fn remember(&self, kind: MediaKind, source: &str, token: &str) {
        let platform = self.platform.as_str();
        let storage = self.ctx.storage.as_ref();
        let saved = match kind {
            MediaKind::Image => ImageTokens::new(token, source, platform).save(storage),
            MediaKind::Sound => SoundTokens::new(token, source, platform).save(storage),
        };
        if let Err(e) = saved {
            tracing::warn!(target: "umbot::media", "{platform}: token not saved: {e}");
        }
        self.ctx
            .media_cache
            .insert(format!("{platform}:{}:{source}", kind.as_str()), token.to_string());
    }

    fn keeps_tokens(&self) -> bool {
        matches!(
            self.platform,
            PlatformKind::Alisa | PlatformKind::Marusia | PlatformKind::Vk | PlatformKind::Telegram
        )
    }

    /// `None` when the platform takes the source as is (Telegram sends local files itself).
    async fn upload(
        &self,
        kind: MediaKind,
        source: &str,
        peer: &str,
    ) -> Result<Option<String>, ApiError> {
        let api = &self.ctx.api;
        let params = self.ctx.params();
        let token = match (self.platform, kind) {
            (PlatformKind::Alisa, MediaKind::Image) => {
                let images = YandexImageApi::from_params(api.clone(), params)?;
                if text::is_url(source) {
                    images.upload_url(source).await?
                } else {
                    images.upload_file(Upload::path(source)).await?
                }
            }
            (PlatformKind::Alisa, MediaKind::Sound) => {
                let sounds = YandexSoundApi::from_params(api.clone(), params)?;
                let id = sounds.upload_file(fetch(api, source).await?).await?;
                format!("dialogs-upload/{}/{}", sounds.skill_id(), id)
            }
            (PlatformKind::Marusia, MediaKind::Image) => {
                MarusiaApi::from_params(api.clone(), params)?
                    .upload_picture(fetch(api, source).await?)
                    .await?
            }
            (PlatformKind::Marusia, MediaKind::Sound) => {
                MarusiaApi::from_params(api.clone(), params)?
                    .upload_audio(fetch(api, source).await?)
                    .await?
            }
            (PlatformKind::Vk, MediaKind::Image) => {
                VkApi::from_params(api.clone(), params)?
                    .upload_photo(peer, fetch(api, source).await?)
                    .await?
            }
            (PlatformKind::Vk, MediaKind::Sound) => {
                VkApi::from_params(api.clone(), params)?
                    .upload_doc(peer, fetch(api, source).await?, "audio_message")
                    .await?
            }
            _ => return Ok(None),
        };
        Ok(Some(token))
    }

    fn sound_markup(&self, token: &str) -> String {
        match self.platform {
            PlatformKind::Alisa => format!("<speaker audio=\"{token}.opus\">"),
            PlatformKind::Marusia => format!("<speaker audio_vk_id={token}>"),
            _ => token.to_string(),
        }
    }
}

pub(crate) fn is_file_source(source: &str) -> bool {
    text::is_url(source) || std::path::Path::new(source).is_file()
}

async fn fetch(api: &ApiClient, source: &str) -> Result<Upload, ApiError> {
    if text::is_url(source) {
        api.download("media", source).await
    } else {
        Ok(Upload::path(source))
    }
}
