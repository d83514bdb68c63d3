//! Request runner: one webhook in, one [`Reply`] out.

use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::api::{ApiClient, TelegramApi, ViberApi, VkApi};
use crate::context::AppContext;
use crate::controller::{BotController, Skill};
use crate::error::{ApiError, BotResult};
use crate::media::{is_file_source, MediaKind, MediaResolver};
use crate::models::{Model, UsersData};
use crate::platforms::{Outbound, Platform, PlatformKind, PlatformRegistry, Reply};

/// Ties a skill to the platform registry and the shared context.
#[derive(Clone)]
pub struct Bot {
    ctx: Arc<AppContext>,
    registry: Arc<PlatformRegistry>,
    skill: Arc<dyn Skill>,
}

impl Bot {
    pub fn new(ctx: Arc<AppContext>, skill: Arc<dyn Skill>) -> Self {
        Self::with_registry(ctx, PlatformRegistry::with_defaults(), skill)
    }

    pub fn with_registry(
        ctx: Arc<AppContext>,
        registry: PlatformRegistry,
        skill: Arc<dyn Skill>,
    ) -> Self {
        Self {
            ctx,
            registry: Arc::new(registry),
            skill,
        }
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn registry(&self) -> &PlatformRegistry {
        &self.registry
    }

    /// Process one webhook body for `platform_id`.
    ///
    /// Unknown platforms and malformed requests are errors (the gateway answers
    /// `notFound`). Storage and delivery failures are logged and do not fail the request.
    pub async fn run(&self, platform_id: &str, request: &Value) -> BotResult<Reply> {
        let started = Instant::now();
        let ctx = self.ctx.as_ref();
        let mut platform = self.registry.create(platform_id)?;
        let kind = platform.kind();
        let mut ctrl = BotController::new(kind.clone());

        if let Err(e) = platform.init(ctx, request, &mut ctrl) {
            tracing::warn!(target: "umbot::bot", platform = %kind, "init failed: {e}");
            return Err(e.into());
        }
        if let Some(reply) = platform.intercept(ctx, &mut ctrl) {
            return Ok(reply);
        }

        let stored = !platform.uses_platform_state(ctx);
        // `None`: nothing to persist, either platform state or an unreadable record.
        let user = if stored { self.load_user(&kind, &mut ctrl) } else { None };

        ctrl.run(self.skill.as_ref(), ctx.params()).await;
        MediaResolver::new(ctx, &kind).resolve(&mut ctrl).await;
        let reply = platform.get_context(ctx, &ctrl);

        if let Some(existing) = user {
            self.save_user(&kind, &ctrl, existing);
        }

        let reply = match reply {
            Reply::Push { ack, calls } => {
                if ctrl.is_send {
                    self.deliver(&kind, calls).await;
                }
                Reply::Text(ack)
            }
            other => other,
        };

        check_budget(platform.as_ref(), started);
        Ok(reply)
    }

    fn storage_key(kind: &PlatformKind, ctrl: &BotController) -> String {
        match (kind, &ctrl.user_token) {
            (PlatformKind::Alisa, Some(token)) if !token.is_empty() => token.clone(),
            _ => ctrl.user_id.clone(),
        }
    }

    /// Outer `None` when the stored record could not be read; saving over it would lose it.
    fn load_user(
        &self,
        kind: &PlatformKind,
        ctrl: &mut BotController,
    ) -> Option<Option<UsersData>> {
        let key = Self::storage_key(kind, ctrl);
        match UsersData::load(self.ctx.storage.as_ref(), &key, kind.as_str()) {
            Ok(Some(user)) => {
                ctrl.user_data = user.data.clone();
                Some(Some(user))
            }
            Ok(None) => Some(None),
            Err(e) => {
                tracing::warn!(
                    target: "umbot::bot",
                    platform = %kind,
                    "user data not loaded, skipping save: {e}"
                );
                None
            }
        }
    }

    fn save_user(&self, kind: &PlatformKind, ctrl: &BotController, existing: Option<UsersData>) {
        let key = Self::storage_key(kind, ctrl);
        if key.is_empty() {
            return;
        }
        let mut user = existing.unwrap_or_else(|| UsersData::new(key, kind.as_str()));
        user.data = ctrl.user_data.clone();
        if !ctrl.user_meta.is_null() {
            user.meta = ctrl.user_meta.clone();
        }
        if let Err(e) = user.save(self.ctx.storage.as_ref()) {
            tracing::warn!(target: "umbot::bot", platform = %kind, "user data not saved: {e}");
        }
    }

    async fn deliver(&self, kind: &PlatformKind, calls: Vec<Outbound>) {
        let resolver = MediaResolver::new(&self.ctx, kind);
        for call in calls {
            if let Err(e) = self.send(&resolver, call).await {
                tracing::warn!(target: "umbot::bot", platform = %kind, "delivery failed: {e}");
            }
        }
    }

    async fn send(&self, resolver: &MediaResolver<'_>, call: Outbound) -> Result<(), ApiError> {
        let api: &ApiClient = &self.ctx.api;
        let params = self.ctx.params();
        match call {
            Outbound::TelegramMessage { chat_id, text, reply_markup } => {
                TelegramApi::from_params(api.clone(), params)?
                    .send_message(&chat_id, &text, Some(&reply_markup))
                    .await?;
            }
            Outbound::TelegramPhoto { chat_id, photo, caption, reply_markup } => {
                let sent = TelegramApi::from_params(api.clone(), params)?
                    .send_photo(&chat_id, &photo, Some(&caption), Some(&reply_markup))
                    .await?;
                remember_file_id(resolver, MediaKind::Image, &photo, &sent);
            }
            Outbound::TelegramPoll { chat_id, question, options } => {
                TelegramApi::from_params(api.clone(), params)?
                    .send_poll(&chat_id, &question, &options, None)
                    .await?;
            }
            Outbound::TelegramAudio { chat_id, audio } => {
                let sent = TelegramApi::from_params(api.clone(), params)?
                    .send_audio(&chat_id, &audio)
                    .await?;
                remember_file_id(resolver, MediaKind::Sound, &audio, &sent);
            }
            Outbound::VkMessage { peer_id, message, extra } => {
                VkApi::from_params(api.clone(), params)?
                    .messages_send(&peer_id, &message, &extra)
                    .await?;
            }
            Outbound::ViberMessage { receiver, text, keyboard } => {
                ViberApi::from_params(api.clone(), params)?
                    .send_message(&receiver, &text, Some(&keyboard))
                    .await?;
            }
            Outbound::ViberRichMedia { receiver, rich_media, keyboard } => {
                ViberApi::from_params(api.clone(), params)?
                    .rich_media(&receiver, &rich_media, Some(&keyboard))
                    .await?;
            }
            Outbound::ViberFile { receiver, media, file_name } => {
                let viber = ViberApi::from_params(api.clone(), params)?;
                let size = api.content_length("viber", &media).await?.unwrap_or(0);
                viber.send_file(&receiver, &media, &file_name, size).await?;
            }
        }
        Ok(())
    }
}

/// Telegram returns a reusable `file_id` once a local file or URL has been sent.
fn remember_file_id(resolver: &MediaResolver<'_>, kind: MediaKind, source: &str, sent: &Value) {
    if !is_file_source(source) {
        return;
    }
    if let Some(file_id) = TelegramApi::file_id(sent) {
        resolver.remember(kind, source, &file_id);
    }
}

fn check_budget(platform: &dyn Platform, started: Instant) {
    let Some(budget) = platform.time_budget() else {
        return;
    };
    let elapsed = started.elapsed();
    if elapsed > budget {
        tracing::warn!(
            target: "umbot::bot",
            platform = %platform.kind(),
            elapsed_ms = elapsed.as_millis() as u64,
            budget_ms = budget.as_millis() as u64,
            "response took longer than the platform allows"
        );
    }
}
