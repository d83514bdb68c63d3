use serde_json::{json, Value};
use std::time::Duration;

use super::dialogs::{self, DialogsSession};
use super::{Platform, PlatformKind, Reply};
use crate::components::card::AlisaCard;
use crate::components::sound::{AlisaSound, RenderedSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

const PLATFORM: &str = "alisa";
/// Yandex drops answers that take longer than 3 s; keep a margin.
const TIME_BUDGET: Duration = Duration::from_millis(2800);

/// Yandex Alisa skill webhook.
#[derive(Debug, Default)]
pub struct Alisa {
    session: DialogsSession,
    is_ping: bool,
}

impl Platform for Alisa {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Alisa
    }

    fn init(
        &mut self,
        ctx: &AppContext,
        request: &Value,
        ctrl: &mut BotController,
    ) -> Result<(), PlatformError> {
        self.session = dialogs::parse(PLATFORM, request, ctrl)?;
        self.is_ping = ctrl.original_user_command == "ping" || ctrl.user_command == "ping";
        if self.uses_platform_state(ctx) {
            ctrl.user_data = dialogs::platform_user_data(request, self.session.authorized);
        }
        tracing::debug!(
            target: "umbot::alisa",
            session_id = %self.session.session_id,
            message_id = self.session.message_id,
            "request parsed"
        );
        Ok(())
    }

    fn intercept(&self, ctx: &AppContext, ctrl: &mut BotController) -> Option<Reply> {
        if !self.is_ping {
            return None;
        }
        ctrl.text = "pong".to_string();
        ctrl.tts = None;
        Some(self.get_context(ctx, ctrl))
    }

    fn get_context(&self, ctx: &AppContext, ctrl: &BotController) -> Reply {
        if ctrl.is_auth && ctrl.user_token.is_none() {
            return Reply::Inline(json!({ "version": "1.0", "start_account_linking": {} }));
        }

        let tts = match ctrl.sound.render(&AlisaSound, ctrl.speech()) {
            RenderedSound::Speech(tts) => tts,
            RenderedSound::Files(_) => ctrl.speech().to_string(),
        };
        let mut response = dialogs::response_body(ctrl, &tts);
        if ctrl.is_screen && !ctrl.card.is_empty() {
            let card = ctrl.card.render(&AlisaCard);
            if !card.is_null() {
                response["card"] = card;
            }
        }

        let mut out = json!({ "version": "1.0", "response": response });
        let use_platform_state = self.uses_platform_state(ctx);
        dialogs::attach_state(&mut out, ctrl, self.session.authorized, use_platform_state);
        Reply::Inline(out)
    }

    fn uses_platform_state(&self, ctx: &AppContext) -> bool {
        ctx.config.use_platform_state
    }

    fn time_budget(&self) -> Option<Duration> {
        Some(TIME_BUDGET)
    }
}
