use serde_json::{json, Value};
use std::time::Duration;

use super::dialogs::{self, DialogsSession};
use super::{Platform, PlatformKind, Reply};
use crate::components::card::MarusiaCard;
use crate::components::sound::{MarusiaSound, RenderedSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

const PLATFORM: &str = "marusia";
const TIME_BUDGET: Duration = Duration::from_millis(2800);

/// VK Marusia skill webhook; same envelope as Alisa plus a `session` echo.
#[derive(Debug, Default)]
pub struct Marusia {
    session: DialogsSession,
}

impl Platform for Marusia {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Marusia
    }

    fn init(
        &mut self,
        ctx: &AppContext,
        request: &Value,
        ctrl: &mut BotController,
    ) -> Result<(), PlatformError> {
        self.session = dialogs::parse(PLATFORM, request, ctrl)?;
        if self.uses_platform_state(ctx) {
            ctrl.user_data = dialogs::platform_user_data(request, self.session.authorized);
        }
        tracing::debug!(
            target: "umbot::marusia",
            session_id = %self.session.session_id,
            "request parsed"
        );
        Ok(())
    }

    fn get_context(&self, ctx: &AppContext, ctrl: &BotController) -> Reply {
        let tts = match ctrl.sound.render(&MarusiaSound, ctrl.speech()) {
            RenderedSound::Speech(tts) => tts,
            RenderedSound::Files(_) => ctrl.speech().to_string(),
        };
        let mut response = dialogs::response_body(ctrl, &tts);
        if ctrl.is_screen && !ctrl.card.is_empty() {
            let card = ctrl.card.render(&MarusiaCard);
            if !card.is_null() {
                response["card"] = card;
            }
        }

        let mut out = json!({
            "version": "1.0",
            "session": {
                "session_id": self.session.session_id,
                "message_id": self.session.message_id,
                "user_id": self.session.user_id,
            },
            "response": response,
        });
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::SledStorage;
    use std::sync::Arc;

    #[test]
    fn session_is_echoed() {
        let storage = Arc::new(SledStorage::temporary().unwrap());
        let ctx = AppContext::with_storage(AppConfig::default(), storage).unwrap();
        let request = json!({
            "meta": {"client_id": "MailRu-VC/1.0", "interfaces": {"screen": {}}},
            "session": {
                "session_id": "m-1",
                "message_id": 3,
                "user_id": "legacy-id",
                "application": {"application_id": "app-7"},
                "new": false
            },
            "request": {
                "command": "дальше",
                "original_utterance": "Дальше",
                "type": "SimpleUtterance"
            },
            "version": "1.0"
        });
        let mut marusia = Marusia::default();
        let mut ctrl = BotController::new(PlatformKind::Marusia);
        marusia.init(&ctx, &request, &mut ctrl).unwrap();
        assert_eq!(ctrl.user_id, "app-7");

        ctrl.text = "Следующий вопрос".into();
        let Reply::Inline(out) = marusia.get_context(&ctx, &ctrl) else {
            panic!("marusia answers inline");
        };
        assert_eq!(
            out["session"],
            json!({"session_id": "m-1", "message_id": 3, "user_id": "app-7"})
        );
        assert_eq!(out["response"]["text"], json!("Следующий вопрос"));
        assert_eq!(out["response"]["end_session"], json!(false));
    }
}
