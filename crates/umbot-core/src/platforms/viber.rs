use serde_json::Value;

use super::{
    id_at, normalize_command, parse_payload, str_at, Outbound, Platform, PlatformKind, Reply,
};
use crate::api::file_name_of;
use crate::components::button::ViberKeyboard;
use crate::components::card::ViberCard;
use crate::components::nlu::UserName;
use crate::components::sound::{MessengerSound, RenderedSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

const PLATFORM: &str = "viber";

/// Viber bot webhook.
#[derive(Debug, Default)]
pub struct Viber {
    receiver: String,
    ignored: bool,
}

impl Platform for Viber {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Viber
    }

    fn init(
        &mut self,
        _ctx: &AppContext,
        request: &Value,
        ctrl: &mut BotController,
    ) -> Result<(), PlatformError> {
        if request.as_object().map_or(true, |m| m.is_empty()) {
            return Err(PlatformError::EmptyRequest { platform: PLATFORM });
        }
        let event = request
            .get("event")
            .and_then(Value::as_str)
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "event" })?;

        let user = match event {
            "message" => request.get("sender"),
            "conversation_started" => request.get("user"),
            other => {
                tracing::debug!(target: "umbot::viber", "ignoring event {other}");
                self.ignored = true;
                return Ok(());
            }
        }
        .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "sender" })?;

        ctrl.user_id = id_at(user, "/id")
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "sender.id" })?;
        self.receiver = ctrl.user_id.clone();
        ctrl.nlu.set_this_user(UserName {
            username: user.get("name").and_then(Value::as_str).map(str::to_string),
            ..Default::default()
        });
        ctrl.is_screen = true;

        if event == "conversation_started" {
            ctrl.message_id = 0;
            return Ok(());
        }

        let text = str_at(request, "/message/text");
        ctrl.original_user_command = text.to_string();
        ctrl.user_command = normalize_command(text);
        if text.trim_start().starts_with('{') {
            ctrl.payload = Some(parse_payload(text));
        }
        ctrl.message_id = request
            .get("message_token")
            .and_then(Value::as_i64)
            .unwrap_or(1)
            .max(1);
        Ok(())
    }

    fn intercept(&self, _ctx: &AppContext, _ctrl: &mut BotController) -> Option<Reply> {
        self.ignored.then(Reply::ack)
    }

    fn get_context(&self, _ctx: &AppContext, ctrl: &BotController) -> Reply {
        let keyboard = ctrl.buttons.render(&ViberKeyboard);
        let mut calls = Vec::new();

        if !ctrl.text.is_empty() {
            calls.push(Outbound::ViberMessage {
                receiver: self.receiver.clone(),
                text: ctrl.text.clone(),
                keyboard: keyboard.clone(),
            });
        }
        if !ctrl.card.is_empty() {
            let rich_media = ctrl.card.render(&ViberCard);
            if !rich_media.is_null() {
                calls.push(Outbound::ViberRichMedia {
                    receiver: self.receiver.clone(),
                    rich_media,
                    keyboard: if calls.is_empty() { keyboard.clone() } else { Value::Null },
                });
            }
        }
        if let RenderedSound::Files(files) = ctrl.sound.render(&MessengerSound, ctrl.speech()) {
            calls.extend(files.into_iter().map(|media| Outbound::ViberFile {
                receiver: self.receiver.clone(),
                file_name: file_name_of(&media),
                media,
            }));
        }

        Reply::Push {
            ack: "ok".to_string(),
            calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::button::Button;
    use crate::config::AppConfig;
    use crate::models::SledStorage;
    use serde_json::json;
    use std::sync::Arc;

    fn ctx() -> AppContext {
        let storage = Arc::new(SledStorage::temporary().unwrap());
        AppContext::with_storage(AppConfig::default(), storage).unwrap()
    }

    #[test]
    fn conversation_started_is_welcome() {
        let ctx = ctx();
        let mut ctrl = BotController::new(PlatformKind::Viber);
        let request = json!({
            "event": "conversation_started",
            "user": {"id": "v-user==", "name": "Анна"},
            "type": "open"
        });
        Viber::default().init(&ctx, &request, &mut ctrl).unwrap();
        assert_eq!(ctrl.message_id, 0);
        assert_eq!(ctrl.user_id, "v-user==");
        assert_eq!(ctrl.nlu.get_user_name().unwrap().username.as_deref(), Some("Анна"));
    }

    #[test]
    fn message_with_keyboard_and_rich_media() {
        let ctx = ctx();
        let mut viber = Viber::default();
        let mut ctrl = BotController::new(PlatformKind::Viber);
        let request = json!({
            "event": "message",
            "message_token": 4912661846655238145_i64,
            "sender": {"id": "v-user==", "name": "Анна"},
            "message": {"type": "text", "text": "Меню"}
        });
        viber.init(&ctx, &request, &mut ctrl).unwrap();
        assert_eq!(ctrl.user_command, "меню");

        ctrl.text = "Выберите".into();
        ctrl.buttons.push(Button::new("Пицца"));
        ctrl.card.add("https://example.com/p.png", "Пицца", "", None);
        let Reply::Push { calls, .. } = viber.get_context(&ctx, &ctrl) else {
            panic!("viber answers by push");
        };
        assert_eq!(calls.len(), 2);
        let Outbound::ViberMessage { keyboard, .. } = &calls[0] else {
            panic!("text message first");
        };
        assert_eq!(keyboard["Type"], json!("keyboard"));
        assert!(matches!(
            &calls[1],
            Outbound::ViberRichMedia { keyboard, .. } if keyboard.is_null()
        ));
    }

    #[test]
    fn delivery_receipts_are_acknowledged() {
        let ctx = ctx();
        let mut viber = Viber::default();
        let mut ctrl = BotController::new(PlatformKind::Viber);
        viber.init(&ctx, &json!({"event": "delivered", "message_token": 1}), &mut ctrl).unwrap();
        assert_eq!(viber.intercept(&ctx, &mut ctrl), Some(Reply::ack()));
    }
}
