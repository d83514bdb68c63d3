use serde_json::{json, Map, Value};

use super::{
    id_at, normalize_command, parse_payload, str_at, Outbound, Platform, PlatformKind, Reply,
};
use crate::components::button::VkKeyboard;
use crate::components::card::VkCard;
use crate::components::sound::{MessengerSound, RenderedSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

const PLATFORM: &str = "vk";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Event {
    #[default]
    MessageNew,
    Confirmation,
    /// Any other callback event: acknowledged, not processed.
    Ignored(String),
}

/// VK community bot (Callback API).
#[derive(Debug, Default)]
pub struct Vk {
    event: Event,
    peer_id: String,
    supports_carousel: bool,
}

impl Platform for Vk {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Vk
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
        let kind = request
            .get("type")
            .and_then(Value::as_str)
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "type" })?;
        self.event = match kind {
            "message_new" => Event::MessageNew,
            "confirmation" => Event::Confirmation,
            other => Event::Ignored(other.to_string()),
        };
        if self.event != Event::MessageNew {
            return Ok(());
        }

        let object = request
            .get("object")
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "object" })?;
        // API >= 5.103 nests the message; older versions send it flat.
        let message = object.get("message").unwrap_or(object);

        ctrl.user_id = id_at(message, "/from_id")
            .or_else(|| id_at(message, "/user_id"))
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "message.from_id" })?;
        self.peer_id = id_at(message, "/peer_id").unwrap_or_else(|| ctrl.user_id.clone());
        self.supports_carousel = object
            .pointer("/client_info/carousel")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        ctrl.original_user_command = str_at(message, "/text").to_string();
        ctrl.user_command = normalize_command(&ctrl.original_user_command);
        ctrl.is_screen = true;
        ctrl.message_id = message.get("id").and_then(Value::as_i64).unwrap_or(1).max(1);

        if let Some(raw) = message.get("payload").and_then(Value::as_str) {
            let payload = parse_payload(raw);
            // "Start" button of a new conversation
            if payload.get("command").and_then(Value::as_str) == Some("start") {
                ctrl.message_id = 0;
            }
            ctrl.payload = Some(payload);
        }
        Ok(())
    }

    fn intercept(&self, ctx: &AppContext, _ctrl: &mut BotController) -> Option<Reply> {
        match &self.event {
            Event::MessageNew => None,
            Event::Confirmation => {
                let token = ctx.params().vk_confirmation_token.clone().unwrap_or_else(|| {
                    tracing::warn!(
                        target: "umbot::vk",
                        "confirmation requested but vk_confirmation_token is not set"
                    );
                    String::new()
                });
                Some(Reply::Text(token))
            }
            Event::Ignored(kind) => {
                tracing::debug!(target: "umbot::vk", "ignoring event {kind}");
                Some(Reply::ack())
            }
        }
    }

    fn get_context(&self, _ctx: &AppContext, ctrl: &BotController) -> Reply {
        let mut extra = Map::new();
        let mut attachments: Vec<Value> = Vec::new();

        if !ctrl.buttons.is_empty() {
            extra.insert("keyboard".into(), ctrl.buttons.render(&VkKeyboard));
        }

        if !ctrl.card.is_empty() {
            match ctrl.card.render(&VkCard) {
                Value::Array(tokens) => attachments.extend(tokens),
                carousel @ Value::Object(_) if self.supports_carousel => {
                    extra.insert("template".into(), carousel);
                }
                Value::Object(_) => attachments.extend(
                    ctrl.card
                        .images
                        .iter()
                        .filter_map(|i| i.image_token.clone())
                        .take(10)
                        .map(Value::String),
                ),
                _ => {}
            }
        }

        if let RenderedSound::Files(files) = ctrl.sound.render(&MessengerSound, ctrl.speech()) {
            attachments.extend(
                files
                    .into_iter()
                    .filter(|f| f.starts_with("doc") || f.starts_with("audio"))
                    .map(Value::String),
            );
        }
        if !attachments.is_empty() {
            extra.insert("attachment".into(), json!(attachments));
        }

        Reply::Push {
            ack: "ok".to_string(),
            calls: vec![Outbound::VkMessage {
                peer_id: self.peer_id.clone(),
                message: ctrl.text.clone(),
                extra,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::button::Button;
    use crate::config::AppConfig;
    use crate::models::SledStorage;
    use std::sync::Arc;

    fn ctx() -> AppContext {
        let mut config = AppConfig::default();
        config.params.vk_confirmation_token = Some("abc123".into());
        AppContext::with_storage(config, Arc::new(SledStorage::temporary().unwrap())).unwrap()
    }

    fn message_new(text: &str, payload: Option<&str>) -> Value {
        let mut message = json!({"id": 15, "from_id": 100, "peer_id": 100, "text": text});
        if let Some(p) = payload {
            message["payload"] = json!(p);
        }
        json!({
            "type": "message_new",
            "group_id": 1,
            "object": {"message": message, "client_info": {"carousel": true, "keyboard": true}}
        })
    }

    #[test]
    fn confirmation_returns_token() {
        let ctx = ctx();
        let mut vk = Vk::default();
        let mut ctrl = BotController::new(PlatformKind::Vk);
        vk.init(&ctx, &json!({"type": "confirmation", "group_id": 1}), &mut ctrl).unwrap();
        assert_eq!(vk.intercept(&ctx, &mut ctrl), Some(Reply::Text("abc123".into())));
    }

    #[test]
    fn start_payload_means_first_message() {
        let ctx = ctx();
        let mut ctrl = BotController::new(PlatformKind::Vk);
        Vk::default()
            .init(&ctx, &message_new("Начать", Some(r#"{"command":"start"}"#)), &mut ctrl)
            .unwrap();
        assert_eq!(ctrl.message_id, 0);
        assert_eq!(ctrl.user_id, "100");
        assert_eq!(ctrl.user_command, "начать");
    }

    #[test]
    fn message_push_with_keyboard_and_carousel() {
        let ctx = ctx();
        let mut vk = Vk::default();
        let mut ctrl = BotController::new(PlatformKind::Vk);
        vk.init(&ctx, &message_new("каталог", None), &mut ctrl).unwrap();
        ctrl.text = "Вот что есть".into();
        ctrl.buttons.push(Button::new("Ещё"));
        ctrl.card.add("photo-1_1", "Один", "", None);
        ctrl.card.add("photo-1_2", "Два", "", None);

        let Reply::Push { ack, calls } = vk.get_context(&ctx, &ctrl) else {
            panic!("vk answers by push");
        };
        assert_eq!(ack, "ok");
        let Outbound::VkMessage { peer_id, message, extra } = &calls[0] else {
            panic!("expected messages.send");
        };
        assert_eq!(peer_id, "100");
        assert_eq!(message, "Вот что есть");
        assert_eq!(extra["keyboard"]["one_time"], json!(true));
        assert_eq!(extra["template"]["type"], json!("carousel"));
    }

    #[test]
    fn other_events_are_acknowledged() {
        let ctx = ctx();
        let mut vk = Vk::default();
        let mut ctrl = BotController::new(PlatformKind::Vk);
        vk.init(&ctx, &json!({"type": "message_typing_state", "object": {}}), &mut ctrl).unwrap();
        assert_eq!(vk.intercept(&ctx, &mut ctrl), Some(Reply::ack()));
    }
}
