use serde_json::{json, Value};

use super::{id_at, normalize_command, str_at, Platform, PlatformKind, Reply};
use crate::components::button::SmartAppSuggestions;
use crate::components::card::SmartAppCard;
use crate::components::sound::{RenderedSound, SmartAppSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;

const PLATFORM: &str = "smart-app";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum MessageName {
    #[default]
    MessageToSkill,
    ServerAction,
    RunApp,
    CloseApp,
}

/// Sber SmartApp (Salute) webhook.
#[derive(Debug, Default)]
pub struct SmartApp {
    message_name: MessageName,
    session_id: String,
    message_id: Value,
    uuid: Value,
    device: Value,
}

impl Platform for SmartApp {
    fn kind(&self) -> PlatformKind {
        PlatformKind::SmartApp
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
        let name = request
            .get("messageName")
            .and_then(Value::as_str)
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "messageName" })?;
        self.message_name = match name {
            "MESSAGE_TO_SKILL" => MessageName::MessageToSkill,
            "SERVER_ACTION" => MessageName::ServerAction,
            "RUN_APP" => MessageName::RunApp,
            "CLOSE_APP" => MessageName::CloseApp,
            other => {
                return Err(PlatformError::UnsupportedEvent {
                    platform: PLATFORM,
                    event: other.to_string(),
                })
            }
        };
        let payload = request
            .get("payload")
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "payload" })?;

        self.session_id = str_at(request, "/sessionId").to_string();
        self.message_id = request.get("messageId").cloned().unwrap_or(Value::Null);
        self.uuid = request.get("uuid").cloned().unwrap_or(Value::Null);
        self.device = payload.get("device").cloned().unwrap_or(Value::Null);

        ctrl.user_id = id_at(request, "/uuid/userId")
            .or_else(|| id_at(request, "/uuid/sub"))
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "uuid.userId" })?;
        ctrl.appeal = payload
            .pointer("/character/appeal")
            .and_then(Value::as_str)
            .map(str::to_string);
        ctrl.is_screen = payload
            .pointer("/device/capabilities/screen/available")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        ctrl.user_meta = payload.get("meta").cloned().unwrap_or(Value::Null);

        let new_session = payload.get("new_session").and_then(Value::as_bool).unwrap_or(false);
        ctrl.message_id = match (self.message_name, new_session) {
            (MessageName::RunApp, _) | (_, true) => 0,
            _ => self.message_id.as_i64().unwrap_or(1).max(1),
        };

        match self.message_name {
            MessageName::MessageToSkill => {
                ctrl.original_user_command = str_at(payload, "/message/original_text").to_string();
                ctrl.user_command = normalize_command(&ctrl.original_user_command);
            }
            MessageName::ServerAction => {
                let action = payload.get("server_action").cloned().unwrap_or(Value::Null);
                ctrl.user_command = normalize_command(str_at(&action, "/action_id"));
                ctrl.payload = Some(action);
            }
            MessageName::RunApp | MessageName::CloseApp => {}
        }
        if let Some(entities) = payload.pointer("/message/entities") {
            ctrl.nlu.set_nlu(json!({ "entities": entities }));
        }
        Ok(())
    }

    fn intercept(&self, _ctx: &AppContext, ctrl: &mut BotController) -> Option<Reply> {
        if self.message_name != MessageName::CloseApp {
            return None;
        }
        ctrl.is_end = true;
        tracing::debug!(target: "umbot::smart_app", session_id = %self.session_id, "app closed");
        Some(Reply::Text(String::new()))
    }

    fn get_context(&self, _ctx: &AppContext, ctrl: &BotController) -> Reply {
        let pronounce = match ctrl.sound.render(&SmartAppSound, ctrl.speech()) {
            RenderedSound::Speech(text) => text,
            RenderedSound::Files(_) => ctrl.speech().to_string(),
        };
        let pronounce_type = if pronounce.contains('<') {
            "application/ssml"
        } else {
            "application/text"
        };

        let mut items = Vec::new();
        if !ctrl.text.is_empty() {
            items.push(json!({ "bubble": { "text": ctrl.text, "expand_policy": "auto_expand" } }));
        }
        if ctrl.is_screen && !ctrl.card.is_empty() {
            let card = ctrl.card.render(&SmartAppCard);
            if !card.is_null() {
                items.push(json!({ "card": card }));
            }
        }

        let mut payload = json!({
            "pronounceText": pronounce,
            "pronounceTextType": pronounce_type,
            "items": items,
            "finished": ctrl.is_end,
            "auto_listening": !ctrl.is_end,
            "device": self.device,
        });
        let suggestions = ctrl.buttons.render(&SmartAppSuggestions);
        if !suggestions.is_null() {
            payload["suggestions"] = suggestions;
        }
        if let Some(emotion) = &ctrl.emotion {
            payload["emotion"] = json!({ "emotionId": emotion });
        }

        Reply::Inline(json!({
            "messageName": "ANSWER_TO_USER",
            "sessionId": self.session_id,
            "messageId": self.message_id,
            "uuid": self.uuid,
            "payload": payload,
        }))
    }
}
