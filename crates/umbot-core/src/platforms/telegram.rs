use serde_json::{json, Value};

use super::{
    id_at, normalize_command, parse_payload, str_at, Outbound, Platform, PlatformKind, Reply,
};
use crate::components::button::TelegramKeyboard;
use crate::components::card::{TelegramCard, TELEGRAM_MAX_POLL_QUESTION};
use crate::components::nlu::UserName;
use crate::components::sound::{MessengerSound, RenderedSound};
use crate::context::AppContext;
use crate::controller::BotController;
use crate::error::PlatformError;
use crate::text;

const PLATFORM: &str = "telegram";

/// Telegram Bot API webhook (`Update` objects).
#[derive(Debug, Default)]
pub struct Telegram {
    chat_id: String,
    /// Update kind we do not process (edited messages, channel posts, ...).
    ignored: bool,
}

fn user_name(from: &Value) -> UserName {
    let field = |key: &str| from.get(key).and_then(Value::as_str).map(str::to_string);
    UserName {
        username: field("username"),
        first_name: field("first_name"),
        last_name: field("last_name"),
    }
}

impl Platform for Telegram {
    fn kind(&self) -> PlatformKind {
        PlatformKind::Telegram
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

        let (message, from, text) = if let Some(message) = request.get("message") {
            (message, message.get("from"), str_at(message, "/text"))
        } else if let Some(callback) = request.get("callback_query") {
            let data = str_at(callback, "/data");
            ctrl.payload = Some(parse_payload(data));
            let message = callback
                .get("message")
                .ok_or(PlatformError::MissingField {
                    platform: PLATFORM,
                    field: "callback_query.message",
                })?;
            (message, callback.get("from"), data)
        } else {
            self.ignored = true;
            return Ok(());
        };

        self.chat_id = id_at(message, "/chat/id")
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "message.chat.id" })?;
        let from = from.ok_or(PlatformError::MissingField { platform: PLATFORM, field: "from" })?;
        ctrl.user_id = id_at(from, "/id")
            .ok_or(PlatformError::MissingField { platform: PLATFORM, field: "from.id" })?;
        ctrl.nlu.set_this_user(user_name(from));

        ctrl.original_user_command = text.to_string();
        ctrl.user_command = normalize_command(text);
        ctrl.is_screen = true;
        ctrl.message_id = if ctrl.user_command.starts_with("/start") {
            0
        } else {
            message.get("message_id").and_then(Value::as_i64).unwrap_or(1).max(1)
        };
        Ok(())
    }

    fn intercept(&self, _ctx: &AppContext, _ctrl: &mut BotController) -> Option<Reply> {
        self.ignored.then(Reply::ack)
    }

    fn get_context(&self, _ctx: &AppContext, ctrl: &BotController) -> Reply {
        let keyboard = ctrl.buttons.render(&TelegramKeyboard);
        let mut calls = Vec::new();
        let mut keyboard_sent = false;

        if !ctrl.text.is_empty() {
            calls.push(Outbound::TelegramMessage {
                chat_id: self.chat_id.clone(),
                text: ctrl.text.clone(),
                reply_markup: keyboard.clone(),
            });
            keyboard_sent = true;
        }

        if !ctrl.card.is_empty() {
            let mut card = ctrl.card.render(&TelegramCard);
            // sendPoll rejects an empty question: ask with the reply text, or show a photo.
            if card.get("options").is_some() && str_at(&card, "/question").is_empty() {
                if ctrl.text.is_empty() {
                    let mut single = ctrl.card.clone();
                    single.is_one = true;
                    card = single.render(&TelegramCard);
                } else {
                    card["question"] =
                        json!(text::resize(&ctrl.text, TELEGRAM_MAX_POLL_QUESTION, true));
                }
            }
            if let Some(options) = card.get("options").and_then(Value::as_array) {
                calls.push(Outbound::TelegramPoll {
                    chat_id: self.chat_id.clone(),
                    question: str_at(&card, "/question").to_string(),
                    options: options
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                });
            } else if let Some(photo) = card.get("photo").and_then(Value::as_str) {
                calls.push(Outbound::TelegramPhoto {
                    chat_id: self.chat_id.clone(),
                    photo: photo.to_string(),
                    caption: str_at(&card, "/caption").to_string(),
                    reply_markup: if keyboard_sent { Value::Null } else { keyboard.clone() },
                });
            }
        }

        if let RenderedSound::Files(files) = ctrl.sound.render(&MessengerSound, ctrl.speech()) {
            calls.extend(files.into_iter().map(|audio| Outbound::TelegramAudio {
                chat_id: self.chat_id.clone(),
                audio,
            }));
        }

        Reply::Push {
            ack: "ok".to_string(),
            calls,
        }
    }
}
