//! Request-scoped controller state and the skill hook.
//!
//! A platform adapter fills the controller from the webhook, [`BotController::run`]
//! resolves the intent and hands control to the [`Skill`], and the adapter reads the
//! result back to build the platform response.

use serde_json::Value;

use crate::components::{Buttons, Card, Nlu, Sounds};
use crate::config::{IntentConfig, PlatformParams, HELP_INTENT_NAME, WELCOME_INTENT_NAME};
use crate::platforms::PlatformKind;
use crate::text;

/// The end-developer's conversational logic.
#[async_trait::async_trait]
pub trait Skill: Send + Sync {
    /// Called once per request. `intent` is the matched intent name, `welcome` on the
    /// first message, or `None` when nothing matched.
    async fn action(&self, ctrl: &mut BotController, intent: Option<&str>);
}

#[derive(Debug, Clone)]
pub struct BotController {
    pub text: String,
    pub tts: Option<String>,
    pub buttons: Buttons,
    pub card: Card,
    pub sound: Sounds,
    pub nlu: Nlu,

    pub user_id: String,
    /// Account-linking token (Alisa).
    pub user_token: Option<String>,
    pub user_meta: Value,
    pub user_data: Value,

    /// `0` marks the first message of a session.
    pub message_id: i64,
    /// Lower-cased, trimmed command.
    pub user_command: String,
    pub original_user_command: String,
    pub payload: Option<Value>,
    /// Session state echoed back by platforms that support it.
    pub state: Option<Value>,

    pub is_screen: bool,
    pub is_end: bool,
    /// Messengers: deliver the response. A skill may clear it to stay silent.
    pub is_send: bool,
    /// Request account linking (Alisa) when no `user_token` is present.
    pub is_auth: bool,
    /// SmartApp character emotion id.
    pub emotion: Option<String>,
    /// SmartApp appeal (`official`, `no_official`).
    pub appeal: Option<String>,
    pub this_intent_name: Option<String>,

    pub platform: PlatformKind,
}

impl BotController {
    pub fn new(platform: PlatformKind) -> Self {
        Self {
            text: String::new(),
            tts: None,
            buttons: Buttons::new(),
            card: Card::new(),
            sound: Sounds::new(),
            nlu: Nlu::default(),
            user_id: String::new(),
            user_token: None,
            user_meta: Value::Null,
            user_data: Value::Null,
            message_id: 0,
            user_command: String::new(),
            original_user_command: String::new(),
            payload: None,
            state: None,
            is_screen: true,
            is_end: false,
            is_send: true,
            is_auth: false,
            emotion: None,
            appeal: None,
            this_intent_name: None,
            platform,
        }
    }

    /// Resolve the intent, fill welcome/help text and call the skill.
    pub async fn run(&mut self, skill: &dyn Skill, params: &PlatformParams) {
        let mut intent = Self::get_intent(&self.user_command, &params.intents).map(str::to_string);
        if intent.is_none()
            && !self.original_user_command.is_empty()
            && self.original_user_command != self.user_command
        {
            let original = self.original_user_command.to_lowercase();
            intent = Self::get_intent(&original, &params.intents).map(str::to_string);
        }
        if intent.is_none() && self.message_id == 0 {
            intent = Some(WELCOME_INTENT_NAME.to_string());
        }

        match intent.as_deref() {
            Some(WELCOME_INTENT_NAME) => self.text = text::get_text(&params.welcome_text),
            Some(HELP_INTENT_NAME) => self.text = text::get_text(&params.help_text),
            _ => {}
        }
        self.this_intent_name = intent.clone();

        skill.action(self, intent.as_deref()).await;

        if self.platform.is_voice() && self.tts.as_deref().map_or(true, str::is_empty) {
            self.tts = Some(self.text.clone());
        }
    }

    /// First configured intent whose slots match `text`.
    pub fn get_intent<'a>(text: &str, intents: &'a [IntentConfig]) -> Option<&'a str> {
        if text.is_empty() {
            return None;
        }
        intents
            .iter()
            .find(|intent| text::is_say_text(&intent.slots, text, intent.is_pattern))
            .map(|intent| intent.name.as_str())
    }

    /// TTS as the adapter should speak it: explicit TTS, otherwise the text.
    pub(crate) fn speech(&self) -> &str {
        self.tts
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<Option<String>>>);

    #[async_trait::async_trait]
    impl Skill for Recorder {
        async fn action(&self, ctrl: &mut BotController, intent: Option<&str>) {
            self.0.lock().unwrap().push(intent.map(str::to_string));
            if intent.is_none() {
                ctrl.text = format!("Вы сказали: {}", ctrl.user_command);
            }
        }
    }

    fn params() -> PlatformParams {
        PlatformParams {
            welcome_text: vec!["Привет!".into()],
            help_text: vec!["Я умею повторять.".into()],
            intents: vec![
                IntentConfig {
                    name: HELP_INTENT_NAME.into(),
                    slots: vec!["помощь".into(), "что ты умеешь".into()],
                    is_pattern: false,
                },
                IntentConfig {
                    name: "by_number".into(),
                    slots: vec![r"\bномер \d+".into()],
                    is_pattern: true,
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn first_message_is_welcome() {
        let skill = Recorder(Mutex::new(Vec::new()));
        let mut ctrl = BotController::new(PlatformKind::Alisa);
        ctrl.run(&skill, &params()).await;
        assert_eq!(ctrl.text, "Привет!");
        assert_eq!(ctrl.tts.as_deref(), Some("Привет!"));
        assert_eq!(ctrl.this_intent_name.as_deref(), Some("welcome"));
    }

    #[tokio::test]
    async fn help_and_pattern_intents() {
        let skill = Recorder(Mutex::new(Vec::new()));
        let mut ctrl = BotController::new(PlatformKind::Telegram);
        ctrl.message_id = 3;
        ctrl.user_command = "а что ты умеешь?".into();
        ctrl.run(&skill, &params()).await;
        assert_eq!(ctrl.text, "Я умею повторять.");
        assert!(ctrl.tts.is_none(), "messengers keep tts empty");

        let mut ctrl = BotController::new(PlatformKind::Telegram);
        ctrl.message_id = 4;
        ctrl.user_command = "закажи номер 42".into();
        ctrl.run(&skill, &params()).await;
        assert_eq!(ctrl.this_intent_name.as_deref(), Some("by_number"));
    }

    #[tokio::test]
    async fn falls_back_to_original_utterance() {
        let skill = Recorder(Mutex::new(Vec::new()));
        let mut ctrl = BotController::new(PlatformKind::Alisa);
        ctrl.message_id = 2;
        ctrl.user_command = "xyz".into();
        ctrl.original_user_command = "ПОМОЩЬ".into();
        ctrl.run(&skill, &params()).await;
        assert_eq!(ctrl.this_intent_name.as_deref(), Some("help"));
    }

    #[tokio::test]
    async fn unmatched_goes_to_skill() {
        let skill = Recorder(Mutex::new(Vec::new()));
        let mut ctrl = BotController::new(PlatformKind::Marusia);
        ctrl.message_id = 5;
        ctrl.user_command = "погода".into();
        ctrl.run(&skill, &params()).await;
        assert_eq!(ctrl.text, "Вы сказали: погода");
        assert_eq!(skill.0.lock().unwrap().as_slice(), &[None]);
    }
}
