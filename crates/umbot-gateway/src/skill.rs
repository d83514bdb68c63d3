use async_trait::async_trait;
use umbot_core::components::Button;
use umbot_core::config::{HELP_INTENT_NAME, WELCOME_INTENT_NAME};
use umbot_core::{BotController, Skill};

/// Repeats the user's phrase. "картинка" shows a card, "пока" ends the session.
pub struct EchoSkill;

#[async_trait]
impl Skill for EchoSkill {
    async fn action(&self, ctrl: &mut BotController, intent: Option<&str>) {
        match intent {
            // welcome and help texts are filled in before the skill runs
            Some(WELCOME_INTENT_NAME) | Some(HELP_INTENT_NAME) => {
                ctrl.buttons.push(Button::new("Помощь"));
                return;
            }
            Some(name) => {
                ctrl.text = format!("Команда «{name}» принята");
                ctrl.buttons.push(Button::new("Помощь"));
                return;
            }
            None => {}
        }

        let command = ctrl.user_command.as_str();
        if command.contains("пока") {
            ctrl.text = "До встречи!".into();
            ctrl.is_end = true;
            return;
        }
        if command.contains("картинка") {
            ctrl.text = "Вот картинка".into();
            ctrl.card.title = "Картинки".into();
            ctrl.card.add(
                "https://picsum.photos/400/200",
                "Случайная картинка",
                "Каждый раз новая",
                Some(Button::new("Ещё")),
            );
            return;
        }

        let said = if ctrl.original_user_command.is_empty() {
            &ctrl.user_command
        } else {
            &ctrl.original_user_command
        };
        ctrl.text = format!("Вы сказали: {said}");
        ctrl.buttons.push(Button::new("Картинка"));
        ctrl.buttons.push(Button::new("Пока"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbot_core::{IntentConfig, PlatformKind, PlatformParams};

    #[tokio::test]
    async fn echoes_and_ends() {
        let params = PlatformParams::default();
        let mut ctrl = BotController::new(PlatformKind::Telegram);
        ctrl.message_id = 2;
        ctrl.user_command = "как дела".into();
        ctrl.run(&EchoSkill, &params).await;
        assert_eq!(ctrl.text, "Вы сказали: как дела");
        assert_eq!(ctrl.buttons.len(), 2);
        assert!(ctrl.tts.is_none());

        let mut bye = BotController::new(PlatformKind::Alisa);
        bye.message_id = 3;
        bye.user_command = "ну пока".into();
        bye.run(&EchoSkill, &params).await;
        assert!(bye.is_end);
        assert_eq!(bye.tts.as_deref(), Some("До встречи!"));
    }

    #[tokio::test]
    async fn configured_intent_gets_a_reply() {
        let mut params = PlatformParams::default();
        params.intents.push(IntentConfig {
            name: "order".into(),
            slots: vec![r"\bзаказ\w*".into()],
            is_pattern: true,
        });
        let mut ctrl = BotController::new(PlatformKind::Alisa);
        ctrl.message_id = 4;
        ctrl.user_command = "где мой заказ".into();
        ctrl.run(&EchoSkill, &params).await;
        assert_eq!(ctrl.this_intent_name.as_deref(), Some("order"));
        assert_eq!(ctrl.text, "Команда «order» принята");
    }
}
