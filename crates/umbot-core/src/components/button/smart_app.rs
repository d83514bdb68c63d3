//! SmartApp suggestions and card cell actions.

use serde_json::{json, Value};

use super::{Button, ButtonRenderer};

fn smart_app_action(button: &Button) -> Value {
    match (&button.url, &button.payload) {
        (Some(url), _) => json!({ "deep_link": url, "type": "deep_link" }),
        (None, Some(payload)) => json!({ "server_action": payload, "type": "server_action" }),
        (None, None) => json!({ "text": button.title, "type": "text" }),
    }
}

/// `payload.suggestions`: `{"buttons": [{"title", "action"}]}` or `null`.
pub struct SmartAppSuggestions;

impl ButtonRenderer for SmartAppSuggestions {
    fn render(&self, buttons: &[Button]) -> Value {
        let rendered: Vec<Value> = buttons
            .iter()
            .filter(|b| !b.title.is_empty())
            .map(|b| json!({ "title": b.title, "action": smart_app_action(b) }))
            .collect();
        if rendered.is_empty() {
            return Value::Null;
        }
        json!({ "buttons": rendered })
    }
}

/// Actions for a card cell: the first meaningful button, or `null`.
pub struct SmartAppCardAction;

impl ButtonRenderer for SmartAppCardAction {
    fn render(&self, buttons: &[Button]) -> Value {
        buttons
            .iter()
            .find(|b| b.has_content())
            .map(|b| json!([smart_app_action(b)]))
            .unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggestion_action_kinds() {
        let buttons = vec![
            Button::new("Текст"),
            Button::link("Сайт", "https://sber.ru"),
            Button::new("Действие").with_payload(json!({"step": 2})),
        ];
        let s = SmartAppSuggestions.render(&buttons);
        let arr = s["buttons"].as_array().unwrap();
        assert_eq!(arr[0]["action"], json!({"text": "Текст", "type": "text"}));
        assert_eq!(arr[1]["action"]["type"], json!("deep_link"));
        assert_eq!(arr[2]["action"]["server_action"], json!({"step": 2}));
    }

    #[test]
    fn card_action_is_single() {
        let buttons = vec![Button::new("Один"), Button::new("Два")];
        assert_eq!(SmartAppCardAction.render(&buttons).as_array().unwrap().len(), 1);
        assert_eq!(SmartAppCardAction.render(&[]), Value::Null);
        assert_eq!(SmartAppSuggestions.render(&[]), Value::Null);
    }
}
