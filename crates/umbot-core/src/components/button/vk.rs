//! VK keyboard (`messages.send` `keyboard`) and carousel element buttons.

use serde_json::{json, Map, Value};

use super::{rows_by_group, Button, ButtonRenderer, OPTION_COLOR, OPTION_GROUP};
use crate::text;

pub const MAX_LABEL: usize = 40;
/// Carousel elements accept at most three buttons.
pub const MAX_CAROUSEL_BUTTONS: usize = 3;

fn action(button: &Button) -> Value {
    let mut action = Map::new();
    match &button.action_type {
        Some(kind) => {
            action.insert("type".into(), json!(kind));
            for (k, v) in &button.options {
                if k != OPTION_GROUP && k != OPTION_COLOR {
                    action.insert(k.clone(), v.clone());
                }
            }
            if !button.title.is_empty() && kind == "open_app" {
                action.insert("label".into(), json!(text::resize(&button.title, MAX_LABEL, true)));
            }
        }
        None => {
            match &button.url {
                Some(url) => {
                    action.insert("type".into(), json!("open_link"));
                    action.insert("link".into(), json!(url));
                }
                None => {
                    action.insert("type".into(), json!("text"));
                }
            }
            action.insert("label".into(), json!(text::resize(&button.title, MAX_LABEL, true)));
        }
    }
    if let Some(payload) = button.payload_string() {
        action.insert("payload".into(), json!(payload));
    }
    Value::Object(action)
}

fn keyboard_button(button: &Button) -> Option<Value> {
    if button.action_type.is_none() && button.title.is_empty() {
        return None;
    }
    let mut object = json!({ "action": action(button) });
    if button.url.is_none() && button.action_type.is_none() {
        if let Some(color) = button.options.get(OPTION_COLOR) {
            object["color"] = color.clone();
        }
    }
    Some(object)
}

/// `{"one_time": true, "buttons": [[...], ...]}` or `null` when there is nothing to show.
pub struct VkKeyboard;

impl ButtonRenderer for VkKeyboard {
    fn render(&self, buttons: &[Button]) -> Value {
        let rows = rows_by_group(buttons, keyboard_button);
        if rows.is_empty() {
            return Value::Null;
        }
        json!({ "one_time": true, "buttons": rows })
    }
}

/// Flat list of up to three text/link buttons for a carousel element.
pub struct VkCarouselButtons;

impl ButtonRenderer for VkCarouselButtons {
    fn render(&self, buttons: &[Button]) -> Value {
        Value::Array(
            buttons
                .iter()
                .filter(|b| b.action_type.is_none() && !b.title.is_empty())
                .take(MAX_CAROUSEL_BUTTONS)
                .filter_map(keyboard_button)
                .collect(),
        )
    }
}
