//! Viber keyboard.

use serde_json::{json, Value};

use super::{Button, ButtonRenderer, OPTION_GROUP};

pub const DEFAULT_BG_COLOR: &str = "#FFFFFF";

/// Single Viber button; `options` are merged verbatim (`Columns`, `Rows`, `BgColor`, ...).
pub(crate) fn viber_button(button: &Button) -> Value {
    let mut object = match &button.url {
        Some(url) => json!({
            "Text": button.title,
            "ActionType": "open-url",
            "ActionBody": url,
        }),
        None => json!({
            "Text": button.title,
            "ActionType": "reply",
            "ActionBody": button.payload_string().unwrap_or_else(|| button.title.clone()),
        }),
    };
    for (k, v) in &button.options {
        if k != OPTION_GROUP {
            object[k.as_str()] = v.clone();
        }
    }
    object
}

/// `{"Type": "keyboard", ...}` or `null` without buttons.
pub struct ViberKeyboard;

impl ButtonRenderer for ViberKeyboard {
    fn render(&self, buttons: &[Button]) -> Value {
        let rendered: Vec<Value> = buttons
            .iter()
            .filter(|b| !b.title.is_empty())
            .map(viber_button)
            .collect();
        if rendered.is_empty() {
            return Value::Null;
        }
        json!({
            "Type": "keyboard",
            "DefaultHeight": true,
            "BgColor": DEFAULT_BG_COLOR,
            "Buttons": rendered,
        })
    }
}
