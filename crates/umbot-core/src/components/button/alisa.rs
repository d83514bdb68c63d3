//! Alisa / Marusia buttons: `response.buttons` list and the single card button.

use serde_json::{json, Value};

use super::{Button, ButtonRenderer};
use crate::text;

pub const MAX_TITLE: usize = 64;
pub const MAX_URL: usize = 1024;

/// `response.buttons`: every button with a non-empty title.
pub struct AlisaButtons;

impl ButtonRenderer for AlisaButtons {
    fn render(&self, buttons: &[Button]) -> Value {
        Value::Array(
            buttons
                .iter()
                .filter_map(|button| {
                    let title = text::resize(&button.title, MAX_TITLE, true);
                    if title.is_empty() {
                        return None;
                    }
                    let mut object = json!({ "title": title, "hide": button.hide });
                    if let Some(payload) = &button.payload {
                        object["payload"] = payload.clone();
                    }
                    if let Some(url) = &button.url {
                        object["url"] = json!(text::resize(url, MAX_URL, false));
                    }
                    Some(object)
                })
                .collect(),
        )
    }
}

/// Card `button`: the first button with a title or url, `null` otherwise.
pub struct AlisaCardButton;

impl ButtonRenderer for AlisaCardButton {
    fn render(&self, buttons: &[Button]) -> Value {
        let Some(button) = buttons.iter().find(|b| b.has_content()) else {
            return Value::Null;
        };
        let mut object = json!({ "text": text::resize(&button.title, MAX_TITLE, true) });
        if let Some(url) = &button.url {
            object["url"] = json!(text::resize(url, MAX_URL, false));
        }
        if let Some(payload) = &button.payload {
            object["payload"] = payload.clone();
        }
        object
    }
}
