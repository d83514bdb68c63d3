//! Telegram `reply_markup`: inline keyboard for links, reply keyboard for suggests.

use serde_json::{json, Value};

use super::{rows_by_group, Button, ButtonRenderer};

/// Bot API limit for `callback_data`, in bytes.
pub const MAX_CALLBACK_DATA: usize = 64;

fn truncate_bytes(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_string()
}

/// Link buttons (`hide == false`) become an inline keyboard; when there are none,
/// suggest buttons become a one-time reply keyboard; with no buttons at all the
/// keyboard is removed. Telegram accepts a single markup kind per message.
pub struct TelegramKeyboard;

impl ButtonRenderer for TelegramKeyboard {
    fn render(&self, buttons: &[Button]) -> Value {
        let (inline, reply): (Vec<Button>, Vec<Button>) = buttons
            .iter()
            .filter(|b| !b.title.is_empty())
            .cloned()
            .partition(|b| !b.hide);

        if !inline.is_empty() {
            let rows = rows_by_group(&inline, |button| {
                let mut object = json!({ "text": button.title });
                match (&button.url, button.payload_string()) {
                    (Some(url), _) => object["url"] = json!(url),
                    (None, Some(payload)) => {
                        object["callback_data"] = json!(truncate_bytes(&payload, MAX_CALLBACK_DATA))
                    }
                    (None, None) => {
                        object["callback_data"] =
                            json!(truncate_bytes(&button.title, MAX_CALLBACK_DATA))
                    }
                }
                Some(object)
            });
            return json!({ "inline_keyboard": rows });
        }

        if !reply.is_empty() {
            let rows = rows_by_group(&reply, |button| Some(json!({ "text": button.title })));
            return json!({
                "keyboard": rows,
                "resize_keyboard": true,
                "one_time_keyboard": true,
            });
        }

        json!({ "remove_keyboard": true })
    }
}
