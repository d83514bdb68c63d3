use serde_json::{json, Value};

use super::{Card, CardRenderer};
use crate::components::button::VkCarouselButtons;
use crate::text;

pub const VK_MAX_CAROUSEL: usize = 10;
const MAX_TEXT: usize = 80;

/// Single image: `["photo<owner>_<id>"]` attachments. Several: a carousel template
/// (`{"type": "carousel", "elements": [...]}`). VK requires the same number of buttons on
/// every element, so all elements are cut to the smallest count (at least the title button).
pub struct VkCard;

impl CardRenderer for VkCard {
    fn render(&self, card: &Card) -> Value {
        if card.single() {
            return card
                .images
                .iter()
                .find_map(|i| i.image_token.clone())
                .map(|token| json!([token]))
                .unwrap_or(Value::Null);
        }

        let elements: Vec<(Value, Vec<Value>)> = card
            .images
            .iter()
            .filter_map(|image| {
                let token = image.image_token.as_deref()?;
                let mut buttons = match image.buttons.render(&VkCarouselButtons) {
                    Value::Array(buttons) => buttons,
                    _ => Vec::new(),
                };
                if buttons.is_empty() {
                    buttons.push(json!({
                        "action": {"type": "text", "label": text::resize(&image.title, 40, true)}
                    }));
                }
                let element = json!({
                    "title": text::resize(&image.title, MAX_TEXT, true),
                    "description": text::resize(&image.desc, MAX_TEXT, true),
                    "photo_id": token.trim_start_matches("photo"),
                    "action": {"type": "open_photo"},
                });
                Some((element, buttons))
            })
            .take(VK_MAX_CAROUSEL)
            .collect();

        let per_element = elements.iter().map(|(_, b)| b.len()).min().unwrap_or(0);
        let elements: Vec<Value> = elements
            .into_iter()
            .map(|(mut element, mut buttons)| {
                buttons.truncate(per_element);
                element["buttons"] = Value::Array(buttons);
                element
            })
            .collect();

        if elements.is_empty() {
            return Value::Null;
        }
        json!({ "type": "carousel", "elements": elements })
    }
}
