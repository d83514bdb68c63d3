use serde_json::{json, Value};

use super::{Card, CardRenderer};

pub const MARUSIA_MAX_IMAGES: usize = 5;

/// Marusia expects numeric picture ids; keep the raw string if it is not one.
fn image_id(token: &str) -> Value {
    token
        .parse::<i64>()
        .map(|id| json!(id))
        .unwrap_or_else(|_| json!(token))
}

/// `BigImage` for one image, `ItemsList` of picture ids otherwise.
pub struct MarusiaCard;

impl CardRenderer for MarusiaCard {
    fn render(&self, card: &Card) -> Value {
        let tokens: Vec<(&super::Image, &str)> = card
            .images
            .iter()
            .filter_map(|i| i.image_token.as_deref().map(|t| (i, t)))
            .collect();
        let Some((first, token)) = tokens.first() else {
            return Value::Null;
        };

        if card.single() {
            let mut big = json!({ "type": "BigImage", "image_id": image_id(token) });
            if !first.title.is_empty() {
                big["title"] = json!(first.title);
            }
            if !first.desc.is_empty() {
                big["description"] = json!(first.desc);
            }
            return big;
        }

        let items: Vec<Value> = tokens
            .iter()
            .take(MARUSIA_MAX_IMAGES)
            .map(|(_, t)| json!({ "image_id": image_id(t) }))
            .collect();
        json!({ "type": "ItemsList", "items": items })
    }
}
