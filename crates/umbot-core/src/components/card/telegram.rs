use serde_json::{json, Value};

use super::{Card, CardRenderer};
use crate::text;

pub const TELEGRAM_MAX_POLL_OPTIONS: usize = 10;
pub const TELEGRAM_MAX_POLL_QUESTION: usize = 300;
pub const TELEGRAM_MAX_POLL_OPTION: usize = 100;

/// Single image: `{"photo", "caption"}` for `sendPhoto` (`photo` is a `file_id`, a URL
/// or a local path uploaded as multipart). Several images: `{"question", "options"}` for
/// `sendPoll`, built from image titles. The question may come back empty when the card
/// has neither title nor description; the adapter fills it in.
pub struct TelegramCard;

impl CardRenderer for TelegramCard {
    fn render(&self, card: &Card) -> Value {
        let options: Vec<String> = card
            .images
            .iter()
            .filter(|i| !i.title.is_empty())
            .take(TELEGRAM_MAX_POLL_OPTIONS)
            .map(|i| text::resize(&i.title, TELEGRAM_MAX_POLL_OPTION, true))
            .collect();

        if !card.single() && options.len() >= 2 {
            let question = if card.title.is_empty() {
                card.desc.as_str()
            } else {
                card.title.as_str()
            };
            return json!({
                "question": text::resize(question, TELEGRAM_MAX_POLL_QUESTION, true),
                "options": options,
            });
        }

        card.images
            .iter()
            .find_map(|image| {
                let photo = image.image_token.as_deref().or(image.image_dir.as_deref())?;
                let caption = if image.desc.is_empty() {
                    image.title.as_str()
                } else {
                    image.desc.as_str()
                };
                Some(json!({ "photo": photo, "caption": caption }))
            })
            .unwrap_or(Value::Null)
    }
}
