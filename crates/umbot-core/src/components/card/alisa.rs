use serde_json::{json, Value};

use super::{Card, CardRenderer, Image};
use crate::components::button::AlisaCardButton;
use crate::text;

pub const ALISA_MAX_IMAGES: usize = 5;
pub const ALISA_MAX_GALLERY_IMAGES: usize = 7;

const MAX_TITLE: usize = 128;
const MAX_DESC: usize = 256;
const MAX_HEADER: usize = 64;

fn item(image: &Image, token: &str, with_desc: bool) -> Value {
    let mut object = json!({
        "image_id": token,
        "title": text::resize(&image.title, MAX_TITLE, true),
    });
    if with_desc {
        object["description"] = json!(text::resize(&image.desc, MAX_DESC, true));
    }
    let button = image.buttons.render(&AlisaCardButton);
    if !button.is_null() {
        object["button"] = button;
    }
    object
}

/// `BigImage` for a single image, otherwise `ImageGallery` (≤ 7) or `ItemsList` (≤ 5).
pub struct AlisaCard;

impl CardRenderer for AlisaCard {
    fn render(&self, card: &Card) -> Value {
        if card.images.is_empty() {
            return Value::Null;
        }

        if card.single() {
            let Some((image, token)) = card
                .images
                .iter()
                .find_map(|i| i.image_token.as_deref().map(|t| (i, t)))
            else {
                return Value::Null;
            };
            let mut big = item(image, token, true);
            big["type"] = json!("BigImage");
            return big;
        }

        if card.is_used_gallery {
            let items: Vec<Value> = card
                .images
                .iter()
                .filter_map(|i| i.image_token.as_deref().map(|t| item(i, t, false)))
                .take(ALISA_MAX_GALLERY_IMAGES)
                .collect();
            if items.is_empty() {
                return Value::Null;
            }
            return json!({ "type": "ImageGallery", "items": items });
        }

        let items: Vec<Value> = card
            .images
            .iter()
            .take(ALISA_MAX_IMAGES)
            .map(|i| match i.image_token.as_deref() {
                Some(token) => item(i, token, true),
                None => {
                    let mut object = item(i, "", true);
                    if let Some(map) = object.as_object_mut() {
                        map.remove("image_id");
                    }
                    object
                }
            })
            .collect();

        let mut list = json!({ "type": "ItemsList", "items": items });
        if !card.title.is_empty() {
            list["header"] = json!({ "text": text::resize(&card.title, MAX_HEADER, true) });
        }
        if let Some(first) = card.buttons.as_slice().first() {
            let button = card.buttons.render(&AlisaCardButton);
            let mut footer = json!({ "text": text::resize(&first.title, MAX_HEADER, true) });
            if !button.is_null() {
                footer["button"] = button;
            }
            list["footer"] = footer;
        }
        list
    }
}
