use serde_json::{json, Value};

use super::{Card, CardRenderer, Image};
use crate::components::button::SmartAppCardAction;

const MAX_CELLS: usize = 10;

fn paddings() -> Value {
    json!({ "top": "9x", "bottom": "12x", "left": "8x", "right": "8x" })
}

fn text_cell(text: &str, typeface: &str, color: &str) -> Value {
    json!({
        "type": "text_cell_view",
        "content": { "text": text, "typeface": typeface, "text_color": color },
        "paddings": { "top": "6x" },
    })
}

fn list_cell(image: &Image, url: &str) -> Value {
    let mut cell = json!({
        "type": "left_right_cell_view",
        "paddings": { "left": "4x", "top": "4x", "right": "4x", "bottom": "4x" },
        "left": {
            "type": "fast_answer_left_view",
            "icon_vertical_gravity": "center",
            "icon_and_value": {
                "icon": {
                    "address": { "type": "url", "url": url },
                    "size": { "width": "large", "height": "large" },
                    "margins": { "right": "6x" },
                },
                "value": {
                    "text": image.title,
                    "typeface": "body1",
                    "text_color": "default",
                    "max_lines": 2,
                },
            },
        },
    });
    let actions = image.buttons.render(&SmartAppCardAction);
    if !actions.is_null() {
        cell["actions"] = actions;
    }
    cell
}

/// `list_card`: a big image with title and description for a single image, otherwise
/// a header cell followed by one icon row per image.
pub struct SmartAppCard;

impl CardRenderer for SmartAppCard {
    fn render(&self, card: &Card) -> Value {
        let mut cells = Vec::new();

        if card.single() {
            let Some((image, url)) = card
                .images
                .iter()
                .find_map(|i| i.url_or_token().map(|u| (i, u)))
            else {
                return Value::Null;
            };
            cells.push(json!({
                "type": "image_cell_view",
                "content": { "url": url, "placeholder_color": "solid_black" },
            }));
            if !image.title.is_empty() {
                cells.push(text_cell(&image.title, "title1", "default"));
            }
            if !image.desc.is_empty() {
                cells.push(text_cell(&image.desc, "body1", "secondary"));
            }
            let actions = image.buttons.render(&SmartAppCardAction);
            let mut card = json!({ "type": "list_card", "paddings": paddings(), "cells": cells });
            if !actions.is_null() {
                card["actions"] = actions;
            }
            return card;
        }

        if !card.title.is_empty() {
            cells.push(text_cell(&card.title, "headline3", "default"));
        }
        cells.extend(
            card.images
                .iter()
                .filter_map(|i| i.url_or_token().map(|u| list_cell(i, u)))
                .take(MAX_CELLS),
        );
        if cells.is_empty() {
            return Value::Null;
        }
        json!({ "type": "list_card", "paddings": paddings(), "cells": cells })
    }
}
