use serde_json::{json, Value};

use super::{Card, CardRenderer, Image};
use crate::components::button::viber_button;

pub const VIBER_MAX_IMAGES: usize = 7;
/// Viber allows at most 7 rows per rich-media group.
const MAX_GROUP_ROWS: usize = 7;
const GROUP_COLUMNS: u64 = 6;

fn cells(image: &Image, url: &str) -> Vec<Value> {
    let mut out = vec![json!({
        "Columns": GROUP_COLUMNS,
        "Rows": 1,
        "ActionType": "none",
        "Image": url,
    })];
    if !image.title.is_empty() || !image.desc.is_empty() {
        out.push(json!({
            "Columns": GROUP_COLUMNS,
            "Rows": 1,
            "ActionType": "none",
            "Text": format!(
                "<font color=#323232><b>{}</b></font><br><font color=#777777>{}</font>",
                image.title, image.desc
            ),
            "TextSize": "medium",
            "TextVAlign": "middle",
            "TextHAlign": "left",
        }));
    }
    for button in image.buttons.as_slice().iter().filter(|b| !b.title.is_empty()) {
        if out.len() >= MAX_GROUP_ROWS {
            break;
        }
        let mut cell = viber_button(button);
        cell["Columns"] = json!(GROUP_COLUMNS);
        cell["Rows"] = json!(1);
        out.push(cell);
    }
    out
}

/// Rich media: one group per image (≤ 7), `ButtonsGroupRows` equal to the number of
/// cells per group. Groups with fewer cells stretch their image cell so every group
/// has the same height.
pub struct ViberCard;

impl CardRenderer for ViberCard {
    fn render(&self, card: &Card) -> Value {
        let limit = if card.is_one { 1 } else { VIBER_MAX_IMAGES };
        let mut groups: Vec<Vec<Value>> = card
            .images
            .iter()
            .filter_map(|i| i.url_or_token().map(|url| cells(i, url)))
            .take(limit)
            .collect();

        let rows = groups.iter().map(Vec::len).max().unwrap_or(0);
        if rows == 0 {
            return Value::Null;
        }
        for group in &mut groups {
            let missing = rows - group.len();
            group[0]["Rows"] = json!(1 + missing);
        }

        json!({
            "Type": "rich_media",
            "ButtonsGroupColumns": GROUP_COLUMNS,
            "ButtonsGroupRows": rows,
            "BgColor": "#FFFFFF",
            "Buttons": groups.into_iter().flatten().collect::<Vec<_>>(),
        })
    }
}
