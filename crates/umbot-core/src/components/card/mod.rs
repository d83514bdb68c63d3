//! Cards: images with title, description and buttons, rendered per platform.
//!
//! Renderers work on an already resolved card: images that need a platform token
//! get it from [`crate::media::MediaResolver`] before rendering. An image without a
//! usable token or URL is skipped, never an error.

mod alisa;
mod marusia;
mod smart_app;
mod telegram;
mod viber;
mod vk;

pub use alisa::{AlisaCard, ALISA_MAX_GALLERY_IMAGES, ALISA_MAX_IMAGES};
pub use marusia::{MarusiaCard, MARUSIA_MAX_IMAGES};
pub use smart_app::SmartAppCard;
pub use telegram::{
    TelegramCard, TELEGRAM_MAX_POLL_OPTION, TELEGRAM_MAX_POLL_OPTIONS, TELEGRAM_MAX_POLL_QUESTION,
};
pub use viber::{ViberCard, VIBER_MAX_IMAGES};
pub use vk::{VkCard, VK_MAX_CAROUSEL};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use super::button::{Button, Buttons};
use crate::text;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub title: String,
    pub desc: String,
    /// Platform-issued identifier (Alisa image id, VK `photo…`, Telegram `file_id`).
    pub image_token: Option<String>,
    /// Local path or URL the token is produced from.
    pub image_dir: Option<String>,
    pub buttons: Buttons,
}

impl Image {
    /// `image` is a URL or an existing file (kept as `image_dir`) or a ready token.
    pub fn new(image: &str, title: impl Into<String>, desc: impl Into<String>) -> Self {
        let mut out = Self {
            title: title.into(),
            desc: desc.into(),
            ..Default::default()
        };
        if image.is_empty() {
            return out;
        }
        if text::is_url(image) || Path::new(image).is_file() {
            out.image_dir = Some(image.to_string());
        } else {
            out.image_token = Some(image.to_string());
        }
        out
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.buttons.push(button);
        self
    }

    /// Token if resolved, otherwise the source when it is a public URL.
    pub fn url_or_token(&self) -> Option<&str> {
        self.image_token.as_deref().or_else(|| {
            self.image_dir
                .as_deref()
                .filter(|dir| text::is_url(dir))
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub images: Vec<Image>,
    /// Card header (ItemsList header, poll question, carousel title).
    pub title: String,
    pub desc: String,
    /// Card-level buttons (footer).
    pub buttons: Buttons,
    /// Render only the first image.
    pub is_one: bool,
    /// Alisa: render as `ImageGallery` instead of `ItemsList`.
    pub is_used_gallery: bool,
}

impl Card {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        image: &str,
        title: impl Into<String>,
        desc: impl Into<String>,
        button: Option<Button>,
    ) -> &mut Self {
        let mut img = Image::new(image, title, desc);
        if let Some(button) = button {
            img.buttons.push(button);
        }
        self.images.push(img);
        self
    }

    pub fn clear(&mut self) {
        self.images.clear();
        self.title.clear();
        self.desc.clear();
        self.buttons.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn render<R: CardRenderer + ?Sized>(&self, renderer: &R) -> Value {
        renderer.render(self)
    }

    /// Whether a single-image view is requested or implied.
    pub(crate) fn single(&self) -> bool {
        self.is_one || self.images.len() == 1
    }
}

/// Renders a resolved card into one platform's JSON shape; `null` when nothing is showable.
pub trait CardRenderer {
    fn render(&self, card: &Card) -> Value;
}
