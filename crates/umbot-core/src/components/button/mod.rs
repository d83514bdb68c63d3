//! Platform-agnostic buttons and their per-platform renderers.
//!
//! A skill fills [`Buttons`]; each adapter renders the slice with the renderer for
//! its platform. Renderers never fail: empty input yields `[]` or `null`.

mod alisa;
mod smart_app;
mod telegram;
mod viber;
mod vk;

pub use alisa::{AlisaButtons, AlisaCardButton};
pub use smart_app::{SmartAppCardAction, SmartAppSuggestions};
pub use telegram::TelegramKeyboard;
pub use viber::ViberKeyboard;
pub use vk::{VkCarouselButtons, VkKeyboard};

pub(crate) use viber::viber_button;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::text;

/// Options key for VK/Telegram keyboard row grouping.
pub const OPTION_GROUP: &str = "group";
/// Options key for the VK button color (`primary`, `secondary`, `negative`, `positive`).
pub const OPTION_COLOR: &str = "color";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Button {
    pub title: String,
    pub url: Option<String>,
    pub payload: Option<Value>,
    /// `true` for a dismissible suggest button, `false` for a link under the text.
    pub hide: bool,
    /// Platform-specific action type (VK `location`, `vkpay`, `open_app`).
    pub action_type: Option<String>,
    /// Extra platform fields merged into the rendered button (Viber `Columns`, VK `color`).
    #[serde(default)]
    pub options: Map<String, Value>,
}

impl Button {
    /// Suggest button.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            hide: true,
            ..Default::default()
        }
    }

    /// Link button shown under the text.
    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(title).with_url(url).with_hide(false)
    }

    /// Invalid URLs are dropped; the button stays a plain text button.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        if text::is_url(&url) {
            self.url = Some(url);
        } else {
            tracing::debug!(target: "umbot::button", "ignoring invalid button url {url}");
        }
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_hide(mut self, hide: bool) -> Self {
        self.hide = hide;
        self
    }

    pub fn with_action_type(mut self, action_type: impl Into<String>) -> Self {
        self.action_type = Some(action_type.into());
        self
    }

    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    /// Row index for keyboards that support grouping.
    pub fn group(&self) -> Option<u64> {
        self.options.get(OPTION_GROUP).and_then(Value::as_u64)
    }

    /// Payload as a string: strings pass through, everything else is JSON-encoded.
    pub fn payload_string(&self) -> Option<String> {
        self.payload.as_ref().map(|p| match p {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    pub(crate) fn has_content(&self) -> bool {
        !self.title.is_empty() || self.url.is_some()
    }
}

/// Renders a button slice into one platform's JSON shape.
pub trait ButtonRenderer {
    fn render(&self, buttons: &[Button]) -> Value;
}

/// Buttons collected by the skill for the current response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buttons {
    buttons: Vec<Button>,
}

impl Buttons {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a suggest button.
    pub fn add_btn(
        &mut self,
        title: impl Into<String>,
        url: Option<&str>,
        payload: Option<Value>,
    ) -> &mut Self {
        let mut button = Button::new(title);
        if let Some(url) = url {
            button = button.with_url(url);
        }
        button.payload = payload;
        self.push(button)
    }

    /// Add a link button.
    pub fn add_link(
        &mut self,
        title: impl Into<String>,
        url: Option<&str>,
        payload: Option<Value>,
    ) -> &mut Self {
        let mut button = Button::new(title).with_hide(false);
        if let Some(url) = url {
            button = button.with_url(url);
        }
        button.payload = payload;
        self.push(button)
    }

    pub fn push(&mut self, button: Button) -> &mut Self {
        self.buttons.push(button);
        self
    }

    pub fn clear(&mut self) {
        self.buttons.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.buttons.is_empty()
    }

    pub fn len(&self) -> usize {
        self.buttons.len()
    }

    pub fn as_slice(&self) -> &[Button] {
        &self.buttons
    }

    pub fn render<R: ButtonRenderer + ?Sized>(&self, renderer: &R) -> Value {
        renderer.render(&self.buttons)
    }
}

/// Group buttons into keyboard rows: grouped buttons share the row of their group,
/// the rest get a row each. Row order follows first appearance.
pub(crate) fn rows_by_group<F>(buttons: &[Button], mut render: F) -> Vec<Vec<Value>>
where
    F: FnMut(&Button) -> Option<Value>,
{
    let mut rows: Vec<(Option<u64>, Vec<Value>)> = Vec::new();
    for button in buttons {
        let Some(rendered) = render(button) else {
            continue;
        };
        match button.group() {
            Some(group) => match rows.iter_mut().find(|(g, _)| *g == Some(group)) {
                Some((_, row)) => row.push(rendered),
                None => rows.push((Some(group), vec![rendered])),
            },
            None => rows.push((None, vec![rendered])),
        }
    }
    rows.into_iter().map(|(_, row)| row).collect()
}
