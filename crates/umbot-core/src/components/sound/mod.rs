//! Sounds: `#key#` markers inside TTS replaced with platform sound references.
//!
//! Voice platforms get the marker swapped for their speaker/audio markup. Messengers
//! have no speech channel, so their renderer returns the audio sources to send as files.

mod alisa;
mod marusia;
mod messenger;
mod smart_app;

pub use alisa::AlisaSound;
pub use marusia::MarusiaSound;
pub use messenger::MessengerSound;
pub use smart_app::SmartAppSound;

use serde::{Deserialize, Serialize};

use crate::text;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sound {
    /// Marker as it appears in the TTS text, e.g. `#cat#`.
    pub key: String,
    /// Variants; one is picked at random per response.
    pub sounds: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sounds {
    pub sounds: Vec<Sound>,
    /// Also replace the platform's built-in markers (`#game_win#`, `#human_laugh#`, ...).
    pub is_used_standard_sound: bool,
}

impl Sounds {
    pub fn new() -> Self {
        Self {
            sounds: Vec::new(),
            is_used_standard_sound: true,
        }
    }

    pub fn add<S: Into<String>>(&mut self, key: impl Into<String>, sounds: Vec<S>) -> &mut Self {
        self.sounds.push(Sound {
            key: key.into(),
            sounds: sounds.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn clear(&mut self) {
        self.sounds.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    pub fn render<R: SoundRenderer + ?Sized>(&self, renderer: &R, tts: &str) -> RenderedSound {
        renderer.render(&self.sounds, self.is_used_standard_sound, tts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderedSound {
    /// TTS with markers replaced.
    Speech(String),
    /// Audio sources (URL, path or platform token) to deliver as files.
    Files(Vec<String>),
}

pub trait SoundRenderer {
    fn render(&self, sounds: &[Sound], use_standard: bool, tts: &str) -> RenderedSound;
}

/// Replace custom markers first, then built-in ones. `wrap` turns a picked sound into
/// markup; values that already look like markup are inserted as is.
pub(crate) fn replace_markers(
    tts: &str,
    sounds: &[Sound],
    standard: &[(&str, &[&str])],
    use_standard: bool,
    wrap: impl Fn(&str) -> String,
) -> String {
    let mut out = tts.to_string();
    for sound in sounds {
        if sound.key.is_empty() || sound.sounds.is_empty() {
            continue;
        }
        while out.contains(&sound.key) {
            let picked = text::get_text(&sound.sounds);
            let markup = if picked.starts_with('<') { picked } else { wrap(&picked) };
            out = out.replacen(&sound.key, &markup, 1);
        }
    }
    if use_standard {
        for (key, variants) in standard {
            while out.contains(*key) {
                let markup = wrap(&text::get_text(*variants));
                out = out.replacen(*key, &markup, 1);
            }
        }
    }
    out
}
