use super::{RenderedSound, Sound, SoundRenderer};
use crate::text;

/// VK, Telegram and Viber: every custom marker present in the TTS yields one audio
/// source. Built-in sounds belong to voice platforms and are ignored here.
pub struct MessengerSound;

impl SoundRenderer for MessengerSound {
    fn render(&self, sounds: &[Sound], _use_standard: bool, tts: &str) -> RenderedSound {
        let files = sounds
            .iter()
            .filter(|s| !s.key.is_empty() && !s.sounds.is_empty() && tts.contains(&s.key))
            .map(|s| text::get_text(&s.sounds))
            .filter(|src| !src.starts_with('<'))
            .collect();
        RenderedSound::Files(files)
    }
}
