use super::{replace_markers, RenderedSound, Sound, SoundRenderer};

const STANDARD_SOUNDS: &[(&str, &[&str])] = &[
    ("#game_win#", &["game-win-1", "game-win-2", "game-win-3"]),
    ("#game_loss#", &["game-loss-1", "game-loss-2", "game-loss-3"]),
    ("#game_boot#", &["game-boot-1"]),
    ("#game_coin#", &["game-8-bit-coin-1", "game-8-bit-coin-2"]),
    ("#game_ping#", &["game-ping-1"]),
    ("#game_powerup#", &["game-powerup-1", "game-powerup-2"]),
    ("#nature_wind#", &["nature-wind-1", "nature-wind-2"]),
    ("#nature_thunder#", &["nature-thunder-1", "nature-thunder-2"]),
    ("#nature_rain#", &["nature-rain-1", "nature-rain-2"]),
    ("#nature_sea#", &["nature-sea-1", "nature-sea-2"]),
    ("#thing_bell#", &["things-bell-1", "things-bell-2"]),
    ("#thing_door#", &["things-door-1", "things-door-2"]),
    ("#animals_cat#", &["animals-cat-1", "animals-cat-2"]),
    ("#animals_dog#", &["animals-dog-1", "animals-dog-2"]),
    ("#human_cheer#", &["human-cheer-1", "human-cheer-2"]),
    ("#human_laugh#", &["human-laugh-1", "human-laugh-2"]),
    ("#music_drums#", &["music-drums-1", "music-drums-2"]),
];

fn speaker(sound: &str) -> String {
    if sound.contains('/') {
        format!("<speaker audio={sound}>")
    } else {
        format!("<speaker audio=marusia-sounds/{sound}>")
    }
}

/// `<speaker audio=marusia-sounds/...>` for built-ins; uploaded audio ids go through
/// `audio_vk_id` in the response and are left to the adapter.
pub struct MarusiaSound;

impl SoundRenderer for MarusiaSound {
    fn render(&self, sounds: &[Sound], use_standard: bool, tts: &str) -> RenderedSound {
        RenderedSound::Speech(replace_markers(tts, sounds, STANDARD_SOUNDS, use_standard, speaker))
    }
}
