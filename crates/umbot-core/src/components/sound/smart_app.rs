use super::{replace_markers, RenderedSound, Sound, SoundRenderer};

const STANDARD_SOUNDS: &[(&str, &[&str])] = &[
    ("#game_win#", &["sm-sounds-game-win-1", "sm-sounds-game-win-2", "sm-sounds-game-win-3"]),
    ("#game_loss#", &["sm-sounds-game-loss-1", "sm-sounds-game-loss-2", "sm-sounds-game-loss-3"]),
    ("#game_boot#", &["sm-sounds-game-boot-1"]),
    ("#game_coin#", &["sm-sounds-game-8-bit-coin-1", "sm-sounds-game-8-bit-coin-2"]),
    ("#game_ping#", &["sm-sounds-game-ping-1"]),
    ("#nature_wind#", &["sm-sounds-nature-wind-1", "sm-sounds-nature-wind-2"]),
    ("#nature_rain#", &["sm-sounds-nature-rain-1", "sm-sounds-nature-rain-2"]),
    ("#thing_bell#", &["sm-sounds-things-bell-1", "sm-sounds-things-bell-2"]),
    ("#animals_cat#", &["sm-sounds-animals-cat-1", "sm-sounds-animals-cat-2"]),
    ("#animals_dog#", &["sm-sounds-animals-dog-1", "sm-sounds-animals-dog-2"]),
    ("#human_cheer#", &["sm-sounds-human-cheer-1", "sm-sounds-human-cheer-2"]),
    ("#human_laugh#", &["sm-sounds-human-laugh-1", "sm-sounds-human-laugh-2"]),
    ("#music_drums#", &["sm-sounds-music-drums-1", "sm-sounds-music-drums-2"]),
];

fn audio(sound: &str) -> String {
    format!("<audio text=\"{sound}\"/>")
}

/// SSML `<audio text="..."/>`; the adapter switches `pronounceTextType` to
/// `application/ssml` when the rendered text contains markup.
pub struct SmartAppSound;

impl SoundRenderer for SmartAppSound {
    fn render(&self, sounds: &[Sound], use_standard: bool, tts: &str) -> RenderedSound {
        RenderedSound::Speech(replace_markers(tts, sounds, STANDARD_SOUNDS, use_standard, audio))
    }
}
