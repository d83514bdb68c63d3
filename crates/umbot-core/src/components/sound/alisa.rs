use super::{replace_markers, RenderedSound, Sound, SoundRenderer};

/// Built-in sounds of the Alisa sound library.
pub(crate) const STANDARD_SOUNDS: &[(&str, &[&str])] = &[
    (
        "#game_win#",
        &["alice-sounds-game-win-1", "alice-sounds-game-win-2", "alice-sounds-game-win-3"],
    ),
    (
        "#game_loss#",
        &["alice-sounds-game-loss-1", "alice-sounds-game-loss-2", "alice-sounds-game-loss-3"],
    ),
    ("#game_boot#", &["alice-sounds-game-boot-1"]),
    ("#game_coin#", &["alice-sounds-game-8-bit-coin-1", "alice-sounds-game-8-bit-coin-2"]),
    ("#game_ping#", &["alice-sounds-game-ping-1"]),
    ("#game_fly#", &["alice-sounds-game-8-bit-flyby-1"]),
    ("#game_gun#", &["alice-sounds-game-8-bit-machine-gun-1"]),
    ("#game_phone#", &["alice-sounds-game-8-bit-phone-1"]),
    ("#game_powerup#", &["alice-sounds-game-powerup-1", "alice-sounds-game-powerup-2"]),
    ("#nature_wind#", &["alice-sounds-nature-wind-1", "alice-sounds-nature-wind-2"]),
    ("#nature_thunder#", &["alice-sounds-nature-thunder-1", "alice-sounds-nature-thunder-2"]),
    ("#nature_jungle#", &["alice-sounds-nature-jungle-1", "alice-sounds-nature-jungle-2"]),
    ("#nature_rain#", &["alice-sounds-nature-rain-1", "alice-sounds-nature-rain-2"]),
    ("#nature_forest#", &["alice-sounds-nature-forest-1", "alice-sounds-nature-forest-2"]),
    ("#nature_sea#", &["alice-sounds-nature-sea-1", "alice-sounds-nature-sea-2"]),
    ("#nature_fire#", &["alice-sounds-nature-fire-1", "alice-sounds-nature-fire-2"]),
    ("#nature_stream#", &["alice-sounds-nature-stream-1", "alice-sounds-nature-stream-2"]),
    ("#thing_chainsaw#", &["alice-sounds-things-chainsaw-1"]),
    ("#thing_explosion#", &["alice-sounds-things-explosion-1"]),
    ("#thing_water#", &["alice-sounds-things-water-1", "alice-sounds-things-water-2"]),
    ("#thing_bell#", &["alice-sounds-things-bell-1", "alice-sounds-things-bell-2"]),
    ("#thing_door#", &["alice-sounds-things-door-1", "alice-sounds-things-door-2"]),
    ("#thing_glass#", &["alice-sounds-things-glass-1", "alice-sounds-things-glass-2"]),
    ("#thing_phone#", &["alice-sounds-things-phone-1", "alice-sounds-things-phone-2"]),
    ("#animals_cat#", &["alice-sounds-animals-cat-1", "alice-sounds-animals-cat-2"]),
    ("#animals_dog#", &["alice-sounds-animals-dog-1", "alice-sounds-animals-dog-2"]),
    ("#animals_cow#", &["alice-sounds-animals-cow-1", "alice-sounds-animals-cow-2"]),
    ("#animals_rooster#", &["alice-sounds-animals-rooster-1"]),
    ("#human_cheer#", &["alice-sounds-human-cheer-1", "alice-sounds-human-cheer-2"]),
    ("#human_laugh#", &["alice-sounds-human-laugh-1", "alice-sounds-human-laugh-2"]),
    ("#human_crowd#", &["alice-sounds-human-crowd-1", "alice-sounds-human-crowd-2"]),
    ("#music_harp#", &["alice-music-harp-1"]),
    ("#music_drums#", &["alice-music-drums-1", "alice-music-drums-2"]),
    ("#music_gong#", &["alice-music-gong-1", "alice-music-gong-2"]),
];

/// `<speaker audio="...">` markup; `sound` is a library id or an uploaded sound id
/// from the skill's storage (`dialogs-upload/<skill>/<id>.opus`).
pub fn speaker(sound: &str) -> String {
    if sound.ends_with(".opus") {
        format!("<speaker audio=\"{sound}\">")
    } else {
        format!("<speaker audio=\"{sound}.opus\">")
    }
}

pub struct AlisaSound;

impl SoundRenderer for AlisaSound {
    fn render(&self, sounds: &[Sound], use_standard: bool, tts: &str) -> RenderedSound {
        RenderedSound::Speech(replace_markers(tts, sounds, STANDARD_SOUNDS, use_standard, speaker))
    }
}
