pub mod button;
pub mod card;
pub mod nlu;
pub mod sound;

pub use button::{Button, ButtonRenderer, Buttons};
pub use card::{Card, CardRenderer, Image};
pub use nlu::Nlu;
pub use sound::{RenderedSound, Sound, SoundRenderer, Sounds};
