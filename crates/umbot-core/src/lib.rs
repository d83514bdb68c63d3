//! umbot: one skill model for Yandex Alisa, Marusia, Sber SmartApp, VK, Telegram and Viber.
//!
//! A [`Skill`] fills a [`BotController`] (text, TTS, buttons, cards, sounds); platform
//! adapters translate webhooks into the controller and the controller back into each
//! platform's response format. [`Bot`] runs the whole cycle for one request.

pub mod api;
pub mod bot;
pub mod components;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod media;
pub mod models;
pub mod platforms;
pub mod text;

pub use bot::Bot;
pub use config::{AppConfig, IntentConfig, PlatformParams, StorageConfig, StorageMode};
pub use context::AppContext;
pub use controller::{BotController, Skill};
pub use error::{ApiError, BotError, BotResult, PlatformError, StorageError};
pub use platforms::{Outbound, Platform, PlatformKind, PlatformRegistry, Reply};
