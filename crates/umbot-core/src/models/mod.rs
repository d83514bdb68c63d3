//! Persisted models over a [`Storage`] backend.

mod image_tokens;
mod sound_tokens;
pub mod storage;
mod users_data;

pub use image_tokens::ImageTokens;
pub use sound_tokens::SoundTokens;
pub use storage::{open_storage, FileStorage, Query, SledStorage, Storage};
pub use users_data::UsersData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{BotError, BotResult};

/// A record type stored in one table, identified by [`Model::key`].
pub trait Model: Serialize + DeserializeOwned {
    const TABLE: &'static str;

    fn key(&self) -> String;

    fn validate(&self) -> BotResult<()> {
        Ok(())
    }

    fn select_one(storage: &dyn Storage, query: &Query) -> BotResult<Option<Self>> {
        Ok(Self::select(storage, query)?.into_iter().next())
    }

    fn select(storage: &dyn Storage, query: &Query) -> BotResult<Vec<Self>> {
        storage
            .select(Self::TABLE, query)?
            .into_iter()
            .map(|record| serde_json::from_value(record).map_err(BotError::from))
            .collect()
    }

    fn find(storage: &dyn Storage, key: &str) -> BotResult<Option<Self>> {
        storage
            .get(Self::TABLE, key)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(BotError::from)
    }

    /// Insert or overwrite.
    fn insert(&self, storage: &dyn Storage) -> BotResult<()> {
        self.validate()?;
        let record = storage::as_object(serde_json::to_value(self)?);
        storage.insert(Self::TABLE, &self.key(), record)?;
        Ok(())
    }

    /// `false` when no record with this key exists yet.
    fn update(&self, storage: &dyn Storage) -> BotResult<bool> {
        self.validate()?;
        let record = storage::as_object(serde_json::to_value(self)?);
        Ok(storage.update(Self::TABLE, &self.key(), record)?)
    }

    /// Update, falling back to insert.
    fn save(&self, storage: &dyn Storage) -> BotResult<()> {
        if !self.update(storage)? {
            self.insert(storage)?;
        }
        Ok(())
    }

    fn remove(&self, storage: &dyn Storage) -> BotResult<bool> {
        Ok(storage.remove(Self::TABLE, &self.key())?)
    }
}

pub(crate) fn require(model: &'static str, field: &str, value: &str, max: usize) -> BotResult<()> {
    if value.is_empty() {
        return Err(BotError::Validation {
            model,
            message: format!("`{field}` is required"),
        });
    }
    if value.chars().count() > max {
        return Err(BotError::Validation {
            model,
            message: format!("`{field}` is longer than {max} characters"),
        });
    }
    Ok(())
}
