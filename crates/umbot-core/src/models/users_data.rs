use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{require, Model, Storage};
use crate::error::BotResult;

/// Per-user record; one per `(user_id, platform)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersData {
    pub user_id: String,
    #[serde(default)]
    pub meta: Value,
    #[serde(default)]
    pub data: Value,
    pub platform: String,
}

impl UsersData {
    pub fn new(user_id: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn load(storage: &dyn Storage, user_id: &str, platform: &str) -> BotResult<Option<Self>> {
        Self::find(storage, &format!("{platform}:{user_id}"))
    }
}

impl Model for UsersData {
    const TABLE: &'static str = "UsersData";

    fn key(&self) -> String {
        format!("{}:{}", self.platform, self.user_id)
    }

    fn validate(&self) -> BotResult<()> {
        require("UsersData", "user_id", &self.user_id, 250)?;
        require("UsersData", "platform", &self.platform, 32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BotError;
    use crate::models::{FileStorage, Query};

    #[test]
    fn one_record_per_user_and_platform() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();
        let mut user = UsersData::new("u1", "alisa");
        user.save(&storage).unwrap();
        user.data = serde_json::json!({"score": 5});
        user.save(&storage).unwrap();
        UsersData::new("u1", "vk").save(&storage).unwrap();

        let all = UsersData::select(&storage, &Query::new().eq("user_id", "u1")).unwrap();
        assert_eq!(all.len(), 2);
        let alisa = UsersData::load(&storage, "u1", "alisa").unwrap().unwrap();
        assert_eq!(alisa.data["score"], 5);
    }

    #[test]
    fn load_goes_straight_to_the_key() {
        let storage = crate::models::SledStorage::temporary().unwrap();
        storage
            .insert(
                UsersData::TABLE,
                "vk:u2",
                serde_json::json!({"user_id": "u2", "platform": "vk", "data": {"n": 1}}),
            )
            .unwrap();
        // unreadable neighbour in the same table is never decoded
        storage.insert(UsersData::TABLE, "vk:broken", serde_json::json!({"user_id": 7})).unwrap();

        let user = UsersData::load(&storage, "u2", "vk").unwrap().unwrap();
        assert_eq!(user.data, serde_json::json!({"n": 1}));
        assert!(UsersData::load(&storage, "u2", "alisa").unwrap().is_none());
    }

    #[test]
    fn empty_user_id_rejected() {
        let err = UsersData::new("", "alisa").validate().unwrap_err();
        assert!(matches!(err, BotError::Validation { model: "UsersData", .. }));
    }
}
