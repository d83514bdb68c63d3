//! NLU: platform-native entities and intents plus regex extraction of phones, e-mails, links.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::text::{self, LINK_RE};

pub const T_FIO: &str = "YANDEX.FIO";
pub const T_GEO: &str = "YANDEX.GEO";
pub const T_DATETIME: &str = "YANDEX.DATETIME";
pub const T_NUMBER: &str = "YANDEX.NUMBER";

pub const T_INTENT_CONFIRM: &str = "YANDEX.CONFIRM";
pub const T_INTENT_REJECT: &str = "YANDEX.REJECT";
pub const T_INTENT_HELP: &str = "YANDEX.HELP";
pub const T_INTENT_REPEAT: &str = "YANDEX.REPEAT";

/// Key under which messengers put the sender's profile.
pub const THIS_USER: &str = "thisUser";

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\d\-() ]{4,}\d)|((?:\+|\d)[\d\-() ]{9,}\d)").expect("valid phone regex")
});
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^@\s]+@[^.\s]+\.\S+").expect("valid email regex"));

/// Extraction result: `status` is true when at least one value was found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NluResult<T> {
    pub status: bool,
    pub result: Vec<T>,
}

impl<T> NluResult<T> {
    fn from_vec(result: Vec<T>) -> Self {
        Self {
            status: !result.is_empty(),
            result,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FioEntity {
    pub first_name: Option<String>,
    pub patronymic_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoEntity {
    pub country: Option<String>,
    pub city: Option<String>,
    pub street: Option<String>,
    pub house_number: Option<String>,
    pub airport: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DateTimeEntity {
    pub year: Option<i64>,
    #[serde(default)]
    pub year_is_relative: bool,
    pub month: Option<i64>,
    #[serde(default)]
    pub month_is_relative: bool,
    pub day: Option<i64>,
    #[serde(default)]
    pub day_is_relative: bool,
    pub hour: Option<i64>,
    #[serde(default)]
    pub hour_is_relative: bool,
    pub minute: Option<i64>,
    #[serde(default)]
    pub minute_is_relative: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserName {
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Deserialize)]
struct Entity {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    value: Value,
}

/// Wrapper over the platform NLU object (`request.nlu` on Alisa, `thisUser` on messengers).
#[derive(Debug, Clone, Default)]
pub struct Nlu {
    nlu: Value,
}

impl Nlu {
    pub fn set_nlu(&mut self, nlu: Value) {
        self.nlu = nlu;
    }

    pub fn get_nlu(&self) -> &Value {
        &self.nlu
    }

    /// Merge a sender profile under `thisUser`.
    pub fn set_this_user(&mut self, user: UserName) {
        if !self.nlu.is_object() {
            self.nlu = Value::Object(Default::default());
        }
        if let (Some(map), Ok(value)) = (self.nlu.as_object_mut(), serde_json::to_value(user)) {
            map.insert(THIS_USER.to_string(), value);
        }
    }

    fn entities_of<T: for<'de> Deserialize<'de>>(&self, kind: &str) -> NluResult<T> {
        let values = self
            .nlu
            .get("entities")
            .and_then(Value::as_array)
            .map(|entities| {
                entities
                    .iter()
                    .filter_map(|e| serde_json::from_value::<Entity>(e.clone()).ok())
                    .filter(|e| e.kind == kind)
                    .filter_map(|e| serde_json::from_value::<T>(e.value).ok())
                    .collect()
            })
            .unwrap_or_default();
        NluResult::from_vec(values)
    }

    pub fn get_user_name(&self) -> Option<UserName> {
        self.nlu
            .get(THIS_USER)
            .and_then(|u| serde_json::from_value(u.clone()).ok())
    }

    pub fn get_fio(&self) -> NluResult<FioEntity> {
        self.entities_of(T_FIO)
    }

    pub fn get_geo(&self) -> NluResult<GeoEntity> {
        self.entities_of(T_GEO)
    }

    pub fn get_date_time(&self) -> NluResult<DateTimeEntity> {
        self.entities_of(T_DATETIME)
    }

    pub fn get_number(&self) -> NluResult<f64> {
        self.entities_of(T_NUMBER)
    }

    pub fn get_intents(&self) -> Option<&serde_json::Map<String, Value>> {
        self.nlu.get("intents").and_then(Value::as_object)
    }

    /// Slots of a structured intent, if the platform recognised it.
    pub fn get_intent(&self, name: &str) -> Option<&Value> {
        self.get_intents().and_then(|intents| intents.get(name))
    }

    /// Structured confirm intent, or keyword match on the user command.
    pub fn is_intent_confirm(&self, user_command: &str) -> bool {
        self.get_intent(T_INTENT_CONFIRM).is_some() || text::is_say_true(user_command)
    }

    pub fn is_intent_reject(&self, user_command: &str) -> bool {
        self.get_intent(T_INTENT_REJECT).is_some() || text::is_say_false(user_command)
    }

    pub fn is_intent_help(&self) -> bool {
        self.get_intent(T_INTENT_HELP).is_some()
    }

    pub fn is_intent_repeat(&self) -> bool {
        self.get_intent(T_INTENT_REPEAT).is_some()
    }

    pub fn get_phone(query: &str) -> NluResult<String> {
        NluResult::from_vec(
            PHONE_RE
                .find_iter(query)
                .map(|m| m.as_str().trim().to_string())
                .collect(),
        )
    }

    pub fn get_email(query: &str) -> NluResult<String> {
        NluResult::from_vec(
            EMAIL_RE
                .find_iter(query)
                .map(|m| m.as_str().to_string())
                .collect(),
        )
    }

    pub fn get_link(query: &str) -> NluResult<String> {
        NluResult::from_vec(
            LINK_RE
                .find_iter(query)
                .map(|m| m.as_str().to_string())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alisa_nlu() -> Nlu {
        let mut nlu = Nlu::default();
        nlu.set_nlu(json!({
            "tokens": ["иван", "петров", "москва", "5"],
            "entities": [
                {"type": "YANDEX.FIO", "tokens": {"start": 0, "end": 2},
                 "value": {"first_name": "иван", "last_name": "петров"}},
                {"type": "YANDEX.GEO", "tokens": {"start": 2, "end": 3},
                 "value": {"city": "москва"}},
                {"type": "YANDEX.NUMBER", "tokens": {"start": 3, "end": 4}, "value": 5},
                {"type": "YANDEX.DATETIME", "tokens": {"start": 0, "end": 1},
                 "value": {"day": 1, "day_is_relative": true}}
            ],
            "intents": {"YANDEX.CONFIRM": {"slots": {}}}
        }));
        nlu
    }

    #[test]
    fn entities_are_extracted_by_type() {
        let nlu = alisa_nlu();
        let fio = nlu.get_fio();
        assert!(fio.status);
        assert_eq!(fio.result[0].first_name.as_deref(), Some("иван"));
        assert_eq!(nlu.get_geo().result[0].city.as_deref(), Some("москва"));
        assert_eq!(nlu.get_number().result, vec![5.0]);
        let dt = nlu.get_date_time();
        assert_eq!(dt.result[0].day, Some(1));
        assert!(dt.result[0].day_is_relative);
    }

    #[test]
    fn empty_nlu_yields_no_entities() {
        let nlu = Nlu::default();
        assert!(!nlu.get_fio().status);
        assert!(nlu.get_intents().is_none());
        assert!(nlu.get_user_name().is_none());
    }

    #[test]
    fn confirm_uses_intent_then_keywords() {
        let nlu = alisa_nlu();
        assert!(nlu.is_intent_confirm("что-то"));
        assert!(!nlu.is_intent_help());

        let empty = Nlu::default();
        assert!(empty.is_intent_confirm("да, конечно"));
        assert!(empty.is_intent_reject("не согласен"));
        assert!(!empty.is_intent_reject("согласен"));
    }

    #[test]
    fn this_user_round_trip() {
        let mut nlu = Nlu::default();
        nlu.set_this_user(UserName {
            username: Some("max".into()),
            first_name: Some("Максим".into()),
            last_name: None,
        });
        assert_eq!(nlu.get_user_name().unwrap().first_name.as_deref(), Some("Максим"));
    }

    #[test]
    fn regex_extraction() {
        let phone = Nlu::get_phone("позвони мне +7 (999) 123-45-67 вечером");
        assert!(phone.status);
        assert!(phone.result[0].contains("123-45-67"));

        let email = Nlu::get_email("пиши на test@example.com пожалуйста");
        assert_eq!(email.result, vec!["test@example.com".to_string()]);

        let link = Nlu::get_link("смотри https://example.com/page и http://ya.ru");
        assert_eq!(link.result.len(), 2);

        assert!(!Nlu::get_phone("нет номера").status);
    }
}
