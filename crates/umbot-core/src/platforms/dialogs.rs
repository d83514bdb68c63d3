//! Request/response envelope shared by Alisa and Marusia (the "dialogs" protocol).

use serde_json::{json, Value};

use super::{id_at, normalize_command, str_at};
use crate::components::button::AlisaButtons;
use crate::controller::BotController;
use crate::error::PlatformError;
use crate::text;

pub(crate) const MAX_TEXT: usize = 1024;
pub(crate) const MAX_TTS: usize = 1024;

/// Session fields echoed back (Marusia) or kept for logging (Alisa).
#[derive(Debug, Clone, Default)]
pub(crate) struct DialogsSession {
    pub session_id: String,
    pub message_id: i64,
    pub user_id: String,
    /// `session.user` present: the user is logged in and `state.user` is available.
    pub authorized: bool,
}

pub(crate) fn parse(
    platform: &'static str,
    request: &Value,
    ctrl: &mut BotController,
) -> Result<DialogsSession, PlatformError> {
    if !request.is_object() || request.as_object().is_some_and(|m| m.is_empty()) {
        return Err(PlatformError::EmptyRequest { platform });
    }
    let session = request
        .get("session")
        .ok_or(PlatformError::MissingField { platform, field: "session" })?;
    let body = request
        .get("request")
        .ok_or(PlatformError::MissingField { platform, field: "request" })?;

    let authorized = session.get("user").is_some_and(Value::is_object);
    let user_id = id_at(session, "/user/user_id")
        .or_else(|| id_at(session, "/application/application_id"))
        .or_else(|| id_at(session, "/user_id"))
        .ok_or(PlatformError::MissingField { platform, field: "session.user_id" })?;

    let message_id = session.get("message_id").and_then(Value::as_i64).unwrap_or(0);
    ctrl.user_id = user_id.clone();
    ctrl.message_id = message_id;
    ctrl.user_token = session
        .pointer("/user/access_token")
        .and_then(Value::as_str)
        .map(str::to_string);
    ctrl.is_screen = request.pointer("/meta/interfaces/screen").is_some();
    ctrl.user_meta = request.get("meta").cloned().unwrap_or(Value::Null);

    ctrl.original_user_command = str_at(body, "/original_utterance").to_string();
    ctrl.user_command = normalize_command(str_at(body, "/command"));
    if let Some(payload) = body.get("payload").filter(|p| !p.is_null()) {
        ctrl.payload = Some(payload.clone());
        if ctrl.user_command.is_empty() {
            ctrl.user_command = match payload {
                Value::String(s) => normalize_command(s),
                other => normalize_command(str_at(other, "/text")),
            };
        }
    }
    if let Some(nlu) = body.get("nlu") {
        ctrl.nlu.set_nlu(nlu.clone());
    }
    ctrl.state = request
        .pointer("/state/session")
        .filter(|s| s.as_object().is_some_and(|m| !m.is_empty()))
        .cloned();

    Ok(DialogsSession {
        session_id: str_at(session, "/session_id").to_string(),
        message_id,
        user_id,
        authorized,
    })
}

/// Platform-state user data: `state.user` for logged-in users, else `state.application`.
pub(crate) fn platform_user_data(request: &Value, authorized: bool) -> Value {
    let pointer = if authorized { "/state/user" } else { "/state/application" };
    request.pointer(pointer).cloned().unwrap_or(Value::Null)
}

/// `response` object: text, tts, end_session, buttons. Card is added by the caller.
pub(crate) fn response_body(ctrl: &BotController, tts: &str) -> Value {
    let mut response = json!({
        "text": text::resize(&ctrl.text, MAX_TEXT, true),
        "tts": text::resize(tts, MAX_TTS, true),
        "end_session": ctrl.is_end,
    });
    let buttons = ctrl.buttons.render(&AlisaButtons);
    if buttons.as_array().is_some_and(|b| !b.is_empty()) {
        response["buttons"] = buttons;
    }
    response
}

/// Write user data into the state slot the platform persists.
pub(crate) fn attach_state(
    out: &mut Value,
    ctrl: &BotController,
    authorized: bool,
    use_platform_state: bool,
) {
    if let Some(state) = &ctrl.state {
        out["session_state"] = state.clone();
    }
    if use_platform_state && !ctrl.user_data.is_null() {
        let key = if authorized { "user_state_update" } else { "application_state" };
        out[key] = ctrl.user_data.clone();
    }
}

