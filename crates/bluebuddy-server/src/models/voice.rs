//! Telephony callback forms

use serde::Deserialize;

/// Fields Twilio posts (or queries) on every voice callback
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceCallback {
    #[serde(default)]
    pub call_sid: Option<String>,
    #[serde(default)]
    pub speech_result: Option<String>,
    #[serde(default)]
    pub call_status: Option<String>,
}
