//! Server configuration
//!
//! Read from the Shuttle secret store through a lookup function so the
//! parsing can be tested without a running deployment.

use std::time::Duration;

use thiserror::Error;

use crate::application::CallSettings;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_VOICE: &str = "alice";
const DEFAULT_GATHER_TIMEOUT_SECS: u32 = 5;
const DEFAULT_CLASSIFIER_TIMEOUT_MS: u64 = 4_000;
const DEFAULT_RESPONDER_TIMEOUT_MS: u64 = 8_000;
const DEFAULT_SUMMARY_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_SESSION_TTL_SECS: u64 = 3_600;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required secret {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Twilio account settings
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub phone_number: String,
}

/// Everything the server needs at startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub openai_api_key: String,
    pub openai_model: String,
    pub twilio: TwilioConfig,
    pub call: CallSettings,
    /// Bearer key for the placement/history API; `None` disables auth
    pub api_key: Option<String>,
    pub validate_signatures: bool,
    pub session_ttl: Duration,
}

impl AppConfig {
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let twilio = TwilioConfig {
            account_sid: require("TWILIO_ACCOUNT_SID")?,
            auth_token: require("TWILIO_AUTH_TOKEN")?,
            phone_number: require("TWILIO_PHONE_NUMBER")?,
        };

        let call = CallSettings {
            public_base_url: require("PUBLIC_BASE_URL")?
                .trim_end_matches('/')
                .to_string(),
            caller_id: twilio.phone_number.clone(),
            voice: get("AI_VOICE").unwrap_or_else(|| DEFAULT_VOICE.to_string()),
            gather_timeout_secs: parse_or(
                "GATHER_TIMEOUT_SECS",
                get("GATHER_TIMEOUT_SECS"),
                DEFAULT_GATHER_TIMEOUT_SECS,
            )?,
            classifier_timeout: Duration::from_millis(parse_or(
                "CLASSIFIER_TIMEOUT_MS",
                get("CLASSIFIER_TIMEOUT_MS"),
                DEFAULT_CLASSIFIER_TIMEOUT_MS,
            )?),
            responder_timeout: Duration::from_millis(parse_or(
                "RESPONDER_TIMEOUT_MS",
                get("RESPONDER_TIMEOUT_MS"),
                DEFAULT_RESPONDER_TIMEOUT_MS,
            )?),
            summary_timeout: Duration::from_millis(parse_or(
                "SUMMARY_TIMEOUT_MS",
                get("SUMMARY_TIMEOUT_MS"),
                DEFAULT_SUMMARY_TIMEOUT_MS,
            )?),
            append_empty_speech: parse_bool(
                "APPEND_EMPTY_SPEECH",
                get("APPEND_EMPTY_SPEECH"),
                true,
            )?,
            destination_override: get("PATIENT_PHONE_NUMBER"),
        };

        Ok(Self {
            openai_api_key: require("OPENAI_API_KEY")?,
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            twilio,
            call,
            api_key: get("BLUEBUDDY_API_KEY"),
            validate_signatures: parse_bool(
                "VALIDATE_TWILIO_SIGNATURES",
                get("VALIDATE_TWILIO_SIGNATURES"),
                true,
            )?,
            session_ttl: Duration::from_secs(parse_or(
                "SESSION_TTL_SECS",
                get("SESSION_TTL_SECS"),
                DEFAULT_SESSION_TTL_SECS,
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key, value: v }),
    }
}

fn parse_bool(key: &'static str, value: Option<String>, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = value else {
        return Ok(default);
    };
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { key, value: raw }),
    }
}
