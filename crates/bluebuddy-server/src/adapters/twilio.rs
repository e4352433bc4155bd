//! Twilio adapter
//!
//! Places outbound calls through the Twilio REST API and validates the
//! `X-Twilio-Signature` header on incoming callbacks.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha1::Sha1;

use bluebuddy::{DomainError, OutboundCall, PlacedCall, TelephonyProvider};

use crate::config::TwilioConfig;

const API_BASE_URL: &str = "https://api.twilio.com";
const PROVIDER: &str = "twilio";

type HmacSha1 = Hmac<Sha1>;

pub struct TwilioTelephony {
    client: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl TwilioTelephony {
    pub fn new(config: &TwilioConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DomainError::provider(PROVIDER, format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            base_url: API_BASE_URL.to_string(),
        })
    }

    /// Overrides the API root (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url, self.account_sid
        )
    }
}

#[derive(Deserialize)]
struct CallResource {
    sid: String,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    message: String,
}

#[async_trait]
impl TelephonyProvider for TwilioTelephony {
    async fn place_call(&self, call: &OutboundCall) -> Result<PlacedCall, DomainError> {
        let form = [
            ("To", call.to.as_str()),
            ("From", call.from.as_str()),
            ("Url", call.answer_url.as_str()),
            ("Method", "POST"),
            ("StatusCallback", call.ended_url.as_str()),
            ("StatusCallbackMethod", "POST"),
        ];

        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::provider(PROVIDER, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            let message = match serde_json::from_str::<ApiError>(&body) {
                Ok(err) => match err.code {
                    Some(code) => format!("{} (code {})", err.message, code),
                    None => err.message,
                },
                Err(_) => body,
            };
            return Err(DomainError::provider(
                PROVIDER,
                format!("API returned {status}: {message}"),
            ));
        }

        let resource: CallResource = serde_json::from_str(&body)
            .map_err(|e| DomainError::provider(PROVIDER, format!("unexpected response: {e}")))?;

        Ok(PlacedCall {
            call_sid: resource.sid,
            status: resource.status.unwrap_or_else(|| "queued".to_string()),
        })
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }
}

/// Expected `X-Twilio-Signature` for a callback.
///
/// The full request URL is followed by every form parameter, sorted by
/// name, with each name and value appended without separators.
#[cfg(test)]
pub fn compute_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<String> {
    let mac = signing_mac(auth_token, url, params)?;
    Some(BASE64.encode(mac.finalize().into_bytes()))
}

/// Constant-time check of a received signature
pub fn validate_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let Ok(expected) = BASE64.decode(signature.trim()) else {
        return false;
    };
    match signing_mac(auth_token, url, params) {
        Some(mac) => mac.verify_slice(&expected).is_ok(),
        None => false,
    }
}

fn signing_mac(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(url.as_bytes());
    for (key, value) in sorted {
        mac.update(key.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> TwilioConfig {
        TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            phone_number: "+15550000".to_string(),
        }
    }

    fn outbound() -> OutboundCall {
        OutboundCall {
            to: "+15551234".to_string(),
            from: "+15550000".to_string(),
            answer_url: "https://buddy.example/voice/abc/answer".to_string(),
            ended_url: "https://buddy.example/voice/abc/ended".to_string(),
        }
    }

    #[tokio::test]
    async fn test_place_call_posts_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
            .and(header_exists("authorization"))
            .and(body_string_contains("To=%2B15551234"))
            .and(body_string_contains(
                "StatusCallback=https%3A%2F%2Fbuddy.example%2Fvoice%2Fabc%2Fended",
            ))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(serde_json::json!({"sid": "CA42", "status": "queued"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let telephony = TwilioTelephony::new(&config())
            .unwrap()
            .with_base_url(server.uri());
        let placed = telephony.place_call(&outbound()).await.unwrap();

        assert_eq!(placed.call_sid, "CA42");
        assert_eq!(placed.status, "queued");
    }

    #[tokio::test]
    async fn test_place_call_error_is_provider_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "code": 21211,
                "message": "The 'To' number is not a valid phone number.",
                "status": 400
            })))
            .mount(&server)
            .await;

        let telephony = TwilioTelephony::new(&config())
            .unwrap()
            .with_base_url(server.uri());
        let err = telephony.place_call(&outbound()).await.unwrap_err();

        match err {
            DomainError::ProviderUnavailable { provider, message } => {
                assert_eq!(provider, "twilio");
                assert!(message.contains("21211"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    fn params() -> Vec<(String, String)> {
        vec![
            ("From".to_string(), "+15550000".to_string()),
            ("CallSid".to_string(), "CA42".to_string()),
            ("SpeechResult".to_string(), "I took my aspirin".to_string()),
        ]
    }

    #[test]
    fn test_signature_round_trip() {
        let url = "https://buddy.example/voice/abc/speech";
        let signature = compute_signature("secret", url, &params()).unwrap();

        assert!(validate_signature("secret", url, &params(), &signature));
        assert!(!validate_signature("other", url, &params(), &signature));
        assert!(!validate_signature(
            "secret",
            "https://buddy.example/voice/abc/answer",
            &params(),
            &signature
        ));
        assert!(!validate_signature("secret", url, &params(), "not base64!"));
    }

    #[test]
    fn test_signature_ignores_parameter_order() {
        let url = "https://buddy.example/voice/abc/speech";
        let mut reversed = params();
        reversed.reverse();

        assert_eq!(
            compute_signature("secret", url, &params()),
            compute_signature("secret", url, &reversed)
        );
    }
}
