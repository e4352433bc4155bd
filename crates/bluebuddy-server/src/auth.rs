//! Request authentication
//!
//! - Placement/history API: `Authorization: Bearer <BLUEBUDDY_API_KEY>`
//! - Voice callbacks: Twilio `X-Twilio-Signature` over the full URL and form

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::adapters::twilio;

/// Largest callback body accepted for signature checks
const MAX_CALLBACK_BODY: usize = 64 * 1024;

const SIGNATURE_HEADER: &str = "x-twilio-signature";

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// `None` disables API key checks
    pub api_key: Option<String>,
    pub twilio_auth_token: String,
    /// Base URL Twilio was given, used to rebuild the signed URL
    pub public_base_url: String,
    pub validate_signatures: bool,
}

pub async fn api_key_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = auth.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(key) if key == expected => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected request with invalid API key");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

pub async fn twilio_signature_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if !auth.validate_signatures {
        return Ok(next.run(request).await);
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_CALLBACK_BODY)
        .await
        .map_err(|_| StatusCode::PAYLOAD_TOO_LARGE)?;

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(StatusCode::FORBIDDEN)?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let url = format!("{}{}", auth.public_base_url, path_and_query);

    // GET callbacks are signed over the URL alone
    let params: Vec<(String, String)> = if parts.method == Method::POST {
        serde_urlencoded::from_bytes(&bytes).map_err(|_| StatusCode::BAD_REQUEST)?
    } else {
        Vec::new()
    };

    if !twilio::validate_signature(&auth.twilio_auth_token, &url, &params, signature) {
        tracing::warn!(%url, "Rejected callback with invalid Twilio signature");
        return Err(StatusCode::FORBIDDEN);
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
