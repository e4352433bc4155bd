use std::sync::Arc;

use anyhow::Context;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;

mod adapters;
mod application;
mod auth;
mod config;
mod models;
mod routes;

use adapters::{OpenAiProvider, PgCallLogRepository, TwilioTelephony};
use application::CallService;
use auth::AuthConfig;
use config::AppConfig;

/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub call_service: Arc<CallService>,
    pub auth: AuthConfig,
}

#[derive(Serialize)]
struct HealthCheck {
    status: String,
    message: String,
    version: String,
}

async fn health_check() -> Json<HealthCheck> {
    Json(HealthCheck {
        status: "ok".to_string(),
        message: "BlueBuddy API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[shuttle_runtime::main]
async fn main(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secrets: shuttle_runtime::SecretStore,
) -> shuttle_axum::ShuttleAxum {
    tracing::info!("BlueBuddy API initializing...");

    let config = AppConfig::from_lookup(|key| secrets.get(key)).context("invalid configuration")?;

    if config.api_key.is_some() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!("No BLUEBUDDY_API_KEY set - authentication disabled");
    }
    if !config.validate_signatures {
        tracing::warn!("Twilio signature validation disabled");
    }

    // Run migrations
    sqlx::migrate!()
        .run(&pool)
        .await
        .context("failed to run database migrations")?;

    tracing::info!("Database migrations completed");

    let llm = OpenAiProvider::new(config.openai_api_key.clone(), config.openai_model.clone())
        .context("failed to initialize OpenAI client")?;
    let telephony =
        TwilioTelephony::new(&config.twilio).context("failed to initialize Twilio client")?;
    let call_logs = PgCallLogRepository::new(pool);

    tracing::info!(model = %config.openai_model, "Language model: OpenAI");

    let call_service = Arc::new(CallService::new(
        Arc::new(llm),
        Arc::new(telephony),
        Arc::new(call_logs),
        config.call.clone(),
    ));

    application::spawn_session_reaper(call_service.clone(), config.session_ttl);
    tracing::info!(ttl_secs = config.session_ttl.as_secs(), "Session reaper started");

    let state = AppState {
        call_service,
        auth: AuthConfig {
            api_key: config.api_key.clone(),
            twilio_auth_token: config.twilio.auth_token.clone(),
            public_base_url: config.call.public_base_url.clone(),
            validate_signatures: config.validate_signatures,
        },
    };

    let router = routes::app(state);

    tracing::info!("Swagger UI: /swagger-ui");
    tracing::info!(base_url = %config.call.public_base_url, "BlueBuddy API ready");

    Ok(router.into())
}
