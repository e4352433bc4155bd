//! BlueBuddy API Routes
//!
//! - /calls - Place check-in calls, list live sessions
//! - /patients/:id/call-logs - Call history
//! - /voice/:session_id/{answer,speech,ended} - Twilio callbacks

pub mod call;
pub mod swagger;
pub mod voice;

use axum::{http::StatusCode, middleware, routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use bluebuddy::DomainError;

use crate::{auth, AppState};

/// Map a domain error onto an HTTP error response
pub fn error_response(e: DomainError) -> (StatusCode, String) {
    let status = match &e {
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::InvalidState(_) => StatusCode::CONFLICT,
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::ProviderUnavailable { .. } | DomainError::MalformedModelOutput(_) => {
            StatusCode::BAD_GATEWAY
        }
        DomainError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if e.is_caller_error() {
        tracing::warn!(status = status.as_u16(), "Request rejected: {}", e);
    }
    (status, e.to_string())
}

/// Full application router
pub fn app(state: AppState) -> Router {
    // Protected routes (require authentication)
    let api_routes = call::router().layer(middleware::from_fn_with_state(
        state.auth.clone(),
        auth::api_key_middleware,
    ));

    // Provider callbacks (require a valid Twilio signature)
    let voice_routes = voice::router().layer(middleware::from_fn_with_state(
        state.auth.clone(),
        auth::twilio_signature_middleware,
    ));

    // OpenAPI documentation
    let openapi = swagger::ApiDoc::openapi();

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
        .route("/health", get(crate::health_check))
        .merge(api_routes)
        .merge(voice_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    use bluebuddy::testing::{InMemoryCallLogRepository, RecordingTelephony, ScriptedLlm};

    use crate::adapters::twilio::compute_signature;
    use crate::application::{CallService, CallSettings};
    use crate::auth::AuthConfig;

    const BASE_URL: &str = "https://buddy.example";
    const AUTH_TOKEN: &str = "twilio-secret";
    const API_KEY: &str = "caregiver-key";

    struct TestApp {
        router: Router,
        llm: Arc<ScriptedLlm>,
        logs: Arc<InMemoryCallLogRepository>,
    }

    fn test_app() -> TestApp {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_env_filter("bluebuddy=debug,bluebuddy_server=debug")
            .try_init();

        let llm = Arc::new(ScriptedLlm::new());
        let logs = Arc::new(InMemoryCallLogRepository::new());
        let service = CallService::new(
            llm.clone(),
            Arc::new(RecordingTelephony::new()),
            logs.clone(),
            CallSettings {
                public_base_url: BASE_URL.to_string(),
                caller_id: "+15550000".to_string(),
                voice: "alice".to_string(),
                gather_timeout_secs: 5,
                classifier_timeout: Duration::from_secs(2),
                responder_timeout: Duration::from_secs(2),
                summary_timeout: Duration::from_secs(2),
                append_empty_speech: true,
                destination_override: None,
            },
        );
        let state = AppState {
            call_service: Arc::new(service),
            auth: AuthConfig {
                api_key: Some(API_KEY.to_string()),
                twilio_auth_token: AUTH_TOKEN.to_string(),
                public_base_url: BASE_URL.to_string(),
                validate_signatures: true,
            },
        };

        TestApp {
            router: app(state),
            llm,
            logs,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn place_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/calls")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(key) = key {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {key}"));
        }
        let body = serde_json::json!({
            "patient_id": 7,
            "first_name": "Jane",
            "last_name": "Doe",
            "phone_number": "+15551234",
            "prescriptions": {"aspirin": "taken"}
        });
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn voice_request(path: &str, fields: &[(&str, &str)]) -> Request<Body> {
        let params: Vec<(String, String)> = fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let signature =
            compute_signature(AUTH_TOKEN, &format!("{BASE_URL}{path}"), &params).unwrap();

        Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header("x-twilio-signature", signature)
            .body(Body::from(serde_urlencoded::to_string(&params).unwrap()))
            .unwrap()
    }

    async fn place(app: &TestApp) -> String {
        let (status, body) = send(&app.router, place_request(Some(API_KEY))).await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        json["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let app = test_app();
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let (status, body) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"status\":\"ok\""));
    }

    #[tokio::test]
    async fn test_place_call_requires_api_key() {
        let app = test_app();

        let (status, _) = send(&app.router, place_request(None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app.router, place_request(Some("wrong"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = send(&app.router, place_request(Some(API_KEY))).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Calling Jane at +15551234"));
    }

    #[tokio::test]
    async fn test_invalid_placement_is_bad_request() {
        let app = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/calls")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
            .body(Body::from(
                r#"{"patient_id": 1, "first_name": "", "phone_number": "+1555"}"#,
            ))
            .unwrap();

        let (status, _) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_voice_callback_requires_signature() {
        let app = test_app();
        let session_id = place(&app).await;
        let path = format!("/voice/{session_id}/answer");

        let unsigned = Request::builder()
            .method("POST")
            .uri(&path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("CallSid=CA1"))
            .unwrap();
        let (status, _) = send(&app.router, unsigned).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let mut tampered = voice_request(&path, &[("CallSid", "CA1")]);
        *tampered.body_mut() = Body::from("CallSid=CA2");
        let (status, _) = send(&app.router, tampered).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_answer_returns_twiml() {
        let app = test_app();
        let session_id = place(&app).await;

        let path = format!("/voice/{session_id}/answer");
        let response = app
            .router
            .clone()
            .oneshot(voice_request(&path, &[]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/xml"
        );
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(body.contains("Hello Jane!"));
        assert!(body.contains(&format!(
            r#"action="{BASE_URL}/voice/{session_id}/speech""#
        )));
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let app = test_app();
        let path = format!("/voice/{}/ended", uuid::Uuid::new_v4());

        let (status, _) = send(&app.router, voice_request(&path, &[])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_speech_before_answer_is_conflict() {
        let app = test_app();
        let session_id = place(&app).await;
        let path = format!("/voice/{session_id}/speech");

        let (status, _) = send(
            &app.router,
            voice_request(&path, &[("SpeechResult", "hello")]),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_call_flow_over_http() {
        let app = test_app();
        let session_id = place(&app).await;

        send(
            &app.router,
            voice_request(&format!("/voice/{session_id}/answer"), &[]),
        )
        .await;

        app.llm.push_classification(
            r#"{"hang_up": false, "medication": "aspirin", "status": "taken"}"#,
        );
        app.llm.push_reply("Glad to hear it!");
        let (status, body) = send(
            &app.router,
            voice_request(
                &format!("/voice/{session_id}/speech"),
                &[("SpeechResult", "I took my aspirin this morning")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<Say voice=\"alice\">Glad to hear it!</Say>"));

        let list = Request::get("/calls")
            .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app.router, list).await;
        assert_eq!(status, StatusCode::OK);
        let sessions: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(sessions[0]["phase"], "listening");
        assert_eq!(sessions[0]["medication_updates"][0]["medication"], "aspirin");

        let (status, body) = send(
            &app.router,
            voice_request(
                &format!("/voice/{session_id}/ended"),
                &[("CallStatus", "completed")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
        assert_eq!(app.logs.logs().len(), 1);

        let history = Request::get("/patients/7/call-logs")
            .header(header::AUTHORIZATION, format!("Bearer {API_KEY}"))
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app.router, history).await;
        assert_eq!(status, StatusCode::OK);
        let logs: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(logs[0]["call_status"], "confirmed");
        assert_eq!(logs[0]["medication_updates"][0]["status"], "taken");
    }

    #[tokio::test]
    async fn test_ended_reports_summary_failure() {
        let app = test_app();
        let session_id = place(&app).await;
        send(
            &app.router,
            voice_request(&format!("/voice/{session_id}/answer"), &[]),
        )
        .await;
        send(
            &app.router,
            voice_request(
                &format!("/voice/{session_id}/speech"),
                &[("SpeechResult", "hello")],
            ),
        )
        .await;
        app.llm.fail_summary("model down");

        let (status, _) = send(
            &app.router,
            voice_request(
                &format!("/voice/{session_id}/ended"),
                &[("CallStatus", "completed")],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(app.logs.logs().is_empty());
    }

    #[tokio::test]
    async fn test_ended_accepts_get_callback() {
        let app = test_app();
        let session_id = place(&app).await;
        let path = format!("/voice/{session_id}/ended?CallStatus=no-answer");
        let signature = compute_signature(AUTH_TOKEN, &format!("{BASE_URL}{path}"), &[]).unwrap();

        let request = Request::get(&path)
            .header("x-twilio-signature", signature)
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app.router, request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            app.logs.logs()[0].call_status,
            bluebuddy::CallStatus::Missed
        );
    }

    #[test]
    fn test_error_mapping() {
        let cases = [
            (
                DomainError::not_found("CallSession", uuid::Uuid::nil()),
                StatusCode::NOT_FOUND,
            ),
            (DomainError::InvalidState("x".into()), StatusCode::CONFLICT),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::provider("openai", "down"),
                StatusCode::BAD_GATEWAY,
            ),
            (
                DomainError::MalformedModelOutput("x".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                DomainError::Repository("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, expected) in cases {
            assert_eq!(error_response(error).0, expected);
        }
    }
}
