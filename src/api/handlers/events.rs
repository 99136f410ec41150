//! Inbound build-event webhook.
//!
//! Verifies the event signature when a shared secret is configured,
//! classifies the payload into a canonical deployment event, and runs
//! duplicate suppression before any expensive NAS scan is started.

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::Sha256;

use crate::api::SharedState;
use crate::error::{AppError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Signature header carrying `sha256=<hex>`
pub const SIGNATURE_HEADER: &str = "x-signature-256";

/// Canonical deployment event classified from the webhook payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BuildEvent {
    pub project_name: String,
    pub version: String,
    pub build_number: i32,
    #[serde(default = "default_event_type")]
    pub event_type: String,
    #[serde(default)]
    pub status: Option<String>,
}

fn default_event_type() -> String {
    "build.completed".to_string()
}

impl BuildEvent {
    /// Whether the build outcome warrants an artifact scan.
    pub fn is_successful(&self) -> bool {
        match &self.status {
            Some(status) => status.eq_ignore_ascii_case("success"),
            None => true,
        }
    }
}

/// Verify an HMAC-SHA256 signature over the raw payload.
pub fn verify_signature(secret: &str, payload: &[u8], header_value: &str) -> Result<()> {
    let hex_digest = header_value
        .strip_prefix("sha256=")
        .ok_or_else(|| AppError::Validation("Malformed signature header".to_string()))?;
    let expected = hex::decode(hex_digest)
        .map_err(|_| AppError::Validation("Malformed signature header".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("HMAC init failed: {}", e)))?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| AppError::Validation("Invalid webhook signature".to_string()))
}

/// Handle a CI build-completion event.
pub async fn build_event(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<serde_json::Value>)> {
    // Signature verification is skipped entirely when no secret is
    // configured (zero-config environments).
    if let Some(secret) = &state.config.webhook_secret {
        let header_value = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Validation("Missing webhook signature".to_string()))?;
        verify_signature(secret, &body, header_value)?;
    }

    let event: BuildEvent = serde_json::from_slice(&body)?;
    if event.build_number < 0 {
        return Err(AppError::Validation(
            "Build number must be non-negative".to_string(),
        ));
    }

    let duplicate = state.suppressor.check_and_record(
        &event.project_name,
        event.build_number,
        &event.event_type,
        &body,
    );
    if duplicate {
        tracing::info!(
            project = %event.project_name,
            build = event.build_number,
            event_type = %event.event_type,
            "Duplicate build event suppressed"
        );
        return Ok((StatusCode::OK, Json(json!({ "duplicate": true }))));
    }

    if !event.is_successful() {
        tracing::info!(
            project = %event.project_name,
            build = event.build_number,
            status = ?event.status,
            "Build did not succeed; skipping artifact scan"
        );
        return Ok((
            StatusCode::OK,
            Json(json!({ "duplicate": false, "scanned": false })),
        ));
    }

    // Expensive work runs in the background; the webhook replies fast.
    let locator = state.locator.clone();
    let scan_event = event.clone();
    tokio::spawn(async move {
        if let Err(e) = locator
            .resolve(
                &scan_event.project_name,
                &scan_event.version,
                scan_event.build_number,
            )
            .await
        {
            tracing::warn!(
                project = %scan_event.project_name,
                build = scan_event.build_number,
                error = %e,
                "Event-triggered resolve failed"
            );
        }
    });

    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "duplicate": false, "scanned": true })),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, payload: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn valid_signature_verifies() {
        let payload = br#"{"project_name":"p","version":"3.0.0","build_number":26}"#;
        let header = sign("topsecret", payload);
        assert!(verify_signature("topsecret", payload, &header).is_ok());
    }

    #[test]
    fn wrong_secret_fails_verification() {
        let payload = b"{}";
        let header = sign("topsecret", payload);
        assert!(matches!(
            verify_signature("other", payload, &header),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let header = sign("topsecret", b"{\"build_number\":26}");
        assert!(verify_signature("topsecret", b"{\"build_number\":27}", &header).is_err());
    }

    #[test]
    fn malformed_header_is_rejected() {
        assert!(matches!(
            verify_signature("s", b"{}", "md5=abcd"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            verify_signature("s", b"{}", "sha256=zzzz"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn payload_classifies_into_canonical_event() {
        let payload = r#"{
            "project_name": "3.0.0/mr3.0.0_release",
            "version": "3.0.0",
            "build_number": 26,
            "status": "SUCCESS"
        }"#;
        let event: BuildEvent = serde_json::from_str(payload).unwrap();
        assert_eq!(event.project_name, "3.0.0/mr3.0.0_release");
        assert_eq!(event.event_type, "build.completed");
        assert!(event.is_successful());
    }

    #[test]
    fn failed_build_is_not_successful() {
        let event: BuildEvent = serde_json::from_str(
            r#"{"project_name":"p","version":"3.0.0","build_number":26,"status":"FAILURE"}"#,
        )
        .unwrap();
        assert!(!event.is_successful());
    }

    #[test]
    fn missing_status_defaults_to_successful() {
        let event: BuildEvent = serde_json::from_str(
            r#"{"project_name":"p","version":"3.0.0","build_number":26}"#,
        )
        .unwrap();
        assert!(event.is_successful());
    }
}
