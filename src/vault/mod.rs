pub mod client;

pub use client::VaultClient;

use serde::Deserialize;

use crate::error::BackendError;

/// Header carrying the Vault token on every authenticated request.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Standard login response: `{"auth": {"client_token": ..., "lease_duration": ..., "ttl": ...}}`.
#[derive(Debug, Deserialize)]
pub struct AuthEnvelope {
    pub auth: AuthInfo,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthInfo {
    pub client_token: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub ttl: u64,
}

/// Standard failure response: `{"errors": ["..."]}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    errors: Vec<String>,
}

/// Classify a non-200 response into a [`BackendError`].
///
/// The status code is always kept; messages come from the error envelope, or
/// fall back to "communication error." when the body is unreadable or not an envelope.
pub async fn backend_error(response: reqwest::Response) -> BackendError {
    let code = response.status().as_u16();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(_) => return BackendError::communication(code),
    };
    match serde_json::from_slice::<ErrorEnvelope>(&body) {
        Ok(envelope) => BackendError::new(code, envelope.errors),
        Err(_) => BackendError::communication(code),
    }
}
