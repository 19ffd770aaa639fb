use reqwest::RequestBuilder;
use tracing::debug;

use crate::error::Result;
use crate::vault::{backend_error, AuthEnvelope, AuthInfo};

/// Send a prepared login request once and classify the response.
///
/// - 200: the body must be an auth envelope; its `auth` block is returned.
/// - anything else: a [`BackendError`](crate::error::BackendError) with the status
///   code and the backend's messages.
/// - no response at all: the transport error, unchanged.
pub async fn execute_login(request: RequestBuilder) -> Result<AuthInfo> {
    let response = request.send().await?;
    let status_code = response.status().as_u16();
    debug!(status_code = %status_code, url = %response.url(), "login response from Vault");

    match status_code {
        200 => {
            let body = response.bytes().await?;
            let envelope: AuthEnvelope = serde_json::from_slice(&body)?;
            debug!(
                lease_duration = envelope.auth.lease_duration,
                ttl = envelope.auth.ttl,
                "login accepted by Vault"
            );
            Ok(envelope.auth)
        }
        _ => Err(backend_error(response).await.into()),
    }
}
