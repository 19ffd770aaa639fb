use reqwest::{redirect, Client, Method, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::error::Result;
use crate::vault::{backend_error, TOKEN_HEADER};

/// Redirects followed when reading secrets.
const MAX_SECRET_REDIRECTS: usize = 10;

/// HTTP access to a single Vault server.
///
/// Login requests never follow redirects; secret reads follow up to ten,
/// re-sending the `X-Vault-Token` header on each hop.
#[derive(Debug, Clone)]
pub struct VaultClient {
    base_url: String,
    http_client: Client,
    secret_client: Client,
}

impl VaultClient {
    /// Create a client for the Vault server at `base_url` (e.g. http://127.0.0.1:8200).
    pub fn new(base_url: impl Into<String>) -> reqwest::Result<Self> {
        Self::with_timeout(base_url, None)
    }

    /// Like [`VaultClient::new`], with a per-request timeout applied to every call.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut http = Client::builder().redirect(redirect::Policy::none());
        let mut secret =
            Client::builder().redirect(redirect::Policy::limited(MAX_SECRET_REDIRECTS));
        if let Some(timeout) = timeout {
            http = http.timeout(timeout);
            secret = secret.timeout(timeout);
        }

        let base_url = base_url.into();
        debug!("Vault client initialized with base_url={}", base_url);

        Ok(VaultClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client: http.build()?,
            secret_client: secret.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for an API path such as `/v1/auth/github/login`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Build a JSON POST to a login endpoint. Nothing is sent until it is executed.
    pub fn login_request<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestBuilder {
        self.http_client
            .request(Method::POST, self.url(path))
            .json(body)
    }

    /// Check that `token` is valid by looking itself up.
    ///
    /// GET {base_url}/v1/auth/token/lookup-self
    pub async fn lookup_self(&self, token: &str) -> Result<()> {
        let url = self.url("/v1/auth/token/lookup-self");
        debug!(url = %url, "Looking up token in Vault");

        let response = self
            .http_client
            .get(&url)
            .header(TOKEN_HEADER, token)
            .send()
            .await?;

        if response.status().as_u16() == 200 {
            Ok(())
        } else {
            Err(backend_error(response).await.into())
        }
    }

    /// Read a generic secret with `token`; the caller classifies the response.
    ///
    /// GET {base_url}/v1/secret/{path}
    pub async fn read_secret(&self, path: &str, token: &str) -> reqwest::Result<Response> {
        let url = self.url(&format!("/v1/secret/{}", path.trim_start_matches('/')));
        debug!(url = %url, "Reading secret from Vault");

        self.secret_client
            .get(&url)
            .header(TOKEN_HEADER, token)
            .send()
            .await
    }
}
