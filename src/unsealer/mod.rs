//! Unsealers turn a method-specific credential into a Vault token.
//!
//! Each method is a variant of [`Unsealer`]; callers route by [`Unsealer::name`]
//! and call [`Unsealer::token`]. Nothing here retries or caches.

pub mod app_id;
pub mod login;

pub use app_id::{AppIdUnsealer, HashMethod, UserIdMethod};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::vault::VaultClient;
use login::execute_login;

/// Names accepted in the `method` field, in the order they are listed to users.
pub const METHODS: [&str; 4] = ["token", "app-id", "github", "userpass"];

/// A configured credential for one auth method.
///
/// Deserializes from an object tagged by `method`, e.g.
/// `{"method": "userpass", "username": "bob", "password": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum Unsealer {
    Token(TokenUnsealer),
    AppId(AppIdUnsealer),
    Github(GithubUnsealer),
    Userpass(UserpassUnsealer),
}

impl Unsealer {
    /// Method name used for routing; matches the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Token(_) => "token",
            Self::AppId(_) => "app-id",
            Self::Github(_) => "github",
            Self::Userpass(_) => "userpass",
        }
    }

    /// Run the method's protocol once against `vault` and return the issued token.
    pub async fn token(&self, vault: &VaultClient) -> Result<String> {
        debug!(method = self.name(), "Unsealing token");
        match self {
            Self::Token(t) => t.token(vault).await,
            Self::AppId(a) => a.token(vault).await,
            Self::Github(gh) => gh.token(vault).await,
            Self::Userpass(u) => u.token(vault).await,
        }
    }
}

/// An existing Vault token, checked but not exchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUnsealer {
    pub auth_token: String,
}

impl TokenUnsealer {
    /// Returns the configured token unchanged once Vault accepts a self-lookup with it.
    pub async fn token(&self, vault: &VaultClient) -> Result<String> {
        vault.lookup_self(&self.auth_token).await?;
        Ok(self.auth_token.clone())
    }
}

/// GitHub personal access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubUnsealer {
    pub personal_token: String,
}

#[derive(Serialize)]
struct GithubLogin<'a> {
    token: &'a str,
}

impl GithubUnsealer {
    /// POST {base_url}/v1/auth/github/login
    pub async fn token(&self, vault: &VaultClient) -> Result<String> {
        let request = vault.login_request(
            "/v1/auth/github/login",
            &GithubLogin {
                token: &self.personal_token,
            },
        );
        Ok(execute_login(request).await?.client_token)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserpassUnsealer {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
struct UserpassLogin<'a> {
    password: &'a str,
}

impl UserpassUnsealer {
    /// POST {base_url}/v1/auth/userpass/login/{username}
    pub async fn token(&self, vault: &VaultClient) -> Result<String> {
        let path = format!("/v1/auth/userpass/login/{}", self.username);
        let request = vault.login_request(
            &path,
            &UserpassLogin {
                password: &self.password,
            },
        );
        Ok(execute_login(request).await?.client_token)
    }
}
