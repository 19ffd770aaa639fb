use thiserror::Error;

/// Message used when a non-200 response carries no decodable error envelope.
pub const COMMUNICATION_ERROR: &str = "communication error.";

/// Non-2xx response from Vault, with the messages from its `{"errors": [...]}` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {}", .errors.join(", "))]
pub struct BackendError {
    pub code: u16,
    pub errors: Vec<String>,
}

impl BackendError {
    pub fn new(code: u16, errors: Vec<String>) -> Self {
        Self { code, errors }
    }

    /// Error for a response whose body could not be read as an error envelope.
    pub fn communication(code: u16) -> Self {
        Self::new(code, vec![COMMUNICATION_ERROR.to_string()])
    }
}

/// Errors returned while unsealing a token.
#[derive(Debug, Error)]
pub enum Error {
    /// The request never got a response (connect, TLS, body read).
    #[error("vault transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Backend(#[from] BackendError),

    /// A 200 response whose body was not the expected auth envelope.
    #[error("error decoding vault response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unknown method specified for user id: {0:?}")]
    UnknownUserIdMethod(String),

    #[error("Unknown hash method specified for user id: {0:?}")]
    UnknownHashMethod(String),

    /// Local lookups: network interface or user-id file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Backend status code, when the failure came from a Vault response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Backend(e) => Some(e.code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure to refresh the policy store from Vault.
///
/// The previous contents of the store are kept whenever this is returned.
#[derive(Debug, Error)]
pub enum PolicyLoadError {
    #[error("error loading policy from vault: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("error loading policy from vault: {0}")]
    Backend(#[from] BackendError),

    #[error(
        "error loading policy from vault: could not decode policy document ({0}). \
         This can occur when using vault-cli to save the policy json, as vault-cli \
         saves it as a string rather than a json object."
    )]
    Decode(#[from] serde_json::Error),
}
