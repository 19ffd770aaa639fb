use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::PolicyLoadError;
use crate::vault::{backend_error, VaultClient};

/// Key whose policy applies to identities without an entry of their own.
pub const WILDCARD: &str = "*";

/// Token TTL used when a policy does not set one (6h).
pub const DEFAULT_TTL: u64 = 21600;

fn default_ttl() -> u64 {
    DEFAULT_TTL
}

fn is_unlimited(uses: &u64) -> bool {
    *uses == 0
}

/// Parameters attached to tokens minted for an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<HashMap<String, String>>,
    /// Seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u64,
    /// Maximum uses of a minted token; 0 is unlimited.
    #[serde(rename = "num_users", default, skip_serializing_if = "is_unlimited")]
    pub max_uses: u64,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            policies: Vec::new(),
            meta: None,
            ttl: DEFAULT_TTL,
            max_uses: 0,
        }
    }
}

/// Answer for lookups when the store has neither the key nor a wildcard.
pub fn fallback_policy() -> Arc<Policy> {
    static FALLBACK: OnceLock<Arc<Policy>> = OnceLock::new();
    FALLBACK.get_or_init(|| Arc::new(Policy::default())).clone()
}

/// Mapping used when Vault has no policy document: everyone gets vault's "default" policy.
pub fn builtin_policies() -> HashMap<String, Arc<Policy>> {
    let mut map = HashMap::new();
    map.insert(
        WILDCARD.to_string(),
        Arc::new(Policy {
            policies: vec!["default".to_string()],
            ..Policy::default()
        }),
    );
    map
}

#[derive(Deserialize)]
struct PolicyDocument {
    data: HashMap<String, Policy>,
}

/// In-memory copy of the policy document stored in Vault.
///
/// Cheap to clone; clones share the same contents. A reload builds the new
/// mapping first and swaps it in under the write lock, so readers see either
/// the old or the new mapping, never a partial one.
#[derive(Debug, Clone)]
pub struct PolicyStore {
    vault: VaultClient,
    policies_path: String,
    entries: Arc<RwLock<HashMap<String, Arc<Policy>>>>,
}

impl PolicyStore {
    /// Create an empty store reading `secret/{policies_path}` from `vault`.
    pub fn new(vault: VaultClient, policies_path: impl Into<String>) -> Self {
        Self {
            vault,
            policies_path: policies_path.into(),
            entries: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn policies_path(&self) -> &str {
        &self.policies_path
    }

    /// Replace the store contents with the policy document from Vault.
    ///
    /// A 404 installs [`builtin_policies`]. On any error the store is left as it was.
    pub async fn load(&self, admin_token: &str) -> Result<(), PolicyLoadError> {
        let response = self.vault.read_secret(&self.policies_path, admin_token).await?;
        let status_code = response.status().as_u16();
        debug!(
            status_code = %status_code,
            path = %self.policies_path,
            "policy response from Vault"
        );

        let mapping: HashMap<String, Arc<Policy>> = match status_code {
            200 => {
                let body = response.bytes().await?;
                let document: PolicyDocument = serde_json::from_slice(&body)?;
                document
                    .data
                    .into_iter()
                    .map(|(key, policy)| (key, Arc::new(policy)))
                    .collect()
            }
            404 => {
                warn!(
                    path = %self.policies_path,
                    "There was no policy in the secret backend; tokens created will have the default vault policy"
                );
                builtin_policies()
            }
            _ => return Err(backend_error(response).await.into()),
        };

        let count = mapping.len();
        *self.entries.write().await = mapping;
        info!(path = %self.policies_path, entries = count, "Policies loaded from Vault");
        Ok(())
    }

    /// Policy for `key`: exact entry, else the wildcard entry, else [`fallback_policy`].
    pub async fn get(&self, key: &str) -> Arc<Policy> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .or_else(|| entries.get(WILDCARD))
            .cloned()
            .unwrap_or_else(fallback_policy)
    }

    /// Number of entries currently cached.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
