use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::policy::PolicyStore;
use crate::unsealer::Unsealer;
use crate::vault::VaultClient;

pub const ADDRESS_ENV: &str = "VAULT_ADDR";
pub const POLICIES_PATH_ENV: &str = "GATEKEEPER_POLICIES_PATH";

fn default_address() -> String {
    "http://127.0.0.1:8200".to_string()
}

fn default_policies_path() -> String {
    "gatekeeper".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    #[serde(default = "default_address")]
    pub address: String,
    /// Path under `secret/` holding the policy document.
    #[serde(default = "default_policies_path")]
    pub policies_path: String,
    /// Per-request timeout; none when absent.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            policies_path: default_policies_path(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,
    /// Credential used by `unseal`; tagged by its `method` field.
    #[serde(default)]
    pub unsealer: Option<Unsealer>,
}

impl Config {
    /// Read a JSON config file, then apply environment overrides.
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let mut cfg: Config = serde_json::from_str(&raw).context("parsing JSON")?;
        cfg.apply_env();
        Ok(cfg)
    }

    /// Environment variables:
    /// - `VAULT_ADDR`: Vault base URL
    /// - `GATEKEEPER_POLICIES_PATH`: secret path of the policy document
    pub fn apply_env(&mut self) {
        if let Ok(address) = std::env::var(ADDRESS_ENV) {
            self.vault.address = address;
        }
        if let Ok(path) = std::env::var(POLICIES_PATH_ENV) {
            self.vault.policies_path = path;
        }
    }

    pub fn vault_client(&self) -> Result<VaultClient> {
        let timeout = self.vault.timeout_secs.map(Duration::from_secs);
        VaultClient::with_timeout(&self.vault.address, timeout).context("creating HTTP client")
    }

    pub fn policy_store(&self) -> Result<PolicyStore> {
        Ok(PolicyStore::new(self.vault_client()?, &self.vault.policies_path))
    }
}
