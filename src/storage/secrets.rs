//! Provider credential lookup.
//!
//! When `VAULT_ADDR` and `VAULT_TOKEN` are set, keys are read from the Vault
//! KV v2 secret `secret/data/codie`. A missing key or any Vault error falls
//! back to the environment variable of the same name. Results (including
//! misses) are memoized per key for the resolver's lifetime.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use reqwest::Client;
use serde_json::Value;

use crate::core::http::{CONNECT_TIMEOUT, SECRET_TIMEOUT, build_client, read_json, transport_error};
use crate::error::Result;

/// Environment variable holding the Vault base URL.
pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";
/// Environment variable holding the Vault token.
pub const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";

/// KV v2 path read for every key.
const VAULT_SECRET_PATH: &str = "v1/secret/data/codie";

pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Vault connection settings.
#[derive(Clone)]
pub struct VaultSettings {
    pub addr: String,
    pub token: String,
}

impl std::fmt::Debug for VaultSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultSettings")
            .field("addr", &self.addr)
            .field("token", &"<redacted>")
            .finish()
    }
}

pub struct SecretResolver {
    vault: Option<(VaultSettings, Client)>,
    env: EnvLookup,
    memo: Mutex<HashMap<String, Option<String>>>,
}

impl SecretResolver {
    /// Resolver configured from `VAULT_ADDR` / `VAULT_TOKEN`, falling back
    /// to process environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let env: EnvLookup = Arc::new(|key: &str| std::env::var(key).ok());
        let vault = match (env(ENV_VAULT_ADDR), env(ENV_VAULT_TOKEN)) {
            (Some(addr), Some(token)) if !addr.is_empty() && !token.is_empty() => {
                Some(VaultSettings { addr, token })
            }
            _ => None,
        };
        Self::new(vault, env)
    }

    /// Resolver with explicit Vault settings and environment lookup.
    #[must_use]
    pub fn new(vault: Option<VaultSettings>, env: EnvLookup) -> Self {
        let vault = vault.and_then(|settings| match build_client(SECRET_TIMEOUT, CONNECT_TIMEOUT) {
            Ok(client) => Some((settings, client)),
            Err(e) => {
                tracing::warn!(error = %e, "Vault client unavailable, using environment only");
                None
            }
        });
        Self {
            vault,
            env,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver reading only from a fixed map.
    #[must_use]
    pub fn from_map(values: HashMap<String, String>) -> Self {
        Self::new(None, Arc::new(move |key: &str| values.get(key).cloned()))
    }

    /// Whether Vault lookups are configured.
    #[must_use]
    pub const fn uses_vault(&self) -> bool {
        self.vault.is_some()
    }

    /// Resolve a secret. Empty values count as missing.
    pub async fn get(&self, key: &str) -> Option<String> {
        let cached = self.memo_lock().get(key).cloned();
        if let Some(cached) = cached {
            return cached;
        }

        let mut value = None;
        if let Some((settings, client)) = &self.vault {
            match read_vault_key(client, settings, key).await {
                Ok(Some(found)) => {
                    tracing::debug!(key, "Secret resolved from Vault");
                    value = Some(found);
                }
                Ok(None) => tracing::debug!(key, "Secret absent in Vault"),
                Err(e) => tracing::warn!(key, error = %e, "Vault lookup failed, using environment"),
            }
        }
        if value.is_none() {
            value = (self.env)(key).filter(|v| !v.is_empty());
        }

        self.memo_lock().insert(key.to_string(), value.clone());
        value
    }

    fn memo_lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Option<String>>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SecretResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretResolver")
            .field("vault", &self.vault.as_ref().map(|(s, _)| s))
            .finish_non_exhaustive()
    }
}

async fn read_vault_key(client: &Client, settings: &VaultSettings, key: &str) -> Result<Option<String>> {
    let url = format!("{}/{VAULT_SECRET_PATH}", settings.addr.trim_end_matches('/'));
    let response = client
        .get(&url)
        .header("X-Vault-Token", &settings.token)
        .send()
        .await
        .map_err(|e| transport_error("vault", SECRET_TIMEOUT, e))?;
    let body = read_json("vault", "Vault", response).await?;

    Ok(body
        .pointer("/data/data")
        .and_then(|data| data.get(key))
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string))
}
