//! Credential lookup for the Gemini backend.
//!
//! The API key is resolved once at startup, in order:
//!
//! 1. the secret store, a TOML file with a top-level `GEMINI_API_KEY` entry
//!    (default `.flashgen/secrets.toml`);
//! 2. the `GEMINI_API_KEY` environment variable (after an optional `.env`
//!    file has been loaded with [`load_dotenv`]).
//!
//! The first non-empty value wins. Finding nothing is not an error at this
//! point: a request without a credential fails with
//! [`crate::FlashgenError::CredentialMissing`] before doing any work.

use crate::config::ApiKey;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

/// Default location of the secret store, relative to the working directory.
pub const DEFAULT_SECRETS_PATH: &str = ".flashgen/secrets.toml";

/// Where a resolved key came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    SecretStore(PathBuf),
    Environment,
}

/// A resolved API key together with its origin.
#[derive(Debug, Clone)]
pub struct ResolvedCredential {
    pub key: ApiKey,
    pub source: CredentialSource,
}

#[derive(Debug, Deserialize)]
struct SecretStore {
    #[serde(rename = "GEMINI_API_KEY")]
    gemini_api_key: Option<String>,
}

/// Load a `.env` file from the working directory into the process
/// environment, if one exists.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Ignoring unreadable .env file: {}", e),
    }
}

/// Resolve the API key from the secret store at `secrets_path`, then from
/// the `GEMINI_API_KEY` environment variable.
pub fn resolve_api_key(secrets_path: &Path) -> Option<ResolvedCredential> {
    resolve_from(secrets_path, std::env::var(API_KEY_VAR).ok())
}

fn resolve_from(secrets_path: &Path, env_value: Option<String>) -> Option<ResolvedCredential> {
    if let Some(key) = read_secret_store(secrets_path) {
        debug!("Using API key from secret store {}", secrets_path.display());
        return Some(ResolvedCredential {
            key,
            source: CredentialSource::SecretStore(secrets_path.to_path_buf()),
        });
    }

    let key = env_value.and_then(ApiKey::new)?;
    debug!("Using API key from {}", API_KEY_VAR);
    Some(ResolvedCredential {
        key,
        source: CredentialSource::Environment,
    })
}

/// Read the key from a secrets file. A missing file is silent; a broken one
/// is logged and skipped.
fn read_secret_store(path: &Path) -> Option<ApiKey> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!("Skipping secret store {}: {}", path.display(), e);
            return None;
        }
    };

    match toml::from_str::<SecretStore>(&raw) {
        Ok(store) => store.gemini_api_key.and_then(ApiKey::new),
        Err(e) => {
            warn!("Skipping secret store {}: {}", path.display(), e);
            None
        }
    }
}

/// Hint shown when no Gemini key could be found.
pub fn missing_key_hint() -> String {
    format!(
        "Set {API_KEY_VAR} in the environment (or a .env file), \
         or add {API_KEY_VAR} = \"...\" to {DEFAULT_SECRETS_PATH}."
    )
}
