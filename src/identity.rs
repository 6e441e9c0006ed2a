//! Local identity management.
//!
//! Every client carries one persisted pseudo-user that attributes task
//! creations, updates, and memberships. Resolution order:
//! 1) CLI --user (explicit display name)
//! 2) DG_USER environment variable
//! 3) Persisted identity in `<data-dir>/identity.json`, created on first use
//!
//! A named override maps to a stable id (uuid v5 of the name), so the same
//! `--user alice` is the same member across invocations. The persisted
//! identity is immutable after creation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::storage::Storage;

/// A local pseudo-user: stable id plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
}

impl Identity {
    /// Identity with an id derived deterministically from the name.
    fn named(name: &str) -> Self {
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string(),
            name: name.to_string(),
        }
    }

    /// Freshly generated identity with a random id.
    fn generate(config: &Config) -> Self {
        let id = Uuid::new_v4().to_string();
        let name = match &config.identity.default_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => format!("user_{}", &id[..4]),
        };
        Self { id, name }
    }
}

/// Resolve the current user, creating and persisting one if absent.
///
/// Idempotent: repeated calls within a client return the same identity.
/// The only side effect is the first-call persistence write.
pub fn current_user(
    storage: &Storage,
    config: &Config,
    override_name: Option<&str>,
) -> Result<Identity> {
    if let Some(name) = non_empty(override_name) {
        return Ok(Identity::named(name));
    }

    let path = storage.identity_file();
    if path.exists() {
        return storage.read_json(&path);
    }

    let identity = Identity::generate(config);
    storage.write_json(&path, &identity)?;
    Ok(identity)
}

fn non_empty(input: Option<&str>) -> Option<&str> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
