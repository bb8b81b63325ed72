//! Integrity sealing over submitted application content.
//!
//! The seal is a digest over a canonical serialization of
//! [`ApplicationContent`]: serialize to JSON, sort every object key
//! recursively, render without whitespace, then hash. Two records with equal
//! content always produce the same digest, and any later edit to a sealed
//! field changes it. Verification recomputes the digest and compares; it
//! never rewrites the stored seal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::domain::ApplicationContent;

/// Digest scheme tag mixed into the hash input and recorded on every seal.
pub const SEAL_SCHEME: &str = "loan-seal-sha256-v1";

/// Errors raised while computing a seal digest.
#[derive(Debug, thiserror::Error)]
pub enum SealError {
    #[error("application content could not be canonicalized: {0}")]
    Canonicalize(#[from] serde_json::Error),
}

/// Write-once integrity evidence attached to a submitted application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegritySeal {
    pub hash: String,
    pub scheme: String,
    pub sealed_at: DateTime<Utc>,
}

/// Outcome of checking a sealed record against its stored digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub valid: bool,
    pub recorded_hash: String,
    pub computed_hash: String,
}

fn canonicalize_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<String> = map.keys().cloned().collect();
            keys.sort();

            let mut ordered = serde_json::Map::new();
            for key in keys {
                if let Some(mut value) = map.remove(&key) {
                    canonicalize_json(&mut value);
                    ordered.insert(key, value);
                }
            }

            *map = ordered;
        }
        serde_json::Value::Array(items) => {
            for item in items {
                canonicalize_json(item);
            }
        }
        _ => {}
    }
}

/// Computes and checks integrity seals.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntegritySealer;

impl IntegritySealer {
    /// Canonical byte form of the sealed content, independent of struct
    /// field order or serializer whitespace.
    pub fn canonical_payload(&self, content: &ApplicationContent) -> Result<String, SealError> {
        let mut value = serde_json::to_value(content)?;
        canonicalize_json(&mut value);
        Ok(serde_json::to_string(&value)?)
    }

    pub fn digest(&self, content: &ApplicationContent) -> Result<String, SealError> {
        let canonical = self.canonical_payload(content)?;
        let mut hasher = Sha256::new();
        hasher.update(SEAL_SCHEME.as_bytes());
        hasher.update(b"\n");
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }

    pub fn seal(
        &self,
        content: &ApplicationContent,
        sealed_at: DateTime<Utc>,
    ) -> Result<IntegritySeal, SealError> {
        Ok(IntegritySeal {
            hash: self.digest(content)?,
            scheme: SEAL_SCHEME.to_string(),
            sealed_at,
        })
    }

    /// Recomputes the digest for `content` and compares it to the stored
    /// seal. A mismatch is reported, never repaired.
    pub fn verify(
        &self,
        content: &ApplicationContent,
        seal: &IntegritySeal,
    ) -> Result<IntegrityReport, SealError> {
        let computed = self.digest(content)?;
        Ok(IntegrityReport {
            valid: computed == seal.hash,
            recorded_hash: seal.hash.clone(),
            computed_hash: computed,
        })
    }
}
