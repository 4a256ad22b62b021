//! Identifier generation.
//!
//! Identifiers are random (version 4) UUIDs built from OS randomness, so a
//! failing entropy source surfaces as an error instead of a panic.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{PipelineError, PipelineResult};

/// Generate a fresh random identifier.
pub fn generate_id() -> PipelineResult<Uuid> {
    let mut bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| PipelineError::IdentifierGeneration(e.to_string()))?;
    Ok(uuid::Builder::from_random_bytes(bytes).into_uuid())
}

/// Identifier of one collection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate the identifier for a new run.
    pub fn generate() -> PipelineResult<Self> {
        generate_id().map(RunId)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for RunId {
    fn from(id: Uuid) -> Self {
        RunId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_v4() {
        let id = generate_id().unwrap();
        assert_eq!(id.get_version_num(), 4);
        assert_eq!(id.get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn test_run_ids_do_not_collide() {
        // 122 random bits: a collision among 50k samples has probability ~1e-28.
        let ids: HashSet<RunId> = (0..50_000).map(|_| RunId::generate().unwrap()).collect();
        assert_eq!(ids.len(), 50_000);
    }

    #[test]
    fn test_run_id_serializes_as_plain_uuid() {
        let id = RunId::generate().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }
}
