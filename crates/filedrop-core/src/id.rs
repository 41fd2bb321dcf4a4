//! File identifier generation
//!
//! Identifiers are human-scannable and collision-resistant, not guaranteed
//! unique: `"<kind>(<8 hex chars>)"`, with the suffix drawn from a v4 UUID.
//! Callers that insert into a registry re-roll on a detected collision.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::FileKind;

/// Length of the random hex suffix inside the parentheses.
pub const ID_SUFFIX_LEN: usize = 8;

/// Opaque registry identifier, e.g. `document(3f9a1c2e)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Mint a fresh identifier for the given kind.
    pub fn generate(kind: FileKind) -> Self {
        let random = Uuid::new_v4().simple().to_string();
        FileId(format!("{}({})", kind, &random[..ID_SUFFIX_LEN]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        FileId(s)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        FileId(s.to_string())
    }
}
