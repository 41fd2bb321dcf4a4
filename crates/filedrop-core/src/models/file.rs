use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::FileId;

/// File kind enum
///
/// `Unknown` covers provider files that carry no kind tag; such files are
/// still registered, their identifier is simply prefixed with `unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Photo,
    Video,
    Audio,
    Unknown,
}

impl FileKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Document => "document",
            FileKind::Photo => "photo",
            FileKind::Video => "video",
            FileKind::Audio => "audio",
            FileKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registered file record
///
/// A record never exists without an owning identifier; the pair is the unit
/// the registry stores and the snapshot serializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Opaque handle usable to fetch the file bytes from the transport.
    pub provider_file_ref: String,
    pub kind: FileKind,
    /// Stable identity of the uploading user (username or numeric-id fallback,
    /// resolved by the transport before events reach the core).
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Descriptor returned for every successful registration or lookup.
///
/// The transport collaborator renders this into a human-readable reply;
/// the core only guarantees the fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegisteredFile {
    pub id: FileId,
    pub kind: FileKind,
    pub uploader: String,
    pub uploaded_at: DateTime<Utc>,
    pub public_link: String,
    /// Best-effort direct download URL; absent when the transport cannot
    /// produce one.
    pub direct_link: Option<String>,
}
