use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::file::FileKind;
use crate::error::AppError;

/// A single file as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderFile {
    /// Opaque handle usable to fetch the file bytes from the transport.
    pub file_ref: String,
    /// Kind tag as declared by the provider; files without one register
    /// as `unknown`.
    pub kind: Option<FileKind>,
}

impl ProviderFile {
    pub fn kind_or_unknown(&self) -> FileKind {
        self.kind.unwrap_or(FileKind::Unknown)
    }
}

/// The kind-specific payload of a submission event.
///
/// A photo arrives as a sequence of size variants; registration uses the
/// first. The other kinds carry exactly one provider file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "slot", rename_all = "lowercase")]
pub enum FilePayload {
    Document(ProviderFile),
    Photo(Vec<ProviderFile>),
    Video(ProviderFile),
    Audio(ProviderFile),
}

impl FilePayload {
    /// Build a payload from the transport's four optional message slots.
    ///
    /// Slots are probed in document, photo, video, audio order; an empty
    /// photo slot falls through to the later slots. An event with no
    /// recognizable payload is rejected.
    pub fn from_slots(
        document: Option<ProviderFile>,
        photo: Option<Vec<ProviderFile>>,
        video: Option<ProviderFile>,
        audio: Option<ProviderFile>,
    ) -> Result<Self, AppError> {
        if let Some(file) = document {
            return Ok(FilePayload::Document(file));
        }
        if let Some(sizes) = photo {
            if !sizes.is_empty() {
                return Ok(FilePayload::Photo(sizes));
            }
        }
        if let Some(file) = video {
            return Ok(FilePayload::Video(file));
        }
        if let Some(file) = audio {
            return Ok(FilePayload::Audio(file));
        }
        Err(AppError::MalformedEvent(
            "submission carries no document, photo, video, or audio payload".to_string(),
        ))
    }

    /// The provider file this payload registers.
    ///
    /// Fails only for a photo payload constructed with no size variants.
    pub fn provider_file(&self) -> Result<&ProviderFile, AppError> {
        match self {
            FilePayload::Document(file) | FilePayload::Video(file) | FilePayload::Audio(file) => {
                Ok(file)
            }
            FilePayload::Photo(sizes) => sizes.first().ok_or_else(|| {
                AppError::MalformedEvent("photo payload has no size variants".to_string())
            }),
        }
    }
}

/// One inbound file-submission event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    pub payload: FilePayload,
    /// Set when the transport delivers this file as part of a logical
    /// multi-file submission; exact string equality scopes the group.
    pub group_key: Option<String>,
    /// Stable identity of the sender (username or numeric-id fallback).
    pub sender: String,
    pub occurred_at: DateTime<Utc>,
}
