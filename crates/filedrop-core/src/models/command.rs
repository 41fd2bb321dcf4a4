use serde::Serialize;

use super::file::{FileRecord, RegisteredFile};
use crate::id::FileId;

/// Core-facing shape of the transport's inbound commands. Parsing command
/// text into this enum is the transport's job.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Deep-link entry; carries an identifier to look up when present.
    Start(Option<String>),
    Delete(Vec<String>),
    Revoke(Vec<String>),
    List,
    ListAll,
}

/// Per-identifier result of a delete request.
///
/// Every affected identifier gets exactly one of these back; a denied or
/// missing identifier never silently disappears from the reply.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    PermissionDenied,
}

/// Per-identifier result of a revoke request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevokeOutcome {
    /// The identifier was rotated; the descriptor carries the new one.
    Revoked(RegisteredFile),
    NotFound,
    PermissionDenied,
}

/// Structured reply to an inbound command. Rendering this into chat text
/// (including chunking of long listings) is the transport's responsibility.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandReply {
    /// `start` with no identifier: nothing to resolve, greet the user.
    Welcome,
    /// `start <id>`: the resolved descriptor, absent when the id is unknown.
    Resolved(Option<RegisteredFile>),
    Deleted(Vec<(String, DeleteOutcome)>),
    Revoked(Vec<(String, RevokeOutcome)>),
    Listing(Vec<(FileId, FileRecord)>),
    FullListing(Vec<(FileId, FileRecord)>),
    /// The requester may not perform the operation at all.
    Denied(String),
    /// The command was syntactically valid but unusable, e.g. an empty
    /// identifier list.
    Rejected(String),
}
