//! Registry service
//!
//! Orchestration layer over the registry store: validates permissions, mints
//! identifiers, mutates the store, and persists after every mutation. All
//! entry points serialize through one lock, so foreground commands and
//! aggregator flush tasks never observe a half-applied mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use filedrop_core::models::{
    Command, CommandReply, DeleteOutcome, FileEvent, FileKind, FileRecord, RegisteredFile,
    RevokeOutcome,
};
use filedrop_core::{AppError, Config, FileId};
use filedrop_store::RegistryStore;

use crate::links::DirectLinkFetcher;

/// Upper bound on re-rolls when a freshly minted identifier collides with an
/// existing entry. With an 8-hex-char suffix a single collision is already a
/// ~1/16^8 event, so hitting this bound means the generator is broken.
const MAX_ID_ATTEMPTS: usize = 16;

#[derive(Clone, Debug)]
pub struct RegistryServiceConfig {
    /// Identity allowed to mutate any record and list the full registry.
    pub owner_identity: String,
    /// Base URL public deep links are built from.
    pub public_link_base: String,
}

impl RegistryServiceConfig {
    pub fn from_config(config: &Config) -> Self {
        RegistryServiceConfig {
            owner_identity: config.owner_identity.clone(),
            public_link_base: config.public_link_base.clone(),
        }
    }
}

pub struct RegistryService {
    store: Mutex<RegistryStore>,
    links: Arc<dyn DirectLinkFetcher>,
    config: RegistryServiceConfig,
}

impl RegistryService {
    pub fn new(
        store: RegistryStore,
        links: Arc<dyn DirectLinkFetcher>,
        config: RegistryServiceConfig,
    ) -> Self {
        RegistryService {
            store: Mutex::new(store),
            links,
            config,
        }
    }

    /// Register one file-submission event.
    ///
    /// The store mutation and the snapshot write happen under the lock; the
    /// best-effort direct-link fetch happens after it, so a slow transport
    /// never stalls other mutations.
    pub async fn register_single(
        &self,
        event: &FileEvent,
        uploader: &str,
        at: DateTime<Utc>,
    ) -> Result<RegisteredFile, AppError> {
        let file = event.payload.provider_file()?;
        let kind = file.kind_or_unknown();

        let (id, record) = {
            let mut store = self.store.lock().await;
            let id = mint_free_id(&store, kind, FileId::generate)?;
            let record = FileRecord {
                provider_file_ref: file.file_ref.clone(),
                kind,
                uploader: uploader.to_string(),
                uploaded_at: at,
            };
            store.set(id.clone(), record.clone());
            if let Err(e) = store.persist().await {
                tracing::error!(error = %e, id = %id, "Failed to persist registry after registration");
            }
            (id, record)
        };

        tracing::info!(id = %id, kind = %kind, uploader = %uploader, "File registered");
        Ok(self.describe(id, &record).await)
    }

    /// Register a sequence of events, preserving input order in the output.
    ///
    /// Each registration persists individually, so a failure partway through
    /// leaves the earlier files durably registered. Per-event errors (e.g. a
    /// malformed payload) are reported in place and do not abort the rest.
    pub async fn register_batch(
        &self,
        events: &[FileEvent],
        uploader: &str,
        at: DateTime<Utc>,
    ) -> Vec<Result<RegisteredFile, AppError>> {
        let mut registered = Vec::with_capacity(events.len());
        for event in events {
            registered.push(self.register_single(event, uploader, at).await);
        }
        registered
    }

    /// Register a flushed upload group. Uploader identity and timestamp for
    /// the whole batch come from the final event of the group.
    pub async fn register_group(
        &self,
        events: Vec<FileEvent>,
    ) -> Vec<Result<RegisteredFile, AppError>> {
        let Some(last) = events.last() else {
            return Vec::new();
        };
        let uploader = last.sender.clone();
        let at = last.occurred_at;
        self.register_batch(&events, &uploader, at).await
    }

    /// Look up an identifier and return its full descriptor, or `None` when
    /// the identifier is absent.
    pub async fn lookup(&self, id: &FileId) -> Option<RegisteredFile> {
        let record = {
            let store = self.store.lock().await;
            store.get(id).cloned()
        }?;
        Some(self.describe(id.clone(), &record).await)
    }

    pub async fn delete_by_id(&self, id: &FileId, requester: &str) -> DeleteOutcome {
        let mut store = self.store.lock().await;
        let Some(record) = store.get(id) else {
            return DeleteOutcome::NotFound;
        };
        if !self.is_permitted(record, requester) {
            tracing::info!(id = %id, requester = %requester, "Delete denied");
            return DeleteOutcome::PermissionDenied;
        }

        store.remove(id);
        if let Err(e) = store.persist().await {
            tracing::error!(error = %e, id = %id, "Failed to persist registry after delete");
        }
        tracing::info!(id = %id, requester = %requester, "File deleted");
        DeleteOutcome::Deleted
    }

    /// Delete several identifiers; each is checked and reported on its own,
    /// so one denied or missing identifier never aborts the rest.
    pub async fn delete_many(
        &self,
        ids: &[String],
        requester: &str,
    ) -> Vec<(String, DeleteOutcome)> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.delete_by_id(&FileId::from(id.as_str()), requester).await;
            outcomes.push((id.clone(), outcome));
        }
        outcomes
    }

    /// Rotate the identifier of an existing record. The record keeps its
    /// provider handle, kind, uploader, and upload time; the old identifier
    /// becomes permanently invalid.
    pub async fn revoke_id(
        &self,
        id: &FileId,
        requester: &str,
    ) -> Result<RevokeOutcome, AppError> {
        let (new_id, record) = {
            let mut store = self.store.lock().await;
            let Some(record) = store.get(id).cloned() else {
                return Ok(RevokeOutcome::NotFound);
            };
            if !self.is_permitted(&record, requester) {
                tracing::info!(id = %id, requester = %requester, "Revoke denied");
                return Ok(RevokeOutcome::PermissionDenied);
            }

            let new_id = mint_free_id(&store, record.kind, FileId::generate)?;
            store.remove(id);
            store.set(new_id.clone(), record.clone());
            if let Err(e) = store.persist().await {
                tracing::error!(error = %e, id = %id, "Failed to persist registry after revoke");
            }
            (new_id, record)
        };

        tracing::info!(old_id = %id, new_id = %new_id, requester = %requester, "Identifier revoked");
        Ok(RevokeOutcome::Revoked(self.describe(new_id, &record).await))
    }

    pub async fn revoke_many(
        &self,
        ids: &[String],
        requester: &str,
    ) -> Result<Vec<(String, RevokeOutcome)>, AppError> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.revoke_id(&FileId::from(id.as_str()), requester).await?;
            outcomes.push((id.clone(), outcome));
        }
        Ok(outcomes)
    }

    /// Every record uploaded by the requester, in store iteration order.
    pub async fn list_for(&self, requester: &str) -> Vec<(FileId, FileRecord)> {
        let store = self.store.lock().await;
        store.list(|_, record| record.uploader == requester)
    }

    /// Every record in the registry; owner only.
    pub async fn list_all(&self, requester: &str) -> Result<Vec<(FileId, FileRecord)>, AppError> {
        if requester != self.config.owner_identity {
            return Err(AppError::PermissionDenied(
                "only the owner may list the full registry".to_string(),
            ));
        }
        let store = self.store.lock().await;
        Ok(store.list(|_, _| true))
    }

    /// Dispatch one inbound command for the given requester and produce its
    /// structured reply. Every affected identifier yields an explicit entry
    /// in the reply; nothing is dropped silently.
    pub async fn handle(
        &self,
        command: Command,
        requester: &str,
    ) -> Result<CommandReply, AppError> {
        match command {
            Command::Start(None) => Ok(CommandReply::Welcome),
            Command::Start(Some(id)) => Ok(CommandReply::Resolved(
                self.lookup(&FileId::from(id.as_str())).await,
            )),
            Command::Delete(ids) if ids.is_empty() => Ok(CommandReply::Rejected(
                "provide at least one file ID to delete".to_string(),
            )),
            Command::Delete(ids) => {
                Ok(CommandReply::Deleted(self.delete_many(&ids, requester).await))
            }
            Command::Revoke(ids) if ids.is_empty() => Ok(CommandReply::Rejected(
                "provide at least one file ID to revoke".to_string(),
            )),
            Command::Revoke(ids) => Ok(CommandReply::Revoked(
                self.revoke_many(&ids, requester).await?,
            )),
            Command::List => Ok(CommandReply::Listing(self.list_for(requester).await)),
            Command::ListAll => match self.list_all(requester).await {
                Ok(entries) => Ok(CommandReply::FullListing(entries)),
                Err(AppError::PermissionDenied(reason)) => Ok(CommandReply::Denied(reason)),
                Err(e) => Err(e),
            },
        }
    }

    fn is_permitted(&self, record: &FileRecord, requester: &str) -> bool {
        requester == record.uploader || requester == self.config.owner_identity
    }

    fn public_link(&self, id: &FileId) -> String {
        format!(
            "{}?start={}",
            self.config.public_link_base.trim_end_matches('/'),
            id
        )
    }

    async fn describe(&self, id: FileId, record: &FileRecord) -> RegisteredFile {
        let public_link = self.public_link(&id);
        let direct_link = self.links.fetch_direct_url(&record.provider_file_ref).await;
        RegisteredFile {
            id,
            kind: record.kind,
            uploader: record.uploader.clone(),
            uploaded_at: record.uploaded_at,
            public_link,
            direct_link,
        }
    }
}

/// Mint an identifier that is free in the given store, re-rolling on
/// collision instead of overwriting the colliding record.
fn mint_free_id<G>(
    store: &RegistryStore,
    kind: FileKind,
    mut generate: G,
) -> Result<FileId, AppError>
where
    G: FnMut(FileKind) -> FileId,
{
    for _ in 0..MAX_ID_ATTEMPTS {
        let id = generate(kind);
        if !store.contains(&id) {
            return Ok(id);
        }
        tracing::warn!(id = %id, "Generated identifier collides with an existing entry, re-rolling");
    }
    Err(AppError::IdSpaceExhausted(kind.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::NoDirectLinks;
    use filedrop_core::models::{FilePayload, ProviderFile};
    use filedrop_store::{JsonSnapshot, SnapshotStore};
    use tempfile::{tempdir, TempDir};

    fn test_config() -> RegistryServiceConfig {
        RegistryServiceConfig {
            owner_identity: "admin".to_string(),
            public_link_base: "https://t.me/testbot".to_string(),
        }
    }

    async fn service_in(dir: &TempDir) -> RegistryService {
        let snapshot = Arc::new(JsonSnapshot::new(dir.path().join("registry.json")));
        let store = RegistryStore::load(snapshot).await;
        RegistryService::new(store, Arc::new(NoDirectLinks), test_config())
    }

    fn document_event(file_ref: &str, sender: &str) -> FileEvent {
        FileEvent {
            payload: FilePayload::Document(ProviderFile {
                file_ref: file_ref.to_string(),
                kind: Some(FileKind::Document),
            }),
            group_key: None,
            sender: sender.to_string(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn register_single_creates_one_entry() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        assert!(registered.id.as_str().starts_with("document("));
        assert_eq!(registered.kind, FileKind::Document);
        assert_eq!(registered.uploader, "alice");
        assert_eq!(
            registered.public_link,
            format!("https://t.me/testbot?start={}", registered.id)
        );
        assert!(registered.direct_link.is_none());

        let all = service.list_all("admin").await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn untagged_provider_file_registers_as_unknown() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let event = FileEvent {
            payload: FilePayload::Audio(ProviderFile {
                file_ref: "ref-2".to_string(),
                kind: None,
            }),
            group_key: None,
            sender: "alice".to_string(),
            occurred_at: Utc::now(),
        };

        let registered = service
            .register_single(&event, "alice", Utc::now())
            .await
            .unwrap();
        assert_eq!(registered.kind, FileKind::Unknown);
        assert!(registered.id.as_str().starts_with("unknown("));
    }

    #[tokio::test]
    async fn payload_without_provider_file_is_rejected() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let event = FileEvent {
            payload: FilePayload::Photo(vec![]),
            group_key: None,
            sender: "alice".to_string(),
            occurred_at: Utc::now(),
        };

        let result = service.register_single(&event, "alice", Utc::now()).await;
        assert!(matches!(result, Err(AppError::MalformedEvent(_))));
        assert!(service.list_all("admin").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn batch_preserves_order_and_registers_around_failures() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let events = vec![
            document_event("ref-1", "alice"),
            FileEvent {
                payload: FilePayload::Photo(vec![]),
                group_key: None,
                sender: "alice".to_string(),
                occurred_at: Utc::now(),
            },
            document_event("ref-3", "alice"),
        ];

        let results = service.register_batch(&events, "alice", Utc::now()).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());

        // the malformed event did not abort the rest
        assert_eq!(service.list_all("admin").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent_per_outcome() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        assert_eq!(
            service.delete_by_id(&registered.id, "alice").await,
            DeleteOutcome::Deleted
        );
        assert_eq!(
            service.delete_by_id(&registered.id, "alice").await,
            DeleteOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn only_uploader_or_owner_may_delete() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let first = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();
        let second = service
            .register_single(&document_event("ref-2", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        assert_eq!(
            service.delete_by_id(&first.id, "mallory").await,
            DeleteOutcome::PermissionDenied
        );
        assert_eq!(
            service.delete_by_id(&first.id, "alice").await,
            DeleteOutcome::Deleted
        );
        assert_eq!(
            service.delete_by_id(&second.id, "admin").await,
            DeleteOutcome::Deleted
        );
    }

    #[tokio::test]
    async fn delete_many_reports_each_identifier() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        let outcomes = service
            .delete_many(
                &[
                    registered.id.as_str().to_string(),
                    "document(00000000)".to_string(),
                ],
                "alice",
            )
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].1, DeleteOutcome::Deleted);
        assert_eq!(outcomes[1].1, DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn revoke_rotates_the_identifier_and_keeps_the_record() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let uploaded_at = Utc::now();
        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", uploaded_at)
            .await
            .unwrap();

        let outcome = service.revoke_id(&registered.id, "alice").await.unwrap();
        let RevokeOutcome::Revoked(renewed) = outcome else {
            panic!("expected a successful revoke");
        };

        assert_ne!(renewed.id, registered.id);
        assert_eq!(renewed.kind, FileKind::Document);
        assert_eq!(renewed.uploader, "alice");
        assert_eq!(renewed.uploaded_at, uploaded_at);

        assert!(service.lookup(&registered.id).await.is_none());
        assert!(service.lookup(&renewed.id).await.is_some());
    }

    #[tokio::test]
    async fn revoke_enforces_ownership_and_existence() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        assert_eq!(
            service.revoke_id(&registered.id, "mallory").await.unwrap(),
            RevokeOutcome::PermissionDenied
        );
        assert_eq!(
            service
                .revoke_id(&FileId::from("photo(00000000)"), "alice")
                .await
                .unwrap(),
            RevokeOutcome::NotFound
        );
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_requester() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();
        service
            .register_single(&document_event("ref-2", "bob"), "bob", Utc::now())
            .await
            .unwrap();

        let alices = service.list_for("alice").await;
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].1.uploader, "alice");

        assert!(service.list_for("carol").await.is_empty());

        assert!(matches!(
            service.list_all("alice").await,
            Err(AppError::PermissionDenied(_))
        ));
        assert_eq!(service.list_all("admin").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn commands_dispatch_to_the_matching_operation() {
        let dir = tempdir().unwrap();
        let service = service_in(&dir).await;

        let registered = service
            .register_single(&document_event("ref-1", "alice"), "alice", Utc::now())
            .await
            .unwrap();

        assert_eq!(
            service.handle(Command::Start(None), "alice").await.unwrap(),
            CommandReply::Welcome
        );

        let reply = service
            .handle(
                Command::Start(Some(registered.id.as_str().to_string())),
                "bob",
            )
            .await
            .unwrap();
        let CommandReply::Resolved(Some(found)) = reply else {
            panic!("expected the identifier to resolve");
        };
        assert_eq!(found.id, registered.id);

        assert_eq!(
            service.handle(Command::Delete(vec![]), "alice").await.unwrap(),
            CommandReply::Rejected("provide at least one file ID to delete".to_string())
        );

        let reply = service.handle(Command::ListAll, "bob").await.unwrap();
        assert!(matches!(reply, CommandReply::Denied(_)));

        let reply = service
            .handle(
                Command::Delete(vec![registered.id.as_str().to_string()]),
                "alice",
            )
            .await
            .unwrap();
        assert_eq!(
            reply,
            CommandReply::Deleted(vec![(
                registered.id.as_str().to_string(),
                DeleteOutcome::Deleted
            )])
        );
    }

    #[tokio::test]
    async fn minting_re_rolls_on_collision() {
        let dir = tempdir().unwrap();
        let snapshot = Arc::new(JsonSnapshot::new(dir.path().join("registry.json")));
        let taken = FileId::from("document(aaaa1111)");
        snapshot
            .persist(&[(
                taken.clone(),
                FileRecord {
                    provider_file_ref: "ref-1".to_string(),
                    kind: FileKind::Document,
                    uploader: "alice".to_string(),
                    uploaded_at: Utc::now(),
                },
            )])
            .await
            .unwrap();
        let store = RegistryStore::load(snapshot).await;

        // first roll collides, second is free
        let mut rolls = vec![FileId::from("document(bbbb2222)"), taken.clone()];
        let minted = mint_free_id(&store, FileKind::Document, |_| rolls.pop().unwrap()).unwrap();
        assert_eq!(minted, FileId::from("document(bbbb2222)"));
    }

    #[tokio::test]
    async fn minting_gives_up_when_every_roll_collides() {
        let dir = tempdir().unwrap();
        let snapshot = Arc::new(JsonSnapshot::new(dir.path().join("registry.json")));
        let taken = FileId::from("document(aaaa1111)");
        snapshot
            .persist(&[(
                taken.clone(),
                FileRecord {
                    provider_file_ref: "ref-1".to_string(),
                    kind: FileKind::Document,
                    uploader: "alice".to_string(),
                    uploaded_at: Utc::now(),
                },
            )])
            .await
            .unwrap();
        let store = RegistryStore::load(snapshot).await;

        let result = mint_free_id(&store, FileKind::Document, |_| taken.clone());
        assert!(matches!(result, Err(AppError::IdSpaceExhausted(_))));
    }
}
