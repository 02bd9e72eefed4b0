//! Service layer: a sled-backed caller of the engine
//!
//! Persists document state, checks permissions through an [`Authorizer`],
//! commits each transition together with its journal entry in one sled
//! transaction and then runs the transition's hooks in order.
use super::document::DocumentType;
use super::engine::LifecycleEngine;
use super::error::ServiceError;
use super::hooks::{HookContext, HookDispatcher, HookReport};
use super::permission::Authorizer;
use super::request::{TimeStamp, TransitionRequest, TransitionResult};
use super::utils;
use chrono::Utc;
use sled::transaction::{ConflictableTransactionError, TransactionError, Transactional};
use std::sync::Arc;

#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct DocumentRecord {
    #[n(0)]
    pub id: String, // bech32 over uuid7, prefixed with the document type
    #[n(1)]
    pub doc_type: DocumentType,
    #[n(2)]
    pub state: String,
    #[n(3)]
    pub version: u64, // bumped on every committed transition
    #[n(4)]
    pub created_by: String,
    #[n(5)]
    pub updated_at: TimeStamp<Utc>,
}

/// One committed transition, keyed by the request id.
#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct JournalEntry {
    #[n(0)]
    pub request: TransitionRequest,
    #[n(1)]
    pub result: TransitionResult,
    #[n(2)]
    pub version: u64,
    #[n(3)]
    pub catalog_fingerprint: String,
    #[n(4)]
    pub recorded_at: TimeStamp<Utc>,
}

#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub record: DocumentRecord,
    pub result: TransitionResult,
    pub hooks: Vec<HookReport>,
    // the request id was already journaled; nothing was written or run
    pub replayed: bool,
}

enum Commit {
    Applied(DocumentRecord),
    AlreadyApplied,
}

pub struct DocumentService<A: Authorizer> {
    instance: Arc<sled::Db>,
    documents: sled::Tree,
    journal: sled::Tree,
    history: sled::Tree, // "{document_id}/{version}" -> request id
    engine: Arc<LifecycleEngine>,
    authorizer: A,
    dispatcher: HookDispatcher,
    catalog_fingerprint: String,
}

fn decode<T: for<'b> minicbor::Decode<'b, ()>>(bytes: &[u8]) -> Result<T, ServiceError> {
    minicbor::decode(bytes).map_err(|e| ServiceError::Codec(e.to_string()))
}

fn encode<T: minicbor::Encode<()>>(value: &T) -> Result<Vec<u8>, ServiceError> {
    minicbor::to_vec(value).map_err(|e| ServiceError::Codec(e.to_string()))
}

fn abort<T>(error: ServiceError) -> Result<T, ConflictableTransactionError<ServiceError>> {
    Err(ConflictableTransactionError::Abort(error))
}

// reason, metadata and timestamps may differ between retries of one request
fn same_transition(stored: &TransitionRequest, incoming: &TransitionRequest) -> bool {
    stored.doc_type == incoming.doc_type
        && stored.document_id == incoming.document_id
        && stored.from_state == incoming.from_state
        && stored.to_state == incoming.to_state
        && stored.user_id == incoming.user_id
}

fn history_key(document_id: &str, version: u64) -> String {
    // zero padded so lexicographic order is version order
    format!("{}/{:020}", document_id, version)
}

impl<A: Authorizer> DocumentService<A> {
    /// Fails if the dispatcher is missing a handler for any hook the
    /// engine's catalog can produce.
    pub fn new(
        instance: Arc<sled::Db>,
        engine: Arc<LifecycleEngine>,
        authorizer: A,
        dispatcher: HookDispatcher,
    ) -> anyhow::Result<Self> {
        dispatcher.verify(engine.catalog())?;
        let catalog_fingerprint = engine.catalog().fingerprint()?;

        Ok(Self {
            documents: instance.open_tree("documents")?,
            journal: instance.open_tree("journal")?,
            history: instance.open_tree("history")?,
            instance,
            engine,
            authorizer,
            dispatcher,
            catalog_fingerprint,
        })
    }

    pub fn engine(&self) -> &LifecycleEngine {
        &self.engine
    }

    /// Create a document in its type's initial state
    pub fn create_document(
        &self,
        doc_type: DocumentType,
        user_id: &str,
    ) -> anyhow::Result<DocumentRecord> {
        let record = DocumentRecord {
            id: utils::new_document_id(doc_type)?,
            doc_type,
            state: self.engine.initial_state(doc_type)?.to_string(),
            version: 1,
            created_by: user_id.to_string(),
            updated_at: TimeStamp::new(),
        };

        self.documents
            .insert(record.id.as_bytes(), encode(&record)?)?;
        self.instance.flush()?;

        tracing::info!(document_id = %record.id, doc_type = %doc_type, state = %record.state, "document created");
        Ok(record)
    }

    pub fn get_document(&self, document_id: &str) -> anyhow::Result<DocumentRecord> {
        let raw = self
            .documents
            .get(document_id.as_bytes())?
            .ok_or_else(|| ServiceError::DocumentNotFound(document_id.to_string()))?;
        Ok(decode(&raw)?)
    }

    /// Journal entries for a document, oldest first
    pub fn history(&self, document_id: &str) -> anyhow::Result<Vec<JournalEntry>> {
        let mut entries = Vec::new();
        for item in self.history.scan_prefix(format!("{}/", document_id).as_bytes()) {
            let (_, request_id) = item?;
            let raw = self.journal.get(&request_id)?.ok_or_else(|| {
                ServiceError::MissingJournalEntry {
                    document_id: document_id.to_string(),
                    request_id: String::from_utf8_lossy(&request_id).into_owned(),
                }
            })?;
            entries.push(decode(&raw)?);
        }
        Ok(entries)
    }

    /// Validate, authorize, commit and run hooks for one request.
    ///
    /// Replaying a request id that was already committed returns the
    /// journaled result without writing or running hooks again.
    pub fn transition(&self, request: TransitionRequest) -> anyhow::Result<TransitionOutcome> {
        if let Some(outcome) = self.replay(&request)? {
            return Ok(outcome);
        }

        let validation = self.engine.validate_transition(&request)?;
        if let Some(error) = validation.error {
            return Err(ServiceError::Rejected(error).into());
        }

        if let Some(permission) = validation.permission.as_deref() {
            if !self.authorizer.is_allowed(&request.user_id, permission) {
                return Err(ServiceError::Forbidden {
                    user_id: request.user_id.clone(),
                    permission: permission.to_string(),
                }
                .into());
            }
        }

        let result = self.engine.plan(&request)?;
        let commit = (&self.documents, &self.journal, &self.history).transaction(
            |(documents, journal, history)| {
                if journal.get(request.request_id.as_bytes())?.is_some() {
                    return Ok(Commit::AlreadyApplied);
                }

                let Some(raw) = documents.get(request.document_id.as_bytes())? else {
                    return abort(ServiceError::DocumentNotFound(request.document_id.clone()));
                };
                let mut record: DocumentRecord = decode(&raw).or_else(abort)?;

                if record.doc_type != request.doc_type {
                    return abort(ServiceError::DocumentTypeMismatch {
                        document_id: record.id.clone(),
                        requested: request.doc_type,
                        stored: record.doc_type,
                    });
                }
                // the engine judged the caller's view of the state; it must still be current
                if record.state != request.from_state {
                    return abort(ServiceError::StaleState {
                        document_id: record.id.clone(),
                        expected: request.from_state.clone(),
                        actual: record.state.clone(),
                    });
                }

                record.state = result.new_state.clone();
                record.version += 1;
                record.updated_at = TimeStamp::new();

                let entry = JournalEntry {
                    request: request.clone(),
                    result: result.clone(),
                    version: record.version,
                    catalog_fingerprint: self.catalog_fingerprint.clone(),
                    recorded_at: TimeStamp::new(),
                };

                documents.insert(record.id.as_bytes(), encode(&record).or_else(abort)?)?;
                journal.insert(request.request_id.as_bytes(), encode(&entry).or_else(abort)?)?;
                history.insert(
                    history_key(&record.id, record.version).as_bytes(),
                    request.request_id.as_bytes(),
                )?;

                Ok(Commit::Applied(record))
            },
        );

        let record = match commit {
            Ok(Commit::Applied(record)) => record,
            Ok(Commit::AlreadyApplied) => {
                return self
                    .replay(&request)?
                    .ok_or_else(|| anyhow::anyhow!("journal entry for {} vanished", request.request_id));
            }
            Err(TransactionError::Abort(e)) => return Err(e.into()),
            Err(TransactionError::Storage(e)) => return Err(ServiceError::Storage(e).into()),
        };
        self.instance.flush()?;

        tracing::info!(
            document_id = %record.id,
            doc_type = %record.doc_type,
            from = %result.previous_state,
            to = %result.new_state,
            version = record.version,
            "transition committed"
        );

        let ctx = HookContext {
            doc_type: record.doc_type,
            document_id: &record.id,
            from: &result.previous_state,
            to: &result.new_state,
            user_id: &request.user_id,
        };
        let hooks = self.dispatcher.run(&result.hooks, &ctx);

        Ok(TransitionOutcome {
            record,
            result,
            hooks,
            replayed: false,
        })
    }

    /// The journaled outcome of `request`, if its id was already committed.
    /// An id reused for a different transition is a conflict, not a replay.
    fn replay(&self, request: &TransitionRequest) -> anyhow::Result<Option<TransitionOutcome>> {
        let Some(raw) = self.journal.get(request.request_id.as_bytes())? else {
            return Ok(None);
        };
        let entry: JournalEntry = decode(&raw)?;
        if !same_transition(&entry.request, request) {
            return Err(ServiceError::RequestIdConflict {
                request_id: request.request_id.clone(),
            }
            .into());
        }
        let record = self.get_document(&entry.request.document_id)?;

        Ok(Some(TransitionOutcome {
            record,
            result: entry.result,
            hooks: vec![],
            replayed: true,
        }))
    }
}
