use crate::document::DocumentType;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Tipo de documento desconocido: {0}")]
    UnknownDocumentType(String),
    #[error(
        "Transición no permitida para {doc_type}: {from} -> {to}. Estados permitidos: {}",
        join_states(.allowed)
    )]
    InvalidTransition {
        doc_type: DocumentType,
        from: String,
        to: String,
        allowed: Vec<String>,
    },
    #[error("Se requiere un motivo para {doc_type}: {from} -> {to}")]
    ReasonRequired {
        doc_type: DocumentType,
        from: String,
        to: String,
    },
    #[error("Catálogo inválido: {}", .issues.join("; "))]
    InvalidCatalog { issues: Vec<String> },
    #[error("Hooks del catálogo sin handler registrado: {}", .hooks.join(", "))]
    UnknownHooks { hooks: Vec<String> },
}

#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("Document {0} does not exist")]
    DocumentNotFound(String),
    #[error("Document {document_id} is in state {actual}, request expected {expected}")]
    StaleState {
        document_id: String,
        expected: String,
        actual: String,
    },
    #[error("Request was for a {requested} but document {document_id} is a {stored}")]
    DocumentTypeMismatch {
        document_id: String,
        requested: DocumentType,
        stored: DocumentType,
    },
    #[error("Transition rejected: {0}")]
    Rejected(LifecycleError),
    #[error("User {user_id} lacks permission {permission}")]
    Forbidden { user_id: String, permission: String },
    #[error("Request id {request_id} was already used for a different transition")]
    RequestIdConflict { request_id: String },
    #[error("History of {document_id} references request {request_id} with no journal entry")]
    MissingJournalEntry {
        document_id: String,
        request_id: String,
    },
    #[error("Failed to decode stored record: {0}")]
    Codec(String),
    #[error(transparent)]
    Storage(#[from] sled::Error),
}

/// Renders an allowed-states list for error messages, `ninguno` when empty.
pub(crate) fn join_states(states: &[String]) -> String {
    if states.is_empty() {
        "ninguno".to_string()
    } else {
        states.join(", ")
    }
}
