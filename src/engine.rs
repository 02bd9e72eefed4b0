//! Validation and query façade over a verified [`Catalog`]
//!
//! Every operation is a pure function of the catalog and its arguments, so a
//! single engine can be shared across threads without locking. The engine
//! never sees persisted documents: it judges the state the caller hands it.
use super::catalog::Catalog;
use super::document::DocumentType;
use super::error::LifecycleError;
use super::registry::{StateFlags, StateGraph};
use super::request::{TransitionRequest, TransitionResult, TransitionValidation};
use std::collections::HashMap;

pub const MISSING_REASON_WARNING: &str = "cancelación sin motivo";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Reject transitions into a cancelling state that carry no reason.
    pub require_reason_on_cancel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            require_reason_on_cancel: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn require_reason_on_cancel(mut self, required: bool) -> Self {
        self.require_reason_on_cancel = required;
        self
    }
}

#[derive(Debug)]
pub struct LifecycleEngine {
    catalog: Catalog,
    flags: HashMap<DocumentType, HashMap<String, StateFlags>>,
    config: EngineConfig,
}

impl LifecycleEngine {
    /// Verifies `catalog` and precomputes per-state flags.
    pub fn new(catalog: Catalog, config: EngineConfig) -> Result<Self, LifecycleError> {
        catalog.verify()?;

        let mut flags: HashMap<DocumentType, HashMap<String, StateFlags>> = HashMap::new();
        for ((doc_type, state), state_flags) in catalog.registry().compute_flags() {
            flags.entry(doc_type).or_default().insert(state, state_flags);
        }

        Ok(Self {
            catalog,
            flags,
            config,
        })
    }
    /// An engine over the built-in order-to-cash catalog with default config.
    pub fn standard() -> Result<Self, LifecycleError> {
        Self::new(Catalog::standard(), EngineConfig::default())
    }
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
    pub fn config(&self) -> EngineConfig {
        self.config
    }
    pub fn transition_rules(&self, doc_type: DocumentType) -> Result<&StateGraph, LifecycleError> {
        self.catalog.registry().rules(doc_type)
    }
    /// Legal next states. Terminal and unknown states both yield an empty slice.
    pub fn allowed_transitions(&self, doc_type: DocumentType, state: &str) -> &[String] {
        self.catalog.registry().allowed(doc_type, state)
    }
    pub fn is_valid_transition(&self, doc_type: DocumentType, from: &str, to: &str) -> bool {
        self.allowed_transitions(doc_type, from)
            .iter()
            .any(|s| s == to)
    }
    /// `None` means base document access is enough.
    pub fn transition_permission(&self, doc_type: DocumentType, from: &str, to: &str) -> Option<&str> {
        self.catalog.permissions().get(doc_type, from, to)
    }
    /// Hooks for the edge in the order they must be attempted.
    pub fn transition_hooks(&self, doc_type: DocumentType, from: &str, to: &str) -> &[String] {
        self.catalog.hooks().get(doc_type, from, to)
    }
    pub fn initial_state(&self, doc_type: DocumentType) -> Result<&str, LifecycleError> {
        Ok(self.transition_rules(doc_type)?.initial())
    }
    pub fn state_flags(&self, doc_type: DocumentType, state: &str) -> StateFlags {
        self.flags
            .get(&doc_type)
            .and_then(|states| states.get(state))
            .copied()
            .unwrap_or(StateFlags {
                terminal: true,
                cancellable: false,
            })
    }
    pub fn is_terminal_state(&self, doc_type: DocumentType, state: &str) -> bool {
        self.state_flags(doc_type, state).terminal
    }
    pub fn is_cancellable(&self, doc_type: DocumentType, state: &str) -> bool {
        self.state_flags(doc_type, state).cancellable
    }

    /// Checks the edge and the reason requirement. Only an unregistered
    /// document type is an `Err`; rejected edges come back as data listing
    /// the legal alternatives.
    pub fn validate_transition(
        &self,
        request: &TransitionRequest,
    ) -> Result<TransitionValidation, LifecycleError> {
        let graph = self.transition_rules(request.doc_type)?;
        let (from, to) = (request.from_state.as_str(), request.to_state.as_str());

        let allowed = graph.targets(from);
        if !allowed.iter().any(|s| s == to) {
            tracing::debug!(
                doc_type = %request.doc_type,
                document_id = %request.document_id,
                from,
                to,
                "transition rejected"
            );
            return Ok(TransitionValidation::rejected(
                LifecycleError::InvalidTransition {
                    doc_type: request.doc_type,
                    from: from.to_string(),
                    to: to.to_string(),
                    allowed: allowed.to_vec(),
                },
            ));
        }

        if self.config.require_reason_on_cancel && graph.is_cancelling(to) && !request.has_reason() {
            tracing::debug!(
                doc_type = %request.doc_type,
                document_id = %request.document_id,
                to,
                "cancellation without reason rejected"
            );
            return Ok(TransitionValidation::rejected(LifecycleError::ReasonRequired {
                doc_type: request.doc_type,
                from: from.to_string(),
                to: to.to_string(),
            }));
        }

        Ok(TransitionValidation::accepted(
            self.transition_permission(request.doc_type, from, to),
        ))
    }

    /// Validation, permission and hooks folded into one result.
    pub fn plan(&self, request: &TransitionRequest) -> Result<TransitionResult, LifecycleError> {
        let validation = self.validate_transition(request)?;
        let (doc_type, from, to) = (
            request.doc_type,
            request.from_state.as_str(),
            request.to_state.as_str(),
        );

        if !validation.valid {
            return Ok(TransitionResult {
                success: false,
                previous_state: from.to_string(),
                new_state: from.to_string(),
                error: validation.error_message(),
                warnings: vec![],
                hooks: vec![],
                permission: None,
            });
        }

        let mut warnings = Vec::new();
        if self.transition_rules(doc_type)?.is_cancelling(to) && !request.has_reason() {
            warnings.push(MISSING_REASON_WARNING.to_string());
        }

        Ok(TransitionResult {
            success: true,
            previous_state: from.to_string(),
            new_state: to.to_string(),
            error: None,
            warnings,
            hooks: self.transition_hooks(doc_type, from, to).to_vec(),
            permission: validation.permission,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogBuilder;
    use crate::registry::StateGraph;
    use std::sync::Arc;

    /// A two-edge graph, enough to exercise the façade without the full tables.
    fn reduced_engine(config: EngineConfig) -> LifecycleEngine {
        let catalog = CatalogBuilder::new()
            .graph(
                DocumentType::Payment,
                StateGraph::new("NUEVO")
                    .state("NUEVO", &["HECHO", "ANULADO"])
                    .state("HECHO", &[])
                    .cancel_state("ANULADO", &[]),
            )
            .permission(DocumentType::Payment, "NUEVO", "ANULADO", "payments.void")
            .hooks(DocumentType::Payment, "NUEVO", "HECHO", &["postLedger", "notify"])
            .build()
            .unwrap();
        LifecycleEngine::new(catalog, config).unwrap()
    }

    fn request(from: &str, to: &str) -> TransitionRequest {
        TransitionRequest::new(DocumentType::Payment, "pay_1", from, to, "user_1")
    }

    #[test]
    fn rejects_unverified_catalog() {
        let catalog = CatalogBuilder::new()
            .graph(DocumentType::Sale, StateGraph::new("A").state("A", &["B"]))
            .finish();
        assert!(matches!(
            LifecycleEngine::new(catalog, EngineConfig::default()),
            Err(LifecycleError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn unregistered_type_is_a_precondition_error() {
        let engine = reduced_engine(EngineConfig::default());
        let req = TransitionRequest::new(DocumentType::Sale, "s", "BORRADOR", "CONFIRMADA", "u");

        assert_eq!(
            engine.validate_transition(&req),
            Err(LifecycleError::UnknownDocumentType("sale".into()))
        );
        assert!(engine.initial_state(DocumentType::Sale).is_err());
        assert!(!engine.is_valid_transition(DocumentType::Sale, "BORRADOR", "CONFIRMADA"));
    }

    #[test]
    fn plan_carries_hooks_in_order() {
        let engine = reduced_engine(EngineConfig::default());
        let result = engine.plan(&request("NUEVO", "HECHO")).unwrap();

        assert!(result.success);
        assert_eq!(result.new_state, "HECHO");
        assert_eq!(result.hooks, vec!["postLedger", "notify"]);
        assert_eq!(result.permission, None);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn plan_for_rejected_edge_keeps_state() {
        let engine = reduced_engine(EngineConfig::default());
        let result = engine.plan(&request("HECHO", "NUEVO")).unwrap();

        assert!(!result.success);
        assert_eq!(result.new_state, "HECHO");
        assert!(result.hooks.is_empty());
        assert!(result.error.unwrap().ends_with("Estados permitidos: ninguno"));
    }

    #[test]
    fn cancellation_requires_reason_by_default() {
        let engine = reduced_engine(EngineConfig::default());

        let validation = engine.validate_transition(&request("NUEVO", "ANULADO")).unwrap();
        assert!(!validation.valid);
        assert!(matches!(validation.error, Some(LifecycleError::ReasonRequired { .. })));

        let validation = engine
            .validate_transition(&request("NUEVO", "ANULADO").with_reason("duplicado"))
            .unwrap();
        assert!(validation.valid);
        assert_eq!(validation.permission.as_deref(), Some("payments.void"));
    }

    #[test]
    fn relaxed_config_warns_instead() {
        let engine = reduced_engine(EngineConfig::new().require_reason_on_cancel(false));
        let result = engine.plan(&request("NUEVO", "ANULADO")).unwrap();

        assert!(result.success);
        assert_eq!(result.warnings, vec![MISSING_REASON_WARNING]);
    }

    #[test]
    fn unknown_state_is_terminal_and_not_cancellable() {
        let engine = reduced_engine(EngineConfig::default());
        assert!(engine.is_terminal_state(DocumentType::Payment, "INEXISTENTE"));
        assert!(!engine.is_cancellable(DocumentType::Payment, "INEXISTENTE"));
        assert!(engine.is_cancellable(DocumentType::Payment, "NUEVO"));
    }

    #[test]
    fn shared_across_threads() {
        let engine = Arc::new(LifecycleEngine::standard().unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let engine = Arc::clone(&engine);
                std::thread::spawn(move || {
                    engine.is_valid_transition(DocumentType::Sale, "BORRADOR", "CONFIRMADA")
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
