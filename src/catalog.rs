//! The full rule set an engine is built from: graphs, permissions and hooks
use super::document::{DocumentType, TransitionKey};
use super::error::LifecycleError;
use super::hooks::HookResolver;
use super::permission::PermissionResolver;
use super::registry::{StateGraph, TransitionRegistry};
use anyhow::Context;
use std::path::Path;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    #[n(0)]
    registry: TransitionRegistry,
    #[n(1)]
    permissions: PermissionResolver,
    #[n(2)]
    hooks: HookResolver,
}

/// Assembles a [`Catalog`] one document type at a time.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: Catalog,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn graph(mut self, doc_type: DocumentType, graph: StateGraph) -> Self {
        self.catalog.registry.insert(doc_type, graph);
        self
    }
    pub fn permission(mut self, doc_type: DocumentType, from: &str, to: &str, permission: &str) -> Self {
        self.catalog
            .permissions
            .insert(TransitionKey::new(doc_type, from, to), permission);
        self
    }
    pub fn hooks(mut self, doc_type: DocumentType, from: &str, to: &str, hooks: &[&str]) -> Self {
        self.catalog
            .hooks
            .insert(TransitionKey::new(doc_type, from, to), hooks);
        self
    }
    /// Verifies the assembled tables before handing them out.
    pub fn build(self) -> Result<Catalog, LifecycleError> {
        self.catalog.verify()?;
        Ok(self.catalog)
    }
    // compiled-in tables are verified by tests; engines verify again on construction
    pub(crate) fn finish(self) -> Catalog {
        self.catalog
    }
}

impl Catalog {
    /// The compiled-in order-to-cash rule set.
    pub fn standard() -> Self {
        super::standard::catalog()
    }
    pub fn registry(&self) -> &TransitionRegistry {
        &self.registry
    }
    pub fn permissions(&self) -> &PermissionResolver {
        &self.permissions
    }
    pub fn hooks(&self) -> &HookResolver {
        &self.hooks
    }
    pub fn document_types(&self) -> impl Iterator<Item = DocumentType> + '_ {
        self.registry.document_types()
    }
    /// Every edge of every registered graph.
    pub fn edges(&self) -> Vec<TransitionKey> {
        self.registry
            .graphs()
            .flat_map(|(doc_type, graph)| {
                graph
                    .edges()
                    .map(move |(from, to)| TransitionKey::new(doc_type, from, to))
            })
            .collect()
    }
    /// Checks graph closure, initial states, and that resolver entries only
    /// name existing edges. All problems are reported together.
    pub fn verify(&self) -> Result<(), LifecycleError> {
        let mut issues = Vec::new();

        for (doc_type, graph) in self.registry.graphs() {
            if !graph.contains(graph.initial()) {
                issues.push(format!(
                    "{}: initial state {} is not a registered state",
                    doc_type,
                    graph.initial()
                ));
            }
            for (from, to) in graph.edges() {
                if !graph.contains(to) {
                    issues.push(format!(
                        "{}: target {} of {} is not a registered state",
                        doc_type, to, from
                    ));
                }
            }
        }

        for (key, permission) in self.permissions.entries() {
            if !self.registry.contains_edge(key.doc_type, &key.from, &key.to) {
                issues.push(format!("permission {} names missing edge {}", permission, key));
            }
            if permission.trim().is_empty() {
                issues.push(format!("empty permission on {}", key));
            }
        }

        for (key, hooks) in self.hooks.entries() {
            if !self.registry.contains_edge(key.doc_type, &key.from, &key.to) {
                issues.push(format!("hooks registered for missing edge {}", key));
            }
            if hooks.iter().any(|h| h.trim().is_empty()) {
                issues.push(format!("empty hook name on {}", key));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::InvalidCatalog { issues })
        }
    }
    pub fn to_cbor(&self) -> anyhow::Result<Vec<u8>> {
        Ok(minicbor::to_vec(self)?)
    }
    /// Decodes and verifies a catalog.
    pub fn from_cbor(bytes: &[u8]) -> anyhow::Result<Self> {
        let catalog: Catalog = minicbor::decode(bytes)?;
        catalog.verify()?;
        Ok(catalog)
    }
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        Self::from_cbor(&bytes).with_context(|| format!("invalid catalog {}", path.display()))
    }
    /// SHA-256 of the CBOR encoding; identifies the rule set in journals.
    pub fn fingerprint(&self) -> anyhow::Result<String> {
        Ok(sha256::digest(&self.to_cbor()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_graph() -> StateGraph {
        StateGraph::new("A").state("A", &["B"]).state("B", &[])
    }

    #[test]
    fn builder_accepts_consistent_tables() {
        let catalog = CatalogBuilder::new()
            .graph(DocumentType::Sale, small_graph())
            .permission(DocumentType::Sale, "A", "B", "sales.advance")
            .hooks(DocumentType::Sale, "A", "B", &["notify"])
            .build()
            .unwrap();

        assert_eq!(catalog.edges(), vec![TransitionKey::new(DocumentType::Sale, "A", "B")]);
    }

    #[test]
    fn verify_reports_every_issue() {
        let graph = StateGraph::new("X").state("A", &["B", "C"]).state("B", &[]);
        let result = CatalogBuilder::new()
            .graph(DocumentType::Sale, graph)
            .permission(DocumentType::Sale, "B", "A", "sales.reopen")
            .hooks(DocumentType::Payment, "A", "B", &["postLedger"])
            .build();

        let Err(LifecycleError::InvalidCatalog { issues }) = result else {
            panic!("expected verification failure");
        };
        assert_eq!(issues.len(), 4, "{issues:?}");
        assert!(issues.iter().any(|i| i.contains("initial state X")));
        assert!(issues.iter().any(|i| i.contains("target C")));
        assert!(issues.iter().any(|i| i.contains("sale.B->A")));
        assert!(issues.iter().any(|i| i.contains("payment.A->B")));
    }

    #[test]
    fn cbor_encoding_reloads_identically() {
        let catalog = Catalog::standard();
        let bytes = catalog.to_cbor().unwrap();
        let reloaded = Catalog::from_cbor(&bytes).unwrap();

        assert_eq!(catalog, reloaded);
        assert_eq!(catalog.fingerprint().unwrap(), reloaded.fingerprint().unwrap());
    }

    #[test]
    fn fingerprint_tracks_rule_changes() {
        let a = CatalogBuilder::new()
            .graph(DocumentType::Sale, small_graph())
            .build()
            .unwrap();
        let b = CatalogBuilder::new()
            .graph(DocumentType::Sale, small_graph())
            .hooks(DocumentType::Sale, "A", "B", &["notify"])
            .build()
            .unwrap();

        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
    }

    #[test]
    fn from_file_loads_written_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.cbor");
        std::fs::write(&path, Catalog::standard().to_cbor().unwrap()).unwrap();

        assert_eq!(Catalog::from_file(&path).unwrap(), Catalog::standard());
        assert!(Catalog::from_file(dir.path().join("missing.cbor")).is_err());
    }
}
