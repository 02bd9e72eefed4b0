//! Per-document state graphs
use super::document::DocumentType;
use super::error::LifecycleError;
use std::collections::{BTreeMap, HashMap};

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct StateNode {
    #[n(0)]
    pub next: Vec<String>, // legal targets, in declaration order
    #[n(1)]
    pub cancelling: bool, // entering this state stops the document
}

/// The complete state graph of one document type.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct StateGraph {
    #[n(0)]
    initial: String,
    #[n(1)]
    states: BTreeMap<String, StateNode>,
}

/// Derived, per-state answers computed once when an engine is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateFlags {
    pub terminal: bool,
    pub cancellable: bool,
}

impl StateGraph {
    pub fn new(initial: &str) -> Self {
        Self {
            initial: initial.to_string(),
            states: BTreeMap::new(),
        }
    }
    /// Declare `name` with its legal targets. An empty slice marks a terminal state.
    pub fn state(mut self, name: &str, next: &[&str]) -> Self {
        self.states.insert(
            name.to_string(),
            StateNode {
                next: next.iter().map(|s| s.to_string()).collect(),
                cancelling: false,
            },
        );
        self
    }
    /// Declare a state whose entry cancels or voids the document.
    pub fn cancel_state(mut self, name: &str, next: &[&str]) -> Self {
        self = self.state(name, next);
        if let Some(node) = self.states.get_mut(name) {
            node.cancelling = true;
        }
        self
    }
    pub fn initial(&self) -> &str {
        &self.initial
    }
    pub fn contains(&self, state: &str) -> bool {
        self.states.contains_key(state)
    }
    pub fn node(&self, state: &str) -> Option<&StateNode> {
        self.states.get(state)
    }
    /// Legal targets of `state`; empty for terminal and unknown states alike.
    pub fn targets(&self, state: &str) -> &[String] {
        self.states
            .get(state)
            .map(|node| node.next.as_slice())
            .unwrap_or(&[])
    }
    pub fn states(&self) -> impl Iterator<Item = (&str, &StateNode)> {
        self.states.iter().map(|(name, node)| (name.as_str(), node))
    }
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.states().flat_map(|(from, node)| {
            node.next.iter().map(move |to| (from, to.as_str()))
        })
    }
    pub fn is_cancelling(&self, state: &str) -> bool {
        self.states.get(state).is_some_and(|node| node.cancelling)
    }
    fn flags_of(&self, node: &StateNode) -> StateFlags {
        StateFlags {
            terminal: node.next.is_empty(),
            cancellable: node.next.iter().any(|to| self.is_cancelling(to)),
        }
    }
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct TransitionRegistry {
    #[n(0)]
    graphs: BTreeMap<DocumentType, StateGraph>,
}

impl TransitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, doc_type: DocumentType, graph: StateGraph) {
        self.graphs.insert(doc_type, graph);
    }
    pub fn rules(&self, doc_type: DocumentType) -> Result<&StateGraph, LifecycleError> {
        self.graphs
            .get(&doc_type)
            .ok_or_else(|| LifecycleError::UnknownDocumentType(doc_type.to_string()))
    }
    /// Legal targets of `state`, empty when the state or the type is not registered.
    pub fn allowed(&self, doc_type: DocumentType, state: &str) -> &[String] {
        self.graphs
            .get(&doc_type)
            .map(|graph| graph.targets(state))
            .unwrap_or(&[])
    }
    pub fn contains_edge(&self, doc_type: DocumentType, from: &str, to: &str) -> bool {
        self.allowed(doc_type, from).iter().any(|s| s == to)
    }
    pub fn document_types(&self) -> impl Iterator<Item = DocumentType> + '_ {
        self.graphs.keys().copied()
    }
    pub fn graphs(&self) -> impl Iterator<Item = (DocumentType, &StateGraph)> {
        self.graphs.iter().map(|(doc_type, graph)| (*doc_type, graph))
    }
    /// Terminal/cancellable flags for every registered state.
    pub fn compute_flags(&self) -> HashMap<(DocumentType, String), StateFlags> {
        self.graphs()
            .flat_map(|(doc_type, graph)| {
                graph
                    .states()
                    .map(move |(state, node)| ((doc_type, state.to_string()), graph.flags_of(node)))
            })
            .collect()
    }
}
