//! Edge → permission lookup, plus the authorization seam used by callers
use super::document::{DocumentType, TransitionKey};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Maps an edge to the permission an authorization layer must check. Edges
/// without an entry need nothing beyond base document access.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionResolver {
    #[n(0)]
    permissions: BTreeMap<TransitionKey, String>,
}

impl PermissionResolver {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, key: TransitionKey, permission: &str) {
        self.permissions.insert(key, permission.to_string());
    }
    pub fn get(&self, doc_type: DocumentType, from: &str, to: &str) -> Option<&str> {
        self.permissions
            .get(&TransitionKey::new(doc_type, from, to))
            .map(String::as_str)
    }
    pub fn entries(&self) -> impl Iterator<Item = (&TransitionKey, &str)> {
        self.permissions.iter().map(|(key, p)| (key, p.as_str()))
    }
}

/// Decides whether a user holds a permission string.
pub trait Authorizer {
    fn is_allowed(&self, user_id: &str, permission: &str) -> bool;
}

/// In-memory user → permissions grants.
#[derive(Debug, Default, Clone)]
pub struct GrantTable {
    grants: HashMap<String, HashSet<String>>,
}

impl GrantTable {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn grant(mut self, user_id: &str, permission: &str) -> Self {
        self.grants
            .entry(user_id.to_string())
            .or_default()
            .insert(permission.to_string());
        self
    }
    pub fn revoke(&mut self, user_id: &str, permission: &str) {
        if let Some(held) = self.grants.get_mut(user_id) {
            held.remove(permission);
        }
    }
}

impl Authorizer for GrantTable {
    fn is_allowed(&self, user_id: &str, permission: &str) -> bool {
        self.grants
            .get(user_id)
            .is_some_and(|held| held.contains(permission))
    }
}
