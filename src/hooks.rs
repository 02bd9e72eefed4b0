//! Edge → ordered side-effect names, and the execution-side dispatch table
use super::catalog::Catalog;
use super::document::{DocumentType, TransitionKey};
use super::error::LifecycleError;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Maps an edge to the hooks a caller must attempt, in order.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Default, PartialEq, Eq)]
pub struct HookResolver {
    #[n(0)]
    hooks: BTreeMap<TransitionKey, Vec<String>>,
}

impl HookResolver {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn insert(&mut self, key: TransitionKey, hooks: &[&str]) {
        self.hooks
            .insert(key, hooks.iter().map(|h| h.to_string()).collect());
    }
    pub fn get(&self, doc_type: DocumentType, from: &str, to: &str) -> &[String] {
        self.hooks
            .get(&TransitionKey::new(doc_type, from, to))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
    pub fn entries(&self) -> impl Iterator<Item = (&TransitionKey, &[String])> {
        self.hooks.iter().map(|(key, hooks)| (key, hooks.as_slice()))
    }
    /// Every distinct hook name referenced by any edge.
    pub fn names(&self) -> BTreeSet<&str> {
        self.hooks.values().flatten().map(String::as_str).collect()
    }
}

/// What a hook handler gets to see about the transition that triggered it.
#[derive(Debug, Clone)]
pub struct HookContext<'a> {
    pub doc_type: DocumentType,
    pub document_id: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub user_id: &'a str,
}

pub type HookHandler = Box<dyn Fn(&HookContext<'_>) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookReport {
    pub hook: String,
    pub outcome: HookOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookOutcome {
    Succeeded,
    Failed(String),
    // not attempted because an earlier hook failed
    Skipped,
}

/// Name → handler table owned by the executing side.
#[derive(Default)]
pub struct HookDispatcher {
    handlers: HashMap<String, HookHandler>,
}

impl HookDispatcher {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn register<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&HookContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.to_string(), Box::new(handler));
        self
    }
    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }
    /// Fails when the catalog names a hook with no registered handler, so
    /// typos surface at startup rather than mid-transition.
    pub fn verify(&self, catalog: &Catalog) -> Result<(), LifecycleError> {
        let missing: Vec<String> = catalog
            .hooks()
            .names()
            .into_iter()
            .filter(|name| !self.is_registered(name))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LifecycleError::UnknownHooks { hooks: missing })
        }
    }
    /// Runs `hooks` in order, stopping at the first failure.
    pub fn run(&self, hooks: &[String], ctx: &HookContext<'_>) -> Vec<HookReport> {
        let mut reports = Vec::with_capacity(hooks.len());
        let mut failed = false;

        for hook in hooks {
            let outcome = if failed {
                HookOutcome::Skipped
            } else {
                let result = match self.handlers.get(hook) {
                    Some(handler) => handler(ctx),
                    None => Err(anyhow::anyhow!("no handler registered for {}", hook)),
                };
                match result {
                    Ok(()) => HookOutcome::Succeeded,
                    Err(e) => {
                        tracing::warn!(hook = %hook, document_id = ctx.document_id, error = %e, "hook failed");
                        failed = true;
                        HookOutcome::Failed(e.to_string())
                    }
                }
            };
            reports.push(HookReport {
                hook: hook.clone(),
                outcome,
            });
        }

        reports
    }
}
