//! Named write callbacks attached to a database handle.
//!
//! Each handle owns a [`Callbacks`] registry with one ordered chain per
//! [`Operation`]. Hooks run before the statement is sent; the first hook
//! returning an error aborts the write and that error is returned to the
//! caller. Registration is keyed by name and idempotent, so installing the
//! same plugin twice never runs a hook twice.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::entity::Entity;
use crate::error::DataError;

/// The write operation a callback chain belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => f.write_str("create"),
            Operation::Update => f.write_str("update"),
        }
    }
}

/// Type-erased view of the entity being written.
pub trait WriteTarget: Send + Sync {
    fn validate_fields(&self) -> Result<(), garde::Report>;
}

impl<T: Entity> WriteTarget for T {
    fn validate_fields(&self) -> Result<(), garde::Report> {
        Entity::validate_fields(self)
    }
}

/// What a hook sees of the pending write.
pub struct WriteContext<'a> {
    pub operation: Operation,
    pub table: &'static str,
    pub target: &'a dyn WriteTarget,
}

/// A callback run before a write reaches storage.
pub trait WriteHook: Send + Sync + 'static {
    fn before_write(&self, ctx: &WriteContext<'_>) -> Result<(), DataError>;
}

/// A [`WriteHook`] backed by a closure, built with [`hook_fn`].
pub struct FnHook<F>(F);

/// Wrap a closure as a [`WriteHook`].
pub fn hook_fn<F>(f: F) -> FnHook<F>
where
    F: Fn(&WriteContext<'_>) -> Result<(), DataError> + Send + Sync + 'static,
{
    FnHook(f)
}

impl<F> WriteHook for FnHook<F>
where
    F: Fn(&WriteContext<'_>) -> Result<(), DataError> + Send + Sync + 'static,
{
    fn before_write(&self, ctx: &WriteContext<'_>) -> Result<(), DataError> {
        (self.0)(ctx)
    }
}

#[derive(Clone)]
struct RegisteredHook {
    name: String,
    hook: Arc<dyn WriteHook>,
}

/// Per-handle registry of named write hooks.
///
/// `Callbacks` is `Clone` and shares its chains between clones, like the
/// handle that owns it.
#[derive(Clone, Default)]
pub struct Callbacks {
    chains: Arc<RwLock<HashMap<Operation, Vec<RegisteredHook>>>>,
}

impl Callbacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `hook` to the chain of `operation` under `name`.
    ///
    /// Returns `false` without touching the chain when a hook with the same
    /// name is already registered.
    pub fn register<H: WriteHook>(&self, operation: Operation, name: &str, hook: H) -> bool {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let chain = chains.entry(operation).or_default();
        if chain.iter().any(|h| h.name == name) {
            tracing::debug!(%operation, name, "callback already registered");
            return false;
        }
        chain.push(RegisteredHook {
            name: name.to_string(),
            hook: Arc::new(hook),
        });
        tracing::debug!(%operation, name, "callback registered");
        true
    }

    pub fn get(&self, operation: Operation, name: &str) -> Option<Arc<dyn WriteHook>> {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        chains
            .get(&operation)?
            .iter()
            .find(|h| h.name == name)
            .map(|h| h.hook.clone())
    }

    /// Registered hook names for `operation`, in execution order.
    pub fn names(&self, operation: Operation) -> Vec<String> {
        let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
        chains
            .get(&operation)
            .map(|chain| chain.iter().map(|h| h.name.clone()).collect())
            .unwrap_or_default()
    }

    pub fn remove(&self, operation: Operation, name: &str) -> bool {
        let mut chains = self.chains.write().unwrap_or_else(PoisonError::into_inner);
        let Some(chain) = chains.get_mut(&operation) else {
            return false;
        };
        let before = chain.len();
        chain.retain(|h| h.name != name);
        chain.len() != before
    }

    /// Run the chain of `operation` against `target`, stopping at the first error.
    pub fn run(
        &self,
        operation: Operation,
        table: &'static str,
        target: &dyn WriteTarget,
    ) -> Result<(), DataError> {
        // Hooks run outside the lock so they may use the registry themselves.
        let chain = {
            let chains = self.chains.read().unwrap_or_else(PoisonError::into_inner);
            chains.get(&operation).cloned().unwrap_or_default()
        };
        let ctx = WriteContext {
            operation,
            table,
            target,
        };
        for registered in &chain {
            if let Err(err) = registered.hook.before_write(&ctx) {
                tracing::debug!(%operation, table, hook = %registered.name, error = %err, "write rejected");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callbacks")
            .field("create", &self.names(Operation::Create))
            .field("update", &self.names(Operation::Update))
            .finish()
    }
}
