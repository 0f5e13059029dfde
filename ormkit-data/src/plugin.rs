//! Plugin system for ormkit handles.
//!
//! A plugin is a composable unit that installs write callbacks into a
//! handle's [`Callbacks`] registry. Handles call [`Plugin::initialize`] from
//! `use_plugin`; implementations should check for their hooks by name before
//! registering so that repeated installation stays a no-op.
//!
//! # Example
//!
//! ```ignore
//! use ormkit_data::{hook_fn, Callbacks, DataError, Operation, Plugin};
//!
//! pub struct Audit;
//!
//! impl Plugin for Audit {
//!     fn name(&self) -> &'static str {
//!         "audit"
//!     }
//!
//!     fn initialize(&self, callbacks: &Callbacks) -> Result<(), DataError> {
//!         callbacks.register(Operation::Create, "audit:create", hook_fn(|ctx| {
//!             tracing::info!(table = ctx.table, "insert");
//!             Ok(())
//!         }));
//!         Ok(())
//!     }
//! }
//! ```

use crate::callbacks::Callbacks;
use crate::error::DataError;

pub trait Plugin: Send + Sync + 'static {
    /// The name of this plugin (for diagnostics).
    fn name(&self) -> &'static str;

    /// Install the plugin's callbacks.
    fn initialize(&self, callbacks: &Callbacks) -> Result<(), DataError>;
}
