use serde::Serialize;

use crate::callbacks::{Callbacks, Operation, WriteContext, WriteHook};
use crate::error::DataError;
use crate::plugin::Plugin;

/// Name under which the validation hook is registered on each write chain.
pub const VALIDATION_HOOK: &str = "validations:validate";

// ── Error types ────────────────────────────────────────────

/// A field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
    pub code: String,
}

/// Convert a garde report into field errors.
pub fn convert_garde_report(report: &garde::Report) -> Vec<FieldError> {
    report
        .iter()
        .map(|(path, error)| {
            let field = {
                let s = path.to_string();
                if s.is_empty() { "value".to_string() } else { s }
            };
            FieldError {
                field,
                message: error.message().to_string(),
                code: "validation".to_string(),
            }
        })
        .collect()
}

// ── Plugin ─────────────────────────────────────────────────

/// Runs [`Entity::validate_fields`](crate::Entity::validate_fields) before
/// every create and update, aborting the write with
/// [`DataError::Validation`] when it fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidationPlugin;

impl ValidationPlugin {
    pub fn new() -> Self {
        Self
    }
}

struct ValidateHook;

impl WriteHook for ValidateHook {
    fn before_write(&self, ctx: &WriteContext<'_>) -> Result<(), DataError> {
        ctx.target
            .validate_fields()
            .map_err(|report| DataError::Validation(convert_garde_report(&report)))
    }
}

impl Plugin for ValidationPlugin {
    fn name(&self) -> &'static str {
        "validation"
    }

    fn initialize(&self, callbacks: &Callbacks) -> Result<(), DataError> {
        for operation in [Operation::Create, Operation::Update] {
            if callbacks.get(operation, VALIDATION_HOOK).is_none() {
                callbacks.register(operation, VALIDATION_HOOK, ValidateHook);
            }
        }
        Ok(())
    }
}
