//! Core error types.

use crate::burst::EventId;
use crate::signal::SignalId;
use crate::state::StateId;
use thiserror::Error;

/// Contract violations raised by model edits.
///
/// Every variant means the offending edit was rejected in full; the model
/// is left exactly as it was. Design-rule failures are not errors and are
/// reported as verification witnesses instead.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown signal: id {id}")]
    UnknownSignal { id: SignalId },

    #[error("unknown state: id {id}")]
    UnknownState { id: StateId },

    #[error("unknown burst event: id {id}")]
    UnknownEvent { id: EventId },

    #[error("signal already declared: {name}")]
    SignalExists { name: String },

    #[error("state already exists: {name}")]
    StateExists { name: String },

    #[error("cannot assign a burst direction to dummy signal '{name}'")]
    DummyDirection { name: String },

    #[error("invalid conditional expression: {reason}")]
    InvalidConditional { reason: String },
}
