//! # xbm-core
//!
//! Extended burst-mode (XBM) state machine model for asynchronous circuit
//! synthesis.
//!
//! This crate provides:
//! - Signal, state, and burst-event arenas indexed by stable identifiers
//! - A structural edit gateway (atomic creation, removal cascades)
//! - The consistency propagator keeping state encodings and burst
//!   directions mutually consistent under any single-field edit
//! - Conditional expression parsing and evaluation
//!
//! Design-rule verification over a consistent model lives in `xbm-verify`.

pub mod burst;
pub mod conditional;
pub mod error;
pub mod model;
pub mod signal;
pub mod state;

pub use burst::{Burst, BurstEvent, Direction, EventId};
pub use conditional::ConditionalExpr;
pub use error::ModelError;
pub use model::Xbm;
pub use signal::{Signal, SignalId, SignalKind};
pub use state::{SignalState, StateId, XbmState};
