//! # xbm-verify
//!
//! Design-rule verification for extended burst-mode state machines.
//!
//! Four independent checks over a consistent `xbm-core` model:
//! - Unique state encoding
//! - Non-empty input bursts
//! - Maximal set property
//! - Distinguishability constraint
//!
//! Every check is a pure query: it never mutates the model, never panics
//! on a well-typed model, and on failure returns a witness naming the
//! offending states or events so the caller can select and highlight them.

pub mod distinguishability;
pub mod encoding;
pub mod input_bursts;
pub mod maximal_set;

pub use distinguishability::{
    distinguishability, ConditionalConflict, DistinguishabilityWitness, ExpressionIssue,
};
pub use encoding::{unique_state_encoding, UniqueEncodingWitness};
pub use input_bursts::{non_empty_input_bursts, InputBurstWitness};
pub use maximal_set::{maximal_set_property, MaximalSetWitness};
