//! State nodes and their signal encodings.

use crate::signal::SignalId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier for a state node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StateId(pub u32);

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Four-valued logic level of a signal within a state encoding.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SignalState {
    /// Logic 0.
    Low,
    /// Logic 1.
    High,
    /// Directed don't-care: the value is not asserted in this state.
    #[default]
    Ddc,
}

impl fmt::Display for SignalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalState::Low => write!(f, "0"),
            SignalState::High => write!(f, "1"),
            SignalState::Ddc => write!(f, "X"),
        }
    }
}

/// A state node with its full signal encoding.
///
/// The encoding is total: it holds an entry for every declared signal. The
/// model maintains that invariant across signal and state additions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XbmState {
    /// Name, unique among states.
    pub name: String,

    pub(crate) encoding: BTreeMap<SignalId, SignalState>,
}

impl XbmState {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoding: BTreeMap::new(),
        }
    }

    /// The full encoding map, keyed by signal identifier.
    pub fn encoding(&self) -> &BTreeMap<SignalId, SignalState> {
        &self.encoding
    }

    /// The encoded value of one signal, if declared.
    pub fn value(&self, signal: SignalId) -> Option<SignalState> {
        self.encoding.get(&signal).copied()
    }
}
