//! Signal declarations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a declared signal.
///
/// Identifiers survive renames; only removal invalidates them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SignalId(pub u32);

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Signal type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Driven by the environment; bursts must contain at least one input change.
    Input,
    /// Driven by the circuit.
    Output,
    /// Level-sampled signal used in conditional expressions, not in bursts.
    Conditional,
    /// Placeholder signal; never carries a burst direction.
    Dummy,
}

impl SignalKind {
    /// Returns true for [`SignalKind::Dummy`].
    pub fn is_dummy(self) -> bool {
        self == SignalKind::Dummy
    }
}

/// A declared signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    /// Name, unique within the model.
    pub name: String,

    /// Signal type.
    pub kind: SignalKind,
}

impl Signal {
    /// Creates a new signal.
    pub fn new(name: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}
