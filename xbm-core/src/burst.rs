//! Burst edges and transition directions.

use crate::signal::SignalId;
use crate::state::StateId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable identifier for a burst event (directed edge).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct EventId(pub u32);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a single signal transition within a burst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Rising transition (0 to 1).
    Plus,
    /// Falling transition (1 to 0).
    Minus,
    /// The signal settles to a don't-care on arrival.
    Unstable,
    /// No asserted transition; the source value passes through unchanged.
    Clear,
}

impl Direction {
    /// Swaps rising and falling; unstable and clear are their own mirror.
    pub fn mirror(self) -> Self {
        match self {
            Direction::Plus => Direction::Minus,
            Direction::Minus => Direction::Plus,
            Direction::Unstable => Direction::Unstable,
            Direction::Clear => Direction::Clear,
        }
    }

    /// Cycles plus -> unstable -> minus -> plus, used by editing gestures.
    /// Clear is fixed.
    pub fn toggle(self) -> Self {
        match self {
            Direction::Plus => Direction::Unstable,
            Direction::Unstable => Direction::Minus,
            Direction::Minus => Direction::Plus,
            Direction::Clear => Direction::Clear,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Plus => write!(f, "+"),
            Direction::Minus => write!(f, "-"),
            Direction::Unstable => write!(f, "*"),
            Direction::Clear => write!(f, "~"),
        }
    }
}

/// The multi-signal transition labelling one edge.
///
/// The direction map is partial and never contains a dummy signal; the
/// model keeps it consistent with the encodings of both endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burst {
    /// Source state.
    pub from: StateId,

    /// Target state.
    pub to: StateId,

    pub(crate) direction: BTreeMap<SignalId, Direction>,
}

impl Burst {
    pub(crate) fn new(from: StateId, to: StateId) -> Self {
        Self {
            from,
            to,
            direction: BTreeMap::new(),
        }
    }

    /// The direction map, keyed by signal identifier.
    pub fn direction(&self) -> &BTreeMap<SignalId, Direction> {
        &self.direction
    }

    /// The direction of one signal, if it changes in this burst.
    pub fn get(&self, signal: SignalId) -> Option<Direction> {
        self.direction.get(&signal).copied()
    }
}

/// A directed edge carrying a burst and a conditional expression.
///
/// The conditional is stored as source text; an empty string means the
/// event is unconditional. Reference errors in the text are diagnosed by
/// the distinguishability check, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurstEvent {
    pub(crate) burst: Burst,
    pub(crate) conditional: String,
}

impl BurstEvent {
    pub(crate) fn new(from: StateId, to: StateId) -> Self {
        Self {
            burst: Burst::new(from, to),
            conditional: String::new(),
        }
    }

    /// The burst labelling this edge.
    pub fn burst(&self) -> &Burst {
        &self.burst
    }

    /// Source state.
    pub fn from(&self) -> StateId {
        self.burst.from
    }

    /// Target state.
    pub fn to(&self) -> StateId {
        self.burst.to
    }

    /// Conditional expression text; empty means unconditional.
    pub fn conditional(&self) -> &str {
        &self.conditional
    }
}
