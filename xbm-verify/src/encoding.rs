//! Unique state encoding check.

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;
use xbm_core::{SignalState, StateId, Xbm};

/// Groups of states sharing a full encoding vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UniqueEncodingWitness {
    /// Each group holds at least two states with identical encodings.
    pub groups: Vec<BTreeSet<StateId>>,
}

/// Every state must carry a distinct encoding vector over all declared
/// signals; otherwise the synthesized circuit cannot tell the states
/// apart. Runs in O(states x signals).
pub fn unique_state_encoding(xbm: &Xbm) -> Result<(), UniqueEncodingWitness> {
    let mut buckets: HashMap<Vec<SignalState>, BTreeSet<StateId>> = HashMap::new();
    for (id, state) in xbm.states() {
        // Encodings are total and identifier-ordered, so the value
        // vectors are positionally comparable across states.
        let vector: Vec<SignalState> = state.encoding().values().copied().collect();
        buckets.entry(vector).or_default().insert(id);
    }

    let mut groups: Vec<BTreeSet<StateId>> = buckets
        .into_values()
        .filter(|group| group.len() > 1)
        .collect();
    groups.sort_by_key(|group| group.iter().next().copied());

    if groups.is_empty() {
        Ok(())
    } else {
        debug!(groups = groups.len(), "unique state encoding violated");
        Err(UniqueEncodingWitness { groups })
    }
}
