//! Non-empty input bursts check.

use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;
use xbm_core::{EventId, SignalKind, Xbm};

/// Burst events the environment cannot trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InputBurstWitness {
    pub events: BTreeSet<EventId>,
}

/// Every burst must contain at least one input signal change; a burst
/// whose only changing signals are outputs cannot be triggered by the
/// environment.
pub fn non_empty_input_bursts(xbm: &Xbm) -> Result<(), InputBurstWitness> {
    let mut events = BTreeSet::new();
    for (id, _) in xbm.events() {
        if let Ok(inputs) = xbm.directions_of_kind(id, SignalKind::Input) {
            if inputs.is_empty() {
                events.insert(id);
            }
        }
    }

    if events.is_empty() {
        Ok(())
    } else {
        debug!(events = events.len(), "non-empty input bursts violated");
        Err(InputBurstWitness { events })
    }
}
