//! Maximal set property check.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use xbm_core::{Direction, EventId, SignalId, SignalKind, Xbm};

/// Pairs of burst events whose input change sets nest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaximalSetWitness {
    /// Each unordered pair is reported once, smaller identifier first.
    pub pairs: Vec<(EventId, EventId)>,

    /// All events participating in at least one violating pair.
    pub events: BTreeSet<EventId>,
}

/// No burst's input change set may strictly contain another's: after only
/// the smaller change has occurred the environment cannot tell which burst
/// is firing. Equal input change sets are not flagged here; those compete
/// outright and fall to the distinguishability check. Runs in
/// O(events^2 x signals).
pub fn maximal_set_property(xbm: &Xbm) -> Result<(), MaximalSetWitness> {
    let maps: Vec<(EventId, BTreeMap<SignalId, Direction>)> = xbm
        .events()
        .filter_map(|(id, _)| {
            xbm.directions_of_kind(id, SignalKind::Input)
                .ok()
                .map(|inputs| (id, inputs))
        })
        .collect();

    let mut pairs = Vec::new();
    let mut events = BTreeSet::new();
    for i in 0..maps.len() {
        for j in (i + 1)..maps.len() {
            let (e1, d1) = &maps[i];
            let (e2, d2) = &maps[j];
            if strict_superset(d1, d2) || strict_superset(d2, d1) {
                pairs.push((*e1, *e2));
                events.insert(*e1);
                events.insert(*e2);
            }
        }
    }

    if pairs.is_empty() {
        Ok(())
    } else {
        debug!(pairs = pairs.len(), "maximal set property violated");
        Err(MaximalSetWitness { pairs, events })
    }
}

/// True when every (signal, direction) entry of `b` appears in `a` and
/// `a` has at least one more.
fn strict_superset(
    a: &BTreeMap<SignalId, Direction>,
    b: &BTreeMap<SignalId, Direction>,
) -> bool {
    b.len() < a.len() && b.iter().all(|(signal, d)| a.get(signal) == Some(d))
}
