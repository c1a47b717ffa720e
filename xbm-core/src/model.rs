//! The XBM model: entity arenas, the structural edit gateway, and the
//! consistency propagator.
//!
//! All edits funnel through [`Xbm`] methods. Structural edits (declare or
//! remove a signal, state, or event) are atomic: default encodings are
//! assigned and removal cascades run inside the same call, so no caller
//! ever observes a partially-constructed graph. Value edits (an encoding
//! entry or a burst direction) are validated up front and then ripple
//! synchronously until every write is a no-op:
//!
//! - Changing `state.encoding[s]` re-derives `direction[s]` on every
//!   incident burst from the endpoint encodings.
//! - Setting `direction[s] = d` forces the endpoint encodings that `d`
//!   implies (plus: 0 to 1, minus: 1 to 0, unstable: target becomes X,
//!   clear: the source value passes through), and each forced encoding
//!   write re-derives directions on its own incident bursts.
//!
//! Re-derivation never forces encodings back, and a write whose new value
//! equals the old one is suppressed, which is what terminates the ripple
//! on any finite graph.

use crate::burst::{BurstEvent, Direction, EventId};
use crate::conditional::ConditionalExpr;
use crate::error::ModelError;
use crate::signal::{Signal, SignalId, SignalKind};
use crate::state::{SignalState, StateId, XbmState};
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// An extended burst-mode state machine.
///
/// Owns all signals, states, and burst events, indexed by stable numeric
/// identifiers. Cross-references between entities are identifiers, never
/// pointers, so renames cannot dangle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Xbm {
    signals: BTreeMap<SignalId, Signal>,
    states: BTreeMap<StateId, XbmState>,
    events: BTreeMap<EventId, BurstEvent>,
    next_signal: u32,
    next_state: u32,
    next_event: u32,
}

impl Xbm {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Structural edit gateway
    // =========================================================================

    /// Declares a signal. Every existing state gains an encoding entry for
    /// it, initialized to the don't-care default.
    pub fn add_signal(
        &mut self,
        name: impl Into<String>,
        kind: SignalKind,
    ) -> Result<SignalId, ModelError> {
        let name = name.into();
        if self.signal_id(&name).is_some() {
            return Err(ModelError::SignalExists { name });
        }

        let id = SignalId(self.next_signal);
        self.next_signal += 1;
        for state in self.states.values_mut() {
            state.encoding.insert(id, SignalState::default());
        }
        debug!(signal = %name, ?kind, id = id.0, "signal added");
        self.signals.insert(id, Signal::new(name, kind));
        Ok(id)
    }

    /// Removes a signal, cascading: its entry disappears from every state
    /// encoding, every burst direction map, and every conditional
    /// expression that references it.
    pub fn remove_signal(&mut self, id: SignalId) -> Result<(), ModelError> {
        let signal = self
            .signals
            .remove(&id)
            .ok_or(ModelError::UnknownSignal { id })?;

        for state in self.states.values_mut() {
            state.encoding.remove(&id);
        }
        for event in self.events.values_mut() {
            event.burst.direction.remove(&id);
        }
        self.remove_variable_from_conditionals(&signal.name);
        debug!(signal = %signal.name, id = id.0, "signal removed");
        Ok(())
    }

    /// Renames a signal. Conditional expressions referencing the old name
    /// are resynthesized to use the new one; nothing else changes.
    pub fn rename_signal(
        &mut self,
        id: SignalId,
        new_name: impl Into<String>,
    ) -> Result<(), ModelError> {
        let new_name = new_name.into();
        let old_name = match self.signals.get(&id) {
            Some(s) => s.name.clone(),
            None => return Err(ModelError::UnknownSignal { id }),
        };
        if old_name == new_name {
            return Ok(());
        }
        if self.signal_id(&new_name).is_some() {
            return Err(ModelError::SignalExists { name: new_name });
        }

        if let Some(s) = self.signals.get_mut(&id) {
            s.name = new_name.clone();
        }
        self.rename_variable_in_conditionals(&old_name, &new_name);
        debug!(old = %old_name, new = %new_name, id = id.0, "signal renamed");
        Ok(())
    }

    /// Adds a state. Its encoding receives a don't-care entry for every
    /// declared signal.
    pub fn add_state(&mut self, name: impl Into<String>) -> Result<StateId, ModelError> {
        let name = name.into();
        if self.state_id(&name).is_some() {
            return Err(ModelError::StateExists { name });
        }

        let id = StateId(self.next_state);
        self.next_state += 1;
        let mut state = XbmState::new(name);
        for signal in self.signals.keys() {
            state.encoding.insert(*signal, SignalState::default());
        }
        debug!(state = %state.name, id = id.0, "state added");
        self.states.insert(id, state);
        Ok(id)
    }

    /// Removes a state. All incident burst events are removed first, so no
    /// dangling edge survives the call.
    pub fn remove_state(&mut self, id: StateId) -> Result<(), ModelError> {
        if !self.states.contains_key(&id) {
            return Err(ModelError::UnknownState { id });
        }
        let incident = self.incident_events(id);
        for event in incident {
            self.events.remove(&event);
        }
        let state = self.states.remove(&id);
        if let Some(state) = state {
            debug!(state = %state.name, id = id.0, "state removed");
        }
        Ok(())
    }

    /// Adds a burst event between two states. Where the endpoint encodings
    /// already disagree on a non-dummy signal, the new burst is labelled
    /// with the implied rising or falling direction.
    pub fn add_event(&mut self, from: StateId, to: StateId) -> Result<EventId, ModelError> {
        if !self.states.contains_key(&from) {
            return Err(ModelError::UnknownState { id: from });
        }
        if !self.states.contains_key(&to) {
            return Err(ModelError::UnknownState { id: to });
        }

        let id = EventId(self.next_event);
        self.next_event += 1;
        self.events.insert(id, BurstEvent::new(from, to));

        let signals: Vec<SignalId> = self
            .signals
            .iter()
            .filter(|(_, s)| !s.kind.is_dummy())
            .map(|(id, _)| *id)
            .collect();
        for signal in signals {
            self.rederive(id, signal);
        }
        debug!(from = from.0, to = to.0, id = id.0, "burst event added");
        Ok(id)
    }

    /// Removes a burst event.
    pub fn remove_event(&mut self, id: EventId) -> Result<(), ModelError> {
        self.events
            .remove(&id)
            .map(|_| debug!(id = id.0, "burst event removed"))
            .ok_or(ModelError::UnknownEvent { id })
    }

    // =========================================================================
    // Value edits (consistency propagator entry points)
    // =========================================================================

    /// Sets one encoding entry. Incident bursts re-derive their direction
    /// for that signal from the updated endpoint encodings.
    pub fn set_encoding(
        &mut self,
        state: StateId,
        signal: SignalId,
        value: SignalState,
    ) -> Result<(), ModelError> {
        if !self.states.contains_key(&state) {
            return Err(ModelError::UnknownState { id: state });
        }
        if !self.signals.contains_key(&signal) {
            return Err(ModelError::UnknownSignal { id: signal });
        }
        debug!(state = state.0, signal = signal.0, %value, "encoding edit");
        self.write_encoding(state, signal, value);
        Ok(())
    }

    /// Sets one burst direction entry and forces the endpoint encodings it
    /// implies. Dummy signals never carry a direction.
    pub fn set_direction(
        &mut self,
        event: EventId,
        signal: SignalId,
        direction: Direction,
    ) -> Result<(), ModelError> {
        let (from, to) = {
            let e = self.event(event)?;
            (e.burst.from, e.burst.to)
        };
        let kind = self
            .signals
            .get(&signal)
            .map(|s| s.kind)
            .ok_or(ModelError::UnknownSignal { id: signal })?;
        if kind.is_dummy() {
            let name = self.signals[&signal].name.clone();
            return Err(ModelError::DummyDirection { name });
        }

        // Idempotent: an entry can only hold this value if its endpoint
        // encodings already agree with it.
        if self.events[&event].burst.get(signal) == Some(direction) {
            return Ok(());
        }

        debug!(event = event.0, signal = signal.0, %direction, "direction edit");
        if let Some(e) = self.events.get_mut(&event) {
            e.burst.direction.insert(signal, direction);
        }

        match direction {
            Direction::Plus => {
                self.write_encoding(from, signal, SignalState::Low);
                self.write_encoding(to, signal, SignalState::High);
            }
            Direction::Minus => {
                self.write_encoding(from, signal, SignalState::High);
                self.write_encoding(to, signal, SignalState::Low);
            }
            Direction::Unstable => {
                self.write_encoding(to, signal, SignalState::Ddc);
            }
            Direction::Clear => {
                if let Some(value) = self.states.get(&from).and_then(|s| s.value(signal)) {
                    self.write_encoding(to, signal, value);
                }
            }
        }
        Ok(())
    }

    /// Removes one burst direction entry. The endpoint encodings are left
    /// untouched (a partial direction map is always consistent).
    pub fn clear_direction(&mut self, event: EventId, signal: SignalId) -> Result<(), ModelError> {
        if !self.signals.contains_key(&signal) {
            return Err(ModelError::UnknownSignal { id: signal });
        }
        let e = self
            .events
            .get_mut(&event)
            .ok_or(ModelError::UnknownEvent { id: event })?;
        if e.burst.direction.remove(&signal).is_some() {
            debug!(event = event.0, signal = signal.0, "direction entry removed");
        }
        Ok(())
    }

    /// Sets the conditional expression text of an event. Syntax is checked
    /// eagerly; whether the named signals are declared conditionals is
    /// checked lazily by the distinguishability verification.
    pub fn set_conditional(
        &mut self,
        event: EventId,
        text: impl Into<String>,
    ) -> Result<(), ModelError> {
        let text = text.into();
        if !text.trim().is_empty() {
            ConditionalExpr::parse(&text)?;
        }
        let e = self
            .events
            .get_mut(&event)
            .ok_or(ModelError::UnknownEvent { id: event })?;
        e.conditional = text;
        Ok(())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Looks up a signal by identifier.
    pub fn signal(&self, id: SignalId) -> Result<&Signal, ModelError> {
        self.signals.get(&id).ok_or(ModelError::UnknownSignal { id })
    }

    /// Looks up a state by identifier.
    pub fn state(&self, id: StateId) -> Result<&XbmState, ModelError> {
        self.states.get(&id).ok_or(ModelError::UnknownState { id })
    }

    /// Looks up a burst event by identifier.
    pub fn event(&self, id: EventId) -> Result<&BurstEvent, ModelError> {
        self.events.get(&id).ok_or(ModelError::UnknownEvent { id })
    }

    /// Resolves a signal name to its identifier.
    pub fn signal_id(&self, name: &str) -> Option<SignalId> {
        self.signals
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| *id)
    }

    /// Resolves a state name to its identifier.
    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.states
            .iter()
            .find(|(_, s)| s.name == name)
            .map(|(id, _)| *id)
    }

    /// All declared signals, in identifier order.
    pub fn signals(&self) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals.iter().map(|(id, s)| (*id, s))
    }

    /// Declared signals of one kind.
    pub fn signals_of_kind(&self, kind: SignalKind) -> impl Iterator<Item = (SignalId, &Signal)> {
        self.signals
            .iter()
            .filter(move |(_, s)| s.kind == kind)
            .map(|(id, s)| (*id, s))
    }

    /// All states, in identifier order.
    pub fn states(&self) -> impl Iterator<Item = (StateId, &XbmState)> {
        self.states.iter().map(|(id, s)| (*id, s))
    }

    /// All burst events, in identifier order.
    pub fn events(&self) -> impl Iterator<Item = (EventId, &BurstEvent)> {
        self.events.iter().map(|(id, e)| (*id, e))
    }

    /// The full encoding of a state.
    pub fn encoding(&self, state: StateId) -> Result<&BTreeMap<SignalId, SignalState>, ModelError> {
        Ok(self.state(state)?.encoding())
    }

    /// The direction map of a burst event.
    pub fn direction(&self, event: EventId) -> Result<&BTreeMap<SignalId, Direction>, ModelError> {
        Ok(&self.event(event)?.burst.direction)
    }

    /// The direction map of a burst event restricted to signals of one kind.
    pub fn directions_of_kind(
        &self,
        event: EventId,
        kind: SignalKind,
    ) -> Result<BTreeMap<SignalId, Direction>, ModelError> {
        let e = self.event(event)?;
        Ok(e.burst
            .direction
            .iter()
            .filter(|(id, _)| self.signals.get(id).map(|s| s.kind) == Some(kind))
            .map(|(id, d)| (*id, *d))
            .collect())
    }

    /// The conditional expression text of an event; empty means
    /// unconditional.
    pub fn conditional(&self, event: EventId) -> Result<&str, ModelError> {
        Ok(self.event(event)?.conditional())
    }

    /// A burst is deterministic iff none of its changing signals are dummy.
    /// Downstream synthesis consults this to decide whether
    /// non-deterministic choice modelling is required.
    pub fn is_deterministic(&self, event: EventId) -> Result<bool, ModelError> {
        let e = self.event(event)?;
        Ok(e.burst
            .direction
            .keys()
            .all(|id| self.signals.get(id).map_or(false, |s| !s.kind.is_dummy())))
    }

    /// Events arriving at a state.
    pub fn preset_events(&self, state: StateId) -> Vec<EventId> {
        self.events
            .iter()
            .filter(|(_, e)| e.burst.to == state)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Events leaving a state.
    pub fn postset_events(&self, state: StateId) -> Vec<EventId> {
        self.events
            .iter()
            .filter(|(_, e)| e.burst.from == state)
            .map(|(id, _)| *id)
            .collect()
    }

    // =========================================================================
    // Propagation internals
    // =========================================================================

    fn incident_events(&self, state: StateId) -> Vec<EventId> {
        self.events
            .iter()
            .filter(|(_, e)| e.burst.from == state || e.burst.to == state)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Writes one encoding entry, suppressing no-ops, and re-derives the
    /// direction of that signal on every incident burst. No-op suppression
    /// is the sole cycle breaker: each ripple step either changes a value
    /// or is absorbed here.
    fn write_encoding(&mut self, state: StateId, signal: SignalId, value: SignalState) {
        let current = match self.states.get(&state).and_then(|s| s.value(signal)) {
            Some(v) => v,
            None => return,
        };
        if current == value {
            return;
        }
        if let Some(s) = self.states.get_mut(&state) {
            s.encoding.insert(signal, value);
        }
        trace!(state = state.0, signal = signal.0, old = %current, new = %value, "encoding write");

        let dummy = self.signals.get(&signal).map_or(true, |s| s.kind.is_dummy());
        if dummy {
            return;
        }
        for event in self.incident_events(state) {
            self.rederive(event, signal);
        }
    }

    /// Recomputes `direction[signal]` on one event from its endpoint
    /// encodings. Never forces encodings back.
    fn rederive(&mut self, event: EventId, signal: SignalId) {
        let (from, to, old) = match self.events.get(&event) {
            Some(e) => (e.burst.from, e.burst.to, e.burst.get(signal)),
            None => return,
        };
        let from_value = match self.states.get(&from).and_then(|s| s.value(signal)) {
            Some(v) => v,
            None => return,
        };
        let to_value = match self.states.get(&to).and_then(|s| s.value(signal)) {
            Some(v) => v,
            None => return,
        };

        let new = derive_direction(from_value, to_value, old);
        if new == old {
            return;
        }
        if let Some(e) = self.events.get_mut(&event) {
            match new {
                Some(d) => {
                    e.burst.direction.insert(signal, d);
                }
                None => {
                    e.burst.direction.remove(&signal);
                }
            }
        }
        trace!(event = event.0, signal = signal.0, ?old, ?new, "direction rederived");
    }

    fn remove_variable_from_conditionals(&mut self, name: &str) {
        for event in self.events.values_mut() {
            if event.conditional.is_empty() {
                continue;
            }
            // Unparseable text is left for the distinguishability check.
            let expr = match ConditionalExpr::parse(&event.conditional) {
                Ok(expr) => expr,
                Err(_) => continue,
            };
            if !expr.variables().contains(name) {
                continue;
            }
            let rewritten = expr.remove_variable(name);
            event.conditional = if rewritten == ConditionalExpr::Lit(true) {
                String::new()
            } else {
                rewritten.to_string()
            };
        }
    }

    fn rename_variable_in_conditionals(&mut self, old: &str, new: &str) {
        for event in self.events.values_mut() {
            if event.conditional.is_empty() {
                continue;
            }
            let mut expr = match ConditionalExpr::parse(&event.conditional) {
                Ok(expr) => expr,
                Err(_) => continue,
            };
            if !expr.variables().contains(old) {
                continue;
            }
            expr.rename_variable(old, new);
            event.conditional = expr.to_string();
        }
    }
}

/// The re-derivation table: the direction a burst carries for a signal
/// whose endpoint encodings are `from` and `to`, given the entry it
/// carried before (`old`).
///
/// | from     | to       | result                                    |
/// |----------|----------|-------------------------------------------|
/// | 0        | 1        | plus                                      |
/// | 1        | 0        | minus                                     |
/// | v        | v        | clear kept; unstable kept when v is X     |
/// | not X    | X        | unstable kept, else unset                 |
/// | X        | not X    | unset                                     |
///
/// Keeping an explicitly-set unstable or clear entry stable under its own
/// forced endpoint writes is what makes direction edits idempotent.
fn derive_direction(
    from: SignalState,
    to: SignalState,
    old: Option<Direction>,
) -> Option<Direction> {
    match (from, to) {
        (SignalState::Low, SignalState::High) => Some(Direction::Plus),
        (SignalState::High, SignalState::Low) => Some(Direction::Minus),
        (f, t) if f == t => match old {
            Some(Direction::Clear) => Some(Direction::Clear),
            Some(Direction::Unstable) if f == SignalState::Ddc => Some(Direction::Unstable),
            _ => None,
        },
        (_, SignalState::Ddc) => {
            if old == Some(Direction::Unstable) {
                Some(Direction::Unstable)
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn two_state_model() -> (Xbm, SignalId, SignalId, StateId, StateId, EventId) {
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        let b = xbm.add_signal("b", SignalKind::Output).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();
        (xbm, a, b, s0, s1, e)
    }

    #[test]
    fn test_totality_after_signal_addition() {
        let mut xbm = Xbm::new();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();

        for state in [s0, s1] {
            assert_eq!(xbm.state(state).unwrap().value(a), Some(SignalState::Ddc));
        }
    }

    #[test]
    fn test_totality_after_state_addition() {
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        let d = xbm.add_signal("d", SignalKind::Dummy).unwrap();
        let s0 = xbm.add_state("s0").unwrap();

        let encoding = xbm.encoding(s0).unwrap();
        assert_eq!(encoding.len(), 2);
        assert_eq!(encoding[&a], SignalState::Ddc);
        assert_eq!(encoding[&d], SignalState::Ddc);
    }

    #[test]
    fn test_plus_roundtrip() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Plus).unwrap();

        assert_eq!(xbm.state(s0).unwrap().value(a), Some(SignalState::Low));
        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::High));
        assert_eq!(xbm.event(e).unwrap().burst().get(a), Some(Direction::Plus));
    }

    #[test]
    fn test_minus_roundtrip() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Minus).unwrap();

        assert_eq!(xbm.state(s0).unwrap().value(a), Some(SignalState::High));
        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::Low));
    }

    #[test]
    fn test_unstable_forces_target_only() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_encoding(s1, a, SignalState::High).unwrap();
        xbm.set_direction(e, a, Direction::Unstable).unwrap();

        assert_eq!(xbm.state(s0).unwrap().value(a), Some(SignalState::Low));
        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::Ddc));
        assert_eq!(
            xbm.event(e).unwrap().burst().get(a),
            Some(Direction::Unstable)
        );
    }

    #[test]
    fn test_clear_passes_value_through() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_encoding(s1, a, SignalState::High).unwrap();
        xbm.set_direction(e, a, Direction::Clear).unwrap();

        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::Low));
        assert_eq!(xbm.event(e).unwrap().burst().get(a), Some(Direction::Clear));
    }

    #[test]
    fn test_encoding_edit_relabels_incident_bursts() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_encoding(s1, a, SignalState::High).unwrap();
        assert_eq!(xbm.event(e).unwrap().burst().get(a), Some(Direction::Plus));

        // Flip the source: high -> low is a falling transition.
        xbm.set_encoding(s0, a, SignalState::High).unwrap();
        xbm.set_encoding(s1, a, SignalState::Low).unwrap();
        assert_eq!(xbm.event(e).unwrap().burst().get(a), Some(Direction::Minus));
    }

    #[test]
    fn test_equal_encodings_unset_direction() {
        let (mut xbm, a, _, _, s1, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Plus).unwrap();
        xbm.set_encoding(s1, a, SignalState::Low).unwrap();

        assert_eq!(xbm.event(e).unwrap().burst().get(a), None);
    }

    #[test]
    fn test_ripple_through_chain() {
        // s0 -e1-> s1 -e2-> s2: a clear edit on e1 pushes the source value
        // into s1, which relabels e2.
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let s2 = xbm.add_state("s2").unwrap();
        let e1 = xbm.add_event(s0, s1).unwrap();
        let e2 = xbm.add_event(s1, s2).unwrap();

        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_encoding(s1, a, SignalState::High).unwrap();
        xbm.set_encoding(s2, a, SignalState::High).unwrap();
        xbm.set_direction(e1, a, Direction::Clear).unwrap();

        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::Low));
        assert_eq!(xbm.event(e2).unwrap().burst().get(a), Some(Direction::Plus));
        assert_eq!(xbm.event(e1).unwrap().burst().get(a), Some(Direction::Clear));
    }

    #[test]
    fn test_direction_edit_idempotent() {
        for direction in [
            Direction::Plus,
            Direction::Minus,
            Direction::Unstable,
            Direction::Clear,
        ] {
            let (mut once, a, _, _, _, e) = two_state_model();
            once.set_direction(e, a, direction).unwrap();

            let (mut twice, a2, _, _, _, e2) = two_state_model();
            twice.set_direction(e2, a2, direction).unwrap();
            twice.set_direction(e2, a2, direction).unwrap();

            assert_eq!(once, twice, "direction {direction} not idempotent");
        }
    }

    #[test]
    fn test_no_orphan_edges_after_state_removal() {
        let (mut xbm, _, _, s0, _, e) = two_state_model();
        xbm.remove_state(s0).unwrap();

        assert!(xbm.event(e).is_err());
        assert_eq!(xbm.events().count(), 0);
    }

    #[test]
    fn test_remove_signal_cascades() {
        // Scenario: a appears in a burst direction, in both encodings, and
        // in a conditional expression; removal clears all three.
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Conditional).unwrap();
        let b = xbm.add_signal("b", SignalKind::Input).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();
        xbm.set_direction(e, b, Direction::Plus).unwrap();
        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_conditional(e, "a && b").unwrap();

        xbm.remove_signal(a).unwrap();

        assert!(!xbm.encoding(s0).unwrap().contains_key(&a));
        assert!(!xbm.encoding(s1).unwrap().contains_key(&a));
        assert!(!xbm.direction(e).unwrap().contains_key(&a));
        assert_eq!(xbm.conditional(e).unwrap(), "b");
    }

    #[test]
    fn test_remove_signal_with_direction_entry() {
        let (mut xbm, a, _, _, _, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Plus).unwrap();
        xbm.remove_signal(a).unwrap();

        assert!(xbm.direction(e).unwrap().is_empty());
    }

    #[test]
    fn test_remove_only_conditional_variable_leaves_unconditional() {
        let mut xbm = Xbm::new();
        let c = xbm.add_signal("sel", SignalKind::Conditional).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();
        xbm.set_conditional(e, "!sel").unwrap();

        xbm.remove_signal(c).unwrap();
        assert_eq!(xbm.conditional(e).unwrap(), "");
    }

    #[test]
    fn test_rename_signal_resynthesizes_conditionals() {
        let mut xbm = Xbm::new();
        let c = xbm.add_signal("sel", SignalKind::Conditional).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();
        xbm.set_conditional(e, "!sel").unwrap();

        xbm.rename_signal(c, "mode").unwrap();

        assert_eq!(xbm.signal(c).unwrap().name, "mode");
        assert_eq!(xbm.conditional(e).unwrap(), "!mode");
    }

    #[test]
    fn test_rename_signal_collision_rejected() {
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        xbm.add_signal("b", SignalKind::Input).unwrap();

        assert!(matches!(
            xbm.rename_signal(a, "b"),
            Err(ModelError::SignalExists { .. })
        ));
        assert_eq!(xbm.signal(a).unwrap().name, "a");
    }

    #[test]
    fn test_rename_signal_to_own_name_is_noop() {
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        xbm.rename_signal(a, "a").unwrap();
        assert_eq!(xbm.signal(a).unwrap().name, "a");
    }

    #[test]
    fn test_dummy_direction_rejected_without_side_effects() {
        let mut xbm = Xbm::new();
        let d = xbm.add_signal("d", SignalKind::Dummy).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();
        let before = xbm.clone();

        let result = xbm.set_direction(e, d, Direction::Plus);
        assert!(matches!(result, Err(ModelError::DummyDirection { .. })));
        assert_eq!(xbm, before);
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut xbm = Xbm::new();
        xbm.add_signal("a", SignalKind::Input).unwrap();
        assert!(matches!(
            xbm.add_signal("a", SignalKind::Output),
            Err(ModelError::SignalExists { .. })
        ));

        xbm.add_state("s0").unwrap();
        assert!(matches!(
            xbm.add_state("s0"),
            Err(ModelError::StateExists { .. })
        ));
    }

    #[test]
    fn test_stale_identifiers_rejected() {
        let (mut xbm, a, _, s0, _, e) = two_state_model();
        xbm.remove_signal(a).unwrap();

        assert!(matches!(
            xbm.set_encoding(s0, a, SignalState::Low),
            Err(ModelError::UnknownSignal { .. })
        ));
        assert!(matches!(
            xbm.set_direction(e, a, Direction::Plus),
            Err(ModelError::UnknownSignal { .. })
        ));
    }

    #[test]
    fn test_add_event_derives_initial_labels() {
        let mut xbm = Xbm::new();
        let a = xbm.add_signal("a", SignalKind::Input).unwrap();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        xbm.set_encoding(s0, a, SignalState::Low).unwrap();
        xbm.set_encoding(s1, a, SignalState::High).unwrap();

        let e = xbm.add_event(s0, s1).unwrap();
        assert_eq!(xbm.event(e).unwrap().burst().get(a), Some(Direction::Plus));
    }

    #[test]
    fn test_is_deterministic() {
        let (mut xbm, a, _, _, _, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Plus).unwrap();
        assert!(xbm.is_deterministic(e).unwrap());
    }

    #[test]
    fn test_set_conditional_rejects_bad_syntax() {
        let (mut xbm, _, _, _, _, e) = two_state_model();
        assert!(matches!(
            xbm.set_conditional(e, "a &&"),
            Err(ModelError::InvalidConditional { .. })
        ));
        assert_eq!(xbm.conditional(e).unwrap(), "");
    }

    #[test]
    fn test_clear_direction_removes_entry_only() {
        let (mut xbm, a, _, s0, s1, e) = two_state_model();
        xbm.set_direction(e, a, Direction::Plus).unwrap();
        xbm.clear_direction(e, a).unwrap();

        assert_eq!(xbm.event(e).unwrap().burst().get(a), None);
        assert_eq!(xbm.state(s0).unwrap().value(a), Some(SignalState::Low));
        assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::High));
    }

    #[test]
    fn test_preset_postset() {
        let mut xbm = Xbm::new();
        let s0 = xbm.add_state("s0").unwrap();
        let s1 = xbm.add_state("s1").unwrap();
        let e = xbm.add_event(s0, s1).unwrap();

        assert_eq!(xbm.postset_events(s0), vec![e]);
        assert_eq!(xbm.preset_events(s1), vec![e]);
        assert!(xbm.preset_events(s0).is_empty());
    }

    fn signal_state_strategy() -> impl Strategy<Value = SignalState> {
        prop_oneof![
            Just(SignalState::Low),
            Just(SignalState::High),
            Just(SignalState::Ddc),
        ]
    }

    fn direction_strategy() -> impl Strategy<Value = Direction> {
        prop_oneof![
            Just(Direction::Plus),
            Just(Direction::Minus),
            Just(Direction::Unstable),
            Just(Direction::Clear),
        ]
    }

    proptest! {
        // P3: a direction edit applied twice leaves the graph exactly as
        // applying it once, from any prior encodings.
        #[test]
        fn prop_direction_edit_idempotent(
            from_value in signal_state_strategy(),
            to_value in signal_state_strategy(),
            direction in direction_strategy(),
        ) {
            let (mut once, a, _, s0, s1, e) = two_state_model();
            once.set_encoding(s0, a, from_value).unwrap();
            once.set_encoding(s1, a, to_value).unwrap();
            let (mut twice, _, _, _, _, _) = two_state_model();
            twice.set_encoding(s0, a, from_value).unwrap();
            twice.set_encoding(s1, a, to_value).unwrap();

            once.set_direction(e, a, direction).unwrap();
            twice.set_direction(e, a, direction).unwrap();
            twice.set_direction(e, a, direction).unwrap();

            prop_assert_eq!(once, twice);
        }

        // Direction edits on distinct signals of the same burst commute.
        #[test]
        fn prop_distinct_signal_edits_commute(
            d1 in direction_strategy(),
            d2 in direction_strategy(),
        ) {
            let (mut left, a, b, _, _, e) = two_state_model();
            left.set_direction(e, a, d1).unwrap();
            left.set_direction(e, b, d2).unwrap();

            let (mut right, _, _, _, _, _) = two_state_model();
            right.set_direction(e, b, d2).unwrap();
            right.set_direction(e, a, d1).unwrap();

            prop_assert_eq!(left, right);
        }

        // P2 as a property: plus always lands 0 -> 1 regardless of the
        // previous encodings.
        #[test]
        fn prop_plus_forces_low_high(
            from_value in signal_state_strategy(),
            to_value in signal_state_strategy(),
        ) {
            let (mut xbm, a, _, s0, s1, e) = two_state_model();
            xbm.set_encoding(s0, a, from_value).unwrap();
            xbm.set_encoding(s1, a, to_value).unwrap();

            xbm.set_direction(e, a, Direction::Plus).unwrap();

            prop_assert_eq!(xbm.state(s0).unwrap().value(a), Some(SignalState::Low));
            prop_assert_eq!(xbm.state(s1).unwrap().value(a), Some(SignalState::High));
        }
    }
}
