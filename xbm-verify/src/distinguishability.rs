//! Distinguishability constraint check.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;
use xbm_core::{ConditionalExpr, Direction, EventId, SignalId, SignalKind, StateId, Xbm};

/// A pair of competing events whose conditionals can hold together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionalConflict {
    /// The pair, smaller identifier first.
    pub events: (EventId, EventId),

    /// An assignment of conditional signals under which both events are
    /// enabled at once.
    pub overlap: BTreeMap<String, bool>,
}

/// A conditional expression the check could not fully trust.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpressionIssue {
    pub event: EventId,
    pub reason: String,
}

/// Witness for a distinguishability failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistinguishabilityWitness {
    pub conflicts: Vec<ConditionalConflict>,

    /// Reference and syntax errors are diagnosed here, lazily, so that
    /// signal removal never faults an unrelated edit.
    pub expression_errors: Vec<ExpressionIssue>,
}

/// Events leaving the same state with equal input change sets compete at
/// the same point; their conditional expressions must be pairwise
/// mutually exclusive. Satisfiability of each conjunction is decided by
/// exhausting assignments over the pair's free variables. An absent
/// conditional is `true`, so two unconditional competitors always
/// conflict.
pub fn distinguishability(xbm: &Xbm) -> Result<(), DistinguishabilityWitness> {
    let declared: Vec<&str> = xbm
        .signals_of_kind(SignalKind::Conditional)
        .map(|(_, s)| s.name.as_str())
        .collect();

    let mut expression_errors = Vec::new();
    let mut parsed: BTreeMap<EventId, Option<ConditionalExpr>> = BTreeMap::new();
    for (id, event) in xbm.events() {
        let text = event.conditional();
        if text.trim().is_empty() {
            parsed.insert(id, Some(ConditionalExpr::Lit(true)));
            continue;
        }
        match ConditionalExpr::parse(text) {
            Ok(expr) => {
                for name in expr.variables() {
                    if !declared.contains(&name.as_str()) {
                        expression_errors.push(ExpressionIssue {
                            event: id,
                            reason: format!("'{name}' is not a declared conditional signal"),
                        });
                    }
                }
                parsed.insert(id, Some(expr));
            }
            Err(err) => {
                expression_errors.push(ExpressionIssue {
                    event: id,
                    reason: err.to_string(),
                });
                parsed.insert(id, None);
            }
        }
    }

    // Competitors: same source state, identical input change set.
    let mut groups: HashMap<(StateId, Vec<(SignalId, Direction)>), Vec<EventId>> = HashMap::new();
    for (id, event) in xbm.events() {
        if let Ok(inputs) = xbm.directions_of_kind(id, SignalKind::Input) {
            let key = (event.from(), inputs.into_iter().collect());
            groups.entry(key).or_default().push(id);
        }
    }

    let mut conflicts = Vec::new();
    for members in groups.values() {
        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                let (e1, e2) = (members[i], members[j]);
                // Unparseable text is already an issue; skip the pair.
                let x1 = match parsed.get(&e1) {
                    Some(Some(expr)) => expr,
                    _ => continue,
                };
                let x2 = match parsed.get(&e2) {
                    Some(Some(expr)) => expr,
                    _ => continue,
                };
                if let Some(overlap) = satisfiable_together(x1, x2) {
                    conflicts.push(ConditionalConflict {
                        events: (e1, e2),
                        overlap,
                    });
                }
            }
        }
    }
    conflicts.sort_by_key(|c| c.events);

    if conflicts.is_empty() && expression_errors.is_empty() {
        Ok(())
    } else {
        debug!(
            conflicts = conflicts.len(),
            errors = expression_errors.len(),
            "distinguishability violated"
        );
        Err(DistinguishabilityWitness {
            conflicts,
            expression_errors,
        })
    }
}

/// Finds an assignment satisfying both expressions, if one exists.
fn satisfiable_together(
    a: &ConditionalExpr,
    b: &ConditionalExpr,
) -> Option<BTreeMap<String, bool>> {
    let mut vars: Vec<String> = a.variables().into_iter().collect();
    for name in b.variables() {
        if !vars.contains(&name) {
            vars.push(name);
        }
    }
    let mut assignment = BTreeMap::new();
    if search(a, b, &vars, &mut assignment) {
        Some(assignment)
    } else {
        None
    }
}

fn search(
    a: &ConditionalExpr,
    b: &ConditionalExpr,
    vars: &[String],
    assignment: &mut BTreeMap<String, bool>,
) -> bool {
    match vars.split_first() {
        None => a.evaluate(assignment) && b.evaluate(assignment),
        Some((head, rest)) => {
            for value in [false, true] {
                assignment.insert(head.clone(), value);
                if search(a, b, rest, assignment) {
                    return true;
                }
            }
            assignment.remove(head);
            false
        }
    }
}
