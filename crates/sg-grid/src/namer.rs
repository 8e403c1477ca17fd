//! Deterministic step naming for slots that may hold alternatives.

use sg_types::{Conjunction, NodeRef, Value};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Base name of a slot whose alternatives have differing types.
pub const ALTERNATIVES_NAME: &str = "alt";

/// A tree position: one fixed value, or an ordered list of alternatives.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    One(Value),
    Alternatives(Vec<Value>),
}

impl Slot {
    fn into_candidates(self) -> Vec<Value> {
        match self {
            Slot::One(value) => vec![value],
            Slot::Alternatives(values) if values.is_empty() => vec![Value::None],
            Slot::Alternatives(values) => values,
        }
    }
}

impl From<Value> for Slot {
    fn from(value: Value) -> Self {
        Slot::One(value)
    }
}

impl From<NodeRef> for Slot {
    fn from(node: NodeRef) -> Self {
        Slot::One(Value::Node(node))
    }
}

impl From<&NodeRef> for Slot {
    fn from(node: &NodeRef) -> Self {
        Slot::One(Value::from(node))
    }
}

impl From<Option<NodeRef>> for Slot {
    fn from(node: Option<NodeRef>) -> Self {
        Slot::One(Value::from(node))
    }
}

impl From<Vec<Value>> for Slot {
    fn from(values: Vec<Value>) -> Self {
        Slot::Alternatives(values)
    }
}

impl From<Vec<Option<NodeRef>>> for Slot {
    fn from(nodes: Vec<Option<NodeRef>>) -> Self {
        Slot::Alternatives(nodes.into_iter().map(Value::from).collect())
    }
}

/// Named representatives plus the grid entries for multi-candidate slots.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedSteps {
    pub steps: Vec<(String, Value)>,
    pub grid: Conjunction,
}

fn base_name(candidates: &[Value]) -> String {
    let identities: HashSet<String> = candidates
        .iter()
        .filter(|candidate| !candidate.is_none())
        .map(Value::type_identity)
        .collect();

    match identities.len() {
        0 => Value::None.type_identity(),
        1 => identities.into_iter().next().unwrap_or_default(),
        _ => ALTERNATIVES_NAME.to_string(),
    }
}

/// Derive unique step names from candidate types.
///
/// A slot is named after the lowercase type of its candidates, or `alt` when
/// they differ; `None` candidates only count when nothing else is present.
/// Names shared by several slots get a 1-based suffix in slot order. Each
/// slot is represented by its first candidate, and slots with more than one
/// candidate are listed in the returned grid under their final name.
pub fn name_slots<I>(slots: I) -> NamedSteps
where
    I: IntoIterator,
    I::Item: Into<Slot>,
{
    let slots: Vec<Vec<Value>> = slots
        .into_iter()
        .map(|slot| Into::<Slot>::into(slot).into_candidates())
        .collect();
    let bases: Vec<String> = slots.iter().map(|c| base_name(c)).collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *totals.entry(base.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut steps = Vec::with_capacity(slots.len());
    let mut grid = Conjunction::new();

    for (candidates, base) in slots.into_iter().zip(&bases) {
        let name = if totals[base.as_str()] > 1 {
            let index = seen.entry(base.as_str()).or_default();
            *index += 1;
            format!("{base}-{index}")
        } else {
            base.clone()
        };

        let representative = candidates.first().cloned().unwrap_or(Value::None);
        if candidates.len() > 1 {
            grid.insert(name.clone(), candidates);
        }
        steps.push((name, representative));
    }

    debug!(
        "Named {} step(s), {} with alternatives",
        steps.len(),
        grid.len()
    );
    NamedSteps { steps, grid }
}
