// ── Collection differ ──
//
// Some fields are "leave unchanged" when omitted from an update, so a
// removal has to be sent explicitly. These helpers compare the last
// applied collection with the current one. They are only meaningful on
// update: a fresh create has no applied state to compare against.

use std::collections::BTreeSet;

use crate::state::StateStore;
use crate::value::FieldValue;

/// Elements present at the last apply and absent now.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDiff {
    pub removed: BTreeSet<FieldValue>,
}

impl CollectionDiff {
    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }

    /// Removed string elements, e.g. unlinked template IDs.
    pub fn removed_strings(&self) -> Vec<String> {
        self.removed
            .iter()
            .filter_map(FieldValue::as_str)
            .map(str::to_owned)
            .collect()
    }
}

fn elements(value: FieldValue) -> BTreeSet<FieldValue> {
    match value {
        FieldValue::Set(items) => items,
        FieldValue::List(items) => items.into_iter().collect(),
        _ => BTreeSet::new(),
    }
}

pub fn diff(state: &dyn StateStore, field: &str) -> CollectionDiff {
    let (old, new) = state.change(field);
    let new = elements(new);
    CollectionDiff {
        removed: elements(old)
            .into_iter()
            .filter(|e| !new.contains(e))
            .collect(),
    }
}

/// `true` when a non-empty collection became empty.
pub fn emptied(state: &dyn StateStore, field: &str) -> bool {
    let (old, new) = state.change(field);
    !old.is_zero() && new.is_zero()
}
