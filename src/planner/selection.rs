use std::collections::BTreeMap;

use super::plan::{ChangeType, Plan};

/// Caller-owned overrides of the `selected` flag, keyed by plan index.
///
/// The engine never edits a plan in place; `Plan::with_selection` produces a
/// fresh copy with these overrides applied. Indices past the end are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    overrides: BTreeMap<usize, bool>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, index: usize, selected: bool) -> &mut Self {
        self.overrides.insert(index, selected);
        self
    }

    pub fn select(&mut self, index: usize) -> &mut Self {
        self.set(index, true)
    }

    pub fn deselect(&mut self, index: usize) -> &mut Self {
        self.set(index, false)
    }

    pub fn get(&self, index: usize) -> Option<bool> {
        self.overrides.get(&index).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }

    /// Select every change of the given types and deselect everything else
    pub fn only_types(plan: &Plan, types: &[ChangeType]) -> Self {
        let overrides = plan
            .iter()
            .enumerate()
            .map(|(index, change)| (index, types.contains(&change.change_type())))
            .collect();
        Self { overrides }
    }

    /// Deselect every change in the plan
    pub fn none(plan: &Plan) -> Self {
        Self::only_types(plan, &[])
    }
}
