use itertools::Itertools;
use uuid::Uuid;

use crate::core::models::filter::{Predicate, Value};

/// The branches a caller's queries are restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchScope {
    /// Privileged caller with no explicit selection.
    Unrestricted,
    Branches(Vec<Uuid>),
    /// Nothing is visible. Callers must short-circuit instead of querying.
    Empty,
}

impl BranchScope {
    /// An explicit selection narrows the scope; for a non-privileged caller it can
    /// never widen it past the assigned branches.
    pub fn resolve(can_manage_all_data: bool, assigned: &[Uuid], selected: &[Uuid]) -> Self {
        let branches: Vec<Uuid> = if can_manage_all_data {
            if selected.is_empty() {
                return BranchScope::Unrestricted;
            }
            selected.iter().copied().unique().collect()
        } else if selected.is_empty() {
            assigned.iter().copied().unique().collect()
        } else {
            selected.iter().copied().filter(|b| assigned.contains(b)).unique().collect()
        };
        if branches.is_empty() {
            BranchScope::Empty
        } else {
            BranchScope::Branches(branches)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, BranchScope::Empty)
    }

    /// Inclusion predicate for `field`. An empty scope still yields a predicate that
    /// matches nothing, so a missed short-circuit can never run unscoped.
    pub fn predicate(&self, field: &'static str) -> Option<Predicate> {
        match self {
            BranchScope::Unrestricted => None,
            BranchScope::Branches(ids) => Some(Predicate::InOrNull {
                field,
                values: ids.iter().copied().map(Value::Uuid).collect(),
            }),
            BranchScope::Empty => Some(Predicate::In { field, values: vec![] }),
        }
    }

    /// Whether a row in `branch` is visible. Rows without a branch are visible to everyone.
    pub fn admits(&self, branch: Option<Uuid>) -> bool {
        match (self, branch) {
            (BranchScope::Empty, _) => false,
            (_, None) | (BranchScope::Unrestricted, _) => true,
            (BranchScope::Branches(ids), Some(b)) => ids.contains(&b),
        }
    }

    /// Whether a row in `branch` may be written. Organization-wide rows need an unrestricted scope.
    pub fn permits_write(&self, branch: Option<Uuid>) -> bool {
        match (self, branch) {
            (BranchScope::Unrestricted, _) => true,
            (BranchScope::Branches(ids), Some(b)) => ids.contains(&b),
            _ => false,
        }
    }
}
