//! Membership reconciliation.
//!
//! Compares the previously recorded instance set of a private network with
//! the desired one and produces the operations needed to converge.

pub mod retry;

use std::collections::BTreeSet;

use crate::clients::InstanceId;

/// Unassign/assign operations for one reconciliation pass.
///
/// Removals are applied before additions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_remove: Vec<InstanceId>,
    pub to_add: Vec<InstanceId>,
}

impl MembershipPlan {
    pub fn is_empty(&self) -> bool {
        self.to_remove.is_empty() && self.to_add.is_empty()
    }
}

/// Compute `old - new` (to remove) and `new - old` (to add).
pub fn plan(old: &BTreeSet<InstanceId>, new: &BTreeSet<InstanceId>) -> MembershipPlan {
    MembershipPlan {
        to_remove: old.difference(new).copied().collect(),
        to_add: new.difference(old).copied().collect(),
    }
}
