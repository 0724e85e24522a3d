//! Selected-row state and payable batch selection
//!
//! The dashboard's selected rows are plain data owned by the caller. Nothing
//! here holds state between calls.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use core_kernel::CommissionId;

use crate::commission::Commission;
use crate::eligibility::is_eligible_for_payout;

/// Returns exactly the commissions whose id is in `selected_ids`
///
/// Ids with no matching commission are ignored. Snapshot order is kept.
pub fn select_payable_batch<'a>(
    commissions: &'a [Commission],
    selected_ids: &[CommissionId],
) -> Vec<&'a Commission> {
    let wanted: BTreeSet<&str> = selected_ids.iter().map(CommissionId::as_str).collect();
    commissions
        .iter()
        .filter(|c| wanted.contains(c.id.as_str()))
        .collect()
}

/// Set of selected commission ids
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    ids: BTreeSet<CommissionId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the selection state of `id`; returns true if it is now selected
    pub fn toggle(&mut self, id: &CommissionId) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.clone());
            true
        }
    }

    pub fn select(&mut self, id: CommissionId) {
        self.ids.insert(id);
    }

    pub fn deselect(&mut self, id: &CommissionId) {
        self.ids.remove(id);
    }

    pub fn is_selected(&self, id: &CommissionId) -> bool {
        self.ids.contains(id)
    }

    /// Selects every commission eligible for payout at `now`
    pub fn select_all_eligible(&mut self, commissions: &[Commission], now: DateTime<Utc>) {
        self.ids.extend(
            commissions
                .iter()
                .filter(|c| is_eligible_for_payout(c, now))
                .map(|c| c.id.clone()),
        );
    }

    /// Drops ids no longer present in a refreshed snapshot
    pub fn retain_present(&mut self, commissions: &[Commission]) {
        let present: BTreeSet<&str> = commissions.iter().map(|c| c.id.as_str()).collect();
        self.ids.retain(|id| present.contains(id.as_str()));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in sorted order
    pub fn ids(&self) -> Vec<CommissionId> {
        self.ids.iter().cloned().collect()
    }
}

impl FromIterator<CommissionId> for Selection {
    fn from_iter<T: IntoIterator<Item = CommissionId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
