//! Physical cash inventory
//!
//! This module provides the `CashInventory` struct, the authoritative count
//! of notes per denomination. All mutation goes through `apply_delta`,
//! which is atomic: either every slot moves by its delta and all resulting
//! counts stay non-negative, or nothing changes at all. That all-or-nothing
//! contract is what keeps a two-denomination exchange from leaving half an
//! update behind.
//!
//! A monotonically increasing version number is bumped on every committed
//! delta. `apply_delta_versioned` lets a caller that planned against a
//! snapshot detect a conflicting interleaved commit and fail with a
//! retryable `ConcurrentModification` instead of silently overwriting.

use crate::types::{AtmError, Denomination};
use std::collections::BTreeMap;

/// Read-only copy of the inventory at a point in time
///
/// Carries the version the copy was taken at so the snapshot can later be
/// validated against the live inventory at commit time.
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySnapshot {
    /// Note count per denomination
    pub counts: BTreeMap<Denomination, u32>,

    /// Inventory version at snapshot time
    pub version: u64,
}

/// Authoritative note counts for the single physical cash supply
///
/// One `CashInventory` is shared by all accounts; a physical ATM has one
/// cash supply. Slots persist at count zero rather than being removed, so
/// the set of known denominations is stable.
#[derive(Debug, Clone, Default)]
pub struct CashInventory {
    /// Notes per denomination, keyed ascending
    counts: BTreeMap<Denomination, u32>,

    /// Bumped on every committed delta
    version: u64,
}

impl CashInventory {
    /// Create an empty inventory with no denomination slots
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an inventory from `(denomination, count)` pairs
    pub fn with_stock(stock: impl IntoIterator<Item = (Denomination, u32)>) -> Self {
        CashInventory {
            counts: stock.into_iter().collect(),
            version: 0,
        }
    }

    /// Whether the inventory tracks a slot for `denomination`
    pub fn has_slot(&self, denomination: Denomination) -> bool {
        self.counts.contains_key(&denomination)
    }

    /// Notes currently held for `denomination` (0 for unknown slots)
    pub fn count(&self, denomination: Denomination) -> u32 {
        self.counts.get(&denomination).copied().unwrap_or(0)
    }

    /// Take a read-only copy of the current counts and version
    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            counts: self.counts.clone(),
            version: self.version,
        }
    }

    /// Total cash value held, for conservation checks
    pub fn total_value(&self) -> u64 {
        self.counts
            .iter()
            .map(|(denom, count)| u64::from(*denom) * u64::from(*count))
            .sum()
    }

    /// Apply a signed delta to every referenced slot, atomically
    ///
    /// Validation happens before any mutation:
    /// - every referenced denomination must be a known slot
    ///   (`UnknownDenomination`)
    /// - no resulting count may go negative (`InsufficientStock`, naming
    ///   the largest offending denomination)
    /// - no resulting count may exceed `u32::MAX`
    ///   (`SlotCapacityExceeded`)
    ///
    /// On any validation failure no count changes.
    ///
    /// # Arguments
    ///
    /// * `delta` - Signed note-count change per denomination
    ///
    /// # Returns
    ///
    /// * `Ok(())` - All slots moved and the version was bumped
    /// * `Err(AtmError)` - Nothing changed
    pub fn apply_delta(&mut self, delta: &BTreeMap<Denomination, i64>) -> Result<(), AtmError> {
        // Validate every slot first, largest denomination first, so the
        // reported shortfall is deterministic.
        for (denomination, change) in delta.iter().rev() {
            let current = match self.counts.get(denomination) {
                Some(count) => i64::from(*count),
                None => {
                    return Err(AtmError::UnknownDenomination {
                        denomination: *denomination,
                    })
                }
            };

            // current is at most u32::MAX, so only a huge positive change
            // can overflow the i64 sum; treat that as a full slot too
            let resulting = current.checked_add(*change);

            match resulting {
                Some(resulting) if resulting < 0 => {
                    return Err(AtmError::insufficient_stock(
                        *denomination,
                        current as u32,
                        change.unsigned_abs() as u32,
                    ));
                }
                Some(resulting) if resulting <= i64::from(u32::MAX) => {}
                _ => {
                    // Only reachable with change > 0; clamp for reporting
                    let requested = change.unsigned_abs().min(u64::from(u32::MAX)) as u32;
                    return Err(AtmError::slot_capacity_exceeded(
                        *denomination,
                        current as u32,
                        requested,
                    ));
                }
            }
        }

        // Commit: every slot validated, so these adds stay within u32
        for (denomination, change) in delta {
            if let Some(count) = self.counts.get_mut(denomination) {
                *count = (i64::from(*count) + change) as u32;
            }
        }
        self.version += 1;

        Ok(())
    }

    /// Apply a delta only if the inventory has not moved since `expected_version`
    ///
    /// Used by the concurrent engine: the allocation plan was computed from
    /// a snapshot, and a commit that lands on a different version would be
    /// dispensing notes the plan never saw.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Delta applied
    /// * `Err(ConcurrentModification)` - The inventory moved; retry from a
    ///   fresh snapshot
    /// * `Err(_)` - Same failures as [`apply_delta`](Self::apply_delta)
    pub fn apply_delta_versioned(
        &mut self,
        expected_version: u64,
        delta: &BTreeMap<Denomination, i64>,
    ) -> Result<(), AtmError> {
        if self.version != expected_version {
            return Err(AtmError::concurrent_modification("inventory"));
        }
        self.apply_delta(delta)
    }
}
