//! Greedy denomination allocator
//!
//! Given a target amount and a snapshot of available notes, computes which
//! notes to dispense or reports that the amount cannot be composed. The
//! allocator performs no mutation; it is a pure function over a snapshot,
//! so the UI can safely reuse it to preview what a customer would receive
//! before the engine commits anything.
//!
//! # Algorithm
//!
//! Denominations with stock are visited largest first; each contributes
//! `min(remaining / denom, available)` notes. The walk stops when the
//! remainder hits zero (success) or no denomination can make further
//! progress (`Unsatisfiable`, never a partial plan).
//!
//! Greedy dispensing is exact for the standard note values this machine
//! holds, but is not complete for arbitrary denomination sets; a composable
//! amount the greedy rule walks past is still reported `Unsatisfiable`.

use crate::types::{AtmError, Denomination};
use std::collections::BTreeMap;

/// Compute a dispensing plan for `amount` from the given note counts
///
/// # Arguments
///
/// * `amount` - Target value in whole currency units
/// * `counts` - Available notes per denomination (a snapshot)
///
/// # Returns
///
/// * `Ok(plan)` - Denomination to note-count mapping whose total value
///   equals `amount`; every count is within the available stock. An amount
///   of zero yields an empty plan.
/// * `Err(Unsatisfiable)` - The amount cannot be composed; nothing to
///   dispense.
pub fn allocate(
    amount: u64,
    counts: &BTreeMap<Denomination, u32>,
) -> Result<BTreeMap<Denomination, u32>, AtmError> {
    let mut plan = BTreeMap::new();
    let mut remaining = amount;

    // Largest denomination first
    for (denomination, available) in counts.iter().rev() {
        if remaining == 0 {
            break;
        }
        if *available == 0 {
            continue;
        }

        let denom_value = u64::from(*denomination);
        let notes_needed = remaining / denom_value;
        let notes_taken = notes_needed.min(u64::from(*available));

        if notes_taken > 0 {
            plan.insert(*denomination, notes_taken as u32);
            remaining -= notes_taken * denom_value;
        }
    }

    if remaining > 0 {
        return Err(AtmError::Unsatisfiable { amount });
    }

    Ok(plan)
}

/// Total value of an allocation plan, for invariant checks
pub fn plan_value(plan: &BTreeMap<Denomination, u32>) -> u64 {
    plan.iter()
        .map(|(denom, count)| u64::from(*denom) * u64::from(*count))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn stock(pairs: &[(Denomination, u32)]) -> BTreeMap<Denomination, u32> {
        pairs.iter().copied().collect()
    }

    #[rstest]
    #[case::largest_first(
        2700,
        &[(100, 20), (500, 10), (2000, 5)],
        &[(2000, 1), (500, 1), (100, 2)]
    )]
    #[case::single_denomination(1500, &[(500, 10)], &[(500, 3)])]
    #[case::falls_through_when_large_runs_out(
        5000,
        &[(2000, 2), (500, 2), (100, 10)],
        &[(2000, 2), (500, 2)]
    )]
    #[case::skips_empty_slots(700, &[(2000, 0), (500, 1), (100, 2)], &[(500, 1), (100, 2)])]
    #[case::zero_amount_empty_plan(0, &[(500, 10)], &[])]
    fn test_allocate_success(
        #[case] amount: u64,
        #[case] available: &[(Denomination, u32)],
        #[case] expected: &[(Denomination, u32)],
    ) {
        let plan = allocate(amount, &stock(available)).unwrap();
        assert_eq!(plan, expected.iter().copied().collect());
        assert_eq!(plan_value(&plan), amount);
    }

    #[rstest]
    #[case::not_enough_cash(700, &[(500, 1)])]
    #[case::no_exact_change(250, &[(100, 20), (500, 10)])]
    #[case::empty_inventory(100, &[])]
    #[case::all_slots_empty(100, &[(100, 0), (500, 0)])]
    // Classic greedy counterexample: 600 = 3x200 exists, but greedy takes
    // the 500 note first and strands the remainder. Stays Unsatisfiable by
    // design.
    #[case::greedy_walks_past_solution(600, &[(500, 1), (200, 3)])]
    fn test_allocate_unsatisfiable(#[case] amount: u64, #[case] available: &[(Denomination, u32)]) {
        let err = allocate(amount, &stock(available)).unwrap_err();
        assert_eq!(err, AtmError::Unsatisfiable { amount });
    }

    #[test]
    fn test_plan_never_exceeds_stock() {
        let available = stock(&[(100, 3), (500, 2), (2000, 1)]);
        let plan = allocate(3300, &available).unwrap();

        for (denomination, count) in &plan {
            assert!(count <= &available[denomination]);
        }
        assert_eq!(plan_value(&plan), 3300);
    }

    #[test]
    fn test_allocator_does_not_mutate_input() {
        let available = stock(&[(100, 20), (500, 10)]);
        let before = available.clone();

        let _ = allocate(700, &available);
        let _ = allocate(999_999, &available);

        assert_eq!(available, before);
    }
}
