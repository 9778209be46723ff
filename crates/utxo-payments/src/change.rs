//! Weighted change schedules for UTXO-pool maintenance.

/// Result of distributing residual value across a weighted schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeSplit {
    /// Surviving change amounts, weight-ascending.
    pub outputs: Vec<u64>,
    /// Value not assigned to any output (dropped shares plus flooring
    /// remainders).
    pub loose: u64,
}

/// Split `total` across `target_count` outputs weighted `2^0..2^(k-1)`,
/// dropping any share at or below `floor`. Never loses a base unit:
/// `sum(outputs) + loose == total`.
pub fn split_change(total: u64, target_count: usize, floor: u64) -> ChangeSplit {
    if total == 0 || target_count == 0 {
        return ChangeSplit {
            outputs: Vec::new(),
            loose: total,
        };
    }
    debug_assert!(target_count < 64, "weight schedule would overflow");
    let weights: Vec<u64> = (0..target_count).map(|i| 1u64 << i).collect();
    let weight_sum: u64 = weights.iter().sum();
    let mut outputs = Vec::with_capacity(target_count);
    let mut allocated = 0u64;
    for weight in &weights {
        let share = ((total as u128 * *weight as u128) / weight_sum as u128) as u64;
        if share > floor {
            outputs.push(share);
            allocated += share;
        }
    }
    ChangeSplit {
        outputs,
        loose: total - allocated,
    }
}
