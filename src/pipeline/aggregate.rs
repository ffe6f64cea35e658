//! Monthly aggregation of daily observations.

use crate::models::{month_start, MonthlyAggregate, Observation, Variable};
use std::collections::BTreeMap;

#[derive(Default)]
struct Accumulator {
    sum: f64,
    count: usize,
}

/// Groups observations by (year, month) and reduces each variable.
///
/// Rainfall is summed, everything else averaged; missing days are ignored.
/// Only months with at least one observation appear. Rows come back sorted
/// by (year, month).
pub fn monthly(observations: &[&Observation], variables: &[Variable]) -> Vec<MonthlyAggregate> {
    let mut groups: BTreeMap<(i32, u32), BTreeMap<Variable, Accumulator>> = BTreeMap::new();

    for obs in observations {
        let group = groups.entry((obs.year, obs.month)).or_default();
        for &variable in variables {
            let acc = group.entry(variable).or_default();
            if let Some(value) = obs.value(variable) {
                acc.sum += value;
                acc.count += 1;
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|((year, month), accs)| {
            let values = accs
                .into_iter()
                .filter_map(|(variable, acc)| reduce(variable, &acc).map(|v| (variable, v)))
                .collect();
            Some(MonthlyAggregate {
                year,
                month,
                date: month_start(year, month)?,
                values,
            })
        })
        .collect()
}

fn reduce(variable: Variable, acc: &Accumulator) -> Option<f64> {
    if variable.is_summed() {
        // A month with no recorded rainfall sums to zero.
        Some(acc.sum)
    } else if acc.count == 0 {
        None
    } else {
        Some(acc.sum / acc.count as f64)
    }
}
