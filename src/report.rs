//! The aggregator: runs one chosen solver per machine and sums the results.
//!
//! Machines are mutually independent and solvers keep no state between
//! them, so the batch fans out over a rayon pool with nothing shared but
//! the collected outcomes.

use rayon::prelude::*;

use crate::accumulate::AccumulationSolver;
use crate::machine::Machine;
use crate::toggle;

/// Per-machine outcomes plus the aggregate.
///
/// `total` sums only the solved machines; a sentinel outcome is counted in
/// `failures` and contributes nothing rather than being coerced to zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    /// One entry per machine, in input order; `None` is the failure sentinel.
    pub outcomes: Vec<Option<u64>>,
    pub total: u64,
    pub failures: usize,
}

impl Report {
    fn collect(outcomes: Vec<Option<u64>>) -> Self {
        let total = outcomes.iter().flatten().sum();
        let failures = outcomes.iter().filter(|outcome| outcome.is_none()).count();
        Self {
            outcomes,
            total,
            failures,
        }
    }
}

/// Minimum toggle presses per machine and in total.
#[tracing::instrument(skip_all, fields(machines = machines.len()))]
pub fn run_toggle(machines: &[Machine]) -> Report {
    Report::collect(machines.par_iter().map(toggle::min_presses).collect())
}

/// Accumulation presses per machine and in total, through the given backend.
#[tracing::instrument(skip_all, fields(machines = machines.len()))]
pub fn run_accumulation<S>(machines: &[Machine], solver: &S) -> Report
where
    S: AccumulationSolver + Sync,
{
    Report::collect(
        machines
            .par_iter()
            .map(|machine| solver.min_presses(machine))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulate::{Exact, Greedy, Search};
    use crate::machine;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    #[test]
    fn example_toggle_total_is_seven() {
        let machines = machine::parse(EXAMPLE);
        let report = run_toggle(&machines);
        assert_eq!(vec![Some(2), Some(3), Some(2)], report.outcomes);
        assert_eq!(7, report.total);
        assert_eq!(0, report.failures);
    }

    #[test]
    fn example_accumulation_total_is_thirty_three() {
        let machines = machine::parse(EXAMPLE);
        assert_eq!(33, run_accumulation(&machines, &Exact).total);
        assert_eq!(33, run_accumulation(&machines, &Search::new()).total);
    }

    #[test]
    fn failures_are_counted_not_zeroed() {
        let machines = machine::parse(EXAMPLE);
        let report = run_accumulation(&machines, &Greedy);
        assert_eq!(vec![None, Some(12), Some(11)], report.outcomes);
        assert_eq!(23, report.total);
        assert_eq!(1, report.failures);
    }

    #[test]
    fn empty_batch_reports_zero() {
        let report = run_toggle(&[]);
        assert_eq!(0, report.total);
        assert!(report.outcomes.is_empty());
    }
}
