//! Accumulation matching: counters start at zero, every press adds 1 to the
//! counters its button touches, and the goal is the minimum total presses
//! that makes every counter equal its target exactly.
//!
//! Three interchangeable backends implement [`AccumulationSolver`]:
//!
//! - [`Exact`]: integer program, branch-and-bound over an LP relaxation.
//! - [`Search`]: optimal best-first search with an admissible heuristic.
//! - [`Greedy`]: fast local heuristic; upper bound only, may dead-end.
//!
//! Infeasibility, dead ends, and capped searches are ordinary outcomes, not
//! errors: every backend reports them as `None`, never as `0`.

pub mod exact;
pub mod greedy;
pub mod search;

pub use exact::Exact;
pub use greedy::Greedy;
pub use search::Search;

use crate::machine::Machine;

/// A strategy for the accumulation objective. Solvers are stateless between
/// machines; a single value may be reused across a whole batch.
pub trait AccumulationSolver {
    /// Minimum (or for [`Greedy`], achieved) total press count, or `None`
    /// when the backend could not reach the targets.
    fn min_presses(&self, machine: &Machine) -> Option<u64>;
}

/// Backend selection by configuration, e.g. from a CLI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Exact,
    Search,
    Greedy,
}

impl Backend {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "exact" => Some(Self::Exact),
            "search" => Some(Self::Search),
            "greedy" => Some(Self::Greedy),
            _ => None,
        }
    }
}

impl AccumulationSolver for Backend {
    fn min_presses(&self, machine: &Machine) -> Option<u64> {
        match self {
            Self::Exact => Exact.min_presses(machine),
            Self::Search => Search::new().min_presses(machine),
            Self::Greedy => Greedy.min_presses(machine),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    #[test]
    fn exact_and_search_agree_and_greedy_bounds_them() {
        for machine in machine::parse(EXAMPLE) {
            let exact = Exact.min_presses(&machine);
            let search = Search::new().min_presses(&machine);
            assert_eq!(exact, search);

            let optimum = exact.expect("example machines are feasible");
            if let Some(greedy) = Greedy.min_presses(&machine) {
                assert!(greedy >= optimum);
            }
        }
    }

    #[test]
    fn every_backend_reports_infeasibility_as_a_sentinel() {
        // The single button never touches counter 1, so target 2 there is
        // unreachable.
        let machines = machine::parse("[.] (0) {1,2}");
        for backend in [Backend::Exact, Backend::Search, Backend::Greedy] {
            assert_eq!(None, backend.min_presses(&machines[0]));
        }
    }

    #[test]
    fn zero_targets_cost_nothing_everywhere() {
        let machines = machine::parse("[..] (0) (1) (0,1) {0,0}");
        for backend in [Backend::Exact, Backend::Search, Backend::Greedy] {
            assert_eq!(Some(0), backend.min_presses(&machines[0]));
        }
    }

    #[test]
    fn backends_are_selectable_by_name() {
        assert_eq!(Some(Backend::Exact), Backend::from_name("exact"));
        assert_eq!(Some(Backend::Search), Backend::from_name("search"));
        assert_eq!(Some(Backend::Greedy), Backend::from_name("greedy"));
        assert_eq!(None, Backend::from_name("simplex"));
    }
}
