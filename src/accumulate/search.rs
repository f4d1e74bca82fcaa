//! Optimal accumulation solver via best-first state-space search.
//!
//! States are counter vectors; pressing a button adds 1 to every counter it
//! touches at a cost of 1. Counters only ever increase, so any state with a
//! component past its target can never reach the goal and is pruned before
//! it is enqueued. The ordering heuristic is the sum of remaining deficits,
//! which one press can shrink by at most 1 per touched counter, hence at
//! most `h` total: admissible and consistent, so the first extraction of the
//! goal is optimal.
//!
//! The reachable state space is bounded by `∏ (target_i + 1)`. That product
//! is the practical tractability limit of this backend; for untrusted or
//! very large targets, cap it with [`Search::with_node_limit`] and treat a
//! capped run (`None`) as a reported failure, never a hang.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::accumulate::AccumulationSolver;
use crate::machine::Machine;

/// The best-first search backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct Search {
    node_limit: Option<usize>,
}

impl Search {
    /// Uncapped search; cost is bounded only by the target product.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of expanded nodes; exceeding the cap yields `None`.
    pub fn with_node_limit(limit: usize) -> Self {
        Self {
            node_limit: Some(limit),
        }
    }
}

impl AccumulationSolver for Search {
    #[tracing::instrument(skip_all, fields(buttons = machine.buttons.len(), counters = machine.counters()))]
    fn min_presses(&self, machine: &Machine) -> Option<u64> {
        let expansion = self.run(machine);
        tracing::debug!(states = expansion.visited.len(), "search frontier settled");
        expansion.presses
    }
}

/// Exposed to tests so the visited table can be inspected directly.
pub(crate) struct Expansion {
    pub(crate) presses: Option<u64>,
    pub(crate) visited: HashMap<Vec<u64>, u64>,
}

impl Search {
    pub(crate) fn run(&self, machine: &Machine) -> Expansion {
        let targets = &machine.targets;
        let start = vec![0u64; targets.len()];

        // Components never exceed their targets, so this never underflows.
        let deficit = |state: &[u64]| -> u64 {
            targets
                .iter()
                .zip(state)
                .map(|(target, value)| target - value)
                .sum()
        };

        let mut visited: HashMap<Vec<u64>, u64> = HashMap::new();
        let mut frontier: BinaryHeap<Reverse<(u64, u64, Vec<u64>)>> = BinaryHeap::new();
        visited.insert(start.clone(), 0);
        frontier.push(Reverse((deficit(&start), 0, start)));

        let mut expanded = 0usize;
        while let Some(Reverse((_, presses, state))) = frontier.pop() {
            if state.as_slice() == targets.as_slice() {
                return Expansion {
                    presses: Some(presses),
                    visited,
                };
            }

            // A cheaper path to this state was found after it was enqueued.
            if visited.get(&state).is_some_and(|&g| g < presses) {
                continue;
            }

            expanded += 1;
            if self.node_limit.is_some_and(|cap| expanded > cap) {
                tracing::warn!(expanded, "node limit reached before the targets");
                return Expansion {
                    presses: None,
                    visited,
                };
            }

            for button in &machine.buttons {
                let Some(next) = press(&state, button, targets) else {
                    continue;
                };
                let cost = presses + 1;
                if visited.get(&next).map_or(true, |&seen| seen > cost) {
                    let priority = cost + deficit(&next);
                    visited.insert(next.clone(), cost);
                    frontier.push(Reverse((priority, cost, next)));
                }
            }
        }

        // Frontier exhausted: the targets are unreachable.
        Expansion {
            presses: None,
            visited,
        }
    }
}

/// The successor state after one press, or `None` when any touched counter
/// would overshoot its target. Out-of-range indices are inert.
fn press(state: &[u64], button: &[usize], targets: &[u64]) -> Option<Vec<u64>> {
    let mut next = state.to_vec();
    for &slot in button {
        if slot >= next.len() {
            continue;
        }
        next[slot] += 1;
        if next[slot] > targets[slot] {
            return None;
        }
    }
    Some(next)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::machine;

    const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

    #[rstest]
    #[case(0, 10)]
    #[case(1, 12)]
    #[case(2, 11)]
    fn solves_each_example_machine(#[case] index: usize, #[case] expected: u64) {
        let machines = machine::parse(EXAMPLE);
        assert_eq!(Some(expected), Search::new().min_presses(&machines[index]));
    }

    #[test]
    fn no_visited_state_oversteps_a_target() {
        for machine in machine::parse(EXAMPLE) {
            let expansion = Search::new().run(&machine);
            assert!(expansion.presses.is_some());
            for state in expansion.visited.keys() {
                for (value, target) in state.iter().zip(&machine.targets) {
                    assert!(value <= target, "state {state:?} exceeds {:?}", machine.targets);
                }
            }
        }
    }

    #[test]
    fn unreachable_targets_exhaust_the_frontier() {
        let machines = machine::parse("[.] (0) {1,2}");
        assert_eq!(None, Search::new().min_presses(&machines[0]));
    }

    #[test]
    fn node_limit_turns_a_long_run_into_a_sentinel() {
        let machines = machine::parse(EXAMPLE);
        assert_eq!(None, Search::with_node_limit(1).min_presses(&machines[1]));
    }

    #[test]
    fn zero_targets_are_the_start_state() {
        let machines = machine::parse("[..] (0) (1) {0,0}");
        assert_eq!(Some(0), Search::new().min_presses(&machines[0]));
    }
}
