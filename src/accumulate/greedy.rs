//! Approximate accumulation solver: press the locally best button until the
//! counters match, with no backtracking.
//!
//! Each round scores every button that would not overshoot a counter and
//! presses the highest-scoring one, ties going to the earliest button in
//! definition order. The result is an upper bound on the optimum, never a
//! guaranteed minimum, and a round with no eligible button is a dead end
//! reported as `None`. Callers must not read that sentinel as "zero
//! presses".

use crate::accumulate::AccumulationSolver;
use crate::machine::Machine;

/// Weight of the helped-counter count over the per-round gain, so helping
/// more still-needed counters always dominates. Any monotone scoring rule
/// with that preference would do.
const HELPS_WEIGHT: u64 = 100;

/// The greedy heuristic backend.
pub struct Greedy;

impl AccumulationSolver for Greedy {
    #[tracing::instrument(skip_all, fields(buttons = machine.buttons.len(), counters = machine.counters()))]
    fn min_presses(&self, machine: &Machine) -> Option<u64> {
        let targets = &machine.targets;
        let mut current = vec![0u64; targets.len()];
        let mut presses = 0u64;

        while current != *targets {
            let mut best: Option<(u64, usize)> = None;
            for (index, button) in machine.buttons.iter().enumerate() {
                let Some(score) = score(button, &current, targets) else {
                    continue;
                };
                if best.map_or(true, |(top, _)| score > top) {
                    best = Some((score, index));
                }
            }

            // Every button would overshoot or touches nothing in range.
            let Some((_, index)) = best else {
                return None;
            };

            for &slot in &machine.buttons[index] {
                if slot < current.len() {
                    current[slot] += 1;
                }
            }
            presses += 1;
        }

        Some(presses)
    }
}

/// Round score for one button: `HELPS_WEIGHT * helps + total_help`, where
/// `total_help` caps each counter's contribution at the 1 a press can add.
/// `None` disqualifies the button: it would push some counter past its
/// target, or its in-range touches help nothing (pressing it would change
/// no counter, so allowing it could spin forever).
fn score(button: &[usize], current: &[u64], targets: &[u64]) -> Option<u64> {
    let mut helps = 0u64;
    let mut total_help = 0u64;

    for &slot in button {
        if slot >= current.len() {
            continue;
        }
        if current[slot] >= targets[slot] {
            return None;
        }
        helps += 1;
        total_help += (targets[slot] - current[slot]).min(1);
    }

    (helps > 0).then_some(HELPS_WEIGHT * helps + total_help)
}
