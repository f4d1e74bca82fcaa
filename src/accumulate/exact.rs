//! Exact accumulation solver: `min 1ᵀx  s.t.  Ax = targets, x ≥ 0, x ∈ ℤⁿ`,
//! where `A[i][j] = 1` iff button `j` touches counter `i`.
//!
//! Branch-and-bound over a dense two-phase simplex relaxation. All
//! coefficients are non-negative integers, so the LP objective at an
//! integral node rounds safely; every incumbent is still re-verified against
//! the exact integer targets before it is accepted. Infeasible and unbounded
//! nodes are pruned; a simplex run that exhausts its pivot budget poisons
//! the whole solve (`None`), since an incumbent from another branch would no
//! longer be certified optimal. A run with no verified incumbent likewise
//! reports `None` rather than a best-effort guess.

use nalgebra::{DMatrix, DVector};

use crate::accumulate::AccumulationSolver;
use crate::machine::Machine;

/// Numerical zero for tableau entries.
const EPS: f64 = 1e-9;
/// Phase-1 objective tolerance; loose enough for ~1e13 targets.
const FEASIBILITY_TOL: f64 = 1e-4;
/// How far from an integer a relaxation value may sit before branching.
const INTEGRALITY_TOL: f64 = 1e-3;
/// Slack when pruning nodes against the incumbent.
const PRUNE_TOL: f64 = 1e-5;
/// Default pivot budget for a single simplex run.
const MAX_PIVOTS: usize = 5000;

/// The integer-program backend.
pub struct Exact;

impl AccumulationSolver for Exact {
    #[tracing::instrument(skip_all, fields(buttons = machine.buttons.len(), counters = machine.counters()))]
    fn min_presses(&self, machine: &Machine) -> Option<u64> {
        Program::new(machine).branch_and_bound(MAX_PIVOTS)
    }
}

/// The integer program for one machine, rows clipped to the target length.
struct Program {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
    /// Exact integer targets for incumbent verification.
    targets: Vec<u64>,
}

/// An equality-constrained LP `min cᵀx, Ax = b, x ≥ 0`.
struct Relaxation {
    a: DMatrix<f64>,
    b: DVector<f64>,
    c: DVector<f64>,
}

struct LpSolution {
    x: DVector<f64>,
    cost: f64,
}

/// One simplex run on a relaxation.
enum LpOutcome {
    Optimal(LpSolution),
    /// Infeasible or unbounded: the node is pruned.
    Infeasible,
    /// Pivot budget exhausted: nothing this run reports can be trusted.
    OutOfPivots,
}

/// One pivot loop.
enum PivotLoop {
    Optimal,
    Unbounded,
    Exhausted,
}

/// Per-variable bounds accumulated along one branch of the tree.
#[derive(Clone)]
struct NodeBounds {
    lower: Vec<f64>,
    upper: Vec<Option<f64>>,
}

impl Program {
    fn new(machine: &Machine) -> Self {
        let m = machine.counters();
        let n = machine.buttons.len();

        let mut a = DMatrix::zeros(m, n);
        for (col, button) in machine.buttons.iter().enumerate() {
            for &slot in button {
                if slot < m {
                    a[(slot, col)] = 1.0;
                }
            }
        }
        let b = DVector::from_iterator(m, machine.targets.iter().map(|&t| t as f64));
        let c = DVector::from_element(n, 1.0);

        Self {
            a,
            b,
            c,
            targets: machine.targets.clone(),
        }
    }

    fn branch_and_bound(&self, pivot_budget: usize) -> Option<u64> {
        let n = self.a.ncols();
        let mut best: Option<u64> = None;
        let mut stack = vec![NodeBounds {
            lower: vec![0.0; n],
            upper: vec![None; n],
        }];

        while let Some(node) = stack.pop() {
            let Some((relaxation, shift)) = self.restrict(&node) else {
                continue;
            };
            let lp = match simplex(&relaxation, pivot_budget) {
                LpOutcome::Optimal(lp) => lp,
                LpOutcome::Infeasible => continue,
                LpOutcome::OutOfPivots => {
                    tracing::warn!("pivot budget exhausted; dropping the whole solve");
                    return None;
                }
            };

            let bound = lp.cost + shift;
            if let Some(incumbent) = best {
                if bound >= incumbent as f64 - PRUNE_TOL {
                    continue;
                }
            }

            let (x, fractional) = unshift(&lp, &node);
            match fractional {
                Some((var, value)) => {
                    // x_var ≤ ⌊value⌋ on one side, x_var ≥ ⌈value⌉ on the other
                    let mut below = node.clone();
                    let ceiling = below.upper[var].unwrap_or(f64::MAX);
                    below.upper[var] = Some(ceiling.min(value.floor()));

                    let mut above = node.clone();
                    above.lower[var] = above.lower[var].max(value.ceil());

                    stack.push(below);
                    stack.push(above);
                }
                None => {
                    let rounded: Vec<u64> = x.iter().map(|&v| v.round().max(0.0) as u64).collect();
                    if self.satisfies(&rounded) {
                        let cost: u64 = rounded.iter().sum();
                        if best.map_or(true, |b| cost < b) {
                            best = Some(cost);
                        }
                    }
                }
            }
        }

        best
    }

    /// Applies branch bounds to the base program. Lower bounds shift the
    /// right-hand side (`b' = b - A·lb`, objective credited separately);
    /// upper bounds become slack rows on the shifted variable. Returns
    /// `None` when the bounds contradict each other.
    fn restrict(&self, node: &NodeBounds) -> Option<(Relaxation, f64)> {
        let n = self.a.ncols();
        let mut a = self.a.clone();
        let mut b = self.b.clone();
        let mut c = self.c.clone();
        let mut shift = 0.0;

        for var in 0..n {
            let lb = node.lower[var];
            if lb > 0.0 {
                b -= self.a.column(var) * lb;
                shift += lb * self.c[var];
            }
        }

        let mut caps = Vec::new();
        for var in 0..n {
            if let Some(ub) = node.upper[var] {
                let cap = ub - node.lower[var];
                if cap < -1e-3 {
                    return None;
                }
                caps.push((var, cap.max(0.0)));
            }
        }

        if !caps.is_empty() {
            let m0 = a.nrows();
            let n0 = a.ncols();
            a = a.resize(m0 + caps.len(), n0 + caps.len(), 0.0);
            b = b.resize_vertically(m0 + caps.len(), 0.0);
            c = c.resize_vertically(n0 + caps.len(), 0.0);

            for (k, &(var, cap)) in caps.iter().enumerate() {
                a[(m0 + k, var)] = 1.0;
                a[(m0 + k, n0 + k)] = 1.0;
                b[m0 + k] = cap;
            }
        }

        Some((Relaxation { a, b, c }, shift))
    }

    /// Exact integral check of `Ax = targets`, immune to float drift.
    fn satisfies(&self, x: &[u64]) -> bool {
        self.targets.iter().enumerate().all(|(row, &want)| {
            let got: u128 = x
                .iter()
                .enumerate()
                .filter(|&(col, _)| self.a[(row, col)] > 0.5)
                .map(|(_, &presses)| presses as u128)
                .sum();
            got == u128::from(want)
        })
    }
}

/// Maps an LP solution over the shifted variables back to the original
/// variable space, reporting the first non-integral value for branching.
fn unshift(lp: &LpSolution, node: &NodeBounds) -> (Vec<f64>, Option<(usize, f64)>) {
    let n = node.lower.len();
    let mut x = vec![0.0; n];
    let mut fractional = None;

    for var in 0..n {
        let value = lp.x[var] + node.lower[var];
        x[var] = value;
        if fractional.is_none() && (value - value.round()).abs() > INTEGRALITY_TOL {
            fractional = Some((var, value));
        }
    }
    (x, fractional)
}

/// Two-phase dense simplex. The basis is tracked explicitly (one basic
/// column per row, updated on every pivot) rather than reconstructed by
/// scanning for unit columns afterwards; duplicate button footprints make
/// such a scan ambiguous, since the twin of a basic column is a unit column
/// too.
fn simplex(relaxation: &Relaxation, pivot_budget: usize) -> LpOutcome {
    let m = relaxation.a.nrows();
    let n = relaxation.a.ncols();

    // Phase 1: artificial basis (row r basic in column n + r), drive the
    // artificial sum to zero.
    let mut phase1 = phase_one_tableau(relaxation);
    let mut basis: Vec<usize> = (0..m).map(|r| n + r).collect();
    match optimize(&mut phase1, m, &mut basis, pivot_budget) {
        PivotLoop::Optimal => {}
        PivotLoop::Unbounded => return LpOutcome::Infeasible,
        PivotLoop::Exhausted => return LpOutcome::OutOfPivots,
    }
    let width = phase1.ncols();
    if phase1[(m, width - 1)].abs() > FEASIBILITY_TOL {
        return LpOutcome::Infeasible;
    }

    // Phase 2: drop the artificials and optimize the real objective.
    let (mut phase2, mut basis) = phase_two_tableau(&phase1, &basis, m, n);
    let rows = basis.len();
    install_objective(&mut phase2, &relaxation.c, &basis);
    match optimize(&mut phase2, rows, &mut basis, pivot_budget) {
        PivotLoop::Optimal => LpOutcome::Optimal(read_solution(&phase2, &basis, n)),
        PivotLoop::Unbounded => LpOutcome::Infeasible,
        PivotLoop::Exhausted => LpOutcome::OutOfPivots,
    }
}

fn phase_one_tableau(relaxation: &Relaxation) -> DMatrix<f64> {
    let m = relaxation.a.nrows();
    let n = relaxation.a.ncols();
    let width = n + m + 1; // variables + artificials + RHS

    let mut tableau = DMatrix::zeros(m + 1, width);
    for r in 0..m {
        // A negative RHS flips the whole row so the artificial stays ≥ 0.
        let sign = if relaxation.b[r] < 0.0 { -1.0 } else { 1.0 };
        for c in 0..n {
            tableau[(r, c)] = relaxation.a[(r, c)] * sign;
        }
        tableau[(r, n + r)] = 1.0;
        tableau[(r, width - 1)] = relaxation.b[r] * sign;
    }

    // Objective row: negated column sums, which puts the artificial-sum
    // objective in canonical form over the artificial basis.
    for c in 0..width {
        let sum: f64 = (0..m).map(|r| tableau[(r, c)]).sum();
        tableau[(m, c)] = -sum;
    }
    for r in 0..m {
        tableau[(m, n + r)] = 0.0;
    }

    tableau
}

/// Rebuilds a compact tableau over the structural columns only, together
/// with the basic column of every surviving row. Rows whose basic variable
/// is still an artificial are pivoted onto a structural column when
/// possible and dropped as redundant (`0 = 0`) otherwise.
fn phase_two_tableau(
    phase1: &DMatrix<f64>,
    basis: &[usize],
    m: usize,
    n: usize,
) -> (DMatrix<f64>, Vec<usize>) {
    let width = phase1.ncols();
    let mut repaired = phase1.clone();
    let mut basis: Vec<Option<usize>> = basis.iter().map(|&col| Some(col)).collect();

    for r in 0..m {
        if basis[r].is_some_and(|col| col >= n) {
            if let Some(structural) = (0..n).find(|&c| repaired[(r, c)].abs() > EPS) {
                pivot(&mut repaired, r, structural, m);
                basis[r] = Some(structural);
            } else {
                basis[r] = None;
            }
        }
    }

    let active: Vec<(usize, usize)> = (0..m)
        .filter_map(|r| basis[r].map(|col| (r, col)))
        .collect();
    let rows = active.len();

    let mut phase2 = DMatrix::zeros(rows + 1, n + 1);
    let mut kept_basis = Vec::with_capacity(rows);
    for (new_r, &(old_r, col)) in active.iter().enumerate() {
        for c in 0..n {
            phase2[(new_r, c)] = repaired[(old_r, c)];
        }
        phase2[(new_r, n)] = repaired[(old_r, width - 1)];
        kept_basis.push(col);
    }
    (phase2, kept_basis)
}

/// Writes the real costs into the objective row and cancels the basic
/// variables so the row holds reduced costs again.
fn install_objective(phase2: &mut DMatrix<f64>, costs: &DVector<f64>, basis: &[usize]) {
    let rows = basis.len();
    let n = phase2.ncols() - 1;

    for c in 0..n {
        phase2[(rows, c)] = costs[c];
    }
    for (r, &col) in basis.iter().enumerate() {
        let factor = phase2[(rows, col)];
        if factor.abs() > EPS {
            for c in 0..=n {
                phase2[(rows, c)] -= factor * phase2[(r, c)];
            }
        }
    }
}

/// Pivot loop under Bland's rule (first negative reduced cost), which rules
/// out cycling. Records the entering column in `basis` on every pivot.
fn optimize(
    tableau: &mut DMatrix<f64>,
    rows: usize,
    basis: &mut [usize],
    budget: usize,
) -> PivotLoop {
    let rhs = tableau.ncols() - 1;

    for _ in 0..budget {
        let Some(col) = (0..rhs).find(|&c| tableau[(rows, c)] < -EPS) else {
            return PivotLoop::Optimal;
        };

        let mut pivot_row = None;
        let mut best_ratio = f64::MAX;
        for r in 0..rows {
            let coeff = tableau[(r, col)];
            if coeff > EPS {
                let ratio = tableau[(r, rhs)] / coeff;
                if ratio < best_ratio {
                    best_ratio = ratio;
                    pivot_row = Some(r);
                }
            }
        }

        match pivot_row {
            Some(row) => {
                pivot(tableau, row, col, rows);
                basis[row] = col;
            }
            None => return PivotLoop::Unbounded,
        }
    }
    PivotLoop::Exhausted
}

fn pivot(tableau: &mut DMatrix<f64>, pivot_row: usize, pivot_col: usize, rows: usize) {
    let rhs = tableau.ncols() - 1;
    let inv = 1.0 / tableau[(pivot_row, pivot_col)];

    for c in 0..=rhs {
        tableau[(pivot_row, c)] *= inv;
    }
    for r in 0..=rows {
        if r == pivot_row {
            continue;
        }
        let factor = tableau[(r, pivot_col)];
        if factor.abs() > EPS {
            for c in 0..=rhs {
                tableau[(r, c)] -= factor * tableau[(pivot_row, c)];
            }
        }
    }
}

/// Each row funds exactly its basic column; every other column, including
/// any duplicate of a basic column, stays nonbasic at zero.
fn read_solution(phase2: &DMatrix<f64>, basis: &[usize], n: usize) -> LpSolution {
    let rows = basis.len();
    let mut x = DVector::zeros(n);
    for (r, &col) in basis.iter().enumerate() {
        x[col] = phase2[(r, n)];
    }

    LpSolution {
        x,
        cost: -phase2[(rows, n)],
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::accumulate::Search;
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
        assert_eq!(Some(expected), Exact.min_presses(&machines[index]));
    }

    #[test]
    fn infeasible_program_is_a_sentinel() {
        let machines = machine::parse("[.] (0) {1,2}");
        assert_eq!(None, Exact.min_presses(&machines[0]));
    }

    #[test]
    fn zero_targets_need_no_presses() {
        let machines = machine::parse("[...] (0,1) (2) {0,0,0}");
        assert_eq!(Some(0), Exact.min_presses(&machines[0]));
    }

    #[test]
    fn single_counter_single_button() {
        let machines = machine::parse("[.] (0) {5}");
        assert_eq!(Some(5), Exact.min_presses(&machines[0]));
    }

    #[test]
    fn out_of_range_indices_are_clipped_from_the_matrix() {
        // Slot 7 exists for neither target; the button still adds to slot 0.
        let machines = machine::parse("[.] (0,7) {4}");
        assert_eq!(Some(4), Exact.min_presses(&machines[0]));
    }

    #[test]
    fn feasible_relaxation_with_no_integer_point_is_a_sentinel() {
        // The LP optimum is x = (1.5, 1.5, 1.5), but summing the three
        // constraints gives 2·(x0+x1+x2) = 9, so no integer point exists.
        let machines = machine::parse("[...] (0,1) (1,2) (0,2) {3,3,3}");
        assert_eq!(None, Exact.min_presses(&machines[0]));
    }

    #[test]
    fn branching_is_required_when_the_relaxation_is_fractional() {
        // Half-presses of the pair buttons give the LP a cost of 1.5; the
        // integer optimum takes one pair button plus one single for 2.
        let machines = machine::parse("[...] (0,1) (1,2) (0,2) (0) (1) (2) {1,1,1}");
        assert_eq!(Some(2), Exact.min_presses(&machines[0]));
    }

    #[test]
    fn duplicate_footprint_buttons_stay_solvable() {
        // Two buttons share the (0,2) footprint, so the basic column has an
        // identical twin in the tableau; the solution must still be read off
        // the tracked basis, one column per row, and match the search
        // backend's optimum.
        let machines = machine::parse("[...] (0,2) (0,2) (0) (2) (1) {7,0,6}");
        let exact = Exact.min_presses(&machines[0]);
        assert_eq!(Some(7), exact);
        assert_eq!(Search::new().min_presses(&machines[0]), exact);
    }

    #[test]
    fn exhausted_pivot_budget_poisons_the_solve() {
        // With no budget the very first relaxation cannot be certified, so
        // the run must fail outright instead of guessing.
        let machines = machine::parse("[.] (0) {5}");
        let program = Program::new(&machines[0]);
        assert_eq!(None, program.branch_and_bound(0));
        assert_eq!(Some(5), program.branch_and_bound(MAX_PIVOTS));
    }
}
