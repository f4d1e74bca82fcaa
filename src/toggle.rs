//! Minimum-press toggle matching over GF(2).
//!
//! Pressing a button twice cancels itself, so each button is a 0/1 decision
//! and the problem is a linear system over the two-element field: find the
//! minimum-weight `x` with `Ax = pattern`, where column `j` of `A` is the
//! toggle footprint of button `j`.

use bitvec::prelude::*;

use crate::machine::{Bits, Machine};

/// Augmented `[A | pattern]` bit matrix, one row per light, one column per
/// button plus the target column. Rows are flat owned buffers so swaps and
/// whole-row XOR stay cheap.
struct Augmented {
    rows: Vec<Bits>,
    vars: usize,
    /// Pivot row for each bound column, `None` for free columns.
    pivot_of_col: Vec<Option<usize>>,
    free_cols: Vec<usize>,
}

impl Augmented {
    fn new(machine: &Machine) -> Self {
        let eqs = machine.lights();
        let vars = machine.buttons.len();

        let mut rows = vec![Bits::repeat(false, vars + 1); eqs];
        for (col, button) in machine.buttons.iter().enumerate() {
            for &slot in button {
                if slot < eqs {
                    rows[slot].set(col, true);
                }
            }
        }
        for (row, lit) in machine.pattern.iter().enumerate() {
            if *lit {
                rows[row].set(vars, true);
            }
        }

        Self {
            rows,
            vars,
            pivot_of_col: vec![None; vars],
            free_cols: Vec::new(),
        }
    }

    /// Full elimination to reduced row-echelon form: the pivot row is XORed
    /// into every other row carrying a 1 in the pivot column, not just the
    /// rows below. Returns `false` when the system is inconsistent (a zero
    /// row still demands a 1).
    fn eliminate(&mut self) -> bool {
        let eqs = self.rows.len();
        let mut pivot_row = 0;

        for col in 0..self.vars {
            if pivot_row >= eqs {
                self.free_cols.push(col);
                continue;
            }

            let Some(found) = (pivot_row..eqs).find(|&r| self.rows[r][col]) else {
                self.free_cols.push(col);
                continue;
            };

            self.rows.swap(pivot_row, found);
            self.pivot_of_col[col] = Some(pivot_row);

            let pivot = self.rows[pivot_row].clone();
            for other in 0..eqs {
                if other != pivot_row && self.rows[other][col] {
                    self.rows[other] ^= &pivot;
                }
            }
            pivot_row += 1;
        }

        self.rows[pivot_row..].iter().all(|row| !row[self.vars])
    }
}

/// Returns the minimum-weight press assignment (one bit per button), or
/// `None` when no subset of buttons can produce the pattern.
///
/// Free columns are enumerated exhaustively; bound columns follow from the
/// reduced rows by back-substitution. That costs `2^k` for nullity `k`,
/// which puzzle instances keep small. A full-rank system has `k = 0` and the
/// loop runs exactly once.
pub fn min_weight_assignment(machine: &Machine) -> Option<Bits> {
    let mut system = Augmented::new(machine);
    if !system.eliminate() {
        return None;
    }

    let mut best: Option<Bits> = None;
    for mask in 0usize..1 << system.free_cols.len() {
        let mut x = Bits::repeat(false, system.vars);
        for (bit, &col) in system.free_cols.iter().enumerate() {
            if mask >> bit & 1 == 1 {
                x.set(col, true);
            }
        }

        // In RREF a pivot row is zero in every column left of its pivot and
        // in every other pivot column, so only free columns to the right
        // contribute: bound = rhs XOR (row entries over the chosen frees).
        for col in 0..system.vars {
            let Some(row) = system.pivot_of_col[col] else {
                continue;
            };
            let mut value = system.rows[row][system.vars];
            for &free in &system.free_cols {
                if free > col && system.rows[row][free] && x[free] {
                    value = !value;
                }
            }
            if value {
                x.set(col, true);
            }
        }

        if best
            .as_ref()
            .map_or(true, |b| x.count_ones() < b.count_ones())
        {
            best = Some(x);
        }
    }
    best
}

/// Minimum number of button presses reproducing the machine's pattern, or
/// `None` for an inconsistent system.
pub fn min_presses(machine: &Machine) -> Option<u64> {
    min_weight_assignment(machine).map(|x| x.count_ones() as u64)
}
