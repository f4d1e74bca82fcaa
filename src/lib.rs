//! Minimum-button-press solvers for factory machine puzzles.
//!
//! Each machine has a set of buttons wired to a shared bank of output slots.
//! Two independent objectives exist over the same wiring:
//!
//! - [`toggle`] treats every slot as a light that flips on each press and
//!   finds the smallest button subset whose combined toggles reproduce a
//!   target pattern (Gaussian elimination over GF(2)).
//! - [`accumulate`] treats every slot as a counter that increments on each
//!   press and finds the minimum total presses that hit the integer targets
//!   exactly, through one of three interchangeable backends: an exact
//!   integer program, an optimal informed search, or a fast greedy heuristic.
//!
//! [`machine::parse`] turns puzzle text into [`machine::Machine`] records and
//! [`report`] fans a chosen backend out over a batch of machines.

pub mod accumulate;
pub mod machine;
pub mod report;
pub mod toggle;
