//! The shared machine model and the puzzle line grammar.
//!
//! One machine per line:
//!
//! ```text
//! [.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
//! ```
//!
//! The `[...]` group is the binary toggle target, each `(...)` group lists
//! the 0-based slot indices one button is wired to, and the `{...}` group
//! holds the integer accumulation targets. Both target kinds share the same
//! index space; a solver simply ignores indices that fall outside the target
//! it cares about.

use std::fmt;

use bitvec::prelude::*;
use chumsky::prelude::*;
use itertools::Itertools;

/// Bit vector backed by `usize` words, LSB first. Used for the toggle
/// target, the GF(2) matrix rows, and button-press assignments.
pub type Bits = BitVec<usize, Lsb0>;

/// Immutable description of one puzzle instance.
///
/// Button indices are stored exactly as parsed, without clipping, so that
/// reserializing via [`fmt::Display`] is lossless. Indices out of range for a
/// given target are inert for that objective (each solver bound-checks at
/// use time). Button order is significant: the greedy backend breaks score
/// ties in definition order, so equality is order-sensitive too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Machine {
    /// Binary toggle target, one bit per light.
    pub pattern: Bits,
    /// Slot indices wired to each button, in definition order.
    pub buttons: Vec<Vec<usize>>,
    /// Integer accumulation targets, one per counter.
    pub targets: Vec<u64>,
}

impl Machine {
    pub fn lights(&self) -> usize {
        self.pattern.len()
    }

    pub fn counters(&self) -> usize {
        self.targets.len()
    }
}

fn machine_parser<'a>() -> impl Parser<'a, &'a str, Machine, extra::Err<Rich<'a, char>>> {
    let hspace = one_of(" \t").repeated();

    // [.##.]
    let light = choice((just('.').to(false), just('#').to(true)));
    let pattern = light
        .repeated()
        .at_least(1)
        .collect::<Vec<bool>>()
        .map(|v| v.into_iter().collect::<Bits>())
        .delimited_by(just('['), just(']'));

    // (0,2,3)
    let indices = text::int(10)
        .from_str::<usize>()
        .unwrapped()
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<usize>>()
        .delimited_by(just('('), just(')'));

    let buttons = indices
        .padded_by(hspace)
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>();

    // {3,5,4,7}
    let targets = text::int(10)
        .from_str::<u64>()
        .unwrapped()
        .separated_by(just(','))
        .at_least(1)
        .collect::<Vec<u64>>()
        .delimited_by(just('{'), just('}'));

    pattern
        .then_ignore(hspace)
        .then(buttons)
        .then(targets)
        .then_ignore(hspace)
        .map(|((pattern, buttons), targets)| Machine {
            pattern,
            buttons,
            targets,
        })
}

/// Parses one machine per non-empty line. Lines that do not match the
/// grammar (missing any bracketed group) are skipped with a warning and do
/// not count toward the batch; one bad line never aborts the rest.
pub fn parse(input: &str) -> Vec<Machine> {
    let parser = machine_parser();
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match parser.parse(line).into_result() {
            Ok(machine) => Some(machine),
            Err(errors) => {
                tracing::warn!(%line, ?errors, "skipping line that does not match the machine grammar");
                None
            }
        })
        .collect()
}

impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pattern: String = self
            .pattern
            .iter()
            .map(|lit| if *lit { '#' } else { '.' })
            .collect();
        write!(f, "[{pattern}]")?;
        for button in &self.buttons {
            write!(f, " ({})", button.iter().join(","))?;
        }
        write!(f, " {{{}}}", self.targets.iter().join(","))
    }
}
