use divan::black_box;

use presswork::accumulate::{Exact, Greedy, Search};
use presswork::{machine, report};

const EXAMPLE: &str = "[.##.] (3) (1,3) (2) (2,3) (0,2) (0,1) {3,5,4,7}
[...#.] (0,2,3,4) (2,3) (0,4) (0,1,2) (1,2,3,4) {7,5,12,7,2}
[.###.#] (0,1,2,3,4) (0,3,4) (0,1,2,4,5) (1,2) {10,11,11,5,10,5}";

fn main() {
    divan::main();
}

#[divan::bench]
fn parse() -> usize {
    machine::parse(black_box(EXAMPLE)).len()
}

#[divan::bench]
fn toggle_backend() -> u64 {
    let machines = machine::parse(black_box(EXAMPLE));
    report::run_toggle(&machines).total
}

#[divan::bench]
fn exact_backend() -> u64 {
    let machines = machine::parse(black_box(EXAMPLE));
    report::run_accumulation(&machines, &Exact).total
}

#[divan::bench]
fn search_backend() -> u64 {
    let machines = machine::parse(black_box(EXAMPLE));
    report::run_accumulation(&machines, &Search::new()).total
}

#[divan::bench]
fn greedy_backend() -> u64 {
    let machines = machine::parse(black_box(EXAMPLE));
    report::run_accumulation(&machines, &Greedy).total
}
