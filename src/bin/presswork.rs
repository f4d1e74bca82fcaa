use miette::*;

use presswork::accumulate::Backend;
use presswork::{machine, report};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let usage = || miette!("usage: presswork <exact|search|greedy> <puzzle-file>");
    let backend = args
        .next()
        .and_then(|name| Backend::from_name(&name))
        .ok_or_else(usage)?;
    let path = args.next().ok_or_else(usage)?;

    let input = std::fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("reading {path}"))?;
    let machines = machine::parse(&input);

    let toggles = report::run_toggle(&machines);
    let presses = report::run_accumulation(&machines, &backend);

    for (index, (toggle, press)) in toggles.outcomes.iter().zip(&presses.outcomes).enumerate() {
        println!(
            "machine {}: toggle {} presses {}",
            index + 1,
            display(*toggle),
            display(*press),
        );
    }
    println!("toggle total: {} ({} unsolved)", toggles.total, toggles.failures);
    println!("press total: {} ({} unsolved)", presses.total, presses.failures);
    Ok(())
}

fn display(outcome: Option<u64>) -> String {
    outcome.map_or_else(|| String::from("-"), |count| count.to_string())
}
