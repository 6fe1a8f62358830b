//! `delta-diagnose` binary crate: CLI entry point over the
//! [`delta_diagnose`] library (spec §6 external interface).

use std::io::{self, Write};
use std::time::Instant;

use clap::Parser;
use fs_err as fs;
use log::info;

use delta_diagnose::diagnoser;
use delta_diagnose::options::{CliOptions, TraceLevel};
use delta_diagnose::search::{search, Verdict};
use delta_diagnose::{diagnostics, parser, Error};

fn main() {
    if let Err(error) = run() {
        let _ = writeln!(io::stderr(), "Error: {}", error);
        std::process::exit(1);
    }
}

/// Initializes the logging framework at the requested verbosity.
fn initialize_logging(level: TraceLevel) {
    let _ = env_logger::builder()
        .filter(None, level.into())
        .format_timestamp_millis()
        .try_init();
}

/// Parses the options, reads the input file, runs the bounded search,
/// and reports the outcome to stdout (spec §6).
fn run() -> Result<(), Error> {
    let options = CliOptions::parse();
    initialize_logging(options.trace_level);

    let input = fs::read_to_string(&options.input_file)?;
    let parsed = parser::parse(&input)?;

    println!("Automaton summary:");
    println!("{}", parsed.automaton);
    println!(
        "clocks: {}, observable events: {}, unobservable events: {}, BOUND: {}, DELTA: {}",
        parsed.automaton.clock_num(),
        parsed.automaton.num_observable(),
        parsed.automaton.num_unobservable(),
        parsed.bound,
        parsed.delta
    );

    // Spec §4.7: informational only, does not feed the encoding.
    let fault_diagnoser = diagnoser::fault_diagnoser(&parsed.automaton);
    let normal_diagnoser = diagnoser::normal_diagnoser(&parsed.automaton);
    println!("fault diagnoser F: {}", fault_diagnoser);
    println!("normal diagnoser N: {}", normal_diagnoser);

    let start = Instant::now();
    let report = search(&parsed.automaton, parsed.bound, parsed.delta)?;
    let total_time = start.elapsed();

    for message in &report.round_messages {
        println!("{}", message);
    }

    match report.verdict {
        Verdict::NotDiagnosable(witness) => {
            info!("critical pair found at horizon {}", witness.horizon);
            println!("sat");
            println!("{}", witness);
        }
        Verdict::Diagnosable => {
            println!("The problem is UNSAT");
            if options.should_print_core() {
                match &report.last_core {
                    Some(core) => {
                        println!("UNSAT core:");
                        for literal in core {
                            println!("  {} -> {}", literal, diagnostics::suggest(literal));
                        }
                    }
                    None => println!("no UNSAT core available"),
                }
            }
        }
    }

    println!("total_time {:.3}", total_time.as_secs_f64());
    Ok(())
}
