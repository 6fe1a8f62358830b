//! Command-line options for the diagnosability checker.

use std::fmt;
use std::path::PathBuf;

use clap::{ArgEnum, Parser};

/// The verbosity of the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum)]
pub enum TraceLevel {
    /// Turn logging off.
    Off,
    /// Only print errors.
    Error,
    /// Print errors and warnings.
    Warn,
    /// Print errors, warnings and useful information.
    Info,
    /// Print errors, warnings, useful and debug information.
    Debug,
    /// Print all information, including very verbose output.
    Trace,
}

impl Default for TraceLevel {
    fn default() -> Self {
        Self::Error
    }
}

impl fmt::Display for TraceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        };
        write!(f, "{}", s)
    }
}

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

/// Bounded model checker for ∆-diagnosability of timed automata.
#[derive(Debug, Parser)]
#[clap(name = "delta-diagnose", version)]
pub struct CliOptions {
    /// The input file describing the automaton, BOUND and DELTA (spec §6).
    #[clap(parse(from_os_str))]
    pub input_file: PathBuf,

    /// Verbosity of the logging output.
    #[clap(short = 't', long = "trace", arg_enum, default_value_t = TraceLevel::Error)]
    pub trace_level: TraceLevel,

    /// Print the last UNSAT core and its suggestion map when the instance
    /// is reported UNSAT within the horizon.
    #[clap(long = "core")]
    pub print_core: bool,

    /// Suppress the UNSAT core even if one was cached (overrides `--core`).
    #[clap(long = "no-core", conflicts_with = "print_core")]
    pub no_core: bool,
}

impl CliOptions {
    /// Whether the UNSAT core and suggestion map should be printed.
    pub fn should_print_core(&self) -> bool {
        self.print_core && !self.no_core
    }
}
