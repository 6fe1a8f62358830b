//! Unified error taxonomy for the diagnosability checker.
//!
//! Parse and model-integrity errors are fatal at startup. Solver errors
//! are recoverable: the search driver logs them and treats the round as
//! a failure to extend the horizon. Internal assertion failures are
//! never silenced and always abort with a diagnostic.

use thiserror::Error;

/// An error produced while loading, encoding or solving a diagnosability instance.
#[derive(Debug, Error)]
pub enum Error {
    /// A malformed header, unknown event or unparseable guard/invariant.
    #[error("parse error at line {line}: {message}")]
    Parse {
        /// The one-based line number of the offending input.
        line: usize,
        /// A description of what was expected.
        message: String,
    },
    /// A transition or invariant referenced a state or clock index that does not exist.
    #[error("model integrity error: {message}")]
    ModelIntegrity {
        /// A description of the missing reference.
        message: String,
    },
    /// The solver returned an `unknown` status distinct from sat/unsat.
    #[error("solver error: {message}")]
    Solver {
        /// The solver-reported reason, if any.
        message: String,
    },
    /// The witness decoder found an inconsistency that indicates an encoder bug.
    #[error("internal assertion failure: {message}")]
    Internal {
        /// A description of the violated invariant.
        message: String,
    },
    /// An I/O error occurred while reading the input file.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience alias for results of this crate.
pub type Result<T> = std::result::Result<T, Error>;
