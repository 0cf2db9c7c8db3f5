use thiserror::Error;

/// Failures while turning raw lines into logical records.
///
/// Every variant carries the zero-based line index of the offending line
/// so callers can diagnose without re-running.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("line {line}: equals sign with no key before it")]
    NoKey { line: u64 },

    #[error("line {line}: nothing after equals sign")]
    NoValue { line: u64 },

    #[error("unterminated multi-line value for {key:?} starting at line {line}")]
    UnterminatedValue { key: String, line: u64 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
