use crate::parser::ParseError;
use thiserror::Error;

/// Failures while turning a record stream plus update requests into a
/// patch set.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Keys must be unique within one planning run; rejected before any
    /// line is processed.
    #[error("duplicate update for key {key:?}: each key must appear only once")]
    DuplicateUpdateKey { key: String },

    /// Internal contract violation: a continuation record arrived with no
    /// variable being read.
    #[error("line {line}: value continuation without an open variable")]
    MissingVariableData { line: u64 },

    /// Internal contract violation: a section record carried no usable
    /// section name.
    #[error("line {line}: section marker without a section name")]
    MissingSectionData { line: u64 },

    #[error(transparent)]
    Parse(#[from] ParseError),
}
