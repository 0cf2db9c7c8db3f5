//! Line parsing: classification, section tracking, multi-line values.

pub mod classify;
pub mod errors;
pub mod section;
pub mod stream;

pub use classify::{Assignment, Continuation, RoughKind};
pub use errors::ParseError;
pub use section::{
    make_section_end, make_section_start, match_section_end, match_section_start, SectionMarker,
};
pub use stream::{LineKind, LogicalLine, ParserConfig, RecordStream, SectionContext, StreamParser};
