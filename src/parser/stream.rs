//! Stateful stream parser: raw lines in, logical records out.
//!
//! The parser carries exactly two pieces of persistent state: the
//! currently open section and an in-progress multi-line value. Each call
//! to [`RecordStream::next_record`] consumes one physical line and emits
//! one [`LogicalLine`]; the line index increases monotonically and the
//! parser never rewinds.

use std::collections::BTreeSet;
use std::io::BufRead;

use tracing::{debug, warn};

use crate::parser::classify::{
    parse_assignment, parse_continuation, rough_kind, Assignment, AssignmentError, Continuation,
    RoughKind,
};
use crate::parser::errors::ParseError;
use crate::parser::section::{match_section_end, match_section_start};

/// A named region of the file, tracking which keys it declared.
///
/// The key set is diagnostic bookkeeping only; placement decisions use
/// line indices, not this set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionContext {
    pub name: String,
    pub declared_keys: BTreeSet<String>,
}

impl SectionContext {
    fn new(name: String) -> Self {
        SectionContext {
            name,
            declared_keys: BTreeSet::new(),
        }
    }
}

/// Payload of one classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    /// Blank line or anything that is neither comment nor assignment.
    Raw,
    Comment,
    SectionStart { name: String, comment: String },
    SectionEnd { name: String, comment: String },
    Assignment(Assignment),
    Continuation(Continuation),
}

/// One classified unit of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub kind: LineKind,
    /// The original line text, terminator stripped.
    pub raw: String,
    /// Name of the section open at this line, if any.
    pub section: Option<String>,
}

/// The seam between parsing and planning: an ordered record stream with a
/// current line index.
pub trait RecordStream {
    /// Zero-based index of the next line to be produced; after the final
    /// record this equals the total line count.
    fn line_idx(&self) -> u64;

    /// Produce the next record, or `None` at end of input.
    fn next_record(&mut self) -> Result<Option<LogicalLine>, ParseError>;
}

/// Parser configuration.
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Treat section markers as plain comments.
    pub ignore_sections: bool,
}

struct PendingValue {
    key: String,
    quote: char,
    start_line: u64,
    continuation_lines: u32,
}

/// Stateful parser over any buffered reader.
pub struct StreamParser<R: BufRead> {
    reader: R,
    config: ParserConfig,
    line_idx: u64,
    sections: Vec<SectionContext>,
    open_section: Option<usize>,
    pending: Option<PendingValue>,
}

impl<R: BufRead> StreamParser<R> {
    pub fn new(reader: R, config: ParserConfig) -> Self {
        StreamParser {
            reader,
            config,
            line_idx: 0,
            sections: Vec::new(),
            open_section: None,
            pending: None,
        }
    }

    /// Every section seen so far, in order of appearance, with the keys
    /// each declared.
    pub fn sections(&self) -> &[SectionContext] {
        &self.sections
    }

    fn current_section_name(&self) -> Option<String> {
        self.open_section.map(|i| self.sections[i].name.clone())
    }

    fn handle_continuation(&mut self, line: String) -> LogicalLine {
        let pending = self
            .pending
            .as_mut()
            .expect("handle_continuation called without pending value");
        let mut part = parse_continuation(&line, pending.quote);
        pending.continuation_lines += 1;
        part.seen = pending.continuation_lines;

        if part.terminated {
            debug!(key = %pending.key, lines = part.seen, "multi-line value terminated");
            self.pending = None;
        }

        LogicalLine {
            kind: LineKind::Continuation(part),
            raw: line,
            section: self.current_section_name(),
        }
    }

    fn handle_comment(&mut self, line: String) -> LogicalLine {
        if !self.config.ignore_sections {
            if let Some(marker) = match_section_start(&line) {
                debug!(section = %marker.name, line = self.line_idx, "section start");
                self.sections.push(SectionContext::new(marker.name.clone()));
                self.open_section = Some(self.sections.len() - 1);
                return LogicalLine {
                    kind: LineKind::SectionStart {
                        name: marker.name.clone(),
                        comment: marker.comment,
                    },
                    raw: line,
                    section: Some(marker.name),
                };
            }

            if let Some(marker) = match_section_end(&line) {
                match self.open_section {
                    Some(i) if self.sections[i].name == marker.name => {
                        debug!(section = %marker.name, line = self.line_idx, "section end");
                        self.open_section = None;
                    }
                    // A mismatched end marker leaves the section open.
                    Some(i) => warn!(
                        open = %self.sections[i].name,
                        marker = %marker.name,
                        line = self.line_idx,
                        "section end marker does not match open section; ignoring"
                    ),
                    None => warn!(
                        marker = %marker.name,
                        line = self.line_idx,
                        "section end marker with no open section; ignoring"
                    ),
                }
                return LogicalLine {
                    kind: LineKind::SectionEnd {
                        name: marker.name,
                        comment: marker.comment,
                    },
                    raw: line,
                    section: self.current_section_name(),
                };
            }
        }

        LogicalLine {
            kind: LineKind::Comment,
            raw: line,
            section: self.current_section_name(),
        }
    }

    fn handle_assignment(&mut self, line: String, idx: u64) -> Result<LogicalLine, ParseError> {
        let assignment = parse_assignment(&line).map_err(|e| match e {
            AssignmentError::NoKey => ParseError::NoKey { line: idx },
            AssignmentError::NoValue => ParseError::NoValue { line: idx },
        })?;

        if let Some(i) = self.open_section {
            self.sections[i].declared_keys.insert(assignment.key.clone());
        }

        if !assignment.terminated {
            let quote = assignment
                .quote
                .expect("unterminated assignment is always quoted");
            self.pending = Some(PendingValue {
                key: assignment.key.clone(),
                quote,
                start_line: idx,
                continuation_lines: 0,
            });
        }

        Ok(LogicalLine {
            kind: LineKind::Assignment(assignment),
            raw: line,
            section: self.current_section_name(),
        })
    }
}

impl<R: BufRead> RecordStream for StreamParser<R> {
    fn line_idx(&self) -> u64 {
        self.line_idx
    }

    fn next_record(&mut self) -> Result<Option<LogicalLine>, ParseError> {
        let raw = match crate::read::read_line(&mut self.reader)? {
            Some(raw) => raw,
            None => {
                if let Some(pending) = &self.pending {
                    return Err(ParseError::UnterminatedValue {
                        key: pending.key.clone(),
                        line: pending.start_line,
                    });
                }
                return Ok(None);
            }
        };

        let idx = self.line_idx;
        self.line_idx += 1;
        let line = raw.content;

        if self.pending.is_some() {
            return Ok(Some(self.handle_continuation(line)));
        }

        let record = match rough_kind(&line) {
            RoughKind::Comment => self.handle_comment(line),
            RoughKind::Assignment => self.handle_assignment(line, idx)?,
            RoughKind::Raw => LogicalLine {
                kind: LineKind::Raw,
                raw: line,
                section: self.current_section_name(),
            },
        };

        Ok(Some(record))
    }
}
