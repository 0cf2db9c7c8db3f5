//! The fundamental rewrite primitives: line-indexed patches and byte spans.
//!
//! The planner emits [`Patch`] values keyed by zero-based logical line
//! index; the engine resolves each index to a [`ByteSpan`] against the
//! original file and applies the edits in one streaming pass. The planner
//! never sees byte offsets and the engine never interprets semantics.

use std::collections::BTreeMap;

/// One edit to perform at a logical line during rewrite.
///
/// Insert texts are written verbatim: nothing appends newlines unless the
/// engine's auto-newline flag is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Patch {
    /// Text written immediately before the target line.
    pub insert_before: Option<String>,
    /// Text written immediately after the target line.
    pub insert_after: Option<String>,
    /// Skip the target line instead of copying it.
    pub remove_line: bool,
}

impl Patch {
    /// A patch that only removes its target line.
    pub fn remove() -> Self {
        Patch {
            remove_line: true,
            ..Patch::default()
        }
    }

    /// Append text to the insert-after slot, creating it if absent.
    pub fn push_insert_after(&mut self, text: &str) {
        match &mut self.insert_after {
            Some(existing) => existing.push_str(text),
            None => self.insert_after = Some(text.to_string()),
        }
    }

    /// True when the patch changes nothing.
    pub fn is_noop(&self) -> bool {
        !self.remove_line && self.insert_before.is_none() && self.insert_after.is_none()
    }
}

/// Patches keyed by zero-based logical line index, iterated in order.
///
/// An index equal to the file's total line count addresses the synthetic
/// zero-length span at end of file (append semantics); anything beyond
/// that is rejected by the engine.
pub type PatchSet = BTreeMap<u64, Patch>;

/// `[start, end)` byte offsets of one logical line in the original file,
/// terminator included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
