//! Envpatch: surgical updates for `KEY=VALUE` configuration files.
//!
//! Parses line-oriented env-style files (quoting, inline comments,
//! multi-line quoted values, named sections delimited by marker
//! comments) and rewrites them while preserving every byte of formatting
//! that is not semantically affected.
//!
//! # Architecture
//!
//! Data flows one direction:
//!
//! ```text
//! raw bytes -> logical line records -> patch set -> rewritten file
//! ```
//!
//! The [`parser`] turns raw lines into typed records while tracking open
//! sections and in-progress multi-line values. The [`planner`] consumes
//! that stream plus a set of [`UpdateRequest`]s and decides, per
//! variable, whether to leave it, rewrite it in place, or relocate it;
//! keys absent from the file are appended. The [`engine`] resolves the
//! planner's line-indexed [`Patch`] set to exact byte spans and applies
//! them in one streaming rewrite. The planner never touches file
//! offsets; the engine never interprets semantics.
//!
//! # Safety
//!
//! - Atomic file writes (tempfile + fsync + rename)
//! - Untouched lines are copied verbatim, byte for byte
//! - An empty patch set never touches the file
//! - Optional timestamped backup before any rewrite
//!
//! # Example
//!
//! ```no_run
//! use envpatch::{update_file, UpdateFileOptions, UpdateRequest};
//!
//! let updates = vec![
//!     UpdateRequest::new("PORT", "8080").in_section("net"),
//!     UpdateRequest::new("DEBUG", "false"),
//! ];
//!
//! let outcome = update_file("app.env", updates, &UpdateFileOptions::default())?;
//! println!("applied {} patches", outcome.patches);
//! # Ok::<(), envpatch::UpdateError>(())
//! ```

pub mod apply;
pub mod backup;
pub mod config;
pub mod engine;
pub mod from_struct;
pub mod parser;
pub mod patch;
pub mod planner;
pub mod read;
pub mod scan;

// Re-exports
pub use apply::{plan_file, preview_file, update_file, UpdateError, UpdateFileOptions, UpdateOutcome};
pub use backup::create_backup;
pub use config::{load_from_path, load_from_str, ConfigError, UpdatesFile};
pub use engine::{apply_patches, render_patches, EngineError};
pub use from_struct::{updates_from_struct, FromStructError};
pub use parser::{
    LineKind, LogicalLine, ParseError, ParserConfig, RecordStream, SectionContext, StreamParser,
};
pub use patch::{ByteSpan, Patch, PatchSet};
pub use planner::{plan_updates, PlanError, Planner, PlannerConfig, UpdateRequest};
