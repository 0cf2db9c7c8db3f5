//! High-level orchestration: parse, plan, back up, rewrite.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::backup::create_backup;
use crate::engine::{self, EngineError};
use crate::parser::{ParserConfig, StreamParser};
use crate::patch::PatchSet;
use crate::planner::{plan_updates, PlanError, PlannerConfig, UpdateRequest};

#[derive(Error, Debug)]
pub enum UpdateError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to back up {path}: {source}")]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Options for a single update run.
#[derive(Debug, Clone, Default)]
pub struct UpdateFileOptions {
    /// Snapshot the file to a timestamped sibling before rewriting.
    pub backup: bool,
    pub parser: ParserConfig,
    pub planner: PlannerConfig,
}

/// What an update run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Number of line patches applied; zero means the file already
    /// matched and was not touched.
    pub patches: usize,
    /// Path of the backup taken, if any.
    pub backup: Option<PathBuf>,
}

/// Compute the patch set for `path` without modifying anything.
pub fn plan_file(
    path: impl AsRef<Path>,
    updates: Vec<UpdateRequest>,
    options: &UpdateFileOptions,
) -> Result<PatchSet, UpdateError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| UpdateError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut stream = StreamParser::new(BufReader::new(file), options.parser.clone());
    Ok(plan_updates(&mut stream, updates, options.planner.clone())?)
}

/// Apply updates to the file at `path` in one atomic rewrite.
///
/// The backup (when requested) is taken only once the plan contains at
/// least one patch, so no-op runs leave no backup litter behind.
pub fn update_file(
    path: impl AsRef<Path>,
    updates: Vec<UpdateRequest>,
    options: &UpdateFileOptions,
) -> Result<UpdateOutcome, UpdateError> {
    let path = path.as_ref();
    let patches = plan_file(path, updates, options)?;

    if patches.is_empty() {
        info!(path = %path.display(), "file already up to date");
        return Ok(UpdateOutcome {
            patches: 0,
            backup: None,
        });
    }

    let backup = if options.backup {
        create_backup(path).map_err(|source| UpdateError::Backup {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        None
    };

    engine::apply_patches(path, &patches, false)?;

    Ok(UpdateOutcome {
        patches: patches.len(),
        backup,
    })
}

/// Render the post-update content without touching the file (dry run).
pub fn preview_file(
    path: impl AsRef<Path>,
    updates: Vec<UpdateRequest>,
    options: &UpdateFileOptions,
) -> Result<(PatchSet, Vec<u8>), UpdateError> {
    let path = path.as_ref();
    let patches = plan_file(path, updates, options)?;
    let rendered = engine::render_patches(path, &patches, false)?;
    Ok((patches, rendered))
}
