//! The byte-offset patch engine.
//!
//! Two strictly ordered passes. Pass 1 streams the original file once and
//! resolves every patched logical line index to its exact byte span,
//! terminator included. Pass 2 streams the file again into a temporary
//! sibling, applying inserts and removals at those offsets, then
//! atomically renames over the original (tempfile + fsync + rename). The
//! engine never interprets line semantics; it only moves bytes.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::patch::{ByteSpan, Patch, PatchSet};
use crate::read::read_line;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("patch index {index} beyond EOF ({total_lines} lines)")]
    PatchBeyondEof { index: u64, total_lines: u64 },

    #[error("overlapping patch at line {index}")]
    OverlappingPatch { index: u64 },

    /// Pass 2 asked for a span pass 1 never resolved; indicates the two
    /// passes ran against different patch sets.
    #[error("missing byte span for patched line {index}")]
    MissingSpan { index: u64 },

    #[error("path has no parent directory: {0}")]
    NoParentDir(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Pass 1: resolve byte spans for every patched line index.
///
/// Only lines present in `patches` are recorded. A patch index equal to
/// the total line count resolves to a zero-length span at end of file;
/// a greater index is fatal.
pub fn scan_line_spans<R: BufRead>(
    reader: &mut R,
    patches: &PatchSet,
) -> Result<BTreeMap<u64, ByteSpan>, EngineError> {
    let mut spans = BTreeMap::new();
    let mut offset: u64 = 0;
    let mut line_idx: u64 = 0;

    while let Some(line) = read_line(reader)? {
        if patches.contains_key(&line_idx) {
            let span = ByteSpan {
                start: offset,
                end: offset + line.consumed,
            };
            debug!(line = line_idx, start = span.start, end = span.end, "resolved span");
            spans.insert(line_idx, span);
        }
        offset += line.consumed;
        line_idx += 1;
    }

    // A patch addressing the line-count index appends at EOF.
    if patches.contains_key(&line_idx) {
        debug!(line = line_idx, offset, "resolved zero-length span at EOF");
        spans.insert(line_idx, ByteSpan { start: offset, end: offset });
    }

    if let Some((&index, _)) = patches.range(line_idx + 1..).next() {
        return Err(EngineError::PatchBeyondEof {
            index,
            total_lines: line_idx,
        });
    }

    debug!(total_lines = line_idx, spans = spans.len(), "span scan complete");
    Ok(spans)
}

/// Pass 2: stream the source through `out`, applying patches in index
/// order. The cursor only moves forward; an out-of-order span is an
/// overlapping-patch error.
pub fn process_patches<I, W>(
    source: &mut I,
    size: u64,
    out: &mut W,
    spans: &BTreeMap<u64, ByteSpan>,
    patches: &PatchSet,
) -> Result<(), EngineError>
where
    I: Read + Seek,
    W: Write,
{
    let mut cursor: u64 = 0;

    for (&index, patch) in patches {
        let span = spans
            .get(&index)
            .copied()
            .ok_or(EngineError::MissingSpan { index })?;

        if span.start < cursor {
            return Err(EngineError::OverlappingPatch { index });
        }

        copy_span(source, out, cursor, span.start, &mut cursor)?;
        apply_single_patch(source, out, patch, span, &mut cursor)?;
    }

    copy_span(source, out, cursor, size, &mut cursor)?;
    Ok(())
}

fn apply_single_patch<I, W>(
    source: &mut I,
    out: &mut W,
    patch: &Patch,
    span: ByteSpan,
    cursor: &mut u64,
) -> Result<(), EngineError>
where
    I: Read + Seek,
    W: Write,
{
    if let Some(text) = &patch.insert_before {
        out.write_all(text.as_bytes())?;
    }

    if patch.remove_line {
        if *cursor != span.end {
            source.seek(SeekFrom::Start(span.end))?;
            *cursor = span.end;
        }
    } else {
        copy_span(source, out, span.start, span.end, cursor)?;
    }

    if let Some(text) = &patch.insert_after {
        out.write_all(text.as_bytes())?;
    }

    Ok(())
}

/// Copy `source[start..end)` verbatim, seeking only when the source is
/// not already positioned at `start`.
fn copy_span<I, W>(
    source: &mut I,
    out: &mut W,
    start: u64,
    end: u64,
    cursor: &mut u64,
) -> Result<(), EngineError>
where
    I: Read + Seek,
    W: Write,
{
    if end == start {
        return Ok(());
    }

    if *cursor != start {
        source.seek(SeekFrom::Start(start))?;
        *cursor = start;
    }

    let copied = io::copy(&mut source.take(end - start), out)?;
    if copied != end - start {
        return Err(EngineError::Io(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected to copy {} bytes, copied {}", end - start, copied),
        )));
    }

    *cursor = end;
    Ok(())
}

fn add_auto_newlines(patches: &PatchSet) -> PatchSet {
    patches
        .iter()
        .map(|(&idx, patch)| {
            let mut patch = patch.clone();
            if let Some(text) = &mut patch.insert_before {
                text.push('\n');
            }
            if let Some(text) = &mut patch.insert_after {
                text.push('\n');
            }
            (idx, patch)
        })
        .collect()
}

/// Render the patched result in memory without touching the file.
///
/// Used for dry runs and diff previews; shares both passes with
/// [`apply_patches`].
pub fn render_patches(
    path: impl AsRef<Path>,
    patches: &PatchSet,
    auto_newline: bool,
) -> Result<Vec<u8>, EngineError> {
    let path = path.as_ref();
    if patches.is_empty() {
        return Ok(fs::read(path)?);
    }

    let patches = if auto_newline {
        add_auto_newlines(patches)
    } else {
        patches.clone()
    };

    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let spans = scan_line_spans(&mut reader, &patches)?;

    let mut source = BufReader::new(File::open(path)?);
    let mut out = Vec::with_capacity(size as usize);
    process_patches(&mut source, size, &mut out, &spans, &patches)?;
    Ok(out)
}

/// Apply a patch set to the file at `path` via an atomic rewrite.
///
/// An empty patch set touches nothing. Otherwise the rewritten content
/// lands in a temporary file in the same directory, is flushed and
/// fsynced, inherits the original's permission bits, and atomically
/// renames over the original. On any error before the rename the
/// original file is untouched.
pub fn apply_patches(
    path: impl AsRef<Path>,
    patches: &PatchSet,
    auto_newline: bool,
) -> Result<(), EngineError> {
    let path = path.as_ref();

    if patches.is_empty() {
        debug!(path = %path.display(), "no patches to apply");
        return Ok(());
    }

    info!(
        path = %path.display(),
        patch_count = patches.len(),
        auto_newline,
        "applying patches"
    );

    let patches = if auto_newline {
        add_auto_newlines(patches)
    } else {
        patches.clone()
    };

    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let mut reader = BufReader::new(file);
    let spans = scan_line_spans(&mut reader, &patches)?;

    // A bare filename has an empty parent; the temp file belongs in the
    // current directory then.
    let parent = match path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => return Err(EngineError::NoParentDir(path.to_path_buf())),
    };
    let temp = tempfile::NamedTempFile::new_in(parent)?;

    let mut source = BufReader::new(File::open(path)?);
    {
        let mut writer = BufWriter::new(temp.as_file());
        process_patches(&mut source, size, &mut writer, &spans, &patches)?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;

    // Carry the original permission bits onto the replacement.
    let permissions = fs::metadata(path)?.permissions();
    temp.as_file().set_permissions(permissions)?;

    temp.persist(path).map_err(|e| e.error)?;

    info!(path = %path.display(), "patch application complete");
    Ok(())
}
