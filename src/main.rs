use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use envpatch::parser::{LineKind, ParserConfig, RecordStream, StreamParser};
use envpatch::{
    load_from_path, preview_file, update_file, UpdateFileOptions, UpdateRequest,
};
use similar::{ChangeTag, TextDiff};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envpatch")]
#[command(about = "Surgical KEY=VALUE config file updater", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Set one or more KEY=VALUE pairs in a file
    Set {
        /// Target file
        file: PathBuf,

        /// Assignments to apply, each as KEY=VALUE
        #[arg(required = true, value_name = "KEY=VALUE")]
        pairs: Vec<String>,

        /// Destination section for all given keys
        #[arg(short, long, default_value = "")]
        section: String,

        /// Keep existing keys where they are, even if their section differs
        #[arg(long)]
        ignore_section: bool,

        /// Snapshot the file to a timestamped backup before rewriting
        #[arg(short, long)]
        backup: bool,

        /// Show what would change without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Apply updates described by a TOML updates file
    Apply {
        /// Target file
        file: PathBuf,

        /// Path to the updates TOML file
        #[arg(short, long)]
        updates: PathBuf,

        /// Skip the backup even when the updates file requests one
        #[arg(long)]
        no_backup: bool,

        /// Show what would change without modifying the file
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Print the value of a key (multi-line values are rejoined)
    Get {
        /// Target file
        file: PathBuf,

        /// Key to look up
        key: String,
    },

    /// List sections and the keys each declares
    Sections {
        /// Target file
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Set {
            file,
            pairs,
            section,
            ignore_section,
            backup,
            dry_run,
            diff,
        } => {
            let updates = parse_pairs(&pairs, &section, ignore_section)?;
            let options = UpdateFileOptions {
                backup,
                ..UpdateFileOptions::default()
            };
            run_update(&file, updates, &options, dry_run, diff)
        }

        Commands::Apply {
            file,
            updates,
            no_backup,
            dry_run,
            diff,
        } => {
            let updates_file = load_from_path(&updates)?;
            let mut options = updates_file.file_options();
            if no_backup {
                options.backup = false;
            }
            run_update(&file, updates_file.update_requests(), &options, dry_run, diff)
        }

        Commands::Get { file, key } => cmd_get(&file, &key),

        Commands::Sections { file } => cmd_sections(&file),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "envpatch=debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn parse_pairs(
    pairs: &[String],
    section: &str,
    ignore_section: bool,
) -> Result<Vec<UpdateRequest>> {
    pairs
        .iter()
        .map(|pair| {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("'{pair}' is not of the form KEY=VALUE"))?;
            if key.trim().is_empty() {
                anyhow::bail!("'{pair}' has an empty key");
            }
            let mut update = UpdateRequest::new(key.trim(), value).in_section(section);
            update.ignore_section = ignore_section;
            Ok(update)
        })
        .collect()
}

fn run_update(
    file: &Path,
    updates: Vec<UpdateRequest>,
    options: &UpdateFileOptions,
    dry_run: bool,
    diff: bool,
) -> Result<()> {
    if dry_run || diff {
        let original = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        let (patches, rendered) = preview_file(file, updates.clone(), options)?;
        let rendered = String::from_utf8(rendered).context("patched content is not UTF-8")?;

        if patches.is_empty() {
            println!("{} {} is already up to date", "⊙".yellow(), file.display());
            return Ok(());
        }

        if diff {
            display_diff(file, &original, &rendered);
        }

        if dry_run {
            println!(
                "{} would apply {} patch(es) to {}",
                "→".yellow(),
                patches.len(),
                file.display()
            );
            return Ok(());
        }
    }

    let outcome = update_file(file, updates, options)?;
    if outcome.patches == 0 {
        println!("{} {} is already up to date", "⊙".yellow(), file.display());
        return Ok(());
    }

    if let Some(backup) = &outcome.backup {
        println!("{} backup written to {}", "✓".green(), backup.display());
    }
    println!(
        "{} applied {} patch(es) to {}",
        "✓".green(),
        outcome.patches,
        file.display()
    );
    Ok(())
}

fn cmd_get(file: &Path, key: &str) -> Result<()> {
    let handle =
        File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let mut stream = StreamParser::new(BufReader::new(handle), ParserConfig::default());

    let mut parts: Option<Vec<String>> = None;
    while let Some(line) = stream.next_record()? {
        match line.kind {
            LineKind::Assignment(a) if a.key == key => {
                let terminated = a.terminated;
                parts = Some(vec![a.value]);
                if terminated {
                    break;
                }
            }
            LineKind::Assignment(_) => parts = None,
            LineKind::Continuation(c) => {
                if let Some(parts) = &mut parts {
                    parts.push(c.value);
                    if c.terminated {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    match parts {
        Some(parts) => {
            println!("{}", parts.join("\n"));
            Ok(())
        }
        None => anyhow::bail!("key '{}' not found in {}", key, file.display()),
    }
}

fn cmd_sections(file: &Path) -> Result<()> {
    let handle =
        File::open(file).with_context(|| format!("failed to open {}", file.display()))?;
    let mut stream = StreamParser::new(BufReader::new(handle), ParserConfig::default());
    while stream.next_record()?.is_some() {}

    if stream.sections().is_empty() {
        println!("{}", "no sections".yellow());
        return Ok(());
    }

    for section in stream.sections() {
        println!("{}", section.name.bold());
        for key in &section.declared_keys {
            println!("  {key}");
        }
    }
    Ok(())
}

/// Show a unified diff between original and patched content.
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!("{}", format!("--- {} (original)", file.display()).dimmed());
    println!("{}", format!("+++ {} (patched)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
