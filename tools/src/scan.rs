//! Batch scanning with per-file failure isolation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use formats::{GifParser, PgpParser};
use glob::Pattern;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{format_gif_pretty, format_packets_pretty, summarize_gif, summarize_packets};

/// Which grammar to decode files with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    Gif,
    Pgp,
}

/// How decoded files are rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct ScanOptions {
    pub kind: ScanKind,
    pub format: OutputFormat,
    pub glob: Option<String>,
    pub fail_fast: bool,
}

/// Result of decoding one file: its rendered description or the error.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<String>,
}

impl FileOutcome {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct ScanReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ScanReport {
    #[must_use]
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|outcome| !outcome.is_ok()).count()
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures() == 0
    }
}

/// Both grammars, built once per run.
#[derive(Debug, Clone)]
pub struct Scanner {
    gif: GifParser,
    pgp: PgpParser,
}

impl Scanner {
    pub fn new() -> Result<Self> {
        Ok(Self {
            gif: GifParser::new().context("build GIF grammar")?,
            pgp: PgpParser::new().context("build PGP grammar")?,
        })
    }

    /// Decodes every file named by `paths`, calling `report` as each one
    /// finishes. A failing file is recorded and scanning moves on, unless
    /// `fail_fast` is set.
    pub fn scan(
        &self,
        paths: &[PathBuf],
        options: &ScanOptions,
        mut report: impl FnMut(&FileOutcome),
    ) -> Result<ScanReport> {
        let mut scan = ScanReport::default();
        for path in collect_entries(paths, options.glob.as_deref())? {
            let result = self.describe(options.kind, &path, options.format);
            if let Err(err) = &result {
                warn!(path = %path.display(), error = %format!("{err:#}"), "decode failed");
            }
            let outcome = FileOutcome { path, result };
            report(&outcome);
            let failed = !outcome.is_ok();
            scan.outcomes.push(outcome);
            if failed && options.fail_fast {
                break;
            }
        }
        Ok(scan)
    }

    pub fn describe(&self, kind: ScanKind, path: &Path, format: OutputFormat) -> Result<String> {
        let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
        match kind {
            ScanKind::Gif => {
                let (file, length) = self.gif.parse(&bytes).context("parse GIF")?;
                let summary = summarize_gif(&file, length).context("summarize GIF")?;
                debug!(path = %path.display(), blocks = summary.blocks.len(), "decoded gif");
                render(&summary, format, format_gif_pretty)
            }
            ScanKind::Pgp => {
                let packets = self.pgp.parse_all(&bytes).context("parse PGP packets")?;
                debug!(path = %path.display(), packets = packets.len(), "decoded pgp");
                let summaries = summarize_packets(&packets);
                render(summaries.as_slice(), format, format_packets_pretty)
            }
        }
    }
}

fn render<T: Serialize + ?Sized>(
    value: &T,
    format: OutputFormat,
    pretty: impl Fn(&T) -> String,
) -> Result<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).context("serialize json"),
        OutputFormat::Pretty => Ok(pretty(value)),
    }
}

/// Expands directories (non-recursively, filtered by `glob`) into files.
/// Plain file arguments are passed through unfiltered.
pub fn collect_entries(paths: &[PathBuf], glob: Option<&str>) -> Result<Vec<PathBuf>> {
    let pattern = match glob {
        Some(value) => Some(Pattern::new(value).context("invalid glob pattern")?),
        None => None,
    };

    let mut entries = Vec::new();
    for path in paths {
        if !path.is_dir() {
            entries.push(path.clone());
            continue;
        }
        let mut found = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("read dir {}", path.display()))? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            if let Some(pattern) = &pattern {
                let matches_path = pattern.matches_path(&path);
                let matches_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| pattern.matches(name));
                if !matches_path && !matches_name {
                    continue;
                }
            }
            found.push(path);
        }
        found.sort();
        entries.extend(found);
    }
    Ok(entries)
}
