//! Per-run orchestration: read the profile, build the uncovered set for each
//! file, then fan the per-file parse/rewrite/print/write jobs out over the
//! thread pool. The first failing file aborts the run; a failed file never
//! leaves partial output behind.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dashmap::DashMap;
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::ranges::UncoveredRanges;
use crate::domain::rewrite::Rewriter;
use crate::infrastructure::{output, parser, printer, profile};

pub struct InstrumentConfig {
    /// Cover profile produced by the prior test run.
    pub coverage: PathBuf,
    /// Module path prefix of the file names inside the profile.
    pub module: String,
    /// Directory holding the profiled source tree.
    pub src_dir: PathBuf,
    /// Root for instrumented output, laid out like the source tree.
    pub out_dir: PathBuf,
    /// Identifier called by every inserted sentinel statement.
    pub sentinel: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Path as named in the profile.
    pub path: String,
    pub uncovered_ranges: usize,
    pub wrapped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: String,
    pub files_instrumented: usize,
    pub files_skipped: usize,
    pub statements_wrapped: usize,
    pub files: Vec<FileReport>,
}

struct FileJob {
    profiled: String,
    rel: PathBuf,
    ranges: UncoveredRanges,
}

pub fn run(config: &InstrumentConfig) -> Result<RunSummary> {
    let profile = profile::read_profile(&config.coverage)?;

    let mut jobs = Vec::new();
    let mut skipped = 0usize;
    for (profiled, blocks) in &profile.files {
        let ranges = UncoveredRanges::from_blocks(blocks.iter().copied());
        if ranges.is_empty() {
            // Fully covered: nothing to instrument, nothing to write.
            skipped += 1;
            continue;
        }
        let rel = output::strip_module(&config.module, profiled)?;
        jobs.push(FileJob { profiled: profiled.clone(), rel, ranges });
    }

    let reports: DashMap<String, FileReport> = DashMap::new();
    jobs.par_iter().try_for_each(|job| {
        let report = instrument_file(config, job)
            .with_context(|| format!("instrumenting {}", job.profiled))?;
        reports.insert(job.profiled.clone(), report);
        Ok::<(), anyhow::Error>(())
    })?;

    let mut files: Vec<FileReport> = reports.into_iter().map(|(_, r)| r).collect();
    files.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(RunSummary {
        mode: profile.mode,
        files_instrumented: files.len(),
        files_skipped: skipped,
        statements_wrapped: files.iter().map(|f| f.wrapped).sum(),
        files,
    })
}

fn instrument_file(config: &InstrumentConfig, job: &FileJob) -> Result<FileReport> {
    eprintln!(
        "glint: processing `{}` with {} uncovered ranges",
        job.profiled,
        job.ranges.len()
    );

    let source = output::read_source(&config.src_dir, &job.rel)?;
    let mut file = parser::parse_file(&source)
        .with_context(|| format!("parsing {}", config.src_dir.join(&job.rel).display()))?;

    let outcome = Rewriter::new(&job.ranges, &config.sentinel).rewrite_file(&mut file);
    if outcome.leftover_skips != 0 {
        bail!(
            "{} constrained clauses were registered but never reached",
            outcome.leftover_skips
        );
    }

    output::write_source(&config.out_dir, &job.rel, &printer::print_file(&file))?;

    Ok(FileReport {
        path: job.profiled.clone(),
        uncovered_ranges: job.ranges.len(),
        wrapped: outcome.wrapped,
    })
}

/// Write the run summary as pretty-printed JSON.
pub fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("serializing run report")?;
    std::fs::write(path, json).with_context(|| format!("writing report {}", path.display()))
}
