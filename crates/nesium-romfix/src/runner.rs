//! Drives a whole run: walk, reconcile, apply, count.

use std::{fmt, fs, path::Path};

use tracing::{debug, info, warn};

use crate::{
    config::RunConfig,
    container::ContainerFormat,
    database::MetadataTable,
    error::Error,
    header::format_header,
    materialize::Materializer,
    reconcile::{Action, Outcome, ReconcileEngine},
    traverse::{RomEntry, UNHEADERED_SUFFIX, collect_roms},
};

/// How a single file ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Updated,
    Unchanged,
    Stripped,
    Unmatched,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub scanned: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub stripped: usize,
    pub unmatched: usize,
    pub mapper_corrections: usize,
    pub failed: usize,
    pub dry_run: bool,
}

impl RunSummary {
    fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Updated => self.updated += 1,
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::Stripped => self.stripped += 1,
            FileStatus::Unmatched => self.unmatched += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files scanned: {} updated ({} mapper corrections), {} already correct, \
             {} disk headers trimmed, {} not in database, {} failed",
            self.scanned,
            self.updated,
            self.mapper_corrections,
            self.unchanged,
            self.stripped,
            self.unmatched,
            self.failed
        )?;
        if self.dry_run {
            write!(f, " (dry run, no files were modified)")?;
        }
        Ok(())
    }
}

pub struct Runner<'a> {
    config: RunConfig,
    engine: ReconcileEngine<'a>,
    materializer: Materializer,
}

impl<'a> Runner<'a> {
    pub fn new(config: RunConfig, table: &'a MetadataTable) -> Self {
        Self {
            engine: ReconcileEngine::new(table, config.nes2),
            materializer: Materializer::new(config.dry_run),
            config,
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process every recognised file below `root`. Per-file failures are logged
    /// and counted; they never stop the run.
    pub fn run(&self, root: &Path) -> RunSummary {
        let unknown_root = self.config.unknown_root(root);
        let exclude = self.config.sort_unknown.then_some(unknown_root.as_path());
        let mut summary = RunSummary {
            dry_run: self.config.dry_run,
            ..RunSummary::default()
        };

        for entry in collect_roms(root, exclude) {
            summary.scanned += 1;
            match self.process(&entry, &unknown_root) {
                Ok(outcome) => {
                    summary.record(status_of(&outcome));
                    if outcome.mapper_correction.is_some() {
                        summary.mapper_corrections += 1;
                    }
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!("{err}");
                }
            }
        }

        info!("{summary}");
        summary
    }

    /// Reconcile and apply one file. The file is fully read and hashed before
    /// anything is written back.
    pub fn process(&self, entry: &RomEntry, unknown_root: &Path) -> Result<Outcome, Error> {
        let bytes = fs::read(&entry.path).map_err(|source| Error::ContainerRead {
            path: entry.path.clone(),
            source,
        })?;
        let outcome = self.engine.reconcile(&bytes, entry.kind);
        drop(bytes);

        let file = entry.file_name();
        if outcome.decoded.truncated {
            warn!("{file}: container ends early, using the data that was readable");
        }

        match outcome.action {
            Action::WriteHeader(header) => {
                info!(
                    "Updating header for SHA1: {} File: {file}",
                    outcome.chosen_hash
                );
                if let Some(old) = outcome.decoded.embedded_header {
                    info!("{} (old)", format_header(&old));
                }
                info!("{} (new)", format_header(&header));
                if let Some(correction) = outcome.mapper_correction {
                    info!(
                        "Mapper corrected from {} to {} for {file}",
                        correction.old, correction.new
                    );
                }
                if let Some(len) = outcome.trim_to {
                    info!("Trimming payload of {file} to {len} bytes");
                }
                self.materializer.write_rom(
                    &entry.path,
                    &header,
                    &outcome.decoded.content,
                    outcome.trim_to,
                )?;
            }
            Action::StripHeader => {
                info!("Trimming FDS header from {file}");
                self.materializer
                    .write_rom(&entry.path, &[], &outcome.decoded.content, None)?;
            }
            Action::NoChange => {
                debug!("Header already correct for {file}");
            }
            Action::Unmatched => {
                info!(
                    "ROM not found in database. SHA1: {} File: {file}",
                    outcome.chosen_hash
                );
                self.handle_unmatched(entry, &outcome, unknown_root)?;
            }
        }

        Ok(outcome)
    }

    fn handle_unmatched(
        &self,
        entry: &RomEntry,
        outcome: &Outcome,
        unknown_root: &Path,
    ) -> Result<(), Error> {
        let mut path = entry.path.clone();
        let mut name = entry.file_name();
        let format = outcome.format();

        if self.config.mark_unheadered
            && matches!(
                format,
                ContainerFormat::TaggedChunk | ContainerFormat::Headerless
            )
        {
            let marked = if name.to_ascii_lowercase().ends_with(UNHEADERED_SUFFIX) {
                path.clone()
            } else {
                name.push_str(UNHEADERED_SUFFIX);
                path.with_file_name(&name)
            };
            if format == ContainerFormat::TaggedChunk {
                // The marked copy must be complete before the container goes away.
                info!("Unwrapping UNIF payload into {name}");
                self.materializer
                    .write_rom(&marked, &[], &outcome.decoded.content, None)?;
                if marked != path {
                    self.materializer.remove(&path)?;
                }
            } else if marked != path {
                self.materializer.rename(&path, &marked)?;
            }
            path = marked;
        }

        if self.config.sort_unknown {
            let target_dir = unknown_root.join(entry.relative_dir());
            self.materializer.ensure_dir(&target_dir)?;
            self.materializer.rename(&path, &target_dir.join(&name))?;
        }
        Ok(())
    }
}

fn status_of(outcome: &Outcome) -> FileStatus {
    match outcome.action {
        Action::WriteHeader(_) => FileStatus::Updated,
        Action::StripHeader => FileStatus::Stripped,
        Action::NoChange => FileStatus::Unchanged,
        Action::Unmatched => FileStatus::Unmatched,
    }
}
