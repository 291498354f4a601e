use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::kind::{SchemaObjectKind, replay_bucket_for};
use crate::logger::Logger;
use crate::references::{
    extract_function_references, extract_table_references, file_matches_identifier,
};

/// Outcome of a successful restore.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Files in the order they were executed.
    pub executed: Vec<String>,
    /// Number of times a failing file was sent to the back of the queue.
    pub deferred: usize,
}

/// Sort file names into the initial replay order: kind bucket, then name.
pub fn initial_order(mut files: Vec<String>) -> VecDeque<String> {
    files.sort_by(|left, right| {
        replay_bucket_for(left)
            .cmp(&replay_bucket_for(right))
            .then_with(|| left.cmp(right))
    });
    files.into()
}

/// Replays a directory written by [`crate::SchemaWriter`] against a database.
///
/// There is no dependency graph. Files run in bucket order; a table whose
/// column defaults call a function pulls that function file forward, and a
/// failing file is retried after the others. A file that fails again before
/// anything else succeeded aborts the restore. Statements that already ran
/// stay applied.
pub struct SchemaRestorer<'a> {
    root: PathBuf,
    executor: &'a dyn Executor,
    logger: &'a dyn Logger,
}

impl<'a> SchemaRestorer<'a> {
    pub fn new(
        root: impl Into<PathBuf>,
        executor: &'a dyn Executor,
        logger: &'a dyn Logger,
    ) -> Self {
        Self {
            root: root.into(),
            executor,
            logger,
        }
    }

    /// File names under the root in initial replay order.
    pub fn read_dir(&self) -> Result<VecDeque<String>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(initial_order(files))
    }

    pub fn read(&self, file: &str) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(file))?)
    }

    pub async fn restore(&self) -> Result<RestoreReport> {
        self.logger
            .info(&format!("reading contents from: {}", self.root.display()));
        let mut pending = self.read_dir()?;
        let report = self.replay(&mut pending).await?;
        self.logger.info("all contents restored!");
        Ok(report)
    }

    /// Drain `pending`, executing each file once it reaches the front.
    pub async fn replay(&self, pending: &mut VecDeque<String>) -> Result<RestoreReport> {
        let mut report = RestoreReport::default();
        let mut failed_since_progress: HashSet<String> = HashSet::new();

        while let Some(file) = pending.front().cloned() {
            let contents = self.read(&file)?;

            if self.shift_dependencies(&file, &contents, pending) {
                continue;
            }

            match self.executor.execute(&contents).await {
                Ok(()) => {
                    pending.pop_front();
                    failed_since_progress.clear();
                    report.executed.push(file);
                }
                Err(err) if failed_since_progress.contains(&file) => {
                    self.logger
                        .error(&format!("error processing file {file}: {err}"));
                    return Err(Error::Restore {
                        file,
                        message: err.to_string(),
                    });
                }
                Err(err) => {
                    self.logger.warn(&format!(
                        "error processing file {file}, retrying later: {err}"
                    ));
                    pending.pop_front();
                    pending.push_back(file.clone());
                    failed_since_progress.insert(file);
                    report.deferred += 1;
                }
            }
        }

        Ok(report)
    }

    /// Move later files that `file` depends on to the front of `pending`,
    /// keeping their relative order. Returns whether anything moved.
    fn shift_dependencies(
        &self,
        file: &str,
        contents: &str,
        pending: &mut VecDeque<String>,
    ) -> bool {
        let (identifiers, target) = match SchemaObjectKind::from_file_name(file) {
            Some(SchemaObjectKind::Table) => (
                extract_function_references(contents),
                SchemaObjectKind::Function,
            ),
            Some(SchemaObjectKind::ForeignKey) => {
                (extract_table_references(contents), SchemaObjectKind::Table)
            }
            _ => return false,
        };
        if identifiers.is_empty() {
            return false;
        }

        let positions: Vec<usize> = pending
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, candidate)| {
                SchemaObjectKind::from_file_name(candidate) == Some(target)
                    && identifiers
                        .iter()
                        .any(|identifier| file_matches_identifier(candidate, identifier))
            })
            .map(|(position, _)| position)
            .collect();
        if positions.is_empty() {
            return false;
        }

        let mut moved = Vec::with_capacity(positions.len());
        for position in positions.into_iter().rev() {
            if let Some(dependency) = pending.remove(position) {
                moved.push(dependency);
            }
        }
        // `moved` is back-to-front, so pushing each to the front restores order.
        for dependency in moved {
            self.logger
                .info(&format!("moving {dependency} before {file}"));
            pending.push_front(dependency);
        }
        true
    }
}
