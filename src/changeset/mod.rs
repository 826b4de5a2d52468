//! Change-set detection.
//!
//! Turns the name-status diff between two revisions into the classified set of
//! added, modified and deleted paths, plus the subsets that fall under the
//! flow definitions directory.

use crate::utils::{flow_name_from_path, is_flow_path};
use crate::vcs::RevisionDiffSource;
use std::collections::BTreeSet;
use tracing::{debug, error, info, warn};

/// Classification of a single name-status record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffStatus {
    Added,
    Modified,
    Deleted,
    TypeChanged,
    /// `R<score>`: a move from the first path to the second
    Renamed,
    /// `C<score>`: a copy from the first path to the second
    Copied,
    Unknown(String),
}

impl DiffStatus {
    pub fn parse(status: &str) -> Self {
        match status.chars().next() {
            Some('A') => DiffStatus::Added,
            Some('M') => DiffStatus::Modified,
            Some('D') => DiffStatus::Deleted,
            Some('T') => DiffStatus::TypeChanged,
            Some('R') => DiffStatus::Renamed,
            Some('C') => DiffStatus::Copied,
            _ => DiffStatus::Unknown(status.to_string()),
        }
    }

    /// Number of tab-separated path fields this status carries
    fn path_count(&self) -> usize {
        match self {
            DiffStatus::Renamed | DiffStatus::Copied => 2,
            _ => 1,
        }
    }
}

/// Paths changed between two revisions.
///
/// Built once per run by [`detect_changes`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    added: Vec<String>,
    modified: Vec<String>,
    deleted: Vec<String>,
    flows_added: Vec<String>,
    flows_modified: Vec<String>,
    flows_deleted: Vec<String>,
}

impl ChangeSet {
    /// Classify raw name-status records.
    ///
    /// Malformed records and unsupported statuses are logged and skipped.
    pub fn from_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut changes = ChangeSet::default();

        for record in records {
            let record = record.as_ref();
            if record.trim().is_empty() {
                continue;
            }

            let mut fields = record.split('\t');
            let status = DiffStatus::parse(fields.next().unwrap_or_default());
            let paths: Vec<&str> = fields.collect();

            if let DiffStatus::Unknown(raw) = &status {
                warn!(status = %raw, %record, "Skipping diff record with unsupported status");
                continue;
            }
            if paths.len() != status.path_count() || paths.iter().any(|p| p.is_empty()) {
                warn!(%record, "Skipping malformed diff record");
                continue;
            }

            match status {
                DiffStatus::Added => changes.push_added(paths[0]),
                DiffStatus::Modified | DiffStatus::TypeChanged => changes.push_modified(paths[0]),
                DiffStatus::Deleted => changes.push_deleted(paths[0]),
                // A move that keeps the file name keeps the flow
                DiffStatus::Renamed
                    if flow_name_from_path(paths[0]) == flow_name_from_path(paths[1]) =>
                {
                    changes.push_modified(paths[1])
                }
                DiffStatus::Renamed => {
                    changes.push_deleted(paths[0]);
                    changes.push_added(paths[1]);
                }
                DiffStatus::Copied => changes.push_added(paths[1]),
                DiffStatus::Unknown(_) => {}
            }
        }

        changes
    }

    fn push_added(&mut self, path: &str) {
        self.added.push(path.to_string());
        if is_flow_path(path) {
            self.flows_added.push(path.to_string());
        }
    }

    fn push_modified(&mut self, path: &str) {
        self.modified.push(path.to_string());
        if is_flow_path(path) {
            self.flows_modified.push(path.to_string());
        }
    }

    fn push_deleted(&mut self, path: &str) {
        self.deleted.push(path.to_string());
        if is_flow_path(path) {
            self.flows_deleted.push(path.to_string());
        }
    }

    pub fn added(&self) -> &[String] {
        &self.added
    }

    pub fn modified(&self) -> &[String] {
        &self.modified
    }

    pub fn deleted(&self) -> &[String] {
        &self.deleted
    }

    pub fn flows_added(&self) -> &[String] {
        &self.flows_added
    }

    pub fn flows_modified(&self) -> &[String] {
        &self.flows_modified
    }

    pub fn flows_deleted(&self) -> &[String] {
        &self.flows_deleted
    }

    /// Added followed by modified flow paths
    pub fn flows_touched(&self) -> Vec<String> {
        self.flows_added
            .iter()
            .chain(self.flows_modified.iter())
            .cloned()
            .collect()
    }

    /// Deleted flow paths whose name is not re-synced by an added or
    /// modified path of the same change set.
    pub fn flows_to_delete(&self) -> Vec<String> {
        let kept: BTreeSet<String> = self
            .flows_added
            .iter()
            .chain(self.flows_modified.iter())
            .map(|path| flow_name_from_path(path))
            .collect();

        self.flows_deleted
            .iter()
            .filter(|path| {
                let moved = kept.contains(&flow_name_from_path(path));
                if moved {
                    debug!(%path, "Flow name still defined by another path, keeping it");
                }
                !moved
            })
            .cloned()
            .collect()
    }

    pub fn has_flow_changes(&self) -> bool {
        !self.flows_added.is_empty()
            || !self.flows_modified.is_empty()
            || !self.flows_deleted.is_empty()
    }
}

/// Detect the changes between `before` and `after`.
///
/// Missing revisions default to the previous and current revision of the
/// source. Any failure to resolve a revision or to compute the diff is logged
/// and yields an empty change set.
pub async fn detect_changes<S>(source: &S, before: Option<&str>, after: Option<&str>) -> ChangeSet
where
    S: RevisionDiffSource + ?Sized,
{
    let before = match before {
        Some(rev) => rev.to_string(),
        None => match source.resolve_default_before().await {
            Ok(rev) => rev,
            Err(e) => {
                error!(error = %e, "Could not determine the previous revision");
                return ChangeSet::default();
            }
        },
    };

    let after = match after {
        Some(rev) => rev.to_string(),
        None => match source.resolve_default_after().await {
            Ok(rev) => rev,
            Err(e) => {
                error!(error = %e, "Could not determine the current revision");
                return ChangeSet::default();
            }
        },
    };

    let records = match source.diff(&before, &after).await {
        Ok(records) => records,
        Err(e) => {
            error!(%before, %after, error = %e, "Could not compute changes between revisions");
            return ChangeSet::default();
        }
    };

    let changes = ChangeSet::from_records(&records);
    info!(
        %before,
        %after,
        flows_added = changes.flows_added().len(),
        flows_modified = changes.flows_modified().len(),
        flows_deleted = changes.flows_deleted().len(),
        "Detected changes"
    );
    for path in changes.flows_added() {
        debug!(%path, "Flow added");
    }
    for path in changes.flows_modified() {
        debug!(%path, "Flow modified");
    }
    for path in changes.flows_deleted() {
        debug!(%path, "Flow deleted");
    }

    changes
}
