//! Per-file outcomes and the run report.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// What happened to one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlacementStatus {
    /// Written to a fresh destination name
    Placed,
    /// An identical file was already there; nothing was written
    AlreadyPresent,
    Failed { reason: String },
}

impl PlacementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Placed => "placed",
            Self::AlreadyPresent => "already_present",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacementOutcome {
    pub source: PathBuf,
    /// Final path, or the intended path when the placement failed
    pub destination: PathBuf,
    /// Folder label the file was routed to
    pub folder: String,
    pub pending: bool,
    #[serde(flatten)]
    pub status: PlacementStatus,
    /// Differing-content names skipped before a free or identical one
    pub collisions: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureDetail {
    pub source: PathBuf,
    pub reason: String,
}

/// Counts for one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeSummary {
    /// Files per folder label
    pub per_folder: BTreeMap<String, usize>,
    pub pending: usize,
    pub placed: usize,
    pub already_present: usize,
    pub failed: usize,
    pub failures: Vec<FailureDetail>,
}

impl OrganizeSummary {
    pub fn total(&self) -> usize {
        self.placed + self.already_present + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// All outcomes of one `execute` call, in plan order
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrganizeReport {
    pub outcomes: Vec<PlacementOutcome>,
}

impl OrganizeReport {
    pub fn summary(&self) -> OrganizeSummary {
        let mut summary = OrganizeSummary::default();

        for outcome in &self.outcomes {
            match &outcome.status {
                PlacementStatus::Placed => summary.placed += 1,
                PlacementStatus::AlreadyPresent => summary.already_present += 1,
                PlacementStatus::Failed { reason } => {
                    summary.failed += 1;
                    summary.failures.push(FailureDetail {
                        source: outcome.source.clone(),
                        reason: reason.clone(),
                    });
                    continue;
                }
            }

            *summary.per_folder.entry(outcome.folder.clone()).or_default() += 1;
            if outcome.pending {
                summary.pending += 1;
            }
        }

        summary
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(|o| o.status.is_failed())
    }
}
