//! End-to-end pipeline: match, categorize, name, place.

use crate::config::{FolderNames, OrganizerConfig};
use crate::error::Result;
use crate::execution::{plan_groups, OrganizeReport, PlacementExecutor, PlacementPlan};
use crate::matching::match_records;
use crate::records::Record;

/// Plan a batch without touching the disk
pub fn preview(records: &[Record], folders: &FolderNames) -> PlacementPlan {
    let groups = match_records(records);
    plan_groups(&groups, folders)
}

/// Organize a batch into `config.output_root`.
///
/// Configuration and output-root problems are returned as errors before any
/// file is touched; per-file problems are reported in the outcomes.
pub fn organize(records: &[Record], config: &OrganizerConfig) -> Result<OrganizeReport> {
    let executor = PlacementExecutor::new(config)?;
    let plan = preview(records, &config.folders);
    executor.execute(&plan)
}
