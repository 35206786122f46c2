//! Placement planning: folder and filename for every record, no I/O.

use crate::categorize::{categorize, Destination};
use crate::config::FolderNames;
use crate::matching::Group;
use crate::naming::generate_filename;
use serde::Serialize;
use std::path::PathBuf;

/// One file to place
#[derive(Debug, Clone, Serialize)]
pub struct PlannedFile {
    /// Index of the record in the input batch
    pub record_index: usize,
    pub source: PathBuf,
    pub destination: Destination,
    /// Folder label under the output root
    pub folder: String,
    /// Base filename before collision handling
    pub filename: String,
    /// Lower-cased extension carried over from the source
    pub extension: Option<String>,
    /// Position of the group in match order
    pub group: usize,
    /// 1-based position inside the group
    pub member: usize,
    pub group_size: usize,
}

impl PlannedFile {
    /// `folder/filename`, relative to the output root
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(&self.folder).join(&self.filename)
    }
}

/// Ordered list of placements for a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlacementPlan {
    pub files: Vec<PlannedFile>,
    pub groups: usize,
}

impl PlacementPlan {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Categorize and name every member of every group.
///
/// Members of a multi-member group share the anchor's effective date so the
/// whole transaction sorts together.
pub fn plan_groups(groups: &[Group<'_>], folders: &FolderNames) -> PlacementPlan {
    let mut files = Vec::new();

    for (group_index, group) in groups.iter().enumerate() {
        let destination = categorize(group);
        let folder = folders.label(destination).to_string();
        let group_size = group.len();
        let shared_date = (group_size > 1).then(|| group.anchor().effective_date());

        for (position, member) in group.members().iter().enumerate() {
            let member_index = position + 1;
            let filename = generate_filename(member.record, member_index, group_size, shared_date);

            files.push(PlannedFile {
                record_index: member.index,
                source: member.record.source_path.clone(),
                destination,
                folder: folder.clone(),
                filename,
                extension: member.record.extension(),
                group: group_index,
                member: member_index,
                group_size,
            });
        }
    }

    tracing::debug!(groups = groups.len(), files = files.len(), "Planned placements");

    PlacementPlan {
        files,
        groups: groups.len(),
    }
}
