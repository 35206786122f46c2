//! Command-line interface.

use crate::config::{OrganizerConfig, PlacementMode};
use crate::execution::{OrganizeSummary, PlacementPlan};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reimburse-organizer")]
#[command(about = "Pair, categorize and file expense documents for reimbursement")]
#[command(version)]
pub struct Cli {
    /// JSON manifest of extracted records
    #[arg(long, short = 'm')]
    pub manifest: PathBuf,

    /// Output root; overrides the config file
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// TOML config file (default: the user config directory)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Copy files, keeping the sources
    #[arg(long, conflicts_with = "move_files")]
    pub copy: bool,

    /// Move files (default)
    #[arg(long = "move", id = "move_files")]
    pub move_files: bool,

    /// Print the plan without touching any file
    #[arg(long)]
    pub dry_run: bool,

    /// Print the plan or report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Apply command-line overrides on top of a loaded config
    pub fn apply(&self, mut config: OrganizerConfig) -> OrganizerConfig {
        if let Some(output) = &self.output {
            config.output_root = output.clone();
        }
        if self.copy {
            config.mode = PlacementMode::Copy;
        } else if self.move_files {
            config.mode = PlacementMode::Move;
        }
        config
    }
}

pub fn render_plan(plan: &PlacementPlan) -> String {
    let mut out = String::new();
    let mut current_group = None;

    for file in &plan.files {
        if current_group != Some(file.group) {
            current_group = Some(file.group);
            out.push_str(&format!("[group {}]\n", file.group + 1));
        }
        out.push_str(&format!(
            "  {} -> {}\n",
            file.source.display(),
            file.relative_path().display()
        ));
    }

    out.push_str(&format!("{} files in {} groups\n", plan.len(), plan.groups));
    out
}

pub fn render_summary(summary: &OrganizeSummary) -> String {
    let mut out = String::new();

    for (folder, count) in &summary.per_folder {
        out.push_str(&format!("{:<8} {}\n", folder, count));
    }
    out.push_str(&format!(
        "placed: {}, already present: {}, failed: {}, pending review: {}\n",
        summary.placed, summary.already_present, summary.failed, summary.pending
    ));

    if !summary.failures.is_empty() {
        out.push_str("failures:\n");
        for failure in &summary.failures {
            out.push_str(&format!("  {}: {}\n", failure.source.display(), failure.reason));
        }
    }

    out
}
