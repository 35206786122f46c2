//! Organizer configuration.
//!
//! Loaded from TOML:
//!
//! ```toml
//! output_root = "/home/me/报销"
//! mode = "copy"
//!
//! [folders]
//! taxi = "打车票"
//! pending = "待确认"
//! ```
//!
//! Every key is optional; CLI flags override file values.

use crate::categorize::Destination;
use crate::error::{OrganizeError, Result};
use crate::records::Category;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that cannot appear in a folder label
const ILLEGAL_LABEL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Whether sources are kept after placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Copy, leaving the source untouched
    Copy,
    /// Move; the source is removed only after a successful write
    #[default]
    Move,
}

impl PlacementMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copy => "copy",
            Self::Move => "move",
        }
    }
}

/// Folder label for each category plus the pending bucket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolderNames {
    pub taxi: String,
    pub train: String,
    pub flight: String,
    pub hotel: String,
    pub meal: String,
    pub other: String,
    pub pending: String,
}

impl Default for FolderNames {
    fn default() -> Self {
        Self {
            taxi: "打车票".to_string(),
            train: "火车票".to_string(),
            flight: "机票".to_string(),
            hotel: "住宿".to_string(),
            meal: "餐饮".to_string(),
            other: "其他".to_string(),
            pending: "待确认".to_string(),
        }
    }
}

impl FolderNames {
    pub fn category(&self, category: Category) -> &str {
        match category {
            Category::Taxi => &self.taxi,
            Category::Train => &self.train,
            Category::Flight => &self.flight,
            Category::Hotel => &self.hotel,
            Category::Meal => &self.meal,
            Category::Other => &self.other,
        }
    }

    pub fn label(&self, destination: Destination) -> &str {
        match destination {
            Destination::Category(category) => self.category(category),
            Destination::Pending => &self.pending,
        }
    }

    /// All seven labels, categories first, pending last
    pub fn all(&self) -> Vec<&str> {
        Category::ALL
            .iter()
            .map(|&c| self.category(c))
            .chain(std::iter::once(self.pending.as_str()))
            .collect()
    }

    /// Labels must be non-empty, single path segments, and distinct
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for label in self.all() {
            let trimmed = label.trim();
            if trimmed.is_empty() {
                return Err(OrganizeError::Config("folder label cannot be empty".to_string()));
            }
            if trimmed != label {
                return Err(OrganizeError::Config(format!(
                    "folder label '{}' has leading or trailing whitespace",
                    label
                )));
            }
            if label == "." || label == ".." || label.chars().any(|c| ILLEGAL_LABEL_CHARS.contains(&c) || c.is_control()) {
                return Err(OrganizeError::Config(format!(
                    "folder label '{}' is not a valid directory name",
                    label
                )));
            }
            if !seen.insert(label) {
                return Err(OrganizeError::Config(format!(
                    "folder label '{}' is used more than once",
                    label
                )));
            }
        }

        Ok(())
    }
}

/// Configuration for one organize run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    /// Destination root; the category folders are created beneath it
    pub output_root: PathBuf,
    pub mode: PlacementMode,
    pub folders: FolderNames,
}

impl OrganizerConfig {
    pub fn new(output_root: impl Into<PathBuf>, mode: PlacementMode) -> Self {
        Self {
            output_root: output_root.into(),
            mode,
            folders: FolderNames::default(),
        }
    }

    /// Read a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            OrganizeError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        let config: OrganizerConfig = toml::from_str(&content)?;

        tracing::debug!(path = %path.display(), "Loaded organizer config");
        Ok(config)
    }

    /// Load the config at `path`, or the default location if it exists,
    /// falling back to built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(default_path) if default_path.is_file() => Self::load(&default_path),
            _ => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.output_root.as_os_str().is_empty() {
            return Err(OrganizeError::Config("output directory is not set".to_string()));
        }
        self.folders.validate()
    }
}

/// `~/.config/reimburse-organizer/config.toml` (platform equivalent)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("reimburse-organizer").join("config.toml"))
}
