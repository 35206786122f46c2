//! Placement executor: writes a plan into the output tree.
//!
//! The whole batch runs under an exclusive lock on `<root>/.reimburse.lock`,
//! so collision resolution from two processes never interleaves. Each file
//! is placed independently; a failure is recorded in its outcome and the
//! batch continues.

use super::checksum::same_content;
use super::outcome::{OrganizeReport, PlacementOutcome, PlacementStatus};
use super::plan::{PlacementPlan, PlannedFile};
use crate::config::{FolderNames, OrganizerConfig, PlacementMode};
use crate::error::{OrganizeError, PlacementError, Result};
use fs2::FileExt;
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Highest `(n)` tried before giving up on a name
pub const MAX_DISAMBIGUATOR: u32 = 999;

/// Advisory lock held for the duration of `execute`
pub const LOCK_FILE_NAME: &str = ".reimburse.lock";

const PARTIAL_SUFFIX: &str = ".partial";

/// Where one file ended up
#[derive(Debug)]
struct Resolved {
    destination: PathBuf,
    status: PlacementStatus,
    collisions: u32,
}

/// Name for collision candidate `n`: the plain name for 1, `stem (n).ext`
/// after that
pub fn candidate_name(filename: &str, extension: Option<&str>, n: u32) -> String {
    if n <= 1 {
        return filename.to_string();
    }

    match extension.and_then(|ext| {
        filename
            .strip_suffix(ext)
            .and_then(|rest| rest.strip_suffix('.'))
            .map(|stem| (stem, ext))
    }) {
        Some((stem, ext)) => format!("{} ({}).{}", stem, n, ext),
        None => format!("{} ({})", filename, n),
    }
}

pub struct PlacementExecutor {
    root: PathBuf,
    mode: PlacementMode,
    folders: FolderNames,
    max_disambiguator: u32,
}

impl PlacementExecutor {
    /// Validate the configuration and create the output layout.
    ///
    /// Fails before any file work if the root or a category folder cannot
    /// be created.
    pub fn new(config: &OrganizerConfig) -> Result<Self> {
        config.validate()?;

        let executor = Self {
            root: config.output_root.clone(),
            mode: config.mode,
            folders: config.folders.clone(),
            max_disambiguator: MAX_DISAMBIGUATOR,
        };
        executor.ensure_layout()?;
        Ok(executor)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    /// Override the collision budget (default `MAX_DISAMBIGUATOR`)
    pub fn with_max_disambiguator(mut self, max_disambiguator: u32) -> Self {
        self.max_disambiguator = max_disambiguator.max(1);
        self
    }

    /// Create the root, every category folder and the pending folder.
    /// Idempotent.
    pub fn ensure_layout(&self) -> Result<()> {
        let dirs = std::iter::once(self.root.clone())
            .chain(self.folders.all().into_iter().map(|label| self.root.join(label)));

        for dir in dirs {
            fs::create_dir_all(&dir).map_err(|source| OrganizeError::OutputRoot {
                path: dir.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Place every file in the plan, in order.
    pub fn execute(&self, plan: &PlacementPlan) -> Result<OrganizeReport> {
        let _lock = self.acquire_lock()?;

        tracing::info!(
            root = %self.root.display(),
            files = plan.len(),
            mode = self.mode.as_str(),
            "Placing files"
        );

        // Destinations already accounted for by an earlier file of this batch
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let outcomes: Vec<PlacementOutcome> = plan
            .files
            .iter()
            .map(|file| self.place(file, &mut claimed))
            .collect();
        let report = OrganizeReport { outcomes };

        let summary = report.summary();
        tracing::info!(
            placed = summary.placed,
            already_present = summary.already_present,
            failed = summary.failed,
            pending = summary.pending,
            "Placement finished"
        );

        Ok(report)
    }

    /// Acquire the root lock. The returned handle must be kept alive while
    /// the lock is needed.
    fn acquire_lock(&self) -> Result<File> {
        let lock_path = self.root.join(LOCK_FILE_NAME);
        let lock_err = |source| OrganizeError::Lock {
            path: lock_path.clone(),
            source,
        };

        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(lock_err)?;

        // Blocks until any other run on this root finishes
        lock_file.lock_exclusive().map_err(lock_err)?;

        Ok(lock_file)
    }

    fn place(&self, file: &PlannedFile, claimed: &mut HashSet<PathBuf>) -> PlacementOutcome {
        let dir = self.root.join(&file.folder);

        let resolved = self.resolve(file, &dir, claimed).unwrap_or_else(|e| {
            tracing::warn!(source = %file.source.display(), error = %e, "Placement failed");
            Resolved {
                destination: dir.join(&file.filename),
                status: PlacementStatus::Failed { reason: e.to_string() },
                collisions: 0,
            }
        });

        tracing::debug!(
            source = %file.source.display(),
            destination = %resolved.destination.display(),
            status = resolved.status.as_str(),
            collisions = resolved.collisions,
            "Placed file"
        );

        if !resolved.status.is_failed() {
            claimed.insert(resolved.destination.clone());
        }

        PlacementOutcome {
            source: file.source.clone(),
            destination: resolved.destination,
            folder: file.folder.clone(),
            pending: file.destination.is_pending(),
            status: resolved.status,
            collisions: resolved.collisions,
        }
    }

    /// Walk collision candidates until a free name or an identical file
    fn resolve(
        &self,
        file: &PlannedFile,
        dir: &Path,
        claimed: &HashSet<PathBuf>,
    ) -> std::result::Result<Resolved, PlacementError> {
        let source = file.source.as_path();
        let plain = dir.join(&file.filename);

        if !source.is_file() {
            if self.mode == PlacementMode::Move {
                if let Some(resolved) = self.find_previous_move(file, dir, claimed) {
                    return Ok(resolved);
                }
            }
            return Err(PlacementError::SourceMissing(source.to_path_buf()));
        }

        let extension = file.extension.as_deref();
        let mut collisions = 0;

        for n in 1..=self.max_disambiguator {
            let candidate = dir.join(candidate_name(&file.filename, extension, n));

            match fs::symlink_metadata(&candidate) {
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.write(source, &candidate)?;
                    return Ok(Resolved {
                        destination: candidate,
                        status: PlacementStatus::Placed,
                        collisions,
                    });
                }
                Err(e) => return Err(PlacementError::io("inspect", &candidate, e)),
                Ok(meta) => {
                    let identical = meta.is_file()
                        && same_content(source, &candidate)
                            .map_err(|e| PlacementError::io("compare", &candidate, e))?;

                    if identical {
                        if self.mode == PlacementMode::Move && !is_same_file(source, &candidate) {
                            fs::remove_file(source)
                                .map_err(|e| PlacementError::io("remove", source, e))?;
                        }
                        return Ok(Resolved {
                            destination: candidate,
                            status: PlacementStatus::AlreadyPresent,
                            collisions,
                        });
                    }
                    collisions += 1;
                }
            }
        }

        Err(PlacementError::NamesExhausted {
            path: plain,
            attempts: self.max_disambiguator,
        })
    }

    /// Locate the file a previous move run made from a now-missing source.
    ///
    /// Walks the same candidate names a placement would, skipping any file
    /// another member of this batch already resolved to, and stops at the
    /// first free name. Only a file nobody in this batch accounts for is
    /// taken as the earlier result.
    fn find_previous_move(&self, file: &PlannedFile, dir: &Path, claimed: &HashSet<PathBuf>) -> Option<Resolved> {
        let extension = file.extension.as_deref();

        for n in 1..=self.max_disambiguator {
            let candidate = dir.join(candidate_name(&file.filename, extension, n));
            if !candidate.is_file() {
                return None;
            }
            if !claimed.contains(&candidate) {
                return Some(Resolved {
                    destination: candidate,
                    status: PlacementStatus::AlreadyPresent,
                    collisions: n - 1,
                });
            }
        }

        None
    }

    fn write(&self, source: &Path, destination: &Path) -> std::result::Result<(), PlacementError> {
        match self.mode {
            PlacementMode::Copy => copy_via_partial(source, destination),
            PlacementMode::Move => {
                // Try rename first (same filesystem), fall back to copy + remove
                if fs::rename(source, destination).is_ok() {
                    return Ok(());
                }
                copy_via_partial(source, destination)?;
                fs::remove_file(source).map_err(|e| PlacementError::io("remove", source, e))
            }
        }
    }
}

/// Copy into `<destination>.partial`, then rename into place
fn copy_via_partial(source: &Path, destination: &Path) -> std::result::Result<(), PlacementError> {
    let mut partial = destination.as_os_str().to_owned();
    partial.push(PARTIAL_SUFFIX);
    let partial = PathBuf::from(partial);

    if let Err(e) = fs::copy(source, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(PlacementError::io("copy", source, e));
    }

    if let Err(e) = fs::rename(&partial, destination) {
        let _ = fs::remove_file(&partial);
        return Err(PlacementError::io("rename", destination, e));
    }

    Ok(())
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::Destination;
    use crate::records::Category;
    use tempfile::TempDir;

    fn planned(source: &Path, filename: &str) -> PlannedFile {
        PlannedFile {
            record_index: 0,
            source: source.to_path_buf(),
            destination: Destination::Category(Category::Taxi),
            folder: "打车票".to_string(),
            filename: filename.to_string(),
            extension: Path::new(filename)
                .extension()
                .map(|e| e.to_string_lossy().to_string()),
            group: 0,
            member: 1,
            group_size: 1,
        }
    }

    fn plan_of(files: Vec<PlannedFile>) -> PlacementPlan {
        PlacementPlan { files, groups: 1 }
    }

    fn executor(root: &Path, mode: PlacementMode) -> PlacementExecutor {
        PlacementExecutor::new(&OrganizerConfig::new(root, mode)).unwrap()
    }

    #[test]
    fn test_candidate_name() {
        assert_eq!(candidate_name("a_发票.pdf", Some("pdf"), 1), "a_发票.pdf");
        assert_eq!(candidate_name("a_发票.pdf", Some("pdf"), 2), "a_发票 (2).pdf");
        assert_eq!(candidate_name("a_35.50元", None, 3), "a_35.50元 (3)");
        assert_eq!(candidate_name("a_35.50元", Some("pdf"), 2), "a_35.50元 (2)");
    }

    #[test]
    fn test_new_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        executor(&root, PlacementMode::Copy);

        for label in FolderNames::default().all() {
            assert!(root.join(label).is_dir(), "missing folder {}", label);
        }

        // Second construction over an existing layout
        executor(&root, PlacementMode::Copy);
    }

    #[test]
    fn test_new_fails_when_root_is_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        fs::write(&root, b"not a dir").unwrap();

        let result = PlacementExecutor::new(&OrganizerConfig::new(&root, PlacementMode::Copy));
        assert!(matches!(result, Err(OrganizeError::OutputRoot { .. })));
    }

    #[test]
    fn test_copy_keeps_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("scan.pdf");
        fs::write(&source, b"invoice").unwrap();
        let root = temp_dir.path().join("out");

        let report = executor(&root, PlacementMode::Copy)
            .execute(&plan_of(vec![planned(&source, "x.pdf")]))
            .unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.status, PlacementStatus::Placed);
        assert_eq!(outcome.destination, root.join("打车票").join("x.pdf"));
        assert_eq!(fs::read(&outcome.destination).unwrap(), b"invoice");
        assert!(source.exists());
        assert!(!root.join("打车票").join("x.pdf.partial").exists());
        assert!(root.join(LOCK_FILE_NAME).exists());
    }

    #[test]
    fn test_move_removes_source() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("scan.pdf");
        fs::write(&source, b"invoice").unwrap();
        let root = temp_dir.path().join("out");

        let report = executor(&root, PlacementMode::Move)
            .execute(&plan_of(vec![planned(&source, "x.pdf")]))
            .unwrap();

        assert_eq!(report.outcomes[0].status, PlacementStatus::Placed);
        assert!(!source.exists());
        assert!(root.join("打车票").join("x.pdf").exists());
    }

    #[test]
    fn test_differing_content_gets_disambiguated() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Copy);
        fs::write(root.join("打车票").join("x.pdf"), b"someone else").unwrap();
        fs::write(root.join("打车票").join("x (2).pdf"), b"another one").unwrap();

        let source = temp_dir.path().join("scan.pdf");
        fs::write(&source, b"invoice").unwrap();

        let report = exec.execute(&plan_of(vec![planned(&source, "x.pdf")])).unwrap();
        let outcome = &report.outcomes[0];

        assert_eq!(outcome.status, PlacementStatus::Placed);
        assert_eq!(outcome.destination, root.join("打车票").join("x (3).pdf"));
        assert_eq!(outcome.collisions, 2);
        assert_eq!(fs::read(root.join("打车票").join("x.pdf")).unwrap(), b"someone else");
    }

    #[test]
    fn test_identical_content_is_already_present() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Move);
        fs::write(root.join("打车票").join("x.pdf"), b"invoice").unwrap();

        let source = temp_dir.path().join("scan.pdf");
        fs::write(&source, b"invoice").unwrap();

        let report = exec.execute(&plan_of(vec![planned(&source, "x.pdf")])).unwrap();

        assert_eq!(report.outcomes[0].status, PlacementStatus::AlreadyPresent);
        assert!(!source.exists(), "redundant source is removed in move mode");
        assert!(!root.join("打车票").join("x (2).pdf").exists());
    }

    #[test]
    fn test_source_already_in_place_is_kept() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Move);
        let placed = root.join("打车票").join("x.pdf");
        fs::write(&placed, b"invoice").unwrap();

        let report = exec.execute(&plan_of(vec![planned(&placed, "x.pdf")])).unwrap();

        assert_eq!(report.outcomes[0].status, PlacementStatus::AlreadyPresent);
        assert!(placed.exists());
    }

    #[test]
    fn test_missing_source_fails_without_stopping_batch() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let source = temp_dir.path().join("scan.pdf");
        fs::write(&source, b"invoice").unwrap();

        let report = executor(&root, PlacementMode::Copy)
            .execute(&plan_of(vec![
                planned(&temp_dir.path().join("gone.pdf"), "gone.pdf"),
                planned(&source, "x.pdf"),
            ]))
            .unwrap();

        assert!(report.outcomes[0].status.is_failed());
        assert_eq!(report.outcomes[1].status, PlacementStatus::Placed);
        assert_eq!(report.summary().failures.len(), 1);
    }

    #[test]
    fn test_missing_source_is_not_hidden_by_same_named_sibling() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let source = temp_dir.path().join("a.pdf");
        fs::write(&source, b"lunch").unwrap();
        let missing = temp_dir.path().join("typo_does_not_exist.pdf");

        let report = executor(&root, PlacementMode::Move)
            .execute(&plan_of(vec![planned(&source, "x.pdf"), planned(&missing, "x.pdf")]))
            .unwrap();

        assert_eq!(report.outcomes[0].status, PlacementStatus::Placed);
        assert!(report.outcomes[1].status.is_failed());

        let summary = report.summary();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.failures[0].source, missing);
    }

    #[test]
    fn test_move_rerun_finds_disambiguated_results() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Move);
        let first = temp_dir.path().join("a.pdf");
        let second = temp_dir.path().join("b.pdf");
        fs::write(&first, b"lunch").unwrap();
        fs::write(&second, b"dinner").unwrap();
        let plan = plan_of(vec![planned(&first, "x.pdf"), planned(&second, "x.pdf")]);

        let report = exec.execute(&plan).unwrap();
        assert_eq!(report.outcomes[1].destination, root.join("打车票").join("x (2).pdf"));

        let rerun = exec.execute(&plan).unwrap();
        assert_eq!(rerun.outcomes[0].status, PlacementStatus::AlreadyPresent);
        assert_eq!(rerun.outcomes[0].destination, root.join("打车票").join("x.pdf"));
        assert_eq!(rerun.outcomes[1].status, PlacementStatus::AlreadyPresent);
        assert_eq!(rerun.outcomes[1].destination, root.join("打车票").join("x (2).pdf"));
    }

    #[test]
    fn test_exhausted_names_fail_and_batch_continues() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Copy).with_max_disambiguator(3);
        let folder = root.join("打车票");
        for (n, name) in ["x.pdf", "x (2).pdf", "x (3).pdf"].iter().enumerate() {
            fs::write(folder.join(name), format!("occupant {}", n)).unwrap();
        }

        let crowded = temp_dir.path().join("crowded.pdf");
        let other = temp_dir.path().join("other.pdf");
        fs::write(&crowded, b"invoice").unwrap();
        fs::write(&other, b"another invoice").unwrap();

        let report = exec
            .execute(&plan_of(vec![planned(&crowded, "x.pdf"), planned(&other, "y.pdf")]))
            .unwrap();

        match &report.outcomes[0].status {
            PlacementStatus::Failed { reason } => assert!(reason.contains("after 3 attempts"), "{}", reason),
            status => panic!("expected failure, got {:?}", status),
        }
        assert!(!folder.join("x (4).pdf").exists());
        assert_eq!(report.outcomes[1].status, PlacementStatus::Placed);
        assert!(crowded.exists());
    }

    #[test]
    fn test_missing_source_after_move_is_already_present() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("out");
        let exec = executor(&root, PlacementMode::Move);
        fs::write(root.join("打车票").join("x.pdf"), b"invoice").unwrap();

        let report = exec
            .execute(&plan_of(vec![planned(&temp_dir.path().join("scan.pdf"), "x.pdf")]))
            .unwrap();

        assert_eq!(report.outcomes[0].status, PlacementStatus::AlreadyPresent);
    }
}
