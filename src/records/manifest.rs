//! Loading a batch of records from the extractor's JSON output.

use super::record::Record;
use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<Record>),
    Wrapped { records: Vec<Record> },
}

impl Manifest {
    fn into_records(self) -> Vec<Record> {
        match self {
            Manifest::List(records) | Manifest::Wrapped { records } => records,
        }
    }
}

/// Load records from a JSON manifest.
///
/// Accepts either a bare array or `{ "records": [...] }`. Relative
/// `source_path` values are resolved against the manifest's directory.
pub fn load_manifest(path: &Path) -> Result<Vec<Record>> {
    let file = File::open(path)?;
    let manifest: Manifest = serde_json::from_reader(BufReader::new(file))?;
    let mut records = manifest.into_records();

    if let Some(base) = path.parent() {
        for record in &mut records {
            if record.source_path.is_relative() && !record.source_path.as_os_str().is_empty() {
                record.source_path = base.join(&record.source_path);
            }
        }
    }

    tracing::info!(
        manifest = %path.display(),
        records = records.len(),
        "Loaded record manifest"
    );

    Ok(records)
}
