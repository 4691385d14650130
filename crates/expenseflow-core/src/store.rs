//! Snapshot store for records and analyses
//!
//! The pipeline hands finished, immutable values to a [`SnapshotStore`]
//! after a run. Store failures are logged by the caller and never fail the
//! run. [`JsonFileStore`] keeps everything as pretty JSON under a data dir:
//!
//! ```text
//! <data_dir>/
//!   expenses.json                  all records, appended per run
//!   analyses/analysis_<id>.json    one file per analysis
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{AnalysisResult, ExpenseRecord};

const EXPENSES_FILE: &str = "expenses.json";
const ANALYSES_DIR: &str = "analyses";

/// Destination for pipeline snapshots
pub trait SnapshotStore: Send + Sync {
    /// Store name for logging
    fn name(&self) -> &str;

    /// Append records from one run
    fn save_records(&self, records: &[ExpenseRecord]) -> Result<()>;

    fn save_analysis(&self, analysis: &AnalysisResult) -> Result<()>;
}

/// JSON files under a data directory
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    /// Open a store, creating the directory layout if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let analyses = root.join(ANALYSES_DIR);
        if !analyses.exists() {
            fs::create_dir_all(&analyses).map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create data directory {}: {}", root.display(), e),
                ))
            })?;
            info!("Created data directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn analysis_path(&self, id: Uuid) -> PathBuf {
        self.root
            .join(ANALYSES_DIR)
            .join(format!("analysis_{}.json", id))
    }

    /// All stored records, oldest first
    pub fn load_records(&self) -> Result<Vec<ExpenseRecord>> {
        let path = self.root.join(EXPENSES_FILE);
        if !path.exists() {
            return Ok(Vec::new());
        }
        read_json(&path)
    }

    pub fn load_analysis(&self, id: Uuid) -> Result<AnalysisResult> {
        let path = self.analysis_path(id);
        if !path.exists() {
            return Err(Error::NotFound(format!("analysis {}", id)));
        }
        read_json(&path)
    }

    /// Stored analyses, newest first. Unreadable files are skipped.
    pub fn list_analyses(&self) -> Result<Vec<AnalysisResult>> {
        let mut analyses = Vec::new();

        for entry in fs::read_dir(self.root.join(ANALYSES_DIR))? {
            let path = entry?.path();
            let is_snapshot = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("analysis_") && n.ends_with(".json"));
            if !is_snapshot {
                continue;
            }

            match read_json::<AnalysisResult>(&path) {
                Ok(analysis) => analyses.push(analysis),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable analysis"),
            }
        }

        analyses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(analyses)
    }

    pub fn delete_analysis(&self, id: Uuid) -> Result<()> {
        let path = self.analysis_path(id);
        if !path.exists() {
            return Err(Error::NotFound(format!("analysis {}", id)));
        }
        fs::remove_file(&path)?;
        info!(analysis_id = %id, "Deleted analysis");
        Ok(())
    }
}

impl SnapshotStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    fn save_records(&self, records: &[ExpenseRecord]) -> Result<()> {
        let mut all = self.load_records()?;
        all.extend_from_slice(records);
        write_json_atomic(&self.root.join(EXPENSES_FILE), &all)?;
        debug!(added = records.len(), total = all.len(), "Saved records");
        Ok(())
    }

    fn save_analysis(&self, analysis: &AnalysisResult) -> Result<()> {
        let path = self.analysis_path(analysis.id);
        write_json_atomic(&path, analysis)?;
        debug!(analysis_id = %analysis.id, path = %path.display(), "Saved analysis");
        Ok(())
    }
}

/// Default data directory (~/.local/share/expenseflow/data)
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("expenseflow").join("data"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| {
        Error::InvalidData(format!("Corrupt snapshot {}: {}", path.display(), e))
    })
}

/// Write to a temp file in the same directory, then rename over the target
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::InvalidData(format!("No parent directory for {}", path.display())))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::{BudgetStatus, ExpenseCategory, ExtractionSource};

    fn analysis(total: f64, age_minutes: i64) -> AnalysisResult {
        let mut breakdown = BTreeMap::new();
        breakdown.insert(ExpenseCategory::Food, total);
        AnalysisResult {
            id: Uuid::new_v4(),
            total,
            daily_rate: total,
            monthly_projection: total * 30.0,
            days_analyzed: 1,
            income: None,
            category_breakdown: breakdown,
            budget_status: BudgetStatus::Unknown,
            usage_percentage: None,
            remaining_budget: None,
            trends: vec![],
            created_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn test_records_are_appended() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        assert!(store.load_records().unwrap().is_empty());

        let first = ExpenseRecord::new(
            "kahve 50 TL",
            "kahve",
            50.0,
            ExpenseCategory::Food,
            ExtractionSource::Pattern,
        );
        let second = ExpenseRecord::new(
            "taksi 120 TL",
            "taksi",
            120.0,
            ExpenseCategory::Transport,
            ExtractionSource::Pattern,
        );
        store.save_records(std::slice::from_ref(&first)).unwrap();
        store.save_records(std::slice::from_ref(&second)).unwrap();

        let loaded = store.load_records().unwrap();
        assert_eq!(loaded, vec![first, second]);
    }

    #[test]
    fn test_analysis_roundtrip_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let saved = analysis(350.0, 0);

        store.save_analysis(&saved).unwrap();
        assert!(dir
            .path()
            .join("analyses")
            .join(format!("analysis_{}.json", saved.id))
            .exists());
        assert_eq!(store.load_analysis(saved.id).unwrap(), saved);

        store.delete_analysis(saved.id).unwrap();
        assert!(matches!(store.load_analysis(saved.id), Err(Error::NotFound(_))));
        assert!(matches!(store.delete_analysis(saved.id), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_newest_first_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path()).unwrap();
        let old = analysis(1.0, 60);
        let new = analysis(2.0, 1);
        store.save_analysis(&old).unwrap();
        store.save_analysis(&new).unwrap();
        fs::write(dir.path().join("analyses").join("analysis_bad.json"), "{").unwrap();
        fs::write(dir.path().join("analyses").join("notes.txt"), "x").unwrap();

        let listed = store.list_analyses().unwrap();
        let ids: Vec<_> = listed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![new.id, old.id]);
    }
}
