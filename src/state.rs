use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SettleError};

/// On-disk record of which purchases have already been matched. Read at
/// process start, appended during matching, pruned and written once at
/// process end. Single writer per run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchState {
    #[serde(default)]
    entries: BTreeMap<String, StateEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    pub txn_id: String,
    pub matched_at: DateTime<Utc>,
}

impl MatchState {
    /// Load state from `path`. A missing file is an empty state; a file
    /// that exists but does not parse is an error, since the state is what
    /// keeps reruns from re-annotating the whole ledger.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SettleError::State(format!("{} is not valid state: {e}", path.display())))
    }

    pub fn contains(&self, purchase_id: &str) -> bool {
        self.entries.contains_key(purchase_id)
    }

    pub fn insert(&mut self, purchase_id: &str, txn_id: &str, matched_at: DateTime<Utc>) {
        self.entries.insert(
            purchase_id.to_string(),
            StateEntry {
                txn_id: txn_id.to_string(),
                matched_at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn oldest(&self) -> Option<DateTime<Utc>> {
        self.entries.values().map(|e| e.matched_at).min()
    }

    /// Drop entries matched more than `retention_days` before `now`.
    pub fn prune(&mut self, now: DateTime<Utc>, retention_days: i64) -> usize {
        let cutoff = now - Duration::days(retention_days);
        let before = self.entries.len();
        self.entries.retain(|_, e| e.matched_at >= cutoff);
        before - self.entries.len()
    }

    /// Prune, then write the state as pretty JSON. Runs once per batch.
    pub fn save(&mut self, path: &Path, now: DateTime<Utc>, retention_days: i64) -> Result<usize> {
        let pruned = self.prune(now, retention_days);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, format!("{json}\n"))?;
        Ok(pruned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let state = MatchState::load(&dir.path().join("nope.json")).unwrap();
        assert!(state.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(MatchState::load(&path).is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = MatchState::default();
        state.insert("order-1", "txn-a", at(2025, 1, 10));
        state.save(&path, at(2025, 1, 11), 90).unwrap();

        let loaded = MatchState::load(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("order-1"));
        assert!(!loaded.contains("order-2"));
    }

    #[test]
    fn test_insert_same_id_keeps_one_entry() {
        let mut state = MatchState::default();
        state.insert("order-1", "txn-a", at(2025, 1, 10));
        state.insert("order-1", "txn-b", at(2025, 1, 11));
        assert_eq!(state.len(), 1);
    }

    #[test]
    fn test_prune_drops_entries_past_retention() {
        let mut state = MatchState::default();
        state.insert("old", "txn-a", at(2024, 10, 1));
        state.insert("fresh", "txn-b", at(2025, 1, 1));
        let pruned = state.prune(at(2025, 1, 10), 90);
        assert_eq!(pruned, 1);
        assert!(!state.contains("old"));
        assert!(state.contains("fresh"));
    }

    #[test]
    fn test_save_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let mut state = MatchState::default();
        state.insert("ancient", "txn-a", at(2024, 1, 1));
        state.insert("recent", "txn-b", at(2025, 1, 5));
        let pruned = state.save(&path, at(2025, 1, 10), 90).unwrap();
        assert_eq!(pruned, 1);

        let loaded = MatchState::load(&path).unwrap();
        assert!(!loaded.contains("ancient"));
        assert!(loaded.contains("recent"));
    }

    #[test]
    fn test_entry_exactly_at_cutoff_survives() {
        let mut state = MatchState::default();
        state.insert("edge", "txn-a", at(2024, 10, 12));
        // 90 days before 2025-01-10 12:00 is 2024-10-12 12:00
        let pruned = state.prune(at(2025, 1, 10), 90);
        assert_eq!(pruned, 0);
        assert!(state.contains("edge"));
    }

    #[test]
    fn test_oldest() {
        let mut state = MatchState::default();
        assert!(state.oldest().is_none());
        state.insert("a", "t1", at(2025, 1, 5));
        state.insert("b", "t2", at(2025, 1, 2));
        assert_eq!(state.oldest(), Some(at(2025, 1, 2)));
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep").join("state.json");
        let mut state = MatchState::default();
        state.insert("order-1", "txn-a", at(2025, 1, 10));
        state.save(&path, at(2025, 1, 10), 90).unwrap();
        assert!(path.exists());
    }
}
