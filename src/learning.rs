use crate::errors::LearningLoadError;
use crate::position::{Color, Position};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const MAX_BONUS: i32 = 100;
const EXPORT_VERSION: u32 = 1;

/// Win/loss/draw tally for one (position, move) pair. Field names are kept
/// short because the store file holds one of these per move ever played.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Counters {
    pub w: u32,
    pub l: u32,
    pub d: u32,
}

impl Counters {
    fn games(&self) -> u32 {
        self.w + self.l + self.d
    }

    fn winrate(&self) -> f64 {
        let games = self.games();
        if games == 0 {
            return 0.5;
        }
        (self.w as f64 + 0.5 * self.d as f64) / games as f64
    }

    fn bonus(&self) -> i32 {
        if self.games() == 0 {
            return 0;
        }
        let raw = ((self.winrate() - 0.5) * 200.0) as i32;
        raw.clamp(-MAX_BONUS, MAX_BONUS)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameOutcome {
    WhiteWin,
    BlackWin,
    Draw,
}

struct Inner {
    records: HashMap<String, Counters>,
    // Moves chosen this game, graded once the result is known.
    pending: Vec<(String, Color)>,
}

/// Persistent move-outcome statistics. Records are keyed
/// `"<position>|<uci move>"` where the position part is the FEN with the
/// move counters stripped. Writes go through a temp file and an atomic
/// rename so a crash never leaves a half-written store behind.
pub struct LearningStore {
    inner: Mutex<Inner>,
    path: Option<PathBuf>,
}

impl LearningStore {
    /// In-memory store, nothing persisted.
    pub fn new() -> Self {
        LearningStore {
            inner: Mutex::new(Inner {
                records: HashMap::new(),
                pending: Vec::new(),
            }),
            path: None,
        }
    }

    /// Opens a store file, tolerating absence and corruption: a missing
    /// file starts empty, an unreadable one is logged and discarded so a
    /// bad store never takes the engine down.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let records = match Self::read_records(&path) {
            Ok(records) => records,
            Err(LearningLoadError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                HashMap::new()
            }
            Err(err) => {
                log::warn!("discarding learning store {}: {err}", path.display());
                HashMap::new()
            }
        };

        LearningStore {
            inner: Mutex::new(Inner {
                records,
                pending: Vec::new(),
            }),
            path: Some(path),
        }
    }

    /// Strict variant of `open` for callers that want the error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LearningLoadError> {
        let path = path.as_ref().to_path_buf();
        let records = Self::read_records(&path)?;
        Ok(LearningStore {
            inner: Mutex::new(Inner {
                records,
                pending: Vec::new(),
            }),
            path: Some(path),
        })
    }

    fn read_records(path: &Path) -> Result<HashMap<String, Counters>, LearningLoadError> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Remembers that `mv` was chosen in `pos`; graded at `finalize_game`.
    pub fn record_choice(&self, pos: &Position, mv_uci: &str) {
        let key = format!("{}|{}", pos.learning_key(), mv_uci);
        self.inner.lock().pending.push((key, pos.side_to_move));
    }

    /// Grades every pending choice against the game result and persists.
    /// A choice counts as a win when the side that made it won the game.
    pub fn finalize_game(&self, outcome: GameOutcome) -> std::io::Result<()> {
        {
            let mut inner = self.inner.lock();
            let pending = std::mem::take(&mut inner.pending);
            for (key, mover) in pending {
                let counters = inner.records.entry(key).or_default();
                match outcome {
                    GameOutcome::Draw => counters.d += 1,
                    GameOutcome::WhiteWin if mover == Color::White => counters.w += 1,
                    GameOutcome::BlackWin if mover == Color::Black => counters.w += 1,
                    _ => counters.l += 1,
                }
            }
        }
        self.persist()
    }

    /// Move-ordering bias in centipawn-scale points, clamped to ±100.
    /// Unknown pairs score zero.
    pub fn ordering_bonus(&self, pos: &Position, mv_uci: &str) -> i32 {
        let key = format!("{}|{}", pos.learning_key(), mv_uci);
        self.inner
            .lock()
            .records
            .get(&key)
            .map(|c| c.bonus())
            .unwrap_or(0)
    }

    /// Folds another store file into this one, summing counters.
    pub fn merge<P: AsRef<Path>>(&self, path: P) -> Result<(), LearningLoadError> {
        let incoming = Self::read_records(path.as_ref())?;
        {
            let mut inner = self.inner.lock();
            for (key, counters) in incoming {
                let entry = inner.records.entry(key).or_default();
                entry.w += counters.w;
                entry.l += counters.l;
                entry.d += counters.d;
            }
        }
        self.persist().map_err(LearningLoadError::Io)
    }

    /// Drops all statistics and pending choices.
    pub fn reset(&self) -> std::io::Result<()> {
        {
            let mut inner = self.inner.lock();
            inner.records.clear();
            inner.pending.clear();
        }
        self.persist()
    }

    pub fn entry_count(&self) -> usize {
        self.inner.lock().records.len()
    }

    fn persist(&self) -> std::io::Result<()> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(()),
        };
        let json = {
            let inner = self.inner.lock();
            serde_json::to_string(&inner.records)?
        };

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, path)
    }

    /// Writes a human-readable report: per-entry derived statistics under a
    /// small metadata header.
    pub fn export_readable<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let inner = self.inner.lock();

        let mut positions = HashSet::new();
        let mut entries = serde_json::Map::new();
        for (key, counters) in &inner.records {
            if let Some((pos_part, _)) = key.rsplit_once('|') {
                positions.insert(pos_part.to_string());
            }
            entries.insert(
                key.clone(),
                serde_json::json!({
                    "wins": counters.w,
                    "losses": counters.l,
                    "draws": counters.d,
                    "games": counters.games(),
                    "winrate": counters.winrate(),
                    "ordering_bonus": counters.bonus(),
                }),
            );
        }

        let updated = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let report = serde_json::json!({
            "meta": {
                "version": EXPORT_VERSION,
                "updated": updated,
                "total_positions": positions.len(),
                "total_entries": inner.records.len(),
            },
            "entries": serde_json::Value::Object(entries),
        });

        fs::write(path, serde_json::to_string_pretty(&report)?)
    }
}

impl Default for LearningStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bonus_follows_winrate() {
        let store = LearningStore::new();
        let pos = Position::default();

        assert_eq!(store.ordering_bonus(&pos, "e2e4"), 0);

        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::WhiteWin).unwrap();
        assert_eq!(store.ordering_bonus(&pos, "e2e4"), 100);

        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::BlackWin).unwrap();
        assert_eq!(store.ordering_bonus(&pos, "e2e4"), 0);
    }

    #[test]
    fn test_black_choice_graded_from_black_side() {
        let store = LearningStore::new();
        let mut pos = Position::default();
        pos.make_move_uci("e2e4").unwrap();

        store.record_choice(&pos, "c7c5");
        store.finalize_game(GameOutcome::WhiteWin).unwrap();
        assert_eq!(store.ordering_bonus(&pos, "c7c5"), -100);
    }

    #[test]
    fn test_draws_pull_toward_even() {
        let store = LearningStore::new();
        let pos = Position::default();
        for _ in 0..3 {
            store.record_choice(&pos, "d2d4");
            store.finalize_game(GameOutcome::Draw).unwrap();
        }
        assert_eq!(store.ordering_bonus(&pos, "d2d4"), 0);
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learn.json");

        let store = LearningStore::open(&path);
        let pos = Position::default();
        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::WhiteWin).unwrap();
        drop(store);

        let reopened = LearningStore::load(&path).unwrap();
        assert_eq!(reopened.ordering_bonus(&pos, "e2e4"), 100);
        assert_eq!(reopened.entry_count(), 1);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("learn.json");
        fs::write(&path, "not json at all").unwrap();

        let store = LearningStore::open(&path);
        assert_eq!(store.entry_count(), 0);
        assert!(LearningStore::load(&path).is_err());
    }

    #[test]
    fn test_merge_sums_counters() {
        let dir = tempfile::tempdir().unwrap();
        let other_path = dir.path().join("other.json");

        let pos = Position::default();
        let other = LearningStore::open(&other_path);
        other.record_choice(&pos, "e2e4");
        other.finalize_game(GameOutcome::WhiteWin).unwrap();
        drop(other);

        let store = LearningStore::new();
        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::BlackWin).unwrap();

        store.merge(&other_path).unwrap();
        // One win plus one loss evens out.
        assert_eq!(store.ordering_bonus(&pos, "e2e4"), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let store = LearningStore::new();
        let pos = Position::default();
        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::WhiteWin).unwrap();
        store.reset().unwrap();
        assert_eq!(store.entry_count(), 0);
        assert_eq!(store.ordering_bonus(&pos, "e2e4"), 0);
    }

    #[test]
    fn test_export_readable_report() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.json");

        let store = LearningStore::new();
        let pos = Position::default();
        store.record_choice(&pos, "e2e4");
        store.finalize_game(GameOutcome::WhiteWin).unwrap();
        store.export_readable(&out).unwrap();

        let report: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(report["meta"]["total_entries"], 1);
        assert_eq!(report["meta"]["total_positions"], 1);
        let key = format!("{}|e2e4", pos.learning_key());
        assert_eq!(report["entries"][&key]["wins"], 1);
        assert_eq!(report["entries"][&key]["ordering_bonus"], 100);
    }
}
