use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

use crate::color::BatchColors;
use crate::config::AppConfig;
use crate::data::align::TimeAxisMode;
use crate::data::cache::{Cache, Freshness};
use crate::data::extract::Extraction;
use crate::data::ledger::{
    match_ledger, FileLedgerSource, Ledger, LedgerRow, LedgerSource,
};
use crate::data::model::{Batch, RawExport};
use crate::data::registry::{BatchRegistry, CollisionPolicy};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// All extracted batches for this session.
    pub registry: BatchRegistry,

    /// Labels of batches currently checked for comparison.
    pub selected: BTreeSet<String>,

    /// Relative (hours since batch start) vs. absolute time axis.
    pub relative_time: bool,

    /// Whether the pressure plot is shown below the temperature plot.
    pub show_pressure: bool,

    pub collision_policy: CollisionPolicy,

    /// Stable colour per loaded batch.
    pub colors: BatchColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Per-file skip warnings from the last ingest.
    pub warnings: Vec<String>,

    parse_cache: Cache<u64, Extraction>,
    ledger: Option<LedgerHandle>,
}

struct LedgerHandle {
    source: FileLedgerSource,
    cache: Cache<String, Ledger>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            registry: BatchRegistry::default(),
            selected: BTreeSet::new(),
            relative_time: true,
            show_pressure: true,
            collision_policy: CollisionPolicy::LastWriteWins,
            colors: BatchColors::default(),
            status_message: None,
            warnings: Vec::new(),
            parse_cache: Cache::new(Freshness::KeepForever),
            ledger: None,
        }
    }

    pub fn time_axis_mode(&self) -> TimeAxisMode {
        if self.relative_time {
            TimeAxisMode::Relative
        } else {
            TimeAxisMode::Absolute
        }
    }

    // ---- Batch uploads -----------------------------------------------------

    /// Read the picked files and run them through the ingest pipeline.
    /// Unreadable files become warnings; the rest still load.
    pub fn load_paths(&mut self, paths: Vec<PathBuf>) {
        let mut exports = Vec::with_capacity(paths.len());
        self.warnings.clear();

        for path in paths {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            match std::fs::read(&path) {
                Ok(bytes) => exports.push(RawExport::new(filename, bytes)),
                Err(e) => {
                    warn!("could not read '{}': {e}", path.display());
                    self.warnings.push(format!("Skipped '{filename}': {e}"));
                }
            }
        }

        let report = self.registry.ingest_all(
            exports,
            &self.config.channels,
            self.collision_policy,
            &mut self.parse_cache,
        );
        self.warnings.extend(report.warnings);

        // Drop selections whose batch disappeared (e.g. after Clear).
        self.selected
            .retain(|label| self.registry.get(label).is_some());
        self.colors = BatchColors::new(self.registry.labels());

        self.status_message = if self.registry.is_empty() {
            Some("No files could be processed.".to_string())
        } else {
            None
        };
    }

    pub fn toggle_batch(&mut self, label: &str) {
        if !self.selected.remove(label) {
            self.selected.insert(label.to_string());
        }
    }

    pub fn selected_batches(&self) -> Vec<&Batch> {
        self.registry
            .iter()
            .filter(|b| self.selected.contains(&b.label))
            .collect()
    }

    pub fn clear_batches(&mut self) {
        self.registry.clear();
        self.selected.clear();
        self.colors = BatchColors::default();
        self.warnings.clear();
        self.status_message = None;
    }

    // ---- Ledger ------------------------------------------------------------

    /// Point the ledger at a local file; the snapshot refreshes on a TTL.
    pub fn set_ledger_path(&mut self, path: PathBuf) {
        let ttl = Duration::from_secs(self.config.ledger_ttl_secs);
        self.ledger = Some(LedgerHandle {
            source: FileLedgerSource::new(path),
            cache: Cache::new(Freshness::Ttl(ttl)),
        });
    }

    pub fn ledger_configured(&self) -> bool {
        self.ledger.is_some()
    }

    pub fn ledger_name(&self) -> Option<String> {
        self.ledger.as_ref().map(|h| {
            h.source
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| h.source.identity())
        })
    }

    /// Current ledger snapshot, re-fetched only after the TTL elapses.
    /// Fetch failures degrade to `None`; charts render regardless.
    pub fn ledger_snapshot(&mut self) -> Option<Ledger> {
        let handle = self.ledger.as_mut()?;
        let key = handle.source.identity();
        match handle
            .cache
            .get_or_try_insert_with(key, || handle.source.fetch())
        {
            Ok(ledger) => Some(ledger),
            Err(e) => {
                warn!("ledger fetch failed: {e:#}");
                self.status_message = Some(format!("Ledger unavailable: {e:#}"));
                self.ledger = None;
                None
            }
        }
    }

    pub fn ledger_match<'a>(&self, label: &str, ledger: &'a Ledger) -> Option<&'a LedgerRow> {
        match_ledger(label, ledger, &self.config.matcher)
    }
}
