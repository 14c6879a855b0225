use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use log::{info, warn};

use super::cache::Cache;
use super::extract::{extract, Extraction};
use super::label::canonicalize_label;
use super::model::{Batch, ChannelConfig, RawExport};

// ---------------------------------------------------------------------------
// Batch registry – canonical label → Batch
// ---------------------------------------------------------------------------

/// What to do when two files canonicalize to the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later file replaces the earlier one. Matches the behavior of
    /// re-uploading a corrected export under the same batch name.
    LastWriteWins,
    /// The first file is kept and the duplicate is reported as a warning.
    RejectDuplicate,
}

/// Outcome of one ingest pass. Warnings are per-file skips; they never
/// invalidate batches that were already registered.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub registered: usize,
    pub warnings: Vec<String>,
}

/// In-memory store of all extracted batches for one session. Owns every
/// `Batch`; consumers read series but never mutate them in place.
#[derive(Debug, Default)]
pub struct BatchRegistry {
    batches: BTreeMap<String, Batch>,
}

impl BatchRegistry {
    /// Run extraction + label canonicalization over a set of uploads.
    ///
    /// One bad file warns and is skipped; the loop always continues.
    /// Extractions are memoized in `parse_cache`, keyed by content hash,
    /// so re-uploading identical bytes never re-parses.
    pub fn ingest_all(
        &mut self,
        exports: Vec<RawExport>,
        config: &ChannelConfig,
        policy: CollisionPolicy,
        parse_cache: &mut Cache<u64, Extraction>,
    ) -> IngestReport {
        let mut report = IngestReport::default();

        for raw in exports {
            let key = content_key(&raw);
            let extraction =
                match parse_cache.get_or_try_insert_with(key, || extract(&raw, config)) {
                    Ok(ex) => ex,
                    Err(e) => {
                        warn!("skipping '{}': {e}", raw.filename);
                        report
                            .warnings
                            .push(format!("Skipped '{}': {e}", raw.filename));
                        continue;
                    }
                };

            let label = canonicalize_label(&raw.filename);
            if self.batches.contains_key(&label) {
                match policy {
                    CollisionPolicy::LastWriteWins => {
                        info!("'{}' replaces earlier data for batch '{label}'", raw.filename);
                    }
                    CollisionPolicy::RejectDuplicate => {
                        report.warnings.push(format!(
                            "Ignored '{}': batch '{label}' already loaded",
                            raw.filename
                        ));
                        continue;
                    }
                }
            }

            self.batches.insert(
                label.clone(),
                Batch {
                    label,
                    temperature: extraction.temperature,
                    pressure: extraction.pressure,
                    source_filename: raw.filename,
                },
            );
            report.registered += 1;
        }
        report
    }

    pub fn get(&self, label: &str) -> Option<&Batch> {
        self.batches.get(label)
    }

    /// Batches in label order.
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.batches.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }
}

/// Cache key: the uploaded bytes plus the extension that selects the
/// parser. Uploaded content is immutable, so this never expires.
fn content_key(raw: &RawExport) -> u64 {
    let mut hasher = DefaultHasher::new();
    raw.filename
        .rsplit('.')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase()
        .hash(&mut hasher);
    raw.bytes.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::cache::Freshness;

    fn csv_export(filename: &str, temp_value: f64) -> RawExport {
        let text = format!(
            "VarName;TimeString;VarValue\nT1.Output_registro;01/03/2025 10:00:00;{temp_value}\n"
        );
        RawExport::new(filename, text.into_bytes())
    }

    fn fresh_cache() -> Cache<u64, Extraction> {
        Cache::new(Freshness::KeepForever)
    }

    #[test]
    fn label_collision_keeps_the_later_file_by_default() {
        let mut registry = BatchRegistry::default();
        let report = registry.ingest_all(
            vec![
                csv_export("BA-03-25.csv", 20.0),
                csv_export("Copia de BA-03-25_R2.csv", 21.0),
            ],
            &ChannelConfig::default(),
            CollisionPolicy::LastWriteWins,
            &mut fresh_cache(),
        );
        assert_eq!(report.registered, 2);
        assert_eq!(registry.len(), 1);
        let batch = registry.get("BA-03-25").unwrap();
        assert_eq!(batch.temperature[0].value, 21.0);
    }

    #[test]
    fn reject_duplicate_policy_keeps_the_first_file() {
        let mut registry = BatchRegistry::default();
        let report = registry.ingest_all(
            vec![
                csv_export("BA-03-25.csv", 20.0),
                csv_export("BA-03-25_R2.csv", 21.0),
            ],
            &ChannelConfig::default(),
            CollisionPolicy::RejectDuplicate,
            &mut fresh_cache(),
        );
        assert_eq!(report.registered, 1);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(registry.get("BA-03-25").unwrap().temperature[0].value, 20.0);
    }

    #[test]
    fn one_bad_file_does_not_block_the_rest() {
        let mut registry = BatchRegistry::default();
        let report = registry.ingest_all(
            vec![
                csv_export("BA-01-25.csv", 20.0),
                RawExport::new("broken.csv", b"NotVarName;x\n1;2\n".to_vec()),
                csv_export("BA-02-25.csv", 22.0),
            ],
            &ChannelConfig::default(),
            CollisionPolicy::LastWriteWins,
            &mut fresh_cache(),
        );
        assert_eq!(report.registered, 2);
        assert_eq!(report.warnings.len(), 1);
        assert!(registry.get("BA-01-25").is_some());
        assert!(registry.get("BA-02-25").is_some());
    }

    #[test]
    fn labels_are_canonicalized_on_ingest() {
        let mut registry = BatchRegistry::default();
        registry.ingest_all(
            vec![csv_export("Copia de GPF-12-26_R3.csv", 19.5)],
            &ChannelConfig::default(),
            CollisionPolicy::LastWriteWins,
            &mut fresh_cache(),
        );
        let batch = registry.get("GPF-12-26").unwrap();
        assert_eq!(batch.source_filename, "Copia de GPF-12-26_R3.csv");
    }
}
