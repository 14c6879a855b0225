/// Data layer: the batch-log parsing and normalization pipeline.
///
/// Architecture:
/// ```text
///  .csv / .xlsx exports
///        │
///        ▼
///   ┌───────────┐   ┌─────────┐
///   │  extract   │   │  label   │  raw bytes → series, filename → label
///   └───────────┘   └─────────┘
///        │               │
///        ▼               ▼
///   ┌──────────────────────┐
///   │     registry          │  canonical label → Batch
///   └──────────────────────┘
///        │
///        ▼
///   ┌───────────┐        ┌──────────┐
///   │   align    │        │  ledger   │  selected batches → (x, y) arrays,
///   └───────────┘        └──────────┘  label → quality/status row
/// ```
///
/// `cache` memoizes the two blocking operations: parsing (forever, keyed
/// by content hash) and ledger fetch (time-to-live).

pub mod align;
pub mod cache;
pub mod extract;
pub mod label;
pub mod ledger;
pub mod model;
pub mod registry;
