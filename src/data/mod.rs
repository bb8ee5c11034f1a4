// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between files on disk and tensors on a device.
//
//   corpus.json / *.npy / refs.json
//       │
//       ▼
//   loader        → reads and validates every input file
//       │
//       ▼
//   VideoFeatures → per-video visual and tag feature tables
//       │
//       ▼
//   EpochPlanner  → shuffled index chunks, one epoch at a time
//       │
//       ▼
//   batcher       → padded captions + mask + gathered features
//       │
//       ▼
//   model (Layer 5)
//       │
//       ▼
//   decode        → EOS truncation, token → word
//
// Reference: Burn Book §4 (Datasets and Dataloaders)
//            Rust Book §13 (Iterators and Closures)

/// Reads the corpus bundle, feature arrays and references
pub mod loader;

/// Per-video visual and tag feature tables
pub mod features;

/// Reference captions grouped by phase
pub mod references;

/// Pads caption sets into masked, time-major batches
pub mod batcher;

/// Per-epoch shuffling and chunking
pub mod epoch;

/// Turning decoded token rows into captions
pub mod decode;
