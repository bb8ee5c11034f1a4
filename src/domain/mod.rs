// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure Rust structs, functions and traits describing the
// captioning problem.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O or process spawning
//   - Only plain Rust structs, enums, functions and traits
//
// Everything the training loop decides (sampling probability,
// learning rate, whether to save a checkpoint) is computed here
// as a pure function, so it is testable without a GPU.
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Captions, vocabulary, phases
pub mod corpus;

// Scheduled sampling and learning-rate decay
pub mod schedule;

// Weighted metric blend and strict-improvement tracking
pub mod checkpoint_policy;

// Merging scorer outputs
pub mod scoring;

// Core abstractions (traits) that other layers implement
pub mod traits;
