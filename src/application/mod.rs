// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// a specific goal (training, or scoring a saved checkpoint).
//
// Rules for this layer:
//   - No ML math or model code here
//   - No clap types here (that's Layer 1)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Read-only inputs shared by training and evaluation
pub mod context;

// The training workflow
pub mod train_use_case;

// The test-only workflow
pub mod test_use_case;
