// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns that touch the outside world:
//
//   checkpoint.rs      — Saving and loading model weights with
//                        a full-precision Burn recorder, plus a JSON
//                        sidecar per checkpoint so the model can
//                        be rebuilt for `test --checkpoint`.
//
//   metrics.rs         — Per-epoch CSV of loss, schedule values
//                        and validation scores.
//
//   scorer_process.rs  — Runs the external caption-metric toolkit
//                        (BLEU / METEOR / ROUGE-L / CIDEr) as a
//                        child process speaking JSON.
//
//   caption_log.rs     — `<run>_output.log`, one decoded caption
//                        per line.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Training metrics CSV logger
pub mod metrics;

/// External caption-metric process bridge
pub mod scorer_process;

/// Decoded caption output file
pub mod caption_log;
