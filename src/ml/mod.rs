// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Every Burn tensor operation of the project lives here. The
// data layer hands over plain Vec<f32>/Vec<u32> buffers and
// converts them to tensors at the last moment.
//
//   model.rs     — tag-modulated (factored) LSTM decoder
//                  • word embeddings initialised from the corpus
//                  • video feature conditions the first state
//                  • semantic tags scale every input/recurrent
//                    projection through a factor layer
//                  • scheduled sampling while training
//
//   trainer.rs   — the epoch loop: shuffled batches, Adam with
//                  a staircase learning rate, validation after
//                  every epoch, best-checkpoint selection
//
//   evaluator.rs — decodes a whole phase, scores it, writes the
//                  caption log; also the test-only entry point
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Gan et al. (2017) Semantic Compositional Networks

/// Semantic compositional captioning model
pub mod model;

/// Training loop with validation and checkpointing
pub mod trainer;

/// Phase decoding and scoring
pub mod evaluator;
