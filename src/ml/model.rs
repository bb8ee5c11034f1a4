// ============================================================
// Layer 5 — Semantic Caption Decoder (Burn)
// ============================================================
// An LSTM caption decoder whose weights are modulated by the
// video's predicted semantic tags. Every gate pre-activation is
//
//   W_c((W_a x_t) ⊙ (W_b s)) + U_c((U_a h_{t-1}) ⊙ (U_b s)) + C v
//
//   x_t : embedding of the previous word (zeros at t = 0)
//   s   : semantic tag vector      (tag_dim)
//   v   : video feature vector     (video_dim)
//
// The ⊙ factorisation lets the tag vector act as a soft selector
// over a bank of word/state transforms without materialising one
// weight matrix per tag. The initial (h, c) comes from v.
//
// Scheduled sampling: at each training step the next input word
// is, per example, the model's own prediction with probability
// `sample_prob` and the ground-truth word otherwise.
//
// All tensor maths (embedding, linear layers, activations,
// autodiff) is Burn's; this file only wires the layers.
//
// Reference: Gan et al. (2017) Semantic Compositional Networks
//            Bengio et al. (2015) Scheduled Sampling
//            Burn Book §3 (Building Blocks)

use anyhow::{ensure, Result};
use burn::{
    module::Param,
    nn::{Dropout, DropoutConfig, Embedding, EmbeddingConfig, Linear, LinearConfig},
    prelude::*,
    tensor::{activation, Distribution, TensorData},
};
use serde::{Deserialize, Serialize};

// ─── DecodeMode ───────────────────────────────────────────────────────────────
/// How the next word is chosen from the output distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// Most likely word
    Argmax,
    /// Multinomial sample (Gumbel-max)
    Sample,
}

impl DecodeMode {
    /// logits: [batch, vocab] → word ids: [batch]
    pub fn pick<B: Backend>(self, logits: Tensor<B, 2>) -> Tensor<B, 1, Int> {
        let [batch, _] = logits.dims();
        let scores = match self {
            DecodeMode::Argmax => logits,
            DecodeMode::Sample => {
                let uniform = Tensor::<B, 2>::random(
                    logits.dims(),
                    Distribution::Uniform(0.0, 1.0),
                    &logits.device(),
                )
                .clamp(1e-10, 1.0 - 1e-7);
                let gumbel = uniform.log().neg().log().neg();
                logits + gumbel
            }
        };
        scores.argmax(1).reshape([batch])
    }
}

// ─── Config ───────────────────────────────────────────────────────────────────
// #[derive(Config)] already provides Clone and Serialize/Deserialize.
#[derive(Config, Debug)]
pub struct CaptionModelConfig {
    pub vocab_size: usize,
    /// word embedding size (n_x)
    pub embed_dim:  usize,
    /// semantic tag size (n_y)
    pub tag_dim:    usize,
    /// video feature size (n_z)
    pub video_dim:  usize,
    /// factor size of the tag-modulated transforms (n_f)
    #[config(default = 1024)]
    pub factor_dim: usize,
    /// LSTM state size (n_h)
    #[config(default = 1024)]
    pub hidden_dim: usize,
    #[config(default = 0.5)]
    pub dropout:    f64,
}

impl CaptionModelConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> SemanticCaptioner<B> {
        let gates = 4 * self.hidden_dim;
        let no_bias = |i: usize, o: usize| -> Linear<B> {
            LinearConfig::new(i, o).with_bias(false).init(device)
        };

        SemanticCaptioner {
            embedding:     EmbeddingConfig::new(self.vocab_size, self.embed_dim).init(device),
            input_factor:  no_bias(self.embed_dim, self.factor_dim),
            input_tag:     no_bias(self.tag_dim, self.factor_dim),
            input_out:     LinearConfig::new(self.factor_dim, gates).init(device),
            hidden_factor: no_bias(self.hidden_dim, self.factor_dim),
            hidden_tag:    no_bias(self.tag_dim, self.factor_dim),
            hidden_out:    no_bias(self.factor_dim, gates),
            video_gate:    no_bias(self.video_dim, gates),
            init_hidden:   LinearConfig::new(self.video_dim, self.hidden_dim).init(device),
            init_cell:     LinearConfig::new(self.video_dim, self.hidden_dim).init(device),
            output:        LinearConfig::new(self.hidden_dim, self.vocab_size).init(device),
            dropout:       DropoutConfig::new(self.dropout).init(),
            embed_dim:     self.embed_dim,
            hidden_dim:    self.hidden_dim,
        }
    }
}

// ─── Model ────────────────────────────────────────────────────────────────────
#[derive(Module, Debug)]
pub struct SemanticCaptioner<B: Backend> {
    pub embedding:     Embedding<B>,
    pub input_factor:  Linear<B>,
    pub input_tag:     Linear<B>,
    pub input_out:     Linear<B>,
    pub hidden_factor: Linear<B>,
    pub hidden_tag:    Linear<B>,
    pub hidden_out:    Linear<B>,
    pub video_gate:    Linear<B>,
    pub init_hidden:   Linear<B>,
    pub init_cell:     Linear<B>,
    pub output:        Linear<B>,
    pub dropout:       Dropout,
    pub embed_dim:     usize,
    pub hidden_dim:    usize,
}

/// Recurrent state, both [batch, hidden_dim].
#[derive(Debug, Clone)]
pub struct LstmState<B: Backend> {
    pub hidden: Tensor<B, 2>,
    pub cell:   Tensor<B, 2>,
}

/// Per-sequence projections of the conditioning vectors.
struct Conditioning<B: Backend> {
    tag_input:  Tensor<B, 2>,
    tag_hidden: Tensor<B, 2>,
    video:      Tensor<B, 2>,
}

impl<B: Backend> SemanticCaptioner<B> {
    /// Replace the embedding table with pretrained word vectors
    /// (vocab_size rows of embed_dim).
    pub fn with_pretrained_embeddings(mut self, rows: &[Vec<f32>]) -> Result<Self> {
        let [vocab, dim] = self.embedding.weight.val().dims();
        ensure!(
            rows.len() == vocab,
            "pretrained embeddings have {} rows, model vocabulary is {vocab}",
            rows.len()
        );
        ensure!(
            rows.iter().all(|r| r.len() == dim),
            "pretrained embeddings are not all {dim}-dimensional"
        );

        let device = self.embedding.weight.val().device();
        let flat: Vec<f32> = rows.iter().flatten().copied().collect();
        let weight = Tensor::<B, 2>::from_data(TensorData::new(flat, [vocab, dim]), &device);
        self.embedding.weight = Param::from_tensor(weight);
        Ok(self)
    }

    fn condition(&self, videos: Tensor<B, 2>, tags: Tensor<B, 2>) -> Conditioning<B> {
        Conditioning {
            tag_input:  self.input_tag.forward(tags.clone()),
            tag_hidden: self.hidden_tag.forward(tags),
            video:      self.video_gate.forward(videos),
        }
    }

    fn initial_state(&self, videos: Tensor<B, 2>) -> LstmState<B> {
        LstmState {
            hidden: self.init_hidden.forward(videos.clone()).tanh(),
            cell:   self.init_cell.forward(videos).tanh(),
        }
    }

    /// One LSTM step on the embedded previous word.
    fn step(&self, x: Tensor<B, 2>, state: LstmState<B>, cond: &Conditioning<B>) -> LstmState<B> {
        let from_input = self
            .input_out
            .forward(self.input_factor.forward(x) * cond.tag_input.clone());
        let from_hidden = self
            .hidden_out
            .forward(self.hidden_factor.forward(state.hidden) * cond.tag_hidden.clone());
        let gates = from_input + from_hidden + cond.video.clone();

        let mut parts = gates.chunk(4, 1).into_iter();
        let (Some(i), Some(f), Some(o), Some(g)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            unreachable!("chunk(4) on a 4·hidden_dim axis yields four parts");
        };

        let cell = activation::sigmoid(f) * state.cell
            + activation::sigmoid(i) * g.tanh();
        let hidden = activation::sigmoid(o) * cell.clone().tanh();
        LstmState { hidden, cell }
    }

    fn embed(&self, words: Tensor<B, 1, Int>) -> Tensor<B, 2> {
        let [batch] = words.dims();
        self.embedding
            .forward(words.reshape([batch, 1]))
            .reshape([batch, self.embed_dim])
    }

    fn logits(&self, state: &LstmState<B>) -> Tensor<B, 2> {
        self.output.forward(self.dropout.forward(state.hidden.clone()))
    }

    /// Teacher-forced pass with scheduled sampling.
    ///
    /// words, mask: [steps, batch]; videos: [batch, video_dim];
    /// tags: [batch, tag_dim].
    ///
    /// Returns the masked cross-entropy summed over time and averaged
    /// over the batch (shape [1]), and the word predicted at every
    /// step (shape [batch, steps]).
    pub fn forward_loss(
        &self,
        words:       Tensor<B, 2, Int>,
        mask:        Tensor<B, 2>,
        videos:      Tensor<B, 2>,
        tags:        Tensor<B, 2>,
        sample_prob: f64,
        mode:        DecodeMode,
    ) -> (Tensor<B, 1>, Tensor<B, 2, Int>) {
        let [steps, batch] = words.dims();
        let device = words.device();

        let cond      = self.condition(videos.clone(), tags);
        let mut state = self.initial_state(videos);
        let mut input = Tensor::<B, 2>::zeros([batch, self.embed_dim], &device);
        let mut loss  = Tensor::<B, 1>::zeros([1], &device);
        let mut preds = Vec::with_capacity(steps);

        for t in 0..steps {
            state = self.step(self.dropout.forward(input), state, &cond);
            let logits = self.logits(&state);

            let target = words.clone().slice([t..t + 1, 0..batch]).reshape([batch]);
            let valid  = mask.clone().slice([t..t + 1, 0..batch]).reshape([batch]);

            let log_probs = activation::log_softmax(logits.clone(), 1);
            let picked = log_probs
                .gather(1, target.clone().reshape([batch, 1]))
                .reshape([batch]);
            loss = loss - (picked * valid).sum();

            let predicted = mode.pick(logits.detach());
            preds.push(predicted.clone());

            let use_own = Tensor::<B, 1>::random([batch], Distribution::Uniform(0.0, 1.0), &device)
                .lower_elem(sample_prob);
            input = self.embed(target.mask_where(use_own, predicted));
        }

        let preds = if steps == 0 {
            Tensor::<B, 2, Int>::zeros([batch, 0], &device)
        } else {
            Tensor::stack::<2>(preds, 1)
        };
        (loss / batch.max(1) as f64, preds)
    }

    /// Free-running decode for a fixed number of steps.
    ///
    /// videos: [batch, video_dim]; tags: [batch, tag_dim]
    /// → word ids [batch, steps]
    pub fn generate(
        &self,
        videos: Tensor<B, 2>,
        tags:   Tensor<B, 2>,
        steps:  usize,
        mode:   DecodeMode,
    ) -> Tensor<B, 2, Int> {
        let [batch, _] = videos.dims();
        let device = videos.device();

        let cond      = self.condition(videos.clone(), tags);
        let mut state = self.initial_state(videos);
        let mut input = Tensor::<B, 2>::zeros([batch, self.embed_dim], &device);
        let mut out   = Vec::with_capacity(steps);

        for _ in 0..steps {
            state = self.step(input, state, &cond);
            let word = mode.pick(self.logits(&state));
            input = self.embed(word.clone());
            out.push(word);
        }

        if out.is_empty() {
            return Tensor::<B, 2, Int>::zeros([batch, 0], &device);
        }
        Tensor::stack::<2>(out, 1)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};

    type B  = NdArray;
    type AB = Autodiff<NdArray>;

    fn tiny() -> CaptionModelConfig {
        CaptionModelConfig::new(12, 4, 3, 5)
            .with_factor_dim(6)
            .with_hidden_dim(8)
            .with_dropout(0.0)
    }

    fn inputs<Bk: Backend>(batch: usize, device: &Bk::Device) -> (Tensor<Bk, 2>, Tensor<Bk, 2>) {
        (
            Tensor::<Bk, 2>::random([batch, 5], Distribution::Uniform(-1.0, 1.0), device),
            Tensor::<Bk, 2>::random([batch, 3], Distribution::Uniform(0.0, 1.0), device),
        )
    }

    #[test]
    fn test_generate_shape_and_range() {
        let device = Default::default();
        let model  = tiny().init::<B>(&device);
        let (v, t) = inputs::<B>(3, &device);

        let out = model.generate(v, t, 7, DecodeMode::Argmax);
        assert_eq!(out.dims(), [3, 7]);

        let ids = out.into_data().convert::<i64>().to_vec::<i64>().unwrap();
        assert!(ids.iter().all(|&w| (0..12).contains(&w)));
    }

    #[test]
    fn test_argmax_generation_is_deterministic() {
        let device = Default::default();
        let model  = tiny().init::<B>(&device);
        let (v, t) = inputs::<B>(2, &device);

        let a = model.generate(v.clone(), t.clone(), 5, DecodeMode::Argmax);
        let b = model.generate(v, t, 5, DecodeMode::Argmax);
        assert_eq!(
            a.into_data().convert::<i64>().to_vec::<i64>().unwrap(),
            b.into_data().convert::<i64>().to_vec::<i64>().unwrap()
        );
    }

    #[test]
    fn test_sampling_mode_shape() {
        let device = Default::default();
        let model  = tiny().init::<B>(&device);
        let (v, t) = inputs::<B>(4, &device);
        assert_eq!(model.generate(v, t, 3, DecodeMode::Sample).dims(), [4, 3]);
    }

    #[test]
    fn test_forward_loss_shapes_and_backward() {
        let device = Default::default();
        let model  = tiny().init::<AB>(&device);
        let (v, t) = inputs::<AB>(2, &device);

        let words = Tensor::<AB, 2, Int>::from_data(
            TensorData::new(vec![3i64, 4, 5, 0, 0, 0], [3, 2]), &device,
        );
        let mask = Tensor::<AB, 2>::from_data(
            TensorData::new(vec![1.0f32, 1.0, 1.0, 1.0, 0.0, 0.0], [3, 2]), &device,
        );

        let (loss, preds) = model.forward_loss(words, mask, v, t, 0.5, DecodeMode::Argmax);
        assert_eq!(loss.dims(), [1]);
        assert_eq!(preds.dims(), [2, 3]);

        let value: f32 = loss.clone().into_scalar();
        assert!(value.is_finite() && value > 0.0);

        let grads = loss.backward();
        assert!(model.output.weight.val().grad(&grads).is_some());
    }

    #[test]
    fn test_masked_steps_do_not_add_loss() {
        let device = Default::default();
        let model  = tiny().init::<B>(&device);
        let (v, t) = inputs::<B>(1, &device);

        let words = Tensor::<B, 2, Int>::from_data(TensorData::new(vec![2i64, 7], [2, 1]), &device);
        let zero_mask = Tensor::<B, 2>::zeros([2, 1], &device);

        let (loss, _) = model.forward_loss(words, zero_mask, v, t, 0.0, DecodeMode::Argmax);
        let value: f32 = loss.into_scalar();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_pretrained_embeddings_loaded() {
        let device = Default::default();
        let rows: Vec<Vec<f32>> = (0..12).map(|r| vec![r as f32; 4]).collect();
        let model = tiny().init::<B>(&device).with_pretrained_embeddings(&rows).unwrap();

        let w = model.embedding.weight.val().into_data().to_vec::<f32>().unwrap();
        assert_eq!(&w[4 * 7..4 * 8], &[7.0, 7.0, 7.0, 7.0]);
    }

    #[test]
    fn test_pretrained_embeddings_shape_checked() {
        let device = Default::default();
        let rows: Vec<Vec<f32>> = vec![vec![0.0; 4]; 11];
        assert!(tiny().init::<B>(&device).with_pretrained_embeddings(&rows).is_err());
    }
}
