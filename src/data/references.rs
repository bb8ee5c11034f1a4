// ============================================================
// Layer 4 — Reference Captions
// ============================================================
// Human-written captions used only for scoring. The bundle keeps
// one list per video for each phase, in video-id order starting
// at the phase's first id:
//
//   val[0]  → references of video 6513
//   test[0] → references of video 7010

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

use crate::domain::corpus::Phase;
use crate::domain::traits::References;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceBundle {
    #[serde(default)]
    pub train: Vec<Vec<String>>,
    pub val:   Vec<Vec<String>>,
    pub test:  Vec<Vec<String>>,
}

impl ReferenceBundle {
    fn lists(&self, phase: Phase) -> &[Vec<String>] {
        match phase {
            Phase::Train => &self.train,
            Phase::Val   => &self.val,
            Phase::Test  => &self.test,
        }
    }

    /// video id → references for one phase. The phase's list must
    /// cover its whole video range.
    pub fn for_phase(&self, phase: Phase) -> Result<References> {
        let range = phase.video_range();
        let lists = self.lists(phase);
        ensure!(
            lists.len() == range.len(),
            "{phase} references cover {} videos, expected {}",
            lists.len(),
            range.len()
        );
        Ok(range.zip(lists.iter().cloned()).collect())
    }
}
