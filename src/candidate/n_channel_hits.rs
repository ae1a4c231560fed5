//! Multiplicity trigger over activities
//!
//! Distinct channels are counted over the primitives of every activity in
//! the window.

use super::ReadoutWindow;
use crate::config::{candidate_type_or, ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, Candidate, CandidateAlgorithm, CandidateType, Timestamp};
use crate::window::{Window, WindowStep};

pub struct NChannelHitsCandidateMaker {
    settings: StageSettings,
    candidate_type: CandidateType,
    readout: ReadoutWindow,
    window_length: Timestamp,
    n_channels_threshold: usize,
    window: Window<Activity>,
}

impl NChannelHitsCandidateMaker {
    /// Keys: `window_length` (8000), `n_channels_threshold` (8), readout
    /// window keys
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_candidate_stage(config)?;
        let candidate_type = candidate_type_or(config, CandidateType::NChannelHits)?;
        let readout = ReadoutWindow::from_config(config)?;
        let window_length = config.u64_or("window_length", 8000)?;
        let n_channels_threshold = config.usize_or("n_channels_threshold", 8)?;

        log::info!(
            "[TCM:NCH] window_length: {}, n_channels_threshold: {}, readout: {:?}",
            window_length,
            n_channels_threshold,
            readout
        );

        Ok(Self {
            settings: StageSettings::new(stage),
            candidate_type,
            readout,
            window_length,
            n_channels_threshold,
            window: Window::new(),
        })
    }

    fn fire(&self) -> Option<Candidate> {
        if self.window.n_channels_hit() <= self.n_channels_threshold {
            return None;
        }
        log::debug!(
            "[TCM:NCH] emitting candidate with {} unique channels over {} activities",
            self.window.n_channels_hit(),
            self.window.len()
        );
        self.readout
            .candidate(&self.window, self.candidate_type, CandidateAlgorithm::NChannelHits)
    }
}

impl TriggerStage for NChannelHitsCandidateMaker {
    type Input = Activity;
    type Output = Candidate;

    fn name(&self) -> &'static str {
        "n_channel_hits"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Activity, out: &mut Vec<Candidate>) {
        if self.window.offer(input, self.window_length) != WindowStep::Full {
            return;
        }

        match self.fire() {
            Some(candidate) => {
                out.push(candidate);
                self.window.reset(input.clone());
            }
            None => self.window.move_to(input.clone(), self.window_length),
        }
    }

    fn drain(&mut self, until: Timestamp, out: &mut Vec<Candidate>) {
        if !self.window.is_empty() && self.window.time_start <= until {
            out.extend(self.fire());
        }
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::make_activity;
    use serde_json::json;

    fn maker() -> NChannelHitsCandidateMaker {
        let value = json!({
            "window_length": 1_000,
            "n_channels_threshold": 5,
            "readout_window_ticks_before": 100,
            "readout_window_ticks_after": 300
        });
        NChannelHitsCandidateMaker::new(&ConfigMap::new(&value)).unwrap()
    }

    #[test]
    fn test_first_activity_alone_does_not_fire() {
        let mut maker = maker();
        assert!(maker.accept(&make_activity(5_000, 10, 2, 10)).is_empty());
    }

    #[test]
    fn test_fires_on_channels_across_activities() {
        let mut maker = maker();

        // Channels 10..13 and 30..33: 6 distinct
        assert!(maker.accept(&make_activity(5_000, 10, 3, 10)).is_empty());
        assert!(maker.accept(&make_activity(5_200, 30, 3, 10)).is_empty());

        let out = maker.accept(&make_activity(7_000, 50, 1, 10));
        assert_eq!(out.len(), 1);
        let tc = &out[0];
        assert_eq!(tc.time_start, 4_900);
        assert_eq!(tc.time_end, 5_300);
        assert_eq!(tc.time_candidate, 5_000);
        assert_eq!(tc.inputs.len(), 2);
        assert_eq!(tc.candidate_type, CandidateType::NChannelHits);
    }

    #[test]
    fn test_flush_runs_same_check() {
        let mut maker = maker();
        maker.accept(&make_activity(5_000, 10, 3, 10));
        maker.accept(&make_activity(5_100, 20, 3, 10));

        assert_eq!(maker.flush(Timestamp::MAX).len(), 1);

        maker.accept(&make_activity(9_000, 10, 2, 10));
        assert!(maker.flush(Timestamp::MAX).is_empty());
    }
}
