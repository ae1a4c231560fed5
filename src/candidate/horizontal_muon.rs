//! Horizontal muon candidate maker
//!
//! Every activity is folded into the window first; the window is then
//! checked against the enabled mode (`trigger_on_adc` or
//! `trigger_on_n_channels`, exactly one) and cleared when it fires.

use super::ReadoutWindow;
use crate::config::{candidate_type_or, ConfigMap, StageConfig};
use crate::error::{ConfigError, Result};
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, Candidate, CandidateAlgorithm, CandidateType, Timestamp};
use crate::window::{Window, WindowStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateTrigger {
    Adc { threshold: u64 },
    NChannels { threshold: usize },
}

pub struct HorizontalMuonCandidateMaker {
    settings: StageSettings,
    candidate_type: CandidateType,
    readout: ReadoutWindow,
    trigger: CandidateTrigger,
    window_length: Timestamp,
    window: Window<Activity>,
}

impl HorizontalMuonCandidateMaker {
    /// Keys: `trigger_on_adc`, `trigger_on_n_channels`, `adc_threshold`
    /// (1 200 000), `n_channels_threshold` (600), `window_length` (80 000),
    /// readout window keys
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_candidate_stage(config)?;
        let candidate_type = candidate_type_or(config, CandidateType::HorizontalMuon)?;
        let readout = ReadoutWindow::from_config(config)?;
        let window_length = config.u64_or("window_length", 80_000)?;

        let on_adc = config.bool_or("trigger_on_adc", true)?;
        let on_n_channels = config.bool_or("trigger_on_n_channels", false)?;
        let trigger = match (on_adc, on_n_channels) {
            (true, false) => CandidateTrigger::Adc {
                threshold: config.u64_or("adc_threshold", 1_200_000)?,
            },
            (false, true) => CandidateTrigger::NChannels {
                threshold: config.usize_or("n_channels_threshold", 600)?,
            },
            (true, true) => {
                log::warn!("[TCM:HM] triggering on ADC count and number of channels is not supported");
                return Err(ConfigError::Conflict(
                    "horizontal_muon: trigger_on_adc and trigger_on_n_channels are exclusive".to_string(),
                ));
            }
            (false, false) => {
                log::warn!("[TCM:HM] not triggering, all trigger flags are false");
                return Err(ConfigError::Conflict(
                    "horizontal_muon: no trigger mode enabled".to_string(),
                ));
            }
        };

        log::info!("[TCM:HM] trigger: {:?}, window_length: {}", trigger, window_length);

        Ok(Self {
            settings: StageSettings::new(stage),
            candidate_type,
            readout,
            trigger,
            window_length,
            window: Window::new(),
        })
    }

    fn fires(&self) -> bool {
        match self.trigger {
            CandidateTrigger::Adc { threshold } => self.window.adc_integral > threshold,
            CandidateTrigger::NChannels { threshold } => self.window.n_channels_hit() > threshold,
        }
    }

    fn emit(&mut self, out: &mut Vec<Candidate>) {
        if let Some(candidate) =
            self.readout
                .candidate(&self.window, self.candidate_type, CandidateAlgorithm::HorizontalMuon)
        {
            log::debug!(
                "[TCM:HM] candidate {}..{} from {} activities",
                candidate.time_start,
                candidate.time_end,
                candidate.inputs.len()
            );
            out.push(candidate);
        }
        self.window.clear();
    }
}

impl TriggerStage for HorizontalMuonCandidateMaker {
    type Input = Activity;
    type Output = Candidate;

    fn name(&self) -> &'static str {
        "horizontal_muon"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Activity, out: &mut Vec<Candidate>) {
        if self.window.offer(input, self.window_length) == WindowStep::Full {
            log::trace!("[TCM:HM] window full without trigger, sliding");
            self.window.move_to(input.clone(), self.window_length);
        }

        if self.fires() {
            self.emit(out);
        }
    }

    fn drain(&mut self, until: Timestamp, out: &mut Vec<Candidate>) {
        if !self.window.is_empty() && self.window.time_start <= until && self.fires() {
            self.emit(out);
        }
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::test_support::make_activity;
    use serde_json::json;

    #[test]
    fn test_mode_conflicts() {
        let both = json!({ "trigger_on_adc": true, "trigger_on_n_channels": true });
        assert!(matches!(
            HorizontalMuonCandidateMaker::new(&ConfigMap::new(&both)),
            Err(ConfigError::Conflict(_))
        ));

        let none = json!({ "trigger_on_adc": false });
        assert!(matches!(
            HorizontalMuonCandidateMaker::new(&ConfigMap::new(&none)),
            Err(ConfigError::Conflict(_))
        ));
    }

    #[test]
    fn test_adc_trigger_fires_and_clears() {
        let value = json!({ "adc_threshold": 500, "window_length": 10_000 });
        let mut maker = HorizontalMuonCandidateMaker::new(&ConfigMap::new(&value)).unwrap();

        // 2 x 3 x 50 = 300, then +300 crosses 500
        assert!(maker.accept(&make_activity(0, 1, 3, 50)).is_empty());
        assert!(maker.accept(&make_activity(100, 4, 3, 50)).is_empty());
        let out = maker.accept(&make_activity(200, 7, 3, 100));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].inputs.len(), 3);
        assert_eq!(out[0].time_candidate, 0);
        assert_eq!(out[0].candidate_type, CandidateType::HorizontalMuon);
        assert!(maker.flush(Timestamp::MAX).is_empty());
    }

    #[test]
    fn test_n_channels_trigger_on_slide() {
        let value = json!({
            "trigger_on_adc": false,
            "trigger_on_n_channels": true,
            "n_channels_threshold": 4,
            "window_length": 100
        });
        let mut maker = HorizontalMuonCandidateMaker::new(&ConfigMap::new(&value)).unwrap();

        assert!(maker.accept(&make_activity(0, 1, 3, 10)).is_empty());
        // Past the window: the first activity is evicted, 3 channels remain
        assert!(maker.accept(&make_activity(150, 20, 3, 10)).is_empty());
        let out = maker.accept(&make_activity(160, 40, 2, 10));
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].time_candidate, 150);
    }
}
