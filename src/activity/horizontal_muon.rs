//! Horizontal muon finder
//!
//! Sliding window like the adjacency track finder, but the closing check is
//! one of three mutually exclusive modes:
//! - `trigger_on_adjacency` (default): longest adjacent run, no time check
//! - `trigger_on_adc`: summed window charge
//! - `trigger_on_n_channels`: distinct channels hit
//!
//! Enabling none or more than one mode is a configuration error.

use crate::adjacency::{longest_adjacent_run, AdjacencyConfig};
use crate::config::{ConfigMap, StageConfig};
use crate::error::{ConfigError, Result};
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};
use crate::window::{Window, WindowStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuonTrigger {
    Adjacency { threshold: usize },
    Adc { threshold: u64 },
    NChannels { threshold: usize },
}

impl MuonTrigger {
    fn from_config(config: &ConfigMap<'_>) -> Result<Self> {
        let on_adjacency = config.bool_or("trigger_on_adjacency", true)?;
        let on_adc = config.bool_or("trigger_on_adc", false)?;
        let on_n_channels = config.bool_or("trigger_on_n_channels", false)?;

        match (on_adjacency, on_adc, on_n_channels) {
            (true, false, false) => Ok(MuonTrigger::Adjacency {
                threshold: config.usize_or("adjacency_threshold", 15)?,
            }),
            (false, true, false) => Ok(MuonTrigger::Adc {
                threshold: config.u64_or("adc_threshold", 3_000_000)?,
            }),
            (false, false, true) => Ok(MuonTrigger::NChannels {
                threshold: config.usize_or("n_channels_threshold", 400)?,
            }),
            (false, false, false) => {
                log::warn!("[TAM:HM] all trigger flags are false");
                Err(ConfigError::Conflict(
                    "horizontal_muon: no trigger mode enabled".to_string(),
                ))
            }
            _ => {
                log::warn!("[TAM:HM] more than one trigger flag set");
                Err(ConfigError::Conflict(
                    "horizontal_muon: trigger_on_adjacency, trigger_on_adc and trigger_on_n_channels are exclusive"
                        .to_string(),
                ))
            }
        }
    }
}

pub struct HorizontalMuonMaker {
    settings: StageSettings,
    trigger: MuonTrigger,
    adjacency: AdjacencyConfig,
    window_length: Timestamp,
    window: Window<Primitive>,
}

impl HorizontalMuonMaker {
    /// Keys: trigger flags, `adjacency_threshold` (15), `adc_threshold`
    /// (3 000 000), `n_channels_threshold` (400), `adj_tolerance` (3),
    /// `tolerance_accounting`, `window_length` (50 000)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        let trigger = MuonTrigger::from_config(config)?;
        let adjacency = AdjacencyConfig::from_config(config, false)?;
        let window_length = config.u64_or("window_length", 50_000)?;

        log::info!("[TAM:HM] trigger: {:?}", trigger);
        log::info!("[TAM:HM] window_length: {}, prescale: {}", window_length, stage.prescale);

        Ok(Self {
            settings: StageSettings::new(stage),
            trigger,
            adjacency,
            window_length,
            window: Window::new(),
        })
    }

    pub fn trigger(&self) -> MuonTrigger {
        self.trigger
    }

    /// Activity for the open window if it passes the enabled check
    fn check(&self) -> Option<Activity> {
        let inputs = match self.trigger {
            MuonTrigger::Adjacency { threshold } => {
                let run = longest_adjacent_run(self.window.inputs(), &self.adjacency);
                if run.adjacency <= threshold {
                    return None;
                }
                log::debug!("[TAM:HM] adjacency {} above {}", run.adjacency, threshold);
                run.primitives
            }
            MuonTrigger::Adc { threshold } => {
                if self.window.adc_integral <= threshold {
                    return None;
                }
                log::debug!("[TAM:HM] window adc {} above {}", self.window.adc_integral, threshold);
                self.window.to_vec()
            }
            MuonTrigger::NChannels { threshold } => {
                if self.window.n_channels_hit() <= threshold {
                    return None;
                }
                log::debug!("[TAM:HM] {} channels hit, above {}", self.window.n_channels_hit(), threshold);
                self.window.to_vec()
            }
        };
        Activity::from_primitives(inputs, ActivityAlgorithm::HorizontalMuon)
    }
}

impl TriggerStage for HorizontalMuonMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "horizontal_muon"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        if self.window.offer(input, self.window_length) != WindowStep::Full {
            return;
        }

        match self.check() {
            Some(activity) => {
                out.push(activity);
                self.window.reset(*input);
            }
            None => self.window.move_to(*input, self.window_length),
        }
    }

    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if !self.window.is_empty() && self.window.time_start <= until {
            out.extend(self.check());
        }
        self.window.clear();
    }
}
