//! Multiplicity trigger: distinct channels hit in a sliding window

use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};
use crate::window::{Window, WindowStep};

pub struct NChannelHitsMaker {
    settings: StageSettings,
    window_length: Timestamp,
    n_channels_threshold: usize,
    window: Window<Primitive>,
}

impl NChannelHitsMaker {
    /// Keys: `window_length` (8000), `n_channels_threshold` (8)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        let window_length = config.u64_or("window_length", 8000)?;
        let n_channels_threshold = config.usize_or("n_channels_threshold", 8)?;

        log::info!(
            "[TAM:NCH] window_length: {}, n_channels_threshold: {}, prescale: {}",
            window_length,
            n_channels_threshold,
            stage.prescale
        );

        Ok(Self {
            settings: StageSettings::new(stage),
            window_length,
            n_channels_threshold,
            window: Window::new(),
        })
    }

    fn exceeds_threshold(&self) -> bool {
        self.window.n_channels_hit() > self.n_channels_threshold
    }

    fn window_activity(&self) -> Option<Activity> {
        log::debug!(
            "[TAM:NCH] emitting multiplicity activity with {} unique channels hit",
            self.window.n_channels_hit()
        );
        Activity::from_primitives(self.window.to_vec(), ActivityAlgorithm::NChannelHits)
    }
}

impl TriggerStage for NChannelHitsMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "n_channel_hits"
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

        if self.exceeds_threshold() {
            out.extend(self.window_activity());
            self.window.reset(*input);
        } else {
            self.window.move_to(*input, self.window_length);
        }
    }

    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if !self.window.is_empty() && self.window.time_start <= until && self.exceeds_threshold() {
            out.extend(self.window_activity());
        }
        self.window.clear();
    }
}
