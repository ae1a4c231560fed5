//! Track finding by channel adjacency with time consistency
//!
//! A sliding window of `window_length` ticks collects primitives. When a
//! primitive arrives past the window, the longest adjacent run in the window
//! is measured: above `adjacency_threshold` the run becomes an activity and
//! the window restarts at the new primitive, otherwise the window slides.

use crate::adjacency::{longest_adjacent_run, AdjacencyConfig};
use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};
use crate::window::{Window, WindowStep};

pub struct ChannelTimeAdjacencyMaker {
    settings: StageSettings,
    adjacency: AdjacencyConfig,
    window_length: Timestamp,
    adjacency_threshold: usize,
    window: Window<Primitive>,
    /// Largest adjacency emitted so far, for logging
    max_adjacency: usize,
}

impl ChannelTimeAdjacencyMaker {
    /// Keys: `window_length` (8000), `adjacency_threshold` (15),
    /// `adj_tolerance` (3), `time_tolerance` (150), `max_channel_gap` (5),
    /// `same_channel_window` (150), `tolerance_accounting` (`"gap"`)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        let adjacency = AdjacencyConfig::from_config(config, true)?;
        let window_length = config.u64_or("window_length", 8000)?;
        let adjacency_threshold = config.usize_or("adjacency_threshold", 15)?;

        log::info!("[TAM:CTA] window_length: {}", window_length);
        log::info!("[TAM:CTA] adjacency_threshold: {}", adjacency_threshold);
        log::info!(
            "[TAM:CTA] adj_tolerance: {}, time_tolerance: {:?}, accounting: {:?}",
            adjacency.adj_tolerance,
            adjacency.time_tolerance,
            adjacency.accounting
        );
        log::info!("[TAM:CTA] prescale: {}", stage.prescale);

        Ok(Self {
            settings: StageSettings::new(stage),
            adjacency,
            window_length,
            adjacency_threshold,
            window: Window::new(),
            max_adjacency: 0,
        })
    }

    pub fn window(&self) -> &Window<Primitive> {
        &self.window
    }

    /// Activity from the window's longest run, if it clears the threshold
    fn track(&mut self) -> Option<Activity> {
        let run = longest_adjacent_run(self.window.inputs(), &self.adjacency);
        if run.adjacency <= self.adjacency_threshold {
            return None;
        }

        self.max_adjacency = self.max_adjacency.max(run.adjacency);
        let activity = Activity::from_primitives(run.primitives, ActivityAlgorithm::ChannelTimeAdjacency)?;
        log::debug!(
            "[TAM:CTA] emitting track with adjacency {} ({} primitives, adc {}); largest so far {}",
            run.adjacency,
            activity.inputs.len(),
            activity.data.adc_integral,
            self.max_adjacency
        );
        Some(activity)
    }
}

impl TriggerStage for ChannelTimeAdjacencyMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "channel_time_adjacency"
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

        match self.track() {
            Some(activity) => {
                out.push(activity);
                self.window.reset(*input);
            }
            None => self.window.move_to(*input, self.window_length),
        }
    }

    /// Run the closing check on the open window, then drop it
    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if !self.window.is_empty() && self.window.time_start <= until {
            out.extend(self.track());
        }
        self.window.clear();
    }
}
