//! Fixed time-window grouping
//!
//! Primitives accumulate until one starts more than `time_window_width`
//! ticks after the first; the open window then becomes one activity and the
//! closing primitive seeds the next window.

use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::policy::{Closer, MaxTimeCloser};
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};
use crate::window::Window;

pub struct TimeWindowMaker {
    settings: StageSettings,
    closer: MaxTimeCloser<Primitive>,
    window: Window<Primitive>,
}

impl TimeWindowMaker {
    /// Keys: `time_window_width` (default 8000)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;

        let mut closer = MaxTimeCloser::default();
        closer.max_time_delta = config.u64_or("time_window_width", 8000)?;

        log::info!("[TAM:time_window] time_window_width: {}", closer.max_time_delta);
        log::info!("[TAM:time_window] prescale: {}", stage.prescale);

        Ok(Self {
            settings: StageSettings::new(stage),
            closer,
            window: Window::new(),
        })
    }

    pub fn window(&self) -> &Window<Primitive> {
        &self.window
    }

    fn close_window(&mut self, out: &mut Vec<Activity>) {
        if let Some(activity) = Activity::from_primitives(self.window.to_vec(), ActivityAlgorithm::TimeWindow) {
            log::debug!(
                "[TAM:time_window] emitting activity {}..{} with {} primitives",
                activity.data.time_start,
                activity.data.time_end,
                activity.inputs.len()
            );
            out.push(activity);
        }
        self.window.clear();
    }
}

impl TriggerStage for TimeWindowMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "time_window"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        if self.closer.should_close(input, &self.window) {
            self.close_window(out);
        }
        self.window.add(*input);
    }

    /// Emit the open window if it started by `until`, discard it otherwise
    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if self.window.is_empty() {
            return;
        }
        if self.window.time_start <= until {
            self.close_window(out);
        } else {
            log::debug!(
                "[TAM:time_window] discarding window starting at {} after cutoff {}",
                self.window.time_start,
                until
            );
            self.window.clear();
        }
    }
}
