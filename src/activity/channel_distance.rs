//! Policy-chain grouping
//!
//! ```text
//! primitive
//!     ↓ closer chain says close?   ── yes ──> emit window unless blocked,
//!     ↓                                       reseed with primitive
//!     ↓ skipper chain says skip?   ── yes ──> dropped
//! fold into open window
//! ```
//!
//! Default chains: closers `["max_time"]`, skippers
//! `["far_channel", "high_tot"]`, blockers `["low_input_count"]`. Each list
//! can be replaced through the `closers`, `skippers` and `blockers` keys and
//! every node then reads its own keys from the same configuration.

use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::policy::{self, Blocker, Closer, Skipper};
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};
use crate::window::Window;

pub struct ChannelDistanceMaker {
    settings: StageSettings,
    closer: Box<dyn Closer<Primitive>>,
    skipper: Box<dyn Skipper<Primitive>>,
    blocker: Box<dyn Blocker<Activity>>,
    window: Window<Primitive>,
}

impl ChannelDistanceMaker {
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let closer = policy::closer::chain(&policy::chain_names(config, "closers", &["max_time"])?)?;
        let skipper =
            policy::skipper::chain(&policy::chain_names(config, "skippers", &["far_channel", "high_tot"])?)?;
        let blocker = policy::blocker::chain(&policy::chain_names(config, "blockers", &["low_input_count"])?)?;

        Self::with_policies(config, closer, skipper, blocker)
    }

    /// Build with caller-assembled chains; each chain is configured from
    /// `config` before use
    pub fn with_policies(
        config: &ConfigMap<'_>,
        mut closer: Box<dyn Closer<Primitive>>,
        mut skipper: Box<dyn Skipper<Primitive>>,
        mut blocker: Box<dyn Blocker<Activity>>,
    ) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;

        closer.configure(config)?;
        skipper.configure(config)?;
        blocker.configure(config)?;

        log::info!(
            "[TAM:channel_distance] closer: {}, skipper: {}, blocker: {}, prescale: {}",
            closer.name(),
            skipper.name(),
            blocker.name(),
            stage.prescale
        );

        Ok(Self {
            settings: StageSettings::new(stage),
            closer,
            skipper,
            blocker,
            window: Window::new(),
        })
    }

    pub fn window(&self) -> &Window<Primitive> {
        &self.window
    }

    fn emit_window(&self, out: &mut Vec<Activity>) {
        let Some(activity) = Activity::from_primitives(self.window.to_vec(), ActivityAlgorithm::ChannelDistance)
        else {
            return;
        };
        if self.blocker.should_block(&activity) {
            log::debug!(
                "[TAM:channel_distance] blocked activity with {} primitives",
                activity.inputs.len()
            );
            return;
        }
        out.push(activity);
    }
}

impl TriggerStage for ChannelDistanceMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "channel_distance"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        if self.closer.should_close(input, &self.window) {
            self.emit_window(out);
            self.window.reset(*input);
            return;
        }

        if self.skipper.should_skip(input, &self.window) {
            log::trace!(
                "[TAM:channel_distance] skipping primitive on channel {} at {}",
                input.channel,
                input.time_start
            );
            return;
        }

        self.window.add(*input);
    }

    /// Emit the open window unless blocked or started after `until`
    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if !self.window.is_empty() && self.window.time_start <= until {
            self.emit_window(out);
        }
        self.window.clear();
    }
}
