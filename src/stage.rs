//! Three-phase stage contract shared by every maker
//!
//! ```text
//! accept(item)
//!     ↓
//! preprocess(item) ── false ──> []            (no state touched)
//!     ↓ true
//! process(item, &mut out)                      (algorithm body)
//!     ↓
//! postprocess(&mut out)                        (prescale: keep every Nth)
//!     ↓
//! out
//! ```
//!
//! `flush(until)` runs `drain` then the same `postprocess`, so a flushed
//! result is prescaled exactly like one produced by `accept`.

use crate::config::StageConfig;
use crate::telemetry::StageTelemetry;
use crate::types::Timestamp;
use crate::window::WindowItem;
use std::sync::Arc;

/// Keeps every Nth result, counting results rather than inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescaler {
    prescale: u64,
    seen: u64,
}

impl Prescaler {
    pub fn new(prescale: u64) -> Self {
        Self {
            prescale: prescale.max(1),
            seen: 0,
        }
    }

    /// Drop all but every Nth result, preserving order
    pub fn apply<T>(&mut self, results: &mut Vec<T>) {
        if self.prescale == 1 {
            self.seen += results.len() as u64;
            return;
        }
        let prescale = self.prescale;
        let seen = &mut self.seen;
        results.retain(|_| {
            *seen += 1;
            *seen % prescale == 0
        });
    }

    /// Results counted so far, kept or not
    pub fn seen(&self) -> u64 {
        self.seen
    }
}

/// State every stage carries besides its algorithm state
#[derive(Debug)]
pub struct StageSettings {
    pub config: StageConfig,
    pub prescaler: Prescaler,
    pub telemetry: Arc<StageTelemetry>,
}

impl StageSettings {
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            prescaler: Prescaler::new(config.prescale),
            telemetry: StageTelemetry::shared(),
        }
    }

    /// Replace the telemetry sink, e.g. with one using a test clock
    pub fn with_telemetry(mut self, telemetry: Arc<StageTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }
}

impl Default for StageSettings {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

/// A streaming stage turning inputs into zero or more outputs
///
/// Implementors provide `process` and, when they buffer state, `drain`.
/// `accept` must be called once per input in arrival order and `flush`
/// once after the last `accept`.
pub trait TriggerStage: Send {
    type Input: WindowItem;
    type Output;

    /// Algorithm name for logging
    fn name(&self) -> &'static str;

    fn settings(&self) -> &StageSettings;

    fn settings_mut(&mut self) -> &mut StageSettings;

    /// Reject items longer than the configured bound
    fn preprocess(&self, input: &Self::Input) -> bool {
        input.duration() <= self.settings().config.max_duration
    }

    /// Algorithm body
    fn process(&mut self, input: &Self::Input, out: &mut Vec<Self::Output>);

    /// Prescale the results of one call
    fn postprocess(&mut self, out: &mut Vec<Self::Output>) {
        self.settings_mut().prescaler.apply(out);
    }

    /// Emit or discard buffered state at end of stream
    ///
    /// Default: nothing buffered.
    fn drain(&mut self, _until: Timestamp, _out: &mut Vec<Self::Output>) {}

    fn accept(&mut self, input: &Self::Input) -> Vec<Self::Output> {
        if !self.preprocess(input) {
            log::trace!(
                "[{}] pre-filter rejected item at {} (duration {})",
                self.name(),
                input.time_start(),
                input.duration()
            );
            return Vec::new();
        }

        self.settings().telemetry.record(input.time_start());

        let mut out = Vec::new();
        self.process(input, &mut out);
        self.postprocess(&mut out);
        out
    }

    fn flush(&mut self, until: Timestamp) -> Vec<Self::Output> {
        let mut out = Vec::new();
        self.drain(until, &mut out);
        self.postprocess(&mut out);
        if !out.is_empty() {
            log::debug!("[{}] flush emitted {} result(s)", self.name(), out.len());
        }
        out
    }

    /// Shared handle to this stage's telemetry
    fn telemetry(&self) -> Arc<StageTelemetry> {
        Arc::clone(&self.settings().telemetry)
    }
}

/// Boxed primitive -> activity stage
pub type ActivityMaker =
    Box<dyn TriggerStage<Input = crate::types::Primitive, Output = crate::types::Activity>>;

/// Boxed activity -> candidate stage
pub type CandidateMaker =
    Box<dyn TriggerStage<Input = crate::types::Activity, Output = crate::types::Candidate>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Primitive, PrimitiveKind};

    /// Emits its input's start time once per input
    struct EchoStage {
        settings: StageSettings,
        buffered: Option<Timestamp>,
    }

    impl TriggerStage for EchoStage {
        type Input = Primitive;
        type Output = Timestamp;

        fn name(&self) -> &'static str {
            "echo"
        }

        fn settings(&self) -> &StageSettings {
            &self.settings
        }

        fn settings_mut(&mut self) -> &mut StageSettings {
            &mut self.settings
        }

        fn process(&mut self, input: &Primitive, out: &mut Vec<Timestamp>) {
            out.push(input.time_start);
            self.buffered = Some(input.time_start);
        }

        fn drain(&mut self, _until: Timestamp, out: &mut Vec<Timestamp>) {
            if let Some(last) = self.buffered.take() {
                out.push(last);
            }
        }
    }

    fn echo(prescale: u64, max_duration: Timestamp) -> EchoStage {
        EchoStage {
            settings: StageSettings::new(StageConfig {
                prescale,
                max_duration,
            }),
            buffered: None,
        }
    }

    fn make_primitive(time_start: Timestamp, time_over_threshold: Timestamp) -> Primitive {
        Primitive {
            time_start,
            time_over_threshold,
            time_peak: time_start,
            channel: 1,
            adc_integral: 1,
            adc_peak: 1,
            detid: 0,
            kind: PrimitiveKind::Tpc,
        }
    }

    #[test]
    fn test_prescale_keeps_every_third_result() {
        let mut stage = echo(3, Timestamp::MAX);

        let kept: Vec<Timestamp> = (1..=9)
            .flat_map(|t| stage.accept(&make_primitive(t, 1)))
            .collect();

        assert_eq!(kept, vec![3, 6, 9]);
    }

    #[test]
    fn test_prescale_counts_results_within_one_call() {
        let mut prescaler = Prescaler::new(2);
        let mut batch = vec!['a', 'b', 'c', 'd', 'e'];

        prescaler.apply(&mut batch);

        assert_eq!(batch, vec!['b', 'd']);
        assert_eq!(prescaler.seen(), 5);
    }

    #[test]
    fn test_prefilter_rejects_long_items_without_state_change() {
        let mut stage = echo(1, 100);

        assert!(stage.accept(&make_primitive(5, 101)).is_empty());
        assert_eq!(stage.buffered, None);
        assert_eq!(stage.telemetry().items_seen(), 0);

        assert_eq!(stage.accept(&make_primitive(6, 100)), vec![6]);
        assert_eq!(stage.telemetry().items_seen(), 1);
    }

    #[test]
    fn test_flush_output_is_prescaled() {
        let mut stage = echo(2, Timestamp::MAX);

        // Result #1 dropped, flush result #2 kept
        assert!(stage.accept(&make_primitive(10, 1)).is_empty());
        assert_eq!(stage.flush(Timestamp::MAX), vec![10]);
        assert!(stage.flush(Timestamp::MAX).is_empty());
    }
}
