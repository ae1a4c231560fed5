//! Photon-detector time clustering
//!
//! Hits are chained while each one starts within `tick_limit` ticks of the
//! end of the previous one. When the chain breaks, the buffer becomes an
//! activity if its summed charge exceeds `adc_threshold` and is discarded
//! otherwise; either way the breaking hit starts the next buffer.

use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, ActivityType, Primitive, Timestamp};
use crate::window::Window;

pub struct PdsTimeClusteringMaker {
    settings: StageSettings,
    tick_limit: Timestamp,
    adc_threshold: u64,
    window: Window<Primitive>,
    /// End time of the most recently added hit
    buffer_end: Timestamp,
}

impl PdsTimeClusteringMaker {
    /// Keys: `tick_limit` (50), `adc_threshold` (1 200 000)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        let tick_limit = config.u64_or("tick_limit", 50)?;
        let adc_threshold = config.u64_or("adc_threshold", 1_200_000)?;

        log::info!(
            "[TAM:PDS] clusters within {} ticks above {} ADC counts become activities",
            tick_limit,
            adc_threshold
        );
        log::info!("[TAM:PDS] prescale: {}", stage.prescale);

        Ok(Self {
            settings: StageSettings::new(stage),
            tick_limit,
            adc_threshold,
            window: Window::new(),
            buffer_end: 0,
        })
    }

    fn restart(&mut self, seed: Primitive) {
        self.buffer_end = seed.time_end();
        self.window.reset(seed);
    }

    /// Activity for the buffered cluster, if its charge clears the threshold
    fn cluster(&self) -> Option<Activity> {
        if self.window.adc_integral <= self.adc_threshold {
            log::trace!(
                "[TAM:PDS] discarding cluster of {} hits with {} ADC counts",
                self.window.len(),
                self.window.adc_integral
            );
            return None;
        }

        let latest = *self.window.back()?;
        let mut activity = Activity::from_primitives(self.window.to_vec(), ActivityAlgorithm::PdsTimeClustering)?;
        activity.data.activity_type = ActivityType::Pds;
        activity.data.time_activity = latest.time_peak;

        log::debug!(
            "[TAM:PDS] emitting cluster {}..{} with {} ADC counts",
            activity.data.time_start,
            activity.data.time_end,
            activity.data.adc_integral
        );
        Some(activity)
    }
}

impl TriggerStage for PdsTimeClusteringMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "pds_time_clustering"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        if self.window.is_empty() {
            self.restart(*input);
            return;
        }

        if input.time_start < self.buffer_end.saturating_add(self.tick_limit) {
            self.buffer_end = input.time_end();
            self.window.add(*input);
            return;
        }

        out.extend(self.cluster());
        self.restart(*input);
    }

    fn drain(&mut self, until: Timestamp, out: &mut Vec<Activity>) {
        if !self.window.is_empty() && self.window.time_start <= until {
            out.extend(self.cluster());
        }
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::test_support::make_primitive;
    use serde_json::json;

    fn maker(adc_threshold: u64) -> PdsTimeClusteringMaker {
        let value = json!({ "tick_limit": 50, "adc_threshold": adc_threshold });
        PdsTimeClusteringMaker::new(&ConfigMap::new(&value)).unwrap()
    }

    #[test]
    fn test_gap_closes_cluster_above_threshold() {
        let mut maker = maker(250);

        // Each hit lasts 10 ticks, so 40 and 80 stay within 50 of the previous end
        for t in [0, 40, 80] {
            assert!(maker.accept(&make_primitive(t, 3, 100)).is_empty());
        }

        let out = maker.accept(&make_primitive(500, 3, 100));
        assert_eq!(out.len(), 1);

        let ta = &out[0];
        assert_eq!(ta.inputs.len(), 3);
        assert_eq!(ta.data.adc_integral, 300);
        assert_eq!(ta.data.time_start, 0);
        assert_eq!(ta.data.time_end, 90);
        assert_eq!(ta.data.time_activity, 82);
        assert_eq!(ta.data.activity_type, ActivityType::Pds);
        assert_eq!(ta.data.algorithm, ActivityAlgorithm::PdsTimeClustering);
    }

    #[test]
    fn test_quiet_cluster_discarded() {
        let mut maker = maker(250);

        assert!(maker.accept(&make_primitive(0, 1, 100)).is_empty());
        assert!(maker.accept(&make_primitive(30, 1, 100)).is_empty());
        // 200 ADC is not above 250: dropped, new buffer starts at 1000
        assert!(maker.accept(&make_primitive(1_000, 1, 100)).is_empty());

        assert!(maker.flush(Timestamp::MAX).is_empty());
    }

    #[test]
    fn test_chain_measured_from_last_hit_end() {
        let mut maker = maker(0);

        // Edge case: 59 < 0 + 10 + 50, but 120 is not below 59 + 10 + 50
        maker.accept(&make_primitive(0, 1, 10));
        maker.accept(&make_primitive(59, 1, 10));
        let out = maker.accept(&make_primitive(120, 1, 10));

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].inputs.len(), 2);
    }

    #[test]
    fn test_flush_applies_threshold_and_cutoff() {
        let mut maker = maker(150);
        maker.accept(&make_primitive(0, 1, 100));
        maker.accept(&make_primitive(30, 1, 100));
        assert_eq!(maker.flush(Timestamp::MAX).len(), 1);

        maker.accept(&make_primitive(5_000, 1, 100));
        maker.accept(&make_primitive(5_020, 1, 100));
        assert!(maker.flush(4_000).is_empty());
        assert!(maker.flush(Timestamp::MAX).is_empty());
    }
}
