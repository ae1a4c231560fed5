//! Activity -> candidate makers
//!
//! Candidates keep only the [`ActivityData`](crate::types::ActivityData)
//! projection of the activities they were built from. Windowed makers read
//! out `[time_start - ticks_before, time_start + ticks_after]` around the
//! start of the window that fired.

pub mod adc_simple_window;
pub mod horizontal_muon;
pub mod n_channel_hits;
pub mod pds_time_clustering;
pub mod prescale;

pub use adc_simple_window::AdcSimpleWindowMaker;
pub use horizontal_muon::HorizontalMuonCandidateMaker;
pub use n_channel_hits::NChannelHitsCandidateMaker;
pub use pds_time_clustering::PdsTimeClusteringCandidateMaker;
pub use prescale::PrescaleCandidateMaker;

use crate::config::ConfigMap;
use crate::error::Result;
use crate::types::{Activity, Candidate, CandidateAlgorithm, CandidateType, Timestamp};
use crate::window::Window;

/// Readout window around a firing window's start
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadoutWindow {
    pub ticks_before: Timestamp,
    pub ticks_after: Timestamp,
}

impl ReadoutWindow {
    /// Keys: `readout_window_ticks_before`, `readout_window_ticks_after`
    /// (both default 0)
    pub fn from_config(config: &ConfigMap<'_>) -> Result<Self> {
        Ok(Self {
            ticks_before: config.u64_or("readout_window_ticks_before", 0)?,
            ticks_after: config.u64_or("readout_window_ticks_after", 0)?,
        })
    }

    /// Candidate covering every activity in `window`
    ///
    /// Returns `None` for an empty window.
    pub fn candidate(
        &self,
        window: &Window<Activity>,
        candidate_type: CandidateType,
        algorithm: CandidateAlgorithm,
    ) -> Option<Candidate> {
        let latest = window.back()?;
        Some(Candidate {
            time_start: window.time_start.saturating_sub(self.ticks_before),
            time_end: window.time_start.saturating_add(self.ticks_after),
            time_candidate: window.time_start,
            detid: latest.data.detid,
            candidate_type,
            algorithm,
            inputs: window.inputs().map(Activity::data).collect(),
        })
    }
}
