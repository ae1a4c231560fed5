//! Core record types flowing through the trigger pipeline
//!
//! ```text
//! Primitive (one channel hit)
//!     ↓  activity maker
//! Activity (clustered primitives, owns copies of its inputs)
//!     ↓  candidate maker
//! Candidate (clustered activities, keeps their ActivityData projection)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Data timestamp in digitizer ticks (62.5 MHz)
pub type Timestamp = u64;

/// Offline channel identifier
pub type Channel = u32;

/// Detector element identifier
pub type DetectorId = u16;

/// Digitizer ticks per millisecond at 62.5 MHz
pub const TICKS_PER_MS: u64 = 62_500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveKind {
    #[default]
    Unknown,
    Tpc,
    Pds,
}

/// A single detector-channel hit
///
/// Immutable once produced by the digitizer. Algorithms that need a shifted
/// time origin work on copies via [`Primitive::shifted_to`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Primitive {
    pub time_start: Timestamp,
    /// Time over threshold, in ticks
    pub time_over_threshold: Timestamp,
    pub time_peak: Timestamp,
    pub channel: Channel,
    pub adc_integral: u32,
    pub adc_peak: u32,
    pub detid: DetectorId,
    pub kind: PrimitiveKind,
}

impl Primitive {
    pub fn time_end(&self) -> Timestamp {
        self.time_start.saturating_add(self.time_over_threshold)
    }

    /// Copy of this primitive with all times expressed relative to `origin`
    pub fn shifted_to(&self, origin: Timestamp) -> Primitive {
        Primitive {
            time_start: self.time_start.saturating_sub(origin),
            time_peak: self.time_peak.saturating_sub(origin),
            ..*self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[default]
    Unknown,
    Tpc,
    Pds,
}

impl From<PrimitiveKind> for ActivityType {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Unknown => ActivityType::Unknown,
            PrimitiveKind::Tpc => ActivityType::Tpc,
            PrimitiveKind::Pds => ActivityType::Pds,
        }
    }
}

/// Which activity maker produced an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAlgorithm {
    #[default]
    Unknown,
    Prescale,
    TimeWindow,
    ChannelDistance,
    ChannelTimeAdjacency,
    NChannelHits,
    HorizontalMuon,
    BundleN,
    PdsTimeClustering,
}

impl ActivityAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAlgorithm::Unknown => "unknown",
            ActivityAlgorithm::Prescale => "prescale",
            ActivityAlgorithm::TimeWindow => "time_window",
            ActivityAlgorithm::ChannelDistance => "channel_distance",
            ActivityAlgorithm::ChannelTimeAdjacency => "channel_time_adjacency",
            ActivityAlgorithm::NChannelHits => "n_channel_hits",
            ActivityAlgorithm::HorizontalMuon => "horizontal_muon",
            ActivityAlgorithm::BundleN => "bundle_n",
            ActivityAlgorithm::PdsTimeClustering => "pds_time_clustering",
        }
    }
}

impl fmt::Display for ActivityAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAlgorithm {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prescale" => Ok(ActivityAlgorithm::Prescale),
            "time_window" => Ok(ActivityAlgorithm::TimeWindow),
            "channel_distance" => Ok(ActivityAlgorithm::ChannelDistance),
            "channel_time_adjacency" => Ok(ActivityAlgorithm::ChannelTimeAdjacency),
            "n_channel_hits" => Ok(ActivityAlgorithm::NChannelHits),
            "horizontal_muon" => Ok(ActivityAlgorithm::HorizontalMuon),
            "bundle_n" => Ok(ActivityAlgorithm::BundleN),
            "pds_time_clustering" => Ok(ActivityAlgorithm::PdsTimeClustering),
            other => Err(crate::error::ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Summary fields of an activity, without its primitive list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivityData {
    pub time_start: Timestamp,
    pub time_end: Timestamp,
    pub time_peak: Timestamp,
    pub time_activity: Timestamp,
    pub channel_start: Channel,
    pub channel_end: Channel,
    pub channel_peak: Channel,
    pub adc_integral: u64,
    pub adc_peak: u32,
    pub detid: DetectorId,
    pub activity_type: ActivityType,
    pub algorithm: ActivityAlgorithm,
}

/// A clustered group of primitives
///
/// Owns its own copies of the contributing primitives; never aliases the
/// window it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Activity {
    #[serde(flatten)]
    pub data: ActivityData,
    pub inputs: Vec<Primitive>,
}

impl Activity {
    /// Build an activity spanning `inputs`
    ///
    /// - time span: min start / max (start + time over threshold)
    /// - channel span: min / max channel
    /// - peak fields: primitive with the largest `adc_peak`, first one wins ties
    /// - charge: sum of `adc_integral`
    ///
    /// Returns `None` for an empty input list.
    pub fn from_primitives(inputs: Vec<Primitive>, algorithm: ActivityAlgorithm) -> Option<Self> {
        let first = *inputs.first()?;

        let mut data = ActivityData {
            time_start: first.time_start,
            time_end: first.time_end(),
            time_peak: first.time_peak,
            time_activity: first.time_peak,
            channel_start: first.channel,
            channel_end: first.channel,
            channel_peak: first.channel,
            adc_integral: 0,
            adc_peak: first.adc_peak,
            detid: first.detid,
            activity_type: first.kind.into(),
            algorithm,
        };

        for tp in &inputs {
            data.time_start = data.time_start.min(tp.time_start);
            data.time_end = data.time_end.max(tp.time_end());
            data.channel_start = data.channel_start.min(tp.channel);
            data.channel_end = data.channel_end.max(tp.channel);
            data.adc_integral += u64::from(tp.adc_integral);
            if tp.adc_peak > data.adc_peak {
                data.adc_peak = tp.adc_peak;
                data.time_peak = tp.time_peak;
                data.channel_peak = tp.channel;
            }
        }
        data.time_activity = data.time_peak;

        Some(Activity { data, inputs })
    }

    pub fn data(&self) -> ActivityData {
        self.data
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateType {
    #[default]
    Unknown,
    Timing,
    Random,
    Prescale,
    AdcSimpleWindow,
    HorizontalMuon,
    MichelElectron,
    NChannelHits,
    Supernova,
    PdsTimeClustering,
}

impl CandidateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateType::Unknown => "unknown",
            CandidateType::Timing => "timing",
            CandidateType::Random => "random",
            CandidateType::Prescale => "prescale",
            CandidateType::AdcSimpleWindow => "adc_simple_window",
            CandidateType::HorizontalMuon => "horizontal_muon",
            CandidateType::MichelElectron => "michel_electron",
            CandidateType::NChannelHits => "n_channel_hits",
            CandidateType::Supernova => "supernova",
            CandidateType::PdsTimeClustering => "pds_time_clustering",
        }
    }
}

impl FromStr for CandidateType {
    type Err = crate::error::ConfigError;

    /// Parse an output type name. `"unknown"` is rejected: a stage must
    /// emit a concrete type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timing" => Ok(CandidateType::Timing),
            "random" => Ok(CandidateType::Random),
            "prescale" => Ok(CandidateType::Prescale),
            "adc_simple_window" => Ok(CandidateType::AdcSimpleWindow),
            "horizontal_muon" => Ok(CandidateType::HorizontalMuon),
            "michel_electron" => Ok(CandidateType::MichelElectron),
            "n_channel_hits" => Ok(CandidateType::NChannelHits),
            "supernova" => Ok(CandidateType::Supernova),
            "pds_time_clustering" => Ok(CandidateType::PdsTimeClustering),
            other => Err(crate::error::ConfigError::UnknownCandidateType(other.to_string())),
        }
    }
}

/// Which candidate maker produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateAlgorithm {
    #[default]
    Unknown,
    Prescale,
    AdcSimpleWindow,
    NChannelHits,
    HorizontalMuon,
    PdsTimeClustering,
}

impl CandidateAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateAlgorithm::Unknown => "unknown",
            CandidateAlgorithm::Prescale => "prescale",
            CandidateAlgorithm::AdcSimpleWindow => "adc_simple_window",
            CandidateAlgorithm::NChannelHits => "n_channel_hits",
            CandidateAlgorithm::HorizontalMuon => "horizontal_muon",
            CandidateAlgorithm::PdsTimeClustering => "pds_time_clustering",
        }
    }
}

impl fmt::Display for CandidateAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CandidateAlgorithm {
    type Err = crate::error::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prescale" => Ok(CandidateAlgorithm::Prescale),
            "adc_simple_window" => Ok(CandidateAlgorithm::AdcSimpleWindow),
            "n_channel_hits" => Ok(CandidateAlgorithm::NChannelHits),
            "horizontal_muon" => Ok(CandidateAlgorithm::HorizontalMuon),
            "pds_time_clustering" => Ok(CandidateAlgorithm::PdsTimeClustering),
            other => Err(crate::error::ConfigError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A clustered group of activities handed to the external decision maker
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub time_start: Timestamp,
    pub time_end: Timestamp,
    pub time_candidate: Timestamp,
    pub detid: DetectorId,
    pub candidate_type: CandidateType,
    pub algorithm: CandidateAlgorithm,
    pub inputs: Vec<ActivityData>,
}

impl Candidate {
    /// Candidate wrapping a single activity, spanning the activity's time range
    pub fn from_activity(
        activity: &Activity,
        time_candidate: Timestamp,
        candidate_type: CandidateType,
        algorithm: CandidateAlgorithm,
    ) -> Self {
        Candidate {
            time_start: activity.data.time_start,
            time_end: activity.data.time_end,
            time_candidate,
            detid: activity.data.detid,
            candidate_type,
            algorithm,
            inputs: vec![activity.data()],
        }
    }
}
