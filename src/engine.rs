//! Trigger pipeline - two chained stages driven one primitive at a time
//!
//! ```text
//! Primitive
//!     ↓
//! TriggerPipeline::process_primitive()
//!     ↓
//! activity maker.accept()  ──> Vec<Activity>
//!     ↓ (each activity, in order)
//! candidate maker.accept() ──> Vec<Candidate>
//! ```
//!
//! `flush(until)` flushes the activity maker, feeds whatever it released to
//! the candidate maker, and only then flushes the candidate maker.
//!
//! A pipeline is single-threaded. Run independent pipelines on separate
//! threads or tasks; telemetry handles may be read from anywhere.

use crate::config::ConfigMap;
use crate::error::Result;
use crate::registry::{activity_maker_from_section, candidate_maker_from_section};
use crate::stage::{ActivityMaker, CandidateMaker};
use crate::telemetry::StageTelemetry;
use crate::types::{Activity, Candidate, Primitive, Timestamp};
use serde::Serialize;
use std::sync::Arc;

/// Running totals for one pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub primitives_in: u64,
    pub activities: u64,
    pub candidates: u64,
    pub flushes: u64,
}

pub struct TriggerPipeline {
    activity_maker: ActivityMaker,
    candidate_maker: CandidateMaker,
    stats: PipelineStats,
}

impl TriggerPipeline {
    pub fn new(activity_maker: ActivityMaker, candidate_maker: CandidateMaker) -> Self {
        log::info!(
            "[pipeline] {} -> {}",
            activity_maker.name(),
            candidate_maker.name()
        );
        Self {
            activity_maker,
            candidate_maker,
            stats: PipelineStats::default(),
        }
    }

    /// Build both stages from a pipeline configuration
    ///
    /// # Arguments
    /// * `config` - Object with `activity_maker` and `candidate_maker`
    ///   sections, each naming its `algorithm`
    pub fn from_config(config: &serde_json::Value) -> Result<Self> {
        let root = ConfigMap::new(config);
        let activity_maker = activity_maker_from_section(&root.section("activity_maker")?)?;
        let candidate_maker = candidate_maker_from_section(&root.section("candidate_maker")?)?;
        Ok(Self::new(activity_maker, candidate_maker))
    }

    /// Push one primitive through both stages
    ///
    /// Returns the candidates completed by this primitive, usually none.
    pub fn process_primitive(&mut self, primitive: &Primitive) -> Vec<Candidate> {
        self.stats.primitives_in += 1;
        let activities = self.activity_maker.accept(primitive);
        self.feed_candidates(activities)
    }

    /// Release everything buffered in both stages
    ///
    /// # Arguments
    /// * `until` - Open windows starting after this time are discarded
    pub fn flush(&mut self, until: Timestamp) -> Vec<Candidate> {
        self.stats.flushes += 1;

        let activities = self.activity_maker.flush(until);
        let mut candidates = self.feed_candidates(activities);

        let flushed = self.candidate_maker.flush(until);
        self.stats.candidates += flushed.len() as u64;
        candidates.extend(flushed);

        log::debug!("[pipeline] flush until {} released {} candidate(s)", until, candidates.len());
        candidates
    }

    fn feed_candidates(&mut self, activities: Vec<Activity>) -> Vec<Candidate> {
        self.stats.activities += activities.len() as u64;

        let mut candidates = Vec::new();
        for activity in &activities {
            candidates.extend(self.candidate_maker.accept(activity));
        }
        self.stats.candidates += candidates.len() as u64;
        candidates
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn activity_telemetry(&self) -> Arc<StageTelemetry> {
        self.activity_maker.telemetry()
    }

    pub fn candidate_telemetry(&self) -> Arc<StageTelemetry> {
        self.candidate_maker.telemetry()
    }
}
