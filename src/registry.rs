//! Algorithm selection
//!
//! Maps the closed algorithm enums to constructed, configured stages. Built
//! once by whoever assembles the pipeline.

use crate::activity::{
    BundleNMaker, ChannelDistanceMaker, ChannelTimeAdjacencyMaker, HorizontalMuonMaker, NChannelHitsMaker,
    PdsTimeClusteringMaker, PrescaleMaker, TimeWindowMaker,
};
use crate::candidate::{
    AdcSimpleWindowMaker, HorizontalMuonCandidateMaker, NChannelHitsCandidateMaker,
    PdsTimeClusteringCandidateMaker, PrescaleCandidateMaker,
};
use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::stage::{ActivityMaker, CandidateMaker};
use crate::types::{ActivityAlgorithm, CandidateAlgorithm};

/// Construct and configure a primitive -> activity stage
pub fn build_activity_maker(algorithm: ActivityAlgorithm, config: &ConfigMap<'_>) -> Result<ActivityMaker> {
    log::info!("[registry] building activity maker `{}`", algorithm);

    let maker: ActivityMaker = match algorithm {
        ActivityAlgorithm::Prescale => Box::new(PrescaleMaker::new(config)?),
        ActivityAlgorithm::TimeWindow => Box::new(TimeWindowMaker::new(config)?),
        ActivityAlgorithm::ChannelDistance => Box::new(ChannelDistanceMaker::new(config)?),
        ActivityAlgorithm::ChannelTimeAdjacency => Box::new(ChannelTimeAdjacencyMaker::new(config)?),
        ActivityAlgorithm::NChannelHits => Box::new(NChannelHitsMaker::new(config)?),
        ActivityAlgorithm::HorizontalMuon => Box::new(HorizontalMuonMaker::new(config)?),
        ActivityAlgorithm::BundleN => Box::new(BundleNMaker::new(config)?),
        ActivityAlgorithm::PdsTimeClustering => Box::new(PdsTimeClusteringMaker::new(config)?),
        ActivityAlgorithm::Unknown => {
            return Err(ConfigError::UnknownAlgorithm(algorithm.to_string()));
        }
    };
    Ok(maker)
}

/// Construct and configure an activity -> candidate stage
pub fn build_candidate_maker(algorithm: CandidateAlgorithm, config: &ConfigMap<'_>) -> Result<CandidateMaker> {
    log::info!("[registry] building candidate maker `{}`", algorithm);

    let maker: CandidateMaker = match algorithm {
        CandidateAlgorithm::Prescale => Box::new(PrescaleCandidateMaker::new(config)?),
        CandidateAlgorithm::AdcSimpleWindow => Box::new(AdcSimpleWindowMaker::new(config)?),
        CandidateAlgorithm::NChannelHits => Box::new(NChannelHitsCandidateMaker::new(config)?),
        CandidateAlgorithm::HorizontalMuon => Box::new(HorizontalMuonCandidateMaker::new(config)?),
        CandidateAlgorithm::PdsTimeClustering => Box::new(PdsTimeClusteringCandidateMaker::new(config)?),
        CandidateAlgorithm::Unknown => {
            return Err(ConfigError::UnknownAlgorithm(algorithm.to_string()));
        }
    };
    Ok(maker)
}

/// Build an activity maker from a section carrying an `algorithm` name
pub fn activity_maker_from_section(section: &ConfigMap<'_>) -> Result<ActivityMaker> {
    let algorithm: ActivityAlgorithm = section.str_or("algorithm", "")?.parse()?;
    build_activity_maker(algorithm, section)
}

/// Build a candidate maker from a section carrying an `algorithm` name
pub fn candidate_maker_from_section(section: &ConfigMap<'_>) -> Result<CandidateMaker> {
    let algorithm: CandidateAlgorithm = section.str_or("algorithm", "")?.parse()?;
    build_candidate_maker(algorithm, section)
}
