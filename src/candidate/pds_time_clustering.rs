//! One candidate per photon-detector cluster, timed at its latest hit

use crate::config::{candidate_type_or, ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, Candidate, CandidateAlgorithm, CandidateType};

pub struct PdsTimeClusteringCandidateMaker {
    settings: StageSettings,
    candidate_type: CandidateType,
}

impl PdsTimeClusteringCandidateMaker {
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_candidate_stage(config)?;
        let candidate_type = candidate_type_or(config, CandidateType::PdsTimeClustering)?;

        log::info!("[TCM:PDS] prescale: {}, type: {}", stage.prescale, candidate_type.as_str());

        Ok(Self {
            settings: StageSettings::new(stage),
            candidate_type,
        })
    }
}

impl TriggerStage for PdsTimeClusteringCandidateMaker {
    type Input = Activity;
    type Output = Candidate;

    fn name(&self) -> &'static str {
        "pds_time_clustering"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Activity, out: &mut Vec<Candidate>) {
        out.push(Candidate::from_activity(
            input,
            input.data.time_activity,
            self.candidate_type,
            CandidateAlgorithm::PdsTimeClustering,
        ));
    }
}
