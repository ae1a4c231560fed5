//! One candidate per activity

use crate::config::{candidate_type_or, ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, Candidate, CandidateAlgorithm, CandidateType};

pub struct PrescaleCandidateMaker {
    settings: StageSettings,
    candidate_type: CandidateType,
}

impl PrescaleCandidateMaker {
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_candidate_stage(config)?;
        let candidate_type = candidate_type_or(config, CandidateType::Prescale)?;

        log::info!("[TCM:prescale] prescale: {}, type: {}", stage.prescale, candidate_type.as_str());

        Ok(Self {
            settings: StageSettings::new(stage),
            candidate_type,
        })
    }
}

impl TriggerStage for PrescaleCandidateMaker {
    type Input = Activity;
    type Output = Candidate;

    fn name(&self) -> &'static str {
        "prescale"
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
            input.data.time_start,
            self.candidate_type,
            CandidateAlgorithm::Prescale,
        ));
    }
}
