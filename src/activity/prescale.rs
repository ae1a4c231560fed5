//! One activity per primitive

use crate::config::{ConfigMap, StageConfig};
use crate::error::Result;
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive};

/// Wraps every accepted primitive in its own activity; rate control comes
/// from the stage prescale alone.
#[derive(Debug)]
pub struct PrescaleMaker {
    settings: StageSettings,
}

impl PrescaleMaker {
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        log::info!("[TAM:prescale] prescale: {}", stage.prescale);
        Ok(Self {
            settings: StageSettings::new(stage),
        })
    }
}

impl TriggerStage for PrescaleMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "prescale"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        if let Some(activity) = Activity::from_primitives(vec![*input], ActivityAlgorithm::Prescale) {
            out.push(activity);
        }
    }
}
