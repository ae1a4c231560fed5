//! Fixed-size bundles of consecutive primitives

use crate::config::{ConfigMap, StageConfig};
use crate::error::{ConfigError, Result};
use crate::stage::{StageSettings, TriggerStage};
use crate::types::{Activity, ActivityAlgorithm, Primitive, Timestamp};

pub struct BundleNMaker {
    settings: StageSettings,
    bundle_size: usize,
    bundle: Vec<Primitive>,
}

impl BundleNMaker {
    /// Keys: `bundle_size` (default 1, must be >= 1)
    pub fn new(config: &ConfigMap<'_>) -> Result<Self> {
        let stage = StageConfig::for_activity_stage(config)?;
        let bundle_size = config.positive_u64_or("bundle_size", 1)?;
        let bundle_size = usize::try_from(bundle_size)
            .map_err(|_| ConfigError::out_of_range("bundle_size", bundle_size))?;

        log::info!("[TAM:bundle_n] bundle_size: {}, prescale: {}", bundle_size, stage.prescale);

        Ok(Self {
            settings: StageSettings::new(stage),
            bundle_size,
            bundle: Vec::new(),
        })
    }

    fn emit(&mut self, out: &mut Vec<Activity>) {
        let bundle = std::mem::take(&mut self.bundle);
        out.extend(Activity::from_primitives(bundle, ActivityAlgorithm::BundleN));
    }
}

impl TriggerStage for BundleNMaker {
    type Input = Primitive;
    type Output = Activity;

    fn name(&self) -> &'static str {
        "bundle_n"
    }

    fn settings(&self) -> &StageSettings {
        &self.settings
    }

    fn settings_mut(&mut self) -> &mut StageSettings {
        &mut self.settings
    }

    fn process(&mut self, input: &Primitive, out: &mut Vec<Activity>) {
        self.bundle.push(*input);
        if self.bundle.len() >= self.bundle_size {
            self.emit(out);
        }
    }

    /// Emit whatever partial bundle is left
    fn drain(&mut self, _until: Timestamp, out: &mut Vec<Activity>) {
        if !self.bundle.is_empty() {
            log::debug!("[TAM:bundle_n] flushing partial bundle of {}", self.bundle.len());
            self.emit(out);
        }
    }
}
