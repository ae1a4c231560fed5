//! Result-suppressing predicates

use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::types::{Activity, Candidate};

/// Results a blocker can inspect
pub trait Blockable {
    fn input_count(&self) -> usize;
}

impl Blockable for Activity {
    fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

impl Blockable for Candidate {
    fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

/// Decide whether a finished result is suppressed instead of emitted
pub trait Blocker<R: Blockable>: Send {
    fn should_block(&self, result: &R) -> bool;

    /// Read this node's keys, then configure the rest of the chain
    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Chain leaf: never blocks
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverBlock;

impl<R: Blockable> Blocker<R> for NeverBlock {
    fn should_block(&self, _result: &R) -> bool {
        false
    }

    fn configure(&mut self, _config: &ConfigMap<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "never"
    }
}

/// Block results built from fewer than `min_inputs` inputs. Key:
/// `min_inputs` (default 1).
pub struct LowInputCountBlocker<R: Blockable> {
    pub min_inputs: usize,
    next: Box<dyn Blocker<R>>,
}

impl<R: Blockable + 'static> LowInputCountBlocker<R> {
    pub fn new(next: Box<dyn Blocker<R>>) -> Self {
        Self { min_inputs: 1, next }
    }
}

impl<R: Blockable + 'static> Default for LowInputCountBlocker<R> {
    fn default() -> Self {
        Self::new(Box::new(NeverBlock))
    }
}

impl<R: Blockable> Blocker<R> for LowInputCountBlocker<R> {
    fn should_block(&self, result: &R) -> bool {
        result.input_count() < self.min_inputs || self.next.should_block(result)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.min_inputs = config.usize_or("min_inputs", self.min_inputs)?;
        log::info!("[blocker:low_input_count] min_inputs: {}", self.min_inputs);
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "low_input_count"
    }
}

/// Build a blocker chain from names, first name outermost
///
/// Known names: `low_input_count`.
pub fn chain<R: Blockable + 'static>(names: &[String]) -> Result<Box<dyn Blocker<R>>> {
    let mut next: Box<dyn Blocker<R>> = Box::new(NeverBlock);
    for name in names.iter().rev() {
        next = match name.as_str() {
            "low_input_count" => Box::new(LowInputCountBlocker::new(next)),
            other => return Err(ConfigError::UnknownAlgorithm(format!("blocker `{}`", other))),
        };
    }
    Ok(next)
}
