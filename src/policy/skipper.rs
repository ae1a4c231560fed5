//! Item-dropping predicates

use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::types::{Channel, Timestamp};
use crate::window::{Window, WindowItem};

/// Decide whether `input` is dropped instead of folded into the window
pub trait Skipper<T: WindowItem>: Send {
    fn should_skip(&self, input: &T, window: &Window<T>) -> bool;

    /// Read this node's keys, then configure the rest of the chain
    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Chain leaf: never skips
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverSkip;

impl<T: WindowItem> Skipper<T> for NeverSkip {
    fn should_skip(&self, _input: &T, _window: &Window<T>) -> bool {
        false
    }

    fn configure(&mut self, _config: &ConfigMap<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "never"
    }
}

/// Skip items lying more than `max_channel_distance` channels from any
/// channel already in the window. Key: `max_channel_distance` (default 5).
pub struct FarChannelSkipper<T: WindowItem> {
    pub max_channel_distance: Channel,
    next: Box<dyn Skipper<T>>,
}

impl<T: WindowItem + 'static> FarChannelSkipper<T> {
    pub fn new(next: Box<dyn Skipper<T>>) -> Self {
        Self {
            max_channel_distance: 5,
            next,
        }
    }
}

impl<T: WindowItem + 'static> Default for FarChannelSkipper<T> {
    fn default() -> Self {
        Self::new(Box::new(NeverSkip))
    }
}

impl<T: WindowItem> Skipper<T> for FarChannelSkipper<T> {
    fn should_skip(&self, input: &T, window: &Window<T>) -> bool {
        let far = input.channels().any(|incoming| {
            window
                .inputs()
                .flat_map(|item| item.channels())
                .any(|held| incoming.abs_diff(held) > self.max_channel_distance)
        });
        far || self.next.should_skip(input, window)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.max_channel_distance = config.u32_or("max_channel_distance", self.max_channel_distance)?;
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "far_channel"
    }
}

/// Skip items whose duration exceeds `tot_limit`. Key: `tot_limit`
/// (default 1 000 000).
pub struct HighTotSkipper<T: WindowItem> {
    pub tot_limit: Timestamp,
    next: Box<dyn Skipper<T>>,
}

impl<T: WindowItem + 'static> HighTotSkipper<T> {
    pub fn new(next: Box<dyn Skipper<T>>) -> Self {
        Self {
            tot_limit: 1_000_000,
            next,
        }
    }
}

impl<T: WindowItem + 'static> Default for HighTotSkipper<T> {
    fn default() -> Self {
        Self::new(Box::new(NeverSkip))
    }
}

impl<T: WindowItem> Skipper<T> for HighTotSkipper<T> {
    fn should_skip(&self, input: &T, window: &Window<T>) -> bool {
        input.duration() > self.tot_limit || self.next.should_skip(input, window)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.tot_limit = config.u64_or("tot_limit", self.tot_limit)?;
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "high_tot"
    }
}

/// Build a skipper chain from names, first name outermost
///
/// Known names: `far_channel`, `high_tot`.
pub fn chain<T: WindowItem + 'static>(names: &[String]) -> Result<Box<dyn Skipper<T>>> {
    let mut next: Box<dyn Skipper<T>> = Box::new(NeverSkip);
    for name in names.iter().rev() {
        next = match name.as_str() {
            "far_channel" => Box::new(FarChannelSkipper::new(next)),
            "high_tot" => Box::new(HighTotSkipper::new(next)),
            other => return Err(ConfigError::UnknownAlgorithm(format!("skipper `{}`", other))),
        };
    }
    Ok(next)
}
