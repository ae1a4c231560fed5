//! Longest channel-adjacent run search
//!
//! ```text
//! window (time order)      sorted by channel (stable)      runs
//! ch: 9 1 8 2 7 3 10   →   1 2 3 7 8 9 10             →   [1 2 3] [7 8 9 10]
//!                                                         best = [7 8 9 10]
//! ```
//!
//! The sweep compares each primitive against the last one accepted into the
//! current run:
//! - same channel: continuation (no adjacency gain) when start times are
//!   close, otherwise the duplicate is skipped without breaking the run
//! - gap of 1: always extends, free of tolerance
//! - gap in `[2, max_channel_gap]`: extends while tolerance remains and,
//!   when a time tolerance is set, the start-time difference is below
//!   `time_tolerance * gap`
//! - anything else closes the run
//!
//! The first run found wins ties.

use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::types::{Channel, Primitive, Timestamp};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How bridging a channel gap spends the tolerance budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceAccounting {
    /// A gap of `g` channels spends `g - 1`
    #[default]
    GapProportional,
    /// Every bridged gap spends 1, whatever its size
    PerEvent,
}

impl ToleranceAccounting {
    fn spend(&self, gap: Channel) -> u32 {
        match self {
            ToleranceAccounting::GapProportional => gap - 1,
            ToleranceAccounting::PerEvent => 1,
        }
    }
}

impl FromStr for ToleranceAccounting {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gap" => Ok(ToleranceAccounting::GapProportional),
            "event" => Ok(ToleranceAccounting::PerEvent),
            _ => Err(ConfigError::wrong_type("tolerance_accounting", "\"gap\" or \"event\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdjacencyConfig {
    /// Tolerance budget a single run may spend bridging gaps
    pub adj_tolerance: u32,
    /// Per-channel time tolerance for bridged gaps; `None` disables the check
    pub time_tolerance: Option<Timestamp>,
    /// Largest channel gap that may be bridged
    pub max_channel_gap: Channel,
    /// Same-channel hits closer than this continue the run
    pub same_channel_window: Timestamp,
    pub accounting: ToleranceAccounting,
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            adj_tolerance: 3,
            time_tolerance: None,
            max_channel_gap: 5,
            same_channel_window: 150,
            accounting: ToleranceAccounting::GapProportional,
        }
    }
}

impl AdjacencyConfig {
    /// Read `adj_tolerance`, `max_channel_gap`, `same_channel_window` and
    /// `tolerance_accounting`. The time check is enabled with
    /// `time_tolerance` only when `with_time_tolerance` is set.
    pub fn from_config(config: &ConfigMap<'_>, with_time_tolerance: bool) -> Result<Self> {
        let defaults = Self::default();

        let time_tolerance = if with_time_tolerance {
            Some(config.u64_or("time_tolerance", 150)?)
        } else {
            None
        };

        Ok(Self {
            adj_tolerance: config.u32_or("adj_tolerance", defaults.adj_tolerance)?,
            time_tolerance,
            max_channel_gap: config.u32_or("max_channel_gap", defaults.max_channel_gap)?,
            same_channel_window: config.u64_or("same_channel_window", defaults.same_channel_window)?,
            accounting: config.str_or("tolerance_accounting", "gap")?.parse()?,
        })
    }
}

/// The longest run found in a collection of primitives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyRun {
    /// Run members in channel order
    pub primitives: Vec<Primitive>,
    /// Number of channel advances in the run, plus one for the first channel
    pub adjacency: usize,
}

impl AdjacencyRun {
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }
}

/// Find the longest channel-adjacent run among `primitives`
///
/// # Arguments
/// * `primitives` - Window contents, in any order
/// * `config` - Gap tolerance and time-consistency settings
///
/// # Returns
/// Best run, or an empty run for an empty input. A single channel yields
/// adjacency 1.
pub fn longest_adjacent_run<'a, I>(primitives: I, config: &AdjacencyConfig) -> AdjacencyRun
where
    I: IntoIterator<Item = &'a Primitive>,
{
    let mut sorted: Vec<Primitive> = primitives.into_iter().copied().collect();
    if sorted.is_empty() {
        return AdjacencyRun::default();
    }
    // Vec::sort_by_key is stable, so same-channel hits keep time order
    sorted.sort_by_key(|tp| tp.channel);

    let mut best = AdjacencyRun::default();
    let mut run: Vec<Primitive> = vec![sorted[0]];
    let mut adjacency = 1usize;
    let mut tol_spent = 0u32;

    for next in sorted.iter().skip(1) {
        let last = run[run.len() - 1];
        let gap = next.channel - last.channel;
        let time_diff = next.time_start.abs_diff(last.time_start);

        if gap == 0 {
            if time_diff < config.same_channel_window {
                run.push(*next);
            } else {
                log::trace!(
                    "skipping duplicate hit on channel {} ({} ticks apart)",
                    next.channel,
                    time_diff
                );
            }
            continue;
        }

        if gap == 1 {
            run.push(*next);
            adjacency += 1;
            continue;
        }

        let time_ok = config
            .time_tolerance
            .map_or(true, |tol| time_diff < tol.saturating_mul(Timestamp::from(gap)));

        if gap <= config.max_channel_gap && tol_spent < config.adj_tolerance && time_ok {
            run.push(*next);
            adjacency += 1;
            tol_spent += config.accounting.spend(gap);
            continue;
        }

        close_run(&mut best, &mut run, adjacency);
        run.push(*next);
        adjacency = 1;
        tol_spent = 0;
    }
    close_run(&mut best, &mut run, adjacency);

    best
}

/// Keep `run` if it beats `best` strictly, then empty it
fn close_run(best: &mut AdjacencyRun, run: &mut Vec<Primitive>, adjacency: usize) {
    if adjacency > best.adjacency {
        best.adjacency = adjacency;
        best.primitives = std::mem::take(run);
    } else {
        run.clear();
    }
}
