//! Composable decision policies
//!
//! Three predicate families, each built as an ownership chain:
//!
//! ```text
//! MaxTimeCloser ──owns──> LongDurationCloser ──owns──> NeverClose
//!   local || next.should_close(..)           local || false
//! ```
//!
//! - [`Blocker`]: suppress a finished result before it is emitted
//! - [`Closer`]: close the open window before folding in the incoming item
//! - [`Skipper`]: drop the incoming item instead of folding it in
//!
//! Chains are assembled once at configuration time and are read-only while
//! evaluating. `configure` walks the whole chain so every node reads its own
//! keys from the same map.

pub mod blocker;
pub mod closer;
pub mod skipper;

pub use blocker::{Blocker, LowInputCountBlocker, NeverBlock};
pub use closer::{Closer, LongDurationCloser, MaxInputsCloser, MaxTimeCloser, NeverClose};
pub use skipper::{FarChannelSkipper, HighTotSkipper, NeverSkip, Skipper};

use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};

/// Policy node names listed under `key`, outermost first
///
/// Absent key gives `defaults`. A present key must be an array of strings.
pub(crate) fn chain_names(config: &ConfigMap<'_>, key: &str, defaults: &[&str]) -> Result<Vec<String>> {
    let Some(value) = config.get(key) else {
        return Ok(defaults.iter().map(|name| name.to_string()).collect());
    };

    value
        .as_array()
        .ok_or_else(|| ConfigError::wrong_type(key, "array of policy names"))?
        .iter()
        .map(|name| {
            name.as_str()
                .map(str::to_string)
                .ok_or_else(|| ConfigError::wrong_type(key, "array of policy names"))
        })
        .collect()
}
