//! Window-closing predicates

use crate::config::ConfigMap;
use crate::error::{ConfigError, Result};
use crate::types::Timestamp;
use crate::window::{Window, WindowItem};

/// Decide whether the open window must close before `input` is folded in
pub trait Closer<T: WindowItem>: Send {
    /// True when this node or anything further down the chain says close
    fn should_close(&self, input: &T, window: &Window<T>) -> bool;

    /// Read this node's keys, then configure the rest of the chain
    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()>;

    /// Short name for logging
    fn name(&self) -> &'static str;
}

/// Chain leaf: never closes
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverClose;

impl<T: WindowItem> Closer<T> for NeverClose {
    fn should_close(&self, _input: &T, _window: &Window<T>) -> bool {
        false
    }

    fn configure(&mut self, _config: &ConfigMap<'_>) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "never"
    }
}

/// Close once the incoming item starts more than `max_time_delta` after the
/// window start. Key: `max_time_delta` (default 1000).
pub struct MaxTimeCloser<T: WindowItem> {
    pub max_time_delta: Timestamp,
    next: Box<dyn Closer<T>>,
}

impl<T: WindowItem + 'static> MaxTimeCloser<T> {
    pub fn new(next: Box<dyn Closer<T>>) -> Self {
        Self {
            max_time_delta: 1000,
            next,
        }
    }
}

impl<T: WindowItem + 'static> Default for MaxTimeCloser<T> {
    fn default() -> Self {
        Self::new(Box::new(NeverClose))
    }
}

impl<T: WindowItem> Closer<T> for MaxTimeCloser<T> {
    fn should_close(&self, input: &T, window: &Window<T>) -> bool {
        let too_late = !window.is_empty()
            && input.time_start().saturating_sub(window.time_start) > self.max_time_delta;
        too_late || self.next.should_close(input, window)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.max_time_delta = config.u64_or("max_time_delta", self.max_time_delta)?;
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "max_time"
    }
}

/// Close when the window would span more than `max_window_duration` ticks
/// from its start to the end of the incoming item. Key:
/// `max_window_duration` (default 50 000).
pub struct LongDurationCloser<T: WindowItem> {
    pub max_window_duration: Timestamp,
    next: Box<dyn Closer<T>>,
}

impl<T: WindowItem + 'static> LongDurationCloser<T> {
    pub fn new(next: Box<dyn Closer<T>>) -> Self {
        Self {
            max_window_duration: 50_000,
            next,
        }
    }
}

impl<T: WindowItem + 'static> Default for LongDurationCloser<T> {
    fn default() -> Self {
        Self::new(Box::new(NeverClose))
    }
}

impl<T: WindowItem> Closer<T> for LongDurationCloser<T> {
    fn should_close(&self, input: &T, window: &Window<T>) -> bool {
        let input_end = input.time_start().saturating_add(input.duration());
        let too_long =
            !window.is_empty() && input_end.saturating_sub(window.time_start) > self.max_window_duration;
        too_long || self.next.should_close(input, window)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.max_window_duration = config.u64_or("max_window_duration", self.max_window_duration)?;
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "long_duration"
    }
}

/// Close once the window already holds `max_inputs` items. Key:
/// `max_inputs` (default 1000).
pub struct MaxInputsCloser<T: WindowItem> {
    pub max_inputs: usize,
    next: Box<dyn Closer<T>>,
}

impl<T: WindowItem + 'static> MaxInputsCloser<T> {
    pub fn new(next: Box<dyn Closer<T>>) -> Self {
        Self {
            max_inputs: 1000,
            next,
        }
    }
}

impl<T: WindowItem + 'static> Default for MaxInputsCloser<T> {
    fn default() -> Self {
        Self::new(Box::new(NeverClose))
    }
}

impl<T: WindowItem> Closer<T> for MaxInputsCloser<T> {
    fn should_close(&self, input: &T, window: &Window<T>) -> bool {
        window.len() >= self.max_inputs || self.next.should_close(input, window)
    }

    fn configure(&mut self, config: &ConfigMap<'_>) -> Result<()> {
        self.max_inputs = config.usize_or("max_inputs", self.max_inputs)?;
        if self.max_inputs == 0 {
            return Err(ConfigError::out_of_range("max_inputs", 0));
        }
        self.next.configure(config)
    }

    fn name(&self) -> &'static str {
        "max_inputs"
    }
}

/// Build a closer chain from names, first name outermost
///
/// Known names: `max_time`, `long_duration`, `max_inputs`.
pub fn chain<T: WindowItem + 'static>(names: &[String]) -> Result<Box<dyn Closer<T>>> {
    let mut next: Box<dyn Closer<T>> = Box::new(NeverClose);
    for name in names.iter().rev() {
        next = match name.as_str() {
            "max_time" => Box::new(MaxTimeCloser::new(next)),
            "long_duration" => Box::new(LongDurationCloser::new(next)),
            "max_inputs" => Box::new(MaxInputsCloser::new(next)),
            other => return Err(ConfigError::UnknownAlgorithm(format!("closer `{}`", other))),
        };
    }
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, Primitive, PrimitiveKind};
    use serde_json::json;

    fn make_primitive(time_start: Timestamp, time_over_threshold: Timestamp, channel: Channel) -> Primitive {
        Primitive {
            time_start,
            time_over_threshold,
            time_peak: time_start,
            channel,
            adc_integral: 10,
            adc_peak: 5,
            detid: 1,
            kind: PrimitiveKind::Tpc,
        }
    }

    fn window_of(tps: &[Primitive]) -> Window<Primitive> {
        let mut window = Window::new();
        for tp in tps {
            window.add(*tp);
        }
        window
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_max_time_closer() {
        let mut closer = MaxTimeCloser::default();
        closer.configure(&ConfigMap::new(&json!({ "max_time_delta": 100 }))).unwrap();
        let window = window_of(&[make_primitive(1_000, 5, 1)]);

        assert!(!closer.should_close(&make_primitive(1_100, 5, 1), &window));
        assert!(closer.should_close(&make_primitive(1_101, 5, 1), &window));
        // Edge case: nothing open, nothing to close
        assert!(!closer.should_close(&make_primitive(9_999, 5, 1), &Window::new()));
    }

    #[test]
    fn test_configure_reaches_whole_chain() {
        let mut closer: Box<dyn Closer<Primitive>> = chain(&names(&["max_inputs", "max_time"])).unwrap();
        closer
            .configure(&ConfigMap::new(&json!({ "max_inputs": 2, "max_time_delta": 10 })))
            .unwrap();

        let window = window_of(&[make_primitive(0, 1, 1)]);
        // Only the inner node's key can trigger this
        assert!(closer.should_close(&make_primitive(11, 1, 1), &window));

        let window = window_of(&[make_primitive(0, 1, 1), make_primitive(1, 1, 1)]);
        assert!(closer.should_close(&make_primitive(2, 1, 1), &window));
    }

    #[test]
    fn test_unknown_closer_name_rejected() {
        assert!(chain::<Primitive>(&names(&["max_time", "sometimes"])).is_err());
    }

    #[test]
    fn test_zero_max_inputs_rejected() {
        let mut closer = MaxInputsCloser::<Primitive>::default();
        assert!(closer.configure(&ConfigMap::new(&json!({ "max_inputs": 0 }))).is_err());
    }

    #[test]
    fn test_chain_equals_or_of_conditions_in_any_order() {
        // Property: a chain of single-condition nodes is the OR of the
        // conditions, whatever the construction order.
        let config = json!({
            "max_time_delta": 100,
            "max_window_duration": 150,
            "max_inputs": 3
        });
        let config = ConfigMap::new(&config);

        let orders = [
            ["max_time", "long_duration", "max_inputs"],
            ["max_time", "max_inputs", "long_duration"],
            ["long_duration", "max_time", "max_inputs"],
            ["long_duration", "max_inputs", "max_time"],
            ["max_inputs", "max_time", "long_duration"],
            ["max_inputs", "long_duration", "max_time"],
        ];

        let windows = [
            window_of(&[make_primitive(0, 10, 1)]),
            window_of(&[make_primitive(0, 10, 1), make_primitive(5, 10, 2), make_primitive(8, 10, 3)]),
        ];
        // (start, tot) pairs hitting every combination of the three conditions
        let inputs = [(50, 10), (50, 200), (120, 10), (120, 100)];

        for order in orders {
            let mut closer: Box<dyn Closer<Primitive>> = chain(&names(&order)).unwrap();
            closer.configure(&config).unwrap();

            for window in &windows {
                for (start, tot) in inputs {
                    let input = make_primitive(start, tot, 9);
                    let expected = start > 100 || start + tot > 150 || window.len() >= 3;
                    assert_eq!(closer.should_close(&input, window), expected, "order {:?}", order);
                }
            }
        }
    }
}
