//! Sliding time window with incrementally maintained statistics
//!
//! A [`Window`] holds time-ordered items (primitives or activities) and keeps
//! two aggregates exact at all times:
//! - `adc_integral`: summed charge of the retained items
//! - distinct channels hit, via a per-channel hit-count map whose entries are
//!   removed when their count drops to zero
//!
//! Eviction walks the front of the window only and stops at the first item
//! young enough to keep, so `move` costs O(evicted).

use crate::types::{Activity, Channel, Primitive, Timestamp};
use std::collections::{HashMap, VecDeque};
use std::fmt;

/// An item that can be held in a [`Window`] and filtered by a stage
pub trait WindowItem: Clone {
    fn time_start(&self) -> Timestamp;

    /// Duration-like field used by the default pre-filter
    fn duration(&self) -> Timestamp;

    /// Charge contributed to the window's `adc_integral`
    fn charge(&self) -> u64;

    /// Channels this item touches. Repeats count as repeated hits.
    fn channels(&self) -> impl Iterator<Item = Channel> + '_;
}

impl WindowItem for Primitive {
    fn time_start(&self) -> Timestamp {
        self.time_start
    }

    fn duration(&self) -> Timestamp {
        self.time_over_threshold
    }

    fn charge(&self) -> u64 {
        u64::from(self.adc_integral)
    }

    fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        std::iter::once(self.channel)
    }
}

impl WindowItem for Activity {
    fn time_start(&self) -> Timestamp {
        self.data.time_start
    }

    fn duration(&self) -> Timestamp {
        self.data.time_end.saturating_sub(self.data.time_start)
    }

    fn charge(&self) -> u64 {
        self.data.adc_integral
    }

    fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        self.inputs.iter().map(|tp| tp.channel)
    }
}

/// What happened when an item was offered to a sliding window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowStep {
    /// Window was empty and is now seeded with the item
    Seeded,
    /// Item fell inside the window and was added
    Added,
    /// Item starts `window_length` or more after the window; nothing changed
    Full,
}

/// Time-ordered buffer of items with O(1) aggregate reads
#[derive(Debug, Clone)]
pub struct Window<T: WindowItem> {
    /// Start time of the earliest retained item
    pub time_start: Timestamp,

    /// Summed charge of the retained items
    pub adc_integral: u64,

    channel_states: HashMap<Channel, u32>,
    inputs: VecDeque<T>,
}

impl<T: WindowItem> Default for Window<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: WindowItem> Window<T> {
    pub fn new() -> Self {
        Self {
            time_start: 0,
            adc_integral: 0,
            channel_states: HashMap::new(),
            inputs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    /// Number of distinct channels with at least one retained hit
    pub fn n_channels_hit(&self) -> usize {
        self.channel_states.len()
    }

    pub fn inputs(&self) -> impl ExactSizeIterator<Item = &T> + DoubleEndedIterator + '_ {
        self.inputs.iter()
    }

    pub fn front(&self) -> Option<&T> {
        self.inputs.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.inputs.back()
    }

    /// Owned copy of the retained items, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.inputs.iter().cloned().collect()
    }

    /// Replace all contents with a single seed item
    pub fn reset(&mut self, seed: T) {
        self.channel_states.clear();
        self.inputs.clear();
        self.time_start = seed.time_start();
        self.adc_integral = 0;
        self.push(seed);
    }

    /// Append an item, updating the aggregates
    ///
    /// Adding to an empty window seeds it (same as [`Window::reset`]) so the
    /// start time always tracks the earliest retained item.
    pub fn add(&mut self, item: T) {
        if self.inputs.is_empty() {
            self.reset(item);
            return;
        }
        self.push(item);
    }

    /// Evict every item at least `max_span` ticks older than `item`, then add it
    ///
    /// Evicts oldest first and stops at the first retained item. If the
    /// window empties (or was never seeded) it is reset with `item`.
    pub fn move_to(&mut self, item: T, max_span: Timestamp) {
        let incoming = item.time_start();

        while let Some(oldest) = self.inputs.front() {
            if incoming.saturating_sub(oldest.time_start()) < max_span {
                break;
            }
            if let Some(evicted) = self.inputs.pop_front() {
                self.forget(&evicted);
            }
        }

        match self.inputs.front() {
            Some(oldest) => {
                self.time_start = oldest.time_start();
                self.push(item);
            }
            None => self.reset(item),
        }
    }

    /// Seed or extend the window with `item`, or report that it is full
    ///
    /// On [`WindowStep::Full`] the caller decides between emitting and
    /// resetting, or sliding with [`Window::move_to`].
    pub fn offer(&mut self, item: &T, window_length: Timestamp) -> WindowStep {
        if self.inputs.is_empty() {
            self.reset(item.clone());
            return WindowStep::Seeded;
        }
        if item.time_start().saturating_sub(self.time_start) < window_length {
            self.push(item.clone());
            return WindowStep::Added;
        }
        WindowStep::Full
    }

    /// Empty the window and zero its aggregates
    pub fn clear(&mut self) {
        self.channel_states.clear();
        self.inputs.clear();
        self.adc_integral = 0;
    }

    fn push(&mut self, item: T) {
        self.adc_integral += item.charge();
        for channel in item.channels() {
            *self.channel_states.entry(channel).or_insert(0) += 1;
        }
        self.inputs.push_back(item);
    }

    fn forget(&mut self, item: &T) {
        self.adc_integral = self.adc_integral.saturating_sub(item.charge());
        for channel in item.channels() {
            if let Some(count) = self.channel_states.get_mut(&channel) {
                *count -= 1;
                if *count == 0 {
                    self.channel_states.remove(&channel);
                }
            }
        }
    }
}

impl<T: WindowItem> fmt::Display for Window<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inputs.back() {
            None => write!(f, "Window is empty"),
            Some(last) => write!(
                f,
                "Window start: {}, end: {}. Total of: {} ADC counts with {} inputs, {} channels hit",
                self.time_start,
                last.time_start(),
                self.adc_integral,
                self.inputs.len(),
                self.channel_states.len()
            ),
        }
    }
}
