//! triggerflow - online trigger pipeline
//!
//! Turns a time-ordered stream of detector channel hits into activities and
//! then candidates, one item at a time, with bounded memory.
//!
//! ```text
//! Primitive stream
//!     ↓
//! activity maker   (TriggerStage<Input = Primitive, Output = Activity>)
//!     ↓
//! candidate maker  (TriggerStage<Input = Activity, Output = Candidate>)
//!     ↓
//! Candidate stream
//! ```
//!
//! Every stage runs the same contract (pre-filter, algorithm body, prescale)
//! from [`stage::TriggerStage`]. Sliding windows with incremental statistics
//! live in [`window`], the tolerant adjacent-channel search in [`adjacency`],
//! and the pluggable close/skip/block predicates in [`policy`].
//!
//! ```no_run
//! use triggerflow::{Timestamp, TriggerPipeline};
//!
//! let config = serde_json::json!({
//!     "activity_maker": { "algorithm": "channel_time_adjacency" },
//!     "candidate_maker": { "algorithm": "n_channel_hits", "n_channels_threshold": 40 }
//! });
//! let mut pipeline = TriggerPipeline::from_config(&config)?;
//! # let primitives: Vec<triggerflow::Primitive> = Vec::new();
//! for tp in &primitives {
//!     for tc in pipeline.process_primitive(tp) {
//!         println!("candidate at {}", tc.time_candidate);
//!     }
//! }
//! let _tail = pipeline.flush(Timestamp::MAX);
//! # Ok::<(), triggerflow::ConfigError>(())
//! ```

pub mod activity;
pub mod adjacency;
pub mod candidate;
pub mod config;
pub mod engine;
pub mod error;
pub mod policy;
pub mod registry;
pub mod stage;
pub mod telemetry;
pub mod types;
pub mod window;

pub use config::ConfigMap;
pub use engine::{PipelineStats, TriggerPipeline};
pub use error::{ConfigError, Result};
pub use registry::{build_activity_maker, build_candidate_maker};
pub use stage::{ActivityMaker, CandidateMaker, TriggerStage};
pub use telemetry::StageTelemetry;
pub use types::{
    Activity, ActivityAlgorithm, ActivityData, ActivityType, Candidate, CandidateAlgorithm, CandidateType, Channel,
    DetectorId, Primitive, PrimitiveKind, Timestamp,
};
pub use window::{Window, WindowItem};
