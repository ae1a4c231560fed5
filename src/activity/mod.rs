//! Primitive -> activity makers
//!
//! | name | groups primitives by | flush |
//! |---|---|---|
//! | `prescale` | one activity per primitive | nothing buffered |
//! | `time_window` | fixed time window | emit open window |
//! | `channel_distance` | closer/skipper/blocker chains | emit unless blocked |
//! | `channel_time_adjacency` | longest adjacent run with time check | same check as a closing hit |
//! | `n_channel_hits` | distinct channels in a sliding window | same check as a closing hit |
//! | `horizontal_muon` | adjacency, charge or channel count | same check as a closing hit |
//! | `bundle_n` | every N primitives | emit partial bundle |
//! | `pds_time_clustering` | hit chains within a tick limit, charge threshold | same check as a closing hit |

pub mod bundle_n;
pub mod channel_distance;
pub mod channel_time_adjacency;
pub mod horizontal_muon;
pub mod n_channel_hits;
pub mod pds_time_clustering;
pub mod prescale;
pub mod time_window;

pub use bundle_n::BundleNMaker;
pub use channel_distance::ChannelDistanceMaker;
pub use channel_time_adjacency::ChannelTimeAdjacencyMaker;
pub use horizontal_muon::HorizontalMuonMaker;
pub use n_channel_hits::NChannelHitsMaker;
pub use pds_time_clustering::PdsTimeClusteringMaker;
pub use prescale::PrescaleMaker;
pub use time_window::TimeWindowMaker;
