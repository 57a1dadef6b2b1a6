//! Batch Encoder Library
//!
//! Compiles per-file archival transcoding job plans: ffprobe output is
//! normalized into a [`MediaDescriptor`], smart decisions pick the effective
//! audio profile and the tracks to keep, and the compiler emits the ordered
//! stages (video encode, premux, audio encode, subtitle extraction, mux,
//! cleanup) that a renderer turns into scripts.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod planner;
pub mod ports;
pub mod probe;
pub mod profiles;
pub mod streams;
pub mod utils;

// Re-export commonly used types
pub use domain::model::{AudioTrack, JobRequest, MediaDescriptor, SubtitleTrack};
pub use domain::plan::{Plan, Stage, StageKind};
pub use error::{EncodeError, EncodeResult};
pub use planner::compile;
pub use probe::normalize;
pub use profiles::ProfileTable;
