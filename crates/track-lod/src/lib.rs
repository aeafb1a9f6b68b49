//! Track LOD - Level-of-Detail Reduction for Dense GPS Tracks
//!
//! This library turns a long, densely sampled GPS track into a shorter track that renders
//! the same at interactive zoom levels. Reduction is a strictly sequential pipeline over a
//! single track:
//!
//! `raw track → temporal decimation → RDP simplification → hard cap → reduced track`
//!
//! # Architecture
//!
//! - **[`Track`] / [`TrackPoint`]**: Time-stamped samples carrying an opaque payload
//! - **[`LodConfig`]**: Validated, immutable reduction parameters
//! - **[`decimate`]**: Stride sampling to a target rate per minute
//! - **[`simplify`]**: Iterative Ramer–Douglas–Peucker over (lon, lat)
//! - **[`cap`]**: Uniform stride down to an absolute maximum length
//! - **[`apply_lod`]**: The full pipeline
//! - **[`batch`]**: Per-source grouping and parallel reduction of many tracks
//!
//! # Performance Characteristics
//!
//! - **Decimation / cap**: O(N log N) for the sort, O(N) otherwise
//! - **RDP**: O(N) best case, O(N log N) average, O(N²) on adversarial zig-zags
//! - **Memory**: stages work on borrowed samples; payloads are cloned once, at the end

pub mod batch;
pub mod cap;
mod config;
pub mod decimate;
mod pipeline;
pub mod simplify;
mod track;

// Public API exports
pub use batch::{ReducePolicy, ReducedTrack, group_by_source, merge_timeline, reduce_tracks};
pub use config::{LodConfig, Projection};
pub use pipeline::{LodStats, apply_lod, apply_lod_with_stats};
pub use track::{Sample, Track, TrackPoint};

/// Error types for LOD reduction
#[derive(Debug, thiserror::Error)]
pub enum LodError {
    #[error("Invalid configuration for `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Waypoint {index} has no timestamp")]
    MissingTimestamp { index: usize },
}

pub type Result<T> = std::result::Result<T, LodError>;
