//! AudioSweet Project Model
//!
//! Defines the core data contracts for AudioSweet sessions:
//! - **Tracks:** Channel count and an ordered effect list with enable flags
//! - **Clips:** Timeline position, length, and the active take's channel mode
//! - **Session:** Arena of tracks and clips plus selection, time window, and focus
//!
//! Clips and tracks are addressed through opaque `ClipId` / `TrackId` handles.
//! Times are seconds on the project timeline.

pub mod clip;
pub mod session;
pub mod track;

pub use clip::*;
pub use session::*;
pub use track::*;
