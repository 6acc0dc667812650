//! AudioSweet Processing Core — The Unit Compiler
//!
//! Turns a clip selection into render decisions:
//! - **Units:** Merge touching/overlapping clips per track into atomic render jobs
//! - **Window:** Classify units against the active time window into a render plan
//! - **Split:** Plan cuts at window edges so only in-window material is processed
//! - **Channel:** Resolve the channel policy into a concrete render channel count
//! - **Naming:** Derive versioned output clip names with FIFO-capped effect tokens
//!
//! This crate is pure computation with no host access and no I/O.
//! All inputs are data; all outputs are data.

pub mod channel;
pub mod naming;
pub mod split;
pub mod units;
pub mod window;

pub use channel::{normalize_channels, ChannelDecision, ChannelInputs, ChannelResolver, RenderChannelMode};
pub use naming::{sanitize_token, strip_artifacts, NamingState, OutputNamer};
pub use split::{plan_splits, SplitPlan};
pub use units::{ClipSpan, Unit, UnitDetector};
pub use window::{PlanKind, RenderPlan, WindowClassifier};
