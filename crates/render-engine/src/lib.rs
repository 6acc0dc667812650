//! AudioSweet Render Engine
//!
//! Drives an editing host through a render run: selected clips are compiled
//! into units, placed on the processing track, rendered by the external
//! engine, and the outputs moved back and renamed. Every host state the run
//! changes is restored by a guard, whatever the outcome.
//!
//! # Pipeline Architecture
//!
//! ```text
//! selection ──┐
//!             ├── Unit Detector
//! window ─────┘         │
//!                       ├── Time-Window Classifier ── Pre-Splitter
//!                       │
//! settings ─────────────├── Channel Policy Resolver
//!                       │
//! focused effect ───────├── Effect Isolation (guards)
//!                       │
//!                       ├── Render Invoker ── Host::render
//!                       │
//!                       ▼
//!                  Output Namer
//!                       │
//!                       ▼
//!                   RunReport
//! ```

pub mod host;
pub mod invoker;
pub mod memory;
pub mod pipeline;
pub mod presplit;
pub mod scope;
pub mod selection;
pub mod token;

pub use host::{ChannelHandshake, Host, RenderOp, RenderRequest};
pub use invoker::RenderInvoker;
pub use memory::{MemoryHost, RenderRecord};
pub use pipeline::{RenderPipeline, RunReport, UnitOutcome, UnitStatus};
pub use presplit::apply_presplit;
pub use scope::{ChannelScope, EffectScope, HandshakeScope, SelectionScope, UndoScope};
pub use selection::{SelectionEntry, SelectionSnapshot};
pub use token::{DefaultTokenFormatter, TokenFormatter};
