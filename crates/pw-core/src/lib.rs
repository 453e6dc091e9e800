//! In-process timing recorder.
//!
//! This crate contains:
//! - [`Watch`]: records start/stop pairs, loop iterations and single-shot
//!   detections into a [`Document`]
//! - Tag types: document- and event-level metadata
//! - Clock and memory sources, injectable for deterministic tests
//! - [`SharedWatch`]: one watch shared across threads

pub mod clock;
mod document;
mod event;
mod memory;
mod recorder;
mod shared;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use document::{Document, InitMetadata, RESERVED_KEYS};
pub use event::{Event, Instant, Interval};
pub use memory::{MemoryProbe, ProcessMemory};
pub use recorder::{Watch, WatchError, WatchOptions};
pub use shared::SharedWatch;
pub use types::{Scalar, TagValue, Tags};
