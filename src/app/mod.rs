// SPDX-License-Identifier: GPL-3.0-only

//! Application core
//!
//! - `lifecycle`: the single active stream and request sequencing
//! - `selection`: device list entries and keyboard cursor
//! - `video_sink`: display surface trait
//! - `session`: owns all of the above for the lifetime of a UI

pub mod lifecycle;
pub mod selection;
pub mod session;
pub mod video_sink;

pub use lifecycle::{Completion, LifecycleState, SelectTicket, StreamLifecycle};
pub use selection::{SelectionEntry, SelectionList, build_entries};
pub use session::{CameraSession, InitReport, InitRequests, Notice, Notifier, SessionEvent};
pub use video_sink::{SinkBinding, VideoSink};
