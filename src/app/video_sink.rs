// SPDX-License-Identifier: GPL-3.0-only

//! Video sink seam between the session and whatever displays frames

use crate::backends::camera::{FrameReceiver, StreamId};

/// What a sink gets when a stream becomes active
#[derive(Debug)]
pub struct SinkBinding {
    pub stream_id: StreamId,
    pub label: String,
    /// `None` for streams that do not deliver frames to the process
    pub frames: Option<FrameReceiver>,
}

/// Display surface for the active stream.
///
/// `bind` replaces any previous binding; `unbind` leaves the sink empty.
pub trait VideoSink: Send {
    fn bind(&mut self, binding: SinkBinding);

    fn unbind(&mut self);
}
