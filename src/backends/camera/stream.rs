// SPDX-License-Identifier: GPL-3.0-only

//! Live media streams and their tracks

use super::types::{DeviceKind, FrameReceiver, StreamId};
use std::sync::Arc;
use tracing::debug;

/// A single media channel of a stream.
///
/// Stopping a track releases the hardware behind it. `stop` must be
/// idempotent: streams stop their tracks on teardown and again on drop.
pub trait MediaTrack: Send + Sync {
    /// Identifier of the device feeding this track
    fn id(&self) -> &str;

    /// Human-readable track label
    fn label(&self) -> &str;

    fn kind(&self) -> DeviceKind {
        DeviceKind::VideoInput
    }

    /// True until the track has been stopped
    fn is_live(&self) -> bool;

    /// Release the underlying hardware
    fn stop(&self);
}

/// A live stream made of one or more tracks, plus the frames it produces
pub struct MediaStream {
    id: StreamId,
    label: String,
    tracks: Vec<Arc<dyn MediaTrack>>,
    frames: Option<FrameReceiver>,
}

impl MediaStream {
    pub fn new(
        label: impl Into<String>,
        tracks: Vec<Arc<dyn MediaTrack>>,
        frames: Option<FrameReceiver>,
    ) -> Self {
        Self {
            id: StreamId::next(),
            label: label.into(),
            tracks,
            frames,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn tracks(&self) -> &[Arc<dyn MediaTrack>] {
        &self.tracks
    }

    /// Hand the frame receiver to a video sink. Only the first call gets it.
    pub fn take_frames(&mut self) -> Option<FrameReceiver> {
        self.frames.take()
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(|track| track.is_live())
    }

    /// Stop every track, then drop them from the stream
    pub fn shutdown(&mut self) {
        debug!(stream = %self.id, tracks = self.tracks.len(), "Stopping stream tracks");
        for track in self.tracks.drain(..) {
            track.stop();
        }
        self.frames = None;
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("tracks", &self.tracks.len())
            .field("live", &self.is_live())
            .finish()
    }
}
