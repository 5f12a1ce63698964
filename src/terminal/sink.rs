// SPDX-License-Identifier: GPL-3.0-only

//! Video sink and notifier backing the terminal UI

use crate::app::{Notice, Notifier, SinkBinding, VideoSink};
use crate::backends::camera::CameraFrame;
use tracing::debug;

/// Keeps the newest frame of the bound stream
#[derive(Debug, Default)]
pub struct PreviewSink {
    binding: Option<SinkBinding>,
    latest: Option<CameraFrame>,
}

impl PreviewSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pull every queued frame, keeping only the last. Returns how many
    /// frames were drained.
    pub fn drain_frames(&mut self) -> usize {
        let Some(receiver) = self
            .binding
            .as_mut()
            .and_then(|binding| binding.frames.as_mut())
        else {
            return 0;
        };

        let mut drained = 0;
        while let Ok(frame) = receiver.try_recv() {
            self.latest = Some(frame);
            drained += 1;
        }
        drained
    }

    pub fn latest_frame(&self) -> Option<&CameraFrame> {
        self.latest.as_ref()
    }

    pub fn label(&self) -> Option<&str> {
        self.binding.as_ref().map(|binding| binding.label.as_str())
    }
}

impl VideoSink for PreviewSink {
    fn bind(&mut self, binding: SinkBinding) {
        debug!(stream = %binding.stream_id, label = %binding.label, "Binding preview");
        self.binding = Some(binding);
        self.latest = None;
    }

    fn unbind(&mut self) {
        if let Some(binding) = self.binding.take() {
            debug!(stream = %binding.stream_id, "Unbinding preview");
        }
        self.latest = None;
    }
}

/// Status line text plus a blocking error message
#[derive(Debug, Default)]
pub struct StatusNotifier {
    status: String,
    modal: Option<String>,
}

impl StatusNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Error waiting to be acknowledged
    pub fn modal(&self) -> Option<&str> {
        self.modal.as_deref()
    }

    pub fn dismiss(&mut self) {
        self.modal = None;
    }
}

impl Notifier for StatusNotifier {
    fn notify(&mut self, notice: Notice) {
        let text = notice.to_string();
        if notice.is_error() {
            self.modal = Some(text.clone());
        }
        self.status = text;
    }
}
