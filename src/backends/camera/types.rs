// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use crate::constants::DEFAULT_ENTRY_LABEL;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Camera backend type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
pub enum CameraBackendType {
    /// Video4Linux2 device nodes captured through `v4l2src`
    #[default]
    #[value(name = "v4l2")]
    V4l2,
    /// PipeWire video sources captured through `pipewiresrc`
    #[value(name = "pipewire")]
    PipeWire,
}

impl std::fmt::Display for CameraBackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraBackendType::V4l2 => write!(f, "V4L2"),
            CameraBackendType::PipeWire => write!(f, "PipeWire"),
        }
    }
}

/// Kind of an input device, as reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    Unknown,
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceKind::VideoInput => write!(f, "videoinput"),
            DeviceKind::AudioInput => write!(f, "audioinput"),
            DeviceKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Metadata about one input device. Supplied by the host, read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub kind: DeviceKind,
    pub label: String,
    /// Devices sharing a group id belong to the same physical hardware
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(id: impl Into<String>, kind: DeviceKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            group_id: None,
        }
    }

    /// Shorthand for a video input descriptor
    pub fn video(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self::new(id, DeviceKind::VideoInput, label)
    }

    pub fn is_video(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    /// Label for display; hosts may hide labels, so fall back to the id
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }

    /// Full "id - kind - label" description
    pub fn detail(&self) -> String {
        format!("{} - {} - {}", self.id, self.kind, self.label)
    }
}

/// Which camera facing the default request should prefer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Facing away from the user (rear camera)
    #[default]
    Environment,
    /// Facing the user (front camera)
    User,
}

impl FacingMode {
    /// Map a libcamera / device tree location string to a facing mode
    pub fn from_location(location: &str) -> Option<Self> {
        match location.trim().to_ascii_lowercase().as_str() {
            "back" | "rear" | "environment" => Some(FacingMode::Environment),
            "front" | "user" => Some(FacingMode::User),
            _ => None,
        }
    }
}

/// The user's choice of camera
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SelectedDevice {
    /// Let the host pick its environment-facing camera
    #[default]
    Default,
    /// A specific enumerated device
    Device(DeviceDescriptor),
}

impl SelectedDevice {
    pub fn device_id(&self) -> Option<&str> {
        match self {
            SelectedDevice::Default => None,
            SelectedDevice::Device(descriptor) => Some(&descriptor.id),
        }
    }
}

impl std::fmt::Display for SelectedDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectedDevice::Default => write!(f, "{}", DEFAULT_ENTRY_LABEL),
            SelectedDevice::Device(descriptor) => {
                write!(f, "{} ({})", descriptor.display_label(), descriptor.id)
            }
        }
    }
}

/// Video part of a stream request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoConstraint {
    /// Any camera facing the given way
    FacingMode(FacingMode),
    /// Exactly this device
    DeviceId(String),
}

/// Stream request handed to the host. Audio is never requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub audio: bool,
    pub video: VideoConstraint,
}

impl StreamConstraints {
    pub fn facing(mode: FacingMode) -> Self {
        Self {
            audio: false,
            video: VideoConstraint::FacingMode(mode),
        }
    }

    pub fn device(id: impl Into<String>) -> Self {
        Self {
            audio: false,
            video: VideoConstraint::DeviceId(id.into()),
        }
    }
}

/// Process-unique identifier of a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId(u64);

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(0);

impl StreamId {
    pub fn next() -> Self {
        StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A device as seen by a backend, before it is reduced to a descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraNode {
    pub descriptor: DeviceDescriptor,
    /// Physical facing when the backend knows it
    pub facing: Option<FacingMode>,
}

impl CameraNode {
    pub fn new(descriptor: DeviceDescriptor) -> Self {
        Self {
            descriptor,
            facing: None,
        }
    }
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row, may include padding
    pub stride: u32,
    pub data: Arc<[u8]>,
    /// Timestamp when frame was captured (for latency diagnostics)
    pub captured_at: Instant,
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;
