// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer-backed media host
//!
//! Enumeration and pipeline start-up both block (subprocesses, ioctls,
//! device open), so they run on tokio's blocking pool.

use super::pipeline::{CapturePipeline, CaptureSource};
use super::stream::{MediaStream, MediaTrack};
use super::types::{
    CameraBackendType, CameraNode, DeviceDescriptor, StreamConstraints, VideoConstraint,
};
use super::{MediaHost, pipewire, v4l2};
use crate::config::Config;
use crate::constants::{DEFAULT_STREAM_LABEL, pipeline};
use crate::errors::{MediaError, MediaResult};
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Media host for V4L2 or PipeWire cameras
#[derive(Debug, Clone)]
pub struct GstCameraHost {
    backend: CameraBackendType,
    width: u32,
    height: u32,
}

impl GstCameraHost {
    pub fn new(backend: CameraBackendType) -> Self {
        Self {
            backend,
            width: pipeline::DEFAULT_PREVIEW_WIDTH,
            height: pipeline::DEFAULT_PREVIEW_HEIGHT,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.backend).with_preview_size(config.preview_width, config.preview_height)
    }

    /// Size frames are scaled to before they reach the sink
    pub fn with_preview_size(mut self, width: u32, height: u32) -> Self {
        let valid = 1..=pipeline::MAX_PREVIEW_DIMENSION;
        if valid.contains(&width) && valid.contains(&height) {
            self.width = width;
            self.height = height;
        } else {
            warn!(width, height, "Ignoring invalid preview size");
        }
        self
    }

    pub fn backend(&self) -> CameraBackendType {
        self.backend
    }
}

fn enumerate_nodes(backend: CameraBackendType) -> MediaResult<Vec<CameraNode>> {
    match backend {
        CameraBackendType::V4l2 => v4l2::enumerate_v4l2_devices(),
        CameraBackendType::PipeWire => pipewire::enumerate_pipewire_nodes(),
    }
}

/// Device id to the value the source element expects
fn source_target(backend: CameraBackendType, device_id: &str) -> MediaResult<String> {
    match backend {
        CameraBackendType::V4l2 => Ok(device_id.to_string()),
        CameraBackendType::PipeWire => pipewire::target_object(device_id)
            .map(str::to_string)
            .ok_or_else(|| MediaError::DeviceNotFound(device_id.to_string())),
    }
}

/// Pick the device for a constraint: `(device id, label)`, `None` id meaning
/// "whatever the source element opens by default".
pub fn resolve_device(
    nodes: &[CameraNode],
    video: &VideoConstraint,
) -> MediaResult<(Option<String>, String)> {
    let mut cameras = nodes.iter().filter(|n| n.descriptor.is_video());

    match video {
        VideoConstraint::DeviceId(id) => cameras
            .find(|n| &n.descriptor.id == id)
            .map(|n| (Some(id.clone()), n.descriptor.display_label().to_string()))
            .ok_or_else(|| MediaError::DeviceNotFound(id.clone())),
        VideoConstraint::FacingMode(mode) => Ok(cameras
            .find(|n| n.facing == Some(*mode))
            .map(|n| {
                (
                    Some(n.descriptor.id.clone()),
                    n.descriptor.display_label().to_string(),
                )
            })
            .unwrap_or_else(|| (None, DEFAULT_STREAM_LABEL.to_string()))),
    }
}

fn open_stream(
    backend: CameraBackendType,
    constraints: &StreamConstraints,
    width: u32,
    height: u32,
) -> MediaResult<MediaStream> {
    if constraints.audio {
        warn!("Audio capture is not supported, ignoring audio constraint");
    }

    let nodes = match (&constraints.video, enumerate_nodes(backend)) {
        (_, Ok(nodes)) => nodes,
        // The default camera can still be opened blind
        (VideoConstraint::FacingMode(_), Err(err)) => {
            debug!(error = %err, "Enumeration failed, falling back to source default");
            Vec::new()
        }
        (VideoConstraint::DeviceId(_), Err(err)) => return Err(err),
    };

    let (device_id, label) = resolve_device(&nodes, &constraints.video)?;
    let target = device_id
        .as_deref()
        .map(|id| source_target(backend, id))
        .transpose()?;

    let (sender, receiver) = futures::channel::mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
    let source = CaptureSource { backend, target };
    let capture = CapturePipeline::start(&source, &label, width, height, sender)?;

    let tracks: Vec<Arc<dyn MediaTrack>> = vec![Arc::new(capture)];
    let stream = MediaStream::new(label, tracks, Some(receiver));
    info!(stream = %stream.id(), label = %stream.label(), "Stream acquired");
    Ok(stream)
}

fn join_error(err: tokio::task::JoinError) -> MediaError {
    MediaError::Backend(format!("Blocking task failed: {}", err))
}

impl MediaHost for GstCameraHost {
    fn enumerate_devices(&self) -> BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>> {
        let backend = self.backend;
        async move {
            let nodes = tokio::task::spawn_blocking(move || enumerate_nodes(backend))
                .await
                .map_err(join_error)??;
            Ok(nodes.into_iter().map(|n| n.descriptor).collect())
        }
        .boxed()
    }

    fn get_stream(
        &self,
        constraints: StreamConstraints,
    ) -> BoxFuture<'static, MediaResult<MediaStream>> {
        let (backend, width, height) = (self.backend, self.width, self.height);
        async move {
            tokio::task::spawn_blocking(move || open_stream(backend, &constraints, width, height))
                .await
                .map_err(join_error)?
        }
        .boxed()
    }
}
