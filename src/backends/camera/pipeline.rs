// SPDX-License-Identifier: MPL-2.0

//! GStreamer capture pipeline for camera preview
//!
//! `<source> ! videoconvert ! videoscale ! video/x-raw,format=RGBA ! appsink`
//!
//! Each pipeline is one video track of a [`MediaStream`](super::MediaStream):
//! stopping the track sets the pipeline to NULL, which closes the device.

use super::stream::MediaTrack;
use super::types::{CameraBackendType, CameraFrame, FrameSender};
use crate::constants::{pipeline, timing};
use crate::errors::{MediaError, MediaResult};
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Where a pipeline pulls its frames from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureSource {
    pub backend: CameraBackendType,
    /// Device path (V4L2) or target object (PipeWire); `None` lets the host pick
    pub target: Option<String>,
}

impl CaptureSource {
    fn build_element(&self) -> MediaResult<gstreamer::Element> {
        let factory = match self.backend {
            CameraBackendType::V4l2 => "v4l2src",
            CameraBackendType::PipeWire => "pipewiresrc",
        };

        if gstreamer::ElementFactory::find(factory).is_none() {
            return Err(MediaError::HardwareUnavailable(format!(
                "{} not available: factory not found",
                factory
            )));
        }

        let mut builder = gstreamer::ElementFactory::make(factory).property("do-timestamp", true);
        if let Some(target) = self.target.as_deref() {
            builder = match self.backend {
                CameraBackendType::V4l2 => builder.property("device", target),
                CameraBackendType::PipeWire => builder.property("target-object", target),
            };
        }

        builder
            .name("source")
            .build()
            .map_err(|e| MediaError::Backend(format!("Failed to create {}: {}", factory, e)))
    }
}

/// Map a GStreamer error posted while starting capture to a media error
pub fn classify_gst_error(err: &gstreamer::glib::Error, debug_info: Option<&str>) -> MediaError {
    let message = match debug_info {
        Some(info) if !info.is_empty() => format!("{} ({})", err.message(), info),
        _ => err.message().to_string(),
    };

    match err.kind::<gstreamer::ResourceError>() {
        Some(gstreamer::ResourceError::Busy) => MediaError::HardwareBusy(message),
        Some(gstreamer::ResourceError::NotFound) => MediaError::DeviceNotFound(message),
        Some(gstreamer::ResourceError::NotAuthorized) => MediaError::PermissionDenied(message),
        Some(gstreamer::ResourceError::OpenRead | gstreamer::ResourceError::OpenReadWrite) => {
            // v4l2src reports EACCES and ENOENT both as open failures
            let lower = message.to_lowercase();
            if lower.contains("permission") {
                MediaError::PermissionDenied(message)
            } else if lower.contains("busy") {
                MediaError::HardwareBusy(message)
            } else {
                MediaError::DeviceNotFound(message)
            }
        }
        _ => MediaError::HardwareUnavailable(message),
    }
}

/// A running capture pipeline, exposed as a video track
pub struct CapturePipeline {
    id: String,
    label: String,
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    live: AtomicBool,
}

impl CapturePipeline {
    /// Build the pipeline and bring it to PLAYING.
    ///
    /// Blocks until the device is open (or failed to open), so call it from
    /// a blocking context.
    pub fn start(
        source: &CaptureSource,
        label: &str,
        width: u32,
        height: u32,
        frame_sender: FrameSender,
    ) -> MediaResult<Self> {
        info!(
            backend = %source.backend,
            target = ?source.target,
            width,
            height,
            "Creating capture pipeline"
        );

        gstreamer::init().map_err(|e| MediaError::HardwareUnavailable(e.to_string()))?;

        let src = source.build_element()?;
        let convert = make_element("videoconvert")?;
        let scale = make_element("videoscale")?;

        let (caps_width, caps_height) = caps_size(width, height)?;
        let caps = gstreamer_video::VideoCapsBuilder::new()
            .format(gstreamer_video::VideoFormat::Rgba)
            .width(caps_width)
            .height(caps_height)
            .build();

        let appsink = AppSink::builder()
            .name("sink")
            .caps(&caps)
            .max_buffers(pipeline::MAX_BUFFERS)
            .drop(true)
            .sync(false)
            .enable_last_sample(false)
            .build();

        let gst_pipeline = gstreamer::Pipeline::new();
        let elements = [
            &src,
            &convert,
            &scale,
            appsink.upcast_ref::<gstreamer::Element>(),
        ];
        gst_pipeline
            .add_many(elements)
            .map_err(|e| MediaError::Backend(format!("Failed to assemble pipeline: {}", e)))?;
        gstreamer::Element::link_many(elements)
            .map_err(|e| MediaError::Backend(format!("Failed to link pipeline: {}", e)))?;

        install_frame_callback(&appsink, frame_sender);

        let capture = Self {
            id: source.target.clone().unwrap_or_default(),
            label: label.to_string(),
            pipeline: gst_pipeline,
            appsink,
            live: AtomicBool::new(true),
        };

        // On failure `capture` is dropped, which stops the half-started pipeline
        capture.play()?;

        info!(label, "Capture pipeline running");
        Ok(capture)
    }

    fn play(&self) -> MediaResult<()> {
        debug!("Setting pipeline to PLAYING state");
        let started = self.pipeline.set_state(gstreamer::State::Playing);

        let (result, state, pending) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(result = ?result, state = ?state, pending = ?pending, "Pipeline state");

        if started.is_ok() && result.is_ok() {
            if state != gstreamer::State::Playing {
                warn!(state = ?state, "Pipeline is not in PLAYING state yet");
            }
            return Ok(());
        }

        Err(self.pop_start_error())
    }

    /// Fetch the error message the source posted on the bus
    fn pop_start_error(&self) -> MediaError {
        let message = self.pipeline.bus().and_then(|bus| {
            bus.timed_pop_filtered(
                gstreamer::ClockTime::ZERO,
                &[gstreamer::MessageType::Error],
            )
        });

        match message.as_ref().map(|m| m.view()) {
            Some(gstreamer::MessageView::Error(err)) => {
                let debug_info = err.debug().map(|d| d.to_string());
                let mapped = classify_gst_error(&err.error(), debug_info.as_deref());
                error!(error = %mapped, "Capture pipeline failed to start");
                mapped
            }
            _ => MediaError::HardwareUnavailable("Failed to start capture pipeline".to_string()),
        }
    }
}

/// Convert a preview size to the signed values caps expect
fn caps_size(width: u32, height: u32) -> MediaResult<(i32, i32)> {
    match (i32::try_from(width), i32::try_from(height)) {
        (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(MediaError::Backend(format!(
            "Preview size {}x{} out of range",
            width, height
        ))),
    }
}

fn make_element(factory: &str) -> MediaResult<gstreamer::Element> {
    gstreamer::ElementFactory::make(factory)
        .build()
        .map_err(|e| MediaError::Backend(format!("Failed to create {}: {}", factory, e)))
}

fn install_frame_callback(appsink: &AppSink, frame_sender: FrameSender) {
    let frame_counter = Arc::new(AtomicU64::new(0));

    appsink.set_callbacks(
        gstreamer_app::AppSinkCallbacks::builder()
            .new_sample(move |appsink| {
                let frame_start = Instant::now();
                let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);

                let sample = appsink.pull_sample().map_err(|_| gstreamer::FlowError::Eos)?;
                let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;

                if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
                    if frame_num % 30 == 0 {
                        warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
                    }
                    return Ok(gstreamer::FlowSuccess::Ok);
                }

                let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
                let video_info =
                    VideoInfo::from_caps(caps).map_err(|_| gstreamer::FlowError::Error)?;
                let map = buffer
                    .map_readable()
                    .map_err(|_| gstreamer::FlowError::Error)?;

                let frame = CameraFrame {
                    width: video_info.width(),
                    height: video_info.height(),
                    stride: video_info.stride()[0] as u32,
                    data: Arc::from(map.as_slice()),
                    captured_at: frame_start,
                };

                let mut sender = frame_sender.clone();
                if let Err(e) = sender.try_send(frame) {
                    if e.is_disconnected() {
                        // Nobody is watching anymore
                        return Err(gstreamer::FlowError::Flushing);
                    }
                    if frame_num % 30 == 0 {
                        debug!(frame = frame_num, "Frame dropped (channel full)");
                    }
                } else if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                    debug!(
                        frame = frame_num,
                        width = video_info.width(),
                        height = video_info.height(),
                        copy_us = frame_start.elapsed().as_micros(),
                        "Frame delivered"
                    );
                }

                Ok(gstreamer::FlowSuccess::Ok)
            })
            .build(),
    );
}

impl MediaTrack for CapturePipeline {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    fn stop(&self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }

        info!(label = %self.label, "Stopping capture pipeline");

        // Clear appsink callbacks to release the frame sender
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to set pipeline to NULL");
            return;
        }

        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => debug!(state = ?state, "Capture pipeline stopped"),
            Err(e) => debug!(error = ?e, state = ?state, "Pipeline state change had issues"),
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_errors_map_to_media_errors() {
        let busy = gstreamer::glib::Error::new(gstreamer::ResourceError::Busy, "Device busy");
        assert!(matches!(
            classify_gst_error(&busy, None),
            MediaError::HardwareBusy(_)
        ));

        let denied = gstreamer::glib::Error::new(
            gstreamer::ResourceError::OpenRead,
            "Could not open device '/dev/video0' for reading.",
        );
        assert!(matches!(
            classify_gst_error(&denied, Some("system error: Permission denied")),
            MediaError::PermissionDenied(_)
        ));

        let missing = gstreamer::glib::Error::new(
            gstreamer::ResourceError::NotFound,
            "Cannot identify device '/dev/video9'.",
        );
        assert!(matches!(
            classify_gst_error(&missing, None),
            MediaError::DeviceNotFound(_)
        ));

        let other = gstreamer::glib::Error::new(gstreamer::CoreError::Failed, "Internal error");
        assert!(matches!(
            classify_gst_error(&other, None),
            MediaError::HardwareUnavailable(_)
        ));
    }

    #[test]
    fn caps_size_rejects_values_that_do_not_fit() {
        assert_eq!(caps_size(640, 480), Ok((640, 480)));
        assert!(matches!(caps_size(u32::MAX, 480), Err(MediaError::Backend(_))));
        assert!(matches!(caps_size(640, 0), Err(MediaError::Backend(_))));
    }
}
