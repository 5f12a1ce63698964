// SPDX-License-Identifier: MPL-2.0

//! Camera Preview - list cameras and preview the selected one
//!
//! # Architecture
//!
//! - [`backends`]: device enumeration and capture (V4L2 / PipeWire via GStreamer)
//! - [`app`]: stream lifecycle, selection list and the camera session
//! - [`terminal`]: ratatui front-end driving a session
//! - [`config`]: user configuration handling
//!
//! # Example
//!
//! ```ignore
//! // Interactive preview in the terminal:
//! // camera-preview preview --device /dev/video0
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod terminal;

// Re-export commonly used types
pub use app::{CameraSession, Notice, Notifier, SinkBinding, VideoSink};
pub use backends::camera::{DeviceDescriptor, MediaHost, MediaStream, SelectedDevice};
pub use config::Config;
pub use errors::{AppError, AppResult, MediaError, MediaResult};
