// SPDX-License-Identifier: MPL-2.0

//! Error types for the camera preview application

use std::io;
use thiserror::Error;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type for device enumeration and stream acquisition
pub type MediaResult<T> = Result<T, MediaError>;

/// Failures reported by the media host.
///
/// None of these are fatal: they are shown to the user and the preview
/// stays usable so another selection can be tried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaError {
    /// Access to the device (or to enumeration) was refused
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// The requested device does not exist (anymore)
    #[error("Device not found: {0}")]
    DeviceNotFound(String),
    /// The device exists but another process holds it
    #[error("Camera is busy: {0}")]
    HardwareBusy(String),
    /// No capture subsystem is reachable at all
    #[error("Camera hardware unavailable: {0}")]
    HardwareUnavailable(String),
    /// Unexpected failure inside the capture backend
    #[error("Backend error: {0}")]
    Backend(String),
}

impl MediaError {
    /// Classify an I/O error raised while touching a device node.
    pub fn from_io(err: &io::Error, context: &str) -> Self {
        let message = format!("{}: {}", context, err);

        if let Some(errno) = err.raw_os_error() {
            match errno {
                libc::EACCES | libc::EPERM => return MediaError::PermissionDenied(message),
                libc::ENOENT | libc::ENODEV | libc::ENXIO => {
                    return MediaError::DeviceNotFound(message);
                }
                libc::EBUSY => return MediaError::HardwareBusy(message),
                _ => {}
            }
        }

        match err.kind() {
            io::ErrorKind::PermissionDenied => MediaError::PermissionDenied(message),
            io::ErrorKind::NotFound => MediaError::DeviceNotFound(message),
            io::ErrorKind::ResourceBusy => MediaError::HardwareBusy(message),
            _ => MediaError::HardwareUnavailable(message),
        }
    }

    /// Short, user-facing name of the error kind
    pub fn kind_name(&self) -> &'static str {
        match self {
            MediaError::PermissionDenied(_) => "PermissionDenied",
            MediaError::DeviceNotFound(_) => "DeviceNotFound",
            MediaError::HardwareBusy(_) => "HardwareBusy",
            MediaError::HardwareUnavailable(_) => "HardwareUnavailable",
            MediaError::Backend(_) => "Backend",
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(err: io::Error) -> Self {
        MediaError::from_io(&err, "I/O error")
    }
}

/// Main application error type
#[derive(Debug, Error)]
pub enum AppError {
    /// Camera enumeration or acquisition errors
    #[error("Camera error: {0}")]
    Media(#[from] MediaError),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// Filesystem / terminal I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Config or listing (de)serialization errors
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// GStreamer initialization errors
    #[error("GStreamer error: {0}")]
    Gstreamer(#[from] gstreamer::glib::Error),
    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Other(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Other(msg.to_string())
    }
}
