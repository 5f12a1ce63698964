// SPDX-License-Identifier: MPL-2.0

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │   CameraSession     │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌──────────────────────────────────┐
//! │ DeviceEnumerator / StreamAcquirer│  ← what the session calls
//! └──────────┬───────────────────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │   MediaHost trait   │  ← enumerate_devices / get_stream
//! └──────────┬──────────┘
//!            │
//!            ▼
//!   ┌──────────────────┐
//!   │  GstCameraHost   │  ← V4L2 or PipeWire + GStreamer
//!   └──────────────────┘
//! ```

pub mod acquirer;
pub mod enumerator;
pub mod host;
pub mod pipeline;
pub mod pipewire;
pub mod stream;
pub mod types;
pub mod v4l2;

pub use acquirer::StreamAcquirer;
pub use enumerator::DeviceEnumerator;
pub use host::GstCameraHost;
pub use stream::{MediaStream, MediaTrack};
pub use types::*;

use crate::errors::MediaResult;
use futures::future::BoxFuture;

/// Capabilities the platform provides for listing and opening cameras.
///
/// Both calls are asynchronous; their futures own everything they need so
/// they can be spawned and complete independently of the caller.
pub trait MediaHost: Send + Sync {
    /// List available input devices in host order
    fn enumerate_devices(&self) -> BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>>;

    /// Open a live stream matching the constraints
    fn get_stream(
        &self,
        constraints: StreamConstraints,
    ) -> BoxFuture<'static, MediaResult<MediaStream>>;
}
