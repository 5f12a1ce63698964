// SPDX-License-Identifier: GPL-3.0-only

//! Stream acquisition front-end

use super::MediaHost;
use super::stream::MediaStream;
use super::types::{FacingMode, SelectedDevice, StreamConstraints};
use crate::errors::MediaResult;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::debug;

/// Opens video-only streams, either for the default camera or a named device.
///
/// Errors are handed back to the caller, which decides how to surface them.
#[derive(Clone)]
pub struct StreamAcquirer {
    host: Arc<dyn MediaHost>,
    facing: FacingMode,
}

impl StreamAcquirer {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self {
            host,
            facing: FacingMode::default(),
        }
    }

    /// Facing mode used by [`Self::acquire_default`]
    pub fn with_facing(mut self, facing: FacingMode) -> Self {
        self.facing = facing;
        self
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn acquire_default(&self) -> BoxFuture<'static, MediaResult<MediaStream>> {
        debug!(facing = ?self.facing, "Requesting default camera");
        self.host.get_stream(StreamConstraints::facing(self.facing))
    }

    pub fn acquire_by_id(&self, id: &str) -> BoxFuture<'static, MediaResult<MediaStream>> {
        debug!(device = %id, "Requesting camera by id");
        self.host.get_stream(StreamConstraints::device(id))
    }

    pub fn acquire(&self, choice: &SelectedDevice) -> BoxFuture<'static, MediaResult<MediaStream>> {
        match choice {
            SelectedDevice::Default => self.acquire_default(),
            SelectedDevice::Device(descriptor) => self.acquire_by_id(&descriptor.id),
        }
    }
}

impl std::fmt::Debug for StreamAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamAcquirer")
            .field("facing", &self.facing)
            .finish_non_exhaustive()
    }
}
