// SPDX-License-Identifier: GPL-3.0-only

//! Device enumeration front-end

use super::MediaHost;
use super::types::DeviceDescriptor;
use crate::errors::MediaResult;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{info, warn};

/// Lists the devices the host exposes. Failures are returned, never retried.
#[derive(Clone)]
pub struct DeviceEnumerator {
    host: Arc<dyn MediaHost>,
}

impl DeviceEnumerator {
    pub fn new(host: Arc<dyn MediaHost>) -> Self {
        Self { host }
    }

    pub fn list_devices(&self) -> BoxFuture<'static, MediaResult<Vec<DeviceDescriptor>>> {
        let request = self.host.enumerate_devices();
        async move {
            match request.await {
                Ok(devices) => {
                    let video = devices.iter().filter(|d| d.is_video()).count();
                    info!(total = devices.len(), video, "Enumerated devices");
                    Ok(devices)
                }
                Err(err) => {
                    warn!(error = %err, "Device enumeration failed");
                    Err(err)
                }
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for DeviceEnumerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceEnumerator").finish_non_exhaustive()
    }
}
