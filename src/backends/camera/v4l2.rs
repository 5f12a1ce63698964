// SPDX-License-Identifier: GPL-3.0-only

//! Video4Linux2 device enumeration
//!
//! Device nodes come from the `v4l` crate; each node is then queried with
//! `VIDIOC_QUERYCAP` directly so per-node `device_caps` can tell capture
//! nodes apart from the metadata nodes UVC cameras also expose.

use super::types::{CameraNode, DeviceDescriptor, DeviceKind};
use crate::errors::{MediaError, MediaResult};
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use tracing::{debug, warn};

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x0000_0001;
const V4L2_CAP_VIDEO_CAPTURE_MPLANE: u32 = 0x0000_1000;
const V4L2_CAP_DEVICE_CAPS: u32 = 0x8000_0000;

/// sysfs class directory; absent when the kernel has no V4L2 support
const V4L2_SYSFS_CLASS: &str = "/sys/class/video4linux";

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// Decoded QUERYCAP answer for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapabilities {
    pub driver: String,
    pub card: String,
    pub bus_info: String,
    /// `device_caps` when the driver reports them, else `capabilities`
    pub caps: u32,
}

impl NodeCapabilities {
    pub fn is_capture(&self) -> bool {
        self.caps & (V4L2_CAP_VIDEO_CAPTURE | V4L2_CAP_VIDEO_CAPTURE_MPLANE) != 0
    }
}

fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).trim().to_string()
}

fn query_v4l2_cap(fd: RawFd) -> std::io::Result<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 {
        Err(std::io::Error::last_os_error())
    } else {
        Ok(cap)
    }
}

/// Open a device node and query its capabilities
pub fn query_capabilities(path: &Path) -> MediaResult<NodeCapabilities> {
    let context = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| MediaError::from_io(&e, &context))?;
    let cap = query_v4l2_cap(file.as_raw_fd()).map_err(|e| MediaError::from_io(&e, &context))?;

    let caps = if cap.capabilities & V4L2_CAP_DEVICE_CAPS != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    Ok(NodeCapabilities {
        driver: c_string(&cap.driver),
        card: c_string(&cap.card),
        bus_info: c_string(&cap.bus_info),
        caps,
    })
}

/// Turn a queried node into a descriptor-bearing camera node
pub fn node_from_capabilities(
    path: &str,
    fallback_name: Option<&str>,
    caps: &NodeCapabilities,
) -> CameraNode {
    let kind = if caps.is_capture() {
        DeviceKind::VideoInput
    } else {
        DeviceKind::Unknown
    };
    let label = if caps.card.is_empty() {
        fallback_name.unwrap_or_default().to_string()
    } else {
        caps.card.clone()
    };

    let mut descriptor = DeviceDescriptor::new(path, kind, label);
    if !caps.bus_info.is_empty() {
        descriptor.group_id = Some(caps.bus_info.clone());
    }

    CameraNode::new(descriptor)
}

/// Reduce per-node query results to the enumeration answer.
///
/// Unreadable nodes are skipped, unless nothing could be read and at least
/// one node refused access, in which case enumeration itself was denied.
pub fn collect_nodes(
    subsystem_present: bool,
    queries: Vec<(String, MediaResult<CameraNode>)>,
) -> MediaResult<Vec<CameraNode>> {
    if queries.is_empty() && !subsystem_present {
        return Err(MediaError::HardwareUnavailable(
            "no video4linux subsystem".to_string(),
        ));
    }

    let mut nodes = Vec::new();
    let mut denied = None;

    for (path, query) in queries {
        match query {
            Ok(node) => nodes.push(node),
            Err(err @ MediaError::PermissionDenied(_)) => {
                warn!(path = %path, error = %err, "Skipping unreadable V4L2 node");
                denied.get_or_insert(err);
            }
            Err(err) => {
                warn!(path = %path, error = %err, "Skipping V4L2 node");
            }
        }
    }

    match (nodes.is_empty(), denied) {
        (true, Some(err)) => Err(err),
        _ => Ok(nodes),
    }
}

/// Enumerate V4L2 device nodes in index order
pub fn enumerate_v4l2_devices() -> MediaResult<Vec<CameraNode>> {
    let mut found = v4l::context::enum_devices();
    found.sort_by_key(|node| node.index());

    debug!(count = found.len(), "Probing V4L2 nodes");

    let queries = found
        .iter()
        .map(|node| {
            let path = node.path().to_string_lossy().to_string();
            let name = node.name();
            let query = query_capabilities(node.path())
                .map(|caps| node_from_capabilities(&path, name.as_deref(), &caps));
            (path, query)
        })
        .collect();

    collect_nodes(Path::new(V4L2_SYSFS_CLASS).exists(), queries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(card: &str, caps: u32) -> NodeCapabilities {
        NodeCapabilities {
            driver: "uvcvideo".to_string(),
            card: card.to_string(),
            bus_info: "usb-0000:00:14.0-5".to_string(),
            caps,
        }
    }

    #[test]
    fn metadata_nodes_are_unknown() {
        let capture = node_from_capabilities("/dev/video0", None, &caps("Webcam", 0x0400_0001));
        let metadata = node_from_capabilities("/dev/video1", None, &caps("Webcam", 0x0480_0000));

        assert_eq!(capture.descriptor.kind, DeviceKind::VideoInput);
        assert_eq!(metadata.descriptor.kind, DeviceKind::Unknown);
        assert_eq!(capture.descriptor.group_id, metadata.descriptor.group_id);
    }

    #[test]
    fn empty_card_uses_node_name() {
        let node = node_from_capabilities("/dev/video2", Some("Integrated IR"), &caps("", 1));
        assert_eq!(node.descriptor.label, "Integrated IR");
    }

    #[test]
    fn missing_subsystem_is_unavailable() {
        assert!(matches!(
            collect_nodes(false, Vec::new()),
            Err(MediaError::HardwareUnavailable(_))
        ));
        assert_eq!(collect_nodes(true, Vec::new()), Ok(Vec::new()));
    }

    #[test]
    fn all_denied_is_permission_error() {
        let queries = vec![
            (
                "/dev/video0".to_string(),
                Err(MediaError::PermissionDenied("/dev/video0".to_string())),
            ),
            (
                "/dev/video1".to_string(),
                Err(MediaError::HardwareBusy("/dev/video1".to_string())),
            ),
        ];
        assert!(matches!(
            collect_nodes(true, queries),
            Err(MediaError::PermissionDenied(_))
        ));
    }

    #[test]
    fn readable_nodes_survive_denied_ones() {
        let ok = node_from_capabilities("/dev/video2", None, &caps("USB Cam", 1));
        let queries = vec![
            (
                "/dev/video0".to_string(),
                Err(MediaError::PermissionDenied("/dev/video0".to_string())),
            ),
            ("/dev/video2".to_string(), Ok(ok.clone())),
        ];
        assert_eq!(collect_nodes(true, queries), Ok(vec![ok]));
    }
}
