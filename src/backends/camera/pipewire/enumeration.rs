// SPDX-License-Identifier: GPL-3.0-only

//! PipeWire camera enumeration
//!
//! Nodes are discovered by parsing `pw-cli ls Node`. Video sources become
//! video input descriptors, audio sources are listed as audio inputs so the
//! selection list can filter them out like any other host would.

use super::super::types::{CameraNode, DeviceDescriptor, DeviceKind, FacingMode};
use crate::errors::{MediaError, MediaResult};
use std::collections::HashMap;
use tracing::debug;

/// One `id N, type PipeWire:Interface:Node/3` block of pw-cli output
#[derive(Debug, Default)]
struct NodeBlock {
    id: String,
    properties: HashMap<String, String>,
}

impl NodeBlock {
    fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    fn into_camera_node(self) -> Option<CameraNode> {
        let kind = match self.property("media.class")? {
            "Video/Source" => DeviceKind::VideoInput,
            "Audio/Source" => DeviceKind::AudioInput,
            _ => return None,
        };

        // pipewiresrc target-object wants the serial; older daemons only have the id
        let device_id = match self.property("object.serial") {
            Some(serial) => format!("pipewire-serial-{}", serial),
            None => format!("pipewire-{}", self.id),
        };

        let label = self
            .property("node.description")
            .or_else(|| self.property("node.nick"))
            .or_else(|| self.property("node.name"))
            .unwrap_or_default()
            .to_string();

        let mut descriptor = DeviceDescriptor::new(device_id, kind, label);
        descriptor.group_id = self.property("device.id").map(str::to_string);

        let facing = self
            .property("api.libcamera.location")
            .and_then(FacingMode::from_location);

        debug!(id = %self.id, device = %descriptor.id, kind = %kind, ?facing, "Found PipeWire node");
        Some(CameraNode { descriptor, facing })
    }
}

/// Extract quoted value from a property line (e.g., 'property = "value"' -> "value")
fn extract_quoted_value(line: &str) -> Option<String> {
    let start = line.find('"')?;
    let end = line[start + 1..].find('"')?;
    Some(line[start + 1..start + 1 + end].to_string())
}

/// Parse `pw-cli ls Node` output into camera nodes, in listing order
pub fn parse_pw_cli_nodes(output: &str) -> Vec<CameraNode> {
    let mut blocks = Vec::new();
    let mut current: Option<NodeBlock> = None;

    for line in output.lines() {
        let trimmed = line.trim();

        // Format: "id 76, type PipeWire:Interface:Node/3"
        if let Some(rest) = trimmed.strip_prefix("id ")
            && trimmed.contains("type PipeWire:Interface:Node")
        {
            if let Some(block) = current.take() {
                blocks.push(block);
            }
            let id = rest.split(',').next().unwrap_or_default().trim();
            current = Some(NodeBlock {
                id: id.to_string(),
                ..Default::default()
            });
            continue;
        }

        // Format: key = "value"
        if let Some(block) = current.as_mut()
            && let Some((key, _)) = trimmed.split_once('=')
            && let Some(value) = extract_quoted_value(trimmed)
        {
            // pw-cli marks changed properties with a leading '*'
            let key = key.trim().trim_start_matches('*').trim();
            block.properties.insert(key.to_string(), value);
        }
    }

    if let Some(block) = current {
        blocks.push(block);
    }

    blocks
        .into_iter()
        .filter_map(NodeBlock::into_camera_node)
        .collect()
}

/// Enumerate PipeWire sources with `pw-cli`
pub fn enumerate_pipewire_nodes() -> MediaResult<Vec<CameraNode>> {
    debug!("Enumerating cameras via pw-cli");

    let output = std::process::Command::new("pw-cli")
        .args(["ls", "Node"])
        .output()
        .map_err(|e| MediaError::HardwareUnavailable(format!("pw-cli not available: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::HardwareUnavailable(format!(
            "pw-cli failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    let nodes = parse_pw_cli_nodes(&String::from_utf8_lossy(&output.stdout));
    debug!(count = nodes.len(), "Enumerated PipeWire nodes");
    Ok(nodes)
}
