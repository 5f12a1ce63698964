// SPDX-License-Identifier: MPL-2.0

//! PipeWire camera backend
//!
//! Enumeration goes through `pw-cli`; capture uses `pipewiresrc` with the
//! node's serial as `target-object`.

mod enumeration;

pub use enumeration::{enumerate_pipewire_nodes, parse_pw_cli_nodes};

/// Map a PipeWire device id to the `target-object` value of `pipewiresrc`.
///
/// pipewiresrc target-object expects a serial number or node name, not the
/// descriptor id this crate hands out.
pub fn target_object(device_id: &str) -> Option<&str> {
    device_id
        .strip_prefix("pipewire-serial-")
        .or_else(|| device_id.strip_prefix("pipewire-"))
        .filter(|target| !target.is_empty())
}
