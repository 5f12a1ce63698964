// SPDX-License-Identifier: GPL-3.0-only

//! Non-interactive CLI commands

use camera_preview::Config;
use camera_preview::backends::camera::{DeviceEnumerator, GstCameraHost};
use camera_preview::errors::AppResult;
use std::sync::Arc;

/// List all available input devices
pub fn list_devices(config: &Config, json: bool) -> AppResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let host = Arc::new(GstCameraHost::from_config(config));
    let enumerator = DeviceEnumerator::new(host);
    let devices = runtime.block_on(enumerator.list_devices())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    let cameras: Vec<_> = devices.iter().filter(|d| d.is_video()).collect();
    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras ({}):", config.backend);
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.display_label());
        println!("      {}", camera.detail());
        if let Some(group) = camera.group_id.as_deref() {
            println!("      Group: {}", group);
        }
    }

    let others = devices.len() - cameras.len();
    if others > 0 {
        println!();
        println!("  ({} non-camera device(s) hidden, use --json to see all)", others);
    }

    Ok(())
}
