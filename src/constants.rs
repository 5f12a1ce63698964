// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

/// Directory name used under the XDG config and cache dirs
pub const APP_DIR_NAME: &str = "camera-preview";

/// Configuration file name inside the config dir
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Log file used while the terminal UI owns the screen
pub const LOG_FILE_NAME: &str = "camera-preview.log";

/// Label of the fixed selection entry that requests the default camera
pub const DEFAULT_ENTRY_LABEL: &str = "Default";

/// Label given to streams opened without a specific device
pub const DEFAULT_STREAM_LABEL: &str = "Default camera";

/// Capture pipeline settings
pub mod pipeline {
    /// Appsink queue depth; older frames are dropped
    pub const MAX_BUFFERS: u32 = 2;

    /// Capacity of the frame channel between appsink and video sink
    pub const FRAME_CHANNEL_CAPACITY: usize = 4;

    /// Preview size requested from the pipeline when not configured
    pub const DEFAULT_PREVIEW_WIDTH: u32 = 640;
    pub const DEFAULT_PREVIEW_HEIGHT: u32 = 480;

    /// Largest preview width or height accepted from the config
    pub const MAX_PREVIEW_DIMENSION: u32 = 8192;
}

/// Timing values
pub mod timing {
    /// Seconds to wait for a pipeline to reach PLAYING
    pub const START_TIMEOUT_SECS: u64 = 5;

    /// Seconds to wait for a pipeline to reach NULL
    pub const STOP_TIMEOUT_SECS: u64 = 2;

    /// Log frame statistics every N frames
    pub const FRAME_LOG_INTERVAL: u64 = 300;

    /// Input poll interval of the terminal UI in milliseconds
    pub const UI_POLL_MS: u64 = 16;
}
