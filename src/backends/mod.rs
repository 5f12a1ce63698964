// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! - [`camera`]: media host trait, device enumeration and capture pipelines

pub mod camera;
