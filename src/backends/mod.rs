// SPDX-License-Identifier: MPL-2.0

//! Backend abstraction layer for camera capture
//!
//! - [`camera`]: V4L2 device enumeration and frame capture

pub mod camera;
