// SPDX-License-Identifier: GPL-3.0-only
//! Unified display brightness control
//!
//! Coordinates a DDC/CI hardware channel and a backlight software backend
//! behind one 0-100 brightness value, with level presets, change
//! notifications and a bounded screen-off command.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod controller;
pub mod error;
pub mod monitor;
pub mod notify;
pub mod protocols;

pub use controller::{
    BrightnessController, CapabilityInfo, SystemBrightnessController, TurnOffOutcome,
};
