// SPDX-License-Identifier: GPL-3.0-only
//! DDC/CI (Display Data Channel Command Interface) hardware channel
//!
//! DDC/CI is a standard protocol for controlling monitors over the I2C bus
//! of the video cable. It provides the physical monitor handles and the
//! per-monitor brightness channel.

use anyhow::{Context, Result};
use ddc_hi::{Ddc, Display};

use super::{HardwareBrightnessChannel, MonitorHandleSource};
use crate::controller::CapabilityInfo;

/// VCP (Virtual Control Panel) code for brightness
pub const BRIGHTNESS_CODE: u8 = 0x10;

/// VCP code for the display power mode
pub const POWER_MODE_CODE: u8 = 0xD6;

/// Power mode value requesting DPMS off
pub const POWER_MODE_OFF: u16 = 0x04;

/// Enumerates DDC/CI displays as physical monitor handles
#[derive(Debug, Clone)]
pub struct DdcMonitorSource {
    enabled: bool,
}

impl DdcMonitorSource {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// A source that never reports a monitor
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

impl Default for DdcMonitorSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorHandleSource for DdcMonitorSource {
    type Handle = Display;

    fn enumerate(&self) -> Result<Vec<Display>> {
        if !self.enabled {
            return Ok(Vec::new());
        }

        let displays = Display::enumerate();
        debug!("Found {} DDC/CI display(s)", displays.len());
        Ok(displays)
    }

    fn release(&self, monitor: Display) {
        trace!("Releasing DDC/CI display {}", monitor.info.id);
        drop(monitor);
    }
}

/// Brightness through VCP feature 0x10
#[derive(Debug, Clone, Copy, Default)]
pub struct DdcBrightnessChannel;

impl HardwareBrightnessChannel<Display> for DdcBrightnessChannel {
    fn query(&self, display: &mut Display) -> Result<CapabilityInfo> {
        let value = display
            .handle
            .get_vcp_feature(BRIGHTNESS_CODE)
            .with_context(|| format!("Reading brightness of {}", display.info.id))?;

        Ok(CapabilityInfo {
            minimum: 0,
            current: i32::from(value.value()),
            maximum: i32::from(value.maximum()),
        })
    }

    fn write(&self, display: &mut Display, level: i32) -> Result<()> {
        let value = vcp_value(level)?;
        display
            .handle
            .set_vcp_feature(BRIGHTNESS_CODE, value)
            .with_context(|| format!("Writing brightness {} to {}", value, display.info.id))?;
        Ok(())
    }
}

/// Convert a level into the 16-bit VCP value range
pub fn vcp_value(level: i32) -> Result<u16> {
    u16::try_from(level).with_context(|| format!("Brightness {} is outside the VCP range", level))
}

/// Ask one display to enter DPMS off
pub fn request_power_off(display: &mut Display) -> Result<()> {
    display
        .handle
        .set_vcp_feature(POWER_MODE_CODE, POWER_MODE_OFF)
        .with_context(|| format!("Setting power mode of {}", display.info.id))?;
    Ok(())
}
