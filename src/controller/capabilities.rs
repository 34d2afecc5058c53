// SPDX-License-Identifier: GPL-3.0-only
//! Capability resolution for the reference monitor

use crate::error::ResolutionError;
use crate::protocols::{HardwareBrightnessChannel, MonitorHandleSource};

/// Lowest level of the public value space
pub const MINIMUM_PERCENT: i32 = 0;

/// Highest level of the public value space
pub const MAXIMUM_PERCENT: i32 = 100;

/// Brightness range and last observed level of a monitor
///
/// After resolution `minimum` and `maximum` are always 0 and 100, while
/// `current` is the raw value the hardware reported at that time. A failed
/// resolution leaves every field at 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilityInfo {
    pub minimum: i32,
    pub current: i32,
    pub maximum: i32,
}

impl CapabilityInfo {
    /// True for the all-zero value left by a failed resolution
    pub fn is_degenerate(&self) -> bool {
        *self == Self::default()
    }
}

/// Query the first enumerated monitor and normalize its bounds to 0-100
///
/// Every handle acquired here is released before returning, on success and
/// on failure.
pub fn resolve_capabilities<S, C>(source: &S, channel: &C) -> Result<CapabilityInfo, ResolutionError>
where
    S: MonitorHandleSource,
    C: HardwareBrightnessChannel<S::Handle>,
{
    let mut monitors = source.acquire().map_err(ResolutionError::Enumerate)?;
    let primary = monitors.primary_mut().ok_or(ResolutionError::NoMonitor)?;
    let raw = channel.query(primary).map_err(ResolutionError::Query)?;

    debug!(
        minimum = raw.minimum,
        current = raw.current,
        maximum = raw.maximum,
        "Reference monitor reported brightness range"
    );

    Ok(CapabilityInfo {
        minimum: MINIMUM_PERCENT,
        current: raw.current,
        maximum: MAXIMUM_PERCENT,
    })
}
