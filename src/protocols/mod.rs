// SPDX-License-Identifier: GPL-3.0-only
//! Brightness backends the controller coordinates
//!
//! Each backend is a trait so the controller can be driven by the DDC/CI,
//! sysfs backlight and power-mode implementations in this module, or by any
//! other implementation with the same contract.

pub mod backlight;
pub mod ddc_ci;
pub mod power;

use std::sync::Arc;

use anyhow::Result;

use crate::controller::CapabilityInfo;
use crate::monitor::MonitorHandles;

pub use power::CancelToken;

/// Callback invoked with a brightness level (0-100)
pub type LevelCallback = Arc<dyn Fn(i32) + Send + Sync>;

/// Enumerates the physical monitors currently attached
pub trait MonitorHandleSource: Send + Sync {
    /// Opaque per-monitor handle, valid until released
    type Handle;

    /// List every attached monitor. The first handle is the reference monitor.
    fn enumerate(&self) -> Result<Vec<Self::Handle>>;

    /// Give a handle back. Dropping it is enough for most sources.
    fn release(&self, handle: Self::Handle) {
        drop(handle);
    }

    /// Enumerate into a guard that releases every handle when it goes out of scope
    fn acquire(&self) -> Result<MonitorHandles<'_, Self>>
    where
        Self: Sized,
    {
        Ok(MonitorHandles::new(self, self.enumerate()?))
    }
}

/// Direct per-monitor brightness protocol
pub trait HardwareBrightnessChannel<H>: Send + Sync {
    /// Read the raw {minimum, current, maximum} reported by the monitor
    fn query(&self, handle: &mut H) -> Result<CapabilityInfo>;

    /// Write a brightness level to the monitor
    fn write(&self, handle: &mut H, level: i32) -> Result<()>;
}

/// Driver/firmware-level brightness path with change notifications
pub trait SoftwareBrightnessBackend: Send + Sync {
    /// Resource held for as long as notifications should be delivered.
    /// Dropping it ends the subscription.
    type Subscription: Send;

    /// Get the current brightness (0-100)
    fn read(&self) -> Result<i32>;

    /// Set the brightness (0-100)
    fn write(&self, level: i32) -> Result<()>;

    /// Deliver every brightness change to `on_change`, from any thread
    fn subscribe(&self, on_change: LevelCallback) -> Result<Self::Subscription>;
}

/// One-shot request to put the screen into its low-power state
pub trait ScreenPowerSignal: Send + Sync {
    /// Send the request. Long-running implementations should stop early
    /// once `cancel` is cancelled; nobody is waiting for them anymore.
    fn send(&self, cancel: &CancelToken) -> Result<()>;
}
