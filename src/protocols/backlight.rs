// SPDX-License-Identifier: GPL-3.0-only
//! Backlight (sysfs) software brightness backend
//!
//! Reads `/sys/class/backlight/<device>`, writes through systemd-logind's
//! `Session.SetBrightness` so no extra permissions are needed, and falls back
//! to writing the sysfs file directly. Changes are observed through udev.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use anyhow::{Context, Result, anyhow, bail};

use super::{LevelCallback, SoftwareBrightnessBackend};
use crate::notify::udev_monitor::UdevMonitor;

pub const BACKLIGHT_DIR: &str = "/sys/class/backlight";

#[cfg(feature = "logind")]
/// systemd-logind session proxy
#[zbus::proxy(
    interface = "org.freedesktop.login1.Session",
    default_service = "org.freedesktop.login1",
    default_path = "/org/freedesktop/login1/session/auto",
    gen_async = false
)]
trait Session {
    fn set_brightness(&self, subsystem: &str, name: &str, brightness: u32) -> zbus::Result<()>;
}

/// One device directory under the backlight class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BacklightDevice {
    dir: PathBuf,
    name: String,
}

impl BacklightDevice {
    /// Find `name` under `root`, or the first device in sorted order
    pub fn discover(root: &Path, name: Option<&str>) -> Option<Self> {
        if let Some(name) = name {
            let dir = root.join(name);
            return dir.join("max_brightness").exists().then(|| Self {
                dir,
                name: name.to_string(),
            });
        }

        let mut devices: Vec<_> = fs::read_dir(root)
            .ok()?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.join("max_brightness").exists())
            .collect();
        // Sort for deterministic selection
        devices.sort();

        let dir = devices.into_iter().next()?;
        let name = dir.file_name()?.to_str()?.to_string();
        Some(Self { dir, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn read_value(&self, file: &str) -> Result<u32> {
        let path = self.dir.join(file);
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        text.trim()
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn max(&self) -> Result<u32> {
        let max = self.read_value("max_brightness")?;
        if max == 0 {
            bail!("Backlight {} reports max_brightness 0", self.name);
        }
        Ok(max)
    }

    /// Current brightness as a truncated percentage, at most 100
    pub fn percent(&self) -> Result<i32> {
        let max = self.max()?;
        let raw = if self.dir.join("actual_brightness").exists() {
            self.read_value("actual_brightness")?
        } else {
            self.read_value("brightness")?
        };
        let percent = (u64::from(raw) * 100 / u64::from(max)).min(100);
        Ok(percent as i32)
    }

    /// Device units for a percentage
    pub fn raw_for_percent(&self, level: i32) -> Result<u32> {
        if !(0..=100).contains(&level) {
            bail!("Backlight level {} is outside 0-100", level);
        }
        let max = self.max()?;
        Ok((u64::from(max) * level as u64 / 100) as u32)
    }

    fn write_sysfs(&self, raw: u32) -> Result<()> {
        let path = self.dir.join("brightness");
        fs::write(&path, raw.to_string())
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    #[cfg(feature = "logind")]
    fn write_logind(&self, raw: u32) -> zbus::Result<()> {
        let connection = zbus::blocking::Connection::system()?;
        let proxy = SessionProxy::new(&connection)?;
        proxy.set_brightness("backlight", &self.name, raw)
    }

    fn write_raw(&self, raw: u32) -> Result<()> {
        #[cfg(feature = "logind")]
        {
            match self.write_logind(raw) {
                Ok(()) => return Ok(()),
                Err(err) => debug!(
                    "logind SetBrightness failed for {}: {}, writing sysfs directly",
                    self.name, err
                ),
            }
        }

        self.write_sysfs(raw)
    }
}

/// Sysfs backlight backend; absent when no backlight device exists
#[derive(Debug, Clone)]
pub struct BacklightBackend {
    device: Option<BacklightDevice>,
}

impl BacklightBackend {
    /// Use the named device, or the first one found
    pub fn new(name: Option<&str>) -> Self {
        Self::with_root(Path::new(BACKLIGHT_DIR), name)
    }

    pub fn with_root(root: &Path, name: Option<&str>) -> Self {
        let device = BacklightDevice::discover(root, name);
        match (&device, name) {
            (Some(device), _) => info!("Using backlight device {}", device.name()),
            (None, Some(name)) => warn!("Backlight device {} not found", name),
            (None, None) => info!("No backlight device found, software backend disabled"),
        }
        Self { device }
    }

    pub fn device(&self) -> Option<&BacklightDevice> {
        self.device.as_ref()
    }
}

impl SoftwareBrightnessBackend for BacklightBackend {
    type Subscription = BacklightSubscription;

    fn read(&self) -> Result<i32> {
        self.device
            .as_ref()
            .ok_or_else(|| anyhow!("No backlight device"))?
            .percent()
    }

    fn write(&self, level: i32) -> Result<()> {
        let Some(device) = &self.device else {
            debug!("No backlight device, skipping software write of {}", level);
            return Ok(());
        };

        let raw = device.raw_for_percent(level)?;
        debug!("Setting backlight {} to {} ({}%)", device.name(), raw, level);
        device.write_raw(raw)
    }

    fn subscribe(&self, on_change: LevelCallback) -> Result<BacklightSubscription> {
        let Some(device) = self.device.clone() else {
            return Ok(BacklightSubscription::inert());
        };

        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel(1);

        let thread = {
            let stop = stop.clone();
            std::thread::Builder::new()
                .name("backlight-monitor".to_string())
                .spawn(move || {
                    // MonitorSocket is not Send, so it is created on this thread
                    let monitor = match UdevMonitor::new("backlight") {
                        Ok(monitor) => {
                            let _ = ready_tx.send(Ok(()));
                            monitor
                        }
                        Err(err) => {
                            let _ = ready_tx.send(Err(err));
                            return;
                        }
                    };

                    let name = OsStr::new(device.name());
                    monitor.run(&stop, |event| {
                        if event.sysname() != name {
                            return;
                        }
                        match device.percent() {
                            Ok(level) => on_change(level),
                            Err(err) => warn!("Failed to read changed backlight: {:#}", err),
                        }
                    });
                })
                .context("Failed to spawn backlight monitor thread")?
        };

        ready_rx
            .recv()
            .context("Backlight monitor thread exited early")?
            .context("Failed to listen for backlight udev events")?;

        Ok(BacklightSubscription {
            stop,
            thread: Some(thread),
        })
    }
}

/// Running backlight change monitor; dropping it stops the monitor thread
pub struct BacklightSubscription {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl BacklightSubscription {
    fn inert() -> Self {
        Self {
            stop: Arc::new(AtomicBool::new(true)),
            thread: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.thread.is_some()
    }
}

impl Drop for BacklightSubscription {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            // Dropped from inside a change callback: the loop exits on its own
            if thread.thread().id() == std::thread::current().id() {
                return;
            }
            if thread.join().is_err() {
                warn!("Backlight monitor thread panicked");
            }
        }
    }
}
