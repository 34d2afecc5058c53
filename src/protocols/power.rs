// SPDX-License-Identifier: GPL-3.0-only
//! Screen power-down signals

use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, anyhow, bail};

use super::ScreenPowerSignal;
use super::ddc_ci::{DdcMonitorSource, request_power_off};
use crate::protocols::MonitorHandleSource;

/// Cooperative cancellation flag shared with a background power-down
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sets the DDC/CI power mode of every attached monitor to DPMS off
#[derive(Debug, Clone, Default)]
pub struct DdcPowerSignal {
    source: DdcMonitorSource,
}

impl DdcPowerSignal {
    pub fn new(source: DdcMonitorSource) -> Self {
        Self { source }
    }
}

impl ScreenPowerSignal for DdcPowerSignal {
    fn send(&self, cancel: &CancelToken) -> Result<()> {
        let mut displays = self.source.acquire()?;
        if displays.is_empty() {
            bail!("No DDC/CI display to power off");
        }

        for monitor in displays.iter_mut() {
            if cancel.is_cancelled() {
                debug!("Power-down cancelled before {}", monitor.info.id);
                return Ok(());
            }
            request_power_off(monitor)?;
        }
        Ok(())
    }
}

/// Runs an external command such as `xset dpms force off`
#[derive(Debug, Clone)]
pub struct CommandPowerSignal {
    argv: Vec<String>,
}

impl CommandPowerSignal {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }
}

impl ScreenPowerSignal for CommandPowerSignal {
    fn send(&self, cancel: &CancelToken) -> Result<()> {
        let (program, args) = self
            .argv
            .split_first()
            .ok_or_else(|| anyhow!("Power-off command is empty"))?;

        if cancel.is_cancelled() {
            return Ok(());
        }

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .with_context(|| format!("Failed to run {}", program))?;

        if !status.success() {
            bail!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();

        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_empty_command_fails() {
        let signal = CommandPowerSignal::new(Vec::new());
        assert!(signal.send(&CancelToken::new()).is_err());
    }

    #[test]
    fn test_command_exit_status() {
        let ok = CommandPowerSignal::new(vec!["true".to_string()]);
        let failing = CommandPowerSignal::new(vec!["false".to_string()]);

        assert!(ok.send(&CancelToken::new()).is_ok());
        assert!(failing.send(&CancelToken::new()).is_err());
    }

    #[test]
    fn test_cancelled_command_not_run() {
        let token = CancelToken::new();
        token.cancel();
        let signal = CommandPowerSignal::new(vec!["false".to_string()]);

        assert!(signal.send(&token).is_ok());
    }

    #[test]
    fn test_ddc_signal_without_displays() {
        let signal = DdcPowerSignal::new(DdcMonitorSource::disabled());
        assert!(signal.send(&CancelToken::new()).is_err());
    }
}
