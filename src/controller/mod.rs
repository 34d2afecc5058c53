// SPDX-License-Identifier: GPL-3.0-only
//! Unified brightness controller
//!
//! Merges the hardware channel (DDC/CI) and the software backend (backlight)
//! into one 0-100 value space.
//!
//! # Behavior
//!
//! - Capabilities are resolved once, at construction, from the first
//!   enumerated monitor and never re-resolved.
//! - Writes fan out to every monitor enumerated at the time of the call,
//!   then to the software backend.
//! - Software backend change notifications are relayed verbatim to the
//!   controller's subscribers.
//! - Failures never escape the legacy surface: capabilities degrade to zero,
//!   writes return `false`, the screen-off command returns nothing. The
//!   `try_*` methods expose the underlying errors.
//!
//! # Usage
//!
//! ```no_run
//! use brightness_control::config::Config;
//! use brightness_control::controller::SystemBrightnessController;
//!
//! let controller = SystemBrightnessController::system(&Config::default());
//! let levels = controller.default_levels();
//! if !controller.set_brightness(levels[levels.len() / 2]) {
//!     eprintln!("brightness was only partially applied");
//! }
//! ```

mod capabilities;
mod levels;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::oneshot;

use crate::config::{Config, PowerOffMethod};
use crate::error::{LevelsError, WriteError};
use crate::notify::{SubscriberId, SubscriberRegistry};
use crate::protocols::backlight::BacklightBackend;
use crate::protocols::ddc_ci::{DdcBrightnessChannel, DdcMonitorSource};
use crate::protocols::power::{CommandPowerSignal, DdcPowerSignal};
use crate::protocols::{
    CancelToken, HardwareBrightnessChannel, LevelCallback, MonitorHandleSource, ScreenPowerSignal,
    SoftwareBrightnessBackend,
};

pub use capabilities::{CapabilityInfo, MAXIMUM_PERCENT, MINIMUM_PERCENT, resolve_capabilities};
pub use levels::{DEFAULT_LEVEL_COUNT, PRESET_LEVELS};

/// Default bounded wait of [`BrightnessController::turn_off`]
pub const DEFAULT_TURN_OFF_TIMEOUT: Duration = Duration::from_millis(500);

/// How a screen-off request ended
#[derive(Debug)]
pub enum TurnOffOutcome {
    /// The power-down request was sent before the timeout
    Completed,
    /// The request failed before the timeout
    Failed(anyhow::Error),
    /// The timeout expired; the request was cancelled and abandoned
    TimedOut,
}

/// Controller over the DDC/CI channel and the sysfs backlight
pub type SystemBrightnessController =
    BrightnessController<DdcMonitorSource, DdcBrightnessChannel, BacklightBackend>;

pub struct BrightnessController<S, C, B: SoftwareBrightnessBackend> {
    source: S,
    channel: C,
    software: B,
    power: Arc<dyn ScreenPowerSignal>,
    capabilities: CapabilityInfo,
    subscribers: Arc<SubscriberRegistry>,
    subscription: Mutex<Option<B::Subscription>>,
    turn_off_timeout: Duration,
}

impl SystemBrightnessController {
    /// Build the controller from the DDC/CI, backlight and power-off
    /// implementations selected by `config`
    pub fn system(config: &Config) -> Self {
        let source = if config.hardware {
            DdcMonitorSource::new()
        } else {
            info!("DDC/CI hardware channel disabled by configuration");
            DdcMonitorSource::disabled()
        };

        let power: Arc<dyn ScreenPowerSignal> = match config.power_off {
            PowerOffMethod::Ddc => Arc::new(DdcPowerSignal::new(source.clone())),
            PowerOffMethod::Command => {
                Arc::new(CommandPowerSignal::new(config.power_off_command.clone()))
            }
        };

        Self::from_parts(
            source,
            DdcBrightnessChannel,
            BacklightBackend::new(config.backlight_device.as_deref()),
            power,
            config.turn_off_timeout(),
        )
    }

    /// Controller with the default configuration
    pub fn new() -> Self {
        Self::system(&Config::default())
    }
}

impl Default for SystemBrightnessController {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C, B> BrightnessController<S, C, B>
where
    S: MonitorHandleSource,
    C: HardwareBrightnessChannel<S::Handle>,
    B: SoftwareBrightnessBackend,
{
    /// Resolve capabilities and subscribe to the software backend
    ///
    /// Never fails: a failed resolution leaves zeroed capabilities and a
    /// failed subscription leaves the relay silent. Both are logged.
    pub fn from_parts(
        source: S,
        channel: C,
        software: B,
        power: Arc<dyn ScreenPowerSignal>,
        turn_off_timeout: Duration,
    ) -> Self {
        let subscribers = Arc::new(SubscriberRegistry::new());

        let relay: LevelCallback = {
            let subscribers = subscribers.clone();
            Arc::new(move |level| subscribers.emit(level))
        };
        let subscription = match software.subscribe(relay) {
            Ok(subscription) => Some(subscription),
            Err(err) => {
                warn!("Brightness change notifications unavailable: {:#}", err);
                None
            }
        };

        let capabilities = match resolve_capabilities(&source, &channel) {
            Ok(capabilities) => {
                info!("Resolved monitor brightness capabilities: {:?}", capabilities);
                capabilities
            }
            Err(err) => {
                warn!("Failed to resolve monitor capabilities: {:#}", err);
                CapabilityInfo::default()
            }
        };

        Self {
            source,
            channel,
            software,
            power,
            capabilities,
            subscribers,
            subscription: Mutex::new(subscription),
            turn_off_timeout,
        }
    }

    /// Capabilities cached at construction
    pub fn capabilities(&self) -> CapabilityInfo {
        self.capabilities
    }

    /// Current brightness (0-100)
    ///
    /// Uses the hardware level cached at construction and falls back to the
    /// software backend when that level is not positive. The cached level
    /// goes stale when brightness changes elsewhere; subscribe to changes
    /// instead of polling this.
    pub fn current_value(&self) -> i32 {
        self.value_from(self.capabilities.current)
    }

    /// Current brightness (0-100), re-querying the reference monitor first
    pub fn live_value(&self) -> i32 {
        let current = match resolve_capabilities(&self.source, &self.channel) {
            Ok(capabilities) => capabilities.current,
            Err(err) => {
                debug!("Live hardware query failed: {:#}", err);
                0
            }
        };
        self.value_from(current)
    }

    fn value_from(&self, hardware: i32) -> i32 {
        let value = if hardware > 0 {
            hardware
        } else {
            match self.software.read() {
                Ok(value) => value,
                Err(err) => {
                    warn!("Failed to read brightness from software backend: {:#}", err);
                    0
                }
            }
        };
        value.clamp(MINIMUM_PERCENT, MAXIMUM_PERCENT)
    }

    /// Write `target` to every attached monitor, then to the software backend
    ///
    /// Stops at the first failure. Monitors written before it keep the new
    /// level; nothing is retried or rolled back.
    pub fn try_set_brightness(&self, target: i32) -> Result<(), WriteError> {
        {
            let mut monitors = self.source.acquire().map_err(WriteError::Enumerate)?;
            for (index, monitor) in monitors.iter_mut().enumerate() {
                self.channel
                    .write(monitor, target)
                    .map_err(|source| WriteError::Monitor { index, source })?;
            }
            debug!("Set {} monitor(s) to {}", monitors.len(), target);
        }

        self.software.write(target).map_err(WriteError::Software)
    }

    /// Returns `true` when every hardware write and the software write succeeded
    pub fn set_brightness(&self, target: i32) -> bool {
        match self.try_set_brightness(target) {
            Ok(()) => true,
            Err(err) => {
                warn!("Failed to set brightness to {}: {:#}", target, err);
                false
            }
        }
    }

    /// Presets {0, 10, 30, 60, 100} within the capability bounds
    pub fn default_levels(&self) -> Vec<i32> {
        levels::default_levels(&self.capabilities)
    }

    /// `count` evenly spaced levels over the capability bounds (truncating step)
    pub fn generated_levels(&self, count: usize) -> Result<Vec<i32>, LevelsError> {
        levels::generated_levels(&self.capabilities, count)
    }

    /// Register a change callback. It runs on the backend's notification thread.
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(i32) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Request the screen power-down and wait at most the configured timeout
    ///
    /// The request runs on its own thread. On timeout it is cancelled and
    /// abandoned, not killed.
    pub async fn try_turn_off(&self) -> TurnOffOutcome {
        let cancel = CancelToken::new();
        let (tx, rx) = oneshot::channel();

        let spawned = {
            let power = self.power.clone();
            let cancel = cancel.clone();
            std::thread::Builder::new()
                .name("screen-power-off".to_string())
                .spawn(move || {
                    let _ = tx.send(power.send(&cancel));
                })
        };
        if let Err(err) = spawned {
            return TurnOffOutcome::Failed(err.into());
        }

        match tokio::time::timeout(self.turn_off_timeout, rx).await {
            Ok(Ok(Ok(()))) => TurnOffOutcome::Completed,
            Ok(Ok(Err(err))) => TurnOffOutcome::Failed(err),
            Ok(Err(_)) => TurnOffOutcome::Failed(anyhow!("Power-off thread exited without a result")),
            Err(_) => {
                cancel.cancel();
                TurnOffOutcome::TimedOut
            }
        }
    }

    /// Best-effort screen power-down; returns within the configured timeout
    pub async fn turn_off(&self) {
        match self.try_turn_off().await {
            TurnOffOutcome::Completed => debug!("Screen power-down requested"),
            TurnOffOutcome::Failed(err) => warn!("Screen power-down failed: {:#}", err),
            TurnOffOutcome::TimedOut => debug!(
                "Screen power-down still running after {:?}, abandoned",
                self.turn_off_timeout
            ),
        }
    }
}

impl<S, C, B: SoftwareBrightnessBackend> BrightnessController<S, C, B> {
    /// Release the software backend subscription. Later calls do nothing.
    pub fn dispose(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(subscription) = subscription {
            drop(subscription);
            debug!("Software backend subscription released");
        }
    }
}

impl<S, C, B: SoftwareBrightnessBackend> Drop for BrightnessController<S, C, B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Instant;

    use anyhow::{Result, bail};

    use super::*;

    struct FakeMonitor {
        index: usize,
        current: i32,
    }

    #[derive(Default)]
    struct FakeSource {
        levels: Vec<i32>,
        fail_enumerate: bool,
        released: Arc<AtomicUsize>,
    }

    impl FakeSource {
        fn with_levels(levels: &[i32]) -> Self {
            Self {
                levels: levels.to_vec(),
                ..Default::default()
            }
        }
    }

    impl MonitorHandleSource for FakeSource {
        type Handle = FakeMonitor;

        fn enumerate(&self) -> Result<Vec<FakeMonitor>> {
            if self.fail_enumerate {
                bail!("enumeration failed");
            }
            Ok(self
                .levels
                .iter()
                .enumerate()
                .map(|(index, &current)| FakeMonitor { index, current })
                .collect())
        }

        fn release(&self, _handle: FakeMonitor) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeChannel {
        fail_query: bool,
        fail_write_on: Option<usize>,
        writes: Arc<Mutex<Vec<(usize, i32)>>>,
    }

    impl HardwareBrightnessChannel<FakeMonitor> for FakeChannel {
        fn query(&self, handle: &mut FakeMonitor) -> Result<CapabilityInfo> {
            if self.fail_query {
                bail!("query not supported");
            }
            Ok(CapabilityInfo {
                minimum: 20,
                current: handle.current,
                maximum: 255,
            })
        }

        fn write(&self, handle: &mut FakeMonitor, level: i32) -> Result<()> {
            if self.fail_write_on == Some(handle.index) {
                bail!("monitor {} rejected the write", handle.index);
            }
            self.writes.lock().unwrap().push((handle.index, level));
            Ok(())
        }
    }

    struct FakeSubscription(Arc<AtomicUsize>);

    impl Drop for FakeSubscription {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeSoftware {
        level: Option<i32>,
        fail_write: bool,
        fail_subscribe: bool,
        writes: Arc<Mutex<Vec<i32>>>,
        callback: Arc<Mutex<Option<LevelCallback>>>,
        disposed: Arc<AtomicUsize>,
    }

    impl FakeSoftware {
        fn notify(callback: &Arc<Mutex<Option<LevelCallback>>>, level: i32) {
            let callback = callback.lock().unwrap().clone().unwrap();
            callback(level);
        }
    }

    impl SoftwareBrightnessBackend for FakeSoftware {
        type Subscription = FakeSubscription;

        fn read(&self) -> Result<i32> {
            match self.level {
                Some(level) => Ok(level),
                None => bail!("no backlight"),
            }
        }

        fn write(&self, level: i32) -> Result<()> {
            if self.fail_write {
                bail!("write rejected");
            }
            self.writes.lock().unwrap().push(level);
            Ok(())
        }

        fn subscribe(&self, on_change: LevelCallback) -> Result<FakeSubscription> {
            if self.fail_subscribe {
                bail!("subscription rejected");
            }
            *self.callback.lock().unwrap() = Some(on_change);
            Ok(FakeSubscription(self.disposed.clone()))
        }
    }

    struct FakePower {
        delay: Duration,
        fail: bool,
        saw_cancel: Arc<AtomicBool>,
    }

    impl FakePower {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                fail: false,
                saw_cancel: Arc::new(AtomicBool::new(false)),
            }
        }
    }

    impl ScreenPowerSignal for FakePower {
        fn send(&self, cancel: &CancelToken) -> Result<()> {
            let started = Instant::now();
            while started.elapsed() < self.delay {
                if cancel.is_cancelled() {
                    self.saw_cancel.store(true, Ordering::SeqCst);
                    return Ok(());
                }
                std::thread::sleep(Duration::from_millis(5));
            }
            if self.fail {
                bail!("message not delivered");
            }
            Ok(())
        }
    }

    type FakeController = BrightnessController<FakeSource, FakeChannel, FakeSoftware>;

    fn controller(source: FakeSource, channel: FakeChannel, software: FakeSoftware) -> FakeController {
        BrightnessController::from_parts(
            source,
            channel,
            software,
            Arc::new(FakePower::new(Duration::ZERO)),
            DEFAULT_TURN_OFF_TIMEOUT,
        )
    }

    fn controller_with_power(power: FakePower, timeout: Duration) -> FakeController {
        BrightnessController::from_parts(
            FakeSource::with_levels(&[50]),
            FakeChannel::default(),
            FakeSoftware::default(),
            Arc::new(power),
            timeout,
        )
    }

    #[test]
    fn test_capabilities_normalized() {
        let controller = controller(
            FakeSource::with_levels(&[70, 10]),
            FakeChannel::default(),
            FakeSoftware::default(),
        );

        assert_eq!(
            controller.capabilities(),
            CapabilityInfo {
                minimum: 0,
                current: 70,
                maximum: 100,
            }
        );
    }

    #[test]
    fn test_capabilities_degenerate_on_failure() {
        let failing_enumeration = FakeSource {
            fail_enumerate: true,
            ..FakeSource::with_levels(&[70])
        };
        let failing_query = FakeChannel {
            fail_query: true,
            ..Default::default()
        };

        let cases = [
            controller(failing_enumeration, FakeChannel::default(), FakeSoftware::default()),
            controller(FakeSource::default(), FakeChannel::default(), FakeSoftware::default()),
            controller(FakeSource::with_levels(&[70]), failing_query, FakeSoftware::default()),
        ];

        for controller in &cases {
            assert!(controller.capabilities().is_degenerate());
        }
    }

    #[test]
    fn test_capability_handles_released() {
        let source = FakeSource::with_levels(&[70, 10, 5]);
        let released = source.released.clone();

        let _controller = controller(source, FakeChannel::default(), FakeSoftware::default());

        assert_eq!(released.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_current_value_from_hardware() {
        let software = FakeSoftware {
            level: Some(10),
            ..Default::default()
        };
        let controller = controller(FakeSource::with_levels(&[70]), FakeChannel::default(), software);

        assert_eq!(controller.current_value(), 70);
    }

    #[test]
    fn test_current_value_clamped() {
        let controller = controller(
            FakeSource::with_levels(&[180]),
            FakeChannel::default(),
            FakeSoftware::default(),
        );

        assert_eq!(controller.capabilities().current, 180);
        assert_eq!(controller.current_value(), 100);
    }

    #[test]
    fn test_current_value_falls_back_to_software() {
        let software = FakeSoftware {
            level: Some(35),
            ..Default::default()
        };
        let zero_hardware = controller(FakeSource::with_levels(&[0]), FakeChannel::default(), software);
        assert_eq!(zero_hardware.current_value(), 35);

        let software = FakeSoftware {
            level: Some(35),
            ..Default::default()
        };
        let no_hardware = controller(FakeSource::default(), FakeChannel::default(), software);
        assert_eq!(no_hardware.current_value(), 35);
    }

    #[test]
    fn test_current_value_software_out_of_range() {
        let software = FakeSoftware {
            level: Some(-20),
            ..Default::default()
        };
        let controller = controller(FakeSource::default(), FakeChannel::default(), software);

        assert_eq!(controller.current_value(), 0);
    }

    #[test]
    fn test_current_value_without_any_backend() {
        let controller = controller(
            FakeSource::default(),
            FakeChannel::default(),
            FakeSoftware::default(),
        );

        assert_eq!(controller.current_value(), 0);
    }

    #[test]
    fn test_levels_follow_capabilities() {
        let resolved = controller(
            FakeSource::with_levels(&[50]),
            FakeChannel::default(),
            FakeSoftware::default(),
        );
        assert_eq!(resolved.default_levels(), vec![0, 10, 30, 60, 100]);
        assert_eq!(
            resolved.generated_levels(6).unwrap(),
            vec![0, 20, 40, 60, 80, 100]
        );
        assert_eq!(resolved.generated_levels(4).unwrap(), vec![0, 33, 66, 99]);
        assert_eq!(
            resolved.generated_levels(1),
            Err(LevelsError::TooFewLevels { count: 1 })
        );

        let degenerate = controller(
            FakeSource::default(),
            FakeChannel::default(),
            FakeSoftware::default(),
        );
        assert_eq!(degenerate.default_levels(), vec![0]);
    }

    #[test]
    fn test_set_brightness_fans_out() {
        let channel = FakeChannel::default();
        let hardware_writes = channel.writes.clone();
        let software = FakeSoftware::default();
        let software_writes = software.writes.clone();
        let controller = controller(FakeSource::with_levels(&[50, 20, 90]), channel, software);

        assert!(controller.set_brightness(60));

        assert_eq!(*hardware_writes.lock().unwrap(), vec![(0, 60), (1, 60), (2, 60)]);
        assert_eq!(*software_writes.lock().unwrap(), vec![60]);
    }

    #[test]
    fn test_set_brightness_stops_at_failing_monitor() {
        let source = FakeSource::with_levels(&[50, 20, 90]);
        let released = source.released.clone();
        let channel = FakeChannel {
            fail_write_on: Some(1),
            ..Default::default()
        };
        let hardware_writes = channel.writes.clone();
        let software = FakeSoftware::default();
        let software_writes = software.writes.clone();
        let controller = controller(source, channel, software);
        released.store(0, Ordering::SeqCst);

        assert!(!controller.set_brightness(30));

        // Monitor 0 keeps the new level; no retry, no software write
        assert_eq!(*hardware_writes.lock().unwrap(), vec![(0, 30)]);
        assert!(software_writes.lock().unwrap().is_empty());
        assert_eq!(released.load(Ordering::SeqCst), 3);

        assert!(matches!(
            controller.try_set_brightness(30),
            Err(WriteError::Monitor { index: 1, .. })
        ));
    }

    #[test]
    fn test_set_brightness_software_failure() {
        let channel = FakeChannel::default();
        let hardware_writes = channel.writes.clone();
        let software = FakeSoftware {
            fail_write: true,
            ..Default::default()
        };
        let controller = controller(FakeSource::with_levels(&[50, 20]), channel, software);

        assert!(!controller.set_brightness(80));
        assert_eq!(hardware_writes.lock().unwrap().len(), 2);
        assert!(matches!(
            controller.try_set_brightness(80),
            Err(WriteError::Software(_))
        ));
    }

    #[test]
    fn test_set_brightness_enumeration_failure() {
        let source = FakeSource {
            fail_enumerate: true,
            ..FakeSource::with_levels(&[50])
        };
        let software = FakeSoftware::default();
        let software_writes = software.writes.clone();
        let controller = controller(source, FakeChannel::default(), software);

        assert!(!controller.set_brightness(80));
        assert!(software_writes.lock().unwrap().is_empty());
    }

    #[test]
    fn test_set_brightness_without_monitors() {
        let software = FakeSoftware::default();
        let software_writes = software.writes.clone();
        let controller = controller(FakeSource::default(), FakeChannel::default(), software);

        assert!(controller.set_brightness(45));
        assert_eq!(*software_writes.lock().unwrap(), vec![45]);
    }

    #[test]
    fn test_relay_in_registration_order() {
        let software = FakeSoftware::default();
        let callback = software.callback.clone();
        let controller = controller(FakeSource::with_levels(&[50]), FakeChannel::default(), software);

        let received = Arc::new(Mutex::new(Vec::new()));
        let first = {
            let received = received.clone();
            controller.subscribe(move |level| received.lock().unwrap().push(("first", level)))
        };
        {
            let received = received.clone();
            controller.subscribe(move |level| received.lock().unwrap().push(("second", level)));
        }

        FakeSoftware::notify(&callback, 42);
        assert!(controller.unsubscribe(first));
        FakeSoftware::notify(&callback, 42);

        assert_eq!(
            *received.lock().unwrap(),
            vec![("first", 42), ("second", 42), ("second", 42)]
        );
    }

    #[test]
    fn test_relay_from_another_thread() {
        let software = FakeSoftware::default();
        let callback = software.callback.clone();
        let controller = controller(FakeSource::with_levels(&[50]), FakeChannel::default(), software);

        let received = Arc::new(Mutex::new(Vec::new()));
        {
            let received = received.clone();
            controller.subscribe(move |level| received.lock().unwrap().push(level));
        }

        std::thread::spawn(move || FakeSoftware::notify(&callback, 15))
            .join()
            .unwrap();

        assert_eq!(*received.lock().unwrap(), vec![15]);
    }

    #[test]
    fn test_subscription_failure_not_fatal() {
        let software = FakeSoftware {
            fail_subscribe: true,
            ..Default::default()
        };
        let controller = controller(FakeSource::with_levels(&[50]), FakeChannel::default(), software);

        assert_eq!(controller.capabilities().current, 50);
        assert!(controller.set_brightness(50));
    }

    #[test]
    fn test_dispose_releases_once() {
        let software = FakeSoftware::default();
        let disposed = software.disposed.clone();
        let controller = controller(FakeSource::with_levels(&[50]), FakeChannel::default(), software);

        controller.dispose();
        controller.dispose();
        drop(controller);

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases_subscription() {
        let software = FakeSoftware::default();
        let disposed = software.disposed.clone();
        drop(controller(FakeSource::with_levels(&[50]), FakeChannel::default(), software));

        assert_eq!(disposed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_turn_off_bounded_by_timeout() {
        let power = FakePower::new(Duration::from_secs(5));
        let saw_cancel = power.saw_cancel.clone();
        let controller = controller_with_power(power, Duration::from_millis(100));

        let started = Instant::now();
        let outcome = controller.try_turn_off().await;

        assert!(matches!(outcome, TurnOffOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(2));

        // The abandoned request observes the cancellation and stops
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(saw_cancel.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_turn_off_completes() {
        let controller = controller_with_power(FakePower::new(Duration::ZERO), DEFAULT_TURN_OFF_TIMEOUT);

        assert!(matches!(
            controller.try_turn_off().await,
            TurnOffOutcome::Completed
        ));
    }

    #[tokio::test]
    async fn test_turn_off_failure_swallowed() {
        let power = FakePower {
            fail: true,
            ..FakePower::new(Duration::ZERO)
        };
        let controller = controller_with_power(power, DEFAULT_TURN_OFF_TIMEOUT);

        assert!(matches!(
            controller.try_turn_off().await,
            TurnOffOutcome::Failed(_)
        ));

        let started = Instant::now();
        controller.turn_off().await;
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
