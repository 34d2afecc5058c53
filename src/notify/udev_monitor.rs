use std::os::fd::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};

/// How long one poll waits before re-checking the stop flag
const POLL_TIMEOUT_MS: libc::c_int = 250;

/// Monitors udev for backlight change events
///
/// This runs in a dedicated blocking thread because udev's MonitorSocket is not Send.
/// It uses libc::poll() to wait for events on the udev socket.
pub struct UdevMonitor {
    socket: udev::MonitorSocket,
}

impl UdevMonitor {
    /// Create a new udev monitor for one subsystem (e.g. "backlight")
    pub fn new(subsystem: &str) -> Result<Self, std::io::Error> {
        let socket = udev::MonitorBuilder::new()?
            .match_subsystem(subsystem)?
            .listen()?;

        Ok(Self { socket })
    }

    /// Run the monitoring loop, calling the callback for each change event
    ///
    /// Blocks until `stop` is set or polling fails. Returns the poll error,
    /// if any.
    pub fn run<F>(self, stop: &AtomicBool, mut callback: F) -> Option<std::io::Error>
    where
        F: FnMut(&udev::Event),
    {
        debug!("Backlight change monitoring started");

        let fd = self.socket.as_raw_fd();

        while !stop.load(Ordering::SeqCst) {
            let mut poll_fd = libc::pollfd {
                fd,
                events: libc::POLLIN,
                revents: 0,
            };

            let poll_result = unsafe { libc::poll(&mut poll_fd, 1, POLL_TIMEOUT_MS) };

            if poll_result < 0 {
                let err = std::io::Error::last_os_error();
                if err.kind() == std::io::ErrorKind::Interrupted {
                    continue;
                }
                error!("Poll error: {}", err);
                return Some(err);
            }

            if poll_result == 0 {
                continue;
            }

            if let Some(event) = self.socket.iter().next() {
                trace!(
                    "udev event: type={:?}, sysname={:?}",
                    event.event_type(),
                    event.sysname()
                );

                if matches!(event.event_type(), udev::EventType::Change) {
                    callback(&event);
                }
            }
        }

        debug!("Backlight change monitoring stopped");
        None
    }
}
