/// Brightness change notifications
///
/// The registry relays levels to the controller's subscribers; the udev
/// monitor is the event source behind the sysfs backlight backend.
mod registry;
pub(crate) mod udev_monitor;

pub use registry::{SubscriberId, SubscriberRegistry};
