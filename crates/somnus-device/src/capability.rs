//! The sensor device capability consumed by the monitor core.
//!
//! A device exposes two sensor channels, each of which can be connected,
//! configured and read, plus a single aggregate connectivity probe. Every
//! outcome is a plain boolean or a sample value; a device never reports
//! failure through an error channel.

use crate::channel::SensorChannel;

/// Capability set of a dual-channel sensor device.
///
/// Implementations wrap a concrete sensor pairing. The monitor core depends
/// only on this trait, so tests can substitute a scripted implementation for
/// real hardware.
pub trait SensorDevice: Send {
    /// Connect one channel. Returns `true` iff the channel is now connected.
    fn connect(&mut self, channel: SensorChannel) -> bool;

    /// Configure one channel. Returns `true` iff configuration succeeded.
    fn configure(&mut self, channel: SensorChannel) -> bool;

    /// Current connectivity snapshot of the whole device (not per channel).
    fn is_connected(&self) -> bool;

    /// Latest sample from one channel.
    fn read(&mut self, channel: SensorChannel) -> f32;

    /// Device name for logging.
    fn name(&self) -> &str {
        "sensor-device"
    }
}

impl<D: SensorDevice + ?Sized> SensorDevice for Box<D> {
    fn connect(&mut self, channel: SensorChannel) -> bool {
        (**self).connect(channel)
    }

    fn configure(&mut self, channel: SensorChannel) -> bool {
        (**self).configure(channel)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn read(&mut self, channel: SensorChannel) -> f32 {
        (**self).read(channel)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
