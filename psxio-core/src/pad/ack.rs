//! DSR acknowledge handshake
//!
//! Devices pulse DSR after every byte they want to continue after. The
//! pulse is latched by the interrupt controller; a missing pulse within the
//! timeout means the device is absent or has nothing more to send.

use embedded_hal::delay::DelayNs;
use psxio_hal::sio::{SioControl, SioPort};

/// Bounded wait for the acknowledge latch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcknowledgeMonitor {
    poll_step_us: u32,
}

impl AcknowledgeMonitor {
    pub fn new(poll_step_us: u32) -> Self {
        Self {
            poll_step_us: poll_step_us.max(1),
        }
    }

    /// Wait up to `timeout_us` for a DSR pulse
    ///
    /// On detection the latch is cleared and the port re-armed so the next
    /// pulse can be seen, and `true` is returned. On timeout nothing is
    /// touched and `false` is returned.
    pub fn wait<P: SioPort, D: DelayNs>(
        &self,
        port: &mut P,
        delay: &mut D,
        timeout_us: u32,
    ) -> bool {
        let mut remaining = timeout_us;
        while remaining > 0 {
            if port.acknowledge_pending() {
                port.clear_acknowledge_latch();
                port.modify_control(SioControl::ACKNOWLEDGE, SioControl::empty());
                return true;
            }

            delay.delay_us(self.poll_step_us);
            remaining = remaining.saturating_sub(self.poll_step_us);
        }

        false
    }
}
