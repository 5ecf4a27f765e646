//! Controller bus configuration types

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Controller bus handshake timing, in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BusTiming {
    /// Idle time before asserting DTR
    pub dtr_pre_delay_us: u32,
    /// Device turnaround after asserting DTR, and settle time before
    /// releasing it
    pub dtr_delay_us: u32,
    /// Idle time after releasing DTR
    pub dtr_post_delay_us: u32,
    /// How long to wait for a DSR pulse after each byte
    pub ack_timeout_us: u32,
    /// Polling step while waiting for a DSR pulse
    pub ack_poll_step_us: u32,
    /// Gap between bytes of packets sent without acknowledge
    pub byte_delay_us: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            dtr_pre_delay_us: 10,
            dtr_delay_us: 150,
            dtr_post_delay_us: 10,
            ack_timeout_us: 120,
            ack_poll_step_us: 10,
            byte_delay_us: 10,
        }
    }
}

/// Serial port configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SioConfig {
    /// Bus bit rate
    pub baud_rate: u32,
    /// CPU clock driving the baud rate generator
    pub cpu_clock_hz: u32,
}

impl SioConfig {
    /// Baud rate generator reload value (divide-by-1 prescaler)
    pub fn baud_reload(&self) -> u16 {
        (self.cpu_clock_hz / self.baud_rate.max(1)).min(u16::MAX as u32) as u16
    }
}

impl Default for SioConfig {
    fn default() -> Self {
        Self {
            baud_rate: 250_000,
            cpu_clock_hz: 33_868_800,
        }
    }
}
