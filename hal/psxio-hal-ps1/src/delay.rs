//! Calibrated busy-wait delay
//!
//! There is no free-running microsecond timer available to the I/O core,
//! so delays burn a computed number of loop iterations instead. The
//! iteration cost is a lower bound, so a delay can run long but never short.

use embedded_hal::delay::DelayNs;

/// Cycles per spin iteration: increment, `black_box` store to the stack,
/// branch and its delay slot
const CYCLES_PER_ITERATION: u32 = 4;

/// Busy-wait delay calibrated against the CPU clock
pub struct CycleDelay {
    cpu_clock_hz: u32,
}

impl CycleDelay {
    pub fn new(cpu_clock_hz: u32) -> Self {
        Self { cpu_clock_hz }
    }

    /// CPU cycles needed for `us` microseconds, rounded to the nearest cycle
    ///
    /// At 33.8688 MHz this is the familiar `(us * 271 + 4) / 8`.
    pub fn cycles_for_us(&self, us: u32) -> u32 {
        let cycles_per_8us = (self.cpu_clock_hz as u64 * 8 + 500_000) / 1_000_000;
        ((us as u64 * cycles_per_8us + 4) / 8) as u32
    }

    /// Spin iterations covering `us` microseconds
    pub fn iterations_for_us(&self, us: u32) -> u32 {
        self.cycles_for_us(us).div_ceil(CYCLES_PER_ITERATION)
    }

    fn spin(&self, iterations: u32) {
        for i in 0..iterations {
            core::hint::black_box(i);
        }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.spin(self.iterations_for_us(ns.div_ceil(1_000)));
    }

    fn delay_us(&mut self, us: u32) {
        self.spin(self.iterations_for_us(us));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_matches_console_clock() {
        let delay = CycleDelay::new(crate::F_CPU);
        for us in [1, 10, 120, 150, 1000] {
            assert_eq!(delay.cycles_for_us(us), (us * 271 + 4) / 8);
        }
    }

    #[test]
    fn test_iterations_cover_whole_cycles() {
        let delay = CycleDelay::new(crate::F_CPU);
        // 120us is 4065 cycles
        assert_eq!(delay.iterations_for_us(120), 1017);
        assert_eq!(delay.iterations_for_us(0), 0);
        assert!(delay.iterations_for_us(1) * CYCLES_PER_ITERATION >= delay.cycles_for_us(1));
    }
}
