//! GPU ports

use psxio_hal::gpu::{GpuPorts, GpuStatus};

use crate::regs::{GPU_GP0, GPU_GP1};

pub struct Ps1Gpu {
    _private: (),
}

impl Ps1Gpu {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl GpuPorts for Ps1Gpu {
    fn write_gp0(&mut self, word: u32) {
        GPU_GP0.write(word);
    }

    fn write_gp1(&mut self, word: u32) {
        GPU_GP1.write(word);
    }

    fn status(&self) -> GpuStatus {
        // GP1 reads back the status register
        GpuStatus::from_bits_retain(GPU_GP1.read())
    }
}
