//! Register map and volatile access
//!
//! Addresses are KSEG1 (uncached) mirrors of the I/O area.

use core::marker::PhantomData;
use core::ptr::{read_volatile, write_volatile};

const IO_BASE: usize = 0xBF80_1000;

// Interrupt controller
pub const IRQ_STAT: Reg<u32> = Reg::at(IO_BASE + 0x070);

// DMA controller
pub const DMA_DPCR: Reg<u32> = Reg::at(IO_BASE + 0x0F0);

pub const fn dma_madr(channel: usize) -> Reg<u32> {
    Reg::at(IO_BASE + 0x080 + channel * 0x10)
}

pub const fn dma_bcr(channel: usize) -> Reg<u32> {
    Reg::at(IO_BASE + 0x084 + channel * 0x10)
}

pub const fn dma_chcr(channel: usize) -> Reg<u32> {
    Reg::at(IO_BASE + 0x088 + channel * 0x10)
}

// Serial ports (SIO0 at 0x040, SIO1 at 0x050)
pub const fn sio_data(port: usize) -> Reg<u8> {
    Reg::at(IO_BASE + 0x040 + port * 0x10)
}

pub const fn sio_stat(port: usize) -> Reg<u32> {
    Reg::at(IO_BASE + 0x044 + port * 0x10)
}

pub const fn sio_mode(port: usize) -> Reg<u16> {
    Reg::at(IO_BASE + 0x048 + port * 0x10)
}

pub const fn sio_ctrl(port: usize) -> Reg<u16> {
    Reg::at(IO_BASE + 0x04A + port * 0x10)
}

pub const fn sio_baud(port: usize) -> Reg<u16> {
    Reg::at(IO_BASE + 0x04E + port * 0x10)
}

// GPU
pub const GPU_GP0: Reg<u32> = Reg::at(IO_BASE + 0x810);
pub const GPU_GP1: Reg<u32> = Reg::at(IO_BASE + 0x814);

/// One memory-mapped register
#[derive(Clone, Copy)]
pub struct Reg<T> {
    address: usize,
    _width: PhantomData<T>,
}

impl<T: Copy> Reg<T> {
    const fn at(address: usize) -> Self {
        Self {
            address,
            _width: PhantomData,
        }
    }

    #[inline(always)]
    pub fn read(self) -> T {
        // SAFETY: registers are only built from the fixed, naturally aligned
        // addresses above, which are always mapped on the console.
        unsafe { read_volatile(self.address as *const T) }
    }

    #[inline(always)]
    pub fn write(self, value: T) {
        // SAFETY: see `read`.
        unsafe { write_volatile(self.address as *mut T, value) }
    }
}

impl Reg<u32> {
    /// Read-modify-write
    #[inline(always)]
    pub fn modify(self, f: impl FnOnce(u32) -> u32) {
        self.write(f(self.read()));
    }
}
