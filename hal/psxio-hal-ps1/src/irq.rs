//! Interrupt status latches

use psxio_hal::irq::{InterruptController, Irq};

use crate::regs::IRQ_STAT;

pub struct Ps1Irq {
    _private: (),
}

impl Ps1Irq {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

impl InterruptController for Ps1Irq {
    fn is_pending(&self, irq: Irq) -> bool {
        IRQ_STAT.read() & irq.mask() != 0
    }

    fn acknowledge(&mut self, irq: Irq) {
        IRQ_STAT.write(!irq.mask());
    }
}
