//! ATmega 16-bit timer registers (TC1, TC3, TC4, TC5), accessed through data memory.

use core::ptr;

use super::{Register, TimerRegisters};
use crate::time::Hertz;

/// Data-memory addresses of one 16-bit timer.
struct Block {
    tccr_a: usize,
    tccr_b: usize,
    tcnt: usize,
    ocr_a: usize,
    timsk: usize,
}

const TC1: Block = Block {
    tccr_a: 0x80,
    tccr_b: 0x81,
    tcnt: 0x84,
    ocr_a: 0x88,
    timsk: 0x6F,
};

const TC3: Block = Block {
    tccr_a: 0x90,
    tccr_b: 0x91,
    tcnt: 0x94,
    ocr_a: 0x98,
    timsk: 0x71,
};

const TC4: Block = Block {
    tccr_a: 0xA0,
    tccr_b: 0xA1,
    tcnt: 0xA4,
    ocr_a: 0xA8,
    timsk: 0x72,
};

const TC5: Block = Block {
    tccr_a: 0x120,
    tccr_b: 0x121,
    tcnt: 0x124,
    ocr_a: 0x128,
    timsk: 0x73,
};

/// Chip family, which fixes how many 16-bit timers exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Family {
    /// Uno, Nano, Pro Mini: TC1
    Atmega328p,
    /// Leonardo, Pro Micro: TC1, TC3
    Atmega32u4,
    /// Mega: TC1, TC3, TC4, TC5
    Atmega2560,
}

impl Family {
    fn blocks(self) -> &'static [Block] {
        match self {
            Family::Atmega328p => &[TC1],
            Family::Atmega32u4 => &[TC1, TC3],
            Family::Atmega2560 => &[TC1, TC3, TC4, TC5],
        }
    }
}

/// Register access for the 16-bit timers of an ATmega part.
///
/// Slot `n` drives the `n`-th timer of the family (TC1 first). TC0 and TC2 are
/// 8-bit and left to the Arduino core.
pub struct Atmega {
    family: Family,
    clock: Hertz,
}

impl Atmega {
    /// # Safety
    ///
    /// Only valid on the given chip family. The caller hands every 16-bit timer
    /// over to this backend; nothing else may touch their registers.
    pub const unsafe fn new(family: Family, clock: Hertz) -> Self {
        Self { family, clock }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    fn address(&self, timer: u8, reg: Register) -> Option<usize> {
        let block = self.family.blocks().get(timer as usize)?;
        Some(match reg {
            Register::ControlA => block.tccr_a,
            Register::ControlB => block.tccr_b,
            Register::InterruptMask => block.timsk,
            Register::Compare => block.ocr_a,
            Register::Count => block.tcnt,
        })
    }
}

fn is_wide(reg: Register) -> bool {
    matches!(reg, Register::Compare | Register::Count)
}

impl TimerRegisters for Atmega {
    fn capacity(&self) -> usize {
        self.family.blocks().len()
    }

    fn clock(&self) -> Hertz {
        self.clock
    }

    fn read(&self, timer: u8, reg: Register) -> u16 {
        let Some(addr) = self.address(timer, reg) else {
            return 0;
        };
        // SAFETY: fixed I/O addresses of this family, owned per `Atmega::new`.
        unsafe {
            if is_wide(reg) {
                // low byte first, latches the high byte into TEMP
                let lo = ptr::read_volatile(addr as *const u8) as u16;
                let hi = ptr::read_volatile((addr + 1) as *const u8) as u16;
                (hi << 8) | lo
            } else {
                ptr::read_volatile(addr as *const u8) as u16
            }
        }
    }

    fn write(&self, timer: u8, reg: Register, value: u16) {
        let Some(addr) = self.address(timer, reg) else {
            return;
        };
        // SAFETY: as in `read`.
        unsafe {
            if is_wide(reg) {
                // high byte first, it is held in TEMP until the low byte write
                ptr::write_volatile((addr + 1) as *mut u8, (value >> 8) as u8);
                ptr::write_volatile(addr as *mut u8, value as u8);
            } else {
                ptr::write_volatile(addr as *mut u8, value as u8);
            }
        }
    }
}
