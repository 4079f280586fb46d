//! Register-timer platform: 16-bit timers programmed directly through their
//! control, mask and compare registers, in clear-timer-on-compare mode.
//!
//! The compare-match vectors carry no user data. Firmware binds each vector to
//! [`RegisterTimer::on_compare_match`] with the vector's slot index:
//!
//! ```ignore
//! #[avr_device::interrupt(atmega2560)]
//! fn TIMER1_COMPA() {
//!     unsafe { RegisterTimer::<Timers>::on_compare_match(0) }
//! }
//! ```

use critical_section::CriticalSection;

use crate::codec::{self, CompareMatch};
use crate::pool::Binding;
use crate::shim;
use crate::time::Hertz;
use crate::timer::{Callback, Error, Platform, SysTimer, TimerCore};

mod atmega;

pub use atmega::{Atmega, Family};

/// Registers of one 16-bit timer that the core touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    /// TCCRnA, waveform generation low bits and compare output modes
    ControlA,
    /// TCCRnB, clock select and WGMn2; the timer runs while CSn bits are set
    ControlB,
    /// TIMSKn
    InterruptMask,
    /// OCRnA
    Compare,
    /// TCNTn
    Count,
}

/// Bits of the control and mask registers.
pub mod bits {
    /// clk/1024 (CSn0 | CSn2)
    pub const CLOCK_DIV_1024: u16 = (1 << 0) | (1 << 2);
    /// CTC mode, TOP = OCRnA (WGMn2)
    pub const WGM_CTC: u16 = 1 << 3;
    /// output compare A match interrupt enable (OCIEnA)
    pub const OCIE_A: u16 = 1 << 1;
}

/// Memory-mapped timer registers. A fixed external layout, one set per timer.
pub trait TimerRegisters: Sync + 'static {
    /// Number of 16-bit timers available.
    fn capacity(&self) -> usize;

    /// CPU clock feeding the prescaler.
    fn clock(&self) -> Hertz;

    fn read(&self, timer: u8, reg: Register) -> u16;

    fn write(&self, timer: u8, reg: Register, value: u16);

    fn modify(&self, timer: u8, reg: Register, f: impl FnOnce(u16) -> u16) {
        let value = self.read(timer, reg);
        self.write(timer, reg, f(value));
    }
}

/// Stops a timer by clearing both control registers.
///
/// The clock select bits live in control B, control A is cleared as well so no
/// waveform mode is left behind.
fn stop<R: TimerRegisters>(regs: &R, timer: u8, _cs: CriticalSection) {
    regs.write(timer, Register::ControlA, 0);
    regs.write(timer, Register::ControlB, 0);
}

/// Full programming sequence: stop, enable the compare interrupt, load the compare
/// value, reset the count, then start with the prescaler and CTC bits.
fn start<R: TimerRegisters>(regs: &R, timer: u8, counter: u16, cs: CriticalSection) {
    stop(regs, timer, cs);
    regs.modify(timer, Register::InterruptMask, |m| m | bits::OCIE_A);
    regs.write(timer, Register::Compare, counter);
    regs.write(timer, Register::Count, 0);
    regs.modify(timer, Register::ControlB, |b| b | bits::CLOCK_DIV_1024 | bits::WGM_CTC);
}

pub struct RegisterTimer<B: Binding>
where
    B::Hw: TimerRegisters,
{
    core: TimerCore<B>,
    effective_ms: Option<u32>,
}

impl<B: Binding> RegisterTimer<B>
where
    B::Hw: TimerRegisters,
{
    /// Builds a timer on the next free hardware timer of `B`, or a zombie if there is none.
    pub fn new() -> Self {
        Self {
            core: TimerCore::new(Platform::RegisterTimer, B::pool().hw().capacity()),
            effective_ms: None,
        }
    }

    /// Interval last programmed into hardware, after clamping to what the counter can hold.
    pub fn effective_interval(&self) -> Option<u32> {
        self.effective_ms
    }

    /// Compare-match handler for slot `index`.
    ///
    /// # Safety
    ///
    /// Must only be called from the compare-match interrupt of that slot, where
    /// the hardware has already masked interrupts and nested dispatch is impossible.
    pub unsafe fn on_compare_match(index: u8) {
        let cs = CriticalSection::new();
        shim::dispatch(B::pool(), cs, index, |regs, timer| stop(regs, timer, cs));
    }
}

impl<B: Binding> Default for RegisterTimer<B>
where
    B::Hw: TimerRegisters,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Binding> SysTimer for RegisterTimer<B>
where
    B::Hw: TimerRegisters,
{
    type Pool = B;

    fn core(&self) -> &TimerCore<B> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimerCore<B> {
        &mut self.core
    }

    /// The vector is fixed per timer, so only the callback pair is recorded.
    fn try_attach_interrupt(&mut self, callback: Callback, arg: *mut ()) -> Result<(), Error> {
        self.core.attach(callback, arg).map(|_| ())
    }

    fn try_arm(&mut self, repeat: bool) -> Result<(), Error> {
        let index = self.core.armable()?;
        let regs = B::pool().hw();
        let CompareMatch { counter, interval_ms } = codec::encode(self.core.interval(), regs.clock());

        critical_section::with(|cs| {
            let state = B::pool().state(cs, index).ok_or(Error::Exhausted)?;
            state.set_mode(repeat);
            start(regs, index, counter, cs);
            state.armed.set(true);
            Ok::<(), Error>(())
        })?;

        self.effective_ms = Some(interval_ms);
        trace!("register timer {}: armed {}ms (OCR={}) repeat={}", index, interval_ms, counter, repeat);
        Ok(())
    }

    fn try_disarm(&mut self) -> Result<(), Error> {
        let index = self.core.slot()?;
        let regs = B::pool().hw();

        critical_section::with(|cs| {
            let state = B::pool().state(cs, index).ok_or(Error::Exhausted)?;
            stop(regs, index, cs);
            state.clear();
            Ok::<(), Error>(())
        })?;

        trace!("register timer {}: disarmed", index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::mock::MockRegisters;
    use crate::time::CLK_16M;
    use crate::timer_pool;

    fn count(arg: *mut ()) {
        let hits = unsafe { &*(arg as *const AtomicUsize) };
        hits.fetch_add(1, Ordering::SeqCst);
    }

    fn arg_of(hits: &'static AtomicUsize) -> *mut () {
        hits as *const AtomicUsize as *mut ()
    }

    #[test]
    fn test_capacity_follows_hardware() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(2, CLK_16M), slots = 4);

        let a = RegisterTimer::<Pool>::new();
        let b = RegisterTimer::<Pool>::new();
        let c = RegisterTimer::<Pool>::new();
        assert_eq!(a.slot_index(), Some(0));
        assert_eq!(b.slot_index(), Some(1));
        assert!(!c.is_valid());
        assert_eq!(Pool::pool().allocated(), 2);
    }

    #[test]
    fn test_arm_programs_ctc_sequence() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(1, CLK_16M), slots = 1);
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let mut timer = RegisterTimer::<Pool>::new();
        timer.attach_interrupt(count, arg_of(&HITS));
        timer.set_interval(1000);
        assert!(Pool::pool().hw().take_writes().is_empty());

        assert!(timer.arm(true));
        assert_eq!(
            Pool::pool().hw().take_writes(),
            [
                (0, Register::ControlA, 0),
                (0, Register::ControlB, 0),
                (0, Register::InterruptMask, bits::OCIE_A),
                (0, Register::Compare, 15624),
                (0, Register::Count, 0),
                (0, Register::ControlB, bits::CLOCK_DIV_1024 | bits::WGM_CTC),
            ]
        );
        assert_eq!(timer.effective_interval(), Some(1000));
    }

    #[test]
    fn test_long_interval_is_clamped() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(1, CLK_16M), slots = 1);
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let mut timer = RegisterTimer::<Pool>::new();
        timer.attach_interrupt(count, arg_of(&HITS));
        timer.set_interval(10_000);
        assert!(timer.arm(false));

        assert_eq!(timer.effective_interval(), Some(4194));
        assert_eq!(timer.interval(), 10_000);
        assert_eq!(Pool::pool().hw().value(0, Register::Compare), 65530);
    }

    #[test]
    fn test_one_shot_disarms_in_shim() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(1, CLK_16M), slots = 1);
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let mut timer = RegisterTimer::<Pool>::new();
        timer.attach_interrupt(count, arg_of(&HITS));
        timer.set_interval(10);
        assert!(timer.arm(false));
        assert!(timer.is_armed());
        assert!(!timer.is_repeating());

        unsafe { RegisterTimer::<Pool>::on_compare_match(0) };
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
        assert!(!timer.is_armed());
        assert!(!timer.is_repeating());
        assert_eq!(Pool::pool().hw().value(0, Register::ControlB), 0);

        unsafe { RegisterTimer::<Pool>::on_compare_match(0) };
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_repeating_keeps_running() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(1, CLK_16M), slots = 1);
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let mut timer = RegisterTimer::<Pool>::new();
        timer.attach_interrupt(count, arg_of(&HITS));
        timer.set_interval(250);
        timer.arm(true);

        for n in 1..=3 {
            unsafe { RegisterTimer::<Pool>::on_compare_match(0) };
            assert_eq!(HITS.load(Ordering::SeqCst), n);
            assert!(timer.is_armed());
            assert!(timer.is_repeating());
        }

        assert!(timer.disarm());
        assert_eq!(Pool::pool().hw().value(0, Register::ControlB), 0);
        unsafe { RegisterTimer::<Pool>::on_compare_match(0) };
        assert_eq!(HITS.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unowned_vector_is_ignored() {
        timer_pool!(Pool: MockRegisters = MockRegisters::new(2, CLK_16M), slots = 2);
        static HITS: AtomicUsize = AtomicUsize::new(0);

        let mut timer = RegisterTimer::<Pool>::new();
        timer.attach_interrupt(count, arg_of(&HITS));
        timer.set_interval(5);
        timer.arm(true);

        unsafe { RegisterTimer::<Pool>::on_compare_match(1) };
        assert_eq!(HITS.load(Ordering::SeqCst), 0);
        assert!(Pool::pool().hw().take_writes().iter().all(|&(t, _, _)| t == 0));
    }
}
