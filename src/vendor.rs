//! Vendor-library platform: the pre-instantiated hardware timers of a third-party
//! timer library (DueTimer on SAM3X8E).
//!
//! The library only accepts a no-argument `fn()` as interrupt handler. Each slot
//! therefore registers its own trampoline from [`Trampolines::TABLE`], which finds
//! the owner through the pool and forwards to the stored callback and argument.
//! Cortex-M allows nested interrupts, so dispatch masks them for the callback.

use core::marker::PhantomData;

use static_assertions::const_assert;

use crate::pool::Binding;
use crate::shim;
use crate::timer::{Callback, Error, Platform, SysTimer, TimerCore};

/// Library timers the trampoline table can serve.
pub const MAX_SLOTS: usize = 9;

/// Library timer number for each slot.
#[cfg(not(feature = "servo-compat"))]
pub const TIMER_MAP: [u8; 9] = [0, 1, 2, 3, 4, 5, 6, 7, 8];

/// Library timer number for each slot; timers 2 to 5 belong to the servo driver.
#[cfg(feature = "servo-compat")]
pub const TIMER_MAP: [u8; 5] = [0, 1, 6, 7, 8];

const_assert!(TIMER_MAP.len() <= MAX_SLOTS);

/// Third-party library of pre-instantiated timers.
pub trait TimerLibrary: Sync + 'static {
    /// Installs `isr` as the handler of library timer `timer`.
    fn attach_interrupt(&self, timer: u8, isr: fn());

    /// (Re)starts `timer` with the given period.
    fn start(&self, timer: u8, period_us: u64);

    fn stop(&self, timer: u8);
}

fn library_timer(index: u8) -> u8 {
    // allocation never hands out an index past the map
    TIMER_MAP[index as usize]
}

/// Per-slot interrupt entry points for pool `B`.
pub struct Trampolines<B>(PhantomData<B>);

impl<B: Binding> Trampolines<B>
where
    B::Hw: TimerLibrary,
{
    pub const TABLE: [fn(); MAX_SLOTS] = [
        trampoline::<B, 0>,
        trampoline::<B, 1>,
        trampoline::<B, 2>,
        trampoline::<B, 3>,
        trampoline::<B, 4>,
        trampoline::<B, 5>,
        trampoline::<B, 6>,
        trampoline::<B, 7>,
        trampoline::<B, 8>,
    ];
}

fn trampoline<B: Binding, const SLOT: u8>()
where
    B::Hw: TimerLibrary,
{
    VendorTimer::<B>::on_interrupt(SLOT);
}

pub struct VendorTimer<B: Binding>
where
    B::Hw: TimerLibrary,
{
    core: TimerCore<B>,
}

impl<B: Binding> VendorTimer<B>
where
    B::Hw: TimerLibrary,
{
    /// Builds a timer on the next free library timer of `B`, or a zombie if there is none.
    pub fn new() -> Self {
        Self {
            core: TimerCore::new(Platform::VendorTimer, TIMER_MAP.len()),
        }
    }

    /// Shared handler behind every trampoline.
    pub fn on_interrupt(index: u8) {
        critical_section::with(|cs| {
            shim::dispatch(B::pool(), cs, index, |lib, index| lib.stop(library_timer(index)));
        })
    }
}

impl<B: Binding> Default for VendorTimer<B>
where
    B::Hw: TimerLibrary,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Binding> SysTimer for VendorTimer<B>
where
    B::Hw: TimerLibrary,
{
    type Pool = B;

    fn core(&self) -> &TimerCore<B> {
        &self.core
    }

    fn core_mut(&mut self) -> &mut TimerCore<B> {
        &mut self.core
    }

    fn try_attach_interrupt(&mut self, callback: Callback, arg: *mut ()) -> Result<(), Error> {
        let index = self.core.attach(callback, arg)?;
        B::pool()
            .hw()
            .attach_interrupt(library_timer(index), Trampolines::<B>::TABLE[index as usize]);
        Ok(())
    }

    fn try_arm(&mut self, repeat: bool) -> Result<(), Error> {
        let index = self.core.armable()?;
        let period_us = self.core.interval() as u64 * 1_000;
        let lib = B::pool().hw();

        self.core.with_state(|state| {
            state.set_mode(repeat);
            lib.start(library_timer(index), period_us);
            state.armed.set(true);
        })?;

        trace!("vendor timer {}: armed {}us repeat={}", index, period_us, repeat);
        Ok(())
    }

    fn try_disarm(&mut self) -> Result<(), Error> {
        let index = self.core.slot()?;
        let lib = B::pool().hw();

        self.core.with_state(|state| {
            lib.stop(library_timer(index));
            state.clear();
        })?;

        trace!("vendor timer {}: disarmed", index);
        Ok(())
    }
}
