//! The contract shared by every platform's timer instance.

use core::fmt;
use core::marker::PhantomData;

use crate::pool::{Binding, SlotState};

/// User callback, invoked from interrupt context with the argument given to
/// [`SysTimer::attach_interrupt`].
pub type Callback = fn(*mut ());

/// Which timer backend an instance drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Platform {
    /// Vendor software-timer service (callback with argument, millisecond units).
    SoftTimer,
    /// Memory-mapped 16-bit compare-match timers.
    RegisterTimer,
    /// Pre-instantiated third-party hardware timer library.
    VendorTimer,
}

/// Why an operation did not take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No hardware slot was left when the instance was built. Permanent.
    Exhausted,
    /// `arm` without an attached callback.
    NoCallback,
    /// `arm` with a zero interval.
    ZeroInterval,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Exhausted => write!(f, "no hardware timer slot assigned"),
            Error::NoCallback => write!(f, "no callback attached"),
            Error::ZeroInterval => write!(f, "interval is zero"),
        }
    }
}

/// State every platform variant carries: the assigned slot and the requested interval.
///
/// Everything the interrupt shim touches lives in the pool slot, not here.
pub struct TimerCore<B: Binding> {
    platform: Platform,
    slot: Option<u8>,
    interval_ms: u32,
    _binding: PhantomData<B>,
}

impl<B: Binding> TimerCore<B> {
    /// Claims the next slot of `B`'s pool. On exhaustion the core is a permanent zombie.
    pub(crate) fn new(platform: Platform, hw_capacity: usize) -> Self {
        let slot = B::pool().allocate(hw_capacity);
        match slot {
            Some(index) => debug!("{}: assigned slot {}", platform, index),
            None => warn!("{}: timer slots exhausted, instance is inert", platform),
        }

        Self {
            platform,
            slot,
            interval_ms: 0,
            _binding: PhantomData,
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn slot_index(&self) -> Option<u8> {
        self.slot
    }

    pub fn interval(&self) -> u32 {
        self.interval_ms
    }

    pub(crate) fn slot(&self) -> Result<u8, Error> {
        self.slot.ok_or(Error::Exhausted)
    }

    /// Runs `f` on this instance's shared state with interrupts masked.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&SlotState) -> R) -> Result<R, Error> {
        let index = self.slot()?;
        critical_section::with(|cs| B::pool().state(cs, index).map(f)).ok_or(Error::Exhausted)
    }

    /// Stores the callback pair, replacing any previous one.
    pub(crate) fn attach(&self, callback: Callback, arg: *mut ()) -> Result<u8, Error> {
        self.with_state(|state| {
            state.callback.set(Some(callback));
            state.arg.set(arg);
        })?;
        self.slot()
    }

    /// Checks the preconditions of `arm`, returning the slot to program.
    ///
    /// A rejected arm clears `armed` without touching the hardware.
    pub(crate) fn armable(&self) -> Result<u8, Error> {
        let interval_ms = self.interval_ms;
        let checked = self.with_state(|state| {
            let result = if state.callback.get().is_none() {
                Err(Error::NoCallback)
            } else if interval_ms == 0 {
                Err(Error::ZeroInterval)
            } else {
                Ok(())
            };
            if result.is_err() {
                state.armed.set(false);
            }
            result
        })?;

        if let Err(err) = checked {
            debug!("{}: arm rejected, {}", self.platform, err);
            return Err(err);
        }
        self.slot()
    }
}

/// A millisecond timer bound to one hardware slot.
///
/// Platform variants implement the three `try_*` operations; everything else is shared.
pub trait SysTimer {
    type Pool: Binding;

    fn core(&self) -> &TimerCore<Self::Pool>;

    fn core_mut(&mut self) -> &mut TimerCore<Self::Pool>;

    /// Records `callback`/`arg` and wires the hardware interrupt to this instance.
    fn try_attach_interrupt(&mut self, callback: Callback, arg: *mut ()) -> Result<(), Error>;

    /// Programs the hardware and starts counting, repeating or one-shot.
    fn try_arm(&mut self, repeat: bool) -> Result<(), Error>;

    /// Stops counting. Interval and callback are kept so the timer can be re-armed as is.
    fn try_disarm(&mut self) -> Result<(), Error>;

    fn platform(&self) -> Platform {
        self.core().platform()
    }

    /// Sets the period for the next `arm`. No hardware side effect.
    fn set_interval(&mut self, ms: u32) {
        self.core_mut().interval_ms = ms;
    }

    fn interval(&self) -> u32 {
        self.core().interval()
    }

    /// False for a zombie instance, built after the pool ran out of slots.
    fn is_valid(&self) -> bool {
        self.core().slot_index().is_some()
    }

    fn is_armed(&self) -> bool {
        self.core().with_state(|s| s.armed.get()).unwrap_or(false)
    }

    fn is_repeating(&self) -> bool {
        self.core().with_state(|s| s.repeating.get()).unwrap_or(false)
    }

    fn slot_index(&self) -> Option<u8> {
        self.core().slot_index()
    }

    fn attach_interrupt(&mut self, callback: Callback, arg: *mut ()) -> bool {
        self.try_attach_interrupt(callback, arg).is_ok()
    }

    fn arm(&mut self, repeat: bool) -> bool {
        self.try_arm(repeat).is_ok()
    }

    fn disarm(&mut self) -> bool {
        self.try_disarm().is_ok()
    }
}
