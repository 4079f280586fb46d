//! Software-timer platform: timers provided by a vendor timer service.
//!
//! The service already passes an argument to its expiry function, so no trampoline
//! table is needed: the slot index itself is registered as the argument. The service
//! sends no notification after a one-shot has expired, so a one-shot reports
//! `is_armed() == false` from the moment it is armed.

use crate::pool::Binding;
use crate::shim;
use crate::timer::{Callback, Error, Platform, SysTimer, TimerCore};

/// The service is unreliable below this period; shorter requests are raised to it.
pub const MIN_INTERVAL_MS: u32 = 5;

/// Vendor software-timer service, one timer per slot index.
pub trait SoftTimerService: Sync + 'static {
    /// Sets `callback(arg)` as the expiry function of timer `id`.
    fn set_callback(&self, id: u8, callback: Callback, arg: *mut ());

    /// Starts timer `id`, firing every `interval_ms` if `repeat`, else once.
    fn arm(&self, id: u8, interval_ms: u32, repeat: bool);

    /// Stops timer `id`. Disarming a stopped timer has no effect.
    fn disarm(&self, id: u8);
}

pub struct SoftTimer<B: Binding>
where
    B::Hw: SoftTimerService,
{
    core: TimerCore<B>,
}

impl<B: Binding> SoftTimer<B>
where
    B::Hw: SoftTimerService,
{
    /// Builds a timer on the next free slot of `B`, or a zombie if there is none.
    pub fn new() -> Self {
        Self {
            core: TimerCore::new(Platform::SoftTimer, usize::MAX),
        }
    }

    /// Expiry function registered with the service, `arg` carries the slot index.
    fn on_expiry(arg: *mut ()) {
        let index = arg as usize as u8;
        shim::dispatch_unmasked(B::pool(), index, |service, id| service.disarm(id));
    }
}

impl<B: Binding> Default for SoftTimer<B>
where
    B::Hw: SoftTimerService,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Binding> SysTimer for SoftTimer<B>
where
    B::Hw: SoftTimerService,
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
            .set_callback(index, Self::on_expiry, index as usize as *mut ());
        Ok(())
    }

    fn try_arm(&mut self, repeat: bool) -> Result<(), Error> {
        let index = self.core.armable()?;
        let interval_ms = self.core.interval().max(MIN_INTERVAL_MS);
        let service = B::pool().hw();

        self.core.with_state(|state| {
            service.disarm(index);
            state.set_mode(repeat);
            state.armed.set(repeat);
            service.arm(index, interval_ms, repeat);
        })?;

        trace!("soft timer {}: armed {}ms repeat={}", index, interval_ms, repeat);
        Ok(())
    }

    fn try_disarm(&mut self) -> Result<(), Error> {
        let service = B::pool().hw();
        let index = self.core.slot()?;

        self.core.with_state(|state| {
            service.disarm(index);
            state.clear();
        })?;

        trace!("soft timer {}: disarmed", index);
        Ok(())
    }
}
