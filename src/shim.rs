//! Interrupt shim: from a fired hardware slot back to the owner's callback.
//!
//! The vector (or the vendor trampoline) only knows its slot index. The owner is
//! found through the pool's back-reference table, never through the instance itself.

use critical_section::CriticalSection;

use crate::pool::TimerPool;

/// Dispatch with interrupts already masked for the whole callback.
///
/// `halt` stops the hardware of a one-shot after its single callback.
pub(crate) fn dispatch<H>(pool: &TimerPool<H>, cs: CriticalSection, index: u8, halt: impl FnOnce(&H, u8)) {
    // spurious or unassigned vector
    let Some(state) = pool.state(cs, index) else {
        return;
    };

    if state.is_running() {
        if let Some(callback) = state.callback.get() {
            callback(state.arg.get());
        }
    }

    if state.one_shot.get() {
        state.one_shot.set(false);
        halt(pool.hw(), index);
        state.clear();
    }
}

/// Dispatch for backends that call back from task context.
///
/// State is read and updated under short critical sections; the callback itself
/// runs with interrupts enabled.
pub(crate) fn dispatch_unmasked<H>(pool: &TimerPool<H>, index: u8, halt: impl FnOnce(&H, u8)) {
    let pending = critical_section::with(|cs| {
        let state = pool.state(cs, index)?;
        if state.is_running() {
            Some((state.callback.get()?, state.arg.get()))
        } else {
            None
        }
    });

    if let Some((callback, arg)) = pending {
        callback(arg);
    }

    critical_section::with(|cs| {
        if let Some(state) = pool.state(cs, index) {
            if state.one_shot.get() {
                state.one_shot.set(false);
                halt(pool.hw(), index);
                state.clear();
            }
        }
    });
}
