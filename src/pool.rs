//! Resource pool: the fixed table of hardware timer slots of one platform.
//!
//! Slots are handed out in order and never returned. Each slot also carries the
//! state the interrupt shim needs to find its way back to the owning timer, since
//! the hardware vector carries no user data.

use core::cell::Cell;
use core::ptr;
use core::sync::atomic::{AtomicU8, Ordering};

use critical_section::{CriticalSection, Mutex};

use crate::timer::Callback;

/// Timer state shared between foreground code and the interrupt shim.
pub(crate) struct SlotState {
    /// Set once when the slot is assigned; the back-reference is never cleared.
    pub(crate) owned: Cell<bool>,
    pub(crate) armed: Cell<bool>,
    pub(crate) repeating: Cell<bool>,
    pub(crate) one_shot: Cell<bool>,
    pub(crate) callback: Cell<Option<Callback>>,
    pub(crate) arg: Cell<*mut ()>,
}

// The argument pointer is opaque to us, it is only ever handed back to the callback.
unsafe impl Send for SlotState {}

impl SlotState {
    const fn new() -> Self {
        Self {
            owned: Cell::new(false),
            armed: Cell::new(false),
            repeating: Cell::new(false),
            one_shot: Cell::new(false),
            callback: Cell::new(None),
            arg: Cell::new(ptr::null_mut()),
        }
    }

    /// True while the hardware is expected to deliver callbacks for this slot.
    pub(crate) fn is_running(&self) -> bool {
        self.repeating.get() || self.one_shot.get()
    }

    pub(crate) fn set_mode(&self, repeat: bool) {
        self.repeating.set(repeat);
        self.one_shot.set(!repeat);
    }

    /// Back to idle, callback and argument are kept for the next arm.
    pub(crate) fn clear(&self) {
        self.repeating.set(false);
        self.one_shot.set(false);
        self.armed.set(false);
    }
}

/// One entry of a pool's back-reference table.
pub struct Slot {
    state: Mutex<SlotState>,
}

impl Slot {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::new()),
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::new()
    }
}

/// Process-wide, append-only table of timer slots for one hardware backend.
///
/// Usually declared with [`timer_pool!`](crate::timer_pool), which places the pool
/// and its slot table in statics and binds them to a marker type.
pub struct TimerPool<H> {
    hw: H,
    next: AtomicU8,
    slots: &'static [Slot],
}

impl<H> TimerPool<H> {
    pub const fn new(hw: H, slots: &'static [Slot]) -> Self {
        Self {
            hw,
            next: AtomicU8::new(0),
            slots,
        }
    }

    /// The hardware backend driven by this pool.
    pub fn hw(&self) -> &H {
        &self.hw
    }

    /// Number of back-reference slots, the upper bound on live timers.
    pub fn capacity(&self) -> usize {
        self.slots.len().min(u8::MAX as usize)
    }

    /// Number of slots handed out so far.
    pub fn allocated(&self) -> usize {
        self.next.load(Ordering::Acquire) as usize
    }

    /// Assigns the next free slot, if both the table and the hardware have one left.
    ///
    /// Only called from constructors, never from interrupt context.
    pub(crate) fn allocate(&self, hw_capacity: usize) -> Option<u8> {
        let limit = self.capacity().min(hw_capacity);

        let index = self
            .next
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                if (n as usize) < limit {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .ok()?;

        let slot = self.slots.get(index as usize)?;
        critical_section::with(|cs| slot.state.borrow(cs).owned.set(true));

        Some(index)
    }

    /// Resolves a slot index to its owner's state, `None` for unassigned slots.
    pub(crate) fn state<'cs>(&'cs self, cs: CriticalSection<'cs>, index: u8) -> Option<&'cs SlotState> {
        let state = self.slots.get(index as usize)?.state.borrow(cs);
        state.owned.get().then_some(state)
    }
}

/// Ties a marker type to one static [`TimerPool`].
///
/// Timer instances are generic over their binding so the interrupt entry points,
/// which take no arguments, can still reach the pool.
pub trait Binding: 'static {
    type Hw: Sync + 'static;

    fn pool() -> &'static TimerPool<Self::Hw>;
}
