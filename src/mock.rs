//! Host-side stand-ins for the vendor collaborators, used by unit tests.
//!
//! Each mock keeps its state behind a `critical_section::Mutex<RefCell<_>>` so it can
//! sit in a `static` pool. `fire` always releases the borrow before calling into the
//! crate, since dispatch calls back into the mock to stop the hardware.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::timer::Callback;

#[cfg(feature = "soft")]
pub(crate) use self::service::MockService;
#[cfg(feature = "register")]
pub(crate) use self::registers::MockRegisters;
#[cfg(feature = "vendor")]
pub(crate) use self::library::MockLibrary;

const TIMERS: usize = 9;

#[cfg(feature = "soft")]
mod service {
    use super::*;
    use crate::soft::SoftTimerService;

    #[derive(Clone, Copy)]
    struct Entry {
        callback: Option<(Callback, usize)>,
        armed: Option<(u32, bool)>,
    }

    pub(crate) struct MockService {
        timers: Mutex<RefCell<[Entry; TIMERS]>>,
    }

    impl MockService {
        pub(crate) const fn new() -> Self {
            const IDLE: Entry = Entry {
                callback: None,
                armed: None,
            };
            Self {
                timers: Mutex::new(RefCell::new([IDLE; TIMERS])),
            }
        }

        /// `(interval_ms, repeat)` of an armed timer.
        pub(crate) fn armed(&self, id: u8) -> Option<(u32, bool)> {
            critical_section::with(|cs| self.timers.borrow_ref(cs)[id as usize].armed)
        }

        /// Runs the expiry function of `id`, armed or not.
        pub(crate) fn fire(&self, id: u8) {
            let callback = critical_section::with(|cs| self.timers.borrow_ref(cs)[id as usize].callback);
            if let Some((callback, arg)) = callback {
                callback(arg as *mut ());
            }
        }
    }

    impl SoftTimerService for MockService {
        fn set_callback(&self, id: u8, callback: Callback, arg: *mut ()) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[id as usize].callback = Some((callback, arg as usize));
            })
        }

        fn arm(&self, id: u8, interval_ms: u32, repeat: bool) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[id as usize].armed = Some((interval_ms, repeat));
            })
        }

        fn disarm(&self, id: u8) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[id as usize].armed = None;
            })
        }
    }
}

#[cfg(feature = "register")]
mod registers {
    use super::*;
    use crate::register::{Register, TimerRegisters};
    use crate::time::Hertz;

    const REGISTERS: usize = 5;

    fn offset(reg: Register) -> usize {
        match reg {
            Register::ControlA => 0,
            Register::ControlB => 1,
            Register::InterruptMask => 2,
            Register::Compare => 3,
            Register::Count => 4,
        }
    }

    struct File {
        values: [[u16; REGISTERS]; TIMERS],
        writes: Vec<(u8, Register, u16)>,
    }

    /// Register file that remembers every write.
    pub(crate) struct MockRegisters {
        capacity: usize,
        clock: Hertz,
        file: Mutex<RefCell<File>>,
    }

    impl MockRegisters {
        pub(crate) const fn new(capacity: usize, clock: Hertz) -> Self {
            Self {
                capacity,
                clock,
                file: Mutex::new(RefCell::new(File {
                    values: [[0; REGISTERS]; TIMERS],
                    writes: Vec::new(),
                })),
            }
        }

        pub(crate) fn value(&self, timer: u8, reg: Register) -> u16 {
            critical_section::with(|cs| self.file.borrow_ref(cs).values[timer as usize][offset(reg)])
        }

        /// Drains the write log.
        pub(crate) fn take_writes(&self) -> Vec<(u8, Register, u16)> {
            critical_section::with(|cs| core::mem::take(&mut self.file.borrow_ref_mut(cs).writes))
        }
    }

    impl TimerRegisters for MockRegisters {
        fn capacity(&self) -> usize {
            self.capacity
        }

        fn clock(&self) -> Hertz {
            self.clock
        }

        fn read(&self, timer: u8, reg: Register) -> u16 {
            self.value(timer, reg)
        }

        fn write(&self, timer: u8, reg: Register, value: u16) {
            critical_section::with(|cs| {
                let mut file = self.file.borrow_ref_mut(cs);
                file.values[timer as usize][offset(reg)] = value;
                file.writes.push((timer, reg, value));
            })
        }
    }
}

#[cfg(feature = "vendor")]
mod library {
    use super::*;
    use crate::vendor::TimerLibrary;

    #[derive(Clone, Copy)]
    struct Entry {
        isr: Option<fn()>,
        period_us: Option<u64>,
    }

    /// Library with `TIMERS` pre-instantiated timers.
    pub(crate) struct MockLibrary {
        timers: Mutex<RefCell<[Entry; TIMERS]>>,
    }

    impl MockLibrary {
        pub(crate) const fn new() -> Self {
            const IDLE: Entry = Entry {
                isr: None,
                period_us: None,
            };
            Self {
                timers: Mutex::new(RefCell::new([IDLE; TIMERS])),
            }
        }

        /// Period of a running library timer.
        pub(crate) fn running(&self, timer: u8) -> Option<u64> {
            critical_section::with(|cs| self.timers.borrow_ref(cs)[timer as usize].period_us)
        }

        pub(crate) fn has_isr(&self, timer: u8) -> bool {
            critical_section::with(|cs| self.timers.borrow_ref(cs)[timer as usize].isr.is_some())
        }

        /// Calls the attached ISR of library timer `timer`, running or not.
        pub(crate) fn fire(&self, timer: u8) {
            let isr = critical_section::with(|cs| self.timers.borrow_ref(cs)[timer as usize].isr);
            if let Some(isr) = isr {
                isr();
            }
        }
    }

    impl TimerLibrary for MockLibrary {
        fn attach_interrupt(&self, timer: u8, isr: fn()) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[timer as usize].isr = Some(isr);
            })
        }

        fn start(&self, timer: u8, period_us: u64) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[timer as usize].period_us = Some(period_us);
            })
        }

        fn stop(&self, timer: u8) {
            critical_section::with(|cs| {
                self.timers.borrow_ref_mut(cs)[timer as usize].period_us = None;
            })
        }
    }
}
