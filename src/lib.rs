//! Millisecond periodic and one-shot timer callbacks on top of scarce MCU timer hardware.
//!
//! Each timer instance claims one hardware slot from its platform's pool when it is
//! built, and keeps it for the life of the program. Once the pool is exhausted, new
//! instances are inert ("zombies"): [`SysTimer::is_valid`] is false and every
//! operation fails.
//!
//! Platforms, one per cargo feature:
//! - `soft`: [`soft::SoftTimer`], a vendor software-timer service
//! - `register`: [`register::RegisterTimer`], 16-bit compare-match timers driven
//!   through their registers
//! - `vendor`: [`vendor::VendorTimer`], a pre-instantiated third-party timer library
//!
//! ```ignore
//! use sys_timer::register::{Atmega, Family, RegisterTimer};
//! use sys_timer::{time::CLK_16M, timer_pool, SysTimer};
//!
//! timer_pool!(Timers: Atmega = unsafe { Atmega::new(Family::Atmega2560, CLK_16M) }, slots = 4);
//!
//! fn blink(_: *mut ()) { /* ... */ }
//!
//! let mut timer = RegisterTimer::<Timers>::new();
//! timer.attach_interrupt(blink, core::ptr::null_mut());
//! timer.set_interval(500);
//! timer.arm(true);
//! ```

#![cfg_attr(not(test), no_std)]

// This must go FIRST so that all the other modules see its macros.
mod fmt;

mod macros;

pub mod codec;
pub mod pool;
mod shim;
pub mod time;
pub mod timer;

#[cfg(feature = "register")]
pub mod register;
#[cfg(feature = "soft")]
pub mod soft;
#[cfg(feature = "vendor")]
pub mod vendor;

#[cfg(test)]
mod mock;

pub use timer::{Callback, Error, Platform, SysTimer, TimerCore};
