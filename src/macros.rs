#![macro_use]

/// Declares a timer pool binding: a marker type that owns a static [`TimerPool`]
/// with `slots` back-reference entries driving the given hardware backend.
///
/// ```ignore
/// sys_timer::timer_pool!(pub Timers: Atmega = unsafe { Atmega::new(Family::Atmega2560, CLK_16M) }, slots = 4);
///
/// let mut blink = RegisterTimer::<Timers>::new();
/// ```
///
/// The backend expression must be usable in a `static` initializer.
///
/// [`TimerPool`]: crate::pool::TimerPool
#[macro_export]
macro_rules! timer_pool {
    ($vis:vis $name:ident: $hw:ty = $init:expr, slots = $slots:expr $(,)?) => {
        $vis struct $name;

        impl $crate::pool::Binding for $name {
            type Hw = $hw;

            fn pool() -> &'static $crate::pool::TimerPool<$hw> {
                const NEW_SLOT: $crate::pool::Slot = $crate::pool::Slot::new();
                static SLOTS: [$crate::pool::Slot; $slots] = [NEW_SLOT; $slots];
                static POOL: $crate::pool::TimerPool<$hw> = $crate::pool::TimerPool::new($init, &SLOTS);
                &POOL
            }
        }
    };
}
