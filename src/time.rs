//! Frequency type used for timer clock configuration.

/// Hertz
#[derive(Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Hertz(pub u32);

impl Hertz {
    pub const fn hz(hertz: u32) -> Self {
        Self(hertz)
    }

    /// Saturates at `u32::MAX` Hz.
    pub const fn khz(kilohertz: u32) -> Self {
        Self(kilohertz.saturating_mul(1_000))
    }

    /// Saturates at `u32::MAX` Hz.
    pub const fn mhz(megahertz: u32) -> Self {
        Self(megahertz.saturating_mul(1_000_000))
    }

    /// Raw frequency in Hz.
    pub const fn to_hz(self) -> u32 {
        self.0
    }
}

/// 16 MHz, the usual AVR board clock
pub const CLK_16M: Hertz = Hertz::mhz(16);
/// 8 MHz, 3.3V AVR boards
pub const CLK_8M: Hertz = Hertz::mhz(8);
