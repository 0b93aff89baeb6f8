//! [`Transport`] over `embedded-hal` 1.0 traits
//!
//! The module's SPI interface needs the bus itself, a select line and the
//! attention line (active low). Wiring RESET and DOUT as well lets [`Xbee::init`]
//! force the module into SPI mode regardless of its stored configuration.
//!
//! # Example
//! ```ignore
//! let transport = SpiTransport::new(spi, cs, attn)
//!     .with_reset(ResetLines::new(reset, dout, delay));
//! let mut xbee: Xbee<_, _, _> = Xbee::new(transport, clock, app);
//! xbee.init()?;
//! ```
//!
//! [`Xbee::init`]: crate::Xbee::init

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::transport::{Transport, TransportError};

/// How long RESET is held low
const RESET_HOLD_MS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HalError {
    Spi,
    Pin,
}

impl fmt::Display for HalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HalError::Spi => write!(f, "SPI bus error"),
            HalError::Pin => write!(f, "GPIO error"),
        }
    }
}

impl TransportError for HalError {}

/// Reset capability of a [`SpiTransport`]
pub trait ResetControl {
    /// Run the reset sequence, returning false if there is nothing to drive
    fn reset(&mut self) -> Result<bool, HalError>;
}

/// No reset lines wired
pub struct NoReset;

impl ResetControl for NoReset {
    fn reset(&mut self) -> Result<bool, HalError> {
        Ok(false)
    }
}

/// RESET and DOUT lines, with the delay used to hold reset
pub struct ResetLines<RST, DOUT, D> {
    reset: RST,
    dout: DOUT,
    delay: D,
}

impl<RST: OutputPin, DOUT: OutputPin, D: DelayNs> ResetLines<RST, DOUT, D> {
    pub fn new(reset: RST, dout: DOUT, delay: D) -> Self {
        Self { reset, dout, delay }
    }
}

impl<RST: OutputPin, DOUT: OutputPin, D: DelayNs> ResetControl for ResetLines<RST, DOUT, D> {
    fn reset(&mut self) -> Result<bool, HalError> {
        // DOUT held low through reset selects SPI mode
        self.dout.set_low().map_err(|_| HalError::Pin)?;
        self.reset.set_low().map_err(|_| HalError::Pin)?;
        self.delay.delay_ms(RESET_HOLD_MS);
        self.reset.set_high().map_err(|_| HalError::Pin)?;
        Ok(true)
    }
}

/// SPI transport with select and attention lines
pub struct SpiTransport<SPI, CS, ATTN, R = NoReset> {
    spi: SPI,
    cs: CS,
    attn: ATTN,
    reset: R,
}

impl<SPI: SpiBus, CS: OutputPin, ATTN: InputPin> SpiTransport<SPI, CS, ATTN, NoReset> {
    pub fn new(spi: SPI, cs: CS, attn: ATTN) -> Self {
        Self {
            spi,
            cs,
            attn,
            reset: NoReset,
        }
    }

    pub fn with_reset<R: ResetControl>(self, reset: R) -> SpiTransport<SPI, CS, ATTN, R> {
        SpiTransport {
            spi: self.spi,
            cs: self.cs,
            attn: self.attn,
            reset,
        }
    }
}

impl<SPI, CS, ATTN, R> SpiTransport<SPI, CS, ATTN, R> {
    pub fn release(self) -> (SPI, CS, ATTN, R) {
        (self.spi, self.cs, self.attn, self.reset)
    }
}

impl<SPI: SpiBus, CS: OutputPin, ATTN: InputPin, R: ResetControl> Transport
    for SpiTransport<SPI, CS, ATTN, R>
{
    type Error = HalError;

    fn assert_select(&mut self) -> Result<(), Self::Error> {
        self.cs.set_low().map_err(|_| HalError::Pin)
    }

    fn deassert_select(&mut self) -> Result<(), Self::Error> {
        self.spi.flush().map_err(|_| HalError::Spi)?;
        self.cs.set_high().map_err(|_| HalError::Pin)
    }

    fn transfer(&mut self, out: u8) -> Result<u8, Self::Error> {
        let mut word = [out];
        self.spi.transfer_in_place(&mut word).map_err(|_| HalError::Spi)?;
        Ok(word[0])
    }

    fn ready(&mut self) -> Result<bool, Self::Error> {
        self.attn.is_low().map_err(|_| HalError::Pin)
    }

    fn reset_sequence(&mut self) -> Result<bool, Self::Error> {
        self.reset.reset()
    }
}
