//! Capability traits the engine is built on
//!
//! This module defines the byte-level bus and timing abstractions that users must
//! implement for their hardware. The engine never touches registers or pins itself;
//! all framing, checksumming and correlation happens above these traits.

use core::fmt;

/// Error trait for transport implementations
pub trait TransportError: fmt::Debug + fmt::Display {}

/// Half-duplex, byte-at-a-time bus to the radio module
///
/// Users implement this trait for their specific SPI hardware. The transport only
/// needs to move single bytes and report the line states - the engine handles
/// all framing, select arbitration and resynchronization.
///
/// # Example
///
/// ```ignore
/// struct BoardSpi {
///     spi: Spi,
///     cs: Output,
///     attn: Input,
/// }
///
/// impl Transport for BoardSpi {
///     type Error = SpiError;
///
///     fn assert_select(&mut self) -> Result<(), Self::Error> {
///         self.cs.set_low();
///         Ok(())
///     }
///
///     fn deassert_select(&mut self) -> Result<(), Self::Error> {
///         self.cs.set_high();
///         Ok(())
///     }
///
///     fn transfer(&mut self, out: u8) -> Result<u8, Self::Error> {
///         self.spi.transfer_byte(out).map_err(|_| SpiError::Bus)
///     }
///
///     fn ready(&mut self) -> Result<bool, Self::Error> {
///         Ok(self.attn.is_low())
///     }
/// }
/// ```
pub trait Transport {
    /// Error type for this transport
    type Error: TransportError;

    /// Assert the select line
    fn assert_select(&mut self) -> Result<(), Self::Error>;

    /// Deassert the select line
    fn deassert_select(&mut self) -> Result<(), Self::Error>;

    /// Clock one byte out and return the byte clocked in at the same time
    fn transfer(&mut self, out: u8) -> Result<u8, Self::Error>;

    /// Returns true while the module's attention line signals queued data
    fn ready(&mut self) -> Result<bool, Self::Error>;

    /// Run the hardware reset sequence that forces the module into SPI mode
    ///
    /// Returns `false` when no reset lines are wired, in which case the module
    /// must already be configured for SPI operation.
    fn reset_sequence(&mut self) -> Result<bool, Self::Error> {
        Ok(false)
    }
}

/// Time source used for every bounded wait
pub trait Clock {
    /// Monotonic milliseconds
    fn now_ms(&mut self) -> u64;

    /// Block for the given number of milliseconds
    fn sleep_ms(&mut self, ms: u32);
}
