#![cfg_attr(not(test), no_std)]

pub(crate) mod log;

pub mod atid;
mod bus;
pub mod command;
pub mod config;
pub mod events;
pub mod frame;
#[cfg(feature = "embedded-hal")]
pub mod hal;
mod radio;
pub mod ring;
mod rx;
pub mod transport;
pub mod tx;
pub mod xbee;

pub use atid::Atid;
pub use command::{Mode, Target};
pub use config::Config;
pub use events::{Events, Link, RxInfo, Sample, ScanResult};
pub use radio::MIN_BUFFER_SIZE;
pub use ring::{Buffered, RingBuffer};
pub use transport::{Clock, Transport, TransportError};
pub use tx::{Framing, Protocol, TxOptions};
pub use xbee::{DEFAULT_BUFFER_SIZE, Xbee};

/// Engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The transport reported a failure
    Transport,
    /// No frame arrived within the allowed window
    WaitTimeout,
    /// A frame did not begin with the start delimiter; the bus has been flushed
    InvalidStartByte,
    /// A frame was larger than the buffer it was read into
    Truncated,
    ChecksumMismatch,
    /// A command was issued from inside a data delivery
    ReentrancyViolation,
    /// A command parameter does not fit the working buffer
    ParameterTooLarge,
    /// The response had the wrong type, ATID, address or a failure status
    ResponseMismatch,
    /// The module reported a failed delivery, with its status code
    DeliveryFailed(u8),
    /// Transmit called without data
    EmptyPayload,
    /// The input ended in the middle of a frame
    Incomplete,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Transport => write!(f, "Transport error"),
            Error::WaitTimeout => write!(f, "Timed out waiting for the module"),
            Error::InvalidStartByte => write!(f, "Invalid start byte"),
            Error::Truncated => write!(f, "Frame truncated"),
            Error::ChecksumMismatch => write!(f, "Checksum mismatch"),
            Error::ReentrancyViolation => write!(f, "Command issued inside a data callback"),
            Error::ParameterTooLarge => write!(f, "Parameter too large"),
            Error::ResponseMismatch => write!(f, "Response mismatch"),
            Error::DeliveryFailed(code) => write!(f, "Delivery failed with status {:#04x}", code),
            Error::EmptyPayload => write!(f, "Empty payload"),
            Error::Incomplete => write!(f, "Incomplete frame"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(format!("{}", Error::Transport), "Transport error");
        assert_eq!(format!("{}", Error::DeliveryFailed(0x21)), "Delivery failed with status 0x21");
    }
}
