//! Asynchronous event delivery
//!
//! Frames the module sends on its own (received data, link status, I/O samples and
//! scan results) are dispatched to an [`Events`] implementation while the bus is
//! being serviced. Every method has an empty default, so an application only
//! implements the events it cares about; everything else is read and discarded.
//!
//! # Example
//! ```ignore
//! struct App {
//!     joined: bool,
//! }
//!
//! impl Events for App {
//!     fn on_status(&mut self, status: u8) {
//!         self.joined = status == 0x02;
//!     }
//!
//!     fn on_data(&mut self, link: &mut dyn Link, data: &[u8], info: &RxInfo) {
//!         // Echo each chunk back to the sender, without confirmation
//!         let opts = TxOptions::udp(info.source_port, info.dest_port);
//!         let _ = link.transmit(info.source_addr, Framing::Ipv4(opts), data, false);
//!     }
//! }
//! ```

use core::net::Ipv4Addr;

use heapless::Vec;

use crate::Error;
use crate::command::{Mode, Target};
use crate::tx::{Framing, Protocol};

/// Longest network name reported by a scan
pub const MAX_SSID_LEN: usize = 32;

/// Port reported for data received with compatibility framing
pub const COMPAT_PORT: u16 = 0x0BEE;

/// Consumer of asynchronous frames
///
/// None of these methods may block waiting on the module. Only [`Events::on_data`]
/// gets a [`Link`]; the engine rejects commands issued through it.
pub trait Events {
    /// A chunk of received data
    ///
    /// A payload larger than the working buffer arrives over several calls that
    /// share `info.sequence`; only the call with `info.is_final` set reports the
    /// checksum result.
    fn on_data(&mut self, link: &mut dyn Link, data: &[u8], info: &RxInfo) {
        let _ = (link, data, info);
    }

    /// A link (modem) status change
    fn on_status(&mut self, status: u8) {
        let _ = status;
    }

    /// One access point heard during an active scan
    fn on_scan(&mut self, result: &ScanResult) {
        let _ = result;
    }

    /// A remote I/O sample
    fn on_sample(&mut self, sample: &Sample) {
        let _ = sample;
    }
}

impl Events for () {}

/// Access to the engine from inside a data delivery
pub trait Link {
    /// Transmit data. Confirmation is never waited for from inside a delivery.
    fn transmit(
        &mut self,
        dest: Ipv4Addr,
        framing: Framing,
        data: &[u8],
        confirm: bool,
    ) -> Result<(), Error>;

    /// Issue a command. Always fails with [`Error::ReentrancyViolation`] while a
    /// delivery is in progress.
    fn command(
        &mut self,
        target: Target,
        cmd: &[u8; 2],
        params: &[u8],
        mode: Mode,
    ) -> Result<(), Error>;

    /// The most recent link status
    fn last_status(&self) -> u8;

    /// Number of deliveries currently in progress
    fn callback_depth(&self) -> u8;
}

/// Reception context that accompanies each chunk of received data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RxInfo {
    /// Address the data came from
    pub source_addr: Ipv4Addr,
    /// Port the data came from
    pub source_port: u16,
    /// Port the data arrived on, [`COMPAT_PORT`] for compatibility framing
    pub dest_port: u16,
    pub protocol: Protocol,
    /// Same for every chunk of one payload, incremented once per payload
    pub sequence: u16,
    /// Total length of the payload
    pub total_len: usize,
    /// Offset of this chunk within the payload
    pub offset: usize,
    /// True for the last chunk of the payload
    pub is_final: bool,
    /// Only meaningful when `is_final` is set
    pub checksum_error: bool,
}

impl RxInfo {
    pub(crate) fn new(sequence: u16, total_len: usize) -> Self {
        Self {
            source_addr: Ipv4Addr::UNSPECIFIED,
            source_port: 0,
            dest_port: 0,
            protocol: Protocol::Udp,
            sequence,
            total_len,
            offset: 0,
            is_final: false,
            checksum_error: false,
        }
    }
}

/// Remote I/O sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub source_addr: Ipv4Addr,
    /// Digital channels sampled
    pub digital_mask: u16,
    /// Analog channels enabled
    pub analog_mask: u8,
    pub digital_samples: u16,
    pub analog_samples: u16,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            source_addr: Ipv4Addr::UNSPECIFIED,
            digital_mask: 0,
            analog_mask: 0,
            digital_samples: 0,
            analog_samples: 0,
        }
    }
}

/// Access point reported by an active scan
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanResult {
    pub channel: u8,
    /// Encryption mode (0 none, 1 WPA, 2 WPA2, 3 WEP)
    pub encryption: u8,
    /// Link margin in dB
    pub signal: u8,
    pub ssid: Vec<u8, MAX_SSID_LEN>,
}

impl ScanResult {
    /// The network name, if it is valid UTF-8
    pub fn ssid_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.ssid).ok()
    }
}
