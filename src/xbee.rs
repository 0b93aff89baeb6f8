//! XBee Wi-Fi module driver
//!
//! This module provides the public driver. The API mirrors the module's own command
//! set: commands are issued by their two-letter mnemonic, data is transmitted with
//! [`Xbee::transmit`], and everything the module sends on its own is dispatched to
//! the [`Events`] given at construction whenever the bus is serviced.
//!
//! # Usage
//! ```ignore
//! use xbee_wifi::{Framing, Mode, TxOptions, Xbee};
//!
//! let mut xbee: Xbee<_, _, _> = Xbee::new(spi, clock, app);
//! xbee.init()?;
//!
//! // Join a network
//! xbee.at_cmd_str(b"ID", "my-ssid", Mode::Queued)?;
//! xbee.at_cmd_byte(b"EE", 0x02, Mode::Queued)?;
//! xbee.at_cmd_str(b"PK", "passphrase", Mode::Queued)?;
//! xbee.at_cmd_noparm(b"AC", Mode::Immediate)?;
//!
//! // Send a datagram and wait for the module to confirm delivery
//! let dest = Ipv4Addr::new(192, 168, 1, 10);
//! xbee.transmit(dest, Framing::Ipv4(TxOptions::udp(9750, 9750)), b"hello", true)?;
//!
//! loop {
//!     xbee.service()?;
//! }
//! ```

use core::net::Ipv4Addr;

use crate::command::{ACTIVE_SCAN, Mode, NETWORK_RESET, Target};
use crate::config::Config;
use crate::events::Events;
use crate::radio::Radio;
use crate::transport::{Clock, Transport};
use crate::tx::Framing;
use crate::Error;

/// Working buffer size used when none is given
pub const DEFAULT_BUFFER_SIZE: usize = 128;

// ============================================================================
// Xbee Struct
// ============================================================================

/// XBee Wi-Fi driver
///
/// `N` is the working buffer size: the largest command parameter plus header,
/// the largest response, and the chunk size for received data.
pub struct Xbee<T: Transport, C: Clock, E: Events = (), const N: usize = DEFAULT_BUFFER_SIZE> {
    pub(crate) radio: Radio<T, C, N>,
    pub(crate) events: E,
}

impl<T: Transport, C: Clock, E: Events, const N: usize> Xbee<T, C, E, N> {
    /// Create a driver with the default configuration
    pub fn new(transport: T, clock: C, events: E) -> Self {
        Self::with_config(transport, clock, events, Config::default())
    }

    pub fn with_config(transport: T, clock: C, events: E, config: Config) -> Self {
        Self {
            radio: Radio::new(transport, clock, config),
            events,
        }
    }

    /// Reset the module into SPI mode, if the transport has reset lines
    ///
    /// Without reset lines the module must already be configured for SPI and this
    /// returns immediately.
    pub fn init(&mut self) -> Result<(), Error> {
        self.radio.reset(&mut self.events)
    }

    /// Dispatch everything the module has queued
    ///
    /// Call this often; the module stops accepting data once its own buffers fill.
    pub fn service(&mut self) -> Result<(), Error> {
        self.radio.service(&mut self.events)
    }

    /// Issue a command and copy the response value into `out`
    ///
    /// Returns the number of bytes copied.
    pub fn command(
        &mut self,
        target: Target,
        cmd: &[u8; 2],
        params: &[u8],
        mode: Mode,
        out: &mut [u8],
    ) -> Result<usize, Error> {
        self.radio.command(&mut self.events, target, cmd, params, mode, out)
    }

    // ------------------------------------------------------------------------
    // Local commands
    // ------------------------------------------------------------------------

    pub fn at_cmd_raw(&mut self, cmd: &[u8; 2], params: &[u8], mode: Mode) -> Result<(), Error> {
        self.command(Target::Local, cmd, params, mode, &mut []).map(|_| ())
    }

    pub fn at_cmd_str(&mut self, cmd: &[u8; 2], value: &str, mode: Mode) -> Result<(), Error> {
        self.at_cmd_raw(cmd, value.as_bytes(), mode)
    }

    pub fn at_cmd_byte(&mut self, cmd: &[u8; 2], value: u8, mode: Mode) -> Result<(), Error> {
        self.at_cmd_raw(cmd, &[value], mode)
    }

    /// Send a 16-bit parameter, most significant byte first
    pub fn at_cmd_u16(&mut self, cmd: &[u8; 2], value: u16, mode: Mode) -> Result<(), Error> {
        self.at_cmd_raw(cmd, &value.to_be_bytes(), mode)
    }

    pub fn at_cmd_noparm(&mut self, cmd: &[u8; 2], mode: Mode) -> Result<(), Error> {
        self.at_cmd_raw(cmd, &[], mode)
    }

    /// Read a parameter back, returning the number of bytes copied into `out`
    pub fn at_query(&mut self, cmd: &[u8; 2], out: &mut [u8]) -> Result<usize, Error> {
        self.command(Target::Local, cmd, &[], Mode::Immediate, out)
    }

    // ------------------------------------------------------------------------
    // Remote commands
    // ------------------------------------------------------------------------

    pub fn remote_cmd_raw(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        params: &[u8],
        mode: Mode,
    ) -> Result<(), Error> {
        self.command(Target::Remote(addr), cmd, params, mode, &mut []).map(|_| ())
    }

    pub fn remote_cmd_str(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        value: &str,
        mode: Mode,
    ) -> Result<(), Error> {
        self.remote_cmd_raw(addr, cmd, value.as_bytes(), mode)
    }

    pub fn remote_cmd_byte(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        value: u8,
        mode: Mode,
    ) -> Result<(), Error> {
        self.remote_cmd_raw(addr, cmd, &[value], mode)
    }

    pub fn remote_cmd_u16(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        value: u16,
        mode: Mode,
    ) -> Result<(), Error> {
        self.remote_cmd_raw(addr, cmd, &value.to_be_bytes(), mode)
    }

    pub fn remote_cmd_noparm(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        mode: Mode,
    ) -> Result<(), Error> {
        self.remote_cmd_raw(addr, cmd, &[], mode)
    }

    pub fn remote_query(
        &mut self,
        addr: Ipv4Addr,
        cmd: &[u8; 2],
        out: &mut [u8],
    ) -> Result<usize, Error> {
        self.command(Target::Remote(addr), cmd, &[], Mode::Immediate, out)
    }

    // ------------------------------------------------------------------------
    // Data and scanning
    // ------------------------------------------------------------------------

    /// Transmit data to `dest`
    ///
    /// With `confirm` set, blocks until the module reports the delivery outcome.
    ///
    /// # Example
    /// ```ignore
    /// let opts = TxOptions::tcp(80, 0, false);
    /// xbee.transmit(Ipv4Addr::new(10, 0, 0, 2), Framing::Ipv4(opts), request, true)?;
    /// ```
    pub fn transmit(
        &mut self,
        dest: Ipv4Addr,
        framing: Framing,
        data: &[u8],
        confirm: bool,
    ) -> Result<(), Error> {
        self.radio.transmit(&mut self.events, dest, framing, data, confirm)
    }

    /// Start an active scan
    ///
    /// Resets the network first, dropping any association. Each access point heard
    /// is reported through [`Events::on_scan`] while servicing.
    pub fn initiate_scan(&mut self) -> Result<(), Error> {
        self.at_cmd_noparm(NETWORK_RESET, Mode::Immediate)?;
        let settle = self.radio.config.scan_settle;
        self.radio.sleep(settle);
        self.at_cmd_noparm(ACTIVE_SCAN, Mode::Immediate)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// The most recent link status reported by the module
    pub fn last_status(&self) -> u8 {
        self.radio.last_status
    }

    pub fn config(&self) -> &Config {
        &self.radio.config
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut E {
        &mut self.events
    }

    /// Give back the transport, clock and events
    pub fn release(self) -> (T, C, E) {
        (self.radio.bus.into_inner(), self.radio.clock, self.events)
    }
}
