//! Data transmission
//!
//! IPv4 framing (0x20), header after the length field:
//!   | type | atid | dst addr[4] | dst port[2] | src port[2] | protocol | close |
//!
//! Compatibility framing (0x00), delivered to port 0xBEE on the far side:
//!   | type | atid | 0x00[4] dst addr[4] | options |
//!
//! The checksum covers the type byte through the last data byte.

use core::net::Ipv4Addr;

use crate::atid::Atid;
use crate::command::{Mode, Target};
use crate::events::{Events, Link};
use crate::frame::{self, FrameType};
use crate::log::{debug, warn};
use crate::radio::Radio;
use crate::transport::{Clock, Transport};
use crate::Error;

/// IPv4 transmit header: atid, address, ports, protocol, close flag
const IPV4_HEADER_LEN: usize = 11;
/// Compatibility transmit header: atid, 64-bit address, options
const COMPAT_HEADER_LEN: usize = 10;

const DELIVERY_OK: u8 = 0x00;

/// Transport protocol used by the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Protocol {
    #[default]
    Udp = 0x00,
    Tcp = 0x01,
}

impl Protocol {
    pub(crate) fn from_u8(value: u8) -> Self {
        if value == Protocol::Tcp as u8 { Protocol::Tcp } else { Protocol::Udp }
    }
}

/// Addressing options for IPv4 framing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TxOptions {
    pub dest_port: u16,
    pub source_port: u16,
    pub protocol: Protocol,
    /// Keep a TCP connection open after the data is sent
    pub leave_open: bool,
}

impl TxOptions {
    pub fn udp(dest_port: u16, source_port: u16) -> Self {
        Self {
            dest_port,
            source_port,
            protocol: Protocol::Udp,
            leave_open: false,
        }
    }

    pub fn tcp(dest_port: u16, source_port: u16, leave_open: bool) -> Self {
        Self {
            dest_port,
            source_port,
            protocol: Protocol::Tcp,
            leave_open,
        }
    }
}

/// Application framing of a transmit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Raw IPv4 framing with explicit ports and protocol
    Ipv4(TxOptions),
    /// Compatibility framing to the fixed application port
    Compat,
}

impl<T: Transport, C: Clock, const N: usize> Radio<T, C, N> {
    /// Transmit `data`, optionally waiting for the delivery status
    pub(crate) fn transmit<E: Events>(
        &mut self,
        events: &mut E,
        dest: Ipv4Addr,
        framing: Framing,
        data: &[u8],
        mut confirm: bool,
    ) -> Result<(), Error> {
        if data.is_empty() {
            return Err(Error::EmptyPayload);
        }
        let header_len = match framing {
            Framing::Ipv4(_) => IPV4_HEADER_LEN,
            Framing::Compat => COMPAT_HEADER_LEN,
        };
        if frame::length_field(header_len + data.len()).is_err() {
            warn!("transmit of {} bytes does not fit a frame", data.len());
            return Err(Error::ParameterTooLarge);
        }

        let reentrant = self.depth > 0;
        if reentrant && confirm {
            debug!("transmit inside a data delivery, confirmation disabled");
            confirm = false;
        }

        if !reentrant {
            self.drain_pending(events)?;
        }

        let atid = if confirm {
            self.atid.go_next();
            self.atid
        } else {
            Atid::NONE
        }
        .inner();

        let mut header = [0u8; IPV4_HEADER_LEN];
        let frame_type = match framing {
            Framing::Ipv4(opts) => {
                header[0] = atid;
                header[1..5].copy_from_slice(&dest.octets());
                header[5..7].copy_from_slice(&opts.dest_port.to_be_bytes());
                header[7..9].copy_from_slice(&opts.source_port.to_be_bytes());
                header[9] = opts.protocol as u8;
                header[10] = if opts.leave_open { 0x00 } else { 0x01 };
                FrameType::TxIpv4
            }
            Framing::Compat => {
                header[0] = atid;
                header[5..9].copy_from_slice(&dest.octets());
                FrameType::Tx64
            }
        };

        debug!("tx {:?} of {} bytes, atid {}", frame_type, data.len(), atid);
        self.bus.claim()?;
        let res = self.write_frame(frame_type as u8, &[&header[..header_len], data]);
        if !reentrant {
            self.bus.release()?;
        }
        res?;

        if !confirm {
            return Ok(());
        }

        let mut buf = [0u8; N];
        let frame = match self.rx_frame(events, &mut buf, self.config.delivery_timeout, false) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("no delivery status: {:?}", e);
                self.flush()?;
                return Err(e);
            }
        };

        if frame.kind() != Some(FrameType::TxStatus) || frame.len < 2 {
            warn!("expected delivery status, got {:#x}", frame.frame_type);
            self.flush()?;
            return Err(Error::ResponseMismatch);
        }
        if !self.atid.matches(buf[0]) {
            warn!("delivery status atid {} != {}", buf[0], atid);
            self.flush()?;
            return Err(Error::ResponseMismatch);
        }
        if buf[1] != DELIVERY_OK {
            warn!("delivery failed with status {:#x}", buf[1]);
            return Err(Error::DeliveryFailed(buf[1]));
        }
        Ok(())
    }
}

impl<T: Transport, C: Clock, const N: usize> Link for Radio<T, C, N> {
    fn transmit(
        &mut self,
        dest: Ipv4Addr,
        framing: Framing,
        data: &[u8],
        confirm: bool,
    ) -> Result<(), Error> {
        Radio::transmit(self, &mut (), dest, framing, data, confirm)
    }

    fn command(
        &mut self,
        target: Target,
        cmd: &[u8; 2],
        params: &[u8],
        mode: Mode,
    ) -> Result<(), Error> {
        Radio::command(self, &mut (), target, cmd, params, mode, &mut []).map(|_| ())
    }

    fn last_status(&self) -> u8 {
        self.last_status
    }

    fn callback_depth(&self) -> u8 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_wire_values() {
        assert_eq!(Protocol::from_u8(0x01), Protocol::Tcp);
        assert_eq!(Protocol::from_u8(0x00), Protocol::Udp);
        assert_eq!(Protocol::Tcp as u8, 0x01);
    }

    #[test]
    fn test_tx_options_constructors() {
        let opts = TxOptions::tcp(80, 4000, true);
        assert_eq!(opts.protocol, Protocol::Tcp);
        assert!(opts.leave_open);
        assert_eq!(TxOptions::udp(9750, 9750).protocol, Protocol::Udp);
    }
}
