//! Handlers for frames the module sends unprompted
//!
//! Each handler is entered with the frame type already read and consumes exactly
//! the payload and the trailing checksum, so the bus stays framed whatever the
//! handler decides to do with the contents.
//!
//! Data reception payload, IPv4 framing (0xB0):
//!   | src addr[4] | dst port[2] | src port[2] | protocol | status | data... |
//!
//! Data reception payload, compatibility framing (0x80):
//!   | 0x00[4] src addr[4] | rssi | options | data... |
//!
//! I/O sample payload (0x8F), fixed offsets:
//!   | 0x00[4] src addr[4] | options | count | reserved | digital mask[2] |
//!   | analog mask | digital samples[2] | analog samples[2] |

use core::net::Ipv4Addr;

use heapless::Vec;

use crate::command::ACTIVE_SCAN;
use crate::events::{COMPAT_PORT, Events, MAX_SSID_LEN, RxInfo, Sample, ScanResult};
use crate::frame::{Checksum, FrameType};
use crate::log::{debug, warn};
use crate::radio::Radio;
use crate::transport::{Clock, Transport};
use crate::tx::Protocol;
use crate::Error;

/// Header bytes ahead of the data in both reception framings
pub const DATA_HEADER_LEN: usize = 10;

/// Scan responses no longer than this carry no access point
const SCAN_HEADER_LEN: usize = 8;

impl<T: Transport, C: Clock, const N: usize> Radio<T, C, N> {
    /// Stream a data reception frame to the consumer, in chunks of at most `N`
    pub(crate) fn rx_data<E: Events>(
        &mut self,
        events: &mut E,
        kind: FrameType,
        len: usize,
    ) -> Result<(), Error> {
        let mut buf = [0u8; N];
        let mut fill = 0;
        let mut sum = Checksum::new(kind as u8);
        let mut addr = [0u8; 4];
        let mut info = RxInfo::new(self.rx_seq, len.saturating_sub(DATA_HEADER_LEN));

        if kind == FrameType::Rx64 {
            info.source_port = COMPAT_PORT;
            info.dest_port = COMPAT_PORT;
        }

        for pos in 0..len {
            let b = self.bus.read()?;
            sum.push(b);

            if pos < DATA_HEADER_LEN {
                match (kind, pos) {
                    (FrameType::RxIpv4, 0..=3) => addr[pos] = b,
                    (FrameType::RxIpv4, 4) => info.dest_port = u16::from(b) << 8,
                    (FrameType::RxIpv4, 5) => info.dest_port |= u16::from(b),
                    (FrameType::RxIpv4, 6) => info.source_port = u16::from(b) << 8,
                    (FrameType::RxIpv4, 7) => info.source_port |= u16::from(b),
                    (FrameType::RxIpv4, 8) => info.protocol = Protocol::from_u8(b),
                    (FrameType::Rx64, 4..=7) => addr[pos - 4] = b,
                    _ => {}
                }
                if pos == DATA_HEADER_LEN - 1 {
                    info.source_addr = Ipv4Addr::from(addr);
                }
                continue;
            }

            if fill == N {
                self.deliver(events, &buf[..fill], &info);
                info.offset += fill;
                fill = 0;
            }
            buf[fill] = b;
            fill += 1;
        }

        let incoming = self.bus.read()?;
        info.source_addr = Ipv4Addr::from(addr);
        info.is_final = true;
        info.checksum_error = !sum.matches(incoming);
        if info.checksum_error {
            warn!("checksum mismatch on data frame, sequence {}", info.sequence);
        }

        self.deliver(events, &buf[..fill], &info);
        self.rx_seq = self.rx_seq.wrapping_add(1);
        Ok(())
    }

    fn deliver<E: Events>(&mut self, events: &mut E, data: &[u8], info: &RxInfo) {
        self.depth += 1;
        events.on_data(self, data, info);
        self.depth -= 1;
    }

    /// Parse an I/O sample while streaming it, dispatching only if the checksum holds
    pub(crate) fn rx_sample<E: Events>(&mut self, events: &mut E, len: usize) -> Result<(), Error> {
        let mut sample = Sample::default();
        let mut addr = [0u8; 4];
        let mut sum = Checksum::new(FrameType::IoSample as u8);

        for pos in 0..len {
            let b = self.bus.read()?;
            sum.push(b);
            match pos {
                4..=7 => addr[pos - 4] = b,
                11 => sample.digital_mask = u16::from(b) << 8,
                12 => sample.digital_mask |= u16::from(b),
                13 => sample.analog_mask = b,
                14 => sample.digital_samples = u16::from(b) << 8,
                15 => sample.digital_samples |= u16::from(b),
                16 => sample.analog_samples = u16::from(b) << 8,
                17 => sample.analog_samples |= u16::from(b),
                _ => {}
            }
        }
        sample.source_addr = Ipv4Addr::from(addr);

        let incoming = self.bus.read()?;
        if sum.matches(incoming) {
            events.on_sample(&sample);
        } else {
            debug!("dropping sample with bad checksum");
        }
        Ok(())
    }

    /// Record and dispatch a link status frame
    pub(crate) fn rx_status<E: Events>(&mut self, events: &mut E, len: usize) -> Result<(), Error> {
        if len != 1 {
            warn!("status frame of length {}, discarding", len);
            for _ in 0..=len {
                self.bus.read()?;
            }
            return Ok(());
        }

        let status = self.bus.read()?;
        let mut sum = Checksum::new(FrameType::ModemStatus as u8);
        sum.push(status);
        if !sum.matches(self.bus.read()?) {
            warn!("checksum mismatch on status frame");
            return Ok(());
        }

        self.last_status = status;
        events.on_status(status);
        Ok(())
    }

    /// Handle a command response that arrived outside a command exchange
    ///
    /// Only active scan responses are expected here.
    pub(crate) fn handle_scan<E: Events>(&mut self, events: &mut E, payload: &[u8]) {
        if payload.len() < 4 || &payload[1..3] != ACTIVE_SCAN || payload[3] != 0x00 {
            warn!("unsolicited command response is not a scan result");
            return;
        }
        if payload.len() <= SCAN_HEADER_LEN {
            debug!("scan complete");
            return;
        }

        let name = &payload[SCAN_HEADER_LEN..];
        let name = &name[..name.len().min(MAX_SSID_LEN)];
        let mut ssid = Vec::new();
        // Cannot fail, the name was clamped to capacity
        let _ = ssid.extend_from_slice(name);

        let result = ScanResult {
            channel: payload[5],
            encryption: payload[6],
            signal: payload[7],
            ssid,
        };
        events.on_scan(&result);
    }
}
