//! API frame wire format
//!
//! Every exchange with the module, in both directions, is carried in an API frame:
//!   +--------+--------+--------+--------+-----------------+----------+
//!   | 0x7E   | Len MSB| Len LSB| Type   | Payload...      | Checksum |
//!   +--------+--------+--------+--------+-----------------+----------+
//!
//! The length field counts the type byte and the payload, never the start byte,
//! the length itself or the checksum: `len = payload.len() + 1`.
//!
//! The checksum covers the type byte and the payload:
//! `checksum = 0xFF - ((type + sum(payload)) mod 256)`.
//!
//! Payload layouts used by this crate:
//!   - local command (0x08 / 0x09): ATID | cmd[2] | parameter...
//!   - remote command (0x07): ATID | 0x00[4] | address[4] | options | cmd[2] | parameter...
//!   - command response (0x88): ATID | cmd[2] | status | value...
//!   - remote command response (0x87): ATID | 0x00[4] | address[4] | cmd[2] | status | value...
//!   - transmit status (0x89): ATID | delivery status
//!   - link status (0x8A): status
//!
//! The data reception, transmit and sample layouts are described next to their
//! handlers in `rx` and `tx`.

use crate::Error;

/// Start delimiter of every frame
pub const START_BYTE: u8 = 0x7E;

/// Bytes around the payload: start, length (2), type, checksum
pub const FRAME_OVERHEAD: usize = 5;

/// API frame type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrameType {
    Tx64 = 0x00,
    RemoteCommand = 0x07,
    Command = 0x08,
    CommandQueued = 0x09,
    TxIpv4 = 0x20,
    Rx64 = 0x80,
    RemoteCommandResponse = 0x87,
    CommandResponse = 0x88,
    TxStatus = 0x89,
    ModemStatus = 0x8A,
    IoSample = 0x8F,
    RxIpv4 = 0xB0,
}

impl FrameType {
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0x00 => FrameType::Tx64,
            0x07 => FrameType::RemoteCommand,
            0x08 => FrameType::Command,
            0x09 => FrameType::CommandQueued,
            0x20 => FrameType::TxIpv4,
            0x80 => FrameType::Rx64,
            0x87 => FrameType::RemoteCommandResponse,
            0x88 => FrameType::CommandResponse,
            0x89 => FrameType::TxStatus,
            0x8A => FrameType::ModemStatus,
            0x8F => FrameType::IoSample,
            0xB0 => FrameType::RxIpv4,
            _ => return None,
        })
    }
}

/// A decoded frame: its type and the number of payload bytes placed in the caller's buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub frame_type: u8,
    pub len: usize,
}

impl Frame {
    pub fn kind(&self) -> Option<FrameType> {
        FrameType::from_u8(self.frame_type)
    }
}

/// Running checksum over a frame's type and payload bytes
#[derive(Debug, Clone, Copy)]
pub struct Checksum(u8);

impl Checksum {
    pub fn new(frame_type: u8) -> Self {
        Self(frame_type)
    }

    pub fn push(&mut self, byte: u8) {
        self.0 = self.0.wrapping_add(byte);
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    /// The checksum byte to put on the wire
    pub fn value(&self) -> u8 {
        0xFF - self.0
    }

    pub fn matches(&self, incoming: u8) -> bool {
        self.value() == incoming
    }
}

/// Checksum of a complete frame
pub fn checksum(frame_type: u8, payload: &[u8]) -> u8 {
    let mut sum = Checksum::new(frame_type);
    sum.extend(payload);
    sum.value()
}

/// Length field value for a payload of `payload_len` bytes
pub fn length_field(payload_len: usize) -> Result<u16, Error> {
    u16::try_from(payload_len + 1).map_err(|_| Error::ParameterTooLarge)
}

/// Payload length announced by a received length field
pub fn payload_len(msb: u8, lsb: u8) -> usize {
    (u16::from_be_bytes([msb, lsb]) as usize).saturating_sub(1)
}

/// Encode a frame into `out`, returning the number of bytes written
pub fn encode(frame_type: u8, payload: &[u8], out: &mut [u8]) -> Result<usize, Error> {
    let [msb, lsb] = length_field(payload.len())?.to_be_bytes();
    let total = payload.len() + FRAME_OVERHEAD;
    if total > out.len() {
        return Err(Error::ParameterTooLarge);
    }

    out[0] = START_BYTE;
    out[1] = msb;
    out[2] = lsb;
    out[3] = frame_type;
    out[4..4 + payload.len()].copy_from_slice(payload);
    out[total - 1] = checksum(frame_type, payload);

    Ok(total)
}

/// Consume a frame body of `len` payload bytes plus the trailing checksum
///
/// Every byte is pulled from `next` even when `buf` is too small, so the source
/// stays framed. Truncation is reported ahead of a checksum failure.
pub(crate) fn read_body<F>(
    frame_type: u8,
    len: usize,
    buf: &mut [u8],
    mut next: F,
) -> Result<usize, Error>
where
    F: FnMut() -> Result<u8, Error>,
{
    let mut sum = Checksum::new(frame_type);
    for i in 0..len {
        let b = next()?;
        sum.push(b);
        if let Some(slot) = buf.get_mut(i) {
            *slot = b;
        }
    }
    let incoming = next()?;

    if len > buf.len() {
        Err(Error::Truncated)
    } else if !sum.matches(incoming) {
        Err(Error::ChecksumMismatch)
    } else {
        Ok(len)
    }
}

/// Decode one frame from the front of `bytes`, copying its payload into `buf`
///
/// On `Truncated`, the first `buf.len()` payload bytes are in `buf`.
pub fn decode(bytes: &[u8], buf: &mut [u8]) -> Result<Frame, Error> {
    let mut iter = bytes.iter().copied();
    let mut next = || iter.next().ok_or(Error::Incomplete);

    if next()? != START_BYTE {
        return Err(Error::InvalidStartByte);
    }
    let msb = next()?;
    let lsb = next()?;
    let len = payload_len(msb, lsb);
    let frame_type = next()?;
    let len = read_body(frame_type, len, buf, next)?;

    Ok(Frame { frame_type, len })
}

/// Builder for command frame payloads
///
/// The builder only lays out the payload; the start byte, length, type and
/// checksum are added when the frame is written to the bus.
pub struct FrameBuilder<const N: usize> {
    buffer: [u8; N],
    pos: usize,
}

impl<const N: usize> FrameBuilder<N> {
    pub fn new() -> Self {
        Self {
            buffer: [0u8; N],
            pos: 0,
        }
    }

    /// Build a local command header
    ///
    /// Format: atid | cmd[0] | cmd[1]
    pub fn command(mut self, atid: u8, cmd: &[u8; 2]) -> Result<Self, Error> {
        self = self.bytes(&[atid])?;
        self.bytes(cmd)
    }

    /// Build a remote command header
    ///
    /// Format: atid | 0x00 0x00 0x00 0x00 | addr[4] | options | cmd[0] | cmd[1]
    pub fn remote_command(
        mut self,
        atid: u8,
        addr: [u8; 4],
        options: u8,
        cmd: &[u8; 2],
    ) -> Result<Self, Error> {
        self = self.bytes(&[atid, 0x00, 0x00, 0x00, 0x00])?;
        self = self.bytes(&addr)?;
        self = self.bytes(&[options])?;
        self.bytes(cmd)
    }

    /// Append raw bytes to the payload
    pub fn bytes(mut self, bytes: &[u8]) -> Result<Self, Error> {
        if self.pos + bytes.len() > N {
            return Err(Error::ParameterTooLarge);
        }
        self.buffer[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
        Ok(self)
    }

    /// Get the payload bytes as a slice
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[..self.pos]
    }

    /// Get the length of the payload
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl<const N: usize> Default for FrameBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORK: usize = 128;

    fn encoded(frame_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; payload.len() + FRAME_OVERHEAD];
        let n = encode(frame_type, payload, &mut out).unwrap();
        out.truncate(n);
        out
    }

    #[test]
    fn test_checksum_known_value() {
        // 0x08 + 0x01 + 'V' + 'R' = 0xB1
        assert_eq!(checksum(0x08, &[0x01, b'V', b'R']), 0x4E);
        assert_eq!(checksum(0x8A, &[0x02]), 0x73);
    }

    #[test]
    fn test_checksum_detects_single_byte_flip() {
        let payload: Vec<u8> = (0..40u8).map(|b| b.wrapping_mul(7)).collect();
        for frame_type in [0x00u8, 0x88, 0xB0, 0xFF] {
            let wire = encoded(frame_type, &payload);
            let mut buf = [0u8; WORK];
            assert!(decode(&wire, &mut buf).is_ok());

            for i in 4..wire.len() - 1 {
                let mut corrupt = wire.clone();
                corrupt[i] ^= 0x10;
                assert_eq!(decode(&corrupt, &mut buf), Err(Error::ChecksumMismatch));
            }
        }
    }

    #[test]
    fn test_round_trip_boundary_lengths() {
        for len in [0usize, 1, WORK] {
            let payload: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let wire = encoded(0x88, &payload);
            assert_eq!(wire.len(), len + FRAME_OVERHEAD);

            let mut buf = [0u8; WORK];
            let frame = decode(&wire, &mut buf).unwrap();
            assert_eq!(frame.frame_type, 0x88);
            assert_eq!(frame.kind(), Some(FrameType::CommandResponse));
            assert_eq!(&buf[..frame.len], &payload[..]);
        }
    }

    #[test]
    fn test_length_field_excludes_checksum() {
        let wire = encoded(0x8A, &[0x02]);
        assert_eq!(wire, vec![0x7E, 0x00, 0x02, 0x8A, 0x02, 0x73]);
        assert_eq!(payload_len(wire[1], wire[2]), 1);
    }

    #[test]
    fn test_length_field_overflow() {
        assert_eq!(length_field(0xFFFE), Ok(0xFFFF));
        assert_eq!(length_field(0xFFFF), Err(Error::ParameterTooLarge));
        assert_eq!(length_field(65_540), Err(Error::ParameterTooLarge));
    }

    #[test]
    fn test_truncation_keeps_prefix() {
        let payload: Vec<u8> = (0..20u8).collect();
        let wire = encoded(0x88, &payload);
        let mut buf = [0u8; 8];
        assert_eq!(decode(&wire, &mut buf), Err(Error::Truncated));
        assert_eq!(&buf[..], &payload[..8]);
    }

    #[test]
    fn test_invalid_start_and_incomplete() {
        let mut buf = [0u8; 8];
        assert_eq!(decode(&[0x7F, 0x00, 0x01, 0x8A, 0x75], &mut buf), Err(Error::InvalidStartByte));
        assert_eq!(decode(&[0x7E, 0x00, 0x02, 0x8A], &mut buf), Err(Error::Incomplete));
    }

    #[test]
    fn test_encode_rejects_small_output() {
        let mut out = [0u8; 6];
        assert_eq!(encode(0x08, &[1, 2, 3], &mut out), Err(Error::ParameterTooLarge));
    }

    #[test]
    fn test_command_builder() {
        let payload = FrameBuilder::<16>::new()
            .command(0x01, b"VR")
            .unwrap();
        assert_eq!(payload.as_slice(), &[0x01, b'V', b'R']);
    }

    #[test]
    fn test_remote_command_builder() {
        let payload = FrameBuilder::<32>::new()
            .remote_command(0x05, [192, 168, 1, 20], 0x02, b"DL")
            .unwrap()
            .bytes(&[0x0A])
            .unwrap();

        let expected = &[
            0x05, 0x00, 0x00, 0x00, 0x00, 0xC0, 0xA8, 0x01, 0x14, 0x02, b'D', b'L', 0x0A,
        ];
        assert_eq!(payload.as_slice(), expected);
        assert_eq!(payload.len(), 13);
    }

    #[test]
    fn test_builder_overflow() {
        let res = FrameBuilder::<4>::new().command(0x01, b"ID").unwrap().bytes(&[1, 2]);
        assert!(matches!(res, Err(Error::ParameterTooLarge)));
    }
}
