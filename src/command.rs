//! Command/response correlation
//!
//! A command is sent in one frame and, unless it is queued, answered by exactly one
//! response frame carrying the same ATID. Only one command is outstanding at a
//! time, so the ATID alone identifies the response.

use core::net::Ipv4Addr;

use crate::atid::Atid;
use crate::events::Events;
use crate::frame::{FrameBuilder, FrameType};
use crate::log::{debug, warn};
use crate::radio::Radio;
use crate::transport::{Clock, Transport};
use crate::Error;

/// Network reset
pub const NETWORK_RESET: &[u8; 2] = b"NR";
/// Active scan; answered asynchronously, once per access point heard
pub const ACTIVE_SCAN: &[u8; 2] = b"AS";

/// Payload bytes ahead of the parameter in a local command
pub const LOCAL_HEADER_LEN: usize = 3;
/// Payload bytes ahead of the parameter in a remote command
pub const REMOTE_HEADER_LEN: usize = 12;

/// Payload bytes ahead of the value in a local response: atid, cmd[2], status
const LOCAL_RESPONSE_LEN: usize = 4;
/// Payload bytes ahead of the value in a remote response
const REMOTE_RESPONSE_LEN: usize = 12;

/// Remote option: apply the change immediately
const REMOTE_APPLY: u8 = 0x02;

const STATUS_OK: u8 = 0x00;

/// Where a command is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The attached module
    Local,
    /// Another module, addressed over the network
    Remote(Ipv4Addr),
}

/// When a command takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Executed at once and answered with a response frame
    #[default]
    Immediate,
    /// Local: queued until applied, no response is sent and success is assumed.
    /// Remote: the change is held until applied; the remote still responds.
    Queued,
}

impl<T: Transport, C: Clock, const N: usize> Radio<T, C, N> {
    /// Issue a command and wait for its response
    ///
    /// Returns the number of response value bytes copied into `out`, truncated to
    /// `out.len()`.
    pub(crate) fn command<E: Events>(
        &mut self,
        events: &mut E,
        target: Target,
        cmd: &[u8; 2],
        params: &[u8],
        mode: Mode,
        out: &mut [u8],
    ) -> Result<usize, Error> {
        if self.depth > 0 {
            warn!("command rejected inside a data delivery");
            return Err(Error::ReentrancyViolation);
        }

        let header = match target {
            Target::Local => LOCAL_HEADER_LEN,
            Target::Remote(_) => REMOTE_HEADER_LEN,
        };
        if params.len() + header > N {
            warn!("command parameter of {} bytes too large", params.len());
            return Err(Error::ParameterTooLarge);
        }

        self.drain_pending(events)?;

        let queued = target == Target::Local && mode == Mode::Queued;
        if !queued {
            self.atid.go_next();
        }
        let atid = if queued { Atid::NONE } else { self.atid }.inner();

        let (frame_type, payload) = match target {
            Target::Local => {
                let frame_type = if queued { FrameType::CommandQueued } else { FrameType::Command };
                (frame_type, FrameBuilder::<N>::new().command(atid, cmd)?.bytes(params)?)
            }
            Target::Remote(addr) => {
                let options = if mode == Mode::Immediate { REMOTE_APPLY } else { 0x00 };
                let payload = FrameBuilder::<N>::new()
                    .remote_command(atid, addr.octets(), options, cmd)?
                    .bytes(params)?;
                (FrameType::RemoteCommand, payload)
            }
        };
        self.tx_frame(frame_type, payload.as_slice())?;

        if queued || (target == Target::Local && cmd == ACTIVE_SCAN) {
            return Ok(0);
        }

        let mut buf = [0u8; N];
        let frame = self.rx_frame(events, &mut buf, self.config.command_timeout, false)?;
        let response = &buf[..frame.len];

        let (expected, value_at) = match target {
            Target::Local => (FrameType::CommandResponse, LOCAL_RESPONSE_LEN),
            Target::Remote(_) => (FrameType::RemoteCommandResponse, REMOTE_RESPONSE_LEN),
        };
        if frame.kind() != Some(expected) || response.len() < value_at {
            warn!("unexpected response frame {:#x}", frame.frame_type);
            return Err(Error::ResponseMismatch);
        }
        if !self.atid.matches(response[0]) {
            warn!("response atid {} != {}", response[0], atid);
            return Err(Error::ResponseMismatch);
        }
        if response[value_at - 1] != STATUS_OK {
            warn!("command failed with status {}", response[value_at - 1]);
            return Err(Error::ResponseMismatch);
        }
        if let Target::Remote(addr) = target {
            if response[5..9] != addr.octets() {
                warn!("remote response from the wrong address");
                return Err(Error::ResponseMismatch);
            }
        }

        let value = &response[value_at..];
        let n = value.len().min(out.len());
        out[..n].copy_from_slice(&value[..n]);
        debug!("command ok, {} value bytes", value.len());
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lengths_match_builder() {
        let local = FrameBuilder::<64>::new().command(1, b"VR").unwrap();
        assert_eq!(local.len(), LOCAL_HEADER_LEN);

        let remote = FrameBuilder::<64>::new()
            .remote_command(1, [10, 0, 0, 1], REMOTE_APPLY, b"VR")
            .unwrap();
        assert_eq!(remote.len(), REMOTE_HEADER_LEN);
    }

    #[test]
    fn test_default_mode_is_immediate() {
        assert_eq!(Mode::default(), Mode::Immediate);
    }
}
