//! Protocol engine core
//!
//! Owns the bus, the sequence counters and the reentrancy depth. Frame dispatch
//! lives in `rx`, commands in `command` and data transmission in `tx`; this module
//! holds the receive loop they all share.

use core::time::Duration;

use crate::atid::Atid;
use crate::bus::Bus;
use crate::config::Config;
use crate::events::Events;
use crate::frame::{self, Checksum, Frame, FrameType, START_BYTE};
use crate::log::{debug, error, info, warn};
use crate::transport::{Clock, Transport};
use crate::Error;

/// Smallest usable working buffer
pub const MIN_BUFFER_SIZE: usize = 48;

pub(crate) struct Radio<T: Transport, C: Clock, const N: usize> {
    pub(crate) bus: Bus<T>,
    pub(crate) clock: C,
    pub(crate) config: Config,
    pub(crate) atid: Atid,
    pub(crate) rx_seq: u16,
    pub(crate) depth: u8,
    pub(crate) last_status: u8,
}

impl<T: Transport, C: Clock, const N: usize> Radio<T, C, N> {
    pub fn new(transport: T, clock: C, config: Config) -> Self {
        const {
            assert!(N >= MIN_BUFFER_SIZE);
        }
        Self {
            bus: Bus::new(transport),
            clock,
            config,
            atid: Atid::default(),
            rx_seq: 0,
            depth: 0,
            last_status: 0,
        }
    }

    /// Wait for the attention line, up to `wait`
    ///
    /// A zero wait checks the line exactly once.
    pub(crate) fn wait_ready(&mut self, wait: Duration) -> Result<(), Error> {
        let limit = wait.as_millis() as u64;
        let start = self.clock.now_ms();
        loop {
            if self.bus.ready()? {
                return Ok(());
            }
            if self.clock.now_ms().wrapping_sub(start) >= limit {
                return Err(Error::WaitTimeout);
            }
        }
    }

    /// Read and discard until the attention line drops
    pub(crate) fn flush(&mut self) -> Result<usize, Error> {
        self.bus.claim()?;
        let mut dropped = 0;
        while self.bus.ready()? {
            self.bus.read()?;
            dropped += 1;
        }
        self.bus.release()?;
        warn!("flushed {} bytes", dropped);
        Ok(dropped)
    }

    /// Write one frame made of the concatenation of `parts`
    pub(crate) fn write_frame(&mut self, frame_type: u8, parts: &[&[u8]]) -> Result<(), Error> {
        let len: usize = parts.iter().map(|p| p.len()).sum();
        let [msb, lsb] = frame::length_field(len)?.to_be_bytes();
        let mut sum = Checksum::new(frame_type);

        self.bus.write(&[START_BYTE, msb, lsb, frame_type])?;
        for part in parts {
            sum.extend(part);
            self.bus.write(part)?;
        }
        self.bus.write(&[sum.value()])
    }

    /// Transmit a single frame as one bus claim
    pub(crate) fn tx_frame(&mut self, frame_type: FrameType, payload: &[u8]) -> Result<(), Error> {
        debug!("tx frame {:?} len {}", frame_type, payload.len());
        self.bus.claim()?;
        let res = self.write_frame(frame_type as u8, &[payload]);
        self.bus.release()?;
        res
    }

    /// Receive frames until one the caller must see arrives
    ///
    /// Data, sample and link status frames are dispatched to `events` on the way
    /// and never returned, except link status when `want_status` is set.
    /// Command responses and transmit status frames are returned with their
    /// payload in `buf`.
    pub(crate) fn rx_frame<E: Events>(
        &mut self,
        events: &mut E,
        buf: &mut [u8],
        wait: Duration,
        want_status: bool,
    ) -> Result<Frame, Error> {
        loop {
            if let Err(e) = self.wait_ready(wait) {
                if !wait.is_zero() {
                    warn!("no frame within {} ms", wait.as_millis() as u64);
                }
                return Err(e);
            }

            self.bus.claim()?;
            let res = self.rx_one(events, buf, want_status);
            self.bus.release()?;

            if let Some(frame) = res? {
                return Ok(frame);
            }
        }
    }

    fn rx_one<E: Events>(
        &mut self,
        events: &mut E,
        buf: &mut [u8],
        want_status: bool,
    ) -> Result<Option<Frame>, Error> {
        let start = self.bus.read()?;
        if start != START_BYTE {
            warn!("invalid start byte {:#x}", start);
            self.flush()?;
            return Err(Error::InvalidStartByte);
        }

        let msb = self.bus.read()?;
        let lsb = self.bus.read()?;
        let len = frame::payload_len(msb, lsb);
        let frame_type = self.bus.read()?;
        debug!("rx frame {:#x} len {}", frame_type, len);

        match FrameType::from_u8(frame_type) {
            Some(kind @ (FrameType::RxIpv4 | FrameType::Rx64)) => {
                self.rx_data(events, kind, len)?;
                Ok(None)
            }
            Some(FrameType::IoSample) => {
                self.rx_sample(events, len)?;
                Ok(None)
            }
            Some(FrameType::ModemStatus) if !want_status => {
                self.rx_status(events, len)?;
                Ok(None)
            }
            Some(
                FrameType::ModemStatus
                | FrameType::TxStatus
                | FrameType::RemoteCommandResponse
                | FrameType::CommandResponse,
            ) => {
                let bus = &mut self.bus;
                let res = frame::read_body(frame_type, len, buf, || bus.read());
                if let Err(e) = res {
                    warn!("rx frame {:#x} failed: {:?}", frame_type, e);
                }
                let len = res?;
                Ok(Some(Frame { frame_type, len }))
            }
            _ => {
                debug!("dropping unsupported frame {:#x}", frame_type);
                for _ in 0..=len {
                    self.bus.read()?;
                }
                Ok(None)
            }
        }
    }

    /// Dispatch everything currently queued by the module
    pub(crate) fn service<E: Events>(&mut self, events: &mut E) -> Result<(), Error> {
        let mut buf = [0u8; N];
        loop {
            match self.rx_frame(events, &mut buf, Duration::ZERO, false) {
                Ok(frame) if frame.kind() == Some(FrameType::CommandResponse) => {
                    self.handle_scan(events, &buf[..frame.len]);
                }
                Ok(frame) => {
                    debug!("ignoring unsolicited frame {:#x}", frame.frame_type);
                }
                Err(Error::WaitTimeout) => return Ok(()),
                Err(Error::Transport) => {
                    error!("transport failed while servicing");
                    return Err(Error::Transport);
                }
                Err(_) => {}
            }
        }
    }

    /// Claim and lock the bus, then dispatch any frames already pending
    ///
    /// The bus stays claimed on success, so the write that follows goes out
    /// without the select line dropping in between.
    pub(crate) fn drain_pending<E: Events>(&mut self, events: &mut E) -> Result<(), Error> {
        self.bus.claim()?;
        self.bus.lock();
        let res = self.service(events);
        self.bus.unlock();
        if res.is_err() {
            self.bus.release()?;
        }
        res
    }

    /// Run the hardware reset and read back the status frame it produces
    pub(crate) fn reset<E: Events>(&mut self, events: &mut E) -> Result<(), Error> {
        if !self.bus.reset_sequence()? {
            debug!("no reset lines, assuming SPI mode");
            return Ok(());
        }

        let wait = self.config.reset_timeout;
        let mut buf = [0u8; N];
        let frame = self.rx_frame(events, &mut buf, wait, true)?;
        if frame.kind() != Some(FrameType::ModemStatus) || frame.len != 1 {
            warn!("expected status frame after reset, got {:#x}", frame.frame_type);
            return Err(Error::ResponseMismatch);
        }
        self.last_status = buf[0];
        info!("module reset, status {:#x}", buf[0]);
        Ok(())
    }

    pub(crate) fn sleep(&mut self, duration: Duration) {
        self.clock.sleep_ms(duration.as_millis() as u32);
    }
}
