//! Buffered data reception
//!
//! [`Buffered`] captures received data into a fixed-capacity ring instead of
//! handing each chunk to a callback, so the application can pull bytes when it
//! wants them. Data that arrives while the ring is full is lost and the overrun
//! flag is raised.
//!
//! # Example
//! ```ignore
//! let mut xbee: Xbee<_, _, Buffered<(), 512>> = Xbee::new(spi, clock, Buffered::new(()));
//!
//! while xbee.available() > 0 {
//!     let b = xbee.read();
//!     // ...
//! }
//! if xbee.overran(true) {
//!     // data was dropped
//! }
//! ```

use heapless::Deque;

use crate::events::{Events, Link, RxInfo, Sample, ScanResult};
use crate::log::warn;
use crate::transport::{Clock, Transport};
use crate::xbee::Xbee;

/// Fixed-capacity byte FIFO with sticky overrun detection
pub struct RingBuffer<const CAP: usize> {
    data: Deque<u8, CAP>,
    overrun: bool,
}

impl<const CAP: usize> RingBuffer<CAP> {
    pub const fn new() -> Self {
        Self {
            data: Deque::new(),
            overrun: false,
        }
    }

    /// Append as much of `bytes` as fits, returning the number accepted
    pub fn write(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &b in bytes {
            if self.data.push_back(b).is_err() {
                break;
            }
            accepted += 1;
        }
        if accepted < bytes.len() {
            warn!("ring buffer overrun, dropped {} bytes", bytes.len() - accepted);
            self.overrun = true;
        }
        accepted
    }

    /// Remove and return the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.data.pop_front()
    }

    /// Return the oldest byte without removing it
    pub fn peek(&self) -> Option<u8> {
        self.data.front().copied()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        CAP
    }

    /// Empty the buffer. The overrun flag is left alone.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Whether data has been dropped, clearing the flag if `reset` is set
    pub fn overran(&mut self, reset: bool) -> bool {
        let overrun = self.overrun;
        if reset {
            self.overrun = false;
        }
        overrun
    }
}

impl<const CAP: usize> Default for RingBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Events`] adapter that buffers received data
///
/// Status, scan and sample events are passed on to the inner `E`.
pub struct Buffered<E: Events, const CAP: usize> {
    ring: RingBuffer<CAP>,
    inner: E,
}

impl<E: Events, const CAP: usize> Buffered<E, CAP> {
    pub fn new(inner: E) -> Self {
        Self {
            ring: RingBuffer::new(),
            inner,
        }
    }

    pub fn ring(&self) -> &RingBuffer<CAP> {
        &self.ring
    }

    pub fn ring_mut(&mut self) -> &mut RingBuffer<CAP> {
        &mut self.ring
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.inner
    }
}

impl<E: Events, const CAP: usize> Events for Buffered<E, CAP> {
    fn on_data(&mut self, _link: &mut dyn Link, data: &[u8], _info: &RxInfo) {
        self.ring.write(data);
    }

    fn on_status(&mut self, status: u8) {
        self.inner.on_status(status);
    }

    fn on_scan(&mut self, result: &ScanResult) {
        self.inner.on_scan(result);
    }

    fn on_sample(&mut self, sample: &Sample) {
        self.inner.on_sample(sample);
    }
}

impl<T: Transport, C: Clock, E: Events, const CAP: usize, const N: usize>
    Xbee<T, C, Buffered<E, CAP>, N>
{
    /// Number of buffered bytes
    pub fn available(&self) -> usize {
        self.events.ring.len()
    }

    /// Next byte, servicing the bus first if nothing is buffered
    ///
    /// Returns 0 when nothing is available; use [`Xbee::available`] to tell that
    /// apart from a received zero.
    pub fn read(&mut self) -> u8 {
        self.fill_if_empty();
        self.events.ring.pop().unwrap_or(0)
    }

    /// Like [`Xbee::read`] but leaves the byte buffered
    pub fn peek(&mut self) -> u8 {
        self.fill_if_empty();
        self.events.ring.peek().unwrap_or(0)
    }

    /// Discard everything buffered without touching the bus
    pub fn flush(&mut self) {
        self.events.ring.clear();
    }

    /// Whether data has been dropped, clearing the flag if `reset` is set
    pub fn overran(&mut self, reset: bool) -> bool {
        self.events.ring.overran(reset)
    }

    fn fill_if_empty(&mut self) {
        if self.events.ring.is_empty() {
            if let Err(e) = self.service() {
                warn!("service failed while reading: {:?}", e);
            }
        }
    }
}
