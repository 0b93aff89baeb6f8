//! Select-line arbitration
//!
//! The select line is asserted exactly while the bus is claimed. A claim is only
//! given up when it is not locked; locking lets a transmit drain pending inbound
//! frames and then write without the select line dropping in between.

use crate::Error;
use crate::log::trace;
use crate::transport::Transport;

/// Byte sent while reading
const FILL_BYTE: u8 = 0x00;

pub(crate) struct Bus<T: Transport> {
    transport: T,
    asserted: bool,
    locked: bool,
}

impl<T: Transport> Bus<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            asserted: false,
            locked: false,
        }
    }

    /// Assert select if not already asserted
    pub fn claim(&mut self) -> Result<(), Error> {
        if !self.asserted {
            self.transport.assert_select().map_err(|_| Error::Transport)?;
            self.asserted = true;
        }
        Ok(())
    }

    /// Deassert select unless the claim is locked
    pub fn release(&mut self) -> Result<(), Error> {
        if self.asserted && !self.locked {
            self.transport.deassert_select().map_err(|_| Error::Transport)?;
            self.asserted = false;
        }
        Ok(())
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    #[cfg(test)]
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    #[cfg(test)]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn ready(&mut self) -> Result<bool, Error> {
        self.transport.ready().map_err(|_| Error::Transport)
    }

    pub fn read(&mut self) -> Result<u8, Error> {
        self.claim()?;
        let b = self.transport.transfer(FILL_BYTE).map_err(|_| Error::Transport)?;
        trace!("in {:#x}", b);
        Ok(b)
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.claim()?;
        for &b in bytes {
            self.transport.transfer(b).map_err(|_| Error::Transport)?;
        }
        Ok(())
    }

    pub fn reset_sequence(&mut self) -> Result<bool, Error> {
        self.transport.reset_sequence().map_err(|_| Error::Transport)
    }

    pub fn into_inner(self) -> T {
        self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportError;

    #[derive(Debug)]
    struct NeverFails;

    impl core::fmt::Display for NeverFails {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            write!(f, "never")
        }
    }

    impl TransportError for NeverFails {}

    #[derive(Default)]
    struct Lines {
        selected: bool,
        asserts: usize,
        deasserts: usize,
        out: Vec<u8>,
    }

    impl Transport for Lines {
        type Error = NeverFails;

        fn assert_select(&mut self) -> Result<(), Self::Error> {
            self.selected = true;
            self.asserts += 1;
            Ok(())
        }

        fn deassert_select(&mut self) -> Result<(), Self::Error> {
            self.selected = false;
            self.deasserts += 1;
            Ok(())
        }

        fn transfer(&mut self, out: u8) -> Result<u8, Self::Error> {
            assert!(self.selected, "transfer without select");
            self.out.push(out);
            Ok(0xAA)
        }

        fn ready(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }

    #[test]
    fn test_claim_and_release_are_idempotent() {
        let mut bus = Bus::new(Lines::default());
        bus.claim().unwrap();
        bus.claim().unwrap();
        assert!(bus.is_asserted());
        bus.release().unwrap();
        bus.release().unwrap();
        assert!(!bus.is_asserted());

        let lines = bus.into_inner();
        assert_eq!(lines.asserts, 1);
        assert_eq!(lines.deasserts, 1);
    }

    #[test]
    fn test_lock_holds_select() {
        let mut bus = Bus::new(Lines::default());
        bus.claim().unwrap();
        bus.lock();
        bus.release().unwrap();
        assert!(bus.is_asserted());
        assert!(bus.is_locked());

        bus.unlock();
        bus.release().unwrap();
        assert!(!bus.is_asserted());
    }

    #[test]
    fn test_lock_does_not_assert() {
        let mut bus = Bus::new(Lines::default());
        bus.lock();
        assert!(!bus.is_asserted());
        bus.unlock();
    }

    #[test]
    fn test_transfers_claim_implicitly() {
        let mut bus = Bus::new(Lines::default());
        bus.write(&[0x7E, 0x00]).unwrap();
        assert_eq!(bus.read().unwrap(), 0xAA);
        bus.release().unwrap();
        assert!(!bus.is_asserted());

        let lines = bus.into_inner();
        assert_eq!(lines.out, vec![0x7E, 0x00, FILL_BYTE]);
        assert_eq!(lines.asserts, 1);
    }
}
