/// ATID (frame ID) tags a request so that its response can be matched.
///
/// This ID is an 8-bit value, incremented once per correlated request and wrapping
/// from 0xFF back to 0x01. Zero is reserved on the wire for "no response wanted".
#[derive(Default, PartialEq, Eq, Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Atid(u8);

impl Atid {
    /// The ID sent when no response is requested
    pub const NONE: Atid = Atid(0);

    pub fn inner(&self) -> u8 {
        self.0
    }

    /// Move to the next ATID, skipping zero
    pub fn go_next(&mut self) {
        self.0 = self.0.wrapping_add(1);
        if self.0 == 0 {
            self.0 = 1;
        }
    }

    /// Check if a response byte carries this ID
    pub fn matches(&self, id: u8) -> bool {
        self.0 == id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_id_is_one() {
        let mut atid = Atid::default();
        atid.go_next();
        assert_eq!(atid.inner(), 1);
    }

    #[test]
    fn test_wrap_skips_zero() {
        let mut atid = Atid(0xFE);
        atid.go_next();
        assert_eq!(atid.inner(), 0xFF);
        atid.go_next();
        assert_eq!(atid.inner(), 0x01);
        assert!(atid.matches(0x01));
        assert!(!atid.matches(0x00));
    }
}
