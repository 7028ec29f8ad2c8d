use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// Counter loads, indexed by the 5 bit value in a channel's length
/// register write
const LENGTH_TABLE: [usize; 0x20] = [
    0x0A, 0xFE, 0x14, 0x02, 0x28, 0x04, 0x50, 0x06, 0xA0, 0x08, 0x3C, 0x0A, 0x0E, 0x0C, 0x1A,
    0x0E, 0x0C, 0x10, 0x18, 0x12, 0x30, 0x14, 0x60, 0x16, 0xC0, 0x18, 0x48, 0x1A, 0x10, 0x1C,
    0x20, 0x1E,
];

#[derive(Clone, Copy, Default, Serialize, Deserialize)]
/// A length counter.
/// Simple divider that mutes an APU channel when it hits 0.
pub struct LengthCounter {
    /// The halt flag, pauses the counter when true
    pub halt: bool,
    /// The current value
    pub load: usize,
}
impl LengthCounter {
    /// Return `true` if the counter should be muting the channel
    pub fn muted(&self) -> bool {
        self.load == 0
    }
    /// Clock the length counter, done on every half frame
    pub fn clock(&mut self) {
        if !self.halt {
            self.load = self.load.saturating_sub(1);
        }
    }
    /// Load the counter from a length register write ($4003 and friends),
    /// using the top 5 bits of the value as a length table index
    pub fn write_length(&mut self, value: u8) {
        self.load = LENGTH_TABLE[(value >> 3) as usize];
    }
    /// Mute the channel immediately, as disabling it through $4015 does
    pub fn silence(&mut self) {
        self.load = 0;
    }
}
impl Debug for LengthCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "halt={} load={:X}", self.halt, self.load)
    }
}

#[cfg(test)]
mod tests {
    use super::LengthCounter;

    #[test]
    fn test_clock_and_halt() {
        let mut lc = LengthCounter::default();
        lc.write_length(0x18);
        assert_eq!(lc.load, 2);
        lc.clock();
        lc.halt = true;
        lc.clock();
        assert_eq!(lc.load, 1);
        lc.halt = false;
        lc.clock();
        assert!(lc.muted());
        // Clocking an exhausted counter keeps it at zero
        lc.clock();
        assert!(lc.muted());
    }

    #[test]
    fn test_silence() {
        let mut lc = LengthCounter::default();
        lc.write_length(0xF8);
        assert!(!lc.muted());
        lc.silence();
        assert!(lc.muted());
    }
}
