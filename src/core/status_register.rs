use std::fmt::Debug;

use serde::{Deserialize, Serialize};

/// The CPU's status register, one field per flag.
#[derive(Clone, Serialize, Deserialize)]
pub struct StatusRegister {
    /// The carry flag, also known as the unsigned overflow flag
    pub c: bool,
    /// The zero flag
    pub z: bool,
    /// The interrupt disable flag
    pub i: bool,
    /// The decimal mode flag (present but unused on the NES)
    pub d: bool,
    /// The break command flag
    pub b: bool,
    /// The (signed) overflow flag
    pub v: bool,
    /// The negative flag
    pub n: bool,
}

impl Default for StatusRegister {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusRegister {
    /// Create a new StatusRegister in the power-up state, with interrupts disabled.
    pub fn new() -> StatusRegister {
        StatusRegister {
            c: false,
            z: false,
            i: true,
            d: false,
            b: false,
            v: false,
            n: false,
        }
    }
    /// Get the status register as a single byte to be pushed to the stack.
    /// Bit 5 is hardwired high.
    /// ```
    /// let mut s = nesium::core::StatusRegister::new();
    /// s.z = true;
    /// s.d = true;
    /// s.i = false;
    /// assert_eq!(s.to_byte(), 0b00101010);
    /// s.n = true;
    /// s.v = true;
    /// assert_eq!(s.to_byte(), 0b11101010);
    /// ```
    pub fn to_byte(&self) -> u8 {
        [
            (self.c, 0x01u8),
            (self.z, 0x02),
            (self.i, 0x04),
            (self.d, 0x08),
            (self.b, 0x10),
            (self.v, 0x40),
            (self.n, 0x80),
        ]
        .iter()
        .fold(0x20, |byte, &(flag, mask)| {
            if flag {
                byte | mask
            } else {
                byte
            }
        })
    }
    /// Set the status register from a byte pulled from the stack.
    /// The break flag has no storage on hardware and is ignored.
    /// ```
    /// let mut s = nesium::core::StatusRegister::new();
    /// s.from_byte(0b11001010);
    /// assert_eq!(s.d, true);
    /// assert_eq!(s.v, true);
    /// assert_eq!(s.n, true);
    /// assert_eq!(s.z, true);
    /// ```
    pub fn from_byte(&mut self, byte: u8) {
        [
            (&mut self.c, 0x01u8),
            (&mut self.z, 0x02),
            (&mut self.i, 0x04),
            (&mut self.d, 0x08),
            (&mut self.v, 0x40),
            (&mut self.n, 0x80),
        ]
        .into_iter()
        .for_each(|(flag, mask)| *flag = byte & mask != 0);
    }
}

impl Debug for StatusRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flags: String = [
            (self.n, 'N'),
            (self.v, 'V'),
            (self.d, 'D'),
            (self.i, 'I'),
            (self.z, 'Z'),
            (self.c, 'C'),
        ]
        .iter()
        .map(|&(set, c)| if set { c } else { '-' })
        .collect();
        write!(f, "[{}]", flags)
    }
}

#[cfg(test)]
mod tests {
    use super::StatusRegister;

    #[test]
    fn test_byte_round_trip_ignores_break() {
        let mut s = StatusRegister::new();
        s.from_byte(0xFF);
        assert!(!s.b);
        assert_eq!(s.to_byte(), 0xEF);
        s.from_byte(0x00);
        assert_eq!(s.to_byte(), 0x20);
    }

    #[test]
    fn test_debug_flags() {
        let mut s = StatusRegister::new();
        s.n = true;
        s.c = true;
        assert_eq!(format!("{:?}", s), "[N--I-C]");
    }
}
