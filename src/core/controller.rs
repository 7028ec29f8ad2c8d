use serde::{Deserialize, Serialize};

/// An NES controller
///
/// Used to represent the controller's state in the emulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controller {
    pub up: bool,
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub start: bool,
    pub select: bool,
    pub a: bool,
    pub b: bool,
}

impl Controller {
    pub fn new() -> Controller {
        Controller::default()
    }
    /// Pack the button states into a byte, one bit per button in the
    /// order the shift register reports them: A, B, Select, Start, Up,
    /// Down, Left, Right from bit 0 up.
    /// ```
    /// let mut c = nesium::core::Controller::new();
    /// c.a = true;
    /// c.start = true;
    /// assert_eq!(c.to_bits(), 0b0000_1001);
    /// ```
    pub fn to_bits(&self) -> u8 {
        [
            self.a,
            self.b,
            self.select,
            self.start,
            self.up,
            self.down,
            self.left,
            self.right,
        ]
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &pressed)| {
            if pressed {
                acc | (1 << i)
            } else {
                acc
            }
        })
    }
    /// Unpack a byte produced by [Controller::to_bits].
    pub fn from_bits(bits: u8) -> Controller {
        Controller {
            a: bits & 0x01 != 0,
            b: bits & 0x02 != 0,
            select: bits & 0x04 != 0,
            start: bits & 0x08 != 0,
            up: bits & 0x10 != 0,
            down: bits & 0x20 != 0,
            left: bits & 0x40 != 0,
            right: bits & 0x80 != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Controller;

    #[test]
    fn test_bits_round_trip() {
        let mut c = Controller::new();
        c.b = true;
        c.down = true;
        c.right = true;
        assert_eq!(c.to_bits(), 0b1010_0010);
        assert_eq!(Controller::from_bits(c.to_bits()), c);
    }
}
