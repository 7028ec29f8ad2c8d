use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Default, Debug, Serialize, Deserialize)]
/// An envelope generator unit.
/// Controls the volume of the pulse and noise channels.
pub struct Envelope {
    /// Constant volume flag
    pub constant: bool,
    /// Volume value (either the volume or the decay reload value)
    pub volume: usize,
    /// Current value of the volume divider
    pub divider: usize,
    /// Current value of the volume decay
    pub decay: usize,
}
impl Envelope {
    /// Restart the decay, done when the channel's length is written.
    pub fn restart(&mut self) {
        self.decay = 0xF;
        self.divider = self.volume;
    }
    /// Clock the envelope unit
    pub fn clock(&mut self, looped: bool) {
        if self.divider == 0 {
            self.divider = self.volume;
            if self.decay == 0 {
                if looped {
                    self.decay = 0xF;
                }
            } else {
                self.decay -= 1;
            }
        } else {
            self.divider -= 1;
        }
    }
    /// Get the current output of the unit
    pub fn value(&self) -> u32 {
        if self.constant {
            self.volume as u32
        } else {
            self.decay as u32
        }
    }
}
