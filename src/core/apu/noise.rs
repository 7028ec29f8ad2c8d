use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{envelope::Envelope, length_counter::LengthCounter, NOISE_TIMER_PERIODS};

#[derive(Clone, Serialize, Deserialize)]
/// The noise channel.
/// Produces pseudo random noise from a linear feedback shift register.
pub struct NoiseRegister {
    /// Length counter unit
    pub length_counter: LengthCounter,
    /// Volume envelope unit
    pub envelope: Envelope,
    /// Whether the channel is enabled at all ($4015)
    pub enabled: bool,
    /// Current timer value
    pub timer: u32,
    /// Value the timer resets to
    pub timer_reload: u32,
    /// Short mode flag, taps bit 6 instead of bit 1 for feedback
    pub mode: bool,
    /// The feedback shift register
    pub shift: u16,
}

impl Default for NoiseRegister {
    fn default() -> NoiseRegister {
        NoiseRegister {
            length_counter: LengthCounter::default(),
            envelope: Envelope::default(),
            enabled: false,
            timer: 0,
            timer_reload: 0,
            mode: false,
            // Power up with a seeded shift register
            shift: 1,
        }
    }
}

impl NoiseRegister {
    /// Write the channel's control byte ($400C)
    pub fn write_control(&mut self, value: u8) {
        self.length_counter.halt = value & 0x20 != 0;
        self.envelope.constant = value & 0x10 != 0;
        self.envelope.volume = (value & 0x0F) as usize;
    }
    /// Write the mode flag and timer period ($400E)
    pub fn write_mode(&mut self, value: u8) {
        self.mode = value & 0x80 != 0;
        self.timer_reload = NOISE_TIMER_PERIODS[(value & 0x0F) as usize];
    }
    /// Write the length counter load ($400F)
    pub fn write_length(&mut self, value: u8) {
        if self.enabled {
            self.length_counter.write_length(value);
        }
        self.envelope.restart();
    }
    /// Clock the channel's timer, done every CPU cycle
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_reload;
            let tap = if self.mode { 6 } else { 1 };
            let feedback = (self.shift & 0x01) ^ ((self.shift >> tap) & 0x01);
            self.shift = (self.shift >> 1) | (feedback << 14);
        } else {
            self.timer -= 1;
        }
    }
    /// Clock the envelope, done on every quarter frame
    pub fn quarter_frame(&mut self) {
        self.envelope.clock(self.length_counter.halt);
    }
    /// Clock the length counter, done on every half frame
    pub fn half_frame(&mut self) {
        self.length_counter.clock();
    }
    /// Whether the channel is currently outputting nothing
    pub fn muted(&self) -> bool {
        !self.enabled || self.length_counter.muted() || self.shift & 0x01 == 1
    }
    /// Get the channel's current output value
    pub fn value(&self) -> u32 {
        if self.muted() {
            0
        } else {
            self.envelope.value()
        }
    }
    /// Enable or disable the channel ($4015)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.length_counter.silence();
        }
    }
}

impl Debug for NoiseRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Noise enabled={} mode={} shift={:X} length=({:?})",
            self.enabled, self.mode, self.shift, self.length_counter
        )
    }
}
