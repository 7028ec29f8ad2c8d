use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::length_counter::LengthCounter;

#[derive(Clone, Default, Serialize, Deserialize)]
/// The triangle wave channel.
pub struct TriangleRegister {
    /// Length counter unit
    pub length_counter: LengthCounter,
    /// Value the linear counter reloads to
    pub linear_counter_reload: u32,
    /// Current value of the linear counter
    pub linear_counter: u32,
    /// Whether to reload the linear counter on the next quarter frame
    pub reload_flag: bool,
    /// Value the timer resets to, controls the wave's pitch
    pub timer_reload: u32,
    /// Current timer value
    pub timer: u32,
    /// Whether the channel is enabled at all ($4015)
    pub enabled: bool,
    /// Position in the 32 step triangle sequence
    pub sequencer: u32,
}

impl TriangleRegister {
    /// Write the linear counter byte ($4008)
    pub fn write_linear(&mut self, value: u8) {
        self.length_counter.halt = value & 0x80 != 0;
        self.linear_counter_reload = (value & 0x7F) as u32;
    }
    /// Write the low byte of the timer ($400A)
    pub fn write_timer_low(&mut self, value: u8) {
        self.timer_reload = (self.timer_reload & 0x700) | value as u32;
    }
    /// Write the timer's high bits and the length counter load ($400B)
    pub fn write_timer_high(&mut self, value: u8) {
        self.timer_reload = (self.timer_reload & 0x0FF) | (((value & 0x07) as u32) << 8);
        if self.enabled {
            self.length_counter.write_length(value);
        }
        self.reload_flag = true;
    }
    /// Clock the channel's timer, done every CPU cycle
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_reload;
            // When muted, let the wave finish rather than stopping abruptly
            if !self.muted() || self.sequencer % 16 != 15 {
                self.sequencer = (self.sequencer + 1) % 32;
            }
        } else {
            self.timer -= 1;
        }
    }
    /// Clock the linear counter, done on every quarter frame
    pub fn quarter_frame(&mut self) {
        if self.reload_flag {
            self.linear_counter = self.linear_counter_reload;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.length_counter.halt {
            self.reload_flag = false;
        }
    }
    /// Clock the length counter, done on every half frame
    pub fn half_frame(&mut self) {
        self.length_counter.clock();
    }
    /// Whether the channel is currently outputting nothing
    pub fn muted(&self) -> bool {
        !self.enabled
            || self.length_counter.muted()
            || self.linear_counter == 0
            || self.timer_reload < 2
    }
    /// Get the channel's current output value
    pub fn value(&self) -> u32 {
        if self.sequencer <= 15 {
            self.sequencer
        } else {
            31 - self.sequencer
        }
    }
    /// Enable or disable the channel ($4015)
    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled && !self.enabled {
            self.timer = self.timer_reload;
        }
        self.enabled = enabled;
        if !enabled {
            self.length_counter.silence();
        }
    }
}

impl Debug for TriangleRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Triangle enabled={} timer_reload={:X} linear={:X} length=({:?})",
            self.enabled, self.timer_reload, self.linear_counter, self.length_counter
        )
    }
}
