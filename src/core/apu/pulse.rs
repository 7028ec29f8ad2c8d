use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use super::{envelope::Envelope, length_counter::LengthCounter};

/// The output levels of the four pulse duty cycles
const DUTY_CYCLES: [[u32; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0],
    [0, 1, 1, 0, 0, 0, 0, 0],
    [0, 1, 1, 1, 1, 0, 0, 0],
    [1, 0, 0, 1, 1, 1, 1, 1],
];

#[derive(Clone, Serialize, Deserialize)]
/// One of the two pulse wave channels.
pub struct PulseRegister {
    /// Duty cycle of the wave, selects a row of [`DUTY_CYCLES`]
    pub duty: usize,
    /// Current timer value
    pub timer: u32,
    /// Value the timer resets to, controls the wave's pitch
    pub timer_reload: u32,
    /// Volume envelope unit
    pub envelope: Envelope,
    /// Length counter unit
    pub length_counter: LengthCounter,
    /// Whether the sweep unit is enabled
    pub sweep_enabled: bool,
    /// The sweep unit's divider period
    pub sweep_period: u32,
    /// Current value of the sweep divider
    pub sweep_divider: u32,
    /// The timer value the sweep is moving towards
    pub sweep_target_period: i32,
    /// Whether the sweep subtracts from the period instead of adding
    pub sweep_negate: bool,
    /// The sweep's barrel shift amount
    pub sweep_shift: u32,
    /// Whether the channel is enabled at all ($4015)
    pub enabled: bool,
    /// Position in the 8 step duty sequence
    pub sequencer: usize,
    // The second pulse channel negates with two's complement, the first
    // with one's complement
    ones_complement_sweep: bool,
}

impl PulseRegister {
    pub fn new(ones_complement_sweep: bool) -> PulseRegister {
        PulseRegister {
            duty: 0,
            timer: 0,
            timer_reload: 0,
            envelope: Envelope::default(),
            length_counter: LengthCounter::default(),
            sweep_enabled: false,
            sweep_period: 0,
            sweep_divider: 0,
            sweep_target_period: 0,
            sweep_negate: false,
            sweep_shift: 0,
            enabled: false,
            sequencer: 0,
            ones_complement_sweep,
        }
    }
    /// Write to the channel's control byte ($4000/$4004)
    pub fn write_control(&mut self, value: u8) {
        self.duty = ((value & 0xC0) >> 6) as usize;
        self.length_counter.halt = value & 0x20 != 0;
        self.envelope.constant = value & 0x10 != 0;
        self.envelope.volume = (value & 0x0F) as usize;
    }
    /// Write to the channel's sweep byte ($4001/$4005)
    pub fn write_sweep(&mut self, value: u8) {
        self.sweep_enabled = value & 0x80 != 0;
        self.sweep_period = ((value & 0x70) >> 4) as u32;
        self.sweep_negate = value & 0x08 != 0;
        self.sweep_shift = (value & 0x07) as u32;
        self.sweep_divider = self.sweep_period;
    }
    /// Write the low byte of the timer ($4002/$4006)
    pub fn write_timer_low(&mut self, value: u8) {
        self.timer_reload = (self.timer_reload & 0x700) | value as u32;
    }
    /// Write the timer's high bits and the length counter load ($4003/$4007)
    pub fn write_timer_high(&mut self, value: u8) {
        self.timer_reload = (self.timer_reload & 0x0FF) | (((value & 0x07) as u32) << 8);
        if self.enabled {
            self.length_counter.write_length(value);
        }
        self.sequencer = 0;
        self.envelope.restart();
    }
    /// Clock the channel's timer, done every other CPU cycle
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.timer_reload;
            self.sequencer = (self.sequencer + 1) % 8;
        } else {
            self.timer -= 1;
        }
        self.update_sweep_target();
    }
    fn update_sweep_target(&mut self) {
        let change = (self.timer_reload >> self.sweep_shift) as i32;
        self.sweep_target_period = if self.sweep_negate {
            let c = if self.ones_complement_sweep { change + 1 } else { change };
            (self.timer_reload as i32 - c).max(0)
        } else {
            self.timer_reload as i32 + change
        };
    }
    /// Clock the envelope, done on every quarter frame
    pub fn quarter_frame(&mut self) {
        self.envelope.clock(self.length_counter.halt);
    }
    /// Clock the length counter and sweep unit, done on every half frame
    pub fn half_frame(&mut self) {
        self.length_counter.clock();
        if self.sweep_divider == 0 {
            if self.sweep_enabled
                && self.timer_reload >= 8
                && self.sweep_shift > 0
                && self.sweep_target_period <= 0x7FF
            {
                self.timer_reload = self.sweep_target_period as u32;
            }
            self.sweep_divider = self.sweep_period;
        } else {
            self.sweep_divider -= 1;
        }
    }
    /// Whether the channel is currently outputting nothing
    pub fn muted(&self) -> bool {
        !self.enabled
            || self.sweep_target_period > 0x7FF
            || self.length_counter.muted()
            || self.timer_reload < 8
    }
    /// Get the channel's current output value
    pub fn value(&self) -> u32 {
        if self.muted() {
            0
        } else {
            DUTY_CYCLES[self.duty][self.sequencer] * self.envelope.value()
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

impl Debug for PulseRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Pulse enabled={} duty={} timer_reload={:X} length=({:?}) envelope=({:?})",
            self.enabled, self.duty, self.timer_reload, self.length_counter, self.envelope
        )
    }
}
