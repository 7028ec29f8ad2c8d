use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::core::Cartridge;

/// CPU cycle periods between DMC output clocks, indexed by the rate bits
const DMC_RATES: [u32; 16] = [
    428, 380, 340, 320, 286, 254, 226, 214, 190, 160, 142, 128, 106, 84, 72, 54,
];

#[derive(Clone, Serialize, Deserialize)]
/// The delta modulation channel.
/// Plays back 1-bit delta encoded samples read directly from cartridge memory.
pub struct DmcRegister {
    /// Whether the channel is enabled at all ($4015)
    pub enabled: bool,
    /// Whether to raise an IRQ when the sample ends
    pub irq_enabled: bool,
    /// The channel's IRQ line
    pub irq_flag: bool,
    /// Whether to restart the sample when it ends
    pub repeat: bool,
    /// CPU cycles between output clocks
    pub rate: u32,
    /// Current timer value
    pub timer: u32,
    /// The current output level
    pub output: u32,
    /// CPU address the sample starts at
    pub sample_addr: usize,
    /// Length of the sample in bytes
    pub sample_len: usize,
    /// CPU address of the next sample byte to fetch
    pub sample_index: usize,
    /// Bytes left to play in the current sample
    pub bytes_remaining: usize,
    /// The sample byte currently being shifted out
    pub sample_byte: u8,
    /// Bits left in the current sample byte
    pub bits_left: u32,
    /// Whether the channel is silent for the current output cycle
    pub silent: bool,
}

impl Default for DmcRegister {
    fn default() -> DmcRegister {
        DmcRegister {
            enabled: false,
            irq_enabled: false,
            irq_flag: false,
            repeat: false,
            rate: DMC_RATES[0],
            timer: 0,
            output: 0,
            sample_addr: 0xC000,
            sample_len: 1,
            sample_index: 0xC000,
            bytes_remaining: 0,
            sample_byte: 0,
            bits_left: 8,
            silent: true,
        }
    }
}

impl DmcRegister {
    /// Write the channel's control byte ($4010)
    pub fn write_control(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        if !self.irq_enabled {
            self.irq_flag = false;
        }
        self.repeat = value & 0x40 != 0;
        self.rate = DMC_RATES[(value & 0x0F) as usize];
    }
    /// Directly set the output level ($4011)
    pub fn write_output(&mut self, value: u8) {
        self.output = (value & 0x7F) as u32;
    }
    /// Set the sample start address ($4012)
    pub fn write_sample_addr(&mut self, value: u8) {
        self.sample_addr = value as usize * 64 + 0xC000;
    }
    /// Set the sample length ($4013)
    pub fn write_sample_len(&mut self, value: u8) {
        self.sample_len = value as usize * 16 + 1;
    }
    /// Clock the channel's timer, done every CPU cycle
    pub fn clock_timer(&mut self, cartridge: &Cartridge) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.rate;
        if !self.silent {
            if self.sample_byte & 0x01 != 0 {
                if self.output <= 125 {
                    self.output += 2;
                }
            } else if self.output >= 2 {
                self.output -= 2;
            }
            self.sample_byte >>= 1;
        }
        self.bits_left = self.bits_left.saturating_sub(1);
        if self.bits_left == 0 {
            self.bits_left = 8;
            if self.bytes_remaining == 0 {
                self.silent = true;
            } else {
                self.silent = false;
                self.load_byte(cartridge);
                self.bytes_remaining -= 1;
                if self.bytes_remaining == 0 {
                    if self.repeat {
                        self.restart_sample();
                    } else if self.irq_enabled {
                        self.irq_flag = true;
                    }
                }
            }
        }
    }
    fn load_byte(&mut self, cartridge: &Cartridge) {
        self.sample_byte = cartridge.read_cpu(self.sample_index);
        // Address wraps from $FFFF back to $8000
        self.sample_index = if self.sample_index == 0xFFFF {
            0x8000
        } else {
            self.sample_index + 1
        };
    }
    fn restart_sample(&mut self) {
        self.sample_index = self.sample_addr;
        self.bytes_remaining = self.sample_len;
    }
    /// Get the channel's current output value
    pub fn value(&self) -> u32 {
        self.output
    }
    /// Enable or disable the channel ($4015)
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.irq_flag = false;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart_sample();
        }
    }
}

impl Debug for DmcRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "DMC enabled={} output={} bytes_remaining={} repeat={} irq={}",
            self.enabled, self.output, self.bytes_remaining, self.repeat, self.irq_flag
        )
    }
}
