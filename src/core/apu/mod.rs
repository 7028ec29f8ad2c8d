//! The audio processing unit and its five channels.
pub mod dmc;
pub mod envelope;
pub mod length_counter;
pub mod noise;
pub mod pulse;
pub mod triangle;

use std::fmt::Debug;
use std::mem;

use crate::core::{Cartridge, Settings, CPU_CLOCK_SPEED};
use dmc::DmcRegister;
use noise::NoiseRegister;
use pulse::PulseRegister;
use triangle::TriangleRegister;

/// Noise channel timer periods, indexed by the 4 bit value written to $400E
const NOISE_TIMER_PERIODS: [u32; 16] = [
    4, 8, 16, 32, 64, 96, 128, 160, 202, 254, 380, 508, 762, 1016, 2034, 4068,
];
/// CPU cycle counts at which the frame counter clocks its steps
const STEPS: [i64; 5] = [7457, 14912, 22371, 29828, 37281];
/// Most samples the queue will hold before production stops
const MAX_QUEUE_SAMPLES: usize = 1 << 16;
/// CPU cycles (and thus samples) in one NTSC frame, for pacing estimates
const CYCLES_PER_FRAME: usize = 29780;

/// The NES's Audio Processing Unit (APU).
///
/// Generates one sample per CPU cycle into a bounded queue while running.
/// Down-sampling to the host's playback rate is the front-end's job.
pub struct Apu {
    /// The two pulse wave channels
    pub pulse: [PulseRegister; 2],
    /// The triangle wave channel
    pub triangle: TriangleRegister,
    /// The noise channel
    pub noise: NoiseRegister,
    /// The delta modulation channel
    pub dmc: DmcRegister,
    /// Frame counter mode, 0 for 4 step and 1 for 5 step
    mode: u32,
    /// Whether the frame counter's IRQ is inhibited
    irq_inhibit: bool,
    /// The frame counter's IRQ line
    irq_flag: bool,
    /// CPU cycles into the current frame counter sequence
    cycles: i64,
    /// Whether samples are being collected
    running: bool,
    queue: Vec<f32>,
}

impl Default for Apu {
    fn default() -> Apu {
        Apu::new()
    }
}

impl Apu {
    pub fn new() -> Apu {
        Apu {
            pulse: [PulseRegister::new(true), PulseRegister::new(false)],
            triangle: TriangleRegister::default(),
            noise: NoiseRegister::default(),
            dmc: DmcRegister::default(),
            mode: 0,
            // Power up with the frame IRQ inhibited
            irq_inhibit: true,
            irq_flag: false,
            cycles: 0,
            running: false,
            queue: Vec::new(),
        }
    }
    /// Write to one of the APU's registers ($4000-$4017).
    pub fn write_byte(&mut self, addr: usize, value: u8) {
        match addr {
            0x4000..0x4008 => {
                let p = &mut self.pulse[(addr - 0x4000) / 4];
                match addr % 4 {
                    0 => p.write_control(value),
                    1 => p.write_sweep(value),
                    2 => p.write_timer_low(value),
                    _ => p.write_timer_high(value),
                }
            }
            0x4008 => self.triangle.write_linear(value),
            0x400A => self.triangle.write_timer_low(value),
            0x400B => self.triangle.write_timer_high(value),
            0x400C => self.noise.write_control(value),
            0x400E => self.noise.write_mode(value),
            0x400F => self.noise.write_length(value),
            0x4010 => self.dmc.write_control(value),
            0x4011 => self.dmc.write_output(value),
            0x4012 => self.dmc.write_sample_addr(value),
            0x4013 => self.dmc.write_sample_len(value),
            0x4015 => {
                self.pulse[0].set_enabled(value & 0x01 != 0);
                self.pulse[1].set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
            }
            0x4017 => {
                self.mode = ((value & 0x80) >> 7) as u32;
                self.irq_inhibit = value & 0x40 != 0;
                if self.irq_inhibit {
                    self.irq_flag = false;
                }
                if self.mode == 1 {
                    self.quarter_frame();
                    self.half_frame();
                }
                // The sequence restart lags the write by a few cycles
                self.cycles = if self.cycles % 2 == 0 { -4 } else { -3 };
            }
            _ => {}
        }
    }
    /// Read from one of the APU's registers.
    /// Only the status register ($4015) is readable.
    pub fn read_byte(&mut self, addr: usize) -> u8 {
        if addr != 0x4015 {
            return 0;
        }
        macro_rules! bit_flag {
            ($cond: expr, $bit: expr) => {
                if $cond {
                    1 << $bit
                } else {
                    0
                }
            };
        }
        let value = bit_flag!(self.dmc.irq_flag, 7)
            | bit_flag!(self.irq_flag, 6)
            | bit_flag!(self.dmc.bytes_remaining > 0, 4)
            | bit_flag!(!self.noise.length_counter.muted(), 3)
            | bit_flag!(!self.triangle.length_counter.muted(), 2)
            | bit_flag!(!self.pulse[1].length_counter.muted(), 1)
            | bit_flag!(!self.pulse[0].length_counter.muted(), 0);
        // Reading the status acknowledges the frame IRQ
        self.irq_flag = false;
        value
    }
    /// Advance the APU by some number of CPU cycles.
    pub fn advance_cpu_cycles(&mut self, cpu_cycles: u32, cartridge: &mut Cartridge, settings: &Settings) {
        for _ in 0..cpu_cycles {
            if self.running && settings.sound_enabled && self.queue.len() < MAX_QUEUE_SAMPLES {
                let sample = self.mixer_output() * settings.volume;
                self.queue.push(sample);
            }
            self.cycles += 1;
            match self.cycles {
                c if c == STEPS[0] || c == STEPS[2] => self.quarter_frame(),
                c if c == STEPS[1] => {
                    self.quarter_frame();
                    self.half_frame();
                }
                c if self.mode == 0 && c >= STEPS[3] => {
                    self.quarter_frame();
                    self.half_frame();
                    if !self.irq_inhibit {
                        self.irq_flag = true;
                    }
                    self.cycles = 0;
                }
                c if self.mode == 1 && c >= STEPS[4] => {
                    self.quarter_frame();
                    self.half_frame();
                    self.cycles = 0;
                }
                _ => {}
            }
            // The pulse timers run at half the CPU clock
            if self.cycles % 2 == 0 {
                self.pulse.iter_mut().for_each(PulseRegister::clock_timer);
            }
            self.triangle.clock_timer();
            self.noise.clock_timer();
            self.dmc.clock_timer(cartridge);
        }
    }
    fn quarter_frame(&mut self) {
        self.pulse.iter_mut().for_each(PulseRegister::quarter_frame);
        self.triangle.quarter_frame();
        self.noise.quarter_frame();
    }
    fn half_frame(&mut self) {
        self.pulse.iter_mut().for_each(PulseRegister::half_frame);
        self.triangle.half_frame();
        self.noise.half_frame();
    }
    /// Mix the five channels into one sample between 0.0 and 1.0
    fn mixer_output(&self) -> f32 {
        let pulse_sum = (self.pulse[0].value() + self.pulse[1].value()) as f32;
        let pulse_out = if pulse_sum == 0.0 {
            0.0
        } else {
            95.88 / (8128.0 / pulse_sum + 100.0)
        };
        let tnd_sum = self.triangle.value() as f32 / 8227.0
            + self.noise.value() as f32 / 12241.0
            + self.dmc.value() as f32 / 22638.0;
        let tnd_out = if tnd_sum == 0.0 {
            0.0
        } else {
            159.79 / (1.0 / tnd_sum + 100.0)
        };
        pulse_out + tnd_out
    }
    /// Silence all channels and discard queued samples, as a console
    /// reset does.
    pub fn reset(&mut self) {
        self.write_byte(0x4015, 0);
        self.irq_flag = false;
        self.queue.clear();
    }
    /// Whether the APU is asserting its IRQ line.
    /// Covers both the frame counter IRQ and the DMC sample IRQ.
    pub fn irq(&self) -> bool {
        self.irq_flag || self.dmc.irq_flag
    }
    /// Start collecting samples.
    pub fn start(&mut self) {
        self.running = true;
    }
    /// Stop collecting samples and discard any queued ones.
    pub fn stop(&mut self) {
        self.running = false;
        self.queue.clear();
    }
    /// Whether the APU is collecting samples.
    pub fn is_running(&self) -> bool {
        self.running
    }
    /// Take all queued samples, leaving the queue empty.
    pub fn drain_samples(&mut self) -> Vec<f32> {
        mem::take(&mut self.queue)
    }
    /// How many samples are currently queued.
    pub fn samples_queued(&self) -> usize {
        self.queue.len()
    }
    /// How long until the queue has room for another frame of samples,
    /// in milliseconds. Returns 0 when a frame can be produced right away.
    ///
    /// Assumes the host drains the queue at the sample production rate,
    /// i.e. real time playback.
    pub fn millis_until_free(&self) -> u64 {
        if self.queue.len() + CYCLES_PER_FRAME <= MAX_QUEUE_SAMPLES {
            return 0;
        }
        let excess = self.queue.len() + CYCLES_PER_FRAME - MAX_QUEUE_SAMPLES;
        (excess as u64 * 1000).div_ceil(CPU_CLOCK_SPEED as u64)
    }
}

impl Debug for Apu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:?}", self.pulse[0])?;
        writeln!(f, "{:?}", self.pulse[1])?;
        writeln!(f, "{:?}", self.triangle)?;
        writeln!(f, "{:?}", self.noise)?;
        writeln!(f, "{:?}", self.dmc)?;
        write!(
            f,
            "mode={} irq_inhibit={} irq_flag={} cycles={} queued={}",
            self.mode,
            self.irq_inhibit,
            self.irq_flag,
            self.cycles,
            self.queue.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn advance(apu: &mut Apu, cycles: u32) {
        let mut cartridge = Cartridge::blank();
        let settings = Settings::default();
        apu.advance_cpu_cycles(cycles, &mut cartridge, &settings);
    }

    #[test]
    fn test_length_counter_load() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x01);
        apu.write_byte(0x4003, 0x08);
        assert_eq!(apu.pulse[0].length_counter.load, 0xA0);
        // A disabled channel ignores length loads
        apu.write_byte(0x4015, 0x00);
        apu.write_byte(0x4003, 0x08);
        assert_eq!(apu.pulse[0].length_counter.load, 0);
    }

    #[test]
    fn test_status_register() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x05);
        apu.write_byte(0x4003, 0x08);
        apu.write_byte(0x400B, 0x08);
        assert_eq!(apu.read_byte(0x4015), 0x05);
    }

    #[test]
    fn test_frame_irq() {
        let mut apu = Apu::new();
        // Clear the inhibit flag and run a full 4 step sequence
        apu.write_byte(0x4017, 0x00);
        advance(&mut apu, 29840);
        assert!(apu.irq());
        // Reading the status acknowledges it
        apu.read_byte(0x4015);
        assert!(!apu.irq());
    }

    #[test]
    fn test_no_frame_irq_in_5_step_mode() {
        let mut apu = Apu::new();
        apu.write_byte(0x4017, 0x80);
        advance(&mut apu, 40000);
        assert!(!apu.irq());
    }

    #[test]
    fn test_sample_collection() {
        let mut apu = Apu::new();
        advance(&mut apu, 100);
        // Nothing accumulates while stopped
        assert_eq!(apu.samples_queued(), 0);
        apu.start();
        advance(&mut apu, 100);
        assert_eq!(apu.samples_queued(), 100);
        assert_eq!(apu.drain_samples().len(), 100);
        assert_eq!(apu.samples_queued(), 0);
        apu.stop();
        advance(&mut apu, 100);
        assert_eq!(apu.samples_queued(), 0);
    }

    #[test]
    fn test_length_counters_clocked() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x01);
        // Load length 0x02 with the halt flag clear
        apu.write_byte(0x4000, 0x00);
        apu.write_byte(0x4003, 0x18);
        assert_eq!(apu.pulse[0].length_counter.load, 2);
        // Two half frames should exhaust the counter
        advance(&mut apu, 30000);
        assert!(apu.pulse[0].length_counter.muted());
    }

    #[test]
    fn test_reset_silences_channels() {
        let mut apu = Apu::new();
        apu.write_byte(0x4015, 0x01);
        apu.write_byte(0x4003, 0x08);
        apu.start();
        advance(&mut apu, 100);
        apu.reset();
        assert_eq!(apu.read_byte(0x4015), 0);
        assert_eq!(apu.samples_queued(), 0);
    }

    #[test]
    fn test_pacing() {
        let mut apu = Apu::new();
        assert_eq!(apu.millis_until_free(), 0);
        apu.start();
        advance(&mut apu, MAX_QUEUE_SAMPLES as u32);
        assert!(apu.millis_until_free() > 0);
        apu.drain_samples();
        assert_eq!(apu.millis_until_free(), 0);
    }
}
