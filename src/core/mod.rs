//! The emulation engine.
//!
//! Emulates the behaviour of the Nintendo Entertainment System.
//! The [Nes] struct is the machine itself: it owns the CPU, PPU, APU,
//! RAM, and the inserted [Cartridge], and advances them in lockstep.
//! The [Session] struct wraps a [Nes] with everything a front-end needs:
//! ROM loading, a run/pause state machine, real-time pacing, save states,
//! and the [Host] callback boundary.
//! ```
//! use nesium::core::{Controller, Nes, Settings};
//! // A blank machine, useful for poking at the CPU directly
//! let mut nes = Nes::new();
//! let settings = Settings::default();
//! // Advance the machine by one instruction
//! nes.advance_instruction(&settings).unwrap();
//! // Press A on player 1's controller
//! let mut input = Controller::new();
//! input.a = true;
//! nes.set_controller_state(0, input);
//! // Read the top-left pixel of the video output as RGB
//! let rgb = nes.ppu.rgb_output()[0][0];
//! println!("Top left pixel is #{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]);
//! ```
mod memory;
pub use memory::Memory;
mod cpu;
pub use cpu::Cpu;
mod status_register;
pub use status_register::StatusRegister;
pub mod opcodes;
mod nes;
pub use nes::Nes;
mod ppu;
pub use ppu::Ppu;
pub mod apu;
pub use apu::Apu;
mod cartridge;
pub use cartridge::*;
mod controller;
pub use controller::Controller;
mod settings;
pub use settings::{Region, Settings};
mod palette;
pub use palette::NES_PALETTE;
mod session;
pub use session::{Host, NullHost, RunState, Session, SharedInput, StateError};

/// The clock speed of the NTSC NES CPU, in hertz.
pub const CPU_CLOCK_SPEED: u32 = 1_789_773;
/// The location of the cartridge's IRQ/BRK vector.
pub const IRQ_VECTOR: usize = 0xFFFE;
/// The location of the reset vector.
pub const RESET_VECTOR: usize = 0xFFFC;
/// The location of the non-maskable interrupt's vector.
pub const NMI_VECTOR: usize = 0xFFFA;
/// Width of the video output in pixels.
pub const SCREEN_WIDTH: usize = 256;
/// Height of the video output in pixels.
pub const SCREEN_HEIGHT: usize = 240;
