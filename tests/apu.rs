//! APU behaviour that involves the CPU: register access through the bus
//! and the frame counter IRQ being serviced.
mod common;

use assert_hex::assert_eq_hex;
use nesium::core::{Cartridge, Nes, Settings};

#[test]
fn test_status_through_bus() {
    let mut nes = common::nes_with_program(&[]);
    nes.write_byte(0x4015, 0x01);
    nes.write_byte(0x4003, 0x08);
    assert_eq_hex!(nes.read_byte(0x4015) & 0x01, 0x01);
    // Disabling the channel clears its length counter
    nes.write_byte(0x4015, 0x00);
    assert_eq_hex!(nes.read_byte(0x4015) & 0x01, 0x00);
}

#[test]
fn test_frame_irq_is_serviced() {
    common::init();
    let settings = Settings::default();
    // CLI, then spin. The IRQ handler stores $42 to $10 and spins too.
    let rom = common::rom_with_handler(
        &[0x58, 0x4C, 0x01, 0x80],
        &[0xA9, 0x42, 0x85, 0x10, 0x4C, 0x84, 0x80],
    );
    let mut nes = Nes::with_cartridge(Cartridge::from_ines(&rom, None).unwrap());
    nes.ram.write(0x10, 0x00);
    // Put the frame counter in 4 step mode with the IRQ enabled
    nes.apu.write_byte(0x4017, 0x00);
    let mut cycles = 0;
    while cycles < 40_000 {
        cycles += nes.advance_instruction(&settings).unwrap();
    }
    // The handler ran exactly once and the CPU is parked in it
    assert_eq_hex!(nes.ram.read(0x10), 0x42);
    assert_eq_hex!(nes.cpu.p_c, 0x8084);
    assert!(nes.cpu.s_r.i);
}

#[test]
fn test_inhibited_frame_irq_never_fires() {
    let settings = Settings::default();
    let rom = common::rom_with_handler(
        &[0x58, 0x4C, 0x01, 0x80],
        &[0xA9, 0x42, 0x85, 0x10, 0x4C, 0x84, 0x80],
    );
    let mut nes = Nes::with_cartridge(Cartridge::from_ines(&rom, None).unwrap());
    nes.ram.write(0x10, 0x00);
    nes.apu.write_byte(0x4017, 0x40);
    let mut cycles = 0;
    while cycles < 40_000 {
        cycles += nes.advance_instruction(&settings).unwrap();
    }
    assert_eq_hex!(nes.ram.read(0x10), 0x00);
}

#[test]
fn test_samples_accumulate_while_running() {
    let settings = Settings::default();
    let mut nes = common::nes_with_program(&[0x4C, 0x00, 0x80]);
    nes.apu.start();
    let cycles = nes.advance_frame(&settings).unwrap();
    // One sample per CPU cycle
    assert_eq!(nes.apu.samples_queued(), cycles as usize);
}

#[test]
fn test_sound_disabled_produces_nothing() {
    let settings = Settings {
        sound_enabled: false,
        ..Settings::default()
    };
    let mut nes = common::nes_with_program(&[0x4C, 0x00, 0x80]);
    nes.apu.start();
    nes.advance_frame(&settings).unwrap();
    assert_eq!(nes.apu.samples_queued(), 0);
}

#[test]
fn test_volume_scales_samples() {
    let settings = Settings {
        volume: 0.0,
        ..Settings::default()
    };
    let mut nes = common::nes_with_program(&[0x4C, 0x00, 0x80]);
    // Set the triangle playing so the mixer has something to output
    nes.write_byte(0x4015, 0x04);
    nes.write_byte(0x4008, 0xFF);
    nes.write_byte(0x400A, 0x80);
    nes.write_byte(0x400B, 0x08);
    nes.apu.start();
    nes.advance_frame(&settings).unwrap();
    assert!(nes.apu.drain_samples().iter().all(|&s| s == 0.0));
}
