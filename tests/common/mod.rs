#![allow(dead_code)]
use nesium::core::{Cartridge, Nes};
use simplelog::{Config, LevelFilter, SimpleLogger};

/// Set up logging for a test. Safe to call more than once.
pub fn init() {
    let _ = SimpleLogger::init(LevelFilter::Debug, Config::default());
}

/// Build an iNES image from raw PRG and CHR contents.
///
/// PRG must be a multiple of 16 KiB and CHR a multiple of 8 KiB.
/// `mapper` and `flags` fill the header's mapper number and flags 6 bits.
pub fn build_rom(prg: &[u8], chr: &[u8], mapper: u8, flags: u8) -> Vec<u8> {
    assert_eq!(prg.len() % 0x4000, 0);
    assert_eq!(chr.len() % 0x2000, 0);
    let mut bytes = vec![
        b'N',
        b'E',
        b'S',
        0x1A,
        (prg.len() / 0x4000) as u8,
        (chr.len() / 0x2000) as u8,
        (mapper << 4) | (flags & 0x0F),
        mapper & 0xF0,
    ];
    bytes.resize(16, 0);
    bytes.extend_from_slice(prg);
    bytes.extend_from_slice(chr);
    bytes
}

/// A single bank of PRG ROM holding the given program at $8000, with the
/// reset vector pointing at it and the IRQ/BRK vector at $8080.
pub fn program_prg(program: &[u8]) -> Vec<u8> {
    let mut prg = vec![0; 0x4000];
    prg[..program.len()].copy_from_slice(program);
    prg[0x3FFA] = 0x80; // NMI vector: $8080
    prg[0x3FFB] = 0x80;
    prg[0x3FFC] = 0x00; // Reset vector: $8000
    prg[0x3FFD] = 0x80;
    prg[0x3FFE] = 0x80; // IRQ vector: $8080
    prg[0x3FFF] = 0x80;
    prg
}

/// A ready-to-run NROM machine executing the given program from $8000.
/// Interrupts land at $8080, where the PRG is zero filled unless the
/// program reaches that far.
pub fn nes_with_program(program: &[u8]) -> Nes {
    let rom = build_rom(&program_prg(program), &[0; 0x2000], 0, 0);
    Nes::with_cartridge(Cartridge::from_ines(&rom, None).unwrap())
}

/// iNES image for a program with custom interrupt handler code placed at
/// $8080.
pub fn rom_with_handler(program: &[u8], handler: &[u8]) -> Vec<u8> {
    let mut prg = program_prg(program);
    prg[0x80..0x80 + handler.len()].copy_from_slice(handler);
    build_rom(&prg, &[0; 0x2000], 0, 0)
}
