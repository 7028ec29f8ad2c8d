//! Mapper behaviour through the cartridge's bus interface.
mod common;

use assert_hex::assert_eq_hex;
use nesium::core::{Cartridge, Mirroring, Nes, Settings};
use test_case::test_case;

#[test]
fn test_uxrom_prg_banking() {
    // Two PRG banks with recognisable fills
    let mut prg = vec![0x11; 0x4000];
    prg.extend_from_slice(&[0x22; 0x4000]);
    let rom = common::build_rom(&prg, &[], 2, 0);
    let mut cartridge = Cartridge::from_ines(&rom, None).unwrap();
    assert_eq_hex!(cartridge.read_cpu(0x8000), 0x11);
    // The last bank is fixed at $C000
    assert_eq_hex!(cartridge.read_cpu(0xC000), 0x22);
    cartridge.write_cpu(0x8000, 1);
    assert_eq_hex!(cartridge.read_cpu(0x8000), 0x22);
    assert_eq_hex!(cartridge.read_cpu(0xC000), 0x22);
}

#[test]
fn test_cnrom_chr_banking() {
    let mut chr = vec![0xAA; 0x2000];
    chr.extend_from_slice(&[0xBB; 0x2000]);
    let rom = common::build_rom(&vec![0; 0x8000], &chr, 3, 0);
    let mut cartridge = Cartridge::from_ines(&rom, None).unwrap();
    assert_eq_hex!(cartridge.read_ppu(0x0000), 0xAA);
    cartridge.write_cpu(0x8000, 1);
    assert_eq_hex!(cartridge.read_ppu(0x0000), 0xBB);
}

#[test]
fn test_nrom_single_bank_mirrors() {
    // A single 16 KiB bank appears at both $8000 and $C000
    let mut prg = vec![0; 0x4000];
    prg[0x0123] = 0x42;
    let rom = common::build_rom(&prg, &[0; 0x2000], 0, 0);
    let cartridge = Cartridge::from_ines(&rom, None).unwrap();
    assert_eq_hex!(cartridge.read_cpu(0x8123), 0x42);
    assert_eq_hex!(cartridge.read_cpu(0xC123), 0x42);
}

#[test]
fn test_chr_ram_is_writable() {
    // Zero CHR banks in the header means the cartridge carries CHR RAM
    let rom = common::build_rom(&vec![0; 0x4000], &[], 0, 0);
    let mut cartridge = Cartridge::from_ines(&rom, None).unwrap();
    cartridge.write_ppu(0x1234, 0x99);
    assert_eq_hex!(cartridge.read_ppu(0x1234), 0x99);
}

#[test]
fn test_archaic_header_renders_from_chr_ram() {
    common::init();
    // The oldest dumps carry garbage in bytes 7-15. One with no CHR ROM
    // still needs CHR RAM behind the pattern tables once rendering starts
    let mut rom = common::build_rom(&common::program_prg(&[0x4C, 0x00, 0x80]), &[], 0, 0);
    rom[7] = 0x04;
    let mut nes = Nes::with_cartridge(Cartridge::from_ines(&rom, None).unwrap());
    nes.write_byte(0x2001, 0x18);
    nes.advance_frame(&Settings::default()).unwrap();
}

#[test_case(0x00, Mirroring::Horizontal ; "horizontal")]
#[test_case(0x01, Mirroring::Vertical ; "vertical")]
#[test_case(0x08, Mirroring::FourScreen ; "four screen")]
fn test_header_mirroring(flags: u8, expected: Mirroring) {
    let rom = common::build_rom(&vec![0; 0x4000], &[0; 0x2000], 0, flags);
    let cartridge = Cartridge::from_ines(&rom, None).unwrap();
    assert_eq!(cartridge.mirroring(), expected);
}

#[test]
fn test_nametable_folding_through_cartridge() {
    let rom = common::build_rom(&vec![0; 0x4000], &[0; 0x2000], 0, 0x01);
    let cartridge = Cartridge::from_ines(&rom, None).unwrap();
    // Vertical mirroring: $2000 and $2800 share VRAM, $2400 does not
    assert_eq!(
        cartridge.transform_nametable_addr(0x2000),
        cartridge.transform_nametable_addr(0x2800)
    );
    assert_ne!(
        cartridge.transform_nametable_addr(0x2000),
        cartridge.transform_nametable_addr(0x2400)
    );
}

#[test]
fn test_battery_flag() {
    let rom = common::build_rom(&vec![0; 0x4000], &[0; 0x2000], 0, 0x02);
    let cartridge = Cartridge::from_ines(&rom, None).unwrap();
    assert!(cartridge.has_battery_backed_ram());
}

#[test]
fn test_savedata_initialises_prg_ram() {
    let rom = common::build_rom(&vec![0; 0x4000], &[0; 0x2000], 0, 0x02);
    let mut savedata = vec![0; 0x2000];
    savedata[0x10] = 0x42;
    let cartridge = Cartridge::from_ines(&rom, Some(savedata)).unwrap();
    // PRG RAM sits at $6000 under NROM
    assert_eq_hex!(cartridge.read_cpu(0x6010), 0x42);
}

#[test]
fn test_savedata_size_mismatch() {
    let rom = common::build_rom(&vec![0; 0x4000], &[0; 0x2000], 0, 0x02);
    assert!(Cartridge::from_ines(&rom, Some(vec![0; 0x100])).is_err());
}
