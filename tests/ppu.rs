//! Rendering behaviour that needs a real cartridge behind the PPU.
mod common;

use nesium::core::{Cartridge, Nes, Settings};

// A CHR bank where tile 1's low plane is solid, so every pixel of the
// tile is an opaque colour 1
fn chr_with_solid_tile() -> Vec<u8> {
    let mut chr = vec![0; 0x2000];
    chr[16..24].fill(0xFF);
    chr
}

fn nes_with_chr(chr: Vec<u8>) -> Nes {
    // An idle loop: JMP $8000
    let prg = common::program_prg(&[0x4C, 0x00, 0x80]);
    let rom = common::build_rom(&prg, &chr, 0, 0);
    Nes::with_cartridge(Cartridge::from_ines(&rom, None).unwrap())
}

#[test]
fn test_sprite_overflow_flag() {
    common::init();
    let settings = Settings::default();
    let mut nes = nes_with_chr(chr_with_solid_tile());
    // Nine identical sprites on one scanline. The buggy diagonal scan
    // finds the ninth immediately, since it matches the eighth exactly.
    nes.write_byte(0x2003, 0x00);
    (0..9).for_each(|_| {
        for value in [10, 1, 0, 20] {
            nes.write_byte(0x2004, value);
        }
    });
    nes.write_byte(0x2001, 0x18);
    nes.advance_frame(&settings).unwrap();
    assert!(nes.ppu.sprite_overflow());
}

#[test]
fn test_no_overflow_with_eight_sprites() {
    let settings = Settings::default();
    let mut nes = nes_with_chr(chr_with_solid_tile());
    nes.write_byte(0x2003, 0x00);
    (0..8).for_each(|_| {
        for value in [10, 1, 0, 20] {
            nes.write_byte(0x2004, value);
        }
    });
    nes.write_byte(0x2001, 0x18);
    nes.advance_frame(&settings).unwrap();
    assert!(!nes.ppu.sprite_overflow());
}

#[test]
fn test_ninth_sprite_not_drawn() {
    common::init();
    let settings = Settings::default();
    let mut nes = nes_with_chr(chr_with_solid_tile());
    // Backdrop colour and the first sprite palette's colour 1
    nes.write_byte(0x2006, 0x3F);
    nes.write_byte(0x2006, 0x00);
    nes.write_byte(0x2007, 0x21);
    nes.write_byte(0x2006, 0x3F);
    nes.write_byte(0x2006, 0x11);
    nes.write_byte(0x2007, 0x16);
    // Nine sprites on one scanline at distinct X positions
    nes.write_byte(0x2003, 0x00);
    (0..9u8).for_each(|i| {
        for value in [10, 1, 0, 16 + 8 * i] {
            nes.write_byte(0x2004, value);
        }
    });
    nes.write_byte(0x2001, 0x18);
    nes.advance_frame(&settings).unwrap();
    nes.advance_frame(&settings).unwrap();
    let output = nes.ppu.palette_output();
    // The first eight sprites cover pixels 16..80 of the scanline; the
    // ninth, at x = 80, is over the 8 sprite limit and leaves the backdrop
    assert_eq!(output[14][20], 0x16);
    assert_eq!(output[14][76], 0x16);
    assert_eq!(output[14][84], 0x21);
}

#[test]
fn test_sprite_zero_hit() {
    common::init();
    let settings = Settings::default();
    let mut nes = nes_with_chr(chr_with_solid_tile());
    // Put an opaque background tile at (12, 6), i.e. pixels (96..104, 48..56)
    nes.write_byte(0x2006, 0x20);
    nes.write_byte(0x2006, 0xCC);
    nes.write_byte(0x2007, 0x01);
    // Sprite 0 overlapping it
    nes.write_byte(0x2003, 0x00);
    for value in [50, 1, 0, 100] {
        nes.write_byte(0x2004, value);
    }
    // Reset the scroll, then turn rendering on
    nes.read_byte(0x2002);
    nes.write_byte(0x2000, 0x00);
    nes.write_byte(0x2005, 0x00);
    nes.write_byte(0x2005, 0x00);
    nes.write_byte(0x2001, 0x18);
    // The scroll is only reloaded on the prerender scanline, so the hit
    // lands in the second frame
    nes.advance_frame(&settings).unwrap();
    nes.advance_frame(&settings).unwrap();
    assert!(nes.ppu.sprite_zero_hit());
}

#[test]
fn test_no_hit_without_overlap() {
    let settings = Settings::default();
    let mut nes = nes_with_chr(chr_with_solid_tile());
    // Sprite 0 over an empty background never hits
    nes.write_byte(0x2003, 0x00);
    for value in [50, 1, 0, 100] {
        nes.write_byte(0x2004, value);
    }
    nes.read_byte(0x2002);
    nes.write_byte(0x2005, 0x00);
    nes.write_byte(0x2005, 0x00);
    nes.write_byte(0x2001, 0x18);
    nes.advance_frame(&settings).unwrap();
    nes.advance_frame(&settings).unwrap();
    assert!(!nes.ppu.sprite_zero_hit());
}

#[test]
fn test_backdrop_fills_output() {
    let settings = Settings::default();
    let mut nes = nes_with_chr(vec![0; 0x2000]);
    // Set the backdrop colour with rendering off
    nes.write_byte(0x2006, 0x3F);
    nes.write_byte(0x2006, 0x00);
    nes.write_byte(0x2007, 0x21);
    nes.write_byte(0x2001, 0x08);
    nes.advance_frame(&settings).unwrap();
    let output = nes.ppu.palette_output();
    assert_eq!(output[120][128], 0x21);
}
