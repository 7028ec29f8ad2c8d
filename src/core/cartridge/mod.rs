mod mapper;
pub use mapper::Mapper;
pub mod mappers;

use crate::core::cartridge::mapper::get_mapper;
use log::*;
use serde::{Deserialize, Serialize};
use std::{
    cmp::max,
    fmt::{Debug, Display},
};

/// The nametable mirroring a cartridge applies to the PPU's VRAM.
///
/// The PPU addresses four screens of nametable data but the console only
/// has enough VRAM for two, so the cartridge decides how addresses fold
/// onto the physical memory. Most cartridges hardwire one of the first two
/// arrangements; mappers with their own VRAM control report the others.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum Mirroring {
    /// Vertically stacked screens are mirrors, i.e. $2000=$2400 and $2800=$2C00
    Horizontal,
    /// Side by side screens are mirrors, i.e. $2000=$2800 and $2400=$2C00
    Vertical,
    /// All four screens show the same page of VRAM
    SingleScreen(usize),
    /// No mirroring, the cartridge supplies 4 KiB of VRAM
    FourScreen,
}

impl Mirroring {
    /// Fold a nametable address in `$2000..$3000` (or any of its mirrors)
    /// onto an offset into the PPU's VRAM.
    /// ```
    /// use nesium::core::Mirroring;
    /// assert_eq!(Mirroring::Horizontal.transform(0x2400), 0x000);
    /// assert_eq!(Mirroring::Horizontal.transform(0x2800), 0x400);
    /// assert_eq!(Mirroring::Vertical.transform(0x2800), 0x000);
    /// assert_eq!(Mirroring::SingleScreen(1).transform(0x2C12), 0x412);
    /// ```
    pub fn transform(&self, addr: usize) -> usize {
        let addr = addr & 0xFFF;
        match self {
            Mirroring::Horizontal => ((addr & 0x800) >> 1) | (addr & 0x3FF),
            Mirroring::Vertical => addr & 0x7FF,
            Mirroring::SingleScreen(page) => page * 0x400 + (addr & 0x3FF),
            Mirroring::FourScreen => addr,
        }
    }
}

/// Contains all memory in the cartridge that isn't mapper-specific.
///
/// Contains PRG/CHR ROM/RAM.
/// Does not contain any latches, banks, or dividers used by mappers.
#[derive(Clone, Serialize, Deserialize)]
pub struct CartridgeMemory {
    /// Program RAM (PRG RAM) of the cartridge
    pub prg_ram: Vec<u8>,
    /// Program ROM (PRG ROM) of the cartridge
    pub prg_rom: Vec<u8>,
    /// Character RAM (CHR RAM) of the cartridge
    pub chr_ram: Vec<u8>,
    /// Character ROM (CHR ROM) of the cartridge
    pub chr_rom: Vec<u8>,
    /// Mirroring read from the file header.
    /// May be overridden by the mapper, use [Cartridge::mirroring] for the
    /// arrangement currently in effect.
    pub mirroring: Mirroring,
}
impl CartridgeMemory {
    /// Read a byte of PRG ROM, wrapping at its size.
    pub fn read_prg_rom(&self, addr: usize) -> u8 {
        self.prg_rom[addr % self.prg_rom.len()]
    }
    /// Read a byte of PRG RAM, wrapping at its size.
    pub fn read_prg_ram(&self, addr: usize) -> u8 {
        if self.prg_ram.is_empty() {
            return 0;
        }
        self.prg_ram[addr % self.prg_ram.len()]
    }
    /// Write a byte of PRG RAM, if there is any.
    pub fn write_prg_ram(&mut self, addr: usize, value: u8) {
        if !self.prg_ram.is_empty() {
            let i = addr % self.prg_ram.len();
            self.prg_ram[i] = value;
        }
    }
    /// Read a byte from CHR ROM or (if CHR ROM is empty) CHR RAM.
    ///
    /// Most cartridges carry either all CHR ROM or all CHR RAM, so this
    /// reads "whatever CHR the cartridge has".
    pub fn read_chr(&self, addr: usize) -> u8 {
        if self.chr_rom.is_empty() {
            self.chr_ram[addr % self.chr_ram.len()]
        } else {
            self.chr_rom[addr % self.chr_rom.len()]
        }
    }
    /// Write a byte to CHR RAM, if present.
    pub fn write_chr(&mut self, addr: usize, value: u8) {
        if !self.chr_ram.is_empty() {
            let i = addr % self.chr_ram.len();
            self.chr_ram[i] = value;
        }
    }
}

/// An NES cartridge.
///
/// Contains the cartridge's RAM and ROM in [CartridgeMemory] and a [Mapper]
/// responsible for mapping addresses to data.
#[derive(Serialize, Deserialize)]
pub struct Cartridge {
    /// The memory in the cartridge
    pub memory: CartridgeMemory,
    /// The mapper the cartridge is using
    pub mapper: Box<dyn Mapper>,
    // Whether the cartridge has battery backed RAM and should be saved
    has_battery_ram: bool,
}

impl Cartridge {
    /// Create a new cartridge from the contents of an iNES (.nes) file.
    ///
    /// Fails with a description of the problem when the image is not a
    /// usable iNES file: wrong magic number, no PRG ROM, a body shorter
    /// than the sizes the header declares, or an unsupported mapper.
    ///
    /// * `bytes` The contents of the iNES file.
    /// * `savedata` The battery backed static RAM on the cartridge, used to initialise the PRG RAM if present.
    pub fn from_ines(bytes: &[u8], savedata: Option<Vec<u8>>) -> Result<Cartridge, String> {
        if bytes.len() < 16 {
            return Err(format!(
                "File is too short to hold an iNES header ({} bytes)",
                bytes.len()
            ));
        }
        if bytes[0..4] != [b'N', b'E', b'S', 0x1A] {
            return Err(format!(
                "File does not start with the iNES magic number (found {:02X?})",
                &bytes[0..4]
            ));
        }
        if bytes[4] == 0 {
            return Err("Header declares zero banks of PRG ROM".to_string());
        }
        let prg_rom_size = 0x4000 * bytes[4] as usize;
        let chr_rom_size = 0x2000 * bytes[5] as usize;
        let prg_ram_size = max(bytes[8] as usize * 0x2000, 0x2000);
        // A cartridge with no CHR ROM always gets CHR RAM, whatever the
        // header revision, or there is no pattern memory at all
        let chr_ram_size = if chr_rom_size == 0 { 0x2000 } else { 0x0 };
        debug!("Cartridge header: {:X?}", &bytes[0..16]);
        let has_battery_ram = (bytes[6] & 0x02) != 0;
        let has_trainer = (bytes[6] & 0x04) != 0;
        let four_screen = (bytes[6] & 0x08) != 0;
        debug!(
            "Trainer: {}, four screen VRAM: {}, battery backed ram: {}",
            has_trainer, four_screen, has_battery_ram
        );
        // Detect type of iNES file
        let total_file_size = 16 + if has_trainer { 512 } else { 0 } + prg_rom_size + chr_rom_size;
        if bytes.len() < total_file_size {
            return Err(format!(
                "File is truncated: header declares {:#X} bytes but only {:#X} are present",
                total_file_size,
                bytes.len()
            ));
        }
        let file_type = if bytes[7] & 0x0C == 0x08 {
            debug!("iNES 2.0 detected");
            0
        } else if bytes[7] & 0x0C == 0x04 {
            debug!("Archaic iNES detected");
            1
        } else if bytes[7] & 0x0C == 0x00 {
            debug!("iNES detected");
            2
        } else {
            debug!("Archaic iNES probably detected");
            1
        };
        debug!(
            "Header says {}, region comes from settings instead",
            if bytes[9] & 0x01 != 0 { "PAL" } else { "NTSC" }
        );
        debug!(
            "{:X} bytes PRG ROM, {:X} bytes CHR ROM, {:X} bytes PRG RAM, {:X} bytes CHR RAM",
            prg_rom_size, chr_rom_size, prg_ram_size, chr_ram_size
        );
        let mapper_id = (bytes[6] >> 4) + if file_type != 1 { bytes[7] & 0xF0 } else { 0 };
        let mirroring = if four_screen {
            Mirroring::FourScreen
        } else if (bytes[6] & 0x01) == 0 {
            Mirroring::Horizontal
        } else {
            Mirroring::Vertical
        };
        debug!("Cartridge is using {:?} mirroring", mirroring);
        debug!(
            "Cartridge is using mapper {} (0x{:X})",
            mapper_id, mapper_id
        );
        let mapper = get_mapper(mapper_id as usize)?;
        let mut start = 16 + if has_trainer { 512 } else { 0 };
        let mut end = start + prg_rom_size;
        let prg_rom = bytes[start..end].to_vec();
        start = end;
        end += chr_rom_size;
        let chr_rom = bytes[start..end].to_vec();
        // Load PRG RAM from savedata if we have some
        let prg_ram = match savedata {
            Some(data) => {
                if data.len() != prg_ram_size {
                    return Err(format!(
                        "Savedata is {:#X} bytes but the cartridge has {:#X} bytes of PRG RAM",
                        data.len(),
                        prg_ram_size
                    ));
                }
                data
            }
            None => vec![0; prg_ram_size],
        };
        Ok(Cartridge {
            memory: CartridgeMemory {
                prg_rom,
                chr_rom,
                prg_ram,
                chr_ram: vec![0; chr_ram_size],
                mirroring,
            },
            mapper,
            has_battery_ram,
        })
    }
    // An all-zeroes NROM cartridge, used when no ROM is loaded
    pub(crate) fn blank() -> Cartridge {
        Cartridge {
            memory: CartridgeMemory {
                prg_rom: vec![0; 0x8000],
                chr_rom: vec![0; 0x2000],
                prg_ram: vec![0; 0x2000],
                chr_ram: Vec::new(),
                mirroring: Mirroring::Horizontal,
            },
            mapper: Box::new(mappers::NRom::default()),
            has_battery_ram: false,
        }
    }
    /// Read a byte from the cartridge's memory given an address in CPU memory space
    pub fn read_cpu(&self, addr: usize) -> u8 {
        self.mapper.read_cpu(addr, &self.memory)
    }
    /// Write a byte in the cartridge's memory given an address in CPU memory space
    pub fn write_cpu(&mut self, addr: usize, value: u8) {
        self.mapper.write_cpu(addr, &mut self.memory, value);
    }
    /// Read a byte in the cartridge's memory given an address in PPU memory space
    pub fn read_ppu(&mut self, addr: usize) -> u8 {
        self.mapper.read_ppu(addr, &self.memory)
    }
    /// Write a byte of data to CHR ROM/RAM in PPU memory space.
    pub fn write_ppu(&mut self, addr: usize, value: u8) {
        self.mapper.write_ppu(addr, &mut self.memory, value);
    }
    /// Fold a nametable address onto the PPU's VRAM using the mirroring
    /// currently in effect.
    pub fn transform_nametable_addr(&self, addr: usize) -> usize {
        self.mirroring().transform(addr)
    }
    /// [true] if the cartridge has battery backed RAM (i.e. save data), [false] otherwise
    pub fn has_battery_backed_ram(&self) -> bool {
        self.has_battery_ram
    }
    /// Get the mirroring the cartridge is currently applying
    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring(&self.memory)
    }
    /// Advance the cartridge by a certain number of CPU cycles
    pub fn advance_cpu_cycles(&mut self, cycles: u32) {
        self.mapper.advance_cpu_cycles(cycles);
    }
    /// A FNV-1a hash of the PRG ROM, used to tie save states to the
    /// cartridge they were taken from.
    pub fn prg_checksum(&self) -> u32 {
        self.memory.prg_rom.iter().fold(0x811C_9DC5u32, |hash, &b| {
            (hash ^ b as u32).wrapping_mul(0x0100_0193)
        })
    }
}

impl Display for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.mapper, f)
    }
}
impl Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(&self.mapper, f)
    }
}

#[cfg(test)]
mod tests {
    use super::{Cartridge, Mirroring};

    fn ines(prg_banks: u8, chr_banks: u8, flags6: u8) -> Vec<u8> {
        let mut bytes = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, 0, 0, 0];
        bytes.resize(16, 0);
        bytes.resize(
            16 + 0x4000 * prg_banks as usize + 0x2000 * chr_banks as usize,
            0,
        );
        bytes
    }

    #[test]
    fn test_parse_valid() {
        let c = Cartridge::from_ines(&ines(2, 1, 0x01), None).unwrap();
        assert_eq!(c.memory.prg_rom.len(), 0x8000);
        assert_eq!(c.memory.chr_rom.len(), 0x2000);
        assert!(c.memory.chr_ram.is_empty());
        assert_eq!(c.memory.mirroring, Mirroring::Vertical);
        assert!(!c.has_battery_backed_ram());
    }

    #[test]
    fn test_parse_chr_ram() {
        let c = Cartridge::from_ines(&ines(1, 0, 0x00), None).unwrap();
        assert!(c.memory.chr_rom.is_empty());
        assert_eq!(c.memory.chr_ram.len(), 0x2000);
        assert_eq!(c.memory.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn test_parse_archaic_chr_ram() {
        // An archaic header (byte 7 & 0x0C == 0x04) with no CHR ROM must
        // still come with CHR RAM for pattern fetches to land in
        let mut bytes = ines(1, 0, 0x00);
        bytes[7] = 0x04;
        let mut c = Cartridge::from_ines(&bytes, None).unwrap();
        assert!(c.memory.chr_rom.is_empty());
        assert_eq!(c.memory.chr_ram.len(), 0x2000);
        c.write_ppu(0x1000, 0x42);
        assert_eq!(c.read_ppu(0x1000), 0x42);
    }

    #[test]
    fn test_parse_bad_magic() {
        let mut bytes = ines(1, 1, 0);
        bytes[0] = b'X';
        assert!(Cartridge::from_ines(&bytes, None).is_err());
    }

    #[test]
    fn test_parse_too_short() {
        assert!(Cartridge::from_ines(&[b'N', b'E', b'S', 0x1A], None).is_err());
    }

    #[test]
    fn test_parse_truncated_body() {
        let mut bytes = ines(2, 1, 0);
        bytes.truncate(16 + 0x4000);
        let err = Cartridge::from_ines(&bytes, None).unwrap_err();
        assert!(err.contains("truncated"), "unexpected error: {}", err);
    }

    #[test]
    fn test_parse_zero_prg() {
        assert!(Cartridge::from_ines(&ines(0, 1, 0), None).is_err());
    }

    #[test]
    fn test_parse_unsupported_mapper() {
        let mut bytes = ines(1, 1, 0xF0);
        bytes[7] = 0xF0;
        assert!(Cartridge::from_ines(&bytes, None).is_err());
    }

    #[test]
    fn test_checksum_tracks_prg() {
        let a = Cartridge::from_ines(&ines(1, 1, 0), None).unwrap();
        let mut bytes = ines(1, 1, 0);
        bytes[16] = 0xFF;
        let b = Cartridge::from_ines(&bytes, None).unwrap();
        assert_ne!(a.prg_checksum(), b.prg_checksum());
    }

    #[test]
    fn test_mirroring_transforms() {
        assert_eq!(Mirroring::Horizontal.transform(0x2000), 0x000);
        assert_eq!(Mirroring::Horizontal.transform(0x2400), 0x000);
        assert_eq!(Mirroring::Horizontal.transform(0x2BFF), 0x7FF);
        assert_eq!(Mirroring::Vertical.transform(0x2400), 0x400);
        assert_eq!(Mirroring::Vertical.transform(0x2C01), 0x401);
        assert_eq!(Mirroring::SingleScreen(0).transform(0x2C00), 0x000);
        assert_eq!(Mirroring::FourScreen.transform(0x2C00), 0xC00);
        // Mirrors of the nametable range fold the same way
        assert_eq!(
            Mirroring::Vertical.transform(0x3400),
            Mirroring::Vertical.transform(0x2400)
        );
    }
}
