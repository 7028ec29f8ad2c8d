use std::fmt::{Debug, Display};

use crate::core::{
    cartridge::{mapper::bank_addr, CartridgeMemory},
    Mapper, Mirroring,
};
use log::*;
use serde::{Deserialize, Serialize};

/// SxROM / MMC1 cartridge mapper (mapper 1)
///
/// Registers are written one bit at a time through a five-write shift
/// register. Controls PRG banking in 16 or 32 KiB chunks, CHR banking in
/// 4 or 8 KiB chunks, and the nametable mirroring.
#[derive(Serialize, Deserialize)]
pub struct SxRom {
    shift: usize,
    chr_bank_0: usize,
    chr_bank_1: usize,
    prg_bank: usize,
    control: usize,
    // Whether something has been written this CPU cycle, and thus further writes should be blocked
    has_written: bool,
}

impl Default for SxRom {
    fn default() -> SxRom {
        SxRom {
            shift: 0x10,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            // Power up with the last PRG bank fixed at $C000
            control: 0x0C,
            has_written: false,
        }
    }
}

impl SxRom {
    fn chr_addr(&self, ppu_addr: usize) -> usize {
        let mode = (self.control & 0x10) >> 4;
        if mode == 0 {
            // 8 KiB mode, the low bank bit is ignored
            bank_addr(0x2000, (self.chr_bank_0 & 0x1E) >> 1, ppu_addr)
        } else if ppu_addr < 0x1000 {
            bank_addr(0x1000, self.chr_bank_0, ppu_addr)
        } else {
            bank_addr(0x1000, self.chr_bank_1, ppu_addr)
        }
    }
}

#[typetag::serde]
impl Mapper for SxRom {
    fn mapper_num(&self) -> u32 {
        1
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        if cpu_addr < 0x8000 {
            if cpu_addr < 0x6000 {
                warn!("Invalid read at address {:X}", cpu_addr);
                return 0;
            }
            return mem.read_prg_ram(cpu_addr - 0x6000);
        }
        let mode = (self.control & 0x0C) >> 2;
        let addr = match mode {
            0 | 1 => {
                // Switch 32 KiB at once
                bank_addr(0x8000, (self.prg_bank & 0x0E) >> 1, cpu_addr)
            }
            2 => {
                if cpu_addr < 0xC000 {
                    // First bank fixed
                    bank_addr(0x4000, 0, cpu_addr)
                } else {
                    bank_addr(0x4000, self.prg_bank & 0x0F, cpu_addr)
                }
            }
            _ => {
                if cpu_addr < 0xC000 {
                    bank_addr(0x4000, self.prg_bank & 0x0F, cpu_addr)
                } else {
                    // Last bank fixed
                    bank_addr(0x4000, (mem.prg_rom.len() - 1) / 0x4000, cpu_addr)
                }
            }
        };
        mem.read_prg_rom(addr)
    }
    fn write_cpu(&mut self, cpu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        // Consecutive-cycle writes are ignored by the hardware
        if self.has_written {
            return;
        }
        self.has_written = true;
        if cpu_addr < 0x8000 {
            if cpu_addr >= 0x6000 {
                mem.write_prg_ram(cpu_addr - 0x6000, value);
            }
            return;
        }
        if value & 0x80 != 0 {
            // Reset the shift register and fix the last PRG bank
            self.shift = 0x10;
            self.control |= 0x0C;
            return;
        }
        let new_shift = (self.shift >> 1) | ((value as usize & 0x01) << 4);
        if (self.shift & 0x01) == 0 {
            self.shift = new_shift;
            return;
        }
        // Fifth write, commit to the register the address selects
        if cpu_addr < 0xA000 {
            self.control = new_shift;
        } else if cpu_addr < 0xC000 {
            self.chr_bank_0 = new_shift;
        } else if cpu_addr < 0xE000 {
            self.chr_bank_1 = new_shift;
        } else {
            self.prg_bank = new_shift;
        }
        self.shift = 0x10;
    }
    fn read_ppu(&mut self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_chr(self.chr_addr(ppu_addr))
    }
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        mem.write_chr(self.chr_addr(ppu_addr), value);
    }
    fn mirroring(&self, _mem: &CartridgeMemory) -> Mirroring {
        match self.control & 0x03 {
            0 => Mirroring::SingleScreen(0),
            1 => Mirroring::SingleScreen(1),
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
    fn advance_cpu_cycles(&mut self, _cycles: u32) {
        self.has_written = false;
    }
}

impl Display for SxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SxROM")
    }
}
impl Debug for SxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SxROM control={:#X} shift={:#X} prg_bank={} chr_banks=({}, {})",
            self.control, self.shift, self.prg_bank, self.chr_bank_0, self.chr_bank_1
        )
    }
}
