use std::fmt::{Debug, Display};

use crate::core::{
    cartridge::{
        mapper::{bank_addr, num_banks},
        CartridgeMemory,
    },
    Mapper, Mirroring,
};
use log::*;
use serde::{Deserialize, Serialize};

/// TxROM / MMC3 cartridge mapper (mapper 4)
///
/// Two switchable 8 KiB PRG banks with the rest fixed, six switchable CHR
/// banks, and a scanline counter driven by rising edges on PPU address
/// line A12 that can raise an IRQ.
#[derive(Serialize, Deserialize)]
pub struct TxRom {
    prg_banks: [usize; 2],
    chr_banks: [usize; 6],
    prg_mode: usize,
    chr_mode: usize,
    // Which bank register the next bank data write sets.
    // 0-5 select a CHR bank, 6-7 a PRG bank.
    bank_select: usize,
    mirroring: Mirroring,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
    a12_high: bool,
}

impl Default for TxRom {
    fn default() -> Self {
        TxRom {
            prg_banks: [0; 2],
            chr_banks: [0; 6],
            prg_mode: 0,
            chr_mode: 0,
            bank_select: 0,
            mirroring: Mirroring::Vertical,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            a12_high: false,
        }
    }
}

impl TxRom {
    fn chr_addr(&self, ppu_addr: usize) -> usize {
        // chr_mode swaps which pattern table half gets the 2 KiB banks
        let (bank_size, bank_num) = if (ppu_addr < 0x1000) != (self.chr_mode == 1) {
            (0x800, self.chr_banks[(ppu_addr & 0xFFF) / 0x800] / 2)
        } else {
            (0x400, self.chr_banks[(ppu_addr & 0xFFF) / 0x400 + 2])
        };
        bank_addr(bank_size, bank_num, ppu_addr)
    }
    // Clock the scanline counter on a low-to-high transition of A12
    fn watch_a12(&mut self, ppu_addr: usize) {
        let high = ppu_addr & 0x1000 != 0;
        if high && !self.a12_high {
            if self.irq_counter == 0 || self.irq_reload {
                self.irq_counter = self.irq_latch;
                self.irq_reload = false;
            } else {
                self.irq_counter -= 1;
            }
            if self.irq_counter == 0 && self.irq_enabled {
                self.irq_pending = true;
            }
        }
        self.a12_high = high;
    }
}

#[typetag::serde]
impl Mapper for TxRom {
    fn mapper_num(&self) -> u32 {
        4
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        let second_last = num_banks(0x2000, &mem.prg_rom) - 2;
        match cpu_addr {
            0x6000..0x8000 => mem.read_prg_ram(cpu_addr - 0x6000),
            0x8000..0xA000 => {
                let bank = if self.prg_mode == 0 {
                    self.prg_banks[0]
                } else {
                    second_last
                };
                mem.read_prg_rom(bank_addr(0x2000, bank, cpu_addr))
            }
            0xA000..0xC000 => mem.read_prg_rom(bank_addr(0x2000, self.prg_banks[1], cpu_addr)),
            0xC000..0xE000 => {
                let bank = if self.prg_mode == 0 {
                    second_last
                } else {
                    self.prg_banks[0]
                };
                mem.read_prg_rom(bank_addr(0x2000, bank, cpu_addr))
            }
            0xE000..0x10000 => {
                mem.read_prg_rom(bank_addr(0x2000, second_last + 1, cpu_addr))
            }
            _ => {
                warn!("Invalid read at address {:X}", cpu_addr);
                0
            }
        }
    }
    fn write_cpu(&mut self, cpu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        let even = cpu_addr % 2 == 0;
        match cpu_addr {
            0x6000..0x8000 => mem.write_prg_ram(cpu_addr - 0x6000, value),
            0x8000..0xA000 => {
                if even {
                    self.bank_select = (value & 0x07) as usize;
                    self.prg_mode = ((value & 0x40) >> 6) as usize;
                    self.chr_mode = ((value & 0x80) >> 7) as usize;
                } else if self.bank_select < 6 {
                    self.chr_banks[self.bank_select] = value as usize;
                } else {
                    // Only 6 bits of the PRG bank number exist
                    self.prg_banks[self.bank_select - 6] = (value & 0x3F) as usize;
                }
            }
            0xA000..0xC000 => {
                if even {
                    self.mirroring = if value & 0x01 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    };
                }
                // Odd writes set PRG RAM protection, which is not emulated
            }
            0xC000..0xE000 => {
                if even {
                    self.irq_latch = value;
                } else {
                    // Reload at the next A12 clock
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000..0x10000 => {
                if even {
                    self.irq_enabled = false;
                    self.irq_pending = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => warn!("Invalid write at address {:X}", cpu_addr),
        }
    }
    fn read_ppu(&mut self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        self.watch_a12(ppu_addr);
        mem.read_chr(self.chr_addr(ppu_addr))
    }
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        self.watch_a12(ppu_addr);
        mem.write_chr(self.chr_addr(ppu_addr), value);
    }
    fn mirroring(&self, mem: &CartridgeMemory) -> Mirroring {
        // Four screen cartridges hardwire their VRAM
        if mem.mirroring == Mirroring::FourScreen {
            Mirroring::FourScreen
        } else {
            self.mirroring
        }
    }
    fn irq(&self) -> bool {
        self.irq_pending
    }
}

impl Display for TxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TxROM")
    }
}
impl Debug for TxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "TxROM prg_banks={:?} chr_banks={:?} prg_mode={} chr_mode={} irq_counter={}",
            self.prg_banks, self.chr_banks, self.prg_mode, self.chr_mode, self.irq_counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::TxRom;
    use crate::core::{CartridgeMemory, Mapper, Mirroring};

    fn mem() -> CartridgeMemory {
        CartridgeMemory {
            prg_ram: vec![0; 0x2000],
            prg_rom: (0..16).flat_map(|b| vec![b as u8; 0x2000]).collect(),
            chr_ram: Vec::new(),
            chr_rom: (0..64).flat_map(|b| vec![b as u8; 0x400]).collect(),
            mirroring: Mirroring::Horizontal,
        }
    }

    #[test]
    fn test_prg_fixed_banks() {
        let mapper = TxRom::default();
        let m = mem();
        // Banks 14 and 15 are fixed in mode 0
        assert_eq!(mapper.read_cpu(0xC000, &m), 14);
        assert_eq!(mapper.read_cpu(0xE000, &m), 15);
    }

    #[test]
    fn test_prg_bank_switch() {
        let mut mapper = TxRom::default();
        let mut m = mem();
        mapper.write_cpu(0x8000, &mut m, 6);
        mapper.write_cpu(0x8001, &mut m, 5);
        assert_eq!(mapper.read_cpu(0x8000, &m), 5);
        // Mode 1 moves the switchable bank to $C000
        mapper.write_cpu(0x8000, &mut m, 0x46);
        assert_eq!(mapper.read_cpu(0xC000, &m), 5);
        assert_eq!(mapper.read_cpu(0x8000, &m), 14);
    }

    #[test]
    fn test_chr_windows() {
        let mut mapper = TxRom::default();
        let mut m = mem();
        // 2 KiB bank 0 reads pairs, 1 KiB banks read singles
        mapper.write_cpu(0x8000, &mut m, 0);
        mapper.write_cpu(0x8001, &mut m, 8);
        mapper.write_cpu(0x8000, &mut m, 2);
        mapper.write_cpu(0x8001, &mut m, 20);
        assert_eq!(mapper.read_ppu(0x0000, &m), 8);
        assert_eq!(mapper.read_ppu(0x0400, &m), 9);
        assert_eq!(mapper.read_ppu(0x1000, &m), 20);
    }

    #[test]
    fn test_scanline_irq() {
        let mut mapper = TxRom::default();
        let mut m = mem();
        mapper.write_cpu(0xC000, &mut m, 2);
        mapper.write_cpu(0xC001, &mut m, 0);
        mapper.write_cpu(0xE001, &mut m, 0);
        // Each rising A12 edge clocks the counter once
        assert!(!mapper.irq());
        mapper.read_ppu(0x1000, &m); // reload to 2
        mapper.read_ppu(0x0000, &m);
        mapper.read_ppu(0x1000, &m); // 1
        mapper.read_ppu(0x0000, &m);
        mapper.read_ppu(0x1000, &m); // 0, IRQ
        assert!(mapper.irq());
        // Disabling acknowledges the IRQ
        mapper.write_cpu(0xE000, &mut m, 0);
        assert!(!mapper.irq());
    }
}
