use std::fmt::{Debug, Display};

use serde::{Deserialize, Serialize};

use crate::core::{
    cartridge::{mapper::bank_addr, CartridgeMemory},
    Mapper, Mirroring,
};

/// AxROM cartridge mapper (mapper 7)
///
/// A switchable 32 KiB PRG bank and single-screen mirroring with a
/// selectable VRAM page.
#[derive(Default, Serialize, Deserialize)]
pub struct AxRom {
    prg_bank: usize,
    vram_page: usize,
}

#[typetag::serde]
impl Mapper for AxRom {
    fn mapper_num(&self) -> u32 {
        7
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_prg_rom(bank_addr(0x8000, self.prg_bank, cpu_addr))
    }
    fn write_cpu(&mut self, _cpu_addr: usize, _mem: &mut CartridgeMemory, value: u8) {
        self.prg_bank = (value & 0x07) as usize;
        self.vram_page = ((value & 0x10) >> 4) as usize;
    }
    fn mirroring(&self, _mem: &CartridgeMemory) -> Mirroring {
        Mirroring::SingleScreen(self.vram_page)
    }
}

impl Display for AxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AxROM")
    }
}

impl Debug for AxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AxROM prg_bank={} vram_page={}", self.prg_bank, self.vram_page)
    }
}
