use std::fmt::{Debug, Display};

use crate::core::{
    cartridge::{
        mapper::{bank_addr, num_banks},
        CartridgeMemory,
    },
    Mapper,
};
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Default, Serialize, Deserialize)]
/// UxROM cartridge mapper and variants (mapper 2)
///
/// A switchable 16 KiB PRG bank at `$8000` with the last bank fixed at
/// `$C000`. CHR is unbanked.
pub struct UxRom {
    bank: usize,
}

const BANK_SIZE: usize = 0x4000;
#[typetag::serde]
impl Mapper for UxRom {
    fn mapper_num(&self) -> u32 {
        2
    }
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8 {
        let bank = match cpu_addr {
            0x8000..0xC000 => self.bank,
            // Fixed to last bank
            0xC000.. => num_banks(BANK_SIZE, &mem.prg_rom) - 1,
            _ => {
                warn!("UxROM has no PRG RAM to read at {:X}", cpu_addr);
                return 0;
            }
        };
        mem.read_prg_rom(bank_addr(BANK_SIZE, bank, cpu_addr))
    }
    fn write_cpu(&mut self, _cpu_addr: usize, _mem: &mut CartridgeMemory, value: u8) {
        // Board variants latch different subsets of these bits, which the
        // wrapping in read_prg_rom takes care of
        self.bank = value as usize;
    }
}

impl Display for UxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UxROM")
    }
}
impl Debug for UxRom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UxROM bank={}", self.bank)
    }
}
