use std::fmt::{Debug, Display};

use super::{
    mappers::{AxRom, CnRom, NRom, SxRom, TxRom, UxRom},
    CartridgeMemory, Mirroring,
};

/// The mapper circuitry on a cartridge.
///
/// Decides what each CPU or PPU address resolves to, and carries whatever
/// banking registers, counters, or latches the cartridge has. Serialized
/// into save states alongside the rest of the machine, so implementations
/// hold only their register state and borrow the [CartridgeMemory] they
/// operate on.
#[typetag::serde(tag = "mapper")]
pub trait Mapper: Display + Debug {
    /// The iNES mapper number this implements.
    fn mapper_num(&self) -> u32;
    /// Read a byte given an address in CPU space (`$4020..$10000`).
    fn read_cpu(&self, cpu_addr: usize, mem: &CartridgeMemory) -> u8;
    /// Write a byte given an address in CPU space. Writes into ROM ranges
    /// drive the mapper's registers.
    fn write_cpu(&mut self, cpu_addr: usize, mem: &mut CartridgeMemory, value: u8);
    /// Read a byte of CHR given an address in PPU space (`$0000..$2000`).
    /// Takes `&mut self` since some mappers watch the PPU address bus.
    fn read_ppu(&mut self, ppu_addr: usize, mem: &CartridgeMemory) -> u8 {
        mem.read_chr(ppu_addr)
    }
    /// Write a byte of CHR given an address in PPU space.
    fn write_ppu(&mut self, ppu_addr: usize, mem: &mut CartridgeMemory, value: u8) {
        mem.write_chr(ppu_addr, value);
    }
    /// The nametable mirroring currently in effect.
    fn mirroring(&self, mem: &CartridgeMemory) -> Mirroring {
        mem.mirroring
    }
    /// Advance the mapper's internal clocks by some CPU cycles.
    fn advance_cpu_cycles(&mut self, _cycles: u32) {}
    /// Whether the mapper is asserting the IRQ line.
    fn irq(&self) -> bool {
        false
    }
}

/// Build the [Mapper] for an iNES mapper number, or fail for numbers this
/// library does not implement.
pub fn get_mapper(mapper_id: usize) -> Result<Box<dyn Mapper>, String> {
    Ok(match mapper_id {
        0 => Box::new(NRom::default()),
        1 => Box::new(SxRom::default()),
        2 => Box::new(UxRom::default()),
        3 => Box::new(CnRom::default()),
        4 => Box::new(TxRom::default()),
        7 => Box::new(AxRom::default()),
        _ => return Err(format!("Unsupported mapper: {}", mapper_id)),
    })
}

/// Resolve an offset inside a numbered bank to a flat address.
pub fn bank_addr(bank_size: usize, bank_num: usize, offset: usize) -> usize {
    bank_size * bank_num + (offset % bank_size)
}

/// The number of banks of a given size in a memory.
pub fn num_banks(bank_size: usize, mem: &[u8]) -> usize {
    mem.len() / bank_size
}
