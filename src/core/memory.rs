use rand::Rng;
use serde::{Deserialize, Serialize};

/// A sized, byte-addressable memory.
///
/// Backs the console's work RAM, the PPU's nametable VRAM, and the sprite
/// RAM (OAM). Addresses are always masked to the physical size, so an
/// out-of-range address resolves to its mirror rather than being rejected;
/// the bus applies any coarser mirroring rule (e.g. the CPU's 2 KiB RAM
/// repeating through `0x0000..0x2000`) before calling in here.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    bytes: Vec<u8>,
}

/// Values real hardware reliably holds at a few fixed offsets on power up.
/// Some games read them before ever writing to RAM.
const POWER_UP_SENTINELS: [(usize, u8); 4] = [(0x008, 0xF7), (0x009, 0xEF), (0x00A, 0xDF), (0x00F, 0xBF)];

impl Memory {
    /// Create a memory of `size` bytes, zero filled.
    pub fn new(size: usize) -> Memory {
        Memory { bytes: vec![0; size] }
    }
    /// Read the byte at `addr`, masked to the memory's size.
    pub fn read(&self, addr: usize) -> u8 {
        self.bytes[addr % self.bytes.len()]
    }
    /// Write a byte at `addr`, masked to the memory's size.
    pub fn write(&mut self, addr: usize, value: u8) {
        let len = self.bytes.len();
        self.bytes[addr % len] = value;
    }
    /// Zero the entire memory.
    pub fn reset(&mut self) {
        self.bytes.fill(0);
    }
    /// Fill the memory with the console's power-up pattern.
    ///
    /// Real hardware comes up with RAM in a statistically mixed state:
    /// roughly a third of bytes are `0x00`, a third are `0xFF`, and the
    /// rest are arbitrary, with a handful of reliable sentinel values in
    /// each 2 KiB page. Games that seed RNGs from uninitialized RAM
    /// depend on this mix.
    pub fn fill_power_up_pattern<R: Rng>(&mut self, rng: &mut R) {
        for b in self.bytes.iter_mut() {
            *b = match rng.gen_range(0..100) {
                0..33 => 0x00,
                33..66 => 0xFF,
                _ => rng.gen(),
            };
        }
        for page in self.bytes.chunks_mut(0x800) {
            for (offset, value) in POWER_UP_SENTINELS {
                if offset < page.len() {
                    page[offset] = value;
                }
            }
        }
    }
    /// The physical size of the memory in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
    /// Whether the memory is zero sized.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
    /// The memory's contents as a byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
    /// The memory's contents as a mutable byte slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Memory({} bytes)", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::Memory;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_mirrored_access() {
        let mut mem = Memory::new(0x800);
        mem.write(0x12, 0x34);
        assert_eq!(mem.read(0x12), 0x34);
        // Mirrors of the same physical byte
        assert_eq!(mem.read(0x812), 0x34);
        mem.write(0x1812, 0x56);
        assert_eq!(mem.read(0x12), 0x56);
    }

    #[test]
    fn test_power_up_pattern() {
        let mut mem = Memory::new(0x800);
        let mut rng = StdRng::seed_from_u64(0);
        mem.fill_power_up_pattern(&mut rng);
        assert_eq!(mem.read(0x008), 0xF7);
        assert_eq!(mem.read(0x009), 0xEF);
        assert_eq!(mem.read(0x00A), 0xDF);
        assert_eq!(mem.read(0x00F), 0xBF);
        // The fill should be mixed, not uniform
        let zeroes = mem.as_slice().iter().filter(|&&b| b == 0x00).count();
        let ones = mem.as_slice().iter().filter(|&&b| b == 0xFF).count();
        assert!(zeroes > 0x200 && zeroes < 0x500);
        assert!(ones > 0x200 && ones < 0x500);
    }

    #[test]
    fn test_reset_zeroes() {
        let mut mem = Memory::new(0x100);
        let mut rng = StdRng::seed_from_u64(1);
        mem.fill_power_up_pattern(&mut rng);
        mem.reset();
        assert!(mem.as_slice().iter().all(|&b| b == 0));
    }
}
