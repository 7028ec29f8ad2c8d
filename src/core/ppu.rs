use std::{cmp::min, collections::VecDeque};

use crate::core::{Cartridge, Memory, Settings, NES_PALETTE};
use log::*;
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

/// Number of dots per scanline
const DOTS_PER_SCANLINE: u32 = 341;
/// Number of visible scanlines
const RENDER_SCANLINES: u32 = 240;
/// Visible dots per scanline
const RENDER_DOTS: u32 = 256;
const DOTS_PER_OPEN_BUS_DECAY: u32 = 1_789_000 / 3;

fn zeros() -> Box<[[usize; 256]; 240]> {
    Box::new([[0; 256]; 240])
}
fn vram_default() -> Memory {
    Memory::new(0x1000)
}
fn oam_default() -> Memory {
    Memory::new(0x100)
}

#[derive(Debug, Serialize, Deserialize)]
/// The picture processing unit of the NES.
///
/// Responsible for computing the picture output of the console.
/// The output is available as the raw palette byte per pixel through
/// [Ppu::palette_output], or as RGB triplets through [Ppu::rgb_output] or
/// [Ppu::rgb_output_buf].
pub struct Ppu {
    /// The Object Attribute Memory, or OAM
    #[serde(skip, default = "oam_default")]
    pub oam: Memory,
    /// The PPUCTRL register
    pub ctrl: u8,
    /// The PPUMASK register
    pub mask: u8,
    /// The PPUSTATUS register
    pub status: u8,
    /// The OAMADDR register
    pub oam_addr: u8,
    /// The PPUDATA read buffer
    pub data: u8,
    /// The OAMDMA register
    ///
    /// Usually [None], set to [Some] when written to and reset once the
    /// DMA executes.
    pub oam_dma: Option<u8>,
    /// The palette RAM
    pub palette_ram: [u8; 0x20],
    /// Nametable VRAM. 4 KiB so four screen cartridges work, although
    /// most cartridges only ever address half of it.
    #[serde(skip, default = "vram_default")]
    pub nametable_ram: Memory,
    // W register, the shared write latch of PPUSCROLL and PPUADDR
    w: bool,
    // (x, y) coordinate of the dot being processed
    pub dot: (u32, u32),
    // t register
    t: u32,
    // v register
    v: u32,
    x: u32,
    // Sprite pixels on the scanline currently being drawn,
    // as (OAM index, palette byte) per screen column
    #[serde(with = "BigArray")]
    scanline_sprites: [Option<(usize, usize)>; 256],
    // Screen buffer, one palette byte per pixel
    #[serde(skip, default = "zeros")]
    output: Box<[[usize; 256]; 240]>,
    // Open bus value and its decay timer
    open_bus: u8,
    open_bus_dots: u32,
    // Dots since the status byte was last read, for the NMI race
    status_dots: u32,
    // Tile buffer, emulates both the two 16 bit tile data shift registers
    // and the 8 bit attribute shift register.
    // Entries are (pixel's index in its palette, palette index)
    tile_buffer: VecDeque<(usize, usize)>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Initialise a new PPU.
    ///
    /// Zeroes out all memory, sets the registers to their power up values,
    /// and sets the dot position to `(0, 0)`.
    pub fn new() -> Ppu {
        Ppu {
            oam: oam_default(),
            ctrl: 0x00,
            mask: 0,
            status: 0xA0,
            oam_addr: 0,
            data: 0,
            oam_dma: None,
            palette_ram: [0; 0x20],
            nametable_ram: vram_default(),
            w: false,
            dot: (0, 0),
            t: 0,
            v: 0,
            x: 0,
            scanline_sprites: [None; 256],
            output: zeros(),
            open_bus: 0,
            open_bus_dots: 0,
            status_dots: 0,
            tile_buffer: VecDeque::from([(0, 0); 16]),
        }
    }
    /// Read a byte from the PPU registers given an address in CPU space.
    ///
    /// Requires the cartridge currently inserted in the NES.
    pub fn read_byte(&mut self, addr: usize, cartridge: &mut Cartridge) -> u8 {
        match addr % 8 {
            2 => {
                // VBlank is cleared on read, along with the write latch
                let status = self.status;
                self.status &= 0x7F;
                self.w = false;
                self.status_dots = 0;
                (status & 0xE0) | (self.open_bus & 0x1F)
            }
            4 => {
                // Some bits of the OAM attribute byte (byte 2) do not exist
                let v = self.oam.read(self.oam_addr as usize)
                    & if self.oam_addr % 4 == 2 { 0xE3 } else { 0xFF };
                self.open_bus = v;
                v
            }
            7 => {
                let v = self.read_vram(cartridge);
                self.open_bus = v;
                v
            }
            _ => self.open_bus,
        }
    }
    /// Write a byte to the PPU registers given an address in CPU space.
    ///
    /// Requires the cartridge currently inserted in the NES.
    pub fn write_byte(&mut self, addr: usize, value: u8, cartridge: &mut Cartridge) {
        self.open_bus = value;
        self.open_bus_dots = 0;
        match addr % 8 {
            // PPUCTRL
            0 => {
                self.ctrl = value;
                self.t = (self.t & !0x0C00) | (((value & 0x03) as u32) << 10);
            }
            // PPUMASK
            1 => self.mask = value,
            // PPUSTATUS
            2 => self.w = false,
            // OAMADDR
            3 => self.oam_addr = value,
            // OAMDATA
            4 => self.write_oam(0, value),
            // PPUSCROLL
            5 => {
                if self.w {
                    // Second write (Y)
                    self.t = (self.t & 0x0C1F)
                        | (((value & 0x07) as u32) << 12)
                        | (((value & 0xF8) as u32) << 2);
                } else {
                    // First write (X)
                    self.t = (self.t & !0x001F) | (value >> 3) as u32;
                    self.x = (value & 0x07) as u32;
                }
                self.w = !self.w;
            }
            // PPUADDR
            6 => {
                if self.w {
                    // Second write (LSB)
                    self.t = (self.t & 0xFF00) | value as u32;
                    self.v = self.t;
                } else {
                    // First write (MSB)
                    self.t = (self.t & 0x00FF) | ((value as u32 & 0x3F) << 8);
                }
                self.w = !self.w;
            }
            // PPUDATA
            7 => self.write_vram(value, cartridge),
            _ => unreachable!(),
        }
    }
    /// Write a single byte to OAM at `OAMADDR` plus the offset given.
    ///
    /// Increments `OAMADDR` after writing.
    pub fn write_oam(&mut self, offset: usize, value: u8) {
        self.oam.write(self.oam_addr as usize + offset, value);
        self.oam_addr = self.oam_addr.wrapping_add(1);
    }

    // Refresh scanline_sprites with the sprites that overlap the given scanline.
    // May set the overflow flag.
    // This runs at the end of a scanline, so the fetched sprites show up on the
    // next one (and thus appear at Y + 1).
    fn refresh_scanline_sprites(
        &mut self,
        scanline: u32,
        prerender_scanline: u32,
        cartridge: &mut Cartridge,
        settings: &Settings,
    ) {
        self.scanline_sprites = [None; 256];
        if scanline >= RENDER_SCANLINES && scanline != prerender_scanline {
            return;
        }
        let sprite_height = if self.is_8x16_sprites() { 16 } else { 8 };
        let objs: Vec<usize> = self
            .oam
            .as_slice()
            .chunks(4)
            .enumerate()
            .filter(|(_i, obj)| {
                (obj[0] as u32) <= scanline && obj[0] as u32 + sprite_height > scanline
            })
            .map(|(i, _obj)| i)
            .collect();
        if objs.len() > 8 {
            // The hardware's overflow check is buggy. Instead of scanning the
            // remaining sprites' Y coordinates it walks diagonally down-right
            // from the eighth sprite on the scanline.
            let last_obj: [u8; 4] =
                core::array::from_fn(|i| self.oam.read(4 * objs[7] + i));
            (objs[8]..64).enumerate().for_each(|(i, obj_i)| {
                let x = last_obj[3] as u32 + i as u32;
                let y = last_obj[0] as u32 + i as u32;
                if x < 256
                    && y < 240
                    && self.oam.read(4 * obj_i) == last_obj[0].wrapping_add(i as u8)
                    && self.oam.read(4 * obj_i + 3) == last_obj[3].wrapping_add(i as u8)
                {
                    self.status |= 0x20;
                }
            });
        }
        let limit = if settings.scanline_sprite_limit { 8 } else { 64 };
        objs.iter().take(limit).for_each(|i| {
            let obj: [u8; 4] = core::array::from_fn(|j| self.oam.read(4 * i + j));
            let flip_hor = (obj[2] & 0x40) != 0;
            let flip_vert = (obj[2] & 0x80) != 0;
            let palette_index = 16 + 4 * (obj[2] & 0x03) as usize;
            let y_off = if flip_vert {
                (sprite_height - 1 - (scanline - (obj[0] as u32))) as usize
            } else {
                (scanline - (obj[0] as u32)) as usize
            };

            let (mut tile_low, mut tile_high) = if self.is_8x16_sprites() {
                let tile_addr = 0x1000 * (obj[1] & 0x01) as usize
                    + 16 * (obj[1] & 0xFE) as usize
                    + if y_off > 7 { 16 + y_off % 8 } else { y_off };
                (
                    cartridge.read_ppu(tile_addr) as usize,
                    cartridge.read_ppu(tile_addr + 8) as usize,
                )
            } else {
                let tile_addr = self.spr_pattern_table_addr() + 16 * obj[1] as usize + y_off;
                (
                    cartridge.read_ppu(tile_addr) as usize,
                    cartridge.read_ppu(tile_addr + 8) as usize,
                )
            };
            // Shift tile_high left by one so combining it with tile_low is
            // simply (tile_high & 0x02) + (tile_low & 0x01)
            tile_high <<= 1;
            (0..8).for_each(|j| {
                let pixel_index = (tile_low & 0x01) + (tile_high & 0x02);
                let x = obj[3] as usize + if flip_hor { j } else { 7 - j };
                if pixel_index != 0 && x < 256 {
                    self.scanline_sprites[x].get_or_insert((
                        *i,
                        self.palette_ram[palette_index + pixel_index] as usize,
                    ));
                }
                tile_low >>= 1;
                tile_high >>= 1;
            })
        });
        // Dummy fetches for the sprite slots left over, which MMC3's
        // scanline counter depends on
        (0..(8 - min(objs.len(), 8))).for_each(|_| {
            cartridge.read_ppu(if self.is_8x16_sprites() {
                0x10FE
            } else {
                self.spr_pattern_table_addr() + 0xFF
            });
        });
    }
    /// Advance the PPU a certain number of dots.
    ///
    /// Writes a new pixel of output for every visible dot processed and may
    /// set the VBlank flag. Returns [true] if entering VBlank should raise
    /// an NMI, and [false] otherwise.
    pub fn advance_dots(
        &mut self,
        dots: u32,
        cartridge: &mut Cartridge,
        settings: &Settings,
    ) -> bool {
        let scanlines_per_frame = settings.region.scanlines();
        let prerender_scanline = scanlines_per_frame - 1;
        self.open_bus_dots += dots;
        if self.open_bus_dots >= DOTS_PER_OPEN_BUS_DECAY && self.open_bus != 0 {
            self.open_bus = 0;
        }
        let mut nmi = false;
        (0..dots).for_each(|_| {
            self.status_dots = self.status_dots.saturating_add(1);
            self.dot = if self.dot.0 == DOTS_PER_SCANLINE - 1 {
                if self.dot.1 >= prerender_scanline {
                    (0, 0)
                } else {
                    (0, self.dot.1 + 1)
                }
            } else {
                (self.dot.0 + 1, self.dot.1)
            };
            self.set_output(settings);
            if self.is_background_rendering_enabled() || self.is_sprite_rendering_enabled() {
                if self.dot == (280, prerender_scanline) {
                    // Copy the vertical components from T to V
                    self.v = (self.v & 0x041F) | (self.t & !0x041F);
                }
                if self.dot.1 < RENDER_SCANLINES || self.dot.1 == prerender_scanline {
                    if self.dot.0 == 264 {
                        self.refresh_scanline_sprites(
                            self.dot.1,
                            prerender_scanline,
                            cartridge,
                            settings,
                        );
                    }
                    // Fetch a tile every 8 dots, plus two for the next line
                    if (self.dot.0 < 256 && self.dot.0 % 8 == 7)
                        || [328, 336].contains(&self.dot.0)
                    {
                        self.read_tile_to_buffer(cartridge);
                        self.coarse_x_inc();
                    }
                }
                if self.dot.0 == 256 && !self.can_access_vram() {
                    self.fine_y_inc();
                    // Copy the horizontal nametable bit and coarse X
                    self.v = (self.v & !0x41F) | (self.t & 0x41F);
                }
            }
            if self.dot == (1, 241) {
                self.status |= 0x80;
                // Suppress the NMI if the status byte was read just now
                if self.status_dots > 3 {
                    nmi = true;
                }
            } else if self.dot == (1, prerender_scanline) {
                // Clear VBlank, sprite overflow and sprite 0 hit
                self.status &= 0x1F;
            }
        });
        nmi
    }
    /// Get the output of the PPU as RGB triplets, in a new array.
    ///
    /// This allocates a new buffer on every call. Front-ends that render
    /// every frame should allocate a screen buffer once and use
    /// [Ppu::rgb_output_buf] instead.
    pub fn rgb_output(&self) -> [[[u8; 3]; 256]; 240] {
        core::array::from_fn(|y| core::array::from_fn(|x| self.get_rgb(self.output[y][x])))
    }
    /// Copy the current output of the PPU into the given buffer, as RGB values.
    pub fn rgb_output_buf(&self, buf: &mut [[[u8; 3]; 256]; 240]) {
        buf.iter_mut().enumerate().for_each(|(y, row)| {
            row.iter_mut()
                .enumerate()
                .for_each(|(x, pixel)| *pixel = self.get_rgb(self.output[y][x]))
        });
    }
    /// Get the current output of the PPU as raw palette bytes.
    ///
    /// The NES outputs one byte per pixel naming an entry of its fixed
    /// 64 colour palette. [Ppu::rgb_output] maps these through
    /// [NES_PALETTE](crate::core::NES_PALETTE) automatically.
    pub fn palette_output(&self) -> &[[usize; 256]; 240] {
        &self.output
    }
    /// Transform a palette byte into an RGB value, applying colour emphasis
    fn get_rgb(&self, palette_byte: usize) -> [u8; 3] {
        let v = NES_PALETTE[palette_byte % 64];
        if !(self.is_red_tint_on() || self.is_green_tint_on() || self.is_blue_tint_on()) {
            v
        } else {
            const M: f32 = 0.5;
            let should_dim = [
                self.is_green_tint_on() || self.is_blue_tint_on(),
                self.is_red_tint_on() || self.is_blue_tint_on(),
                self.is_red_tint_on() || self.is_green_tint_on(),
            ];
            core::array::from_fn(|i| {
                (v[i] as f32 * if should_dim[i] { M } else { 1.0 }).floor() as u8
            })
        }
    }
    /// Compute the output at the current dot and store it
    fn set_output(&mut self, settings: &Settings) {
        if self.dot.0 < RENDER_DOTS && self.dot.1 < RENDER_SCANLINES {
            // Initially set the output to the background pixel
            let mut output = if self.is_background_rendering_enabled()
                && !(self.dot.0 < 8 && self.background_left_clipping())
            {
                let (index, palette_index) = match self.tile_buffer.get(self.x as usize) {
                    Some(t) => *t,
                    None => {
                        error!(
                            "Tile buffer is too small (len={:}, fine x={:}, dot={:?})",
                            self.tile_buffer.len(),
                            self.x,
                            self.dot
                        );
                        (0, 0)
                    }
                };
                if index == 0 {
                    None
                } else {
                    Some(self.palette_ram[4 * palette_index + index] as usize)
                }
            } else {
                None
            };
            if self.is_sprite_rendering_enabled()
                && !(self.dot.0 < 8 && self.sprite_left_clipping())
            {
                if let Some((j, p)) = self.scanline_sprites[self.dot.0 as usize] {
                    // Check for a sprite 0 hit
                    if !self.sprite_zero_hit()
                        && j == 0
                        && output.is_some()
                        && self.dot.1 > 0
                        && self.dot.0 < 255
                        && (self.dot.0 > 7
                            || (!self.sprite_left_clipping() && !self.background_left_clipping()))
                    {
                        self.status |= 0x40;
                    }
                    if self.oam.read(4 * j + 2) & 0x20 == 0
                        || output.is_none()
                        || settings.always_sprites_on_top
                    {
                        output = Some(p);
                    }
                }
            }
            self.output[self.dot.1 as usize][self.dot.0 as usize] =
                output.unwrap_or(self.palette_ram[0] as usize);
        }
        // Shift the tile and attribute registers
        if self.dot.0 < 337 {
            self.tile_buffer.pop_front();
            self.tile_buffer.push_back((0, 0));
        }
    }

    fn read_tile_to_buffer(&mut self, cartridge: &mut Cartridge) {
        let nt_addr = cartridge.transform_nametable_addr(0x2000 + (self.v as usize & 0x0FFF));
        let nt_num = self.nametable_ram.read(nt_addr) as usize;
        let palette_byte_addr = cartridge.transform_nametable_addr(
            (0x23C0 + (self.v & 0xC00) + ((self.v >> 4) & 0x38) + ((self.v >> 2) & 0x07)) as usize,
        );
        let palette_byte = self.nametable_ram.read(palette_byte_addr);
        let palette_shift = ((self.v & 0x40) >> 4) + (self.v & 0x02);
        let palette_index = ((palette_byte >> palette_shift) as usize) & 0x03;
        let fine_y = ((self.v & 0x7000) >> 12) as usize;
        let tile_low =
            cartridge.read_ppu(self.bg_pattern_table_addr() + 16 * nt_num + fine_y) as usize;
        // Shifted left by one so it combines with tile_low without a second shift
        let tile_high = (cartridge.read_ppu(self.bg_pattern_table_addr() + 16 * nt_num + 8 + fine_y)
            as usize)
            << 1;
        // Fill the back half of the 16 entry shift register
        self.tile_buffer.truncate(8);
        (0..8).for_each(|i| {
            self.tile_buffer.push_back((
                ((tile_low >> (7 - i)) & 0x01) + ((tile_high >> (7 - i)) & 0x02),
                palette_index,
            ))
        });
    }

    // Coarse X increment on V
    fn coarse_x_inc(&mut self) {
        // Go to the next tile or wrap to the next horizontal nametable
        self.v = if self.v & 0x1F == 0x1F {
            self.v ^ 0x41F
        } else {
            self.v + 1
        };
    }
    // Fine Y increment on V
    fn fine_y_inc(&mut self) {
        self.v = if self.v & 0x7000 == 0x7000 {
            // Coarse Y wraps at 30, not 32
            if self.v & 0x3E0 == 0x3A0 {
                // Switch vertical nametable and reset both coarse and fine Y
                self.v ^ (0x800 + 0x3A0 + 0x7000)
            } else if self.v & 0x3E0 == 0x3E0 {
                self.v ^ (0x7000 | 0x3E0)
            } else {
                // Reset fine Y and increment coarse Y
                self.v - 0x7000 + 0x20
            }
        } else {
            self.v + 0x1000
        };
    }
    /// Whether the PPU is currently in VBlank
    pub fn in_vblank(&self) -> bool {
        self.dot.1 >= RENDER_SCANLINES
    }
    /// Whether it is safe for the CPU to access VRAM, i.e. the PPU is not
    /// currently rendering.
    pub fn can_access_vram(&self) -> bool {
        self.in_vblank()
            || (!self.is_background_rendering_enabled() && !self.is_sprite_rendering_enabled())
    }
    /// Write a single byte to VRAM at the current VRAM address.
    /// Increments the address by 1 or by 32 depending on `PPUCTRL`.
    fn write_vram(&mut self, value: u8, cartridge: &mut Cartridge) {
        let addr = self.v as usize & 0x3FFF;
        if addr < 0x2000 {
            cartridge.write_ppu(addr, value);
        } else if addr < 0x3000 {
            self.nametable_ram
                .write(cartridge.transform_nametable_addr(addr), value);
        } else if addr >= 0x3F00 {
            self.palette_ram[Ppu::palette_index(addr)] = value;
        }
        if self.can_access_vram() {
            self.inc_addr();
        } else {
            // Writing during rendering corrupts V instead
            self.coarse_x_inc();
            self.fine_y_inc();
        }
    }

    /// Read a single byte from VRAM at the current VRAM address
    fn read_vram(&mut self, cartridge: &mut Cartridge) -> u8 {
        let addr = self.v as usize & 0x3FFF;
        if self.can_access_vram() {
            self.inc_addr();
        } else {
            self.coarse_x_inc();
            self.fine_y_inc();
        }
        if addr < 0x2000 {
            // Fill the read buffer and return its old contents
            let b = self.data;
            self.data = cartridge.read_ppu(addr);
            return b;
        }
        if addr < 0x3F00 {
            let b = self.data;
            self.data = self
                .nametable_ram
                .read(cartridge.transform_nametable_addr(addr));
            return b;
        }
        // Palette RAM reads return directly, but still update the buffer
        // with the nametable byte underneath
        let b = (self.open_bus & 0xC0) | (self.palette_ram[Ppu::palette_index(addr)] & 0x3F);
        self.data = self
            .nametable_ram
            .read(cartridge.transform_nametable_addr(addr));
        b
    }

    fn palette_index(addr: usize) -> usize {
        // The backdrop colours are shared between background and sprites
        if addr % 4 == 0 {
            addr % 0x10
        } else {
            addr % 0x20
        }
    }

    fn inc_addr(&mut self) {
        self.v = (self.v + if self.ctrl & 0x04 == 0 { 1 } else { 32 }) & 0x3FFF;
    }
    /// Returns [true] if the PPU is in 8x16 sprite mode
    pub fn is_8x16_sprites(&self) -> bool {
        (self.ctrl & 0x20) != 0
    }
    /// Returns [true] if sprite rendering is enabled
    pub fn is_sprite_rendering_enabled(&self) -> bool {
        (self.mask & 0x10) != 0
    }
    /// Returns [true] if background rendering is enabled
    pub fn is_background_rendering_enabled(&self) -> bool {
        (self.mask & 0x08) != 0
    }
    /// Returns [true] if rendering sprites in the 8 leftmost pixels is disabled
    pub fn sprite_left_clipping(&self) -> bool {
        (self.mask & 0x04) == 0
    }
    /// Returns [true] if rendering the background in the 8 leftmost pixels is disabled
    pub fn background_left_clipping(&self) -> bool {
        (self.mask & 0x02) == 0
    }
    /// Returns [true] if greyscale mode is on
    pub fn is_greyscale_mode_on(&self) -> bool {
        (self.mask & 0x01) != 0
    }
    /// The address in PPU memory space of the sprite pattern table
    pub fn spr_pattern_table_addr(&self) -> usize {
        if self.ctrl & 0x08 != 0 {
            0x1000
        } else {
            0x0000
        }
    }
    /// The address in PPU memory space of the background pattern table
    pub fn bg_pattern_table_addr(&self) -> usize {
        if self.ctrl & 0x10 != 0 {
            0x1000
        } else {
            0x0000
        }
    }
    pub fn is_red_tint_on(&self) -> bool {
        (self.mask & 0x20) != 0
    }
    pub fn is_blue_tint_on(&self) -> bool {
        (self.mask & 0x40) != 0
    }
    pub fn is_green_tint_on(&self) -> bool {
        (self.mask & 0x80) != 0
    }
    /// Returns [true] if the NMI is enabled
    pub fn get_nmi_enabled(&self) -> bool {
        self.ctrl & 0x80 != 0
    }
    /// Returns [true] if the sprite 0 hit flag is set
    pub fn sprite_zero_hit(&self) -> bool {
        (self.status & 0x40) != 0
    }
    /// Returns [true] if the sprite overflow flag is set
    pub fn sprite_overflow(&self) -> bool {
        (self.status & 0x20) != 0
    }
    /// The index of the scanline currently being drawn
    pub fn scanline(&self) -> u32 {
        self.dot.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank() -> (Ppu, Cartridge) {
        (Ppu::new(), Cartridge::blank())
    }

    #[test]
    fn test_status_read_clears_vblank() {
        let (mut ppu, mut cartridge) = blank();
        ppu.status = 0x80;
        assert_eq!(ppu.read_byte(0x2002, &mut cartridge) & 0x80, 0x80);
        assert_eq!(ppu.read_byte(0x2002, &mut cartridge) & 0x80, 0x00);
    }

    #[test]
    fn test_vblank_timing() {
        let (mut ppu, mut cartridge) = blank();
        let settings = Settings::default();
        // VBlank starts at dot 1 of scanline 241
        ppu.advance_dots(241 * 341, &mut cartridge, &settings);
        assert_eq!(ppu.status & 0x80, 0);
        ppu.advance_dots(2, &mut cartridge, &settings);
        assert_eq!(ppu.status & 0x80, 0x80);
        // And clears on the prerender scanline
        ppu.advance_dots(20 * 341, &mut cartridge, &settings);
        assert_eq!(ppu.status & 0x80, 0);
    }

    #[test]
    fn test_nmi_on_vblank() {
        let (mut ppu, mut cartridge) = blank();
        let settings = Settings::default();
        ppu.write_byte(0x2000, 0x80, &mut cartridge);
        assert!(ppu.get_nmi_enabled());
        let nmi = ppu.advance_dots(242 * 341, &mut cartridge, &settings);
        assert!(nmi);
    }

    #[test]
    fn test_pal_frame_length() {
        let (mut ppu, mut cartridge) = blank();
        let settings = Settings {
            region: crate::core::Region::Pal,
            ..Settings::default()
        };
        // A PAL frame is 312 scanlines, so after 262 we are still mid frame
        ppu.advance_dots(262 * 341, &mut cartridge, &settings);
        assert_eq!(ppu.scanline(), 262);
        ppu.advance_dots(50 * 341, &mut cartridge, &settings);
        assert_eq!(ppu.scanline(), 0);
    }

    #[test]
    fn test_ppu_addr_write() {
        let (mut ppu, mut cartridge) = blank();
        ppu.write_byte(0x2006, 0x21, &mut cartridge);
        ppu.write_byte(0x2006, 0x08, &mut cartridge);
        ppu.write_byte(0x2007, 0xAB, &mut cartridge);
        assert_eq!(ppu.nametable_ram.read(0x108), 0xAB);
        // The address increments after the write
        ppu.write_byte(0x2007, 0xCD, &mut cartridge);
        assert_eq!(ppu.nametable_ram.read(0x109), 0xCD);
    }

    #[test]
    fn test_ppu_data_read_buffer() {
        let (mut ppu, mut cartridge) = blank();
        ppu.write_byte(0x2006, 0x21, &mut cartridge);
        ppu.write_byte(0x2006, 0x08, &mut cartridge);
        ppu.write_byte(0x2007, 0xAB, &mut cartridge);
        ppu.write_byte(0x2006, 0x21, &mut cartridge);
        ppu.write_byte(0x2006, 0x08, &mut cartridge);
        // The first read returns the stale buffer contents
        ppu.read_byte(0x2007, &mut cartridge);
        assert_eq!(ppu.read_byte(0x2007, &mut cartridge), 0xAB);
    }

    #[test]
    fn test_palette_mirroring() {
        let (mut ppu, mut cartridge) = blank();
        // $3F10 mirrors $3F00
        ppu.write_byte(0x2006, 0x3F, &mut cartridge);
        ppu.write_byte(0x2006, 0x10, &mut cartridge);
        ppu.write_byte(0x2007, 0x21, &mut cartridge);
        assert_eq!(ppu.palette_ram[0], 0x21);
    }

    #[test]
    fn test_oam_writes() {
        let (mut ppu, mut cartridge) = blank();
        ppu.write_byte(0x2003, 0x10, &mut cartridge);
        ppu.write_byte(0x2004, 0x42, &mut cartridge);
        assert_eq!(ppu.oam.read(0x10), 0x42);
        // OAMADDR increments on data writes
        ppu.write_byte(0x2004, 0x43, &mut cartridge);
        assert_eq!(ppu.oam.read(0x11), 0x43);
    }
}
