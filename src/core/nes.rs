use crate::core::{
    apu::Apu,
    opcodes::{format_opcode, unofficial as un, *},
    Cartridge, Controller, Cpu, Memory, Ppu, Settings, IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR,
};
use log::*;

/// CPU cycles an OAM DMA transfer takes
const CPU_CYCLES_PER_OAM_DMA: u32 = 513;

/// The NES itself.
///
/// Owns the CPU, PPU, APU, work RAM and the inserted [Cartridge], and
/// advances them all in lockstep. All communication between the
/// components flows through here, since this is the console's bus.
#[derive(Debug)]
pub struct Nes {
    /// The CPU of the NES
    pub cpu: Cpu,
    /// The PPU of the NES
    pub ppu: Ppu,
    /// The APU of the NES
    pub apu: Apu,
    /// The console's 2 KiB of work RAM
    pub ram: Memory,
    /// The cartridge currently inserted in the NES
    pub cartridge: Cartridge,
    // The actual state of the two controllers
    controllers: [Controller; 2],
    // The controller state latched by the last write to $4016
    cached_controllers: [Controller; 2],
    // How many bits of each controller's shift register have been read
    controller_bits: [usize; 2],
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    /// Create a new NES with no cartridge inserted.
    ///
    /// The CPU will read zeroes everywhere, which decode as BRK. Useful
    /// for poking at the CPU directly.
    pub fn new() -> Nes {
        let mut ram = Memory::new(0x800);
        // RAM comes up in a mixed state on real hardware
        ram.fill_power_up_pattern(&mut rand::thread_rng());
        Nes {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            ram,
            cartridge: Cartridge::blank(),
            controllers: [Controller::new(); 2],
            cached_controllers: [Controller::new(); 2],
            controller_bits: [0; 2],
        }
    }
    /// Create a new NES with the given cartridge inserted, with the CPU
    /// ready to execute from the cartridge's reset vector.
    pub fn with_cartridge(cartridge: Cartridge) -> Nes {
        let mut nes = Nes::new();
        nes.cartridge = cartridge;
        nes.reset();
        nes
    }
    /// Insert a different cartridge and reset the console.
    pub fn set_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = cartridge;
        self.reset();
    }
    /// Press the reset button.
    ///
    /// Moves the PC to the reset vector. RAM and the PPU's memory keep
    /// their contents, as on hardware.
    pub fn reset(&mut self) {
        self.cpu.s_r.i = true;
        self.cpu.s_p = 0xFD;
        self.cpu.p_c = self.read_u16(RESET_VECTOR);
        self.apu.reset();
        debug!("Reset, PC is {:#06X}", self.cpu.p_c);
    }
    /// Read a byte from the CPU's memory space.
    pub fn read_byte(&mut self, addr: usize) -> u8 {
        let addr = addr % 0x10000;
        match addr {
            0x0000..0x2000 => self.ram.read(addr),
            0x2000..0x4000 => self.ppu.read_byte(addr, &mut self.cartridge),
            0x4016 => self.read_controller_bit(0),
            0x4017 => self.read_controller_bit(1),
            0x4000..0x4020 => self.apu.read_byte(addr),
            _ => self.cartridge.read_cpu(addr),
        }
    }
    /// Write a byte to the CPU's memory space.
    pub fn write_byte(&mut self, addr: usize, value: u8) {
        let addr = addr % 0x10000;
        match addr {
            0x0000..0x2000 => self.ram.write(addr, value),
            0x2000..0x4000 => self.ppu.write_byte(addr, value, &mut self.cartridge),
            0x4014 => self.ppu.oam_dma = Some(value),
            0x4016 => {
                // Latch the controllers and rewind their shift registers
                self.cached_controllers = self.controllers;
                self.controller_bits = [0; 2];
            }
            0x4000..0x4020 => self.apu.write_byte(addr, value),
            _ => self.cartridge.write_cpu(addr, value),
        }
    }
    fn read_u16(&mut self, addr: usize) -> u16 {
        self.read_byte(addr) as u16 + ((self.read_byte(addr + 1) as u16) << 8)
    }
    /// Set the state of one of the two controllers.
    ///
    /// The state is not visible to the running program until it strobes
    /// the controllers through $4016.
    pub fn set_controller_state(&mut self, index: usize, state: Controller) {
        self.controllers[index] = state;
    }
    /// Get the state of one of the two controllers.
    pub fn controller(&self, index: usize) -> Controller {
        self.controllers[index]
    }
    fn read_controller_bit(&mut self, index: usize) -> u8 {
        let i = self.controller_bits[index];
        self.controller_bits[index] += 1;
        // The shift register reports 1 once exhausted
        if i < 8 {
            (self.cached_controllers[index].to_bits() >> i) & 0x01
        } else {
            0x01
        }
    }

    fn push(&mut self, value: u8) {
        self.ram.write(0x100 + self.cpu.s_p as usize, value);
        self.cpu.s_p = self.cpu.s_p.wrapping_sub(1);
    }
    fn push_u16(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }
    fn pull(&mut self) -> u8 {
        self.cpu.s_p = self.cpu.s_p.wrapping_add(1);
        self.ram.read(0x100 + self.cpu.s_p as usize)
    }
    fn pull_u16(&mut self) -> u16 {
        self.pull() as u16 + ((self.pull() as u16) << 8)
    }
    // Push the PC and status and jump through the given vector
    fn interrupt_to_addr(&mut self, vector: usize) {
        self.push_u16(self.cpu.p_c);
        let status = self.cpu.s_r.to_byte();
        self.push(status);
        self.cpu.s_r.i = true;
        self.cpu.p_c = self.read_u16(vector);
    }
    fn on_nmi(&mut self) {
        self.interrupt_to_addr(NMI_VECTOR);
    }
    /// Raise a non-maskable interrupt, as a front-end debugging aid.
    pub fn request_nmi(&mut self) {
        self.on_nmi();
    }
    /// Raise an interrupt request. Honours the interrupt disable flag.
    pub fn request_irq(&mut self) {
        if !self.cpu.s_r.i {
            self.interrupt_to_addr(IRQ_VECTOR);
        }
    }

    // Addressing helpers. The dummy reads of the wrong address on page
    // crosses are real bus accesses on hardware, and some hardware
    // (e.g. the PPU's status register) reacts to them.
    fn abs_addr(&self, operands: &[u8]) -> usize {
        operands[0] as usize + ((operands[1] as usize) << 8)
    }
    fn zp_x_addr(&self, operands: &[u8]) -> usize {
        operands[0].wrapping_add(self.cpu.x) as usize
    }
    fn zp_y_addr(&self, operands: &[u8]) -> usize {
        operands[0].wrapping_add(self.cpu.y) as usize
    }
    fn ind_x_addr(&mut self, operands: &[u8]) -> usize {
        let ptr = operands[0].wrapping_add(self.cpu.x);
        self.read_byte(ptr as usize) as usize
            + ((self.read_byte(ptr.wrapping_add(1) as usize) as usize) << 8)
    }
    fn ind_y_base(&mut self, operands: &[u8]) -> usize {
        self.read_byte(operands[0] as usize) as usize
            + ((self.read_byte(operands[0].wrapping_add(1) as usize) as usize) << 8)
    }
    // Read from base + index, with a dummy read of the un-carried
    // address when the index crosses a page. Returns the value and the
    // extra cycle the carry costs.
    fn read_indexed(&mut self, base: usize, index: u8) -> (u8, i64) {
        let addr = (base + index as usize) & 0xFFFF;
        let crossed = (base & 0xFF) + index as usize > 0xFF;
        if crossed {
            self.read_byte((base & 0xFF00) | (addr & 0xFF));
        }
        (self.read_byte(addr), crossed as i64)
    }
    // Write to base + index. Stores always pay for the carry, and always
    // perform the dummy read.
    fn write_indexed(&mut self, base: usize, index: u8, value: u8) {
        let addr = (base + index as usize) & 0xFFFF;
        self.read_byte((base & 0xFF00) | (addr & 0xFF));
        self.write_byte(addr, value);
    }

    /// Execute one instruction at the PC.
    /// Returns the number of CPU cycles it took.
    pub fn step(&mut self) -> Result<i64, String> {
        let pc = self.cpu.p_c as usize;
        let opcode = self.read_byte(pc);
        let operands = [self.read_byte(pc + 1), self.read_byte(pc + 2)];
        let (bytes, cycles) = self.decode_and_execute(opcode, &operands)?;
        self.cpu.p_c = self.cpu.p_c.wrapping_add(bytes);
        Ok(cycles)
    }

    // Decode and execute a single instruction.
    // Returns (bytes to advance the PC by, cycles taken). Instructions
    // that move the PC themselves return 0 bytes.
    #[allow(clippy::match_overlapping_arm)]
    fn decode_and_execute(&mut self, opcode: u8, operands: &[u8]) -> Result<(u16, i64), String> {
        // An operation on a value read from memory
        macro_rules! read_op {
            ($f: ident, imm) => {{
                self.cpu.$f(operands[0]);
                (2, 2)
            }};
            ($f: ident, zp) => {{
                let v = self.read_byte(operands[0] as usize);
                self.cpu.$f(v);
                (2, 3)
            }};
            ($f: ident, zp_x) => {{
                let a = self.zp_x_addr(operands);
                let v = self.read_byte(a);
                self.cpu.$f(v);
                (2, 4)
            }};
            ($f: ident, zp_y) => {{
                let a = self.zp_y_addr(operands);
                let v = self.read_byte(a);
                self.cpu.$f(v);
                (2, 4)
            }};
            ($f: ident, abs) => {{
                let a = self.abs_addr(operands);
                let v = self.read_byte(a);
                self.cpu.$f(v);
                (3, 4)
            }};
            ($f: ident, abs_x) => {{
                let base = self.abs_addr(operands);
                let (v, extra) = self.read_indexed(base, self.cpu.x);
                self.cpu.$f(v);
                (3, 4 + extra)
            }};
            ($f: ident, abs_y) => {{
                let base = self.abs_addr(operands);
                let (v, extra) = self.read_indexed(base, self.cpu.y);
                self.cpu.$f(v);
                (3, 4 + extra)
            }};
            ($f: ident, ind_x) => {{
                let a = self.ind_x_addr(operands);
                let v = self.read_byte(a);
                self.cpu.$f(v);
                (2, 6)
            }};
            ($f: ident, ind_y) => {{
                let base = self.ind_y_base(operands);
                let (v, extra) = self.read_indexed(base, self.cpu.y);
                self.cpu.$f(v);
                (2, 5 + extra)
            }};
        }
        // A read-modify-write operation on memory
        macro_rules! rmw_op {
            ($f: ident, $addr: expr, $bytes: expr, $cycles: expr) => {{
                let a = $addr & 0xFFFF;
                let v = self.read_byte(a);
                let r = self.cpu.$f(v);
                self.write_byte(a, r);
                ($bytes, $cycles)
            }};
            ($f: ident, zp) => {
                rmw_op!($f, operands[0] as usize, 2, 5)
            };
            ($f: ident, zp_x) => {
                rmw_op!($f, self.zp_x_addr(operands), 2, 6)
            };
            ($f: ident, abs) => {
                rmw_op!($f, self.abs_addr(operands), 3, 6)
            };
            ($f: ident, abs_x) => {
                rmw_op!($f, self.abs_addr(operands) + self.cpu.x as usize, 3, 7)
            };
            ($f: ident, abs_y) => {
                rmw_op!($f, self.abs_addr(operands) + self.cpu.y as usize, 3, 7)
            };
            ($f: ident, ind_x) => {
                rmw_op!($f, self.ind_x_addr(operands), 2, 8)
            };
            ($f: ident, ind_y) => {{
                let base = self.ind_y_base(operands);
                rmw_op!($f, base + self.cpu.y as usize, 2, 8)
            }};
        }
        // A store of some register (or combination) to memory
        macro_rules! store_op {
            ($value: expr, zp) => {{
                let v = $value;
                self.write_byte(operands[0] as usize, v);
                (2, 3)
            }};
            ($value: expr, zp_x) => {{
                let v = $value;
                let a = self.zp_x_addr(operands);
                self.write_byte(a, v);
                (2, 4)
            }};
            ($value: expr, zp_y) => {{
                let v = $value;
                let a = self.zp_y_addr(operands);
                self.write_byte(a, v);
                (2, 4)
            }};
            ($value: expr, abs) => {{
                let v = $value;
                let a = self.abs_addr(operands);
                self.write_byte(a, v);
                (3, 4)
            }};
            ($value: expr, abs_x) => {{
                let v = $value;
                let base = self.abs_addr(operands);
                self.write_indexed(base, self.cpu.x, v);
                (3, 5)
            }};
            ($value: expr, abs_y) => {{
                let v = $value;
                let base = self.abs_addr(operands);
                self.write_indexed(base, self.cpu.y, v);
                (3, 5)
            }};
            ($value: expr, ind_x) => {{
                let v = $value;
                let a = self.ind_x_addr(operands);
                self.write_byte(a, v);
                (2, 6)
            }};
            ($value: expr, ind_y) => {{
                let v = $value;
                let base = self.ind_y_base(operands);
                self.write_indexed(base, self.cpu.y, v);
                (2, 6)
            }};
        }
        // A conditional branch on some flag
        macro_rules! branch_op {
            ($flag: ident, $set: expr) => {{
                let flag = self.cpu.s_r.$flag;
                (2, self.cpu.branch_if(flag == $set, operands[0]))
            }};
        }
        // Set or clear a flag
        macro_rules! flag_op {
            ($flag: ident, $value: expr) => {{
                self.cpu.s_r.$flag = $value;
                (1, 2)
            }};
        }
        // A register to register transfer through a load (sets Z and N)
        macro_rules! transfer_op {
            ($from: ident, $load: ident) => {{
                let v = self.cpu.$from;
                self.cpu.$load(v);
                (1, 2)
            }};
        }
        let r = match opcode {
            LDA_I => read_op!(lda, imm),
            LDA_ZP => read_op!(lda, zp),
            LDA_ZP_X => read_op!(lda, zp_x),
            LDA_ABS => read_op!(lda, abs),
            LDA_ABS_X => read_op!(lda, abs_x),
            LDA_ABS_Y => read_op!(lda, abs_y),
            LDA_IND_X => read_op!(lda, ind_x),
            LDA_IND_Y => read_op!(lda, ind_y),
            LDX_I => read_op!(ldx, imm),
            LDX_ZP => read_op!(ldx, zp),
            LDX_ZP_Y => read_op!(ldx, zp_y),
            LDX_ABS => read_op!(ldx, abs),
            LDX_ABS_Y => read_op!(ldx, abs_y),
            LDY_I => read_op!(ldy, imm),
            LDY_ZP => read_op!(ldy, zp),
            LDY_ZP_X => read_op!(ldy, zp_x),
            LDY_ABS => read_op!(ldy, abs),
            LDY_ABS_X => read_op!(ldy, abs_x),
            ADC_I => read_op!(adc, imm),
            ADC_ZP => read_op!(adc, zp),
            ADC_ZP_X => read_op!(adc, zp_x),
            ADC_ABS => read_op!(adc, abs),
            ADC_ABS_X => read_op!(adc, abs_x),
            ADC_ABS_Y => read_op!(adc, abs_y),
            ADC_IND_X => read_op!(adc, ind_x),
            ADC_IND_Y => read_op!(adc, ind_y),
            SBC_I | un::SBC => read_op!(sbc, imm),
            SBC_ZP => read_op!(sbc, zp),
            SBC_ZP_X => read_op!(sbc, zp_x),
            SBC_ABS => read_op!(sbc, abs),
            SBC_ABS_X => read_op!(sbc, abs_x),
            SBC_ABS_Y => read_op!(sbc, abs_y),
            SBC_IND_X => read_op!(sbc, ind_x),
            SBC_IND_Y => read_op!(sbc, ind_y),
            AND_I => read_op!(and, imm),
            AND_ZP => read_op!(and, zp),
            AND_ZP_X => read_op!(and, zp_x),
            AND_ABS => read_op!(and, abs),
            AND_ABS_X => read_op!(and, abs_x),
            AND_ABS_Y => read_op!(and, abs_y),
            AND_IND_X => read_op!(and, ind_x),
            AND_IND_Y => read_op!(and, ind_y),
            ORA_I => read_op!(ora, imm),
            ORA_ZP => read_op!(ora, zp),
            ORA_ZP_X => read_op!(ora, zp_x),
            ORA_ABS => read_op!(ora, abs),
            ORA_ABS_X => read_op!(ora, abs_x),
            ORA_ABS_Y => read_op!(ora, abs_y),
            ORA_IND_X => read_op!(ora, ind_x),
            ORA_IND_Y => read_op!(ora, ind_y),
            EOR_I => read_op!(eor, imm),
            EOR_ZP => read_op!(eor, zp),
            EOR_ZP_X => read_op!(eor, zp_x),
            EOR_ABS => read_op!(eor, abs),
            EOR_ABS_X => read_op!(eor, abs_x),
            EOR_ABS_Y => read_op!(eor, abs_y),
            EOR_IND_X => read_op!(eor, ind_x),
            EOR_IND_Y => read_op!(eor, ind_y),
            CMP_I => read_op!(cmp, imm),
            CMP_ZP => read_op!(cmp, zp),
            CMP_ZP_X => read_op!(cmp, zp_x),
            CMP_ABS => read_op!(cmp, abs),
            CMP_ABS_X => read_op!(cmp, abs_x),
            CMP_ABS_Y => read_op!(cmp, abs_y),
            CMP_IND_X => read_op!(cmp, ind_x),
            CMP_IND_Y => read_op!(cmp, ind_y),
            CPX_I => read_op!(cpx, imm),
            CPX_ZP => read_op!(cpx, zp),
            CPX_ABS => read_op!(cpx, abs),
            CPY_I => read_op!(cpy, imm),
            CPY_ZP => read_op!(cpy, zp),
            CPY_ABS => read_op!(cpy, abs),
            BIT_ZP => read_op!(bit, zp),
            BIT_ABS => read_op!(bit, abs),
            ASL_A => {
                let v = self.cpu.a;
                self.cpu.a = self.cpu.asl(v);
                (1, 2)
            }
            ASL_ZP => rmw_op!(asl, zp),
            ASL_ZP_X => rmw_op!(asl, zp_x),
            ASL_ABS => rmw_op!(asl, abs),
            ASL_ABS_X => rmw_op!(asl, abs_x),
            LSR_A => {
                let v = self.cpu.a;
                self.cpu.a = self.cpu.lsr(v);
                (1, 2)
            }
            LSR_ZP => rmw_op!(lsr, zp),
            LSR_ZP_X => rmw_op!(lsr, zp_x),
            LSR_ABS => rmw_op!(lsr, abs),
            LSR_ABS_X => rmw_op!(lsr, abs_x),
            ROL_A => {
                let v = self.cpu.a;
                self.cpu.a = self.cpu.rol(v);
                (1, 2)
            }
            ROL_ZP => rmw_op!(rol, zp),
            ROL_ZP_X => rmw_op!(rol, zp_x),
            ROL_ABS => rmw_op!(rol, abs),
            ROL_ABS_X => rmw_op!(rol, abs_x),
            ROR_A => {
                let v = self.cpu.a;
                self.cpu.a = self.cpu.ror(v);
                (1, 2)
            }
            ROR_ZP => rmw_op!(ror, zp),
            ROR_ZP_X => rmw_op!(ror, zp_x),
            ROR_ABS => rmw_op!(ror, abs),
            ROR_ABS_X => rmw_op!(ror, abs_x),
            INC_ZP => rmw_op!(inc, zp),
            INC_ZP_X => rmw_op!(inc, zp_x),
            INC_ABS => rmw_op!(inc, abs),
            INC_ABS_X => rmw_op!(inc, abs_x),
            DEC_ZP => rmw_op!(dec, zp),
            DEC_ZP_X => rmw_op!(dec, zp_x),
            DEC_ABS => rmw_op!(dec, abs),
            DEC_ABS_X => rmw_op!(dec, abs_x),
            INX => {
                let v = self.cpu.x.wrapping_add(1);
                self.cpu.ldx(v);
                (1, 2)
            }
            INY => {
                let v = self.cpu.y.wrapping_add(1);
                self.cpu.ldy(v);
                (1, 2)
            }
            DEX => {
                let v = self.cpu.x.wrapping_sub(1);
                self.cpu.ldx(v);
                (1, 2)
            }
            DEY => {
                let v = self.cpu.y.wrapping_sub(1);
                self.cpu.ldy(v);
                (1, 2)
            }
            STA_ZP => store_op!(self.cpu.a, zp),
            STA_ZP_X => store_op!(self.cpu.a, zp_x),
            STA_ABS => store_op!(self.cpu.a, abs),
            STA_ABS_X => store_op!(self.cpu.a, abs_x),
            STA_ABS_Y => store_op!(self.cpu.a, abs_y),
            STA_IND_X => store_op!(self.cpu.a, ind_x),
            STA_IND_Y => store_op!(self.cpu.a, ind_y),
            STX_ZP => store_op!(self.cpu.x, zp),
            STX_ZP_Y => store_op!(self.cpu.x, zp_y),
            STX_ABS => store_op!(self.cpu.x, abs),
            STY_ZP => store_op!(self.cpu.y, zp),
            STY_ZP_X => store_op!(self.cpu.y, zp_x),
            STY_ABS => store_op!(self.cpu.y, abs),
            TAX => transfer_op!(a, ldx),
            TAY => transfer_op!(a, ldy),
            TXA => transfer_op!(x, lda),
            TYA => transfer_op!(y, lda),
            TSX => transfer_op!(s_p, ldx),
            TXS => {
                // The only transfer that does not set flags
                self.cpu.s_p = self.cpu.x;
                (1, 2)
            }
            BCC => branch_op!(c, false),
            BCS => branch_op!(c, true),
            BNE => branch_op!(z, false),
            BEQ => branch_op!(z, true),
            BPL => branch_op!(n, false),
            BMI => branch_op!(n, true),
            BVC => branch_op!(v, false),
            BVS => branch_op!(v, true),
            CLC => flag_op!(c, false),
            SEC => flag_op!(c, true),
            CLD => flag_op!(d, false),
            SED => flag_op!(d, true),
            CLI => flag_op!(i, false),
            SEI => flag_op!(i, true),
            CLV => flag_op!(v, false),
            PHA => {
                let v = self.cpu.a;
                self.push(v);
                (1, 3)
            }
            PHP => {
                // PHP pushes with the break flag set
                let v = self.cpu.s_r.to_byte() | 0x10;
                self.push(v);
                (1, 3)
            }
            PLA => {
                let v = self.pull();
                self.cpu.lda(v);
                (1, 4)
            }
            PLP => {
                let v = self.pull();
                self.cpu.s_r.from_byte(v);
                (1, 4)
            }
            JMP_ABS => {
                self.cpu.p_c = self.abs_addr(operands) as u16;
                (0, 3)
            }
            JMP_IND => {
                let ptr = self.abs_addr(operands);
                // The pointer's high byte read does not carry into the
                // next page
                let low = self.read_byte(ptr) as u16;
                let high = self.read_byte((ptr & 0xFF00) | ((ptr + 1) & 0xFF)) as u16;
                self.cpu.p_c = low + (high << 8);
                (0, 5)
            }
            JSR => {
                // The return address pushed is the last byte of this
                // instruction, RTS adds the 1
                let ret = self.cpu.p_c.wrapping_add(2);
                self.push_u16(ret);
                self.cpu.p_c = self.abs_addr(operands) as u16;
                (0, 6)
            }
            RTS => {
                self.cpu.p_c = self.pull_u16().wrapping_add(1);
                (0, 6)
            }
            RTI => {
                let v = self.pull();
                self.cpu.s_r.from_byte(v);
                self.cpu.p_c = self.pull_u16();
                (0, 6)
            }
            BRK => {
                // BRK pushes the address after its padding byte, with
                // the break flag set in the pushed status
                let ret = self.cpu.p_c.wrapping_add(2);
                self.push_u16(ret);
                let status = self.cpu.s_r.to_byte() | 0x10;
                self.push(status);
                self.cpu.s_r.i = true;
                self.cpu.p_c = self.read_u16(IRQ_VECTOR);
                (0, 7)
            }
            NOP => (1, 2),
            // Undocumented opcodes
            un::ALR_I => {
                self.cpu.and(operands[0]);
                let v = self.cpu.a;
                self.cpu.a = self.cpu.lsr(v);
                (2, 2)
            }
            un::ARR_I => {
                self.cpu.and(operands[0]);
                let carry_in = if self.cpu.s_r.c { 0x80 } else { 0 };
                let r = (self.cpu.a >> 1) | carry_in;
                self.cpu.a = r;
                self.cpu.s_r.z = r == 0;
                self.cpu.s_r.n = r & 0x80 != 0;
                // C and V come from the result's bits 6 and 5
                self.cpu.s_r.c = r & 0x40 != 0;
                self.cpu.s_r.v = ((r >> 6) ^ (r >> 5)) & 0x01 != 0;
                (2, 2)
            }
            un::AXS_I => {
                let t = self.cpu.a & self.cpu.x;
                self.cpu.s_r.c = t >= operands[0];
                self.cpu.ldx(t.wrapping_sub(operands[0]));
                (2, 2)
            }
            un::LAX_ZP => read_op!(lax, zp),
            un::LAX_ZP_Y => read_op!(lax, zp_y),
            un::LAX_ABS => read_op!(lax, abs),
            un::LAX_ABS_Y => read_op!(lax, abs_y),
            un::LAX_IND_X => read_op!(lax, ind_x),
            un::LAX_IND_Y => read_op!(lax, ind_y),
            un::SAX_ZP => store_op!(self.cpu.a & self.cpu.x, zp),
            un::SAX_ZP_Y => store_op!(self.cpu.a & self.cpu.x, zp_y),
            un::SAX_ABS => store_op!(self.cpu.a & self.cpu.x, abs),
            un::SAX_IND_X => store_op!(self.cpu.a & self.cpu.x, ind_x),
            un::DCP_ZP => rmw_op!(dcp, zp),
            un::DCP_ZP_X => rmw_op!(dcp, zp_x),
            un::DCP_ABS => rmw_op!(dcp, abs),
            un::DCP_ABS_X => rmw_op!(dcp, abs_x),
            un::DCP_ABS_Y => rmw_op!(dcp, abs_y),
            un::DCP_IND_X => rmw_op!(dcp, ind_x),
            un::DCP_IND_Y => rmw_op!(dcp, ind_y),
            un::ISC_ZP => rmw_op!(isc, zp),
            un::ISC_ZP_X => rmw_op!(isc, zp_x),
            un::ISC_ABS => rmw_op!(isc, abs),
            un::ISC_ABS_X => rmw_op!(isc, abs_x),
            un::ISC_ABS_Y => rmw_op!(isc, abs_y),
            un::ISC_IND_X => rmw_op!(isc, ind_x),
            un::ISC_IND_Y => rmw_op!(isc, ind_y),
            un::RLA_ZP => rmw_op!(rla, zp),
            un::RLA_ZP_X => rmw_op!(rla, zp_x),
            un::RLA_ABS => rmw_op!(rla, abs),
            un::RLA_ABS_X => rmw_op!(rla, abs_x),
            un::RLA_ABS_Y => rmw_op!(rla, abs_y),
            un::RLA_IND_X => rmw_op!(rla, ind_x),
            un::RLA_IND_Y => rmw_op!(rla, ind_y),
            un::RRA_ZP => rmw_op!(rra, zp),
            un::RRA_ZP_X => rmw_op!(rra, zp_x),
            un::RRA_ABS => rmw_op!(rra, abs),
            un::RRA_ABS_X => rmw_op!(rra, abs_x),
            un::RRA_ABS_Y => rmw_op!(rra, abs_y),
            un::RRA_IND_X => rmw_op!(rra, ind_x),
            un::RRA_IND_Y => rmw_op!(rra, ind_y),
            un::SLO_ZP => rmw_op!(slo, zp),
            un::SLO_ZP_X => rmw_op!(slo, zp_x),
            un::SLO_ABS => rmw_op!(slo, abs),
            un::SLO_ABS_X => rmw_op!(slo, abs_x),
            un::SLO_ABS_Y => rmw_op!(slo, abs_y),
            un::SLO_IND_X => rmw_op!(slo, ind_x),
            un::SLO_IND_Y => rmw_op!(slo, ind_y),
            un::SRE_ZP => rmw_op!(sre, zp),
            un::SRE_ZP_X => rmw_op!(sre, zp_x),
            un::SRE_ABS => rmw_op!(sre, abs),
            un::SRE_ABS_X => rmw_op!(sre, abs_x),
            un::SRE_ABS_Y => rmw_op!(sre, abs_y),
            un::SRE_IND_X => rmw_op!(sre, ind_x),
            un::SRE_IND_Y => rmw_op!(sre, ind_y),
            o if un::ANC_I.contains(&o) => {
                self.cpu.and(operands[0]);
                self.cpu.s_r.c = self.cpu.s_r.n;
                (2, 2)
            }
            o if un::NOPS.contains(&o) => (1, 2),
            o if un::SKBS.contains(&o) => (2, 2),
            o if un::IGN_ZP.contains(&o) => {
                self.read_byte(operands[0] as usize);
                (2, 3)
            }
            o if un::IGN_ZP_X.contains(&o) => {
                let a = self.zp_x_addr(operands);
                self.read_byte(a);
                (2, 4)
            }
            un::IGN_ABS => {
                let a = self.abs_addr(operands);
                self.read_byte(a);
                (3, 4)
            }
            o if un::IGN_ABS_X.contains(&o) => {
                let base = self.abs_addr(operands);
                let (_, extra) = self.read_indexed(base, self.cpu.x);
                (3, 4 + extra)
            }
            _ => {
                // Everything left jams the CPU or has no stable behaviour
                return Err(format!(
                    "CPU halted executing {} at {:#06X}",
                    format_opcode(opcode, operands),
                    self.cpu.p_c
                ));
            }
        };
        Ok(r)
    }

    // Execute a pending OAM DMA transfer, if one was started by a write
    // to $4014. Returns whether one ran.
    fn check_oam_dma(&mut self) -> bool {
        match self.ppu.oam_dma.take() {
            Some(page) => {
                let start = (page as usize) << 8;
                let oam_addr = self.ppu.oam_addr as usize;
                (0..0x100).for_each(|i| {
                    let v = self.read_byte(start + i);
                    self.ppu.oam.write(oam_addr + i, v);
                });
                true
            }
            None => false,
        }
    }

    /// Advance the console by one CPU instruction, advancing the PPU, APU
    /// and cartridge in step and servicing any interrupt that fires.
    ///
    /// Returns the number of CPU cycles that passed, or a description of
    /// why execution cannot continue (the CPU hit a halting opcode).
    pub fn advance_instruction(&mut self, settings: &Settings) -> Result<u32, String> {
        let mut cycles = self.step().map_err(|e| {
            error!("{}", e);
            e
        })? as u32;
        if self.check_oam_dma() {
            cycles += CPU_CYCLES_PER_OAM_DMA;
        }
        // Mapper and APU IRQs are level triggered
        if !self.cpu.s_r.i && (self.cartridge.mapper.irq() || self.apu.irq()) {
            self.interrupt_to_addr(IRQ_VECTOR);
            cycles += 7;
        }
        self.apu
            .advance_cpu_cycles(cycles, &mut self.cartridge, settings);
        self.cartridge.advance_cpu_cycles(cycles);
        // The PPU runs three dots per CPU cycle
        if self
            .ppu
            .advance_dots(3 * cycles, &mut self.cartridge, settings)
            && self.ppu.get_nmi_enabled()
        {
            self.on_nmi();
            cycles += 7;
            self.apu.advance_cpu_cycles(7, &mut self.cartridge, settings);
            self.cartridge.advance_cpu_cycles(7);
            self.ppu.advance_dots(21, &mut self.cartridge, settings);
        }
        Ok(cycles)
    }
    /// Advance the console by one frame of video output.
    ///
    /// Runs instructions until the PPU next enters VBlank, i.e. until the
    /// output buffer holds one new complete picture.
    /// Returns the number of CPU cycles that passed.
    pub fn advance_frame(&mut self, settings: &Settings) -> Result<u32, String> {
        let mut cycles = 0;
        // Leave the current VBlank first
        while self.ppu.in_vblank() {
            cycles += self.advance_instruction(settings)?;
        }
        while !self.ppu.in_vblank() {
            cycles += self.advance_instruction(settings)?;
        }
        Ok(cycles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_hex::assert_eq_hex;

    // Build a NES running the given program from $8000
    fn nes_with_program(program: &[u8]) -> Nes {
        let mut bytes = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0, 0];
        bytes.resize(16, 0);
        let mut prg = vec![0; 0x4000];
        prg[..program.len()].copy_from_slice(program);
        // Reset vector
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        bytes.extend_from_slice(&prg);
        bytes.extend_from_slice(&[0; 0x2000]);
        Nes::with_cartridge(Cartridge::from_ines(&bytes, None).unwrap())
    }

    #[test]
    fn test_reset_vector() {
        let nes = nes_with_program(&[]);
        assert_eq_hex!(nes.cpu.p_c, 0x8000);
        assert_eq_hex!(nes.cpu.s_p, 0xFD);
    }

    #[test]
    fn test_lda_sta() {
        let mut nes = nes_with_program(&[LDA_I, 0x42, STA_ZP, 0x10]);
        assert_eq!(nes.step().unwrap(), 2);
        assert_eq_hex!(nes.cpu.a, 0x42);
        assert_eq!(nes.step().unwrap(), 3);
        assert_eq_hex!(nes.ram.read(0x10), 0x42);
    }

    #[test]
    fn test_ram_mirroring() {
        let mut nes = nes_with_program(&[LDA_I, 0x42, STA_ABS, 0x00, 0x08]);
        nes.step().unwrap();
        nes.step().unwrap();
        // $0800 mirrors $0000
        assert_eq_hex!(nes.ram.read(0x00), 0x42);
    }

    #[test]
    fn test_jsr_rts() {
        // JSR $8005; BRK; BRK; NOP; RTS at $8005
        let mut nes = nes_with_program(&[JSR, 0x05, 0x80, 0x00, 0x00, RTS]);
        assert_eq!(nes.step().unwrap(), 6);
        assert_eq_hex!(nes.cpu.p_c, 0x8005);
        assert_eq!(nes.step().unwrap(), 6);
        assert_eq_hex!(nes.cpu.p_c, 0x8003);
    }

    #[test]
    fn test_page_cross_cycles() {
        let mut nes = nes_with_program(&[LDX_I, 0xFF, LDA_ABS_X, 0x01, 0x00]);
        nes.step().unwrap();
        // $0001 + $FF crosses into the next page
        assert_eq!(nes.step().unwrap(), 5);
    }

    #[test]
    fn test_indexed_indirect() {
        let mut nes = nes_with_program(&[LDX_I, 0x04, LDA_IND_X, 0x20]);
        nes.ram.write(0x24, 0x34);
        nes.ram.write(0x25, 0x02);
        nes.ram.write(0x234, 0x99);
        nes.step().unwrap();
        nes.step().unwrap();
        assert_eq_hex!(nes.cpu.a, 0x99);
    }

    #[test]
    fn test_zero_page_wraparound() {
        let mut nes = nes_with_program(&[LDX_I, 0x10, LDA_ZP_X, 0xFF]);
        nes.ram.write(0x0F, 0x77);
        nes.step().unwrap();
        // $FF + $10 wraps within the zero page
        nes.step().unwrap();
        assert_eq_hex!(nes.cpu.a, 0x77);
    }

    #[test]
    fn test_jmp_indirect_page_bug() {
        let mut nes = nes_with_program(&[JMP_IND, 0xFF, 0x02]);
        nes.ram.write(0x2FF, 0x34);
        nes.ram.write(0x300, 0x12);
        nes.ram.write(0x200, 0x56);
        nes.step().unwrap();
        // The high byte comes from $0200, not $0300
        assert_eq_hex!(nes.cpu.p_c, 0x5634);
    }

    #[test]
    fn test_brk_pushes_and_vectors() {
        let mut nes = nes_with_program(&[BRK]);
        assert_eq!(nes.step().unwrap(), 7);
        // The (all zeroes) IRQ vector was followed
        assert_eq_hex!(nes.cpu.p_c, 0x0000);
        assert!(nes.cpu.s_r.i);
        // The pushed status has the break flag set
        assert_eq!(nes.ram.read(0x100 + nes.cpu.s_p as usize + 1) & 0x10, 0x10);
    }

    #[test]
    fn test_request_irq_respects_interrupt_flag() {
        let mut nes = nes_with_program(&[CLI]);
        // I is set out of reset, so the request is ignored
        nes.request_irq();
        assert_eq_hex!(nes.cpu.p_c, 0x8000);
        nes.step().unwrap();
        nes.request_irq();
        // The (all zeroes) IRQ vector was followed
        assert_eq_hex!(nes.cpu.p_c, 0x0000);
        assert!(nes.cpu.s_r.i);
    }

    #[test]
    fn test_jam_reports_error() {
        let mut nes = nes_with_program(&[0x02]);
        let err = nes.step().unwrap_err();
        assert!(err.contains("JAM"), "unexpected error: {}", err);
    }

    #[test]
    fn test_controller_shift_register() {
        let mut nes = nes_with_program(&[]);
        let mut state = Controller::new();
        state.a = true;
        state.start = true;
        nes.set_controller_state(0, state);
        // Strobe, then read the 8 bits
        nes.write_byte(0x4016, 0x01);
        let bits: Vec<u8> = (0..8).map(|_| nes.read_byte(0x4016) & 0x01).collect();
        assert_eq!(bits, vec![1, 0, 0, 1, 0, 0, 0, 0]);
        // Exhausted registers report 1
        assert_eq!(nes.read_byte(0x4016) & 0x01, 1);
    }

    #[test]
    fn test_oam_dma_cycles() {
        let settings = Settings::default();
        // Fill $0200 with a pattern and DMA it into OAM
        let mut nes = nes_with_program(&[LDA_I, 0x02, STA_ABS, 0x14, 0x40]);
        (0..0x100).for_each(|i| nes.ram.write(0x200 + i, i as u8));
        nes.step().unwrap();
        let cycles = nes.advance_instruction(&settings).unwrap();
        assert_eq!(cycles, 4 + 513);
        assert_eq!(nes.ppu.oam.read(0x42), 0x42);
    }

    #[test]
    fn test_frame_cycle_count() {
        let settings = Settings::default();
        // An idle loop: JMP $8000
        let mut nes = nes_with_program(&[JMP_ABS, 0x00, 0x80]);
        // The first call only runs to the first VBlank, measure the second
        nes.advance_frame(&settings).unwrap();
        let cycles = nes.advance_frame(&settings).unwrap();
        // One NTSC frame is 341 * 262 / 3 = 29780.67 CPU cycles
        assert!((29700..29900).contains(&cycles), "cycles = {}", cycles);
    }
}
