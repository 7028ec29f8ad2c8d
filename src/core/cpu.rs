use serde::{Deserialize, Serialize};

use crate::core::StatusRegister;

/// The CPU of the NES.
///
/// Contains the registers and the arithmetic/logic operations that act on
/// them. Fetching operands and storing results is the bus's job, so every
/// operation here takes and returns plain bytes.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Cpu {
    /// Accumulator
    pub a: u8,
    /// X index register
    pub x: u8,
    /// Y index register
    pub y: u8,
    /// Program counter
    pub p_c: u16,
    /// Stack pointer
    pub s_p: u8,
    /// Status register
    pub s_r: StatusRegister,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Cpu {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            p_c: 0,
            s_p: 0,
            s_r: StatusRegister::new(),
        }
    }
    /// Load some value into A, setting the zero and negative flags.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.lda(0x18);
    /// assert_eq!(cpu.a, 0x18);
    /// ```
    pub fn lda(&mut self, value: u8) {
        self.a = value;
        self.set_zn(self.a);
    }
    /// Load some value into X, setting the zero and negative flags.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.ldx(0x18);
    /// assert_eq!(cpu.x, 0x18);
    /// ```
    pub fn ldx(&mut self, value: u8) {
        self.x = value;
        self.set_zn(self.x);
    }
    /// Load some value into Y, setting the zero and negative flags.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.ldy(0x18);
    /// assert_eq!(cpu.y, 0x18);
    /// ```
    pub fn ldy(&mut self, value: u8) {
        self.y = value;
        self.set_zn(self.y);
    }
    /// Load some value into both A and X, setting the zero and negative flags.
    pub fn lax(&mut self, value: u8) {
        self.a = value;
        self.x = value;
        self.set_zn(value);
    }
    /// Add some value and the carry bit to A.
    /// * C is set on unsigned overflow
    /// * V is set on signed overflow
    /// * Z and N are set from the result
    pub fn adc(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + if self.s_r.c { 1 } else { 0 };
        let result = sum as u8;
        self.s_r.c = sum > 0xFF;
        // Signed overflow occurs when both operands share a sign that the result does not
        self.s_r.v = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.a = result;
        self.set_zn(self.a);
    }
    /// Subtract some value and the borrow bit (inverted carry) from A.
    ///
    /// Identical to adding the one's complement of the value.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.a = 0x40;
    /// cpu.s_r.c = true;
    /// cpu.sbc(0x10);
    /// assert_eq!(cpu.a, 0x30);
    /// assert_eq!(cpu.s_r.c, true);
    /// ```
    pub fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }
    /// Perform an AND between A and some value, setting the zero and negative flags.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.a = 0xAA;
    /// cpu.and(0x0F);
    /// assert_eq!(cpu.a, 0x0A);
    /// ```
    pub fn and(&mut self, value: u8) {
        self.a &= value;
        self.set_zn(self.a);
    }
    /// Perform an OR between A and some value, setting the zero and negative flags.
    pub fn ora(&mut self, value: u8) {
        self.a |= value;
        self.set_zn(self.a);
    }
    /// Perform an exclusive OR between A and some value, setting the zero and negative flags.
    pub fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.set_zn(self.a);
    }
    /// Bit test A against some value.
    /// * Z is set if the AND of the two is zero
    /// * V and N are copied from bits 6 and 7 of the value
    pub fn bit(&mut self, value: u8) {
        self.s_r.z = (self.a & value) == 0;
        self.s_r.v = (value & 0x40) != 0;
        self.s_r.n = (value & 0x80) != 0;
    }
    /// Compare A with some value as if subtracting it.
    pub fn cmp(&mut self, value: u8) {
        self.compare(self.a, value);
    }
    /// Compare X with some value as if subtracting it.
    pub fn cpx(&mut self, value: u8) {
        self.compare(self.x, value);
    }
    /// Compare Y with some value as if subtracting it.
    pub fn cpy(&mut self, value: u8) {
        self.compare(self.y, value);
    }
    /// Shift some value left one bit, shifting bit 7 into the carry flag.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// assert_eq!(cpu.asl(0x81), 0x02);
    /// assert_eq!(cpu.s_r.c, true);
    /// ```
    pub fn asl(&mut self, value: u8) -> u8 {
        self.s_r.c = (value & 0x80) != 0;
        let result = value << 1;
        self.set_zn(result);
        result
    }
    /// Shift some value right one bit, shifting bit 0 into the carry flag.
    pub fn lsr(&mut self, value: u8) -> u8 {
        self.s_r.c = (value & 0x01) != 0;
        let result = value >> 1;
        self.set_zn(result);
        result
    }
    /// Rotate some value left one bit through the carry flag.
    pub fn rol(&mut self, value: u8) -> u8 {
        let carry_in = if self.s_r.c { 1 } else { 0 };
        self.s_r.c = (value & 0x80) != 0;
        let result = (value << 1) | carry_in;
        self.set_zn(result);
        result
    }
    /// Rotate some value right one bit through the carry flag.
    /// ```
    /// let mut cpu = nesium::core::Cpu::new();
    /// cpu.s_r.c = true;
    /// assert_eq!(cpu.ror(0x02), 0x81);
    /// assert_eq!(cpu.s_r.c, false);
    /// ```
    pub fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.s_r.c { 0x80 } else { 0 };
        self.s_r.c = (value & 0x01) != 0;
        let result = (value >> 1) | carry_in;
        self.set_zn(result);
        result
    }
    /// Increment some value, setting the zero and negative flags.
    pub fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.set_zn(result);
        result
    }
    /// Decrement some value, setting the zero and negative flags.
    pub fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.set_zn(result);
        result
    }
    /// Decrement some value and then compare A against it.
    pub fn dcp(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.compare(self.a, result);
        result
    }
    /// Increment some value and then subtract it with carry from A.
    pub fn isc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.sbc(result);
        result
    }
    /// Rotate some value left and then AND it with A.
    pub fn rla(&mut self, value: u8) -> u8 {
        let result = self.rol(value);
        self.and(result);
        result
    }
    /// Rotate some value right and then add it with carry to A.
    pub fn rra(&mut self, value: u8) -> u8 {
        let result = self.ror(value);
        self.adc(result);
        result
    }
    /// Shift some value left and then OR it with A.
    pub fn slo(&mut self, value: u8) -> u8 {
        let result = self.asl(value);
        self.ora(result);
        result
    }
    /// Shift some value right and then exclusive OR it with A.
    pub fn sre(&mut self, value: u8) -> u8 {
        let result = self.lsr(value);
        self.eor(result);
        result
    }
    /// Conditionally take a relative branch.
    ///
    /// If `condition` holds, the PC is moved by `offset` as a signed byte.
    /// Returns the cycle cost of the instruction: 2 when not taken, 3 when
    /// taken, and 4 when the branch target is on a different page than the
    /// next instruction. Does not account for the instruction's own 2
    /// bytes, which the caller advances past.
    pub fn branch_if(&mut self, condition: bool, offset: u8) -> i64 {
        if !condition {
            return 2;
        }
        let from = self.p_c.wrapping_add(2);
        let to = from.wrapping_add(offset as i8 as u16);
        self.p_c = self.p_c.wrapping_add(offset as i8 as u16);
        if (from & 0xFF00) != (to & 0xFF00) {
            4
        } else {
            3
        }
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.s_r.c = register >= value;
        self.set_zn(register.wrapping_sub(value));
    }
    // Set the zero and negative flags from a result byte
    fn set_zn(&mut self, value: u8) {
        self.s_r.z = value == 0;
        self.s_r.n = (value & 0x80) != 0;
    }
}

#[cfg(test)]
mod tests {
    use super::Cpu;
    use assert_hex::assert_eq_hex;
    #[derive(PartialEq)]
    enum Flag {
        Carry,
        Zero,
        Interrupt,
        Decimal,
        Break,
        Overflow,
        Negative,
    }

    fn check_flags(cpu: &Cpu, flags: Vec<Flag>) {
        macro_rules! check_flag {
            ($flag:ident, $flag_enum:ident, $flag_str:literal) => {
                assert_eq!(
                    cpu.s_r.$flag,
                    flags.contains(&Flag::$flag_enum),
                    "Expected {} flag to be {}",
                    $flag_str,
                    flags.contains(&Flag::$flag_enum)
                );
            };
        }
        check_flag!(c, Carry, "carry");
        check_flag!(z, Zero, "zero");
        check_flag!(d, Decimal, "decimal");
        check_flag!(b, Break, "break");
        check_flag!(v, Overflow, "overflow");
        check_flag!(n, Negative, "negative");
        // The interrupt flag starts set, nothing here touches it
        assert_eq!(cpu.s_r.i, !flags.contains(&Flag::Interrupt));
    }

    fn new_cpu() -> Cpu {
        let mut cpu = Cpu::new();
        cpu.s_r.i = false;
        cpu
    }

    macro_rules! ld_test {
        ($ld:ident, $reg:ident) => {
            let mut cpu = new_cpu();
            cpu.$ld(0x18);
            assert_eq_hex!(cpu.$reg, 0x18);
            check_flags(&cpu, Vec::new());
            cpu.$ld(0x00);
            check_flags(&cpu, vec![Flag::Zero]);
            cpu.$ld(0x80);
            // Loading a negative value must also clear the zero flag
            check_flags(&cpu, vec![Flag::Negative]);
        };
    }

    #[test]
    fn test_lda() {
        ld_test!(lda, a);
    }
    #[test]
    fn test_ldx() {
        ld_test!(ldx, x);
    }
    #[test]
    fn test_ldy() {
        ld_test!(ldy, y);
    }
    #[test]
    fn test_lax() {
        let mut cpu = new_cpu();
        cpu.lax(0x85);
        assert_eq_hex!(cpu.a, 0x85);
        assert_eq_hex!(cpu.x, 0x85);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_adc() {
        let mut cpu = new_cpu();
        cpu.adc(0x14);
        check_flags(&cpu, Vec::new());
        cpu.adc(0x45);
        assert_eq_hex!(cpu.a, 0x14 + 0x45);
        check_flags(&cpu, Vec::new());
    }
    #[test]
    fn test_adc_zero() {
        let mut cpu = new_cpu();
        cpu.adc(0x00);
        assert_eq_hex!(cpu.a, 0x00);
        check_flags(&cpu, vec![Flag::Zero]);
    }
    #[test]
    fn test_adc_unsigned_overflow() {
        let mut cpu = new_cpu();
        cpu.adc(0x35);
        cpu.adc(0xFF);
        assert_eq_hex!(cpu.a, 0x34);
        check_flags(&cpu, vec![Flag::Carry]);
    }
    #[test]
    fn test_adc_signed_overflow() {
        let mut cpu = new_cpu();
        cpu.adc(0x40);
        cpu.adc(0x41);
        check_flags(&cpu, vec![Flag::Overflow, Flag::Negative]);
    }
    #[test]
    fn test_adc_with_carry() {
        let mut cpu = new_cpu();
        cpu.a = 0x18;
        cpu.s_r.c = true;
        cpu.adc(0x45);
        assert_eq_hex!(cpu.a, 0x18 + 0x45 + 0x01);
        check_flags(&cpu, vec![]);
    }
    #[test]
    fn test_adc_carry_to_zero() {
        let mut cpu = new_cpu();
        cpu.a = 0x65;
        cpu.s_r.c = true;
        cpu.adc(0xFF - 0x65);
        assert_eq_hex!(cpu.a, 0x00);
        check_flags(&cpu, vec![Flag::Carry, Flag::Zero]);
    }
    #[test]
    fn test_sbc() {
        let mut cpu = new_cpu();
        cpu.a = 0x40;
        cpu.s_r.c = true;
        cpu.sbc(0x10);
        assert_eq_hex!(cpu.a, 0x30);
        // No borrow occurred so carry stays set
        check_flags(&cpu, vec![Flag::Carry]);
    }
    #[test]
    fn test_sbc_borrow() {
        let mut cpu = new_cpu();
        cpu.a = 0x10;
        cpu.s_r.c = true;
        cpu.sbc(0x20);
        assert_eq_hex!(cpu.a, 0xF0);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_and() {
        let mut cpu = new_cpu();
        cpu.a = 0x67;
        cpu.and(0x60);
        assert_eq_hex!(cpu.a, 0x60);
        check_flags(&cpu, vec![]);
        cpu.and(0x00);
        check_flags(&cpu, vec![Flag::Zero]);
    }
    #[test]
    fn test_ora_eor() {
        let mut cpu = new_cpu();
        cpu.ora(0x0F);
        assert_eq_hex!(cpu.a, 0x0F);
        cpu.eor(0xFF);
        assert_eq_hex!(cpu.a, 0xF0);
        check_flags(&cpu, vec![Flag::Negative]);
        cpu.eor(0xF0);
        check_flags(&cpu, vec![Flag::Zero]);
    }
    #[test]
    fn test_bit() {
        let mut cpu = new_cpu();
        cpu.a = 0x01;
        cpu.bit(0xC0);
        check_flags(&cpu, vec![Flag::Zero, Flag::Overflow, Flag::Negative]);
        cpu.bit(0x01);
        check_flags(&cpu, vec![]);
    }
    #[test]
    fn test_cmp() {
        let mut cpu = new_cpu();
        cpu.a = 0x40;
        cpu.cmp(0x40);
        check_flags(&cpu, vec![Flag::Carry, Flag::Zero]);
        cpu.cmp(0x41);
        check_flags(&cpu, vec![Flag::Negative]);
        cpu.cmp(0x10);
        check_flags(&cpu, vec![Flag::Carry]);
    }
    #[test]
    fn test_shifts() {
        let mut cpu = new_cpu();
        assert_eq_hex!(cpu.asl(0x81), 0x02);
        check_flags(&cpu, vec![Flag::Carry]);
        assert_eq_hex!(cpu.rol(0x00), 0x01);
        check_flags(&cpu, vec![]);
        assert_eq_hex!(cpu.lsr(0x01), 0x00);
        check_flags(&cpu, vec![Flag::Carry, Flag::Zero]);
        assert_eq_hex!(cpu.ror(0x00), 0x80);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_inc_dec() {
        let mut cpu = new_cpu();
        assert_eq_hex!(cpu.inc(0xFF), 0x00);
        check_flags(&cpu, vec![Flag::Zero]);
        assert_eq_hex!(cpu.dec(0x00), 0xFF);
        check_flags(&cpu, vec![Flag::Negative]);
    }
    #[test]
    fn test_branch_not_taken() {
        let mut cpu = new_cpu();
        cpu.p_c = 0x8000;
        assert_eq!(cpu.branch_if(false, 0x10), 2);
        assert_eq_hex!(cpu.p_c, 0x8000);
    }
    #[test]
    fn test_branch_taken() {
        let mut cpu = new_cpu();
        cpu.p_c = 0x8000;
        assert_eq!(cpu.branch_if(true, 0x10), 3);
        assert_eq_hex!(cpu.p_c, 0x8010);
    }
    #[test]
    fn test_branch_page_cross() {
        let mut cpu = new_cpu();
        cpu.p_c = 0x80F0;
        assert_eq!(cpu.branch_if(true, 0x20), 4);
        assert_eq_hex!(cpu.p_c, 0x8110);
    }
    #[test]
    fn test_branch_backwards() {
        let mut cpu = new_cpu();
        cpu.p_c = 0x8010;
        cpu.branch_if(true, 0xF0);
        assert_eq_hex!(cpu.p_c, 0x8000);
    }
}
