//! Constants for every opcode the CPU can execute, documented and
//! undocumented, plus a disassembly helper used in error logs.
/// Load A Immediate
pub const LDA_I: u8 = 0xA9;
/// Load A Zero Page
pub const LDA_ZP: u8 = 0xA5;
/// Load A Zero Page X
pub const LDA_ZP_X: u8 = 0xB5;
/// Load A Absolute
pub const LDA_ABS: u8 = 0xAD;
/// Load A Absolute X
pub const LDA_ABS_X: u8 = 0xBD;
/// Load A Absolute Y
pub const LDA_ABS_Y: u8 = 0xB9;
/// Load A Indexed Indirect
pub const LDA_IND_X: u8 = 0xA1;
/// Load A Indirect Indexed
pub const LDA_IND_Y: u8 = 0xB1;
/// Load X Immediate
pub const LDX_I: u8 = 0xA2;
/// Load X Zero Page
pub const LDX_ZP: u8 = 0xA6;
/// Load X Zero Page Y
pub const LDX_ZP_Y: u8 = 0xB6;
/// Load X Absolute
pub const LDX_ABS: u8 = 0xAE;
/// Load X Absolute Y
pub const LDX_ABS_Y: u8 = 0xBE;
/// Load Y Immediate
pub const LDY_I: u8 = 0xA0;
/// Load Y Zero Page
pub const LDY_ZP: u8 = 0xA4;
/// Load Y Zero Page X
pub const LDY_ZP_X: u8 = 0xB4;
/// Load Y Absolute
pub const LDY_ABS: u8 = 0xAC;
/// Load Y Absolute X
pub const LDY_ABS_X: u8 = 0xBC;
/// Add with Carry Immediate
pub const ADC_I: u8 = 0x69;
/// Add with Carry Zero Page
pub const ADC_ZP: u8 = 0x65;
/// Add with Carry Zero Page X
pub const ADC_ZP_X: u8 = 0x75;
/// Add with Carry Absolute
pub const ADC_ABS: u8 = 0x6D;
/// Add with Carry Absolute X
pub const ADC_ABS_X: u8 = 0x7D;
/// Add with Carry Absolute Y
pub const ADC_ABS_Y: u8 = 0x79;
/// Add with Carry Indexed Indirect
pub const ADC_IND_X: u8 = 0x61;
/// Add with Carry Indirect Indexed
pub const ADC_IND_Y: u8 = 0x71;
/// And Immediate
pub const AND_I: u8 = 0x29;
/// And Zero Page
pub const AND_ZP: u8 = 0x25;
/// And Zero Page X
pub const AND_ZP_X: u8 = 0x35;
/// And Absolute
pub const AND_ABS: u8 = 0x2D;
/// And Absolute X
pub const AND_ABS_X: u8 = 0x3D;
/// And Absolute Y
pub const AND_ABS_Y: u8 = 0x39;
/// And Indexed Indirect
pub const AND_IND_X: u8 = 0x21;
/// And Indirect Indexed
pub const AND_IND_Y: u8 = 0x31;
/// Arithmetic Shift Left Accumulator
pub const ASL_A: u8 = 0x0A;
/// Arithmetic Shift Left Zero Page
pub const ASL_ZP: u8 = 0x06;
/// Arithmetic Shift Left Zero Page X
pub const ASL_ZP_X: u8 = 0x16;
/// Arithmetic Shift Left Absolute
pub const ASL_ABS: u8 = 0x0E;
/// Arithmetic Shift Left Absolute X
pub const ASL_ABS_X: u8 = 0x1E;
/// Branch if Carry Clear
pub const BCC: u8 = 0x90;
/// Branch if Carry Set
pub const BCS: u8 = 0xB0;
/// Branch if equal (branch if zero flag is set)
pub const BEQ: u8 = 0xF0;
/// Branch if not equal (branch if zero flag is cleared)
pub const BNE: u8 = 0xD0;
/// Branch if minus (branch if negative flag is set)
pub const BMI: u8 = 0x30;
/// Branch if positive (branch if negative flag is cleared)
pub const BPL: u8 = 0x10;
/// Branch if overflow cleared
pub const BVC: u8 = 0x50;
/// Branch if overflow set
pub const BVS: u8 = 0x70;
/// Bit test Zero Page
pub const BIT_ZP: u8 = 0x24;
/// Bit test Absolute
pub const BIT_ABS: u8 = 0x2C;
/// Force interrupt
pub const BRK: u8 = 0x00;
/// Clear carry flag
pub const CLC: u8 = 0x18;
/// Clear decimal flag
pub const CLD: u8 = 0xD8;
/// Clear interrupt disable flag
pub const CLI: u8 = 0x58;
/// Clear overflow flag
pub const CLV: u8 = 0xB8;
/// Compare with A Immediate
pub const CMP_I: u8 = 0xC9;
/// Compare with A Zero Page
pub const CMP_ZP: u8 = 0xC5;
/// Compare with A Zero Page X
pub const CMP_ZP_X: u8 = 0xD5;
/// Compare with A Absolute
pub const CMP_ABS: u8 = 0xCD;
/// Compare with A Absolute X
pub const CMP_ABS_X: u8 = 0xDD;
/// Compare with A Absolute Y
pub const CMP_ABS_Y: u8 = 0xD9;
/// Compare with A Indexed Indirect
pub const CMP_IND_X: u8 = 0xC1;
/// Compare with A Indirect Indexed
pub const CMP_IND_Y: u8 = 0xD1;
/// Compare with X Immediate
pub const CPX_I: u8 = 0xE0;
/// Compare with X Zero Page
pub const CPX_ZP: u8 = 0xE4;
/// Compare with X Absolute
pub const CPX_ABS: u8 = 0xEC;
/// Compare with Y Immediate
pub const CPY_I: u8 = 0xC0;
/// Compare with Y Zero Page
pub const CPY_ZP: u8 = 0xC4;
/// Compare with Y Absolute
pub const CPY_ABS: u8 = 0xCC;
/// Decrement memory Zero Page
pub const DEC_ZP: u8 = 0xC6;
/// Decrement memory Zero Page X
pub const DEC_ZP_X: u8 = 0xD6;
/// Decrement memory Absolute
pub const DEC_ABS: u8 = 0xCE;
/// Decrement memory Absolute X
pub const DEC_ABS_X: u8 = 0xDE;
/// Decrement X
pub const DEX: u8 = 0xCA;
/// Decrement Y
pub const DEY: u8 = 0x88;
/// Exclusive OR Immediate
pub const EOR_I: u8 = 0x49;
/// Exclusive OR Zero Page
pub const EOR_ZP: u8 = 0x45;
/// Exclusive OR Zero Page X
pub const EOR_ZP_X: u8 = 0x55;
/// Exclusive OR Absolute
pub const EOR_ABS: u8 = 0x4D;
/// Exclusive OR Absolute X
pub const EOR_ABS_X: u8 = 0x5D;
/// Exclusive OR Absolute Y
pub const EOR_ABS_Y: u8 = 0x59;
/// Exclusive OR Indexed Indirect
pub const EOR_IND_X: u8 = 0x41;
/// Exclusive OR Indirect Indexed
pub const EOR_IND_Y: u8 = 0x51;
/// Increment memory Zero Page
pub const INC_ZP: u8 = 0xE6;
/// Increment memory Zero Page X
pub const INC_ZP_X: u8 = 0xF6;
/// Increment memory Absolute
pub const INC_ABS: u8 = 0xEE;
/// Increment memory Absolute X
pub const INC_ABS_X: u8 = 0xFE;
/// Increment X
pub const INX: u8 = 0xE8;
/// Increment Y
pub const INY: u8 = 0xC8;
/// Jump Absolute
pub const JMP_ABS: u8 = 0x4C;
/// Jump Indirect
pub const JMP_IND: u8 = 0x6C;
/// Jump to Subroutine
pub const JSR: u8 = 0x20;
/// Logical Shift Right Accumulator
pub const LSR_A: u8 = 0x4A;
/// Logical Shift Right Zero Page
pub const LSR_ZP: u8 = 0x46;
/// Logical Shift Right Zero Page X
pub const LSR_ZP_X: u8 = 0x56;
/// Logical Shift Right Absolute
pub const LSR_ABS: u8 = 0x4E;
/// Logical Shift Right Absolute X
pub const LSR_ABS_X: u8 = 0x5E;
/// No Operation
pub const NOP: u8 = 0xEA;
/// Or A Immediate
pub const ORA_I: u8 = 0x09;
/// Or A Zero Page
pub const ORA_ZP: u8 = 0x05;
/// Or A Zero Page X
pub const ORA_ZP_X: u8 = 0x15;
/// Or A Absolute
pub const ORA_ABS: u8 = 0x0D;
/// Or A Absolute X
pub const ORA_ABS_X: u8 = 0x1D;
/// Or A Absolute Y
pub const ORA_ABS_Y: u8 = 0x19;
/// Or A Indexed Indirect
pub const ORA_IND_X: u8 = 0x01;
/// Or A Indirect Indexed
pub const ORA_IND_Y: u8 = 0x11;
/// Push A
pub const PHA: u8 = 0x48;
/// Push Processor Status
pub const PHP: u8 = 0x08;
/// Pull to A
pub const PLA: u8 = 0x68;
/// Pull to Processor Status
pub const PLP: u8 = 0x28;
/// Rotate Left Accumulator
pub const ROL_A: u8 = 0x2A;
/// Rotate Left Zero Page
pub const ROL_ZP: u8 = 0x26;
/// Rotate Left Zero Page X
pub const ROL_ZP_X: u8 = 0x36;
/// Rotate Left Absolute
pub const ROL_ABS: u8 = 0x2E;
/// Rotate Left Absolute X
pub const ROL_ABS_X: u8 = 0x3E;
/// Rotate Right Accumulator
pub const ROR_A: u8 = 0x6A;
/// Rotate Right Zero Page
pub const ROR_ZP: u8 = 0x66;
/// Rotate Right Zero Page X
pub const ROR_ZP_X: u8 = 0x76;
/// Rotate Right Absolute
pub const ROR_ABS: u8 = 0x6E;
/// Rotate Right Absolute X
pub const ROR_ABS_X: u8 = 0x7E;
/// Return from interrupt
pub const RTI: u8 = 0x40;
/// Return from subroutine
pub const RTS: u8 = 0x60;
/// Subtract with Carry Immediate
pub const SBC_I: u8 = 0xE9;
/// Subtract with Carry Zero Page
pub const SBC_ZP: u8 = 0xE5;
/// Subtract with Carry Zero Page X
pub const SBC_ZP_X: u8 = 0xF5;
/// Subtract with Carry Absolute
pub const SBC_ABS: u8 = 0xED;
/// Subtract with Carry Absolute X
pub const SBC_ABS_X: u8 = 0xFD;
/// Subtract with Carry Absolute Y
pub const SBC_ABS_Y: u8 = 0xF9;
/// Subtract with Carry Indexed Indirect
pub const SBC_IND_X: u8 = 0xE1;
/// Subtract with Carry Indirect Indexed
pub const SBC_IND_Y: u8 = 0xF1;
/// Set carry flag
pub const SEC: u8 = 0x38;
/// Set decimal flag
pub const SED: u8 = 0xF8;
/// Set interrupt disable flag
pub const SEI: u8 = 0x78;
/// Store A Zero Page
pub const STA_ZP: u8 = 0x85;
/// Store A Zero Page X
pub const STA_ZP_X: u8 = 0x95;
/// Store A Absolute
pub const STA_ABS: u8 = 0x8D;
/// Store A Absolute X
pub const STA_ABS_X: u8 = 0x9D;
/// Store A Absolute Y
pub const STA_ABS_Y: u8 = 0x99;
/// Store A Indexed Indirect
pub const STA_IND_X: u8 = 0x81;
/// Store A Indirect Indexed
pub const STA_IND_Y: u8 = 0x91;
/// Store X Zero Page
pub const STX_ZP: u8 = 0x86;
/// Store X Zero Page Y
pub const STX_ZP_Y: u8 = 0x96;
/// Store X Absolute
pub const STX_ABS: u8 = 0x8E;
/// Store Y Zero Page
pub const STY_ZP: u8 = 0x84;
/// Store Y Zero Page X
pub const STY_ZP_X: u8 = 0x94;
/// Store Y Absolute
pub const STY_ABS: u8 = 0x8C;
/// Transfer A to X
pub const TAX: u8 = 0xAA;
/// Transfer A to Y
pub const TAY: u8 = 0xA8;
/// Transfer Stack Pointer to X
pub const TSX: u8 = 0xBA;
/// Transfer X to A
pub const TXA: u8 = 0x8A;
/// Transfer X to Stack Pointer
pub const TXS: u8 = 0x9A;
/// Transfer Y to A
pub const TYA: u8 = 0x98;
/// Undocumented opcodes with stable, observable behaviour.
pub mod unofficial {
    /// AND and then LSR Immediate
    pub const ALR_I: u8 = 0x4B;
    /// AND and then copy N into C
    pub const ANC_I: [u8; 2] = [0x0B, 0x2B];
    /// AND and then ROR, with slightly different flags set
    pub const ARR_I: u8 = 0x6B;
    /// Sets X to (A AND X) - value
    pub const AXS_I: u8 = 0xCB;
    /// Load into A and X Zero Page
    pub const LAX_ZP: u8 = 0xA7;
    /// Load into A and X Zero Page Y
    pub const LAX_ZP_Y: u8 = 0xB7;
    /// Load into A and X Absolute
    pub const LAX_ABS: u8 = 0xAF;
    /// Load into A and X Absolute Y
    pub const LAX_ABS_Y: u8 = 0xBF;
    /// Load into A and X Indexed Indirect
    pub const LAX_IND_X: u8 = 0xA3;
    /// Load into A and X Indirect Indexed
    pub const LAX_IND_Y: u8 = 0xB3;
    /// Store (A AND X) Zero Page
    pub const SAX_ZP: u8 = 0x87;
    /// Store (A AND X) Zero Page Y
    pub const SAX_ZP_Y: u8 = 0x97;
    /// Store (A AND X) Absolute
    pub const SAX_ABS: u8 = 0x8F;
    /// Store (A AND X) Indexed Indirect
    pub const SAX_IND_X: u8 = 0x83;
    /// Decrement then compare Zero Page
    pub const DCP_ZP: u8 = 0xC7;
    /// Decrement then compare Zero Page X
    pub const DCP_ZP_X: u8 = 0xD7;
    /// Decrement then compare Absolute
    pub const DCP_ABS: u8 = 0xCF;
    /// Decrement then compare Absolute X
    pub const DCP_ABS_X: u8 = 0xDF;
    /// Decrement then compare Absolute Y
    pub const DCP_ABS_Y: u8 = 0xDB;
    /// Decrement then compare Indexed Indirect
    pub const DCP_IND_X: u8 = 0xC3;
    /// Decrement then compare Indirect Indexed
    pub const DCP_IND_Y: u8 = 0xD3;
    /// Increment then subtract with carry Zero Page
    pub const ISC_ZP: u8 = 0xE7;
    /// Increment then subtract with carry Zero Page X
    pub const ISC_ZP_X: u8 = 0xF7;
    /// Increment then subtract with carry Absolute
    pub const ISC_ABS: u8 = 0xEF;
    /// Increment then subtract with carry Absolute X
    pub const ISC_ABS_X: u8 = 0xFF;
    /// Increment then subtract with carry Absolute Y
    pub const ISC_ABS_Y: u8 = 0xFB;
    /// Increment then subtract with carry Indexed Indirect
    pub const ISC_IND_X: u8 = 0xE3;
    /// Increment then subtract with carry Indirect Indexed
    pub const ISC_IND_Y: u8 = 0xF3;
    /// Rotate left then AND Zero Page
    pub const RLA_ZP: u8 = 0x27;
    /// Rotate left then AND Zero Page X
    pub const RLA_ZP_X: u8 = 0x37;
    /// Rotate left then AND Absolute
    pub const RLA_ABS: u8 = 0x2F;
    /// Rotate left then AND Absolute X
    pub const RLA_ABS_X: u8 = 0x3F;
    /// Rotate left then AND Absolute Y
    pub const RLA_ABS_Y: u8 = 0x3B;
    /// Rotate left then AND Indexed Indirect
    pub const RLA_IND_X: u8 = 0x23;
    /// Rotate left then AND Indirect Indexed
    pub const RLA_IND_Y: u8 = 0x33;
    /// Rotate right then add with carry Zero Page
    pub const RRA_ZP: u8 = 0x67;
    /// Rotate right then add with carry Zero Page X
    pub const RRA_ZP_X: u8 = 0x77;
    /// Rotate right then add with carry Absolute
    pub const RRA_ABS: u8 = 0x6F;
    /// Rotate right then add with carry Absolute X
    pub const RRA_ABS_X: u8 = 0x7F;
    /// Rotate right then add with carry Absolute Y
    pub const RRA_ABS_Y: u8 = 0x7B;
    /// Rotate right then add with carry Indexed Indirect
    pub const RRA_IND_X: u8 = 0x63;
    /// Rotate right then add with carry Indirect Indexed
    pub const RRA_IND_Y: u8 = 0x73;
    /// Shift left then OR with A Zero Page
    pub const SLO_ZP: u8 = 0x07;
    /// Shift left then OR with A Zero Page X
    pub const SLO_ZP_X: u8 = 0x17;
    /// Shift left then OR with A Absolute
    pub const SLO_ABS: u8 = 0x0F;
    /// Shift left then OR with A Absolute X
    pub const SLO_ABS_X: u8 = 0x1F;
    /// Shift left then OR with A Absolute Y
    pub const SLO_ABS_Y: u8 = 0x1B;
    /// Shift left then OR with A Indexed Indirect
    pub const SLO_IND_X: u8 = 0x03;
    /// Shift left then OR with A Indirect Indexed
    pub const SLO_IND_Y: u8 = 0x13;
    /// Shift right then EOR with A Zero Page
    pub const SRE_ZP: u8 = 0x47;
    /// Shift right then EOR with A Zero Page X
    pub const SRE_ZP_X: u8 = 0x57;
    /// Shift right then EOR with A Absolute
    pub const SRE_ABS: u8 = 0x4F;
    /// Shift right then EOR with A Absolute X
    pub const SRE_ABS_X: u8 = 0x5F;
    /// Shift right then EOR with A Absolute Y
    pub const SRE_ABS_Y: u8 = 0x5B;
    /// Shift right then EOR with A Indexed Indirect
    pub const SRE_IND_X: u8 = 0x43;
    /// Shift right then EOR with A Indirect Indexed
    pub const SRE_IND_Y: u8 = 0x53;
    /// Undocumented clone of SBC (E9), behaves the same
    pub const SBC: u8 = 0xEB;
    /// Undocumented NOPs
    pub const NOPS: [u8; 6] = [0x1A, 0x3A, 0x5A, 0x7A, 0xDA, 0xFA];
    /// Read a byte and skip it (essentially a 2-byte NOP)
    pub const SKBS: [u8; 5] = [0x80, 0x82, 0x89, 0xC2, 0xE2];
    /// Ignore byte from memory Zero Page
    pub const IGN_ZP: [u8; 3] = [0x04, 0x44, 0x64];
    /// Ignore byte from memory Zero Page X
    pub const IGN_ZP_X: [u8; 6] = [0x14, 0x34, 0x54, 0x74, 0xD4, 0xF4];
    /// Ignore byte from memory Absolute
    pub const IGN_ABS: u8 = 0x0C;
    /// Ignore byte from memory Absolute X
    pub const IGN_ABS_X: [u8; 6] = [0x1C, 0x3C, 0x5C, 0x7C, 0xDC, 0xFC];
    /// Opcodes that halt the CPU until reset. No program should reach these.
    pub const JAMS: [u8; 12] = [
        0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
    ];
}

// Addressing mode, only used when rendering an instruction as text
enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Relative,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndexedIndirect,
    IndirectIndexed,
}

fn name_and_mode(opcode: u8) -> Option<(&'static str, Mode)> {
    use unofficial as un;
    use Mode::*;
    let r = match opcode {
        LDA_I => ("LDA", Immediate),
        LDA_ZP => ("LDA", ZeroPage),
        LDA_ZP_X => ("LDA", ZeroPageX),
        LDA_ABS => ("LDA", Absolute),
        LDA_ABS_X => ("LDA", AbsoluteX),
        LDA_ABS_Y => ("LDA", AbsoluteY),
        LDA_IND_X => ("LDA", IndexedIndirect),
        LDA_IND_Y => ("LDA", IndirectIndexed),
        LDX_I => ("LDX", Immediate),
        LDX_ZP => ("LDX", ZeroPage),
        LDX_ZP_Y => ("LDX", ZeroPageY),
        LDX_ABS => ("LDX", Absolute),
        LDX_ABS_Y => ("LDX", AbsoluteY),
        LDY_I => ("LDY", Immediate),
        LDY_ZP => ("LDY", ZeroPage),
        LDY_ZP_X => ("LDY", ZeroPageX),
        LDY_ABS => ("LDY", Absolute),
        LDY_ABS_X => ("LDY", AbsoluteX),
        ADC_I => ("ADC", Immediate),
        ADC_ZP => ("ADC", ZeroPage),
        ADC_ZP_X => ("ADC", ZeroPageX),
        ADC_ABS => ("ADC", Absolute),
        ADC_ABS_X => ("ADC", AbsoluteX),
        ADC_ABS_Y => ("ADC", AbsoluteY),
        ADC_IND_X => ("ADC", IndexedIndirect),
        ADC_IND_Y => ("ADC", IndirectIndexed),
        AND_I => ("AND", Immediate),
        AND_ZP => ("AND", ZeroPage),
        AND_ZP_X => ("AND", ZeroPageX),
        AND_ABS => ("AND", Absolute),
        AND_ABS_X => ("AND", AbsoluteX),
        AND_ABS_Y => ("AND", AbsoluteY),
        AND_IND_X => ("AND", IndexedIndirect),
        AND_IND_Y => ("AND", IndirectIndexed),
        ASL_A => ("ASL", Accumulator),
        ASL_ZP => ("ASL", ZeroPage),
        ASL_ZP_X => ("ASL", ZeroPageX),
        ASL_ABS => ("ASL", Absolute),
        ASL_ABS_X => ("ASL", AbsoluteX),
        BCC => ("BCC", Relative),
        BCS => ("BCS", Relative),
        BEQ => ("BEQ", Relative),
        BNE => ("BNE", Relative),
        BMI => ("BMI", Relative),
        BPL => ("BPL", Relative),
        BVC => ("BVC", Relative),
        BVS => ("BVS", Relative),
        BIT_ZP => ("BIT", ZeroPage),
        BIT_ABS => ("BIT", Absolute),
        BRK => ("BRK", Implied),
        CLC => ("CLC", Implied),
        CLD => ("CLD", Implied),
        CLI => ("CLI", Implied),
        CLV => ("CLV", Implied),
        CMP_I => ("CMP", Immediate),
        CMP_ZP => ("CMP", ZeroPage),
        CMP_ZP_X => ("CMP", ZeroPageX),
        CMP_ABS => ("CMP", Absolute),
        CMP_ABS_X => ("CMP", AbsoluteX),
        CMP_ABS_Y => ("CMP", AbsoluteY),
        CMP_IND_X => ("CMP", IndexedIndirect),
        CMP_IND_Y => ("CMP", IndirectIndexed),
        CPX_I => ("CPX", Immediate),
        CPX_ZP => ("CPX", ZeroPage),
        CPX_ABS => ("CPX", Absolute),
        CPY_I => ("CPY", Immediate),
        CPY_ZP => ("CPY", ZeroPage),
        CPY_ABS => ("CPY", Absolute),
        DEC_ZP => ("DEC", ZeroPage),
        DEC_ZP_X => ("DEC", ZeroPageX),
        DEC_ABS => ("DEC", Absolute),
        DEC_ABS_X => ("DEC", AbsoluteX),
        DEX => ("DEX", Implied),
        DEY => ("DEY", Implied),
        EOR_I => ("EOR", Immediate),
        EOR_ZP => ("EOR", ZeroPage),
        EOR_ZP_X => ("EOR", ZeroPageX),
        EOR_ABS => ("EOR", Absolute),
        EOR_ABS_X => ("EOR", AbsoluteX),
        EOR_ABS_Y => ("EOR", AbsoluteY),
        EOR_IND_X => ("EOR", IndexedIndirect),
        EOR_IND_Y => ("EOR", IndirectIndexed),
        INC_ZP => ("INC", ZeroPage),
        INC_ZP_X => ("INC", ZeroPageX),
        INC_ABS => ("INC", Absolute),
        INC_ABS_X => ("INC", AbsoluteX),
        INX => ("INX", Implied),
        INY => ("INY", Implied),
        JMP_ABS => ("JMP", Absolute),
        JMP_IND => ("JMP", Indirect),
        JSR => ("JSR", Absolute),
        LSR_A => ("LSR", Accumulator),
        LSR_ZP => ("LSR", ZeroPage),
        LSR_ZP_X => ("LSR", ZeroPageX),
        LSR_ABS => ("LSR", Absolute),
        LSR_ABS_X => ("LSR", AbsoluteX),
        NOP => ("NOP", Implied),
        ORA_I => ("ORA", Immediate),
        ORA_ZP => ("ORA", ZeroPage),
        ORA_ZP_X => ("ORA", ZeroPageX),
        ORA_ABS => ("ORA", Absolute),
        ORA_ABS_X => ("ORA", AbsoluteX),
        ORA_ABS_Y => ("ORA", AbsoluteY),
        ORA_IND_X => ("ORA", IndexedIndirect),
        ORA_IND_Y => ("ORA", IndirectIndexed),
        PHA => ("PHA", Implied),
        PHP => ("PHP", Implied),
        PLA => ("PLA", Implied),
        PLP => ("PLP", Implied),
        ROL_A => ("ROL", Accumulator),
        ROL_ZP => ("ROL", ZeroPage),
        ROL_ZP_X => ("ROL", ZeroPageX),
        ROL_ABS => ("ROL", Absolute),
        ROL_ABS_X => ("ROL", AbsoluteX),
        ROR_A => ("ROR", Accumulator),
        ROR_ZP => ("ROR", ZeroPage),
        ROR_ZP_X => ("ROR", ZeroPageX),
        ROR_ABS => ("ROR", Absolute),
        ROR_ABS_X => ("ROR", AbsoluteX),
        RTI => ("RTI", Implied),
        RTS => ("RTS", Implied),
        SBC_I => ("SBC", Immediate),
        SBC_ZP => ("SBC", ZeroPage),
        SBC_ZP_X => ("SBC", ZeroPageX),
        SBC_ABS => ("SBC", Absolute),
        SBC_ABS_X => ("SBC", AbsoluteX),
        SBC_ABS_Y => ("SBC", AbsoluteY),
        SBC_IND_X => ("SBC", IndexedIndirect),
        SBC_IND_Y => ("SBC", IndirectIndexed),
        SEC => ("SEC", Implied),
        SED => ("SED", Implied),
        SEI => ("SEI", Implied),
        STA_ZP => ("STA", ZeroPage),
        STA_ZP_X => ("STA", ZeroPageX),
        STA_ABS => ("STA", Absolute),
        STA_ABS_X => ("STA", AbsoluteX),
        STA_ABS_Y => ("STA", AbsoluteY),
        STA_IND_X => ("STA", IndexedIndirect),
        STA_IND_Y => ("STA", IndirectIndexed),
        STX_ZP => ("STX", ZeroPage),
        STX_ZP_Y => ("STX", ZeroPageY),
        STX_ABS => ("STX", Absolute),
        STY_ZP => ("STY", ZeroPage),
        STY_ZP_X => ("STY", ZeroPageX),
        STY_ABS => ("STY", Absolute),
        TAX => ("TAX", Implied),
        TAY => ("TAY", Implied),
        TSX => ("TSX", Implied),
        TXA => ("TXA", Implied),
        TXS => ("TXS", Implied),
        TYA => ("TYA", Implied),
        un::ALR_I => ("ALR", Immediate),
        un::ARR_I => ("ARR", Immediate),
        un::AXS_I => ("AXS", Immediate),
        un::LAX_ZP => ("LAX", ZeroPage),
        un::LAX_ZP_Y => ("LAX", ZeroPageY),
        un::LAX_ABS => ("LAX", Absolute),
        un::LAX_ABS_Y => ("LAX", AbsoluteY),
        un::LAX_IND_X => ("LAX", IndexedIndirect),
        un::LAX_IND_Y => ("LAX", IndirectIndexed),
        un::SAX_ZP => ("SAX", ZeroPage),
        un::SAX_ZP_Y => ("SAX", ZeroPageY),
        un::SAX_ABS => ("SAX", Absolute),
        un::SAX_IND_X => ("SAX", IndexedIndirect),
        un::DCP_ZP => ("DCP", ZeroPage),
        un::DCP_ZP_X => ("DCP", ZeroPageX),
        un::DCP_ABS => ("DCP", Absolute),
        un::DCP_ABS_X => ("DCP", AbsoluteX),
        un::DCP_ABS_Y => ("DCP", AbsoluteY),
        un::DCP_IND_X => ("DCP", IndexedIndirect),
        un::DCP_IND_Y => ("DCP", IndirectIndexed),
        un::ISC_ZP => ("ISC", ZeroPage),
        un::ISC_ZP_X => ("ISC", ZeroPageX),
        un::ISC_ABS => ("ISC", Absolute),
        un::ISC_ABS_X => ("ISC", AbsoluteX),
        un::ISC_ABS_Y => ("ISC", AbsoluteY),
        un::ISC_IND_X => ("ISC", IndexedIndirect),
        un::ISC_IND_Y => ("ISC", IndirectIndexed),
        un::RLA_ZP => ("RLA", ZeroPage),
        un::RLA_ZP_X => ("RLA", ZeroPageX),
        un::RLA_ABS => ("RLA", Absolute),
        un::RLA_ABS_X => ("RLA", AbsoluteX),
        un::RLA_ABS_Y => ("RLA", AbsoluteY),
        un::RLA_IND_X => ("RLA", IndexedIndirect),
        un::RLA_IND_Y => ("RLA", IndirectIndexed),
        un::RRA_ZP => ("RRA", ZeroPage),
        un::RRA_ZP_X => ("RRA", ZeroPageX),
        un::RRA_ABS => ("RRA", Absolute),
        un::RRA_ABS_X => ("RRA", AbsoluteX),
        un::RRA_ABS_Y => ("RRA", AbsoluteY),
        un::RRA_IND_X => ("RRA", IndexedIndirect),
        un::RRA_IND_Y => ("RRA", IndirectIndexed),
        un::SLO_ZP => ("SLO", ZeroPage),
        un::SLO_ZP_X => ("SLO", ZeroPageX),
        un::SLO_ABS => ("SLO", Absolute),
        un::SLO_ABS_X => ("SLO", AbsoluteX),
        un::SLO_ABS_Y => ("SLO", AbsoluteY),
        un::SLO_IND_X => ("SLO", IndexedIndirect),
        un::SLO_IND_Y => ("SLO", IndirectIndexed),
        un::SRE_ZP => ("SRE", ZeroPage),
        un::SRE_ZP_X => ("SRE", ZeroPageX),
        un::SRE_ABS => ("SRE", Absolute),
        un::SRE_ABS_X => ("SRE", AbsoluteX),
        un::SRE_ABS_Y => ("SRE", AbsoluteY),
        un::SRE_IND_X => ("SRE", IndexedIndirect),
        un::SRE_IND_Y => ("SRE", IndirectIndexed),
        un::SBC => ("SBC", Immediate),
        un::IGN_ABS => ("IGN", Absolute),
        _ if un::ANC_I.contains(&opcode) => ("ANC", Immediate),
        _ if un::NOPS.contains(&opcode) => ("NOP", Implied),
        _ if un::SKBS.contains(&opcode) => ("SKB", Immediate),
        _ if un::IGN_ZP.contains(&opcode) => ("IGN", ZeroPage),
        _ if un::IGN_ZP_X.contains(&opcode) => ("IGN", ZeroPageX),
        _ if un::IGN_ABS_X.contains(&opcode) => ("IGN", AbsoluteX),
        _ if un::JAMS.contains(&opcode) => ("JAM", Implied),
        _ => return None,
    };
    Some(r)
}

fn operand_u16(operands: &[u8]) -> u16 {
    ((operands[1] as u16) << 8) + operands[0] as u16
}

/// Render an instruction as assembly text, used when logging a failed step.
/// Unknown opcodes render as raw bytes.
/// ```
/// use nesium::core::opcodes::format_opcode;
/// assert_eq!(format_opcode(0xA9, &[0x18]), "LDA #$18");
/// assert_eq!(format_opcode(0x8D, &[0x02, 0x20]), "STA $2002");
/// ```
pub fn format_opcode(opcode: u8, operands: &[u8]) -> String {
    let Some((name, mode)) = name_and_mode(opcode) else {
        return format!("??? ({:#04X} {:02X?})", opcode, operands);
    };
    match mode {
        Mode::Implied => name.to_string(),
        Mode::Accumulator => format!("{} A", name),
        Mode::Immediate => format!("{} #${:02X}", name, operands[0]),
        Mode::ZeroPage => format!("{} ${:02X}", name, operands[0]),
        Mode::ZeroPageX => format!("{} ${:02X}, X", name, operands[0]),
        Mode::ZeroPageY => format!("{} ${:02X}, Y", name, operands[0]),
        Mode::Relative => format!("{} *{:+}", name, operands[0] as i8),
        Mode::Absolute => format!("{} ${:04X}", name, operand_u16(operands)),
        Mode::AbsoluteX => format!("{} ${:04X}, X", name, operand_u16(operands)),
        Mode::AbsoluteY => format!("{} ${:04X}, Y", name, operand_u16(operands)),
        Mode::Indirect => format!("{} (${:04X})", name, operand_u16(operands)),
        Mode::IndexedIndirect => format!("{} (${:02X}, X)", name, operands[0]),
        Mode::IndirectIndexed => format!("{} (${:02X}), Y", name, operands[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::format_opcode;

    #[test]
    fn test_format_documented() {
        assert_eq!(format_opcode(super::NOP, &[]), "NOP");
        assert_eq!(format_opcode(super::LSR_A, &[]), "LSR A");
        assert_eq!(format_opcode(super::BNE, &[0xFE]), "BNE *-2");
        assert_eq!(format_opcode(super::LDA_IND_Y, &[0x20]), "LDA ($20), Y");
    }

    #[test]
    fn test_format_unofficial() {
        assert_eq!(format_opcode(0xA7, &[0x10]), "LAX $10");
        assert_eq!(format_opcode(0x02, &[]), "JAM");
    }

    #[test]
    fn test_format_unknown() {
        // SHY has no stable behaviour and is not decoded
        assert!(format_opcode(0x9C, &[0x00, 0x00]).starts_with("???"));
    }
}
