//! The opcode decode table.
//!
//! Each of the 256 possible opcode bytes maps to at most one
//! [`Instruction`] descriptor, a plain-data record of addressing mode,
//! operation, and cycle cost. Bytes with no official 6502 instruction (all
//! unofficial/undocumented opcodes, per the interpreter's scope) decode to
//! `None`, which the dispatcher turns into a fatal [`crate::CpuError::InvalidOpcode`].
//!
//! This replaces the member-function-pointer decode tables this kind of
//! interpreter is traditionally built with: `decode` is an exhaustive match
//! from byte to data, and [`Operation`] effects are applied by a second,
//! separate match in the dispatcher. Neither match holds a function
//! pointer or calls through a vtable.

use crate::addressing::AddressingMode;

/// The operation an [`Instruction`] performs, independent of its addressing
/// mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Operation {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror,
    Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

/// A decoded instruction descriptor: everything the dispatcher needs to
/// evaluate the addressing mode, charge cycles, and apply the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Assembler mnemonic, for disassembly.
    pub mnemonic: &'static str,
    /// Addressing mode this opcode byte selects.
    pub mode: AddressingMode,
    /// Operation to apply once the address (if any) is resolved.
    pub op: Operation,
    /// Base cycle cost, before any page-cross or branch penalty.
    pub base_cycles: u8,
    /// Whether a page-crossed read of this instruction's operand costs one
    /// extra cycle. Only meaningful for read instructions in indexed
    /// modes; writes in the same modes always pay the extra cycle
    /// unconditionally and never consult this field.
    pub extra_on_page_cross: bool,
}

const fn instr(
    mnemonic: &'static str,
    mode: AddressingMode,
    op: Operation,
    base_cycles: u8,
    extra_on_page_cross: bool,
) -> Instruction {
    Instruction {
        mnemonic,
        mode,
        op,
        base_cycles,
        extra_on_page_cross,
    }
}

/// Decode a single opcode byte into its instruction descriptor.
///
/// Returns `None` for any byte with no official 6502 encoding. This
/// includes every unofficial/undocumented opcode, which this interpreter
/// treats as a fatal error rather than executing.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn decode(opcode: u8) -> Option<Instruction> {
    use AddressingMode::{
        Absolute, AbsoluteX, AbsoluteY, Accumulator, Immediate, Implied, Indirect,
        IndexedIndirectX, IndirectIndexedY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
    };
    use Operation::*;

    Some(match opcode {
        0x00 => instr("BRK", Implied, Brk, 7, false),
        0x01 => instr("ORA", IndexedIndirectX, Ora, 6, false),
        0x05 => instr("ORA", ZeroPage, Ora, 3, false),
        0x06 => instr("ASL", ZeroPage, Asl, 5, false),
        0x08 => instr("PHP", Implied, Php, 3, false),
        0x09 => instr("ORA", Immediate, Ora, 2, false),
        0x0A => instr("ASL", Accumulator, Asl, 2, false),
        0x0D => instr("ORA", Absolute, Ora, 4, false),
        0x0E => instr("ASL", Absolute, Asl, 6, false),

        0x10 => instr("BPL", Relative, Bpl, 2, false),
        0x11 => instr("ORA", IndirectIndexedY, Ora, 5, true),
        0x15 => instr("ORA", ZeroPageX, Ora, 4, false),
        0x16 => instr("ASL", ZeroPageX, Asl, 6, false),
        0x18 => instr("CLC", Implied, Clc, 2, false),
        0x19 => instr("ORA", AbsoluteY, Ora, 4, true),
        0x1D => instr("ORA", AbsoluteX, Ora, 4, true),
        0x1E => instr("ASL", AbsoluteX, Asl, 7, false),

        0x20 => instr("JSR", Absolute, Jsr, 6, false),
        0x21 => instr("AND", IndexedIndirectX, And, 6, false),
        0x24 => instr("BIT", ZeroPage, Bit, 3, false),
        0x25 => instr("AND", ZeroPage, And, 3, false),
        0x26 => instr("ROL", ZeroPage, Rol, 5, false),
        0x28 => instr("PLP", Implied, Plp, 4, false),
        0x29 => instr("AND", Immediate, And, 2, false),
        0x2A => instr("ROL", Accumulator, Rol, 2, false),
        0x2C => instr("BIT", Absolute, Bit, 4, false),
        0x2D => instr("AND", Absolute, And, 4, false),
        0x2E => instr("ROL", Absolute, Rol, 6, false),

        0x30 => instr("BMI", Relative, Bmi, 2, false),
        0x31 => instr("AND", IndirectIndexedY, And, 5, true),
        0x35 => instr("AND", ZeroPageX, And, 4, false),
        0x36 => instr("ROL", ZeroPageX, Rol, 6, false),
        0x38 => instr("SEC", Implied, Sec, 2, false),
        0x39 => instr("AND", AbsoluteY, And, 4, true),
        0x3D => instr("AND", AbsoluteX, And, 4, true),
        0x3E => instr("ROL", AbsoluteX, Rol, 7, false),

        0x40 => instr("RTI", Implied, Rti, 6, false),
        0x41 => instr("EOR", IndexedIndirectX, Eor, 6, false),
        0x45 => instr("EOR", ZeroPage, Eor, 3, false),
        0x46 => instr("LSR", ZeroPage, Lsr, 5, false),
        0x48 => instr("PHA", Implied, Pha, 3, false),
        0x49 => instr("EOR", Immediate, Eor, 2, false),
        0x4A => instr("LSR", Accumulator, Lsr, 2, false),
        0x4C => instr("JMP", Absolute, Jmp, 3, false),
        0x4D => instr("EOR", Absolute, Eor, 4, false),
        0x4E => instr("LSR", Absolute, Lsr, 6, false),

        0x50 => instr("BVC", Relative, Bvc, 2, false),
        0x51 => instr("EOR", IndirectIndexedY, Eor, 5, true),
        0x55 => instr("EOR", ZeroPageX, Eor, 4, false),
        0x56 => instr("LSR", ZeroPageX, Lsr, 6, false),
        0x58 => instr("CLI", Implied, Cli, 2, false),
        0x59 => instr("EOR", AbsoluteY, Eor, 4, true),
        0x5D => instr("EOR", AbsoluteX, Eor, 4, true),
        0x5E => instr("LSR", AbsoluteX, Lsr, 7, false),

        0x60 => instr("RTS", Implied, Rts, 6, false),
        0x61 => instr("ADC", IndexedIndirectX, Adc, 6, false),
        0x65 => instr("ADC", ZeroPage, Adc, 3, false),
        0x66 => instr("ROR", ZeroPage, Ror, 5, false),
        0x68 => instr("PLA", Implied, Pla, 4, false),
        0x69 => instr("ADC", Immediate, Adc, 2, false),
        0x6A => instr("ROR", Accumulator, Ror, 2, false),
        0x6C => instr("JMP", Indirect, Jmp, 5, false),
        0x6D => instr("ADC", Absolute, Adc, 4, false),
        0x6E => instr("ROR", Absolute, Ror, 6, false),

        0x70 => instr("BVS", Relative, Bvs, 2, false),
        0x71 => instr("ADC", IndirectIndexedY, Adc, 5, true),
        0x75 => instr("ADC", ZeroPageX, Adc, 4, false),
        0x76 => instr("ROR", ZeroPageX, Ror, 6, false),
        0x78 => instr("SEI", Implied, Sei, 2, false),
        0x79 => instr("ADC", AbsoluteY, Adc, 4, true),
        0x7D => instr("ADC", AbsoluteX, Adc, 4, true),
        0x7E => instr("ROR", AbsoluteX, Ror, 7, false),

        0x81 => instr("STA", IndexedIndirectX, Sta, 6, false),
        0x84 => instr("STY", ZeroPage, Sty, 3, false),
        0x85 => instr("STA", ZeroPage, Sta, 3, false),
        0x86 => instr("STX", ZeroPage, Stx, 3, false),
        0x88 => instr("DEY", Implied, Dey, 2, false),
        0x8A => instr("TXA", Implied, Txa, 2, false),
        0x8C => instr("STY", Absolute, Sty, 4, false),
        0x8D => instr("STA", Absolute, Sta, 4, false),
        0x8E => instr("STX", Absolute, Stx, 4, false),

        0x90 => instr("BCC", Relative, Bcc, 2, false),
        0x91 => instr("STA", IndirectIndexedY, Sta, 6, false),
        0x94 => instr("STY", ZeroPageX, Sty, 4, false),
        0x95 => instr("STA", ZeroPageX, Sta, 4, false),
        0x96 => instr("STX", ZeroPageY, Stx, 4, false),
        0x98 => instr("TYA", Implied, Tya, 2, false),
        0x99 => instr("STA", AbsoluteY, Sta, 5, false),
        0x9A => instr("TXS", Implied, Txs, 2, false),
        0x9D => instr("STA", AbsoluteX, Sta, 5, false),

        0xA0 => instr("LDY", Immediate, Ldy, 2, false),
        0xA1 => instr("LDA", IndexedIndirectX, Lda, 6, false),
        0xA2 => instr("LDX", Immediate, Ldx, 2, false),
        0xA4 => instr("LDY", ZeroPage, Ldy, 3, false),
        0xA5 => instr("LDA", ZeroPage, Lda, 3, false),
        0xA6 => instr("LDX", ZeroPage, Ldx, 3, false),
        0xA8 => instr("TAY", Implied, Tay, 2, false),
        0xA9 => instr("LDA", Immediate, Lda, 2, false),
        0xAA => instr("TAX", Implied, Tax, 2, false),
        0xAC => instr("LDY", Absolute, Ldy, 4, false),
        0xAD => instr("LDA", Absolute, Lda, 4, false),
        0xAE => instr("LDX", Absolute, Ldx, 4, false),

        0xB0 => instr("BCS", Relative, Bcs, 2, false),
        0xB1 => instr("LDA", IndirectIndexedY, Lda, 5, true),
        0xB4 => instr("LDY", ZeroPageX, Ldy, 4, false),
        0xB5 => instr("LDA", ZeroPageX, Lda, 4, false),
        0xB6 => instr("LDX", ZeroPageY, Ldx, 4, false),
        0xB8 => instr("CLV", Implied, Clv, 2, false),
        0xB9 => instr("LDA", AbsoluteY, Lda, 4, true),
        0xBA => instr("TSX", Implied, Tsx, 2, false),
        0xBC => instr("LDY", AbsoluteX, Ldy, 4, true),
        0xBD => instr("LDA", AbsoluteX, Lda, 4, true),
        0xBE => instr("LDX", AbsoluteY, Ldx, 4, true),

        0xC0 => instr("CPY", Immediate, Cpy, 2, false),
        0xC1 => instr("CMP", IndexedIndirectX, Cmp, 6, false),
        0xC4 => instr("CPY", ZeroPage, Cpy, 3, false),
        0xC5 => instr("CMP", ZeroPage, Cmp, 3, false),
        0xC6 => instr("DEC", ZeroPage, Dec, 5, false),
        0xC8 => instr("INY", Implied, Iny, 2, false),
        0xC9 => instr("CMP", Immediate, Cmp, 2, false),
        0xCA => instr("DEX", Implied, Dex, 2, false),
        0xCC => instr("CPY", Absolute, Cpy, 4, false),
        0xCD => instr("CMP", Absolute, Cmp, 4, false),
        0xCE => instr("DEC", Absolute, Dec, 6, false),

        0xD0 => instr("BNE", Relative, Bne, 2, false),
        0xD1 => instr("CMP", IndirectIndexedY, Cmp, 5, true),
        0xD5 => instr("CMP", ZeroPageX, Cmp, 4, false),
        0xD6 => instr("DEC", ZeroPageX, Dec, 6, false),
        0xD8 => instr("CLD", Implied, Cld, 2, false),
        0xD9 => instr("CMP", AbsoluteY, Cmp, 4, true),
        0xDD => instr("CMP", AbsoluteX, Cmp, 4, true),
        0xDE => instr("DEC", AbsoluteX, Dec, 7, false),

        0xE0 => instr("CPX", Immediate, Cpx, 2, false),
        0xE1 => instr("SBC", IndexedIndirectX, Sbc, 6, false),
        0xE4 => instr("CPX", ZeroPage, Cpx, 3, false),
        0xE5 => instr("SBC", ZeroPage, Sbc, 3, false),
        0xE6 => instr("INC", ZeroPage, Inc, 5, false),
        0xE8 => instr("INX", Implied, Inx, 2, false),
        0xE9 => instr("SBC", Immediate, Sbc, 2, false),
        0xEA => instr("NOP", Implied, Nop, 2, false),
        0xEC => instr("CPX", Absolute, Cpx, 4, false),
        0xED => instr("SBC", Absolute, Sbc, 4, false),
        0xEE => instr("INC", Absolute, Inc, 6, false),

        0xF0 => instr("BEQ", Relative, Beq, 2, false),
        0xF1 => instr("SBC", IndirectIndexedY, Sbc, 5, true),
        0xF5 => instr("SBC", ZeroPageX, Sbc, 4, false),
        0xF6 => instr("INC", ZeroPageX, Inc, 6, false),
        0xF8 => instr("SED", Implied, Sed, 2, false),
        0xF9 => instr("SBC", AbsoluteY, Sbc, 4, true),
        0xFD => instr("SBC", AbsoluteX, Sbc, 4, true),
        0xFE => instr("INC", AbsoluteX, Inc, 7, false),

        _ => return None,
    })
}
