//! Single-instruction disassembly.
//!
//! Disassembly reads memory through [`Bus::peek`] only. It never fires a
//! hardware register's read side effects, so tracing a running system
//! doesn't perturb it.

use crate::addressing::AddressingMode;
use crate::opcodes::decode;
use crate::Bus;

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembled {
    /// Address the instruction starts at.
    pub address: u16,
    /// Raw opcode + operand bytes, as read from memory.
    pub bytes: Vec<u8>,
    /// Assembler mnemonic, or `"???"` for an undefined opcode.
    pub mnemonic: &'static str,
    /// Formatted operand, e.g. `#$42`, `$10,X`, `($1234),Y`.
    pub operand: String,
    /// `"<mnemonic> <operand>"`, or a fallback line for an undefined opcode.
    pub formatted: String,
    /// Total instruction length in bytes, including the opcode.
    pub length: u8,
    /// Base cycle cost (before any page-cross or branch penalty).
    pub cycles: u8,
}

/// Disassemble the instruction at `addr`.
///
/// An undefined opcode byte produces a one-byte `Disassembled` with
/// mnemonic `"???"` rather than failing. The debugger should be able to
/// show a raw hex dump even where the interpreter itself would refuse to
/// execute.
#[must_use]
pub fn disassemble(addr: u16, bus: &impl Bus) -> Disassembled {
    let opcode = bus.peek(addr);
    let Some(info) = decode(opcode) else {
        return Disassembled {
            address: addr,
            bytes: vec![opcode],
            mnemonic: "???",
            operand: String::new(),
            formatted: format!("${addr:04X}: {opcode:02X}        ??? (undefined)"),
            length: 1,
            cycles: 0,
        };
    };

    let length = 1 + info.mode.operand_bytes();
    let mut raw = Vec::with_capacity(length as usize);
    raw.push(opcode);
    for offset in 1..length {
        raw.push(bus.peek(addr.wrapping_add(u16::from(offset))));
    }

    let operand = format_operand(info.mode, addr, &raw);
    let formatted = if operand.is_empty() {
        format!("{}", info.mnemonic)
    } else {
        format!("{} {operand}", info.mnemonic)
    };

    Disassembled {
        address: addr,
        bytes: raw,
        mnemonic: info.mnemonic,
        operand,
        formatted,
        length,
        cycles: info.base_cycles,
    }
}

fn format_operand(mode: AddressingMode, addr: u16, raw: &[u8]) -> String {
    match mode {
        AddressingMode::Implied => String::new(),
        AddressingMode::Accumulator => "A".to_string(),
        AddressingMode::Immediate => format!("#${:02X}", raw[1]),
        AddressingMode::ZeroPage => format!("${:02X}", raw[1]),
        AddressingMode::ZeroPageX => format!("${:02X},X", raw[1]),
        AddressingMode::ZeroPageY => format!("${:02X},Y", raw[1]),
        AddressingMode::Absolute => format!("${:04X}", absolute(raw)),
        AddressingMode::AbsoluteX => format!("${:04X},X", absolute(raw)),
        AddressingMode::AbsoluteY => format!("${:04X},Y", absolute(raw)),
        AddressingMode::Indirect => format!("(${:04X})", absolute(raw)),
        AddressingMode::IndexedIndirectX => format!("(${:02X},X)", raw[1]),
        AddressingMode::IndirectIndexedY => format!("(${:02X}),Y", raw[1]),
        AddressingMode::Relative => {
            let offset = raw[1] as i8;
            let target = addr.wrapping_add(2).wrapping_add(offset as u16);
            format!("${target:04X}")
        }
    }
}

fn absolute(raw: &[u8]) -> u16 {
    u16::from(raw[1]) | (u16::from(raw[2]) << 8)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestBus {
        mem: [u8; 0x10000],
    }

    impl Bus for TestBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }
        fn write(&mut self, addr: u16, value: u8) {
            self.mem[addr as usize] = value;
        }
        fn peek(&self, addr: u16) -> u8 {
            self.mem[addr as usize]
        }
    }

    fn bus_with(bytes: &[(u16, u8)]) -> TestBus {
        let mut bus = TestBus { mem: [0; 0x10000] };
        for &(addr, value) in bytes {
            bus.mem[addr as usize] = value;
        }
        bus
    }

    #[test]
    fn test_disassembles_immediate_load() {
        let bus = bus_with(&[(0x8000, 0xA9), (0x8001, 0x42)]);
        let d = disassemble(0x8000, &bus);
        assert_eq!(d.mnemonic, "LDA");
        assert_eq!(d.operand, "#$42");
        assert_eq!(d.formatted, "LDA #$42");
        assert_eq!(d.length, 2);
    }

    #[test]
    fn test_disassembles_indirect_indexed_y() {
        let bus = bus_with(&[(0x8000, 0xB1), (0x8001, 0x10)]);
        let d = disassemble(0x8000, &bus);
        assert_eq!(d.operand, "($10),Y");
    }

    #[test]
    fn test_disassembles_relative_branch_with_resolved_target() {
        let bus = bus_with(&[(0x8000, 0xF0), (0x8001, 0x05)]);
        let d = disassemble(0x8000, &bus);
        assert_eq!(d.mnemonic, "BEQ");
        assert_eq!(d.operand, "$8007");
    }

    #[test]
    fn test_undefined_opcode_disassembles_as_placeholder() {
        let bus = bus_with(&[(0x8000, 0x02)]);
        let d = disassemble(0x8000, &bus);
        assert_eq!(d.mnemonic, "???");
        assert_eq!(d.length, 1);
    }

    #[test]
    fn test_disassembles_indirect_jmp() {
        let bus = bus_with(&[(0x8000, 0x6C), (0x8001, 0xFF), (0x8002, 0x07)]);
        let d = disassemble(0x8000, &bus);
        assert_eq!(d.operand, "($07FF)");
    }
}
