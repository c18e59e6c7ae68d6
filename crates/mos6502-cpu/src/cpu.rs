//! The 6502 register file and fetch/decode/execute loop.

use crate::addressing::{page_crossed, AddressingMode};
use crate::bus::Bus;
use crate::opcodes::{decode, Operation};
use crate::status::Status;
use crate::{vectors, CpuError, Result};

/// The MOS 6502 register file and execution engine.
///
/// A `Cpu` never stores a reference to its bus; every operation that needs
/// memory access borrows one for the duration of the call. This keeps the
/// CPU trivially testable against throwaway `Bus` implementations and
/// avoids the CPU/bus ownership cycle a naive "bus owns CPU, CPU owns bus"
/// design would create; a `Machine`-level aggregate owns both.
#[derive(Debug, Clone)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer (indexes into page one, `0x0100..=0x01FF`).
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    status: Status,
    cycles: u64,
    remaining_cycles: u8,
    nmi_pending: bool,
    irq_line: bool,
    jam: Option<CpuError>,
}

impl Cpu {
    /// Construct a CPU in its power-on state.
    ///
    /// Most callers should follow this with [`Cpu::reset`] once a bus is
    /// available, since `PC` is not meaningful until the reset vector has
    /// been read.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFF,
            pc: 0,
            status: Status::POWER_ON,
            cycles: 0,
            remaining_cycles: 0,
            nmi_pending: false,
            irq_line: false,
            jam: None,
        }
    }

    /// Perform the reset sequence: zero the general-purpose registers, set
    /// `SP` to `0xFF`, set `I` and `U` in the status register, and load `PC`
    /// from the reset vector at `0xFFFC`/`0xFFFD`.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFF;
        self.status = Status::POWER_ON;
        self.pc = bus.read_u16(vectors::RESET);
        self.remaining_cycles = 0;
        self.nmi_pending = false;
        self.jam = None;
    }

    /// Request a non-maskable interrupt. Latched until the next instruction
    /// boundary, at which point it takes priority over a pending IRQ.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Set or clear the IRQ line. Level-triggered: stays asserted until the
    /// host (or the device behind it) clears it, same as real hardware.
    pub fn set_irq(&mut self, active: bool) {
        self.irq_line = active;
    }

    /// Advance by exactly one master cycle.
    ///
    /// If the "remaining cycles" counter is nonzero, this only decrements
    /// it. At zero, this polls for a pending interrupt (NMI first, then a
    /// level IRQ if `I` is clear); failing that it fetches, decodes, and
    /// fully applies the next instruction, charging its cycle cost to the
    /// counter (less the one cycle this call itself accounts for).
    ///
    /// An undefined opcode is a fatal error: once encountered, the CPU
    /// latches it and every subsequent `clock()` call returns the same
    /// error without making further progress, until the host replaces this
    /// `Cpu` or the error is otherwise handled externally.
    pub fn clock(&mut self, bus: &mut impl Bus) -> Result<()> {
        if let Some(err) = &self.jam {
            return Err(err.clone());
        }

        if self.remaining_cycles == 0 {
            if self.nmi_pending {
                self.nmi_pending = false;
                self.dispatch_interrupt(bus, vectors::NMI, false);
                self.remaining_cycles = 6;
            } else if self.irq_line && !self.status.contains(Status::I) {
                self.dispatch_interrupt(bus, vectors::IRQ, false);
                self.remaining_cycles = 6;
            } else {
                match self.fetch_and_execute(bus) {
                    Ok(total_cycles) => self.remaining_cycles = total_cycles - 1,
                    Err(err) => {
                        self.jam = Some(err.clone());
                        self.cycles += 1;
                        return Err(err);
                    }
                }
            }
        } else {
            self.remaining_cycles -= 1;
        }

        self.cycles += 1;
        Ok(())
    }

    /// Run `clock()` until the instruction (or interrupt dispatch) begun by
    /// this call completes, i.e. until the remaining-cycles counter
    /// transitions from nonzero back to zero. Returns the number of cycles
    /// consumed.
    ///
    /// This is the debugger's "step" operation from the Machine API: a
    /// convenience wrapper over `clock()`, not a different execution model.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u8> {
        let start = self.cycles;
        self.clock(bus)?;
        while self.remaining_cycles > 0 {
            self.clock(bus)?;
        }
        Ok((self.cycles - start) as u8)
    }

    /// Accumulator.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.a
    }

    /// X index register.
    #[must_use]
    pub fn x(&self) -> u8 {
        self.x
    }

    /// Y index register.
    #[must_use]
    pub fn y(&self) -> u8 {
        self.y
    }

    /// Stack pointer.
    #[must_use]
    pub fn sp(&self) -> u8 {
        self.sp
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Status register snapshot.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Total master cycles elapsed since construction. `reset()` does not
    /// itself reset this counter: it free-runs across resets, which is
    /// what a trace log wants to correlate against.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Cycles remaining before the next instruction boundary. Zero exactly
    /// at instruction boundaries.
    #[must_use]
    pub fn remaining_cycles(&self) -> u8 {
        self.remaining_cycles
    }

    /// The fatal error latched by an undefined opcode, if any.
    #[must_use]
    pub fn jam(&self) -> Option<&CpuError> {
        self.jam.as_ref()
    }

    /// Debugger override: force `PC`.
    pub fn set_pc(&mut self, addr: u16) {
        self.pc = addr;
    }

    /// Debugger override: force `SP`.
    pub fn set_sp(&mut self, sp: u8) {
        self.sp = sp;
    }

    /// Debugger override: set or clear a single status flag.
    pub fn set_flag(&mut self, flag: Status, value: bool) {
        self.status.set_flag(flag, value);
    }

    /// Debugger override: force the accumulator.
    pub fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    /// Debugger override: force the X register.
    pub fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    /// Debugger override: force the Y register.
    pub fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    fn dispatch_interrupt(&mut self, bus: &mut impl Bus, vector: u16, brk: bool) {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(brk));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
    }

    fn fetch_and_execute(&mut self, bus: &mut impl Bus) -> Result<u8> {
        let opcode_pc = self.pc;
        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let Some(info) = decode(opcode) else {
            log::warn!("CPU halted at {opcode_pc:#06X}: undefined opcode {opcode:#04X}");
            return Err(CpuError::InvalidOpcode(opcode, opcode_pc));
        };

        let (addr, crossed) = info.mode.resolve(&mut self.pc, self.x, self.y, bus);
        let page_cross_extra = u8::from(info.extra_on_page_cross && crossed);
        let branch_extra = self.execute(info.op, info.mode, addr, bus);

        Ok(info.base_cycles + page_cross_extra + branch_extra)
    }

    #[allow(clippy::too_many_lines)]
    fn execute(
        &mut self,
        op: Operation,
        mode: AddressingMode,
        addr: u16,
        bus: &mut impl Bus,
    ) -> u8 {
        match op {
            Operation::Lda => {
                self.a = bus.read(addr);
                self.status.set_zn(self.a);
            }
            Operation::Ldx => {
                self.x = bus.read(addr);
                self.status.set_zn(self.x);
            }
            Operation::Ldy => {
                self.y = bus.read(addr);
                self.status.set_zn(self.y);
            }
            Operation::Sta => bus.write(addr, self.a),
            Operation::Stx => bus.write(addr, self.x),
            Operation::Sty => bus.write(addr, self.y),

            Operation::Tax => {
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Operation::Tay => {
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Operation::Txa => {
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Operation::Tya => {
                self.a = self.y;
                self.status.set_zn(self.a);
            }
            Operation::Tsx => {
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Operation::Txs => self.sp = self.x,

            Operation::Pha => self.push(bus, self.a),
            Operation::Pla => {
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Operation::Php => {
                let byte = self.status.to_stack_byte(true);
                self.push(bus, byte);
            }
            Operation::Plp => {
                let byte = self.pull(bus);
                self.status = Status::from_stack_byte(byte);
            }

            Operation::Adc => {
                let value = bus.read(addr);
                self.do_adc(value);
            }
            Operation::Sbc => {
                let value = bus.read(addr);
                self.do_adc(!value);
            }
            Operation::Cmp => {
                let value = bus.read(addr);
                self.do_compare(self.a, value);
            }
            Operation::Cpx => {
                let value = bus.read(addr);
                self.do_compare(self.x, value);
            }
            Operation::Cpy => {
                let value = bus.read(addr);
                self.do_compare(self.y, value);
            }

            Operation::And => {
                self.a &= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Operation::Ora => {
                self.a |= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Operation::Eor => {
                self.a ^= bus.read(addr);
                self.status.set_zn(self.a);
            }
            Operation::Bit => {
                let m = bus.read(addr);
                self.status.set(Status::Z, (self.a & m) == 0);
                self.status.set(Status::N, m & 0x80 != 0);
                self.status.set(Status::V, m & 0x40 != 0);
            }

            Operation::Asl => self.shift_rotate(mode, addr, bus, |_cpu, input| {
                let carry = input & 0x80 != 0;
                (input << 1, carry)
            }),
            Operation::Lsr => self.shift_rotate(mode, addr, bus, |_cpu, input| {
                let carry = input & 0x01 != 0;
                (input >> 1, carry)
            }),
            Operation::Rol => self.shift_rotate(mode, addr, bus, |cpu, input| {
                let old_carry = u8::from(cpu.status.contains(Status::C));
                let carry = input & 0x80 != 0;
                ((input << 1) | old_carry, carry)
            }),
            Operation::Ror => self.shift_rotate(mode, addr, bus, |cpu, input| {
                let old_carry = u8::from(cpu.status.contains(Status::C));
                let carry = input & 0x01 != 0;
                ((input >> 1) | (old_carry << 7), carry)
            }),

            Operation::Inc => {
                let result = bus.read(addr).wrapping_add(1);
                bus.write(addr, result);
                self.status.set_zn(result);
            }
            Operation::Dec => {
                let result = bus.read(addr).wrapping_sub(1);
                bus.write(addr, result);
                self.status.set_zn(result);
            }
            Operation::Inx => {
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Operation::Iny => {
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Operation::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Operation::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            Operation::Bcc => return self.branch(!self.status.contains(Status::C), addr),
            Operation::Bcs => return self.branch(self.status.contains(Status::C), addr),
            Operation::Beq => return self.branch(self.status.contains(Status::Z), addr),
            Operation::Bne => return self.branch(!self.status.contains(Status::Z), addr),
            Operation::Bmi => return self.branch(self.status.contains(Status::N), addr),
            Operation::Bpl => return self.branch(!self.status.contains(Status::N), addr),
            Operation::Bvs => return self.branch(self.status.contains(Status::V), addr),
            Operation::Bvc => return self.branch(!self.status.contains(Status::V), addr),

            Operation::Jmp => self.pc = addr,
            Operation::Jsr => {
                let return_addr = self.pc.wrapping_sub(1);
                self.push_u16(bus, return_addr);
                self.pc = addr;
            }
            Operation::Rts => {
                let lo = u16::from(self.pull(bus));
                let hi = u16::from(self.pull(bus));
                self.pc = ((hi << 8) | lo).wrapping_add(1);
            }
            Operation::Brk => {
                self.pc = self.pc.wrapping_add(1);
                self.dispatch_interrupt(bus, vectors::IRQ, true);
            }
            Operation::Rti => {
                let status_byte = self.pull(bus);
                self.status = Status::from_stack_byte(status_byte);
                let lo = u16::from(self.pull(bus));
                let hi = u16::from(self.pull(bus));
                self.pc = (hi << 8) | lo;
            }

            Operation::Clc => self.status.set(Status::C, false),
            Operation::Sec => self.status.set(Status::C, true),
            Operation::Cli => self.status.set(Status::I, false),
            Operation::Sei => self.status.set(Status::I, true),
            Operation::Cld => self.status.set(Status::D, false),
            Operation::Sed => self.status.set(Status::D, true),
            Operation::Clv => self.status.set(Status::V, false),

            Operation::Nop => {}
        }
        0
    }

    fn shift_rotate(
        &mut self,
        mode: AddressingMode,
        addr: u16,
        bus: &mut impl Bus,
        f: impl FnOnce(&Self, u8) -> (u8, bool),
    ) {
        let input = if mode == AddressingMode::Accumulator {
            self.a
        } else {
            bus.read(addr)
        };
        let (result, carry) = f(self, input);
        self.status.set(Status::C, carry);
        self.status.set_zn(result);
        if mode == AddressingMode::Accumulator {
            self.a = result;
        } else {
            bus.write(addr, result);
        }
    }

    fn do_adc(&mut self, value: u8) {
        let sum = u16::from(self.a) + u16::from(value) + u16::from(self.status.contains(Status::C));
        let result = (sum & 0xFF) as u8;
        self.status.set(Status::C, sum > 0xFF);
        let overflow = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.status.set(Status::V, overflow);
        self.a = result;
        self.status.set_zn(self.a);
    }

    fn do_compare(&mut self, register: u8, value: u8) {
        let result = register.wrapping_sub(value);
        self.status.set(Status::C, register >= value);
        self.status.set_zn(result);
    }

    /// Taken/not-taken branch cost: 0 extra if not taken (base 2 already
    /// charged by the descriptor), 1 if taken, 2 if taken and the target
    /// is on a different page than the instruction after the branch.
    fn branch(&mut self, taken: bool, target: u16) -> u8 {
        if !taken {
            return 0;
        }
        let crossed = page_crossed(self.pc, target);
        self.pc = target;
        1 + u8::from(crossed)
    }

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
