//! The host-facing aggregate: bus + CPU + debugger conveniences.

use std::collections::BTreeSet;

use mos6502_cpu::{disassemble, Bus, Cpu, CpuError, Disassembled, Status};
use mos6502_mappers::{Mapper, Nrom, Rom};

use crate::bus::SystemBus;
use crate::MachineError;

/// Owns the system bus and CPU together, and layers a breakpoint- and
/// disassembly-aware debugger API on top.
///
/// No global debugger singleton: the host owns a `Machine` value directly
/// and calls its methods, the same way it would own any other object.
pub struct Machine {
    bus: SystemBus,
    cpu: Cpu,
    breakpoints: BTreeSet<u16>,
    instruction_count: u64,
    running: bool,
}

impl Machine {
    /// A machine with no cartridge inserted and an un-reset CPU.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bus: SystemBus::new(),
            cpu: Cpu::new(),
            breakpoints: BTreeSet::new(),
            instruction_count: 0,
            running: false,
        }
    }

    /// Parse an iNES image and insert it as the active cartridge.
    ///
    /// The CPU is not reset automatically. Per the Machine API contract,
    /// the next explicit `reset()` re-reads the vectors from the new
    /// cartridge.
    ///
    /// # Errors
    ///
    /// Propagates [`mos6502_mappers::RomError`] for a malformed or
    /// unsupported image.
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<(), MachineError> {
        let rom = Rom::parse(bytes)?;
        let prg = rom.prg.clone();
        let prg_len = prg.len();
        self.bus.insert_cartridge(Box::new(Nrom::new(rom)), prg);
        log::debug!("cartridge loaded, {prg_len} PRG byte(s)");
        Ok(())
    }

    /// Install an already-constructed mapper directly, bypassing iNES
    /// parsing. Useful for tests that build a cartridge image in memory.
    pub fn insert_cartridge(&mut self, mapper: Box<dyn Mapper>, prg: Vec<u8>) {
        self.bus.insert_cartridge(mapper, prg);
    }

    /// Remove the active cartridge, reverting to the "no cartridge" state
    /// where every cartridge-range read returns 0.
    pub fn remove_cartridge(&mut self) {
        self.bus.remove_cartridge();
    }

    /// Perform the reset sequence.
    pub fn reset(&mut self) {
        self.cpu.reset(&mut self.bus);
        self.instruction_count = 0;
    }

    /// Advance one master cycle.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidOpcode`] if this tick fetches an
    /// undefined opcode; the CPU is left jammed.
    pub fn clock(&mut self) -> Result<(), CpuError> {
        self.cpu.clock(&mut self.bus)
    }

    /// Advance until the remaining-cycles counter transitions back to
    /// zero, the debugger's "step" operation.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidOpcode`] if the instruction fetched
    /// is undefined.
    pub fn step_instruction(&mut self) -> Result<u8, CpuError> {
        let cycles = self.cpu.step(&mut self.bus)?;
        self.instruction_count += 1;
        Ok(cycles)
    }

    /// Read a byte through the bus (for tooling; may differ from `peek`
    /// if a future bus implementation gives reads side effects).
    pub fn read(&mut self, addr: u16) -> u8 {
        self.bus.read(addr)
    }

    /// Write a byte through the bus.
    pub fn write(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, value);
    }

    /// Read a range of addresses without side effects.
    #[must_use]
    pub fn read_memory_range(&self, start: u16, end: u16) -> Vec<u8> {
        (start..=end).map(|addr| self.bus.peek(addr)).collect()
    }

    /// Accumulator.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.cpu.a()
    }

    /// X index register.
    #[must_use]
    pub fn x(&self) -> u8 {
        self.cpu.x()
    }

    /// Y index register.
    #[must_use]
    pub fn y(&self) -> u8 {
        self.cpu.y()
    }

    /// Stack pointer.
    #[must_use]
    pub fn sp(&self) -> u8 {
        self.cpu.sp()
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.cpu.pc()
    }

    /// Status register snapshot.
    #[must_use]
    pub fn status(&self) -> Status {
        self.cpu.status()
    }

    /// Total master cycles elapsed.
    #[must_use]
    pub fn cycle_count(&self) -> u64 {
        self.cpu.cycles()
    }

    /// Total instructions completed via `step_instruction`/`run`.
    #[must_use]
    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    /// Debugger override: force `PC`.
    pub fn set_pc(&mut self, addr: u16) {
        self.cpu.set_pc(addr);
    }

    /// Debugger override: force `SP`.
    pub fn set_sp(&mut self, sp: u8) {
        self.cpu.set_sp(sp);
    }

    /// Debugger override: set or clear a single status flag.
    pub fn set_flag(&mut self, flag: Status, value: bool) {
        self.cpu.set_flag(flag, value);
    }

    /// Add a breakpoint address.
    pub fn breakpoint_add(&mut self, addr: u16) {
        self.breakpoints.insert(addr);
    }

    /// Remove a breakpoint address.
    pub fn breakpoint_remove(&mut self, addr: u16) {
        self.breakpoints.remove(&addr);
    }

    /// Remove every breakpoint.
    pub fn breakpoint_clear(&mut self) {
        self.breakpoints.clear();
    }

    /// Whether `addr` currently has a breakpoint.
    #[must_use]
    pub fn breakpoint_has(&self, addr: u16) -> bool {
        self.breakpoints.contains(&addr)
    }

    /// All breakpoint addresses, in ascending order.
    #[must_use]
    pub fn breakpoints(&self) -> Vec<u16> {
        self.breakpoints.iter().copied().collect()
    }

    /// Disassemble the single instruction at `addr`.
    #[must_use]
    pub fn disassemble_instruction(&self, addr: u16) -> Disassembled {
        disassemble(addr, &self.bus)
    }

    /// Disassemble consecutive instructions starting at `start`, stopping
    /// once an instruction's address exceeds `end`.
    #[must_use]
    pub fn disassemble_range(&self, start: u16, end: u16) -> Vec<Disassembled> {
        let mut out = Vec::new();
        let mut addr = start;
        loop {
            let d = disassemble(addr, &self.bus);
            let next = addr.wrapping_add(u16::from(d.length.max(1)));
            out.push(d);
            if addr > end || next <= addr {
                break;
            }
            addr = next;
            if addr > end {
                break;
            }
        }
        out
    }

    /// Disassemble `before` instructions preceding the current `PC`, the
    /// instruction at `PC` itself, and `after` instructions following it.
    ///
    /// Instructions are variable-length, so there's no exact way to know
    /// where an instruction boundary sits strictly before `PC` without
    /// having decoded forward from a known boundary. This resyncs by
    /// disassembling forward from a conservative earlier address (3 bytes
    /// per instruction, the longest encoding) and keeping only the last
    /// `before` results, the same heuristic most 6502 debuggers use.
    #[must_use]
    pub fn disassemble_around_pc(&self, before: usize, after: usize) -> Vec<Disassembled> {
        let pc = self.cpu.pc();
        let lookback = u16::try_from(before.saturating_mul(3)).unwrap_or(u16::MAX);
        let scan_start = pc.saturating_sub(lookback);

        let mut preceding = Vec::new();
        let mut addr = scan_start;
        while addr < pc {
            let d = disassemble(addr, &self.bus);
            let next = addr.wrapping_add(u16::from(d.length.max(1)));
            preceding.push(d);
            if next <= addr {
                break;
            }
            addr = next;
        }
        let keep_from = preceding.len().saturating_sub(before);
        let mut result: Vec<_> = preceding.split_off(keep_from);

        let mut addr = pc;
        for _ in 0..=after {
            let d = disassemble(addr, &self.bus);
            let next = addr.wrapping_add(u16::from(d.length.max(1)));
            result.push(d);
            if next <= addr {
                break;
            }
            addr = next;
        }
        result
    }

    /// Snapshot of the active stack contents, most-recently-pushed first
    /// (i.e. addresses `SP+1..=0xFF` in page one, ascending).
    #[must_use]
    pub fn get_stack(&self) -> Vec<u8> {
        let sp = self.cpu.sp();
        if sp == 0xFF {
            return Vec::new();
        }
        (u16::from(sp) + 1..=0xFF)
            .map(|offset| self.bus.peek(0x0100 | offset))
            .collect()
    }

    /// Start (or resume) free-running execution: repeatedly step until a
    /// breakpoint address is hit, an undefined opcode is fetched, or
    /// `stop()` is called.
    ///
    /// # Errors
    ///
    /// Returns [`CpuError::InvalidOpcode`] if execution hits one.
    pub fn run(&mut self) -> Result<(), CpuError> {
        self.running = true;
        while self.running {
            self.step_instruction()?;
            if self.breakpoints.contains(&self.cpu.pc()) {
                self.running = false;
            }
        }
        Ok(())
    }

    /// Request that a `run()` loop stop after its current instruction.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether a `run()` loop is currently active.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mos6502_mappers::{Mirroring, RomHeader};

    fn cart_with_program(prg: &[u8]) -> (Box<dyn Mapper>, Vec<u8>) {
        let mut bytes = vec![0u8; 16 * 1024];
        bytes[..prg.len()].copy_from_slice(prg);
        let rom = Rom {
            header: RomHeader {
                prg_banks: 1,
                chr_banks: 1,
                has_trainer: false,
                mapper_id: 0,
                mirroring: Mirroring::Horizontal,
            },
            prg: bytes,
            chr: vec![0; 8 * 1024],
        };
        let prg = rom.prg.clone();
        (Box::new(Nrom::new(rom)), prg)
    }

    fn machine_at(pc: u16, prg: &[u8]) -> Machine {
        let mut machine = Machine::new();
        let (mapper, bytes) = cart_with_program(prg);
        machine.insert_cartridge(mapper, bytes);
        machine.reset();
        machine.set_pc(pc);
        machine
    }

    #[test]
    fn test_reset_reads_vector_from_inserted_cartridge() {
        let mut prg = vec![0xEAu8; 16 * 1024];
        prg[0x3FFC] = 0x00; // reset vector low, mirrored at 0xFFFC
        prg[0x3FFD] = 0x80; // reset vector high -> 0x8000
        let mut machine = Machine::new();
        let (mapper, bytes) = cart_with_program(&prg);
        machine.insert_cartridge(mapper, bytes);

        machine.reset();

        assert_eq!(machine.pc(), 0x8000);
    }

    #[test]
    fn test_step_instruction_runs_one_instruction_and_counts_it() {
        let mut machine = machine_at(0x8000, &[0xA9, 0x42]); // LDA #$42
        let cycles = machine.step_instruction().unwrap();
        assert_eq!(cycles, 2);
        assert_eq!(machine.a(), 0x42);
        assert_eq!(machine.instruction_count(), 1);
    }

    #[test]
    fn test_run_stops_at_a_breakpoint() {
        let mut machine = machine_at(0x8000, &[0xEA, 0xEA, 0xEA, 0xEA]);
        machine.breakpoint_add(0x8002);
        machine.run().unwrap();
        assert_eq!(machine.pc(), 0x8002);
        assert!(!machine.is_running());
    }

    #[test]
    fn test_breakpoint_add_remove_clear_and_has() {
        let mut machine = Machine::new();
        machine.breakpoint_add(0x1234);
        assert!(machine.breakpoint_has(0x1234));
        machine.breakpoint_remove(0x1234);
        assert!(!machine.breakpoint_has(0x1234));

        machine.breakpoint_add(0x1111);
        machine.breakpoint_add(0x2222);
        machine.breakpoint_clear();
        assert!(machine.breakpoints().is_empty());
    }

    #[test]
    fn test_get_stack_reflects_pushes() {
        let mut machine = machine_at(0x8000, &[0x48, 0x48]); // PHA, PHA
        machine.step_instruction().unwrap();
        machine.step_instruction().unwrap();
        let stack = machine.get_stack();
        assert_eq!(stack.len(), 2);
    }

    #[test]
    fn test_disassemble_range_covers_every_instruction() {
        let machine = machine_at(0x8000, &[0xA9, 0x42, 0xAA, 0xEA]);
        let listing = machine.disassemble_range(0x8000, 0x8003);
        let mnemonics: Vec<_> = listing.iter().map(|d| d.mnemonic).collect();
        assert_eq!(mnemonics, ["LDA", "TAX", "NOP"]);
    }

    #[test]
    fn test_disassemble_around_pc_includes_current_instruction() {
        let mut machine = machine_at(0x8000, &[0xEA, 0xEA, 0xA9, 0x42, 0xEA]);
        machine.set_pc(0x8002);
        let listing = machine.disassemble_around_pc(1, 1);
        assert!(listing.iter().any(|d| d.address == 0x8002 && d.mnemonic == "LDA"));
    }

    #[test]
    fn test_load_rom_then_reset_reads_new_vectors() {
        let mut prg = vec![0xEAu8; 16 * 1024];
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x90;
        let mut bytes = vec![b'N', b'E', b'S', 0x1A, 1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        bytes.extend_from_slice(&prg);
        bytes.extend(std::iter::repeat(0).take(8 * 1024));

        let mut machine = Machine::new();
        machine.load_rom(&bytes).unwrap();
        machine.reset();

        assert_eq!(machine.pc(), 0x9000);
    }

    #[test]
    fn test_jsr_then_rts_round_trip_through_machine_api() {
        let mut machine = Machine::new();
        let mut prg = vec![0xEAu8; 16 * 1024];
        // Reset vector -> 0x8000; JSR $8010 and its target both live in the
        // single 16K bank (no mirroring subtlety needed for this round trip).
        prg[0x3FFC] = 0x00;
        prg[0x3FFD] = 0x80;
        prg[0x0000] = 0x20; // JSR
        prg[0x0001] = 0x10;
        prg[0x0002] = 0x80; // -> $8010
        prg[0x0010] = 0x60; // RTS
        let (mapper, bytes) = cart_with_program(&prg);
        machine.insert_cartridge(mapper, bytes);
        machine.reset();

        machine.step_instruction().unwrap(); // JSR
        assert_eq!(machine.pc(), 0x8010);
        assert_eq!(machine.sp(), 0xFD);

        machine.step_instruction().unwrap(); // RTS
        assert_eq!(machine.pc(), 0x8003);
        assert_eq!(machine.sp(), 0xFF);
    }

    #[test]
    fn test_undefined_opcode_surfaces_through_machine_clock() {
        let mut machine = machine_at(0x8000, &[0x02]);
        let err = machine.clock();
        assert!(err.is_err());
    }

    #[test]
    fn test_status_accessor_reflects_reset_state() {
        let machine = machine_at(0x8000, &[0xEA]);
        assert!(machine.status().contains(Status::U));
    }
}
