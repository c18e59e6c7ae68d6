//! The host-facing `Machine` aggregate: bus, CPU, and a debugger API.
//!
//! This crate wires [`mos6502_cpu::Cpu`] to a NES-shaped [`bus::SystemBus`]
//! (RAM mirroring, stubbed PPU/APU register windows, cartridge dispatch) and
//! layers the breakpoint/stepping/disassembly surface a host debugger needs
//! on top, per the "thin inspection layer" contract: the CPU and bus stay
//! ignorant of breakpoints and tracing, and `Machine` is the only thing that
//! knows about them.
//!
//! ```
//! use mos6502_machine::Machine;
//!
//! let mut machine = Machine::new();
//! machine.insert_cartridge(
//!     Box::new(mos6502_mappers::Nrom::new(mos6502_mappers::Rom {
//!         header: mos6502_mappers::RomHeader {
//!             prg_banks: 1,
//!             chr_banks: 1,
//!             has_trainer: false,
//!             mapper_id: 0,
//!             mirroring: mos6502_mappers::Mirroring::Horizontal,
//!         },
//!         prg: vec![0xEA; 16 * 1024],
//!         chr: vec![0; 8 * 1024],
//!     })),
//!     vec![0xEA; 16 * 1024],
//! );
//! machine.reset();
//! machine.step_instruction().unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

mod bus;
mod machine;

pub use bus::SystemBus;
pub use machine::Machine;

// Re-export the pieces a host needs without depending on the leaf crates
// directly.
pub use mos6502_cpu::{disassemble, AddressingMode, Bus, Cpu, CpuError, Disassembled, Status};
pub use mos6502_mappers::{Mapper, Mirroring, Nrom, Rom, RomError, RomHeader};

/// Errors a `Machine` can surface to its host.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MachineError {
    /// ROM loading failed; the machine retains whatever cartridge (if any)
    /// it had before the call.
    #[error("rom load failed: {0}")]
    Rom(#[from] RomError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_with_no_cartridge_reads_zero_in_cartridge_range() {
        let mut machine = Machine::new();
        assert_eq!(machine.read(0x8000), 0);
    }

    #[test]
    fn test_load_rom_rejects_bad_magic() {
        let mut machine = Machine::new();
        let err = machine.load_rom(&[0; 16]).unwrap_err();
        assert!(matches!(err, MachineError::Rom(RomError::BadMagic)));
    }
}
