//! Cartridge loading and address translation for `mos6502-cpu` hosts.
//!
//! Splits into the parsing concern ([`Rom`]/[`RomHeader`]/[`RomError`],
//! iNES 1.0 only) and the mapping concern ([`Mapper`], a small capability
//! trait implemented here only by [`Nrom`]). A host wires a boxed `Mapper`
//! into its bus implementation's cartridge-range read/write arms.

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc
)]

mod mapper;
mod nrom;
mod rom;

pub use mapper::{Mapper, Mirroring};
pub use nrom::Nrom;
pub use rom::{Rom, RomError, RomHeader};
