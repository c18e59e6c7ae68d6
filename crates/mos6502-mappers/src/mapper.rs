//! The cartridge mapper capability.

/// Nametable mirroring a cartridge advertises.
///
/// Exposed for hosts that attach a PPU (out of scope for this crate), but
/// not consumed by any mapper here, since NROM's CHR translation doesn't
/// depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mirroring {
    /// Horizontal (vertical arrangement of nametables).
    Horizontal,
    /// Vertical (horizontal arrangement of nametables).
    Vertical,
}

/// A cartridge's address-translation capability.
///
/// A small, flat trait: a mapper is four pure functions from CPU/PPU
/// address to an optional offset into its own ROM/RAM. There is no shared
/// mutable state between calls other than what a specific mapper needs for
/// bank switching, and NROM needs none.
pub trait Mapper {
    /// Translate a CPU read address (`0x8000..=0xFFFF`) to a PRG ROM
    /// offset, or `None` if this mapper doesn't claim the address.
    fn map_cpu_read(&self, addr: u16) -> Option<usize>;

    /// Translate a CPU write address the same way `map_cpu_read` does.
    /// Most mappers that are pure ROM never claim writes; bank-switching
    /// mappers would use this to detect a register write before deciding
    /// whether to also forward it as a PRG RAM write.
    fn map_cpu_write(&self, addr: u16) -> Option<usize>;

    /// Translate a PPU read address (`0x0000..=0x1FFF`) to a CHR ROM/RAM
    /// offset, or `None` if this mapper doesn't claim the address.
    fn map_ppu_read(&self, addr: u16) -> Option<usize>;

    /// Translate a PPU write address the same way `map_ppu_read` does.
    /// `None` for any mapper whose CHR is pure ROM.
    fn map_ppu_write(&self, addr: u16) -> Option<usize>;

    /// Nametable mirroring this cartridge advertises.
    fn mirroring(&self) -> Mirroring;
}
