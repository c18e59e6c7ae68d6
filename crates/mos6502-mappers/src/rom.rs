//! iNES 1.0 ROM file parsing.

use thiserror::Error;

use crate::Mirroring;

const HEADER_LEN: usize = 16;
const TRAINER_LEN: usize = 512;
const PRG_BANK_LEN: usize = 16 * 1024;
const CHR_BANK_LEN: usize = 8 * 1024;
const MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1A];

/// Cartridge loading failures.
#[derive(Debug, Clone, Error)]
pub enum RomError {
    /// File is shorter than a bare 16-byte header, or shorter than the
    /// header plus the PRG/CHR lengths it declares.
    #[error("rom file too short ({actual} bytes, needed at least {needed})")]
    TooShort {
        /// Bytes actually present.
        actual: usize,
        /// Bytes required given the header's declared bank counts.
        needed: usize,
    },

    /// The first four bytes aren't the iNES magic `"NES\x1A"`.
    #[error("missing iNES magic number")]
    BadMagic,

    /// The header names a mapper ID this crate doesn't implement.
    #[error("unsupported mapper id {0}")]
    UnsupportedMapper(u8),
}

/// Parsed iNES header fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RomHeader {
    /// PRG ROM size in 16 KiB banks.
    pub prg_banks: u8,
    /// CHR ROM size in 8 KiB banks.
    pub chr_banks: u8,
    /// Whether a 512-byte trainer precedes PRG ROM.
    pub has_trainer: bool,
    /// `(mapper2 & 0xF0) | (mapper1 >> 4)`.
    pub mapper_id: u8,
    /// Nametable mirroring declared by header byte 6 bit 0.
    pub mirroring: Mirroring,
}

/// A parsed cartridge image: header plus PRG/CHR banks, trainer discarded.
#[derive(Debug, Clone)]
pub struct Rom {
    /// Parsed header fields.
    pub header: RomHeader,
    /// Raw PRG ROM bytes (`prg_banks * 16 KiB`).
    pub prg: Vec<u8>,
    /// Raw CHR ROM bytes (`chr_banks * 8 KiB`; empty means CHR RAM, which
    /// this crate does not allocate; a host adding CHR RAM support would
    /// size it itself).
    pub chr: Vec<u8>,
}

impl Rom {
    /// Parse an iNES 1.0 file from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`RomError::TooShort`] if the buffer doesn't hold a full
    /// header plus the PRG/CHR data the header declares,
    /// [`RomError::BadMagic`] if the magic number doesn't match, or
    /// [`RomError::UnsupportedMapper`] for any mapper ID other than 0.
    pub fn parse(bytes: &[u8]) -> Result<Self, RomError> {
        if bytes.len() < HEADER_LEN {
            return Err(RomError::TooShort {
                actual: bytes.len(),
                needed: HEADER_LEN,
            });
        }
        if bytes[0..4] != MAGIC {
            return Err(RomError::BadMagic);
        }

        let prg_banks = bytes[4];
        let chr_banks = bytes[5];
        let mapper1 = bytes[6];
        let mapper2 = bytes[7];
        let has_trainer = mapper1 & 0x04 != 0;
        let mapper_id = (mapper2 & 0xF0) | (mapper1 >> 4);
        let mirroring = if mapper1 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        if mapper_id != 0 {
            return Err(RomError::UnsupportedMapper(mapper_id));
        }

        let prg_len = usize::from(prg_banks) * PRG_BANK_LEN;
        let chr_len = usize::from(chr_banks) * CHR_BANK_LEN;
        let trainer_len = if has_trainer { TRAINER_LEN } else { 0 };
        let needed = HEADER_LEN + trainer_len + prg_len + chr_len;
        if bytes.len() < needed {
            return Err(RomError::TooShort {
                actual: bytes.len(),
                needed,
            });
        }

        let prg_start = HEADER_LEN + trainer_len;
        let chr_start = prg_start + prg_len;
        let prg = bytes[prg_start..prg_start + prg_len].to_vec();
        let chr = bytes[chr_start..chr_start + chr_len].to_vec();

        log::debug!(
            "parsed iNES rom: {prg_banks} PRG bank(s), {chr_banks} CHR bank(s), mapper {mapper_id}, trainer={has_trainer}"
        );

        Ok(Self {
            header: RomHeader {
                prg_banks,
                chr_banks,
                has_trainer,
                mapper_id,
                mirroring,
            },
            prg,
            chr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(prg_banks: u8, chr_banks: u8, mapper1: u8, mapper2: u8) -> Vec<u8> {
        let mut h = vec![0u8; HEADER_LEN];
        h[0..4].copy_from_slice(&MAGIC);
        h[4] = prg_banks;
        h[5] = chr_banks;
        h[6] = mapper1;
        h[7] = mapper2;
        h
    }

    #[test]
    fn test_parses_minimal_nrom_image() {
        let mut bytes = header(1, 1, 0, 0);
        bytes.extend(std::iter::repeat(0xAA).take(PRG_BANK_LEN));
        bytes.extend(std::iter::repeat(0xBB).take(CHR_BANK_LEN));

        let rom = Rom::parse(&bytes).unwrap();
        assert_eq!(rom.header.mapper_id, 0);
        assert_eq!(rom.header.prg_banks, 1);
        assert_eq!(rom.prg.len(), PRG_BANK_LEN);
        assert_eq!(rom.chr.len(), CHR_BANK_LEN);
        assert_eq!(rom.prg[0], 0xAA);
        assert_eq!(rom.chr[0], 0xBB);
    }

    #[test]
    fn test_rejects_short_header() {
        let err = Rom::parse(&[0x4E, 0x45, 0x53]).unwrap_err();
        assert!(matches!(err, RomError::TooShort { .. }));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = header(1, 1, 0, 0);
        bytes[0] = 0;
        bytes.extend(std::iter::repeat(0).take(PRG_BANK_LEN + CHR_BANK_LEN));
        let err = Rom::parse(&bytes).unwrap_err();
        assert!(matches!(err, RomError::BadMagic));
    }

    #[test]
    fn test_rejects_unsupported_mapper() {
        let mut bytes = header(1, 1, 0x10, 0x00); // mapper id 1 (MMC1)
        bytes.extend(std::iter::repeat(0).take(PRG_BANK_LEN + CHR_BANK_LEN));
        let err = Rom::parse(&bytes).unwrap_err();
        assert!(matches!(err, RomError::UnsupportedMapper(1)));
    }

    #[test]
    fn test_rejects_truncated_prg_data() {
        let mut bytes = header(2, 1, 0, 0); // declares 32 KiB PRG
        bytes.extend(std::iter::repeat(0).take(PRG_BANK_LEN)); // only 16 KiB present
        let err = Rom::parse(&bytes).unwrap_err();
        assert!(matches!(err, RomError::TooShort { .. }));
    }

    #[test]
    fn test_trainer_is_skipped() {
        let mut bytes = header(1, 1, 0x04, 0); // trainer present
        bytes.extend(std::iter::repeat(0xCC).take(TRAINER_LEN));
        bytes.extend(std::iter::repeat(0xAA).take(PRG_BANK_LEN));
        bytes.extend(std::iter::repeat(0xBB).take(CHR_BANK_LEN));

        let rom = Rom::parse(&bytes).unwrap();
        assert_eq!(rom.prg[0], 0xAA);
        assert!(rom.header.has_trainer);
    }

    #[test]
    fn test_mirroring_bit_selects_vertical() {
        let mut bytes = header(1, 1, 0x01, 0);
        bytes.extend(std::iter::repeat(0).take(PRG_BANK_LEN + CHR_BANK_LEN));
        let rom = Rom::parse(&bytes).unwrap();
        assert_eq!(rom.header.mirroring, Mirroring::Vertical);
    }
}
