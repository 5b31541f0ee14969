//! ELF identification bytes and the four physical header layouts.

use core::fmt;

use crate::error::{ElfError, Result};

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Index of the class byte in `e_ident`.
pub const EI_CLASS: usize = 4;

/// Index of the data encoding byte in `e_ident`.
pub const EI_DATA: usize = 5;

/// Index of the identification version byte in `e_ident`.
pub const EI_VERSION: usize = 6;

/// Index of the OS ABI byte in `e_ident`.
pub const EI_OSABI: usize = 7;

/// Index of the ABI version byte in `e_ident`.
pub const EI_ABIVERSION: usize = 8;

/// Current ELF version (`EV_CURRENT`).
pub const EV_CURRENT: u8 = 1;

/// Bytes read before the class is known: magic, class, data, version.
pub(crate) const IDENT_PREFIX_LEN: usize = 7;

/// Address width of an ELF file (`EI_CLASS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElfClass {
    /// `ELFCLASS32`.
    Elf32 = 1,
    /// `ELFCLASS64`.
    Elf64 = 2,
}

impl ElfClass {
    /// Decodes an `EI_CLASS` byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Elf32),
            2 => Some(Self::Elf64),
            _ => None,
        }
    }
}

/// Byte order of multi-byte fields (`EI_DATA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ElfData {
    /// `ELFDATA2LSB`: little-endian.
    Lsb = 1,
    /// `ELFDATA2MSB`: big-endian.
    Msb = 2,
}

impl ElfData {
    /// Decodes an `EI_DATA` byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Self::Lsb),
            2 => Some(Self::Msb),
            _ => None,
        }
    }
}

/// One of the four on-disk header layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layout {
    /// 32-bit, little-endian.
    Elf32Lsb,
    /// 32-bit, big-endian.
    Elf32Msb,
    /// 64-bit, little-endian.
    Elf64Lsb,
    /// 64-bit, big-endian.
    Elf64Msb,
}

impl Layout {
    /// All four layouts.
    pub const ALL: [Self; 4] = [Self::Elf32Lsb, Self::Elf32Msb, Self::Elf64Lsb, Self::Elf64Msb];

    /// Combines a class and a byte order.
    #[must_use]
    pub const fn new(class: ElfClass, data: ElfData) -> Self {
        match (class, data) {
            (ElfClass::Elf32, ElfData::Lsb) => Self::Elf32Lsb,
            (ElfClass::Elf32, ElfData::Msb) => Self::Elf32Msb,
            (ElfClass::Elf64, ElfData::Lsb) => Self::Elf64Lsb,
            (ElfClass::Elf64, ElfData::Msb) => Self::Elf64Msb,
        }
    }

    /// Returns the address width.
    #[must_use]
    pub const fn class(self) -> ElfClass {
        match self {
            Self::Elf32Lsb | Self::Elf32Msb => ElfClass::Elf32,
            Self::Elf64Lsb | Self::Elf64Msb => ElfClass::Elf64,
        }
    }

    /// Returns the byte order.
    #[must_use]
    pub const fn data(self) -> ElfData {
        match self {
            Self::Elf32Lsb | Self::Elf64Lsb => ElfData::Lsb,
            Self::Elf32Msb | Self::Elf64Msb => ElfData::Msb,
        }
    }

    /// Size of the raw file header (`Elf32_Ehdr` is 52 bytes, `Elf64_Ehdr` 64).
    #[must_use]
    pub const fn file_header_size(self) -> usize {
        match self.class() {
            ElfClass::Elf32 => 52,
            ElfClass::Elf64 => 64,
        }
    }

    /// Size of a raw section header (`Elf32_Shdr` is 40 bytes, `Elf64_Shdr` 64).
    #[must_use]
    pub const fn section_header_size(self) -> usize {
        match self.class() {
            ElfClass::Elf32 => 40,
            ElfClass::Elf64 => 64,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Elf32Lsb => "ELF32 little-endian",
            Self::Elf32Msb => "ELF32 big-endian",
            Self::Elf64Lsb => "ELF64 little-endian",
            Self::Elf64Msb => "ELF64 big-endian",
        };
        f.write_str(name)
    }
}

/// Decoded identification bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ident {
    /// Address width.
    pub class: ElfClass,
    /// Byte order.
    pub data: ElfData,
    /// Identification version; always [`EV_CURRENT`] once parsed.
    pub version: u8,
    /// Target OS ABI (`EI_OSABI`).
    pub os_abi: u8,
    /// ABI version (`EI_ABIVERSION`).
    pub abi_version: u8,
}

impl Ident {
    /// Validates the identification prefix and returns the header layout.
    ///
    /// Checks, in order, the magic bytes, the identification version, the
    /// class and the data encoding. `prefix` must hold at least the first
    /// seven bytes of the image.
    ///
    /// # Errors
    ///
    /// Returns a format [`ElfError`] naming the first check that failed.
    pub(crate) fn parse_prefix(prefix: &[u8]) -> Result<Layout> {
        if prefix.len() < IDENT_PREFIX_LEN || prefix[..4] != ELF_MAGIC {
            return Err(ElfError::BadMagic);
        }
        if prefix[EI_VERSION] != EV_CURRENT {
            return Err(ElfError::BadIdentVersion(prefix[EI_VERSION]));
        }
        let class =
            ElfClass::from_byte(prefix[EI_CLASS]).ok_or(ElfError::BadClass(prefix[EI_CLASS]))?;
        let data =
            ElfData::from_byte(prefix[EI_DATA]).ok_or(ElfError::BadDataEncoding(prefix[EI_DATA]))?;
        Ok(Layout::new(class, data))
    }

    /// Reads the identification bytes of an already validated header.
    pub(crate) fn from_header(layout: Layout, header: &[u8]) -> Self {
        Self {
            class: layout.class(),
            data: layout.data(),
            version: header[EI_VERSION],
            os_abi: header[EI_OSABI],
            abi_version: header[EI_ABIVERSION],
        }
    }
}
