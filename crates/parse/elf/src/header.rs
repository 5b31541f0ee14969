//! Canonical ELF file header.
//!
//! Decodes `Elf32_Ehdr` and `Elf64_Ehdr` in either byte order into a single
//! [`FileHeader`] with 64-bit addresses and native-endian fields.

use crate::canon::{Canonical, FieldReader};
use crate::ident::{ElfData, Ident, Layout};

/// ELF type: no file type.
pub const ET_NONE: u16 = 0;

/// ELF type: relocatable object.
pub const ET_REL: u16 = 1;

/// ELF type: executable.
pub const ET_EXEC: u16 = 2;

/// ELF type: shared object (or PIE).
pub const ET_DYN: u16 = 3;

/// ELF type: core dump.
pub const ET_CORE: u16 = 4;

/// Special section index: undefined.
pub const SHN_UNDEF: u16 = 0;

/// Special section index: the real value lives in section 0.
pub const SHN_XINDEX: u16 = 0xffff;

/// Canonical ELF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Decoded identification bytes.
    pub ident: Ident,
    /// Object file type (`ET_*`).
    pub e_type: u16,
    /// Target machine architecture.
    pub e_machine: u16,
    /// Object file version; 1 for every valid file.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u64,
    /// Offset of the program header table in the file.
    pub e_phoff: u64,
    /// Offset of the section header table in the file.
    pub e_shoff: u64,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header in bytes.
    pub e_ehsize: u16,
    /// Size of each program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of each section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries (0 with extended numbering).
    pub e_shnum: u16,
    /// Section name string table index ([`SHN_XINDEX`] with extended numbering).
    pub e_shstrndx: u16,
}

impl FileHeader {
    fn from_elf32(ident: Ident, f: FieldReader<'_>) -> Self {
        Self {
            ident,
            e_type: f.u16(16),
            e_machine: f.u16(18),
            e_version: f.u32(20),
            e_entry: f.u32_wide(24),
            e_phoff: f.u32_wide(28),
            e_shoff: f.u32_wide(32),
            e_flags: f.u32(36),
            e_ehsize: f.u16(40),
            e_phentsize: f.u16(42),
            e_phnum: f.u16(44),
            e_shentsize: f.u16(46),
            e_shnum: f.u16(48),
            e_shstrndx: f.u16(50),
        }
    }

    fn from_elf64(ident: Ident, f: FieldReader<'_>) -> Self {
        Self {
            ident,
            e_type: f.u16(16),
            e_machine: f.u16(18),
            e_version: f.u32(20),
            e_entry: f.u64(24),
            e_phoff: f.u64(32),
            e_shoff: f.u64(40),
            e_flags: f.u32(48),
            e_ehsize: f.u16(52),
            e_phentsize: f.u16(54),
            e_phnum: f.u16(56),
            e_shentsize: f.u16(58),
            e_shnum: f.u16(60),
            e_shstrndx: f.u16(62),
        }
    }

    /// Returns the physical layout this header was decoded from.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(self.ident.class, self.ident.data)
    }
}

impl Canonical for FileHeader {
    fn raw_size(layout: Layout) -> usize {
        layout.file_header_size()
    }

    fn decode(layout: Layout, raw: &[u8]) -> Self {
        let ident = Ident::from_header(layout, raw);
        match layout {
            Layout::Elf32Lsb => Self::from_elf32(ident, FieldReader::new(raw, ElfData::Lsb)),
            Layout::Elf32Msb => Self::from_elf32(ident, FieldReader::new(raw, ElfData::Msb)),
            Layout::Elf64Lsb => Self::from_elf64(ident, FieldReader::new(raw, ElfData::Lsb)),
            Layout::Elf64Msb => Self::from_elf64(ident, FieldReader::new(raw, ElfData::Msb)),
        }
    }
}
