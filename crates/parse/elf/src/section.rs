//! Section headers and lazily loaded sections.
//!
//! [`SectionHeader`] is the canonical form of `Elf32_Shdr` / `Elf64_Shdr`.
//! [`Section`] pairs one header with its owning file and loads the section's
//! name and payload on first use.

use core::fmt;
use std::sync::Arc;

use bitflags::bitflags;

use crate::canon::{Canonical, FieldReader};
use crate::error::Result;
use crate::file::FileState;
use crate::ident::{ElfData, Layout};
use crate::strtab::StringTable;

/// Section type (`sh_type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionType(pub u32);

impl SectionType {
    /// Inactive header; also the type of section 0.
    pub const NULL: Self = Self(0);
    /// Program-defined contents.
    pub const PROGBITS: Self = Self(1);
    /// Symbol table.
    pub const SYMTAB: Self = Self(2);
    /// String table.
    pub const STRTAB: Self = Self(3);
    /// Relocation entries with addends.
    pub const RELA: Self = Self(4);
    /// Symbol hash table.
    pub const HASH: Self = Self(5);
    /// Dynamic linking information.
    pub const DYNAMIC: Self = Self(6);
    /// Notes.
    pub const NOTE: Self = Self(7);
    /// Occupies no file space (e.g. `.bss`).
    pub const NOBITS: Self = Self(8);
    /// Relocation entries without addends.
    pub const REL: Self = Self(9);
    /// Reserved.
    pub const SHLIB: Self = Self(10);
    /// Dynamic linker symbol table.
    pub const DYNSYM: Self = Self(11);
    /// Array of constructors.
    pub const INIT_ARRAY: Self = Self(14);
    /// Array of destructors.
    pub const FINI_ARRAY: Self = Self(15);
    /// Array of pre-constructors.
    pub const PREINIT_ARRAY: Self = Self(16);
    /// Section group.
    pub const GROUP: Self = Self(17);
    /// Extended section indices for a symbol table.
    pub const SYMTAB_SHNDX: Self = Self(18);

    /// Returns the standard `SHT_*` name, if this is a standard type.
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::NULL => "SHT_NULL",
            Self::PROGBITS => "SHT_PROGBITS",
            Self::SYMTAB => "SHT_SYMTAB",
            Self::STRTAB => "SHT_STRTAB",
            Self::RELA => "SHT_RELA",
            Self::HASH => "SHT_HASH",
            Self::DYNAMIC => "SHT_DYNAMIC",
            Self::NOTE => "SHT_NOTE",
            Self::NOBITS => "SHT_NOBITS",
            Self::REL => "SHT_REL",
            Self::SHLIB => "SHT_SHLIB",
            Self::DYNSYM => "SHT_DYNSYM",
            Self::INIT_ARRAY => "SHT_INIT_ARRAY",
            Self::FINI_ARRAY => "SHT_FINI_ARRAY",
            Self::PREINIT_ARRAY => "SHT_PREINIT_ARRAY",
            Self::GROUP => "SHT_GROUP",
            Self::SYMTAB_SHNDX => "SHT_SYMTAB_SHNDX",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "SHT_{:#x}", self.0),
        }
    }
}

bitflags! {
    /// Section attribute flags (`sh_flags`). Unknown bits are retained.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SectionFlags: u64 {
        /// Writable data.
        const WRITE = 0x1;
        /// Occupies memory during execution.
        const ALLOC = 0x2;
        /// Executable machine instructions.
        const EXECINSTR = 0x4;
        /// Elements may be merged.
        const MERGE = 0x10;
        /// Contains NUL-terminated strings.
        const STRINGS = 0x20;
        /// `sh_info` holds a section header table index.
        const INFO_LINK = 0x40;
        /// Ordering requirements apply when linking.
        const LINK_ORDER = 0x80;
        /// Requires OS-specific processing.
        const OS_NONCONFORMING = 0x100;
        /// Member of a section group.
        const GROUP = 0x200;
        /// Holds thread-local storage.
        const TLS = 0x400;
        /// Holds compressed data.
        const COMPRESSED = 0x800;
    }
}

/// Canonical section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Offset of this section's name in the section name string table.
    pub sh_name: u32,
    /// Section type.
    pub sh_type: SectionType,
    /// Section flags.
    pub sh_flags: SectionFlags,
    /// Virtual address of the section in memory (0 for non-loaded sections).
    pub sh_addr: u64,
    /// File offset of the section data.
    pub sh_offset: u64,
    /// Size of the section in bytes. May be non-zero for `SHT_NOBITS`.
    pub sh_size: u64,
    /// Associated section index; meaning depends on the type.
    pub sh_link: u32,
    /// Extra info; meaning depends on the type.
    pub sh_info: u32,
    /// Required alignment of the section.
    pub sh_addralign: u64,
    /// Size of each entry, for sections with fixed-size entries.
    pub sh_entsize: u64,
}

impl SectionHeader {
    fn from_elf32(f: FieldReader<'_>) -> Self {
        Self {
            sh_name: f.u32(0),
            sh_type: SectionType(f.u32(4)),
            sh_flags: SectionFlags::from_bits_retain(f.u32_wide(8)),
            sh_addr: f.u32_wide(12),
            sh_offset: f.u32_wide(16),
            sh_size: f.u32_wide(20),
            sh_link: f.u32(24),
            sh_info: f.u32(28),
            sh_addralign: f.u32_wide(32),
            sh_entsize: f.u32_wide(36),
        }
    }

    fn from_elf64(f: FieldReader<'_>) -> Self {
        Self {
            sh_name: f.u32(0),
            sh_type: SectionType(f.u32(4)),
            sh_flags: SectionFlags::from_bits_retain(f.u64(8)),
            sh_addr: f.u64(16),
            sh_offset: f.u64(24),
            sh_size: f.u64(32),
            sh_link: f.u32(40),
            sh_info: f.u32(44),
            sh_addralign: f.u64(48),
            sh_entsize: f.u64(56),
        }
    }
}

impl Canonical for SectionHeader {
    fn raw_size(layout: Layout) -> usize {
        layout.section_header_size()
    }

    fn decode(layout: Layout, raw: &[u8]) -> Self {
        match layout {
            Layout::Elf32Lsb => Self::from_elf32(FieldReader::new(raw, ElfData::Lsb)),
            Layout::Elf32Msb => Self::from_elf32(FieldReader::new(raw, ElfData::Msb)),
            Layout::Elf64Lsb => Self::from_elf64(FieldReader::new(raw, ElfData::Lsb)),
            Layout::Elf64Msb => Self::from_elf64(FieldReader::new(raw, ElfData::Msb)),
        }
    }
}

/// One section of an opened [`File`](crate::File).
///
/// A `Section` shares ownership of its file's state, so it stays usable
/// after every `File` handle has been dropped. Cloning is cheap. The name
/// and payload are loaded on first access and cached with the file state;
/// clones of a section share the cache.
#[derive(Clone)]
pub struct Section {
    file: Arc<FileState>,
    index: usize,
}

impl Section {
    pub(crate) fn new(file: Arc<FileState>, index: usize) -> Self {
        Self { file, index }
    }

    /// Returns this section's index in the section header table.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the canonical section header.
    #[must_use]
    pub fn header(&self) -> &SectionHeader {
        self.file.section_header(self.index)
    }

    /// Returns the section type.
    #[must_use]
    pub fn section_type(&self) -> SectionType {
        self.header().sh_type
    }

    /// Returns the section flags.
    #[must_use]
    pub fn flags(&self) -> SectionFlags {
        self.header().sh_flags
    }

    /// Returns the section size from the header.
    ///
    /// Always available, including for `SHT_NOBITS` sections that occupy no
    /// file space.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.header().sh_size
    }

    /// Returns the section name.
    ///
    /// Resolved through the section name string table on first call and
    /// cached afterwards.
    ///
    /// # Errors
    ///
    /// Fails if the name table is not a string table, cannot be loaded, or
    /// does not hold a terminated UTF-8 string at `sh_name`.
    pub fn name(&self) -> Result<&str> {
        self.file.section_name(self.index)
    }

    /// Returns the section payload.
    ///
    /// Returns `Ok(None)` for `SHT_NOBITS` sections without touching the
    /// loader. Otherwise the bytes `[sh_offset, sh_offset + sh_size)` are
    /// loaded on first call and cached.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Load`](crate::ElfError::Load) if the loader
    /// cannot supply the range.
    pub fn data(&self) -> Result<Option<&[u8]>> {
        self.file.section_data(self.index)
    }

    /// Views this section as a string table.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::TypeMismatch`](crate::ElfError::TypeMismatch)
    /// unless the section type is `SHT_STRTAB`, or a load error if the
    /// payload cannot be loaded.
    pub fn as_strtab(&self) -> Result<StringTable<'_>> {
        self.file.string_table(self.index)
    }
}

impl fmt::Debug for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Section")
            .field("index", &self.index)
            .field("header", self.header())
            .finish_non_exhaustive()
    }
}
