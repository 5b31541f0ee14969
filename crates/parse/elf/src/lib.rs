//! Read-only ELF object model.
//!
//! Opens 32-bit and 64-bit ELF images in either byte order and exposes one
//! canonical, native-endian view of the file header and section table.
//! Section names and payloads are loaded on first access through a
//! pluggable [`Loader`] and cached, so opening a large file only touches
//! its headers.
//!
//! # Usage
//!
//! ```no_run
//! use shelf_elf::{File, SectionType};
//!
//! fn dump(path: &str) -> shelf_elf::Result<()> {
//!     let file = File::open_path(path)?;
//!     println!("{} machine {:#x}", file.layout(), file.header().e_machine);
//!     for section in file.sections() {
//!         println!("[{:2}] {:<24} {}", section.index(), section.name()?, section.section_type());
//!     }
//!     if let Some(strtab) = file.section_by_name(".strtab")? {
//!         assert_eq!(strtab.section_type(), SectionType::STRTAB);
//!         println!("first symbol name: {}", strtab.as_strtab()?.get(1)?);
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod canon;
pub mod error;
pub mod file;
pub mod header;
pub mod ident;
pub mod loader;
pub mod options;
pub mod section;
pub mod strtab;

pub use canon::Canonical;
pub use error::{ElfError, ErrorKind, Result};
pub use file::File;
pub use header::{ET_CORE, ET_DYN, ET_EXEC, ET_NONE, ET_REL, FileHeader, SHN_UNDEF, SHN_XINDEX};
pub use ident::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELF_MAGIC, EV_CURRENT, ElfClass,
    ElfData, Ident, Layout,
};
#[cfg(feature = "mmap")]
pub use loader::MmapLoader;
pub use loader::{LoadError, Loader, MemoryLoader, Region, Storage};
pub use options::{DEFAULT_MAX_SECTIONS, ElfOptions};
pub use section::{Section, SectionFlags, SectionHeader, SectionType};
pub use strtab::StringTable;
