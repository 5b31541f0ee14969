//! The ELF file object.
//!
//! [`File::open_with`] validates the identification bytes, canonicalizes the
//! file header, and decodes the whole section header table in one pass. The
//! result is immutable apart from the per-section caches, which are
//! compute-once cells shared by every [`Section`] handle.

use core::fmt;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use log::{debug, trace};

use crate::canon::Canonical;
use crate::error::{ElfError, Result};
use crate::header::{FileHeader, SHN_XINDEX};
use crate::ident::{IDENT_PREFIX_LEN, Ident, Layout};
use crate::loader::{LoadError, Loader, MemoryLoader, Region};
use crate::options::ElfOptions;
use crate::section::{Section, SectionHeader, SectionType};
use crate::strtab::StringTable;

/// One decoded section header plus its lazily filled caches.
struct SectionSlot {
    header: SectionHeader,
    name: OnceLock<Box<str>>,
    data: OnceLock<Region>,
}

/// State shared by a [`File`] and all of its [`Section`]s.
pub(crate) struct FileState {
    loader: Arc<dyn Loader>,
    header: FileHeader,
    /// Resolved section name string table index; meaningless without sections.
    shstrndx: usize,
    slots: Vec<SectionSlot>,
}

impl FileState {
    pub(crate) fn section_header(&self, index: usize) -> &SectionHeader {
        &self.slots[index].header
    }

    pub(crate) fn section_data(&self, index: usize) -> Result<Option<&[u8]>> {
        let slot = &self.slots[index];
        if slot.header.sh_type == SectionType::NOBITS {
            return Ok(None);
        }
        if let Some(region) = slot.data.get() {
            return Ok(Some(region.as_bytes()));
        }
        trace!(
            "loading section {index}: {:#x}+{:#x}",
            slot.header.sh_offset, slot.header.sh_size
        );
        let region = load_exact(&*self.loader, slot.header.sh_offset, slot.header.sh_size)?;
        // A concurrent first access may have won the race; keep its region.
        Ok(Some(slot.data.get_or_init(|| region).as_bytes()))
    }

    pub(crate) fn string_table(&self, index: usize) -> Result<StringTable<'_>> {
        let found = self.slots[index].header.sh_type;
        if found != SectionType::STRTAB {
            return Err(ElfError::TypeMismatch {
                index,
                expected: SectionType::STRTAB,
                found,
            });
        }
        let data = self.section_data(index)?.unwrap_or_default();
        Ok(StringTable::new(data))
    }

    pub(crate) fn section_name(&self, index: usize) -> Result<&str> {
        let slot = &self.slots[index];
        if let Some(name) = slot.name.get() {
            return Ok(&**name);
        }
        let name = self
            .string_table(self.shstrndx)?
            .get(u64::from(slot.header.sh_name))?;
        trace!("section {index} is named {name:?}");
        Ok(&**slot.name.get_or_init(|| name.into()))
    }
}

/// An opened ELF image.
///
/// Cloning is cheap and clones share the lazily loaded section state.
///
/// # Example
///
/// ```
/// use shelf_elf::{File, MemoryLoader};
///
/// fn list_sections(image: Vec<u8>) -> Result<(), shelf_elf::ElfError> {
///     let file = File::open(MemoryLoader::new(image))?;
///     for section in file.sections() {
///         println!("{:>3} {:<20} {}", section.index(), section.name()?, section.size());
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct File {
    state: Arc<FileState>,
    sections: Vec<Section>,
}

impl File {
    /// Opens an ELF image supplied by `loader` with default options.
    ///
    /// # Errors
    ///
    /// See [`File::open_with`].
    pub fn open(loader: impl Loader + 'static) -> Result<Self> {
        Self::open_shared(Arc::new(loader))
    }

    /// Opens an ELF image from a shared loader with default options.
    ///
    /// # Errors
    ///
    /// See [`File::open_with`].
    pub fn open_shared(loader: Arc<dyn Loader>) -> Result<Self> {
        Self::open_with(loader, &ElfOptions::default())
    }

    /// Opens an in-memory ELF image.
    ///
    /// # Errors
    ///
    /// See [`File::open_with`].
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        Self::open(MemoryLoader::new(bytes))
    }

    /// Opens the ELF file at `path`.
    ///
    /// The file is memory-mapped with the `mmap` feature and read into
    /// memory otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Load`] if the file cannot be opened, otherwise
    /// see [`File::open_with`].
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        #[cfg(feature = "mmap")]
        let loader = crate::loader::MmapLoader::open(path)?;
        #[cfg(not(feature = "mmap"))]
        let loader = MemoryLoader::read(path)?;
        Self::open(loader)
    }

    /// Opens an ELF image from a shared loader.
    ///
    /// Reads the identification prefix, then the file header, then the
    /// complete section header table in a single request. Either every
    /// check passes and a complete `File` is returned, or nothing is.
    ///
    /// # Errors
    ///
    /// Returns a format [`ElfError`] if the magic, identification version,
    /// class, data encoding, `e_version`, section name string table index or
    /// section header entry size is invalid, or if the section count
    /// exceeds [`ElfOptions::max_sections`]. Returns [`ElfError::Load`] if
    /// the loader cannot supply the header or the section header table.
    /// With [`ElfOptions::eager`], errors resolving any name or payload
    /// are returned as well.
    pub fn open_with(loader: Arc<dyn Loader>, options: &ElfOptions) -> Result<Self> {
        let prefix = match loader.load(0, IDENT_PREFIX_LEN as u64) {
            Ok(prefix) => prefix,
            // Too short to be an ELF image at all.
            Err(LoadError::OutOfBounds { .. }) => return Err(ElfError::BadMagic),
            Err(err) => return Err(err.into()),
        };
        let layout = Ident::parse_prefix(&prefix)?;

        let raw = load_exact(&*loader, 0, FileHeader::raw_size(layout) as u64)?;
        let header = FileHeader::decode(layout, &raw);
        if header.e_version != 1 {
            return Err(ElfError::BadVersion(header.e_version));
        }

        let (count, shstrndx) = resolve_numbering(&*loader, layout, &header)?;
        if count > 0 && shstrndx >= count {
            return Err(ElfError::BadStringTableIndex {
                index: shstrndx,
                count,
            });
        }
        if count > options.max_sections {
            return Err(ElfError::TooManySections {
                count,
                limit: options.max_sections,
            });
        }

        let headers = if count == 0 {
            Vec::new()
        } else {
            read_section_headers(&*loader, layout, &header, count)?
        };
        let slots = headers
            .into_iter()
            .map(|header| SectionSlot {
                header,
                name: OnceLock::new(),
                data: OnceLock::new(),
            })
            .collect::<Vec<_>>();

        let state = Arc::new(FileState {
            loader,
            header,
            shstrndx: usize::try_from(shstrndx).unwrap_or(usize::MAX),
            slots,
        });
        let sections = (0..state.slots.len())
            .map(|index| Section::new(Arc::clone(&state), index))
            .collect();
        let file = Self { state, sections };
        debug!(
            "opened {layout} image: type {}, machine {:#x}, {} sections",
            header.e_type,
            header.e_machine,
            file.section_count()
        );

        if options.eager {
            for section in &file.sections {
                section.name()?;
                section.data()?;
            }
        }
        Ok(file)
    }

    /// Returns the canonical file header.
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.state.header
    }

    /// Returns the physical layout the image is stored in.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.state.header.layout()
    }

    /// Returns the loader backing this file.
    #[must_use]
    pub fn loader(&self) -> Arc<dyn Loader> {
        Arc::clone(&self.state.loader)
    }

    /// Returns all sections in section header table order.
    ///
    /// `sections()[n].index() == n`.
    #[must_use]
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the number of sections, after extended numbering.
    #[must_use]
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Returns the index of the section name string table, after extended
    /// numbering, or `None` if the file has no sections.
    #[must_use]
    pub fn section_name_index(&self) -> Option<usize> {
        (!self.sections.is_empty()).then_some(self.state.shstrndx)
    }

    /// Returns the section at `index`, or `None` if out of range.
    #[must_use]
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Returns the first section named `name`, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if a section name cannot be resolved (see
    /// [`Section::name`]). A missing section is not an error.
    pub fn section_by_name(&self, name: &str) -> Result<Option<&Section>> {
        for section in &self.sections {
            if section.name()? == name {
                return Ok(Some(section));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File")
            .field("header", &self.state.header)
            .field("sections", &self.sections.len())
            .finish_non_exhaustive()
    }
}

/// Loads exactly `len` bytes at `offset`, guarding against loaders that
/// return short regions.
fn load_exact(loader: &dyn Loader, offset: u64, len: u64) -> Result<Region> {
    let region = loader.load(offset, len)?;
    if region.len() as u64 != len {
        return Err(LoadError::OutOfBounds {
            offset,
            len,
            size: region.len() as u64,
        }
        .into());
    }
    Ok(region)
}

/// Resolves the section count and name table index, following ELF extended
/// numbering into section 0 when the header fields overflow.
fn resolve_numbering(
    loader: &dyn Loader,
    layout: Layout,
    header: &FileHeader,
) -> Result<(u64, u64)> {
    let mut count = u64::from(header.e_shnum);
    let mut shstrndx = u64::from(header.e_shstrndx);

    let extended_count = header.e_shnum == 0 && header.e_shoff != 0;
    let extended_index = header.e_shstrndx == SHN_XINDEX && header.e_shoff != 0;
    if extended_count || extended_index {
        let zero = read_section_headers(loader, layout, header, 1)?[0];
        if extended_count {
            count = zero.sh_size;
        }
        if extended_index {
            shstrndx = u64::from(zero.sh_link);
        }
        debug!("extended section numbering: {count} sections, name table {shstrndx}");
    }
    Ok((count, shstrndx))
}

/// Reads the first `count` entries of the section header table in one load.
fn read_section_headers(
    loader: &dyn Loader,
    layout: Layout,
    header: &FileHeader,
    count: u64,
) -> Result<Vec<SectionHeader>> {
    let required = SectionHeader::raw_size(layout);
    let entsize = usize::from(header.e_shentsize);
    if entsize < required {
        return Err(ElfError::BadSectionEntrySize {
            found: header.e_shentsize,
            required,
        });
    }
    let table_size = u64::from(header.e_shentsize)
        .checked_mul(count)
        .ok_or(ElfError::SectionTableOverflow)?;
    let raw = load_exact(loader, header.e_shoff, table_size)?;
    Ok(raw
        .chunks_exact(entsize)
        .map(|entry| SectionHeader::decode(layout, entry))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::header::tests::{encode_header, sample_header};
    use crate::ident::{ElfClass, ElfData};
    use crate::loader::tests::CountingLoader;
    use crate::section::SectionFlags;
    use crate::section::tests::encode_section_header;

    /// Synthesizes ELF images in any of the four layouts.
    ///
    /// Payloads are laid out right after the file header, followed by the
    /// section header table. [`ImageBuilder::new`] starts with a null
    /// section and appends a `.shstrtab` at build time.
    pub(crate) struct ImageBuilder {
        layout: Layout,
        sections: Vec<(SectionHeader, Vec<u8>)>,
        /// Pending `.shstrtab` contents; `None` for bare images.
        names: Option<Vec<u8>>,
        shstrndx: u16,
        extended: bool,
    }

    impl ImageBuilder {
        const SHSTRTAB_NAME: u32 = 1;

        pub(crate) fn new(layout: Layout) -> Self {
            let mut builder = Self::bare(layout);
            builder.names = Some(b"\0.shstrtab\0".to_vec());
            builder.push(empty_header(SectionType::NULL, 0), &[]);
            builder
        }

        /// An image with no implicit sections and `e_shstrndx == 0`.
        pub(crate) fn bare(layout: Layout) -> Self {
            Self {
                layout,
                sections: Vec::new(),
                names: None,
                shstrndx: 0,
                extended: false,
            }
        }

        pub(crate) fn push(&mut self, header: SectionHeader, payload: &[u8]) -> usize {
            self.sections.push((header, payload.to_vec()));
            self.sections.len() - 1
        }

        fn add_name(&mut self, name: &str) -> u32 {
            let names = self.names.as_mut().expect("builder manages names");
            let offset = u32::try_from(names.len()).unwrap();
            names.extend_from_slice(name.as_bytes());
            names.push(0);
            offset
        }

        pub(crate) fn section(&mut self, name: &str, ty: SectionType, payload: &[u8]) -> usize {
            let sh_name = self.add_name(name);
            self.push(empty_header(ty, sh_name), payload)
        }

        pub(crate) fn nobits(&mut self, name: &str, size: u64) -> usize {
            let sh_name = self.add_name(name);
            let mut header = empty_header(SectionType::NOBITS, sh_name);
            header.sh_flags = SectionFlags::ALLOC | SectionFlags::WRITE;
            header.sh_size = size;
            self.push(header, &[])
        }

        /// Store the section count and name table index in section 0.
        pub(crate) fn extended_numbering(&mut self) {
            self.extended = true;
        }

        /// Final section list with offsets assigned, plus the table offset.
        fn plan(&self) -> (Vec<(SectionHeader, Vec<u8>)>, u64, u16) {
            let mut sections = self.sections.clone();
            let mut shstrndx = self.shstrndx;
            if let Some(names) = &self.names {
                shstrndx = u16::try_from(sections.len()).unwrap();
                sections.push((
                    empty_header(SectionType::STRTAB, Self::SHSTRTAB_NAME),
                    names.clone(),
                ));
            }

            let mut cursor = self.layout.file_header_size() as u64;
            for (header, payload) in &mut sections {
                if header.sh_type == SectionType::NOBITS {
                    header.sh_offset = cursor;
                } else if !payload.is_empty() {
                    header.sh_offset = cursor;
                    header.sh_size = payload.len() as u64;
                    cursor += payload.len() as u64;
                }
            }
            let shoff = cursor.next_multiple_of(8);

            if self.extended {
                let count = sections.len() as u64;
                sections[0].0.sh_size = count;
                sections[0].0.sh_link = u32::from(shstrndx);
            }
            (sections, shoff, shstrndx)
        }

        /// Offset of section `index`'s header in the built image.
        pub(crate) fn section_header_offset(&self, index: usize) -> usize {
            let (_, shoff, _) = self.plan();
            usize::try_from(shoff).unwrap() + index * self.layout.section_header_size()
        }

        pub(crate) fn build(&self) -> Vec<u8> {
            let (sections, shoff, shstrndx) = self.plan();

            let mut header = sample_header(self.layout);
            header.e_phoff = 0;
            header.e_phnum = 0;
            header.e_shoff = if sections.is_empty() { 0 } else { shoff };
            header.e_shnum = u16::try_from(sections.len()).unwrap();
            header.e_shstrndx = shstrndx;
            if self.extended {
                header.e_shnum = 0;
                header.e_shstrndx = SHN_XINDEX;
            }

            let mut image = encode_header(&header, self.layout);
            for (_, payload) in &sections {
                image.extend_from_slice(payload);
            }
            image.resize(usize::try_from(shoff).unwrap(), 0);
            for (sh, _) in &sections {
                image.extend_from_slice(&encode_section_header(sh, self.layout));
            }
            image
        }
    }

    fn empty_header(sh_type: SectionType, sh_name: u32) -> SectionHeader {
        SectionHeader {
            sh_name,
            sh_type,
            sh_flags: SectionFlags::empty(),
            sh_addr: 0,
            sh_offset: 0,
            sh_size: 0,
            sh_link: 0,
            sh_info: 0,
            sh_addralign: 1,
            sh_entsize: 0,
        }
    }

    /// Decode, modify and re-encode the file header of a built image.
    pub(crate) fn patch_header(image: &mut [u8], patch: impl FnOnce(&mut FileHeader)) {
        let layout = Ident::parse_prefix(image).expect("built image");
        let mut header = FileHeader::decode(layout, image);
        patch(&mut header);
        let raw = encode_header(&header, layout);
        image[..raw.len()].copy_from_slice(&raw);
    }

    /// A small image with code, data, bss and a name table.
    fn sample_image(layout: Layout) -> Vec<u8> {
        let mut builder = ImageBuilder::new(layout);
        builder.section(".text", SectionType::PROGBITS, b"\x55\x48\x89\xe5\xc3");
        builder.section(".rodata", SectionType::PROGBITS, b"hello\0");
        builder.nobits(".bss", 0x200);
        builder.section(".comment", SectionType::PROGBITS, b"shelf\0");
        builder.build()
    }

    #[test]
    fn open_minimal_strtab_image() {
        let mut builder = ImageBuilder::bare(Layout::Elf64Lsb);
        builder.push(empty_header(SectionType::STRTAB, 1), b"\0.shstrtab\0");
        let file = File::from_bytes(builder.build()).expect("valid ELF");

        assert_eq!(file.sections().len(), 1);
        let section = file.section(0).expect("section 0");
        assert_eq!(section.name().unwrap(), ".shstrtab");
        assert_eq!(section.as_strtab().unwrap().get(1).unwrap(), ".shstrtab");
        assert_eq!(file.section_name_index(), Some(0));
    }

    #[test]
    fn open_every_layout() {
        for layout in Layout::ALL {
            let file = File::from_bytes(sample_image(layout)).expect("valid ELF");
            assert_eq!(file.layout(), layout);
            assert_eq!(file.section_count(), 6, "{layout}");
            let names = file
                .sections()
                .iter()
                .map(|s| s.name().map(str::to_owned))
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert_eq!(names, ["", ".text", ".rodata", ".bss", ".comment", ".shstrtab"]);
            for (n, section) in file.sections().iter().enumerate() {
                assert_eq!(section.index(), n);
            }
        }
    }

    #[test]
    fn cross_endianness_equivalence() {
        for class in [ElfClass::Elf32, ElfClass::Elf64] {
            let lsb = File::from_bytes(sample_image(Layout::new(class, ElfData::Lsb))).unwrap();
            let msb = File::from_bytes(sample_image(Layout::new(class, ElfData::Msb))).unwrap();

            let mut lsb_header = *lsb.header();
            lsb_header.ident.data = ElfData::Msb;
            assert_eq!(&lsb_header, msb.header());

            assert_eq!(lsb.section_count(), msb.section_count());
            for (a, b) in lsb.sections().iter().zip(msb.sections()) {
                assert_eq!(a.header(), b.header());
                assert_eq!(a.name().unwrap(), b.name().unwrap());
                assert_eq!(a.data().unwrap(), b.data().unwrap());
            }
        }
    }

    #[test]
    fn lookup_by_name() {
        let file = File::from_bytes(sample_image(Layout::Elf32Lsb)).unwrap();
        let rodata = file.section_by_name(".rodata").unwrap().expect("present");
        assert_eq!(rodata.index(), 2);
        assert_eq!(rodata.data().unwrap(), Some(&b"hello\0"[..]));
        assert_eq!(rodata.as_strtab().unwrap_err().kind(), ErrorKind::TypeMismatch);
    }

    #[test]
    fn lookup_misses_are_not_errors() {
        let file = File::from_bytes(sample_image(Layout::Elf64Msb)).unwrap();
        assert!(file.section_by_name("nonexistent").unwrap().is_none());
        assert!(file.section(99_999).is_none());
        assert!(file.section(file.section_count()).is_none());
    }

    #[test]
    fn file_without_sections() {
        let file = File::from_bytes(ImageBuilder::bare(Layout::Elf32Msb).build()).unwrap();
        assert!(file.sections().is_empty());
        assert_eq!(file.section_name_index(), None);
        assert!(file.section(0).is_none());
        assert!(file.section_by_name(".text").unwrap().is_none());
    }

    #[test]
    fn reject_bad_magic() {
        let mut image = sample_image(Layout::Elf64Lsb);
        image[0] = 0x00;
        let err = File::from_bytes(image).unwrap_err();
        assert!(matches!(err, ElfError::BadMagic));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn reject_bad_ident_version() {
        let mut image = sample_image(Layout::Elf64Lsb);
        image[6] = 2;
        assert!(matches!(
            File::from_bytes(image),
            Err(ElfError::BadIdentVersion(2))
        ));
    }

    #[test]
    fn reject_bad_class() {
        let mut image = sample_image(Layout::Elf32Lsb);
        image[4] = 0;
        let err = File::from_bytes(image).unwrap_err();
        assert!(matches!(err, ElfError::BadClass(0)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn reject_bad_data_encoding() {
        let mut image = sample_image(Layout::Elf32Msb);
        image[5] = 3;
        let err = File::from_bytes(image).unwrap_err();
        assert!(matches!(err, ElfError::BadDataEncoding(3)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn reject_bad_version() {
        let mut image = sample_image(Layout::Elf64Msb);
        patch_header(&mut image, |hdr| hdr.e_version = 2);
        assert!(matches!(File::from_bytes(image), Err(ElfError::BadVersion(2))));
    }

    #[test]
    fn reject_bad_string_table_index() {
        let mut image = sample_image(Layout::Elf32Lsb);
        patch_header(&mut image, |hdr| hdr.e_shstrndx = hdr.e_shnum);
        assert!(matches!(
            File::from_bytes(image),
            Err(ElfError::BadStringTableIndex { index: 6, count: 6 })
        ));
    }

    #[test]
    fn reject_short_image() {
        assert!(matches!(File::from_bytes(b"\x7fELF".to_vec()), Err(ElfError::BadMagic)));
        assert!(matches!(File::from_bytes(Vec::new()), Err(ElfError::BadMagic)));
    }

    #[test]
    fn truncated_header_is_a_load_error() {
        let mut image = sample_image(Layout::Elf64Lsb);
        image.truncate(40);
        assert_eq!(File::from_bytes(image).unwrap_err().kind(), ErrorKind::Load);
    }

    #[test]
    fn truncated_section_table_is_a_load_error() {
        let mut image = sample_image(Layout::Elf32Msb);
        image.truncate(image.len() - 1);
        let err = File::from_bytes(image).unwrap_err();
        assert!(matches!(err, ElfError::Load(LoadError::OutOfBounds { .. })));
    }

    #[test]
    fn reject_small_entry_size() {
        let mut image = sample_image(Layout::Elf64Lsb);
        patch_header(&mut image, |hdr| hdr.e_shentsize = 40);
        assert!(matches!(
            File::from_bytes(image),
            Err(ElfError::BadSectionEntrySize { found: 40, required: 64 })
        ));
    }

    #[test]
    fn larger_entry_size_is_skipped_over() {
        // Each ELF32 entry padded to 48 bytes; only the first 40 are decoded.
        let layout = Layout::Elf32Lsb;
        let mut builder = ImageBuilder::bare(layout);
        builder.push(empty_header(SectionType::STRTAB, 1), b"\0.names\0");
        let mut image = builder.build();
        let table = builder.section_header_offset(0);
        image.resize(table + 48, 0xee);
        patch_header(&mut image, |hdr| hdr.e_shentsize = 48);

        let file = File::from_bytes(image).unwrap();
        assert_eq!(file.section(0).unwrap().name().unwrap(), ".names");
    }

    #[test]
    fn reject_too_many_sections() {
        let options = ElfOptions {
            max_sections: 3,
            ..ElfOptions::default()
        };
        let loader = Arc::new(MemoryLoader::new(sample_image(Layout::Elf64Lsb)));
        assert!(matches!(
            File::open_with(loader, &options),
            Err(ElfError::TooManySections { count: 6, limit: 3 })
        ));
    }

    #[test]
    fn extended_numbering() {
        for layout in Layout::ALL {
            let mut builder = ImageBuilder::new(layout);
            builder.section(".text", SectionType::PROGBITS, b"\xc3");
            builder.extended_numbering();
            let file = File::from_bytes(builder.build()).unwrap();

            assert_eq!(file.header().e_shnum, 0);
            assert_eq!(file.header().e_shstrndx, SHN_XINDEX);
            assert_eq!(file.section_count(), 3);
            assert_eq!(file.section_name_index(), Some(2));
            assert_eq!(file.section(1).unwrap().name().unwrap(), ".text");
        }
    }

    #[test]
    fn eager_open_resolves_everything() {
        let loader = CountingLoader::new(sample_image(Layout::Elf64Lsb));
        let options = ElfOptions {
            eager: true,
            ..ElfOptions::default()
        };
        let file = File::open_with(loader.clone(), &options).unwrap();
        let loads = loader.loads();
        for section in file.sections() {
            section.name().unwrap();
            section.data().unwrap();
        }
        assert_eq!(loader.loads(), loads);
    }

    #[test]
    fn eager_open_fails_atomically() {
        let mut builder = ImageBuilder::new(Layout::Elf32Lsb);
        let text = builder.section(".text", SectionType::PROGBITS, b"\xc3");
        let mut image = builder.build();
        // Give .text a name offset past the end of the name table.
        let sh = builder.section_header_offset(text);
        image[sh..sh + 4].copy_from_slice(&0x1000u32.to_le_bytes());

        let lazy = File::from_bytes(image.clone()).expect("lazy open succeeds");
        assert_eq!(lazy.section(text).unwrap().name().unwrap_err().kind(), ErrorKind::Range);

        let options = ElfOptions {
            eager: true,
            ..ElfOptions::default()
        };
        let err = File::open_with(Arc::new(MemoryLoader::new(image)), &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
    }

    #[test]
    fn name_table_must_be_a_string_table() {
        let mut image = sample_image(Layout::Elf64Lsb);
        // Point e_shstrndx at .text.
        patch_header(&mut image, |hdr| hdr.e_shstrndx = 1);
        let file = File::from_bytes(image).expect("index is in range");
        let err = file.section(2).unwrap().name().unwrap_err();
        assert!(matches!(
            err,
            ElfError::TypeMismatch {
                index: 1,
                found: SectionType::PROGBITS,
                ..
            }
        ));
        assert!(file.section_by_name(".text").is_err());
    }

    #[test]
    fn open_reads_header_table_in_one_request() {
        let loader = CountingLoader::new(sample_image(Layout::Elf32Msb));
        let file = File::open_shared(loader.clone()).unwrap();
        // Identification prefix, file header, section header table.
        assert_eq!(loader.loads(), 3);
        assert_eq!(file.section_count(), 6);
    }

    #[test]
    fn loader_is_shared() {
        let loader = CountingLoader::new(sample_image(Layout::Elf64Lsb));
        let file = File::open_shared(loader.clone()).unwrap();
        let region = file.loader().load(0, 4).unwrap();
        assert_eq!(&*region, b"\x7fELF");
        assert_eq!(loader.loads(), 4);
    }

    #[cfg(feature = "mmap")]
    #[test]
    fn open_path_maps_file() {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(&sample_image(Layout::Elf64Msb)).unwrap();
        tmp.flush().unwrap();

        let file = File::open_path(tmp.path()).unwrap();
        let comment = file.section_by_name(".comment").unwrap().unwrap();
        assert_eq!(comment.data().unwrap(), Some(&b"shelf\0"[..]));
    }

    #[test]
    fn open_path_missing_file() {
        let err = File::open_path("/nonexistent/shelf/a.out").unwrap_err();
        assert!(matches!(err, ElfError::Load(LoadError::Io(_))));
    }

    #[test]
    fn file_and_sections_are_thread_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<File>();
        assert_send_sync::<Section>();
    }

    #[test]
    fn concurrent_first_access() {
        let file = File::from_bytes(sample_image(Layout::Elf64Lsb)).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    let text = file.section_by_name(".text").unwrap().unwrap();
                    assert_eq!(text.data().unwrap().unwrap().len(), 5);
                });
            }
        });
    }
}
