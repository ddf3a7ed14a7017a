//! External `.cct` table files.
//!
//! All header fields are big-endian:
//!
//! | offset | size | field |
//! | --- | --- | --- |
//! | 0 | 2 | version, always 1 |
//! | 2 | 2 | bits, 8 or 16 |
//! | 4 | 4 | name length |
//! | 8 | n | name, zero padded to a multiple of 4 |
//! | 8 + n | 64 | eight `(offset, length)` pairs |
//!
//! The pairs are ordered from-UCS speed BE, speed LE, size BE, size LE, then
//! the same four for to-UCS. Table data is stored once per byte order; only
//! the copy matching the host is read. A zero offset means the file has no
//! table for that slot.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use log::{debug, warn};

use crate::ccs::{self, Bits, CcsTable, Direction, Endian, Optimization, TableBuilder};
use crate::config::Config;
use crate::error::{Error, Result};

/// Only supported file format version
pub const TABLE_VERSION: u16 = 1;

const NAME_OFFSET: u64 = 8;
const SLOTS: usize = 8;

/// Parsed `.cct` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableHeader {
    /// Format version
    pub version: u16,
    /// Raw `bits` field
    pub bits: u16,
    /// Character set name stored in the file
    pub name: String,
    /// `(offset, length)` of every table slot
    pub slots: [(u32, u32); SLOTS],
}

/// Index into [`TableHeader::slots`].
pub fn slot(direction: Direction, optimization: Optimization, endian: Endian) -> usize {
    let base = match direction {
        Direction::FromUcs => 0,
        Direction::ToUcs => 4,
    };
    let layout = match optimization {
        Optimization::Speed => 0,
        Optimization::Size => 2,
    };
    let order = match endian {
        Endian::Big => 0,
        Endian::Little => 1,
    };
    base + layout + order
}

fn padded(len: usize) -> usize {
    (len + 3) & !3
}

fn classify(name: &str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::table_load(name, "truncated file")
    } else {
        Error::Io {
            name: name.to_string(),
            source: err,
        }
    }
}

/// Read and validate the header of a table file.
pub fn read_header<R: Read>(reader: &mut R, name: &str) -> Result<TableHeader> {
    let err = |e| classify(name, e);

    let version = reader.read_u16::<BigEndian>().map_err(err)?;
    let bits = reader.read_u16::<BigEndian>().map_err(err)?;
    let name_len = reader.read_u32::<BigEndian>().map_err(err)? as usize;

    if version != TABLE_VERSION {
        return Err(Error::table_load(name, format!("unsupported version {}", version)));
    }
    if name_len != name.len() {
        return Err(Error::table_load(name, "name mismatch"));
    }

    let mut stored = vec![0u8; padded(name_len)];
    reader.read_exact(&mut stored).map_err(err)?;
    if &stored[..name_len] != name.as_bytes() {
        return Err(Error::table_load(name, "name mismatch"));
    }

    let mut slots = [(0u32, 0u32); SLOTS];
    for slot in slots.iter_mut() {
        let offset = reader.read_u32::<BigEndian>().map_err(err)?;
        let len = reader.read_u32::<BigEndian>().map_err(err)?;
        *slot = (offset, len);
    }

    Ok(TableHeader {
        version,
        bits,
        name: name.to_string(),
        slots,
    })
}

/// Load the table for `name` in `direction` from the configured search root.
pub fn load(config: &Config, name: &str, direction: Direction) -> Result<CcsTable> {
    let path = config.table_path(name);
    debug!("loading external CCS table {} from {}", name, path.display());
    let result = load_from(&path, name, direction, config.table_optimization);
    if let Err(err) = &result {
        warn!("cannot load CCS table {}: {}", name, err);
    }
    result
}

/// Load the table for `name` in `direction` from an explicit file.
pub fn load_from(
    path: &Path,
    name: &str,
    direction: Direction,
    optimization: Optimization,
) -> Result<CcsTable> {
    let mut file = File::open(path).map_err(|e| classify(name, e))?;
    let header = read_header(&mut file, name)?;

    let bits = Bits::from_u16(header.bits)
        .ok_or_else(|| Error::table_load(name, format!("unsupported width {}", header.bits)))?;
    let optimization = match bits {
        Bits::Eight => Optimization::Speed,
        Bits::Sixteen => optimization,
    };

    let (offset, len) = header.slots[slot(direction, optimization, Endian::host())];
    if offset == 0 {
        return Err(Error::table_load(name, "no table for requested direction"));
    }

    let file_len = file.metadata().map_err(|e| classify(name, e))?.len();
    if offset as u64 + len as u64 > file_len {
        return Err(Error::table_load(
            name,
            format!("table slot {}+{} exceeds file size {}", offset, len, file_len),
        ));
    }

    let mut image = Vec::new();
    image.try_reserve_exact(len as usize)?;
    image.resize(len as usize, 0);
    file.seek(SeekFrom::Start(offset as u64))
        .map_err(|e| classify(name, e))?;
    file.read_exact(&mut image).map_err(|e| classify(name, e))?;

    let words = ccs::words_from_native(name, &image)?;
    Ok(CcsTable::external(name, direction, bits, optimization, words))
}

/// Serializes a [`TableBuilder`] mapping as a `.cct` file.
///
/// Every direction is written in both byte orders. 16-bit mappings get both
/// layouts; 8-bit mappings only the speed layout.
#[derive(Debug)]
pub struct TableFileWriter<'a> {
    builder: &'a TableBuilder,
}

impl<'a> TableFileWriter<'a> {
    /// Writer for `builder`.
    pub fn new(builder: &'a TableBuilder) -> Self {
        Self { builder }
    }

    fn image(
        &self,
        direction: Direction,
        optimization: Optimization,
        endian: Endian,
    ) -> Result<Vec<u8>> {
        match endian {
            Endian::Big => self.builder.image::<BigEndian>(direction, optimization),
            Endian::Little => self.builder.image::<LittleEndian>(direction, optimization),
        }
    }

    /// The complete file contents.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let name = self.builder.name().as_bytes();
        let header_len = NAME_OFFSET as usize + padded(name.len()) + SLOTS * 8;

        let optimizations: &[Optimization] = match self.builder.bits() {
            Bits::Eight => &[Optimization::Speed],
            Bits::Sixteen => &[Optimization::Speed, Optimization::Size],
        };

        let mut slots = [(0u32, 0u32); SLOTS];
        let mut body = Vec::new();
        for direction in [Direction::FromUcs, Direction::ToUcs] {
            for &optimization in optimizations {
                for endian in [Endian::Big, Endian::Little] {
                    let image = self.image(direction, optimization, endian)?;
                    let offset = header_len + body.len();
                    slots[slot(direction, optimization, endian)] =
                        (offset as u32, image.len() as u32);
                    body.extend_from_slice(&image);
                    body.resize(padded(body.len()), 0);
                }
            }
        }

        let mut out = Vec::with_capacity(header_len + body.len());
        let mut word = [0u8; 4];
        BigEndian::write_u16(&mut word, TABLE_VERSION);
        out.extend_from_slice(&word[..2]);
        BigEndian::write_u16(&mut word, self.builder.bits().as_u16());
        out.extend_from_slice(&word[..2]);
        BigEndian::write_u32(&mut word, name.len() as u32);
        out.extend_from_slice(&word);
        out.extend_from_slice(name);
        out.resize(NAME_OFFSET as usize + padded(name.len()), 0);
        for (offset, len) in slots {
            BigEndian::write_u32(&mut word, offset);
            out.extend_from_slice(&word);
            BigEndian::write_u32(&mut word, len);
            out.extend_from_slice(&word);
        }
        out.extend_from_slice(&body);
        Ok(out)
    }

    /// Write the file to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let io_err = |source| Error::Io {
            name: self.builder.name().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(path, bytes).map_err(io_err)
    }

    /// Write the file where `config` will look for it.
    pub fn install(&self, config: &Config) -> Result<()> {
        self.write_to(&config.table_path(self.builder.name()))
    }
}

/// Stream a header onto `out`, for tools that patch files in place.
pub fn write_header<W: io::Write>(out: &mut W, header: &TableHeader) -> io::Result<()> {
    out.write_u16::<BigEndian>(header.version)?;
    out.write_u16::<BigEndian>(header.bits)?;
    out.write_u32::<BigEndian>(header.name.len() as u32)?;
    out.write_all(header.name.as_bytes())?;
    for _ in header.name.len()..padded(header.name.len()) {
        out.write_u8(0)?;
    }
    for (offset, len) in header.slots {
        out.write_u32::<BigEndian>(offset)?;
        out.write_u32::<BigEndian>(len)?;
    }
    Ok(())
}
