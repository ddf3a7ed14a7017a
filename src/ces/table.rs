//! Table driven single character set encodings.

use log::debug;

use crate::ccs::{Bits, CcsTable, Direction};
use crate::config::Config;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::{CesError, Error, Result};
use crate::{external, tables};

/// Find the table for `name`, built-in first, then on disk.
pub fn open_table(name: &str, direction: Direction, config: &Config) -> Result<CcsTable> {
    if let Some(table) = tables::builtin(name, direction) {
        debug!("using built-in CCS table {} ({:?})", name, direction);
        return Ok(table);
    }
    if !config.external_tables {
        return Err(Error::UnsupportedEncoding(name.to_string()));
    }
    external::load(config, name, direction)
}

/// A character set encoded as its plain 8- or 16-bit codes.
#[derive(Debug, Clone)]
pub struct TableCodec {
    table: CcsTable,
}

impl TableCodec {
    /// Codec for `name` mapping in `direction`.
    pub fn open(name: &str, direction: Direction, config: &Config) -> Result<Self> {
        Ok(Self::new(open_table(name, direction, config)?))
    }

    /// Codec over an already loaded table.
    pub fn new(table: CcsTable) -> Self {
        Self { table }
    }

    /// The underlying table.
    pub fn table(&self) -> &CcsTable {
        &self.table
    }

    /// Bytes per code.
    pub fn max_char_len(&self) -> usize {
        self.table.bits().bytes()
    }

    /// Character set code for `code`, without writing anything.
    #[inline]
    pub fn map_from_ucs(&self, code: u32) -> Option<u16> {
        if code >= 0xFFFF {
            return None;
        }
        self.table.lookup(code as u16)
    }

    /// Decode one code read big-endian from `input`.
    pub fn decode(&self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let width = self.max_char_len();
        let bytes = input.remaining();
        if bytes.len() < width {
            return Err(CesError::BadSequence);
        }
        let code = match self.table.bits() {
            Bits::Eight => bytes[0] as u16,
            Bits::Sixteen => u16::from_be_bytes([bytes[0], bytes[1]]),
        };
        let ucs = self
            .table
            .lookup(code)
            .ok_or(CesError::InvalidCharacter)?;
        input.advance(width);
        Ok(ucs as u32)
    }

    /// Encode `code` as its big-endian character set code.
    pub fn encode<S: ByteSink>(&self, code: u32, out: &mut S) -> Result<usize, CesError> {
        let mapped = self.map_from_ucs(code).ok_or(CesError::InvalidCharacter)?;
        match self.table.bits() {
            Bits::Eight => out.put(&[mapped as u8])?,
            Bits::Sixteen => out.put(&mapped.to_be_bytes())?,
        }
        Ok(self.max_char_len())
    }
}

/// A table codec whose 7-bit range passes through unchanged.
#[derive(Debug, Clone)]
pub struct TablePcs {
    inner: TableCodec,
}

impl TablePcs {
    /// Codec for `name` mapping in `direction`.
    pub fn open(name: &str, direction: Direction, config: &Config) -> Result<Self> {
        Ok(Self {
            inner: TableCodec::open(name, direction, config)?,
        })
    }

    /// The table used above 0x7F.
    pub fn table(&self) -> &CcsTable {
        self.inner.table()
    }

    /// Bytes per code of the underlying table.
    pub fn max_char_len(&self) -> usize {
        self.inner.max_char_len()
    }

    /// Decode one character.
    pub fn decode(&self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        let &lead = input.remaining().first().ok_or(CesError::BadSequence)?;
        if lead < 0x80 {
            input.advance(1);
            return Ok(lead as u32);
        }
        self.inner.decode(input)
    }

    /// Encode one character.
    pub fn encode<S: ByteSink>(&self, code: u32, out: &mut S) -> Result<usize, CesError> {
        if code < 0x80 {
            out.put(&[code as u8])?;
            return Ok(1);
        }
        self.inner.encode(code, out)
    }
}
