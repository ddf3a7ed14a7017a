//! Coded character set tables.
//!
//! A [`CcsTable`] maps codes of one character set to UCS (or back) using one
//! of three layouts:
//!
//! - **8-bit speed**: to UCS a flat 256-word array; from UCS a word holding
//!   the UCS code of byte `0xFF`, a 256-word block index of byte offsets and
//!   256-byte blocks where `0xFF` marks an unmapped code.
//! - **16-bit speed**: a 256-word block index (one entry per high byte,
//!   [`INVBLK`] for empty blocks) followed by 256-word blocks.
//! - **16-bit size**: a header `[ranges, unranged, first_unranged]`, then
//!   `(left, right, index)` range triples, range data and sorted
//!   `(code, value)` pairs for codes outside any range.
//!
//! Lookups never index past the table, so a malformed external table yields
//! unmapped codes instead of a panic.

use std::borrow::Cow;
use std::collections::BTreeMap;

use byteorder::{ByteOrder, NativeEndian};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Unmapped code marker
pub const INVALC: u16 = 0xFFFF;

/// Empty block marker in speed tables
pub const INVBLK: u16 = 0xFFFF;

const RANGES_NUM_INDEX: usize = 0;
const UNRANGED_NUM_INDEX: usize = 1;
const FIRST_UNRANGED_INDEX_INDEX: usize = 2;
const FIRST_RANGE_INDEX: usize = 3;

/// Shortest run of consecutive codes stored as a range in size tables.
const MIN_RANGE_LEN: usize = 4;

/// Words before the first block of an 8-bit from-UCS table.
const BYTE_TABLE_HEADER_WORDS: usize = 1 + 256;

/// Which way a table (or a converter) maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Character set code to UCS
    ToUcs,
    /// UCS to character set code
    FromUcs,
}

/// Byte order of multi-byte units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endian {
    /// Most significant byte first
    Big,
    /// Least significant byte first
    Little,
}

impl Endian {
    /// Byte order of the running host.
    pub fn host() -> Self {
        if cfg!(target_endian = "little") {
            Endian::Little
        } else {
            Endian::Big
        }
    }
}

/// Code width of a character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Bits {
    /// One byte per code
    Eight,
    /// Two bytes per code
    Sixteen,
}

impl Bits {
    /// Bytes per encoded code.
    pub fn bytes(self) -> usize {
        match self {
            Bits::Eight => 1,
            Bits::Sixteen => 2,
        }
    }

    /// Value stored in the `bits` field of a table file.
    pub fn as_u16(self) -> u16 {
        match self {
            Bits::Eight => 8,
            Bits::Sixteen => 16,
        }
    }

    /// Parse the `bits` field of a table file.
    pub fn from_u16(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(Bits::Eight),
            16 => Some(Bits::Sixteen),
            _ => None,
        }
    }
}

/// Table layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Optimization {
    /// Binary-searched ranges and singletons
    Size,
    /// Direct two-level index
    Speed,
}

/// Where a table's data lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TableOrigin {
    /// Compiled into the library
    BuiltIn,
    /// Loaded from a `.cct` file
    External,
}

/// One direction of a character set mapping.
#[derive(Debug, Clone)]
pub struct CcsTable {
    name: Cow<'static, str>,
    direction: Direction,
    bits: Bits,
    origin: TableOrigin,
    optimization: Optimization,
    data: Cow<'static, [u16]>,
}

impl CcsTable {
    /// Wrap static data of a compiled-in table.
    pub fn builtin(
        name: &'static str,
        direction: Direction,
        bits: Bits,
        optimization: Optimization,
        data: &'static [u16],
    ) -> Self {
        Self {
            name: Cow::Borrowed(name),
            direction,
            bits,
            origin: TableOrigin::BuiltIn,
            optimization: effective_optimization(bits, optimization),
            data: Cow::Borrowed(data),
        }
    }

    /// Take ownership of data read from a table file.
    pub fn external(
        name: &str,
        direction: Direction,
        bits: Bits,
        optimization: Optimization,
        data: Vec<u16>,
    ) -> Self {
        Self {
            name: Cow::Owned(name.to_string()),
            direction,
            bits,
            origin: TableOrigin::External,
            optimization: effective_optimization(bits, optimization),
            data: Cow::Owned(data),
        }
    }

    /// Character set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Mapping direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Code width.
    pub fn bits(&self) -> Bits {
        self.bits
    }

    /// Built-in or external.
    pub fn origin(&self) -> TableOrigin {
        self.origin
    }

    /// Layout of the data.
    pub fn optimization(&self) -> Optimization {
        self.optimization
    }

    /// Size of the table data in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len() * 2
    }

    /// Map `code`, returning `None` when it has no mapping.
    #[inline]
    pub fn lookup(&self, code: u16) -> Option<u16> {
        if code == INVALC {
            return None;
        }
        let tbl = &self.data[..];
        let found = match (self.bits, self.direction, self.optimization) {
            (Bits::Eight, Direction::ToUcs, _) => {
                if code > 0xFF {
                    return None;
                }
                tbl.get(code as usize).copied()
            }
            (Bits::Eight, Direction::FromUcs, _) => find_code_speed_8bit(code, tbl),
            (Bits::Sixteen, _, Optimization::Speed) => find_code_speed(code, tbl),
            (Bits::Sixteen, _, Optimization::Size) => find_code_size(code, tbl),
        };
        found.filter(|&c| c != INVALC)
    }
}

fn effective_optimization(bits: Bits, requested: Optimization) -> Optimization {
    match bits {
        Bits::Eight => Optimization::Speed,
        Bits::Sixteen => requested,
    }
}

/// Byte at byte offset `off` of a table kept as native-order words.
#[inline]
fn table_byte(tbl: &[u16], off: usize) -> Option<u8> {
    tbl.get(off / 2).map(|w| w.to_ne_bytes()[off % 2])
}

fn find_code_speed_8bit(code: u16, tbl: &[u16]) -> Option<u16> {
    if Some(&code) == tbl.first() {
        return Some(0xFF);
    }
    let idx = *tbl.get(1 + (code >> 8) as usize)?;
    if idx == INVBLK {
        return None;
    }
    let ccs = table_byte(tbl, idx as usize + (code & 0xFF) as usize)?;
    if ccs == 0xFF { None } else { Some(ccs as u16) }
}

fn find_code_speed(code: u16, tbl: &[u16]) -> Option<u16> {
    let idx = *tbl.get((code >> 8) as usize)?;
    if idx == INVBLK {
        return None;
    }
    tbl.get(idx as usize + (code & 0xFF) as usize).copied()
}

fn find_code_size(code: u16, tbl: &[u16]) -> Option<u16> {
    let ranges = *tbl.get(RANGES_NUM_INDEX)? as usize;
    let unranged = *tbl.get(UNRANGED_NUM_INDEX)? as usize;
    let first_unranged = *tbl.get(FIRST_UNRANGED_INDEX_INDEX)? as usize;

    let triples = tbl.get(FIRST_RANGE_INDEX..FIRST_RANGE_INDEX + ranges * 3)?;
    let (mut lo, mut hi) = (0, ranges);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let (left, right, index) = (triples[mid * 3], triples[mid * 3 + 1], triples[mid * 3 + 2]);
        if code > right {
            lo = mid + 1;
        } else if code < left {
            hi = mid;
        } else {
            return tbl.get(index as usize + (code - left) as usize).copied();
        }
    }

    let pairs = tbl.get(first_unranged..first_unranged + unranged * 2)?;
    let (mut lo, mut hi) = (0, unranged);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let key = pairs[mid * 2];
        if code > key {
            lo = mid + 1;
        } else if code < key {
            hi = mid;
        } else {
            return Some(pairs[mid * 2 + 1]);
        }
    }
    None
}

/// Convert a host-order table image into words.
pub(crate) fn words_from_native(name: &str, bytes: &[u8]) -> Result<Vec<u16>> {
    if bytes.len() % 2 != 0 {
        return Err(Error::table_load(name, "odd table length"));
    }
    let mut words = Vec::new();
    words.try_reserve_exact(bytes.len() / 2)?;
    words.resize(bytes.len() / 2, 0);
    NativeEndian::read_u16_into(bytes, &mut words);
    Ok(words)
}

enum Layout {
    Words(Vec<u16>),
    Bytes { header: Vec<u16>, blocks: Vec<u8> },
}

/// Builds table images from a list of `(ccs, ucs)` pairs.
///
/// ```
/// use ucsconv::ccs::{Bits, Direction, Optimization, TableBuilder};
///
/// let mut builder = TableBuilder::new("demo", Bits::Eight);
/// builder.map(0xC1, 0x0411);
/// let table = builder.build(Direction::FromUcs, Optimization::Speed).unwrap();
/// assert_eq!(table.lookup(0x0411), Some(0xC1));
/// assert_eq!(table.lookup(0x0412), None);
/// ```
#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    bits: Bits,
    to_ucs: BTreeMap<u16, u16>,
}

impl TableBuilder {
    /// An empty mapping.
    pub fn new(name: impl Into<String>, bits: Bits) -> Self {
        Self {
            name: name.into(),
            bits,
            to_ucs: BTreeMap::new(),
        }
    }

    /// Character set name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Code width.
    pub fn bits(&self) -> Bits {
        self.bits
    }

    /// Number of mapped codes.
    pub fn len(&self) -> usize {
        self.to_ucs.len()
    }

    /// True if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.to_ucs.is_empty()
    }

    /// Map character set code `ccs` to `ucs`.
    ///
    /// Codes wider than the table and [`INVALC`] values are ignored.
    pub fn map(&mut self, ccs: u16, ucs: u16) -> &mut Self {
        let fits = match self.bits {
            Bits::Eight => ccs <= 0xFF,
            Bits::Sixteen => ccs != INVALC,
        };
        if fits && ucs != INVALC {
            self.to_ucs.insert(ccs, ucs);
        }
        self
    }

    /// Map every code in `codes` to itself.
    pub fn map_identity(&mut self, codes: std::ops::RangeInclusive<u16>) -> &mut Self {
        for code in codes {
            self.map(code, code);
        }
        self
    }

    /// The UCS to character set direction, first code wins for duplicates.
    fn from_ucs(&self) -> BTreeMap<u16, u16> {
        let mut inverse = BTreeMap::new();
        for (&ccs, &ucs) in &self.to_ucs {
            inverse.entry(ucs).or_insert(ccs);
        }
        inverse
    }

    fn mapping(&self, direction: Direction) -> BTreeMap<u16, u16> {
        match direction {
            Direction::ToUcs => self.to_ucs.clone(),
            Direction::FromUcs => self.from_ucs(),
        }
    }

    fn layout(&self, direction: Direction, optimization: Optimization) -> Result<Layout> {
        match (self.bits, direction) {
            (Bits::Eight, Direction::ToUcs) => {
                let mut words = vec![INVALC; 256];
                for (&ccs, &ucs) in &self.to_ucs {
                    words[ccs as usize] = ucs;
                }
                Ok(Layout::Words(words))
            }
            (Bits::Eight, Direction::FromUcs) => self.byte_layout(),
            (Bits::Sixteen, _) => {
                let mapping = self.mapping(direction);
                let words = match optimization {
                    Optimization::Speed => self.speed_layout(&mapping)?,
                    Optimization::Size => self.size_layout(&mapping)?,
                };
                Ok(Layout::Words(words))
            }
        }
    }

    fn byte_layout(&self) -> Result<Layout> {
        let mut header = vec![INVBLK; BYTE_TABLE_HEADER_WORDS];
        header[0] = INVALC;
        let mut blocks: Vec<u8> = Vec::new();

        for (ucs, ccs) in self.from_ucs() {
            if ccs == 0xFF {
                header[0] = ucs;
                continue;
            }
            let slot = 1 + (ucs >> 8) as usize;
            if header[slot] == INVBLK {
                let offset = BYTE_TABLE_HEADER_WORDS * 2 + blocks.len();
                if offset + 256 > INVBLK as usize {
                    return Err(Error::table_load(&self.name, "too many blocks for speed layout"));
                }
                header[slot] = offset as u16;
                blocks.resize(blocks.len() + 256, 0xFF);
            }
            let at = header[slot] as usize - BYTE_TABLE_HEADER_WORDS * 2 + (ucs & 0xFF) as usize;
            blocks[at] = ccs as u8;
        }
        Ok(Layout::Bytes { header, blocks })
    }

    fn speed_layout(&self, mapping: &BTreeMap<u16, u16>) -> Result<Vec<u16>> {
        let mut words = vec![INVBLK; 256];
        for (&code, &value) in mapping {
            let hi = (code >> 8) as usize;
            if words[hi] == INVBLK {
                let start = words.len();
                if start + 256 > INVBLK as usize {
                    return Err(Error::table_load(&self.name, "too many blocks for speed layout"));
                }
                words[hi] = start as u16;
                words.resize(start + 256, INVALC);
            }
            let at = words[hi] as usize + (code & 0xFF) as usize;
            words[at] = value;
        }
        Ok(words)
    }

    fn size_layout(&self, mapping: &BTreeMap<u16, u16>) -> Result<Vec<u16>> {
        let entries: Vec<(u16, u16)> = mapping.iter().map(|(&c, &v)| (c, v)).collect();

        let mut ranges: Vec<&[(u16, u16)]> = Vec::new();
        let mut singles: Vec<(u16, u16)> = Vec::new();
        let mut start = 0;
        while start < entries.len() {
            let mut end = start + 1;
            while end < entries.len() && entries[end].0 == entries[end - 1].0 + 1 {
                end += 1;
            }
            if end - start >= MIN_RANGE_LEN {
                ranges.push(&entries[start..end]);
            } else {
                singles.extend_from_slice(&entries[start..end]);
            }
            start = end;
        }

        let range_data: usize = ranges.iter().map(|r| r.len()).sum();
        let total = FIRST_RANGE_INDEX + ranges.len() * 3 + range_data + singles.len() * 2;
        if total > u16::MAX as usize {
            return Err(Error::table_load(&self.name, "mapping too large for size layout"));
        }

        let first_unranged = FIRST_RANGE_INDEX + ranges.len() * 3 + range_data;
        let mut words = Vec::with_capacity(total);
        words.push(ranges.len() as u16);
        words.push(singles.len() as u16);
        words.push(first_unranged as u16);

        let mut data_at = FIRST_RANGE_INDEX + ranges.len() * 3;
        for range in &ranges {
            words.push(range[0].0);
            words.push(range[range.len() - 1].0);
            words.push(data_at as u16);
            data_at += range.len();
        }
        for range in &ranges {
            words.extend(range.iter().map(|&(_, v)| v));
        }
        for (code, value) in singles {
            words.push(code);
            words.push(value);
        }
        Ok(words)
    }

    /// Serialized table data in byte order `O`, as stored in a `.cct` file.
    pub fn image<O: ByteOrder>(
        &self,
        direction: Direction,
        optimization: Optimization,
    ) -> Result<Vec<u8>> {
        let optimization = effective_optimization(self.bits, optimization);
        let image = match self.layout(direction, optimization)? {
            Layout::Words(words) => {
                let mut out = vec![0u8; words.len() * 2];
                O::write_u16_into(&words, &mut out);
                out
            }
            Layout::Bytes { header, blocks } => {
                let mut out = vec![0u8; header.len() * 2];
                O::write_u16_into(&header, &mut out);
                out.extend_from_slice(&blocks);
                out
            }
        };
        Ok(image)
    }

    /// Host-order table data.
    pub fn words(&self, direction: Direction, optimization: Optimization) -> Result<Vec<u16>> {
        words_from_native(&self.name, &self.image::<NativeEndian>(direction, optimization)?)
    }

    /// An owned table for one direction.
    pub fn build(&self, direction: Direction, optimization: Optimization) -> Result<CcsTable> {
        let words = self.words(direction, optimization)?;
        Ok(CcsTable::external(
            &self.name,
            direction,
            self.bits,
            optimization,
            words,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_8bit() -> TableBuilder {
        let mut builder = TableBuilder::new("sample", Bits::Eight);
        builder.map_identity(0x00..=0x7F);
        builder.map(0x80, 0x20AC).map(0xA4, 0x00A4).map(0xFF, 0x0451);
        builder
    }

    fn sample_16bit() -> TableBuilder {
        let mut builder = TableBuilder::new("sample16", Bits::Sixteen);
        for i in 0..40u16 {
            builder.map(0x2421 + i, 0x3041 + i);
        }
        builder.map(0x2121, 0x3000).map(0x2A21, 0x00C1).map(0x7E7E, 0x9ED1);
        builder
    }

    #[test]
    fn test_8bit_to_ucs() {
        let table = sample_8bit().build(Direction::ToUcs, Optimization::Speed).unwrap();
        assert_eq!(table.lookup(0x41), Some(0x41));
        assert_eq!(table.lookup(0x80), Some(0x20AC));
        assert_eq!(table.lookup(0xFF), Some(0x0451));
        assert_eq!(table.lookup(0x81), None);
        assert_eq!(table.lookup(0x100), None);
    }

    #[test]
    fn test_8bit_from_ucs() {
        let table = sample_8bit().build(Direction::FromUcs, Optimization::Speed).unwrap();
        assert_eq!(table.lookup(0x41), Some(0x41));
        assert_eq!(table.lookup(0x20AC), Some(0x80));
        assert_eq!(table.lookup(0x00A4), Some(0xA4));
        assert_eq!(table.lookup(0x0451), Some(0xFF));
        assert_eq!(table.lookup(0x0452), None);
        assert_eq!(table.lookup(0x00A5), None);
    }

    #[test]
    fn test_8bit_forces_speed_layout() {
        let table = sample_8bit().build(Direction::ToUcs, Optimization::Size).unwrap();
        assert_eq!(table.optimization(), Optimization::Speed);
        assert_eq!(table.lookup(0x80), Some(0x20AC));
    }

    #[test]
    fn test_16bit_layouts_agree() {
        let builder = sample_16bit();
        for direction in [Direction::ToUcs, Direction::FromUcs] {
            let speed = builder.build(direction, Optimization::Speed).unwrap();
            let size = builder.build(direction, Optimization::Size).unwrap();
            assert!(size.byte_len() < speed.byte_len());
            for code in 0..=0xFFFEu16 {
                assert_eq!(speed.lookup(code), size.lookup(code), "code {:04X}", code);
            }
        }
    }

    #[test]
    fn test_16bit_lookups() {
        let builder = sample_16bit();
        let to = builder.build(Direction::ToUcs, Optimization::Size).unwrap();
        assert_eq!(to.lookup(0x2422), Some(0x3042));
        assert_eq!(to.lookup(0x2A21), Some(0x00C1));
        assert_eq!(to.lookup(0x2A22), None);
        let from = builder.build(Direction::FromUcs, Optimization::Speed).unwrap();
        assert_eq!(from.lookup(0x9ED1), Some(0x7E7E));
        assert_eq!(from.lookup(0x3000), Some(0x2121));
        assert_eq!(from.lookup(0x3001), None);
    }

    #[test]
    fn test_truncated_table_is_not_a_panic() {
        let words = sample_16bit()
            .words(Direction::ToUcs, Optimization::Speed)
            .unwrap();
        let table = CcsTable::external(
            "cut",
            Direction::ToUcs,
            Bits::Sixteen,
            Optimization::Speed,
            words[..300].to_vec(),
        );
        assert_eq!(table.lookup(0x2470), None);

        let garbage = CcsTable::external(
            "garbage",
            Direction::FromUcs,
            Bits::Sixteen,
            Optimization::Size,
            vec![9, 9, 9],
        );
        assert_eq!(garbage.lookup(0x1234), None);
    }
}
