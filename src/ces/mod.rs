//! Character encoding schemes.
//!
//! A [`Decoder`] turns bytes of one encoding into UCS code points and an
//! [`Encoder`] does the reverse. Both dispatch over the same set of scheme
//! implementations; which one handles a canonical name is decided by the
//! [`TO_UCS`] and [`FROM_UCS`] registries.

pub mod ascii;
pub mod euc;
pub mod table;
pub mod ucs;
pub mod utf_16;
pub mod utf_8;

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::debug;
use serde::Serialize;

use crate::ccs::{Direction, Endian};
use crate::config::Config;
use crate::cursor::{ByteSink, InputCursor};
use crate::error::{CesError, Error, Result};

use self::euc::Euc;
use self::table::{TableCodec, TablePcs};
use self::ucs::{Ucs2, Ucs4};
use self::utf_16::Utf16;

/// Scheme implementation selected for an encoding.
///
/// There is no pass-through variant. Sessions whose two names resolve to the
/// same encoding copy bytes directly and never open a decoder or encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CesKind {
    /// EUC composite of several character sets
    Euc,
    /// A single 8- or 16-bit character set table
    Table,
    /// A table with 7-bit pass-through
    TablePcs,
    /// Two-byte UCS
    Ucs2,
    /// Two-byte UCS in host order
    Ucs2Internal,
    /// Four-byte UCS
    Ucs4,
    /// Four-byte UCS in host order
    Ucs4Internal,
    /// 7-bit ASCII
    UsAscii,
    /// UTF-16
    Utf16,
    /// UTF-8
    Utf8,
}

/// A registry row: a scheme and the canonical names it handles.
#[derive(Debug, Clone, Copy)]
pub struct CesEntry {
    /// Scheme implementation
    pub kind: CesKind,
    /// Canonical encoding names
    pub names: &'static [&'static str],
}

const EUC_NAMES: &[&str] = &["euc_jp", "euc_kr", "euc_tw"];

const TABLE_NAMES: &[&str] = &[
    "cp775",
    "cp850",
    "cp852",
    "cp855",
    "cp866",
    "iso_8859_1",
    "iso_8859_10",
    "iso_8859_11",
    "iso_8859_13",
    "iso_8859_14",
    "iso_8859_15",
    "iso_8859_2",
    "iso_8859_3",
    "iso_8859_4",
    "iso_8859_5",
    "iso_8859_6",
    "iso_8859_7",
    "iso_8859_8",
    "iso_8859_9",
    "iso_ir_111",
    "koi8_r",
    "koi8_ru",
    "koi8_u",
    "koi8_uni",
    "win_1250",
    "win_1251",
    "win_1252",
    "win_1253",
    "win_1254",
    "win_1255",
    "win_1256",
    "win_1257",
    "win_1258",
];

const TABLE_PCS_NAMES: &[&str] = &["big5"];
const UCS_2_NAMES: &[&str] = &["ucs_2", "ucs_2be", "ucs_2le"];
const UCS_2_INTERNAL_NAMES: &[&str] = &["ucs_2_internal"];
const UCS_4_NAMES: &[&str] = &["ucs_4", "ucs_4be", "ucs_4le"];
const UCS_4_INTERNAL_NAMES: &[&str] = &["ucs_4_internal"];
const US_ASCII_NAMES: &[&str] = &["us_ascii"];
const UTF_16_NAMES: &[&str] = &["utf_16", "utf_16be", "utf_16le"];
const UTF_8_NAMES: &[&str] = &["utf_8"];

const ALL: [CesEntry; 10] = [
    CesEntry { kind: CesKind::Euc, names: EUC_NAMES },
    CesEntry { kind: CesKind::Table, names: TABLE_NAMES },
    CesEntry { kind: CesKind::TablePcs, names: TABLE_PCS_NAMES },
    CesEntry { kind: CesKind::Ucs2, names: UCS_2_NAMES },
    CesEntry { kind: CesKind::Ucs2Internal, names: UCS_2_INTERNAL_NAMES },
    CesEntry { kind: CesKind::Ucs4, names: UCS_4_NAMES },
    CesEntry { kind: CesKind::Ucs4Internal, names: UCS_4_INTERNAL_NAMES },
    CesEntry { kind: CesKind::UsAscii, names: US_ASCII_NAMES },
    CesEntry { kind: CesKind::Utf16, names: UTF_16_NAMES },
    CesEntry { kind: CesKind::Utf8, names: UTF_8_NAMES },
];

/// Schemes able to decode into UCS.
pub static TO_UCS: &[CesEntry] = &ALL;

/// Schemes able to encode from UCS.
pub static FROM_UCS: &[CesEntry] = &ALL;

/// Registry for `direction`.
pub fn registry(direction: Direction) -> &'static [CesEntry] {
    match direction {
        Direction::ToUcs => TO_UCS,
        Direction::FromUcs => FROM_UCS,
    }
}

/// Scheme handling canonical `name` in `direction`.
pub fn find(direction: Direction, name: &str) -> Option<CesKind> {
    registry(direction)
        .iter()
        .find(|entry| entry.names.contains(&name))
        .map(|entry| entry.kind)
}

/// Every canonical name either registry accepts.
pub fn supported_names() -> impl Iterator<Item = &'static str> {
    TO_UCS.iter().flat_map(|entry| entry.names.iter().copied())
}

/// Persistent per-direction state of a stateful scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    /// Nothing seen or written yet
    #[default]
    Initial,
    /// UTF-16 byte order and BOM bookkeeping
    Utf16 {
        /// Byte order adopted while decoding
        order: Option<Endian>,
        /// Whether the BOM was already written while encoding
        bom_written: bool,
    },
}

#[inline]
pub(crate) fn is_excluded(code: u32) -> bool {
    (0xD800..=0xDFFF).contains(&code) || code == 0xFFFE || code == 0xFFFF
}

#[inline]
pub(crate) fn read_u16(order: Endian, bytes: &[u8]) -> u16 {
    match order {
        Endian::Big => BigEndian::read_u16(bytes),
        Endian::Little => LittleEndian::read_u16(bytes),
    }
}

#[inline]
pub(crate) fn read_u32(order: Endian, bytes: &[u8]) -> u32 {
    match order {
        Endian::Big => BigEndian::read_u32(bytes),
        Endian::Little => LittleEndian::read_u32(bytes),
    }
}

#[inline]
pub(crate) fn write_u16(order: Endian, value: u16) -> [u8; 2] {
    let mut buf = [0u8; 2];
    match order {
        Endian::Big => BigEndian::write_u16(&mut buf, value),
        Endian::Little => LittleEndian::write_u16(&mut buf, value),
    }
    buf
}

#[inline]
pub(crate) fn write_u32(order: Endian, value: u32) -> [u8; 4] {
    let mut buf = [0u8; 4];
    match order {
        Endian::Big => BigEndian::write_u32(&mut buf, value),
        Endian::Little => LittleEndian::write_u32(&mut buf, value),
    }
    buf
}

#[derive(Debug, Clone)]
enum Codec {
    UsAscii,
    Ucs2(Ucs2),
    Ucs4(Ucs4),
    Utf8,
    Utf16(Utf16),
    Table(TableCodec),
    TablePcs(TablePcs),
    Euc(Euc),
}

impl Codec {
    fn open(name: &str, direction: Direction, config: &Config) -> Result<(CesKind, Self)> {
        let unsupported = || Error::UnsupportedEncoding(name.to_string());
        let kind = find(direction, name).ok_or_else(unsupported)?;
        let codec = match kind {
            CesKind::UsAscii => Codec::UsAscii,
            CesKind::Ucs2 | CesKind::Ucs2Internal => {
                Codec::Ucs2(Ucs2::for_name(name).ok_or_else(unsupported)?)
            }
            CesKind::Ucs4 | CesKind::Ucs4Internal => {
                Codec::Ucs4(Ucs4::for_name(name).ok_or_else(unsupported)?)
            }
            CesKind::Utf8 => Codec::Utf8,
            CesKind::Utf16 => Codec::Utf16(Utf16::for_name(name).ok_or_else(unsupported)?),
            CesKind::Table => Codec::Table(TableCodec::open(name, direction, config)?),
            CesKind::TablePcs => Codec::TablePcs(TablePcs::open(name, direction, config)?),
            CesKind::Euc => {
                let scheme = euc::scheme(name).ok_or_else(unsupported)?;
                Codec::Euc(Euc::open(scheme, direction, config)?)
            }
        };
        debug!("opened {:?} converter {:?} for {}", direction, kind, name);
        Ok((kind, codec))
    }

    fn max_char_len(&self) -> usize {
        match self {
            Codec::UsAscii => ascii::MAX_CHAR_LEN,
            Codec::Ucs2(c) => c.max_char_len(),
            Codec::Ucs4(c) => c.max_char_len(),
            Codec::Utf8 => utf_8::MAX_CHAR_LEN,
            Codec::Utf16(_) => utf_16::MAX_CHAR_LEN,
            Codec::Table(c) => c.max_char_len(),
            Codec::TablePcs(c) => c.max_char_len(),
            Codec::Euc(c) => c.max_char_len(),
        }
    }

    fn is_stateful(&self) -> bool {
        matches!(self, Codec::Utf16(c) if c.is_stateful())
    }

    fn state(&self) -> ShiftState {
        match self {
            Codec::Utf16(c) if c.is_stateful() => c.state(),
            _ => ShiftState::Initial,
        }
    }

    fn set_state(&mut self, state: ShiftState) {
        if let Codec::Utf16(c) = self {
            c.set_state(state);
        }
    }
}

/// Converts bytes of one encoding into UCS code points.
#[derive(Debug, Clone)]
pub struct Decoder {
    name: String,
    kind: CesKind,
    codec: Codec,
}

impl Decoder {
    /// Decoder for canonical encoding `name`.
    pub fn open(name: &str, config: &Config) -> Result<Self> {
        let (kind, codec) = Codec::open(name, Direction::ToUcs, config)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            codec,
        })
    }

    /// Canonical encoding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheme implementation in use.
    pub fn kind(&self) -> CesKind {
        self.kind
    }

    /// Longest byte sequence of one character.
    pub fn max_char_len(&self) -> usize {
        self.codec.max_char_len()
    }

    /// True if decoding depends on earlier input.
    pub fn is_stateful(&self) -> bool {
        self.codec.is_stateful()
    }

    /// Current shift state.
    pub fn state(&self) -> ShiftState {
        self.codec.state()
    }

    /// Replace the shift state.
    pub fn set_state(&mut self, state: ShiftState) {
        self.codec.set_state(state)
    }

    /// Decode one character, advancing `input` past it.
    ///
    /// On error `input` is left untouched.
    #[inline]
    pub fn decode(&mut self, input: &mut InputCursor<'_>) -> Result<u32, CesError> {
        match &mut self.codec {
            Codec::UsAscii => ascii::decode(input),
            Codec::Ucs2(c) => c.decode(input),
            Codec::Ucs4(c) => c.decode(input),
            Codec::Utf8 => utf_8::decode(input),
            Codec::Utf16(c) => c.decode(input),
            Codec::Table(c) => c.decode(input),
            Codec::TablePcs(c) => c.decode(input),
            Codec::Euc(c) => c.decode(input),
        }
    }
}

/// Converts UCS code points into bytes of one encoding.
#[derive(Debug, Clone)]
pub struct Encoder {
    name: String,
    kind: CesKind,
    codec: Codec,
}

impl Encoder {
    /// Encoder for canonical encoding `name`.
    pub fn open(name: &str, config: &Config) -> Result<Self> {
        let (kind, codec) = Codec::open(name, Direction::FromUcs, config)?;
        Ok(Self {
            name: name.to_string(),
            kind,
            codec,
        })
    }

    /// Canonical encoding name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scheme implementation in use.
    pub fn kind(&self) -> CesKind {
        self.kind
    }

    /// Longest byte sequence of one character.
    pub fn max_char_len(&self) -> usize {
        self.codec.max_char_len()
    }

    /// True if encoding depends on earlier output.
    pub fn is_stateful(&self) -> bool {
        self.codec.is_stateful()
    }

    /// Current shift state.
    pub fn state(&self) -> ShiftState {
        self.codec.state()
    }

    /// Replace the shift state.
    pub fn set_state(&mut self, state: ShiftState) {
        self.codec.set_state(state)
    }

    /// Bytes that return the output to the initial shift state.
    ///
    /// None of the supported schemes needs any.
    pub fn initial_sequence(&self) -> &'static [u8] {
        &[]
    }

    /// Encode `code` into `out`, returning the number of bytes written.
    ///
    /// On error nothing is written.
    #[inline]
    pub fn encode<S: ByteSink>(&mut self, code: u32, out: &mut S) -> Result<usize, CesError> {
        match &mut self.codec {
            Codec::UsAscii => ascii::encode(code, out),
            Codec::Ucs2(c) => c.encode(code, out),
            Codec::Ucs4(c) => c.encode(code, out),
            Codec::Utf8 => utf_8::encode(code, out),
            Codec::Utf16(c) => c.encode(code, out),
            Codec::Table(c) => c.encode(code, out),
            Codec::TablePcs(c) => c.encode(code, out),
            Codec::Euc(c) => c.encode(code, out),
        }
    }
}
