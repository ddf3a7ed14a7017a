//! Compiled-in character set tables.
//!
//! Built once on first use and shared read-only afterwards. Character sets
//! not listed here are loaded from `.cct` files by [`crate::external`].

use log::{debug, warn};
use once_cell::sync::Lazy;

use crate::ccs::{Bits, CcsTable, Direction, INVALC, Optimization, TableBuilder};

const NO: u16 = INVALC;

#[rustfmt::skip]
const KOI8_R_HIGH: [u16; 128] = [
    0x2500, 0x2502, 0x250C, 0x2510, 0x2514, 0x2518, 0x251C, 0x2524,
    0x252C, 0x2534, 0x253C, 0x2580, 0x2584, 0x2588, 0x258C, 0x2590,
    0x2591, 0x2592, 0x2593, 0x2320, 0x25A0, 0x2219, 0x221A, 0x2248,
    0x2264, 0x2265, 0x00A0, 0x2321, 0x00B0, 0x00B2, 0x00B7, 0x00F7,
    0x2550, 0x2551, 0x2552, 0x0451, 0x2553, 0x2554, 0x2555, 0x2556,
    0x2557, 0x2558, 0x2559, 0x255A, 0x255B, 0x255C, 0x255D, 0x255E,
    0x255F, 0x2560, 0x2561, 0x0401, 0x2562, 0x2563, 0x2564, 0x2565,
    0x2566, 0x2567, 0x2568, 0x2569, 0x256A, 0x256B, 0x256C, 0x00A9,
    0x044E, 0x0430, 0x0431, 0x0446, 0x0434, 0x0435, 0x0444, 0x0433,
    0x0445, 0x0438, 0x0439, 0x043A, 0x043B, 0x043C, 0x043D, 0x043E,
    0x043F, 0x044F, 0x0440, 0x0441, 0x0442, 0x0443, 0x0436, 0x0432,
    0x044C, 0x044B, 0x0437, 0x0448, 0x044D, 0x0449, 0x0447, 0x044A,
    0x042E, 0x0410, 0x0411, 0x0426, 0x0414, 0x0415, 0x0424, 0x0413,
    0x0425, 0x0418, 0x0419, 0x041A, 0x041B, 0x041C, 0x041D, 0x041E,
    0x041F, 0x042F, 0x0420, 0x0421, 0x0422, 0x0423, 0x0416, 0x0412,
    0x042C, 0x042B, 0x0417, 0x0428, 0x042D, 0x0429, 0x0427, 0x042A,
];

#[rustfmt::skip]
const CP866_BOX: [u16; 48] = [
    0x2591, 0x2592, 0x2593, 0x2502, 0x2524, 0x2561, 0x2562, 0x2556,
    0x2555, 0x2563, 0x2551, 0x2557, 0x255D, 0x255C, 0x255B, 0x2510,
    0x2514, 0x2534, 0x252C, 0x251C, 0x2500, 0x253C, 0x255E, 0x255F,
    0x255A, 0x2554, 0x2569, 0x2566, 0x2560, 0x2550, 0x256C, 0x2567,
    0x2568, 0x2564, 0x2565, 0x2559, 0x2558, 0x2552, 0x2553, 0x256B,
    0x256A, 0x2518, 0x250C, 0x2588, 0x2584, 0x258C, 0x2590, 0x2580,
];

#[rustfmt::skip]
const CP866_TAIL: [u16; 16] = [
    0x0401, 0x0451, 0x0404, 0x0454, 0x0407, 0x0457, 0x040E, 0x045E,
    0x00B0, 0x2219, 0x00B7, 0x221A, 0x2116, 0x00A4, 0x25A0, 0x00A0,
];

#[rustfmt::skip]
const WIN_1251_HIGH: [u16; 64] = [
    0x0402, 0x0403, 0x201A, 0x0453, 0x201E, 0x2026, 0x2020, 0x2021,
    0x20AC, 0x2030, 0x0409, 0x2039, 0x040A, 0x040C, 0x040B, 0x040F,
    0x0452, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    NO,     0x2122, 0x0459, 0x203A, 0x045A, 0x045C, 0x045B, 0x045F,
    0x00A0, 0x040E, 0x045E, 0x0408, 0x00A4, 0x0490, 0x00A6, 0x00A7,
    0x0401, 0x00A9, 0x0404, 0x00AB, 0x00AC, 0x00AD, 0x00AE, 0x0407,
    0x00B0, 0x00B1, 0x0406, 0x0456, 0x0491, 0x00B5, 0x00B6, 0x00B7,
    0x0451, 0x2116, 0x0454, 0x00BB, 0x0458, 0x0405, 0x0455, 0x0457,
];

#[rustfmt::skip]
const WIN_1252_C1: [u16; 32] = [
    0x20AC, NO,     0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021,
    0x02C6, 0x2030, 0x0160, 0x2039, 0x0152, NO,     0x017D, NO,
    NO,     0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014,
    0x02DC, 0x2122, 0x0161, 0x203A, 0x0153, NO,     0x017E, 0x0178,
];

const ISO_8859_15_DIFF: [(u16, u16); 8] = [
    (0xA4, 0x20AC),
    (0xA6, 0x0160),
    (0xA8, 0x0161),
    (0xB4, 0x017D),
    (0xB8, 0x017E),
    (0xBC, 0x0152),
    (0xBD, 0x0153),
    (0xBE, 0x0178),
];

fn ascii(name: &str) -> TableBuilder {
    let mut builder = TableBuilder::new(name, Bits::Eight);
    builder.map_identity(0x00..=0x7F);
    builder
}

fn with_high(mut builder: TableBuilder, first: u16, high: &[u16]) -> TableBuilder {
    for (i, &ucs) in high.iter().enumerate() {
        builder.map(first + i as u16, ucs);
    }
    builder
}

fn iso_8859_1() -> TableBuilder {
    let mut builder = ascii("iso_8859_1");
    builder.map_identity(0x80..=0xFF);
    builder
}

fn iso_8859_15() -> TableBuilder {
    let mut builder = ascii("iso_8859_15");
    builder.map_identity(0x80..=0xFF);
    for (ccs, ucs) in ISO_8859_15_DIFF {
        builder.map(ccs, ucs);
    }
    builder
}

fn koi8_r() -> TableBuilder {
    with_high(ascii("koi8_r"), 0x80, &KOI8_R_HIGH)
}

fn cp866() -> TableBuilder {
    let mut builder = ascii("cp866");
    for i in 0..0x30u16 {
        builder.map(0x80 + i, 0x0410 + i);
    }
    let mut builder = with_high(builder, 0xB0, &CP866_BOX);
    for i in 0..0x10u16 {
        builder.map(0xE0 + i, 0x0440 + i);
    }
    with_high(builder, 0xF0, &CP866_TAIL)
}

fn win_1251() -> TableBuilder {
    let mut builder = with_high(ascii("win_1251"), 0x80, &WIN_1251_HIGH);
    for i in 0..0x40u16 {
        builder.map(0xC0 + i, 0x0410 + i);
    }
    builder
}

fn win_1252() -> TableBuilder {
    let mut builder = with_high(ascii("win_1252"), 0x80, &WIN_1252_C1);
    builder.map_identity(0xA0..=0xFF);
    builder
}

fn jis_x0201_1976() -> TableBuilder {
    let mut builder = ascii("jis_x0201_1976");
    builder.map(0x5C, 0x00A5).map(0x7E, 0x203E);
    for i in 0..=(0xDF - 0xA1) {
        builder.map(0xA1 + i, 0xFF61 + i);
    }
    builder
}

/// A compiled-in character set with both directions prepared.
#[derive(Debug)]
pub struct BuiltinCcs {
    name: &'static str,
    bits: Bits,
    optimization: Optimization,
    to_ucs: Vec<u16>,
    from_ucs: Vec<u16>,
}

impl BuiltinCcs {
    fn prepare(name: &'static str, builder: TableBuilder, optimization: Optimization) -> Option<Self> {
        let to_ucs = builder.words(Direction::ToUcs, optimization);
        let from_ucs = builder.words(Direction::FromUcs, optimization);
        match (to_ucs, from_ucs) {
            (Ok(to_ucs), Ok(from_ucs)) => Some(Self {
                name,
                bits: builder.bits(),
                optimization,
                to_ucs,
                from_ucs,
            }),
            (Err(err), _) | (_, Err(err)) => {
                warn!("dropping built-in table {}: {}", name, err);
                None
            }
        }
    }

    /// Character set name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Code width.
    pub fn bits(&self) -> Bits {
        self.bits
    }
}

static BUILTIN: Lazy<Vec<BuiltinCcs>> = Lazy::new(|| {
    let sets: [(&'static str, fn() -> TableBuilder); 7] = [
        ("cp866", cp866),
        ("iso_8859_1", iso_8859_1),
        ("iso_8859_15", iso_8859_15),
        ("jis_x0201_1976", jis_x0201_1976),
        ("koi8_r", koi8_r),
        ("win_1251", win_1251),
        ("win_1252", win_1252),
    ];
    let tables: Vec<BuiltinCcs> = sets
        .iter()
        .filter_map(|&(name, make)| BuiltinCcs::prepare(name, make(), Optimization::Speed))
        .collect();
    debug!("prepared {} built-in CCS tables", tables.len());
    tables
});

/// Every compiled-in character set.
pub fn builtins() -> &'static [BuiltinCcs] {
    &BUILTIN
}

/// The compiled-in table for `name` in `direction`, if there is one.
pub fn builtin(name: &str, direction: Direction) -> Option<CcsTable> {
    let ccs = builtins().iter().find(|ccs| ccs.name == name)?;
    let data: &'static [u16] = match direction {
        Direction::ToUcs => &ccs.to_ucs,
        Direction::FromUcs => &ccs.from_ucs,
    };
    Some(CcsTable::builtin(
        ccs.name,
        direction,
        ccs.bits,
        ccs.optimization,
        data,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccs::TableOrigin;

    fn to_ucs(name: &str, byte: u16) -> Option<u16> {
        builtin(name, Direction::ToUcs).unwrap().lookup(byte)
    }

    fn from_ucs(name: &str, code: u16) -> Option<u16> {
        builtin(name, Direction::FromUcs).unwrap().lookup(code)
    }

    #[test]
    fn test_all_builtins_present() {
        let names: Vec<_> = builtins().iter().map(BuiltinCcs::name).collect();
        assert_eq!(names.len(), 7);
        assert!(names.contains(&"koi8_r"));
        let table = builtin("koi8_r", Direction::ToUcs).unwrap();
        assert_eq!(table.origin(), TableOrigin::BuiltIn);
        assert!(builtin("big5", Direction::ToUcs).is_none());
    }

    #[test]
    fn test_koi8_r() {
        assert_eq!(to_ucs("koi8_r", 0xC1), Some(0x0430));
        assert_eq!(to_ucs("koi8_r", 0xFF), Some(0x042A));
        assert_eq!(from_ucs("koi8_r", 0x042A), Some(0xFF));
        assert_eq!(from_ucs("koi8_r", 0x0451), Some(0xA3));
        assert_eq!(from_ucs("koi8_r", 0x00E9), None);
    }

    #[test]
    fn test_win_1252_holes() {
        assert_eq!(to_ucs("win_1252", 0x80), Some(0x20AC));
        assert_eq!(to_ucs("win_1252", 0x81), None);
        assert_eq!(to_ucs("win_1252", 0xE9), Some(0x00E9));
        assert_eq!(from_ucs("win_1252", 0x20AC), Some(0x80));
        assert_eq!(from_ucs("win_1252", 0x0080), None);
    }

    #[test]
    fn test_latin9_differs_from_latin1() {
        assert_eq!(to_ucs("iso_8859_1", 0xA4), Some(0x00A4));
        assert_eq!(to_ucs("iso_8859_15", 0xA4), Some(0x20AC));
        assert_eq!(from_ucs("iso_8859_15", 0x00A4), None);
        assert_eq!(from_ucs("iso_8859_1", 0x00FF), Some(0xFF));
    }

    #[test]
    fn test_cyrillic_code_pages() {
        assert_eq!(to_ucs("cp866", 0x80), Some(0x0410));
        assert_eq!(to_ucs("cp866", 0xE0), Some(0x0440));
        assert_eq!(to_ucs("cp866", 0xFF), Some(0x00A0));
        assert_eq!(from_ucs("cp866", 0x00A0), Some(0xFF));
        assert_eq!(to_ucs("win_1251", 0xC0), Some(0x0410));
        assert_eq!(to_ucs("win_1251", 0x98), None);
        assert_eq!(from_ucs("win_1251", 0x044F), Some(0xFF));
    }

    #[test]
    fn test_jis_x0201() {
        assert_eq!(to_ucs("jis_x0201_1976", 0x5C), Some(0x00A5));
        assert_eq!(to_ucs("jis_x0201_1976", 0xB1), Some(0xFF71));
        assert_eq!(to_ucs("jis_x0201_1976", 0xE0), None);
        assert_eq!(from_ucs("jis_x0201_1976", 0xFF9F), Some(0xDF));
        assert_eq!(from_ucs("jis_x0201_1976", 0x005C), None);
    }
}
