#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use ucsconv::ccs::{Bits, TableBuilder};
use ucsconv::external::TableFileWriter;
use ucsconv::{Config, Iconv, InputCursor, OutputCursor, Result};

/// Empty per-test NLS root under the system temp directory.
pub fn nls_root(tag: &str) -> Config {
    let dir = std::env::temp_dir().join(format!("ucsconv-it-{}-{}", tag, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    Config::with_nls_path(dir)
}

pub fn install(config: &Config, builder: &TableBuilder) -> PathBuf {
    TableFileWriter::new(builder).install(config).unwrap();
    config.table_path(builder.name())
}

pub fn jis_x0208() -> TableBuilder {
    let mut builder = TableBuilder::new("jis_x0208_1990", Bits::Sixteen);
    builder.map(0x2121, 0x3000).map(0x2422, 0x3042).map(0x2424, 0x3044);
    // a run long enough to become a range in the size layout
    for i in 0..16u16 {
        builder.map(0x3021 + i, 0x4E9C + i);
    }
    builder
}

pub fn jis_x0212() -> TableBuilder {
    let mut builder = TableBuilder::new("jis_x0212_1990", Bits::Sixteen);
    builder.map(0x2A21, 0x00C1).map(0x2A22, 0x00C0);
    builder
}

pub fn big5() -> TableBuilder {
    let mut builder = TableBuilder::new("big5", Bits::Sixteen);
    builder.map(0xA440, 0x4E00).map(0xA441, 0x4E59).map(0xA1B3, 0x2026);
    builder
}

pub fn koi8_u() -> TableBuilder {
    let mut builder = TableBuilder::new("koi8_u", Bits::Eight);
    builder.map_identity(0x00..=0x7F);
    builder.map(0xA4, 0x0454).map(0xA6, 0x0456).map(0xC1, 0x0430);
    builder
}

/// Run one `convert` call with an output buffer of `capacity` bytes.
pub fn convert_once(
    cd: &mut Iconv,
    input: &[u8],
    capacity: usize,
) -> (Result<usize>, usize, Vec<u8>) {
    let mut buf = vec![0u8; capacity];
    let mut cursor = InputCursor::new(input);
    let mut out = OutputCursor::new(&mut buf);
    let result = cd.convert(&mut cursor, &mut out);
    (result, cursor.consumed(), out.filled().to_vec())
}
