//! # ucsconv - Character Encoding Conversion through UCS
//!
//! A table driven character set converter in the tradition of `iconv(3)`.
//! Every conversion decodes the source bytes into UCS code points and
//! encodes them again in the target encoding.
//!
//! ## Features
//!
//! - **Alias resolution** with case and `-`/`_` insensitive names
//! - **Unicode schemes**: UTF-8, UTF-16 with BOM detection, UCS-2 and UCS-4
//! - **Table encodings**: ISO-8859, Windows and DOS code pages, KOI8, Big5
//! - **EUC** composites of up to three character sets
//! - **External `.cct` tables** loaded on demand from `$NLSPATH/iconv_data`
//! - **Precise cursors**: after any error the caller knows exactly how much
//!   input was consumed and output produced
//!
//! ## Quick Start
//!
//! ```rust
//! use ucsconv::{Iconv, InputCursor, OutputCursor};
//!
//! let mut cd = Iconv::open("UTF-8", "KOI8-R").unwrap();
//!
//! let koi8 = &[0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4]; // "Привет"
//! let mut input = InputCursor::new(koi8);
//! let mut buf = [0u8; 32];
//! let mut out = OutputCursor::new(&mut buf);
//!
//! let irreversible = cd.convert(&mut input, &mut out).unwrap();
//! assert_eq!(irreversible, 0);
//! assert_eq!(std::str::from_utf8(out.filled()).unwrap(), "Привет");
//! ```

#![deny(missing_docs)]

pub mod aliases;
pub mod ccs;
pub mod ces;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod external;
pub mod session;
pub mod tables;

pub use ccs::{Direction, Endian, Optimization};
pub use ces::ShiftState;
pub use config::Config;
pub use cursor::{ByteSink, DiscardSink, InputCursor, OutputCursor};
pub use engine::Unmappable;
pub use error::{Error, ErrorKind, Result};
pub use session::{Iconv, convert};
