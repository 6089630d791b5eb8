//! This is a crate for converting annotated biological sequences stored in
//! "Genbank" format into GFF3. Genbank files are parsed one record at a time
//! with `gb-io`, and each record's features are written out as GFF3 lines in
//! the order they appear.
//!
//! ```no_run
//! let summary = gb2gff::convert("mg1655.gb", "mg1655.gff").unwrap();
//! println!("{} records, {} features", summary.records, summary.features);
//! ```
//!
//! Coordinates in the output are 1-based and inclusive, so a feature at
//! `1..100` in the Genbank file starts at 1 and ends at 100 in the GFF.

#[macro_use]
extern crate log;

mod errors;

pub mod convert;
pub mod reader;
pub mod record;
pub mod writer;

pub use crate::convert::{convert, convert_stream};
pub use crate::errors::{ConvertError, ErrorKind};
pub use crate::writer::Summary;
