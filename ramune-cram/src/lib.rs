//! CRAM format reader and writer.
//!
//! CRAM is a columnar, reference-based compressed alignment format. Records
//! are grouped into containers; each container carries a compression header
//! describing how per-record data series are encoded, followed by slices
//! holding the encoded data in a core bitstream block and a set of external
//! byte blocks.
//!
//! # Examples
//!
//! ## Count records in a CRAM stream
//!
//! ```no_run
//! use std::{fs::File, io::BufReader};
//!
//! let mut reader = File::open("sample.cram")
//!     .map(BufReader::new)
//!     .map(ramune_cram::io::Reader::new)?;
//!
//! reader.read_file_definition()?;
//! let header = reader.read_file_header()?;
//!
//! let mut n = 0;
//! for result in reader.records(&header) {
//!     let _ = result?;
//!     n += 1;
//! }
//!
//! println!("{n}");
//! # Ok::<_, std::io::Error>(())
//! ```

mod codecs;
pub mod container;
pub mod file_definition;
mod huffman;
pub mod io;
pub mod record;
pub mod reference;

pub use self::{file_definition::FileDefinition, record::Record};
