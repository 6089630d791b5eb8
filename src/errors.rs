use std::io;
use std::path::PathBuf;

use gb_io::reader::GbParserError;
use thiserror::Error;

/// Broad classification of a `ConvertError`
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ErrorKind {
    /// A file couldn't be opened, read or written
    Io,
    /// The input isn't valid Genbank
    Parse,
}

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Can't open input file {}: {source}", .path.display())]
    OpenInput { path: PathBuf, source: io::Error },
    #[error("Can't create output file {}: {source}", .path.display())]
    CreateOutput { path: PathBuf, source: io::Error },
    #[error("Syntax error in record {record}: {message}")]
    Parse { record: usize, message: String },
    #[error("Error reading input: {0}")]
    Read(#[source] io::Error),
    #[error("Error writing output: {0}")]
    Write(#[source] io::Error),
}

impl ConvertError {
    /// `record` is the 1-based index of the record being parsed
    pub(crate) fn from_parser(record: usize, e: GbParserError) -> ConvertError {
        match e {
            GbParserError::SyntaxError(message) => ConvertError::Parse { record, message },
            GbParserError::Io(e) => ConvertError::Read(e),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match *self {
            ConvertError::Parse { .. } => ErrorKind::Parse,
            _ => ErrorKind::Io,
        }
    }
}

#[derive(Debug, Error)]
pub enum GffParserError {
    #[error("Syntax error: {0}")]
    SyntaxError(String),
    #[error("{0}")]
    Io(#[from] io::Error),
}
