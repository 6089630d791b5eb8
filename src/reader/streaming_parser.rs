use std::cmp;
use std::io::Error as IoError;
use std::io::Read;
use std::io::Result as IoResult;

use nom::{IResult, Offset};

use crate::errors::GffParserError;
use crate::reader::line::{fasta_header, line, sequence_line, Line};
use crate::reader::GffLine;

#[derive(Debug)]
pub struct StreamParser<T: Read> {
    buffer: circular::Buffer,
    stream: T,
    capacity: usize,
    is_eof: bool,
    in_fasta: bool,
}

// We use this private error type rather than nom's errors, so that we can own
// the input slice to give "context" even once the slice we were parsing is gone

const MAX_CONTEXT_BYTES: usize = 50; // avoid cloning huge lines into errors

enum StreamParserError {
    Io(IoError),
    StreamParser(Option<Vec<u8>>, nom::error::ErrorKind),
    EOF,
}

impl From<IoError> for StreamParserError {
    fn from(e: IoError) -> StreamParserError {
        StreamParserError::Io(e)
    }
}

impl From<StreamParserError> for GffParserError {
    fn from(e: StreamParserError) -> GffParserError {
        match e {
            StreamParserError::Io(e) => GffParserError::from(e),
            StreamParserError::EOF => GffParserError::SyntaxError("Unexpected EOF".into()),
            StreamParserError::StreamParser(Some(context), e) => {
                GffParserError::SyntaxError(format!(
                    "Error {:?} while parsing [{}]",
                    e,
                    String::from_utf8_lossy(&context)
                ))
            }
            StreamParserError::StreamParser(None, e) => {
                GffParserError::SyntaxError(format!("Parse error: {:?}", e))
            }
        }
    }
}

impl<T: Read> StreamParser<T> {
    pub fn new(stream: T, capacity: usize) -> StreamParser<T> {
        StreamParser {
            stream,
            capacity,
            buffer: circular::Buffer::with_capacity(capacity),
            is_eof: false,
            in_fasta: false,
        }
    }

    fn fill_buffer(&mut self) -> IoResult<usize> {
        if self.is_eof {
            return Ok(0);
        }
        // if we're requesting a buffer refill when the buffer's full, we need
        // to grow it.
        if self.buffer.available_space() == 0 {
            self.capacity *= 2;
            self.buffer.grow(self.capacity);
            debug!("Increasing read buffer capacity to {} b", self.capacity);
        }
        let bytes_read = self.stream.read(self.buffer.space())?;
        if bytes_read > 0 {
            self.buffer.fill(bytes_read);
            return Ok(bytes_read);
        }
        self.is_eof = true;
        // terminate a last line which lacks a line ending, so the parsers
        // don't have to deal with EOF
        if self.buffer.data().last().is_some_and(|&b| b != b'\n') {
            if self.buffer.available_space() == 0 {
                self.capacity += 1;
                self.buffer.grow(self.capacity);
            }
            self.buffer.space()[0] = b'\n';
            self.buffer.fill(1);
            return Ok(1);
        }
        Ok(0)
    }

    /// Apply a nom parser to the input. Returns Err if the nom parser fails.
    fn run_parser<U>(
        &mut self,
        parser: impl Fn(&[u8]) -> IResult<&[u8], U>,
        detailed_errors: bool,
    ) -> Result<U, StreamParserError> {
        loop {
            let res = match parser(self.buffer.data()) {
                Ok((i, o)) => {
                    let length = self.buffer.data().offset(i);
                    Some((length, o))
                }
                Err(nom::Err::Incomplete(_)) => {
                    // get more data
                    None
                }
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
                    // context starts at the beginning of the offending line
                    let line = self.buffer.data();
                    let e_slice = if detailed_errors {
                        Some(line[..cmp::min(line.len(), MAX_CONTEXT_BYTES)].to_owned())
                    } else {
                        None
                    };
                    return Err(StreamParserError::StreamParser(e_slice, e.code));
                }
            };

            match res {
                Some((length, o)) => {
                    self.buffer.consume(length);
                    return Ok(o);
                }
                None => {
                    //refill buffer
                    if self.fill_buffer()? == 0 {
                        return Err(StreamParserError::EOF);
                    }
                }
            }
        }
    }

    /// Try to apply a nom parser, returns None if the parser fails.
    fn try_run_parser<U>(
        &mut self,
        parser: impl Fn(&[u8]) -> IResult<&[u8], U>,
        fail_on_eof: bool,
    ) -> Result<Option<U>, GffParserError> {
        match self.run_parser(parser, false) {
            Ok(o) => Ok(Some(o)),
            Err(StreamParserError::EOF) => {
                if fail_on_eof {
                    Err(StreamParserError::EOF.into())
                } else {
                    Ok(None)
                }
            }
            Err(StreamParserError::StreamParser(_, _)) => Ok(None),
            Err(StreamParserError::Io(e)) => Err(StreamParserError::Io(e).into()),
        }
    }

    /// Parses one entry of the `##FASTA` section
    fn read_one_sequence(&mut self) -> Result<Option<GffLine>, GffParserError> {
        let (id, description) = match self.run_parser(&fasta_header, true) {
            Ok(header) => header,
            Err(StreamParserError::EOF) if self.buffer.empty() => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let mut seq = Vec::new();
        while let Some(residues) = self.try_run_parser(&sequence_line, false)? {
            seq.extend_from_slice(&residues);
        }
        Ok(Some(GffLine::Sequence {
            id,
            description,
            seq,
        }))
    }

    pub fn read_one_line(&mut self) -> Result<Option<GffLine>, GffParserError> {
        if self.in_fasta {
            return self.read_one_sequence();
        }
        loop {
            let parsed = match self.run_parser(&line, true) {
                Ok(parsed) => parsed,
                Err(StreamParserError::EOF) if self.buffer.empty() => return Ok(None),
                Err(e) => return Err(e.into()),
            };
            let res = match parsed {
                Line::Blank => continue,
                Line::Directive(name, args) => {
                    // everything after this is sequence data
                    if name == "FASTA" {
                        self.in_fasta = true;
                    }
                    GffLine::Directive { name, args }
                }
                Line::Comment(text) => GffLine::Comment(text),
                Line::Record(record) => GffLine::Record(record),
            };
            return Ok(Some(res));
        }
    }
}
