use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use gb_io::reader::SeqReader;

use crate::errors::ConvertError;
use crate::writer::{GffWriter, Summary};

/// Convert the Genbank file at `input` into a GFF3 file at `output`, which
/// is created or truncated.
///
/// The input is opened first, so if it can't be read the output file isn't
/// created. Both files are closed before returning, whether or not the
/// conversion succeeded. Output written before an error is left in place.
pub fn convert<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<Summary, ConvertError> {
    let input = input.as_ref();
    let output = output.as_ref();
    let source = File::open(input).map_err(|source| ConvertError::OpenInput {
        path: input.to_path_buf(),
        source,
    })?;
    let sink = File::create(output).map_err(|source| ConvertError::CreateOutput {
        path: output.to_path_buf(),
        source,
    })?;
    let summary = convert_stream(source, BufWriter::new(sink))?;
    info!(
        "Wrote {} features from {} records in {} to {}",
        summary.features,
        summary.records,
        input.display(),
        output.display()
    );
    Ok(summary)
}

/// Tracks the last two non-whitespace bytes that pass through, so we can
/// tell whether the input ended on a `//` record terminator.
struct TailReader<R> {
    inner: R,
    content: bool,
    tail: [u8; 2],
}

impl<R: Read> TailReader<R> {
    fn new(inner: R) -> TailReader<R> {
        TailReader {
            inner,
            content: false,
            tail: [0; 2],
        }
    }

    /// Whether input that isn't blank ended outside of a `//`-terminated record
    fn truncated(&self, records: usize) -> bool {
        self.content && (records == 0 || &self.tail != b"//")
    }
}

impl<R: Read> Read for TailReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        for &b in buf[..n].iter().filter(|b| !b.is_ascii_whitespace()) {
            self.content = true;
            self.tail = [self.tail[1], b];
        }
        Ok(n)
    }
}

/// Stream Genbank records from `input`, writing them to `output` as GFF3 in
/// the same order. `output` is flushed on success.
///
/// Input which ends in the middle of a record is a parse error, even where
/// the record parsed so far is complete enough to be written.
pub fn convert_stream<R: Read, W: Write>(input: R, output: W) -> Result<Summary, ConvertError> {
    let mut input = TailReader::new(input);
    let mut writer = GffWriter::new(output);
    for (i, record) in SeqReader::new(&mut input).enumerate() {
        let record = record.map_err(|e| ConvertError::from_parser(i + 1, e))?;
        debug!(
            "Record {}: {} ({} features)",
            i + 1,
            record.name.as_deref().unwrap_or("<unnamed>"),
            record.features.len()
        );
        writer.write(&record).map_err(ConvertError::Write)?;
    }
    let summary = writer.summary();
    if input.truncated(summary.records) {
        return Err(ConvertError::Parse {
            record: summary.records.max(1),
            message: "Unexpected EOF, record not terminated by //".into(),
        });
    }
    if summary.records == 0 {
        warn!("No Genbank records found in input");
    }
    if summary.skipped > 0 {
        warn!("Skipped {} features located on other sequences", summary.skipped);
    }
    writer
        .finish()
        .and_then(|mut stream| stream.flush())
        .map_err(ConvertError::Write)?;
    Ok(summary)
}
