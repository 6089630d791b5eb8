use std::io::Read;

mod line;
mod streaming_parser;
use self::streaming_parser::StreamParser;
use crate::record::GffRecord;

pub use crate::errors::GffParserError;

/// A parsed GFF3 line, or an entry of the trailing `##FASTA` section.
/// Blank lines are skipped.
#[derive(Debug, PartialEq, Clone)]
pub enum GffLine {
    /// `##name arg1 arg2...`
    Directive { name: String, args: Vec<String> },
    /// `# text`, with the `#` and surrounding whitespace removed
    Comment(String),
    Record(GffRecord),
    Sequence {
        id: String,
        description: Option<String>,
        seq: Vec<u8>,
    },
}

impl GffLine {
    pub fn as_record(&self) -> Option<&GffRecord> {
        match *self {
            GffLine::Record(ref r) => Some(r),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct GffReader<T: Read> {
    parser: StreamParser<T>,
}

impl<T: Read> Iterator for GffReader<T> {
    type Item = Result<GffLine, GffParserError>;

    fn next(&mut self) -> Option<Result<GffLine, GffParserError>> {
        match self.parser.read_one_line() {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

const READ_BUF_SIZE: usize = 64 * 1024;

impl<T: Read> GffReader<T> {
    /// Parse a stream one line at a time
    pub fn new(data: T) -> GffReader<T> {
        Self::with_capacity(data, READ_BUF_SIZE)
    }

    /// `capacity` is the initial size of the read buffer, which grows as
    /// needed to hold a whole line.
    pub fn with_capacity(data: T, capacity: usize) -> GffReader<T> {
        GffReader {
            parser: StreamParser::new(data, capacity.max(1)),
        }
    }
}

/// Convenience method to parse an entire file at once.
pub fn parse_file<P: AsRef<::std::path::Path>>(path: P) -> Result<Vec<GffLine>, GffParserError> {
    let file = ::std::fs::File::open(path)?;
    GffReader::new(file).collect()
}

/// Parse GFF3 held in memory.
pub fn parse_slice(data: &[u8]) -> Result<Vec<GffLine>, GffParserError> {
    GffReader::new(data).collect()
}

/// The feature lines of a parsed file, in file order
pub fn records(lines: &[GffLine]) -> impl Iterator<Item = &GffRecord> {
    lines.iter().filter_map(GffLine::as_record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Strand;

    const GFF: &[u8] = b"##gff-version 3
##sequence-region SEQ1 1 100
# a comment

SEQ1\tfeature\tsource\t1\t100\t.\t+\t.\tmol_type=other DNA
SEQ1\tfeature\tgene\t21\t80\t.\t-\t.\tgene=tst
##FASTA
>SEQ1 A short test
ACGTACGTAC
GTAC

>SEQ2
acgt";

    #[test]
    fn read_lines() {
        let lines = parse_slice(GFF).unwrap();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0],
            GffLine::Directive {
                name: "gff-version".into(),
                args: vec!["3".into()]
            }
        );
        assert_eq!(lines[2], GffLine::Comment("a comment".into()));
        let records: Vec<_> = records(&lines).collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].strand, Strand::Reverse);
        assert_eq!(records[1].attribute_values("gene").collect::<Vec<_>>(), vec!["tst"]);
        assert_eq!(
            lines[6],
            GffLine::Sequence {
                id: "SEQ1".into(),
                description: Some("A short test".into()),
                seq: b"ACGTACGTACGTAC".to_vec()
            }
        );
        assert_eq!(
            lines[7],
            GffLine::Sequence {
                id: "SEQ2".into(),
                description: None,
                seq: b"acgt".to_vec()
            }
        );
    }

    #[test]
    fn tiny_buffer() {
        // lines longer than the buffer force it to grow
        let lines = GffReader::with_capacity(GFF, 4)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(lines, parse_slice(GFF).unwrap());
    }

    #[test]
    fn missing_final_newline() {
        let lines = parse_slice(b"SEQ1\tfeature\tgene\t1\t10\t.\t+\t.\tID=g1").unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].as_record().unwrap().end, 10);
    }

    #[test]
    fn syntax_error() {
        let mut reader = GffReader::new(&b"##gff-version 3\nSEQ1\tfeature\tgene\t1\n"[..]);
        assert!(reader.next().unwrap().is_ok());
        match reader.next() {
            Some(Err(GffParserError::SyntaxError(msg))) => assert!(msg.contains("SEQ1")),
            x => panic!("{:?}", x),
        }
    }
}
