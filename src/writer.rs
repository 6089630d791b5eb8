use gb_io::seq::Seq;
use itertools::Itertools;
use std::io::{self, Write};

use crate::record::{is_nucleotide, record_id, record_len, GffRecord, Strand};

const GFF_VERSION: u32 = 3;
const FASTA_WIDTH: usize = 60;

/// Counts of what a `GffWriter` has written so far
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct Summary {
    pub records: usize,
    pub features: usize,
    /// Features which couldn't be placed on their record
    pub skipped: usize,
}

#[derive(Debug)]
struct FastaEntry {
    id: String,
    description: Option<String>,
    seq: Vec<u8>,
}

#[derive(Debug)]
pub struct GffWriter<W: Write> {
    stream: W,
    annotations: bool,
    include_fasta: bool,
    header_written: bool,
    fasta: Vec<FastaEntry>,
    summary: Summary,
}

impl<W: Write> GffWriter<W> {
    /// Create a new `GffWriter` to write GFF3 to the given stream. Nothing is
    /// written until the first record, call `finish` once done.
    pub fn new(stream: W) -> Self {
        Self {
            stream,
            annotations: true,
            include_fasta: false,
            header_written: false,
            fasta: Vec::new(),
            summary: Summary::default(),
        }
    }

    /// Whether to write a line with source `annotation` and type `remark`
    /// holding the metadata of each record (accession, organism, date...).
    /// Defaults to `true`.
    pub fn annotations(&mut self, annotations: bool) -> &mut Self {
        self.annotations = annotations;
        self
    }

    /// Whether to append the sequences to the end of the file, following a
    /// `##FASTA` directive. Defaults to `false`.
    ///
    /// Note that this keeps the sequence data of every record in memory
    /// until `finish` is called.
    pub fn include_fasta(&mut self, include: bool) -> &mut Self {
        self.include_fasta = include;
        self
    }

    pub fn summary(&self) -> Summary {
        self.summary
    }

    fn write_header(&mut self) -> io::Result<()> {
        if !self.header_written {
            writeln!(&mut self.stream, "##gff-version {}", GFF_VERSION)?;
            self.header_written = true;
        }
        Ok(())
    }

    /// Write a single line.
    pub fn write_record(&mut self, line: &GffRecord) -> io::Result<()> {
        self.write_header()?;
        writeln!(&mut self.stream, "{}", line)
    }

    /// Write the features of a Genbank record, preceded by a
    /// `##sequence-region` directive if the record isn't empty. Features of
    /// protein records are written without a strand.
    pub fn write(&mut self, record: &Seq) -> io::Result<()> {
        self.write_header()?;
        let id = record_id(record);
        let len = record_len(record);
        if len > 0 {
            writeln!(&mut self.stream, "##sequence-region {} 1 {}", id, len)?;
        }
        if self.annotations {
            if let Some(annotation) = GffRecord::annotation(&id, record) {
                self.write_record(&annotation)?;
            }
        }
        let stranded = is_nucleotide(record);
        for f in &record.features {
            match GffRecord::from_feature(&id, f) {
                Some(mut line) => {
                    if !stranded {
                        line.strand = Strand::Unknown;
                    }
                    self.write_record(&line)?;
                    self.summary.features += 1;
                }
                None => {
                    warn!(
                        "{}: skipping {} feature, location {} isn't on this sequence",
                        id, f.kind, f.location
                    );
                    self.summary.skipped += 1;
                }
            }
        }
        if self.include_fasta && !record.seq.is_empty() {
            let description = record
                .definition
                .as_deref()
                .map(|d| d.split_whitespace().join(" "))
                .map(|d| d.strip_suffix('.').map(String::from).unwrap_or(d))
                .filter(|d| !d.is_empty());
            self.fasta.push(FastaEntry {
                id,
                description,
                seq: record.seq.to_ascii_uppercase(),
            });
        }
        self.summary.records += 1;
        Ok(())
    }

    /// Write anything still pending (the header if no records were written,
    /// the FASTA section) and return the underlying stream. The stream is not
    /// flushed.
    pub fn finish(mut self) -> io::Result<W> {
        self.write_header()?;
        if !self.fasta.is_empty() {
            writeln!(&mut self.stream, "##FASTA")?;
            for entry in &self.fasta {
                match entry.description {
                    Some(ref d) => writeln!(&mut self.stream, ">{} {}", entry.id, d)?,
                    None => writeln!(&mut self.stream, ">{}", entry.id)?,
                }
                for line in entry.seq.chunks(FASTA_WIDTH) {
                    self.stream.write_all(line)?;
                    self.stream.write_all(b"\n")?;
                }
            }
        }
        Ok(self.stream)
    }
}

/// Write a single record as a complete GFF3 file.
pub fn write<T: Write>(file: T, record: &Seq) -> io::Result<()> {
    let mut writer = GffWriter::new(file);
    writer.write(record)?;
    writer.finish().map(|_| ())
}

#[cfg(test)]
pub mod tests {

    use super::*;
    use gb_io::seq::{Feature, Location};
    use std::io::BufRead;

    fn seq_with_features() -> Seq {
        let mut seq = Seq::empty();
        seq.name = Some("SEQ1".into());
        seq.definition = Some("A short\ntest sequence.".into());
        seq.seq = b"acgtacgtac".repeat(13);
        seq.len = Some(seq.seq.len());
        seq.features = vec![
            Feature {
                kind: "source".into(),
                location: Location::simple_range(0, 130),
                qualifiers: vec![("mol_type".into(), Some("genomic DNA".into()))],
            },
            Feature {
                kind: "misc_feature".into(),
                location: Location::External("OTHER.1".into(), None),
                qualifiers: vec![],
            },
        ];
        seq
    }

    fn lines(out: &[u8]) -> Vec<String> {
        std::io::Cursor::new(out).lines().map(Result::unwrap).collect()
    }

    #[test]
    fn header_only() {
        let out = GffWriter::new(Vec::new()).finish().unwrap();
        assert_eq!(out, b"##gff-version 3\n");
    }

    #[test]
    fn write_record() {
        let mut out = Vec::new();
        let mut writer = GffWriter::new(&mut out);
        writer.annotations(false);
        writer.write(&seq_with_features()).unwrap();
        assert_eq!(
            writer.summary(),
            Summary {
                records: 1,
                features: 1,
                skipped: 1
            }
        );
        writer.finish().unwrap();
        assert_eq!(
            lines(&out),
            vec![
                "##gff-version 3",
                "##sequence-region SEQ1 1 130",
                "SEQ1\tfeature\tsource\t1\t130\t.\t+\t.\tmol_type=genomic DNA",
            ]
        );
    }

    #[test]
    fn annotation_follows_sequence_region() {
        let mut out = Vec::new();
        write(&mut out, &seq_with_features()).unwrap();
        let lines = lines(&out);
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("SEQ1\tannotation\tremark\t1\t130\t.\t.\t.\t"));
        assert!(lines[2].contains("topology=linear"));
    }

    #[test]
    fn empty_sequence_has_no_region() {
        let mut seq = Seq::empty();
        seq.name = Some("EMPTY".into());
        let mut out = Vec::new();
        let mut writer = GffWriter::new(&mut out);
        writer.annotations(false);
        writer.write(&seq).unwrap();
        writer.finish().unwrap();
        assert_eq!(lines(&out), vec!["##gff-version 3"]);
    }

    #[test]
    fn fasta_section() {
        let mut out = Vec::new();
        let mut writer = GffWriter::new(&mut out);
        writer.annotations(false).include_fasta(true);
        writer.write(&seq_with_features()).unwrap();
        writer.finish().unwrap();
        let lines = lines(&out);
        assert_eq!(lines[3], "##FASTA");
        assert_eq!(lines[4], ">SEQ1 A short test sequence");
        assert_eq!(lines[5].len(), 60);
        assert_eq!(lines[7].len(), 10);
        assert_eq!(lines[5..].concat(), "ACGTACGTAC".repeat(13));
    }

    #[test]
    fn protein_features_have_no_strand() {
        let mut seq = Seq::empty();
        seq.name = Some("PROT1".into());
        seq.seq = b"MKTAYIAKQRQISFVKSHFS".to_vec();
        seq.len = Some(seq.seq.len());
        seq.features = vec![Feature {
            kind: "Protein".into(),
            location: Location::simple_range(0, 20),
            qualifiers: vec![("product".into(), Some("test".into()))],
        }];
        let mut out = Vec::new();
        let mut writer = GffWriter::new(&mut out);
        writer.annotations(false);
        writer.write(&seq).unwrap();
        writer.finish().unwrap();
        assert_eq!(
            lines(&out)[2],
            "PROT1\tfeature\tProtein\t1\t20\t.\t.\t.\tproduct=test"
        );
    }

}
