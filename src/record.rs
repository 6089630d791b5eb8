use std::collections::BTreeMap;
use std::fmt;

use gb_io::seq::{Feature, Location, Seq};
use itertools::Itertools;

/// Used in column 1 when a record has no VERSION, ACCESSION or LOCUS name
pub const UNKNOWN_ID: &str = "<unknown id>";

/// Column 2 of feature lines without a `/source` qualifier
pub const DEFAULT_SOURCE: &str = "feature";

/// Column 3 of features whose key is empty
pub const DEFAULT_KIND: &str = "sequence_feature";

// Characters left as-is in attribute values, besides ASCII alphanumerics and
// `-_.~` which `urlencoding` never escapes
const UNESCAPED: &[char] = &[':', '/', ' '];

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Strand {
    Forward,
    Reverse,
    /// Written as `.`, either unstranded or the strand couldn't be determined
    Unknown,
}

impl Strand {
    fn flip(self) -> Strand {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let res = match *self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
            Strand::Unknown => ".",
        };
        write!(f, "{}", res)
    }
}

/// A single feature line of a GFF3 file. Coordinates are 1-based and
/// inclusive, as they appear in the file.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Clone)]
pub struct GffRecord {
    pub seqid: String,
    pub source: String,
    pub kind: String,
    pub start: u64,
    pub end: u64,
    pub score: Option<String>,
    pub strand: Strand,
    pub phase: Option<String>,
    /// Attribute keys with their (unescaped) values, in the order they are
    /// written
    pub attributes: Vec<(String, Vec<String>)>,
}

impl GffRecord {
    /// Returns all the values of the attribute `key`
    pub fn attribute_values<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.attributes
            .iter()
            .filter(move |(k, _)| k == key)
            .flat_map(|(_, values)| values.iter().map(String::as_str))
    }

    /// Build the GFF line for a Genbank feature. Returns `None` if no part of
    /// the feature's location lies on this sequence (external references and
    /// gaps).
    pub fn from_feature(seqid: &str, feature: &Feature) -> Option<GffRecord> {
        let (start, end, strand) = location_span(&feature.location)?;
        let mut qualifiers: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &feature.qualifiers {
            qualifiers
                .entry(key.trim().to_string())
                .or_default()
                .push(value.clone().unwrap_or_default());
        }
        let source = take_column(&mut qualifiers, "source");
        let score = take_column(&mut qualifiers, "score");
        let phase = take_column(&mut qualifiers, "phase");
        let kind = match feature.kind.trim() {
            "" => DEFAULT_KIND.to_string(),
            kind => kind.to_string(),
        };
        Some(GffRecord {
            seqid: seqid.to_string(),
            source: source.unwrap_or_else(|| DEFAULT_SOURCE.to_string()),
            kind,
            start: u64::try_from(start + 1).ok()?,
            end: u64::try_from(end).ok()?,
            score,
            strand,
            phase,
            attributes: clean_attributes(qualifiers),
        })
    }

    /// Build the `remark` line which carries the metadata of the whole
    /// record (accessions, organism, topology...).
    pub fn annotation(seqid: &str, record: &Seq) -> Option<GffRecord> {
        let attributes = clean_attributes(record_annotations(record));
        if attributes.is_empty() {
            return None;
        }
        Some(GffRecord {
            seqid: seqid.to_string(),
            source: "annotation".into(),
            kind: "remark".into(),
            start: 1,
            end: record_len(record).max(1) as u64,
            score: None,
            strand: Strand::Unknown,
            phase: None,
            attributes,
        })
    }
}

impl fmt::Display for GffRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t",
            self.seqid,
            self.source,
            self.kind,
            self.start,
            self.end,
            self.score.as_deref().unwrap_or("."),
            self.strand,
            self.phase.as_deref().unwrap_or("."),
        )?;
        if self.attributes.is_empty() {
            return write!(f, ".");
        }
        let attributes = self
            .attributes
            .iter()
            .map(|(key, values)| format!("{}={}", key, values.iter().map(|v| escape(v)).join(",")))
            .join(";");
        write!(f, "{}", attributes)
    }
}

/// The identifier used in column 1: the accession.version from the VERSION
/// line, falling back to the primary accession and then the LOCUS name.
pub fn record_id(record: &Seq) -> String {
    let first_token = |field: &Option<String>| {
        field
            .as_deref()
            .and_then(|f| f.split_whitespace().next())
            .map(String::from)
    };
    first_token(&record.version)
        .or_else(|| first_token(&record.accession))
        .or_else(|| record.name.clone().filter(|n| !n.is_empty()))
        .unwrap_or_else(|| UNKNOWN_ID.to_string())
}

/// Length from the LOCUS line if there was one, otherwise the length of the
/// sequence data. The two only differ for CONTIG records without sequence.
pub fn record_len(record: &Seq) -> usize {
    record.len.unwrap_or(record.seq.len())
}

/// Whether the residues could all be nucleotides (IUPAC codes and gaps).
/// gb-io doesn't keep the molecule type of `aa` records, so this is what
/// tells a protein record apart. Records without sequence count as
/// nucleotide.
pub fn is_nucleotide(record: &Seq) -> bool {
    record
        .seq
        .iter()
        .all(|b| b"ACGTURYSWKMBDHVN-.".contains(&b.to_ascii_uppercase()))
}

/// Finds the region covered by a location, as a 0-based exclusive range,
/// along with its strand. Compound locations span from their leftmost to
/// their rightmost part, so a join over the origin of a circular sequence
/// covers the whole sequence. Parts that don't lie on this sequence are
/// ignored, `None` is returned if there is nothing left.
pub fn location_span(location: &Location) -> Option<(i64, i64, Strand)> {
    match *location {
        Location::Range((start, _), (end, _)) => Some((start, end, Strand::Forward)),
        // n^n+1 covers both bases
        Location::Between(a, b) => Some((a.min(b), a.max(b) + 1, Strand::Forward)),
        Location::Complement(ref inner) => {
            location_span(inner).map(|(start, end, strand)| (start, end, strand.flip()))
        }
        Location::Join(ref parts)
        | Location::Order(ref parts)
        | Location::Bond(ref parts)
        | Location::OneOf(ref parts) => parts.iter().filter_map(location_span).reduce(
            |(start_a, end_a, strand_a), (start_b, end_b, strand_b)| {
                let strand = if strand_a == strand_b {
                    strand_a
                } else {
                    Strand::Unknown
                };
                (start_a.min(start_b), end_a.max(end_b), strand)
            },
        ),
        Location::External(..) | Location::Gap(..) => None,
    }
}

// `source`, `score` and `phase` go into their own columns. They're only
// dropped from the attributes if that loses nothing.
fn take_column(qualifiers: &mut BTreeMap<String, Vec<String>>, key: &str) -> Option<String> {
    match qualifiers.get(key).map(Vec::len) {
        Some(1) => qualifiers.remove(key).and_then(|mut v| v.pop()),
        Some(_) => qualifiers.get(key).and_then(|v| v.first().cloned()),
        None => None,
    }
}

/// Trims values, then drops empty and duplicate ones. Keys are kept even if
/// no values remain, so flags such as `/pseudo` survive as `pseudo=`.
fn clean_attributes(raw: BTreeMap<String, Vec<String>>) -> Vec<(String, Vec<String>)> {
    raw.into_iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, values)| {
            let values = values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .unique()
                .map(String::from)
                .collect();
            (key, values)
        })
        .collect()
}

fn record_annotations(record: &Seq) -> BTreeMap<String, Vec<String>> {
    fn strip_period(s: &str) -> &str {
        let s = s.trim();
        s.strip_suffix('.').unwrap_or(s)
    }
    fn split_list(s: &str) -> Vec<String> {
        s.split(';').map(|item| strip_period(item).to_string()).collect()
    }

    let mut anns = BTreeMap::new();
    let mut add = |key: &str, values: Vec<String>| {
        anns.insert(key.to_string(), values);
    };

    if let Some(ref accession) = record.accession {
        // secondary accessions may be followed by "REGION: 1..100"
        let accessions = accession
            .split_whitespace()
            .take_while(|a| !a.ends_with(':'))
            .map(String::from)
            .collect();
        add("accessions", accessions);
    }
    if let Some(version) = record.version.as_deref().and_then(|v| v.split_whitespace().next()) {
        if let Some((_, n)) = version.rsplit_once('.') {
            if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) {
                add("sequence_version", vec![n.to_string()]);
            }
        }
    }
    if let Some(ref keywords) = record.keywords {
        add("keywords", split_list(keywords));
    }
    if let Some(ref source) = record.source {
        add("source", vec![strip_period(&source.source).to_string()]);
        if let Some(ref organism) = source.organism {
            let mut lines = organism.lines();
            if let Some(name) = lines.next() {
                add("organism", vec![name.trim().to_string()]);
            }
            add("taxonomy", split_list(&lines.map(str::trim).join(" ")));
        }
    }
    if !record.comments.is_empty() {
        add("comment", vec![record.comments.join("\n")]);
    }
    if let Some(ref molecule_type) = record.molecule_type {
        add("molecule_type", vec![molecule_type.clone()]);
    }
    add("topology", vec![record.topology.to_string()]);
    add("data_file_division", vec![record.division.clone()]);
    if let Some(ref date) = record.date {
        add("date", vec![date.to_string()]);
    }

    // unlike feature flags, metadata without a value carries nothing
    anns.retain(|_, values| values.iter().any(|v| !v.trim().is_empty()));
    anns
}

/// Percent-encode an attribute value. Everything except ASCII alphanumerics
/// and `-_.~:/ ` is escaped, which in particular covers the characters with a
/// meaning in column 9 (`;=,&`) as well as tabs and newlines.
pub fn escape(value: &str) -> String {
    let mut res = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find(UNESCAPED) {
        res.push_str(&urlencoding::encode(&rest[..idx]));
        // all of UNESCAPED are single bytes
        res.push_str(&rest[idx..idx + 1]);
        rest = &rest[idx + 1..];
    }
    res.push_str(&urlencoding::encode(rest));
    res
}

/// Reverses `escape`. Fails if the decoded bytes aren't valid UTF-8.
pub fn unescape(value: &str) -> Result<String, std::string::FromUtf8Error> {
    urlencoding::decode(value).map(|v| v.into_owned())
}
