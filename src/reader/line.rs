use std::str;

use nom::branch::alt;
use nom::bytes::streaming::{is_not, tag, take_while};
use nom::character::streaming::{char, line_ending, not_line_ending};
use nom::combinator::{map, map_res, opt, value};
use nom::sequence::{preceded, terminated};
use nom::{IResult, Parser};

use crate::record::{unescape, GffRecord, Strand};

/// One line outside of the `##FASTA` section
#[derive(Debug, PartialEq, Clone)]
pub enum Line {
    Blank,
    Directive(String, Vec<String>),
    Comment(String),
    Record(GffRecord),
}

#[derive(Debug)]
pub struct AttributeError;

fn text_line(input: &[u8]) -> IResult<&[u8], &str> {
    map_res(terminated(not_line_ending, line_ending), str::from_utf8).parse(input)
}

fn directive(input: &[u8]) -> IResult<&[u8], Line> {
    map(preceded(tag("##"), text_line), |text: &str| {
        let mut words = text.split_whitespace();
        let name = words.next().unwrap_or_default().to_string();
        Line::Directive(name, words.map(String::from).collect())
    })
    .parse(input)
}

fn comment(input: &[u8]) -> IResult<&[u8], Line> {
    map(preceded(char('#'), text_line), |text: &str| {
        Line::Comment(text.trim().to_string())
    })
    .parse(input)
}

fn column(input: &[u8]) -> IResult<&[u8], &str> {
    map_res(is_not("\t\r\n"), str::from_utf8).parse(input)
}

fn tab(input: &[u8]) -> IResult<&[u8], char> {
    char('\t').parse(input)
}

fn position(input: &[u8]) -> IResult<&[u8], u64> {
    nom::character::streaming::u64(input)
}

fn strand(input: &[u8]) -> IResult<&[u8], Strand> {
    alt((
        value(Strand::Forward, char('+')),
        value(Strand::Reverse, char('-')),
        value(Strand::Unknown, char('.')),
        value(Strand::Unknown, char('?')),
    ))
    .parse(input)
}

fn optional(column: &str) -> Option<String> {
    match column {
        "." => None,
        c => Some(c.to_string()),
    }
}

/// Parses column 9. `.` and an absent column both mean no attributes.
pub fn attributes(column: &str) -> Result<Vec<(String, Vec<String>)>, AttributeError> {
    if column == "." {
        return Ok(Vec::new());
    }
    column
        .split(';')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, values) = pair.split_once('=').ok_or(AttributeError)?;
            let values = if values.is_empty() {
                Vec::new()
            } else {
                values
                    .split(',')
                    .map(unescape)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|_| AttributeError)?
            };
            Ok((key.to_string(), values))
        })
        .collect()
}

fn record(input: &[u8]) -> IResult<&[u8], Line> {
    map_res(
        terminated(
            (
                column,
                preceded(tab, column),
                preceded(tab, column),
                preceded(tab, position),
                preceded(tab, position),
                preceded(tab, column),
                preceded(tab, strand),
                preceded(tab, column),
                opt(preceded(tab, column)),
            ),
            line_ending,
        ),
        |(seqid, source, kind, start, end, score, strand, phase, attrs)| {
            Ok::<_, AttributeError>(Line::Record(GffRecord {
                seqid: seqid.to_string(),
                source: source.to_string(),
                kind: kind.to_string(),
                start,
                end,
                score: optional(score),
                strand,
                phase: optional(phase),
                attributes: attributes(attrs.unwrap_or("."))?,
            }))
        },
    )
    .parse(input)
}

pub fn line(input: &[u8]) -> IResult<&[u8], Line> {
    alt((value(Line::Blank, line_ending), directive, comment, record))
    .parse(input)
}

/// `>id description`
pub fn fasta_header(input: &[u8]) -> IResult<&[u8], (String, Option<String>)> {
    map(preceded(char('>'), text_line), |text: &str| {
        match text.trim().split_once(|c: char| c.is_whitespace()) {
            Some((id, description)) => (id.to_string(), Some(description.trim().to_string())),
            None => (text.trim().to_string(), None),
        }
    })
    .parse(input)
}

/// A line of residues, may be blank
pub fn sequence_line(input: &[u8]) -> IResult<&[u8], Vec<u8>> {
    map(
        terminated(
            take_while(|b: u8| b.is_ascii_alphabetic() || b == b'*' || b == b'-'),
            line_ending,
        ),
        <[u8]>::to_vec,
    )
    .parse(input)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_record() {
        let input = b"SEQ1\tfeature\tCDS\t21\t80\t.\t-\t0\tgene=tst;note=a%3Bb,c;pseudo=\nrest";
        let (rest, parsed) = line(&input[..]).unwrap();
        assert_eq!(rest, b"rest");
        match parsed {
            Line::Record(r) => {
                assert_eq!(r.seqid, "SEQ1");
                assert_eq!((r.start, r.end), (21, 80));
                assert_eq!(r.strand, Strand::Reverse);
                assert_eq!(r.score, None);
                assert_eq!(r.phase.as_deref(), Some("0"));
                assert_eq!(
                    r.attributes,
                    vec![
                        ("gene".to_string(), vec!["tst".to_string()]),
                        ("note".to_string(), vec!["a;b".to_string(), "c".to_string()]),
                        ("pseudo".to_string(), vec![]),
                    ]
                );
            }
            x => panic!("{:?}", x),
        }
    }

    #[test]
    fn test_incomplete() {
        let input = b"SEQ1\tfeature\tCDS\t21\t80\t.\t-\t0\tgene=tst\n";
        for n in 0..input.len() {
            match line(&input[..n]) {
                Err(nom::Err::Incomplete(_)) => {}
                x => panic!("{:?} => {:?}", &input[..n], x),
            }
        }
    }

    #[test]
    fn test_directive() {
        assert_eq!(
            line(b"##sequence-region SEQ1 1 100\r\n"),
            Ok((
                &b""[..],
                Line::Directive(
                    "sequence-region".into(),
                    vec!["SEQ1".into(), "1".into(), "100".into()]
                )
            ))
        );
        assert_eq!(line(b"# hello\n"), Ok((&b""[..], Line::Comment("hello".into()))));
        assert_eq!(line(b"\nx"), Ok((&b"x"[..], Line::Blank)));
    }

    #[test]
    fn test_bad_record() {
        assert!(matches!(line(b"SEQ1\tfeature\n"), Err(nom::Err::Error(_))));
        assert!(matches!(
            line(b"SEQ1\tfeature\tgene\tone\t80\t.\t+\t.\t.\n"),
            Err(nom::Err::Error(_))
        ));
        assert!(matches!(
            line(b"SEQ1\tfeature\tgene\t1\t80\t.\t+\t.\tno_equals_sign\n"),
            Err(nom::Err::Error(_))
        ));
    }

    #[test]
    fn test_fasta() {
        assert_eq!(
            fasta_header(b">SEQ1 A short test\n"),
            Ok((&b""[..], ("SEQ1".to_string(), Some("A short test".to_string()))))
        );
        assert_eq!(
            sequence_line(b"ACGT\n>next"),
            Ok((&b">next"[..], b"ACGT".to_vec()))
        );
        assert!(matches!(sequence_line(b">next\n"), Err(nom::Err::Error(_))));
    }
}
