//! Tabular pairwise-alignment parsing
//!
//! Reads the 12-column tab-separated output of the external pairwise aligner:
//! query id, subject id, percent identity, alignment length, mismatches,
//! gap opens, query start/end, subject start/end, e-value and bit score.
//! Comment lines (`#`) and blank lines are skipped.

use crate::alignment_record::AlignmentRecord;
use std::io::{BufRead, Error as IoError};
use std::num::{ParseFloatError, ParseIntError};

#[derive(Debug)]
pub enum ParseErr {
    NotEnoughFields(usize),
    IoError(IoError),
    InvalidInt(ParseIntError),
    InvalidFloat(ParseFloatError),
    ZeroCoordinate,
}

impl std::fmt::Display for ParseErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErr::NotEnoughFields(n) => {
                write!(f, "Not enough fields in alignment row (found {}, need 12)", n)
            }
            ParseErr::IoError(e) => write!(f, "IO error: {}", e),
            ParseErr::InvalidInt(e) => write!(f, "Invalid integer field: {}", e),
            ParseErr::InvalidFloat(e) => write!(f, "Invalid numeric field: {}", e),
            ParseErr::ZeroCoordinate => write!(f, "Alignment coordinates are 1-based, found 0"),
        }
    }
}

impl std::error::Error for ParseErr {}

fn parse_coord(field: &str) -> Result<usize, ParseErr> {
    let value = field.trim().parse::<usize>().map_err(ParseErr::InvalidInt)?;
    if value == 0 {
        return Err(ParseErr::ZeroCoordinate);
    }
    Ok(value)
}

/// Parse a single tabular row into an AlignmentRecord
fn parse_tab_line(line: &str) -> Result<AlignmentRecord, ParseErr> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 12 {
        return Err(ParseErr::NotEnoughFields(fields.len()));
    }

    Ok(AlignmentRecord {
        query_id: fields[0].to_string(),
        subject_id: fields[1].to_string(),
        percent_identity: fields[2].trim().parse::<f64>().map_err(ParseErr::InvalidFloat)?,
        alignment_length: fields[3].trim().parse::<usize>().map_err(ParseErr::InvalidInt)?,
        mismatches: fields[4].trim().parse::<usize>().map_err(ParseErr::InvalidInt)?,
        gap_opens: fields[5].trim().parse::<usize>().map_err(ParseErr::InvalidInt)?,
        query_start: parse_coord(fields[6])?,
        query_end: parse_coord(fields[7])?,
        subject_start: parse_coord(fields[8])?,
        subject_end: parse_coord(fields[9])?,
        evalue: fields[10].trim().parse::<f64>().map_err(ParseErr::InvalidFloat)?,
        bit_score: fields[11].trim().parse::<f64>().map_err(ParseErr::InvalidFloat)?,
    })
}

/// Parse every alignment row from a reader, keeping the aligner's order
pub fn parse_blast_tab<R: BufRead>(reader: R) -> Result<Vec<AlignmentRecord>, ParseErr> {
    let mut records = Vec::new();
    for line_result in reader.lines() {
        let line = line_result.map_err(ParseErr::IoError)?;
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        records.push(parse_tab_line(trimmed)?);
    }
    Ok(records)
}
