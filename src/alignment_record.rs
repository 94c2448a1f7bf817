/// One reported local alignment between two fragments.
///
/// Coordinates are 1-based and inclusive, as emitted by the external aligner.
/// On the reverse strand the subject coordinates are descending
/// (`subject_start > subject_end`); query coordinates are always ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    pub query_id: String,
    pub subject_id: String,
    pub percent_identity: f64,
    pub alignment_length: usize,
    pub mismatches: usize,
    pub gap_opens: usize,
    pub query_start: usize,
    pub query_end: usize,
    pub subject_start: usize,
    pub subject_end: usize,
    pub evalue: f64,
    pub bit_score: f64,
}

/// Strand orientation of the subject relative to the query
#[derive(Default, PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    pub fn as_char(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl AlignmentRecord {
    /// Build a record from bare coordinates, leaving the scoring columns empty.
    pub fn from_coords(
        query_id: &str,
        subject_id: &str,
        query: (usize, usize),
        subject: (usize, usize),
    ) -> Self {
        AlignmentRecord {
            query_id: query_id.to_string(),
            subject_id: subject_id.to_string(),
            percent_identity: 100.0,
            alignment_length: query.1.abs_diff(query.0) + 1,
            mismatches: 0,
            gap_opens: 0,
            query_start: query.0,
            query_end: query.1,
            subject_start: subject.0,
            subject_end: subject.1,
            evalue: 0.0,
            bit_score: 0.0,
        }
    }

    /// Subject strand, derived from the direction of the subject coordinates
    pub fn strand(&self) -> Strand {
        if self.subject_start > self.subject_end {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    /// Query interval as (low, high)
    pub fn query_span(&self) -> (usize, usize) {
        (
            self.query_start.min(self.query_end),
            self.query_start.max(self.query_end),
        )
    }

    /// Subject interval as (low, high), independent of strand
    pub fn subject_span(&self) -> (usize, usize) {
        (
            self.subject_start.min(self.subject_end),
            self.subject_start.max(self.subject_end),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strand_from_subject_direction() {
        let forward = AlignmentRecord::from_coords("a", "b", (1, 50), (10, 59));
        assert_eq!(forward.strand(), Strand::Forward);
        assert_eq!(forward.strand().as_char(), '+');

        let reverse = AlignmentRecord::from_coords("a", "b", (1, 50), (59, 10));
        assert_eq!(reverse.strand(), Strand::Reverse);
        assert_eq!(reverse.subject_span(), (10, 59));
        assert_eq!(reverse.alignment_length, 50);
    }
}
