//! Overlap validation between two fragments.
//!
//! Each candidate alignment reported for a fragment pair is checked against a
//! rule set chosen from the roles of the pair. The first candidate that passes
//! is accepted and its leftover (length of the subject-side tail the alignment
//! leaves uncovered) becomes the edge weight of the overlap.

use crate::alignment_record::{AlignmentRecord, Strand};
use crate::config::GeometryLimits;
use crate::fragment::{Fragment, Role};

/// Geometric rules selected by the (query role, subject role) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleSet {
    /// Left flank as query: the subject must extend past the flank's inner end.
    LeftFlankQuery,
    /// Right flank as query: the subject must extend before the flank's inner start.
    RightFlankQuery,
    /// Contig as query, right flank as subject.
    RightFlankSubject,
    /// Two contigs: neither alignment may be internal to its sequence.
    ContigPair,
}

impl RuleSet {
    /// Rule set for a role pair; `None` for the two flanks, which never overlap.
    pub fn for_roles(query: Role, subject: Role) -> Option<RuleSet> {
        match (query, subject) {
            (Role::LeftFlank, Role::RightFlank) | (Role::RightFlank, Role::LeftFlank) => None,
            (Role::LeftFlank, _) => Some(RuleSet::LeftFlankQuery),
            (Role::RightFlank, _) => Some(RuleSet::RightFlankQuery),
            (_, Role::RightFlank) => Some(RuleSet::RightFlankSubject),
            (Role::Contig, _) => Some(RuleSet::ContigPair),
        }
    }
}

/// The single accepted alignment of a fragment pair
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOverlap {
    pub fragment_a: String,
    pub fragment_b: String,
    pub leftover: usize,
    pub record: AlignmentRecord,
}

/// Raw alignment coordinates plus both sequence lengths, as signed values
#[derive(Debug, Clone, Copy)]
pub(crate) struct Geometry {
    pub qs: i64,
    pub qe: i64,
    pub ss: i64,
    pub se: i64,
    pub qlen: i64,
    pub slen: i64,
    pub strand: Strand,
}

impl Geometry {
    pub fn new(record: &AlignmentRecord, query_len: usize, subject_len: usize) -> Self {
        Geometry {
            qs: record.query_start as i64,
            qe: record.query_end as i64,
            ss: record.subject_start as i64,
            se: record.subject_end as i64,
            qlen: query_len as i64,
            slen: subject_len as i64,
            strand: record.strand(),
        }
    }

    /// Same geometry with start <= end on both sequences
    pub fn normalized(self) -> Self {
        Geometry {
            qs: self.qs.min(self.qe),
            qe: self.qs.max(self.qe),
            ss: self.ss.min(self.se),
            se: self.ss.max(self.se),
            ..self
        }
    }
}

/// Accepted leftover for one alignment under a rule set, `None` when rejected
pub(crate) fn evaluate(rule: RuleSet, g: Geometry, limits: &GeometryLimits) -> Option<i64> {
    let w = limits.anchor_window;
    let m = limits.novel_margin;
    let r = limits.reach_tolerance;
    let o = limits.overhang_tolerance;

    match (rule, g.strand) {
        (RuleSet::LeftFlankQuery, Strand::Forward) => {
            if (g.ss > w && g.qs > w) || (g.se - g.slen).abs() < m || (g.qlen - g.qe).abs() > r {
                None
            } else {
                Some(g.slen - g.se)
            }
        }
        (RuleSet::LeftFlankQuery, Strand::Reverse) => {
            if ((g.ss - g.slen).abs() > w && g.qs > w) || g.se < m || (g.qlen - g.qe).abs() > r {
                None
            } else {
                Some(g.se)
            }
        }
        (RuleSet::RightFlankQuery, Strand::Forward) => {
            if ((g.se - g.slen).abs() > w && (g.qe - g.qlen).abs() > w) || g.ss < m || g.qs > o {
                None
            } else {
                Some(g.ss - 1)
            }
        }
        (RuleSet::RightFlankQuery, Strand::Reverse) => {
            if (g.ss - g.slen).abs() < m || (g.se > w && (g.qe - g.qlen).abs() > w) || g.qs > o {
                None
            } else {
                Some(g.slen - g.ss)
            }
        }
        (RuleSet::RightFlankSubject, Strand::Forward) => {
            if ((g.qe - g.qlen).abs() > w && (g.se - g.slen).abs() > w) || g.qs < m || g.ss > o {
                None
            } else {
                Some(g.qs - 1)
            }
        }
        (RuleSet::RightFlankSubject, Strand::Reverse) => {
            if (g.qe - g.qlen).abs() < m || (g.qs > w && (g.ss - g.slen).abs() > w) || g.se > o {
                None
            } else {
                Some(g.qlen - g.qe)
            }
        }
        (RuleSet::ContigPair, _) => {
            let n = g.normalized();
            let query_internal = n.qs > o && (n.qe - n.qlen).abs() > o;
            let subject_internal = n.ss > o && (n.se - n.slen).abs() > o;
            if query_internal || subject_internal {
                return None;
            }
            let subject_tail = (n.se - n.slen).abs();
            if n.ss > o && subject_tail < o {
                Some(n.ss - 1)
            } else if n.ss < o && subject_tail > o {
                Some(n.slen - n.se)
            } else {
                Some(0)
            }
        }
    }
}

/// Select the first candidate alignment that satisfies the pair's rule set.
///
/// Candidates are tried in the order the aligner reported them.
pub fn validate(
    records: &[AlignmentRecord],
    query: &Fragment,
    subject: &Fragment,
    limits: &GeometryLimits,
) -> Option<ValidatedOverlap> {
    let rule = RuleSet::for_roles(query.role, subject.role)?;

    records.iter().find_map(|record| {
        let geometry = Geometry::new(record, query.len(), subject.len());
        evaluate(rule, geometry, limits).map(|leftover| ValidatedOverlap {
            fragment_a: query.id.clone(),
            fragment_b: subject.id.clone(),
            leftover: leftover.max(0) as usize,
            record: record.clone(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frag(id: &str, len: usize, role: Role) -> Fragment {
        Fragment::new(id, &vec![b'A'; len], role)
    }

    fn rec(q: (usize, usize), s: (usize, usize)) -> AlignmentRecord {
        AlignmentRecord::from_coords("q", "s", q, s)
    }

    #[test]
    fn test_rule_dispatch() {
        assert_eq!(RuleSet::for_roles(Role::LeftFlank, Role::RightFlank), None);
        assert_eq!(RuleSet::for_roles(Role::RightFlank, Role::LeftFlank), None);
        assert_eq!(
            RuleSet::for_roles(Role::LeftFlank, Role::Contig),
            Some(RuleSet::LeftFlankQuery)
        );
        assert_eq!(
            RuleSet::for_roles(Role::RightFlank, Role::Contig),
            Some(RuleSet::RightFlankQuery)
        );
        assert_eq!(
            RuleSet::for_roles(Role::Contig, Role::RightFlank),
            Some(RuleSet::RightFlankSubject)
        );
        assert_eq!(
            RuleSet::for_roles(Role::Contig, Role::Contig),
            Some(RuleSet::ContigPair)
        );
    }

    #[test]
    fn test_left_flank_forward() {
        let limits = GeometryLimits::default();
        let flank = frag("left_flank", 400, Role::LeftFlank);
        let contig = frag("contig1", 300, Role::Contig);

        // Flank tail aligned to the contig head, contig extends 200 bp further
        let ok = validate(&[rec((301, 400), (1, 100))], &flank, &contig, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        assert_eq!(ok.fragment_a, "left_flank");

        // Alignment stops 30 bp before the flank end
        assert!(validate(&[rec((271, 370), (1, 100))], &flank, &contig, &limits).is_none());
        // Contig fully consumed by the flank
        assert!(validate(&[rec((201, 400), (101, 295))], &flank, &contig, &limits).is_none());
        // Both alignment starts far from their sequence starts
        assert!(validate(&[rec((351, 400), (60, 109))], &flank, &contig, &limits).is_none());
    }

    #[test]
    fn test_left_flank_reverse() {
        let limits = GeometryLimits::default();
        let flank = frag("left_flank", 400, Role::LeftFlank);
        let contig = frag("contig1", 300, Role::Contig);

        let ok = validate(&[rec((301, 400), (300, 201))], &flank, &contig, &limits).unwrap();
        assert_eq!(ok.leftover, 201);
        assert_eq!(ok.record.strand(), Strand::Reverse);

        // Reverse alignment reaching the contig start leaves nothing novel
        assert!(validate(&[rec((301, 400), (100, 5))], &flank, &contig, &limits).is_none());
    }

    #[test]
    fn test_right_flank_query_and_subject() {
        let limits = GeometryLimits::default();
        let flank = frag("right_flank", 400, Role::RightFlank);
        let contig = frag("contig2", 300, Role::Contig);

        // Right flank head aligned to the contig tail
        let ok = validate(&[rec((1, 100), (201, 300))], &flank, &contig, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        assert!(validate(&[rec((40, 140), (201, 300))], &flank, &contig, &limits).is_none());

        // Contig as query against the right flank
        let ok = validate(&[rec((201, 300), (1, 100))], &contig, &flank, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        let ok = validate(&[rec((201, 300), (100, 1))], &contig, &flank, &limits);
        assert!(ok.is_none());
        let ok = validate(&[rec((1, 100), (100, 5))], &contig, &flank, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        assert!(validate(&[rec((101, 200), (100, 5))], &contig, &flank, &limits).is_none());
    }

    #[test]
    fn test_contig_pair() {
        let limits = GeometryLimits::default();
        let a = frag("contig1", 300, Role::Contig);
        let b = frag("contig2", 300, Role::Contig);

        // Tail of a overlaps head of b
        let ok = validate(&[rec((201, 300), (1, 100))], &a, &b, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        // Head of a overlaps tail of b
        let ok = validate(&[rec((1, 100), (201, 300))], &a, &b, &limits).unwrap();
        assert_eq!(ok.leftover, 200);
        // Internal alignment on the query
        assert!(validate(&[rec((101, 200), (1, 100))], &a, &b, &limits).is_none());
        // Containment: accepted, but with no leftover
        let ok = validate(&[rec((1, 300), (1, 300))], &a, &b, &limits).unwrap();
        assert_eq!(ok.leftover, 0);
    }

    #[test]
    fn test_first_passing_candidate_wins() {
        let limits = GeometryLimits::default();
        let a = frag("contig1", 300, Role::Contig);
        let b = frag("contig2", 300, Role::Contig);
        let records = vec![
            rec((101, 200), (1, 100)),
            rec((201, 300), (1, 100)),
            rec((1, 100), (201, 300)),
        ];
        let ok = validate(&records, &a, &b, &limits).unwrap();
        assert_eq!(ok.record.query_start, 201);
        assert!(validate(&[], &a, &b, &limits).is_none());
    }
}
