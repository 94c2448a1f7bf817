//! Stitching of fragments along a path into one scaffold.
//!
//! The accumulator starts as the first fragment of the path. Each following
//! fragment is aligned against the current accumulator and fused with the
//! first alignment that fits the junction geometry and yields a long enough
//! sequence. A fragment that cannot be fused is skipped and the accumulator
//! moves on unchanged.

use crate::aligner::PairwiseAligner;
use crate::alignment_record::{AlignmentRecord, Strand};
use crate::config::BridgeConfig;
use crate::error::BridgeError;
use crate::fragment::{reverse_complement, FlankTags, Fragment, SeqView};
use crate::validator::{evaluate, Geometry, RuleSet};
use log::{debug, info};
use std::borrow::Cow;

/// Sequence accumulated by fusing the fragments of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scaffold {
    pub description: String,
    pub sequence: Vec<u8>,
    pub tags: FlankTags,
}

impl Scaffold {
    pub fn from_fragment(fragment: &Fragment) -> Self {
        Scaffold {
            description: fragment.id.clone(),
            sequence: fragment.sequence.clone(),
            tags: FlankTags::of(fragment.role),
        }
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn view(&self) -> SeqView<'_> {
        SeqView {
            id: &self.description,
            sequence: &self.sequence,
        }
    }
}

/// How the next fragment attaches to the accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JunctionCase {
    /// Accumulator holds the left flank; the next fragment extends it rightwards.
    LeftExtension,
    /// Accumulator holds the right flank; the next fragment extends it leftwards.
    RightExtension,
    /// The fusion brings both flanks together.
    Closing,
    /// Two flank-free pieces.
    ContigJoin,
}

impl JunctionCase {
    pub fn select(acc: FlankTags, next: FlankTags) -> JunctionCase {
        if acc.left && !next.right {
            JunctionCase::LeftExtension
        } else if acc.right && !next.left {
            JunctionCase::RightExtension
        } else if acc.union(next).both() {
            JunctionCase::Closing
        } else {
            JunctionCase::ContigJoin
        }
    }
}

fn at(coord: i64) -> usize {
    coord.max(0) as usize
}

fn prefix(seq: &[u8], end: i64) -> &[u8] {
    &seq[..at(end).min(seq.len())]
}

fn suffix(seq: &[u8], start: i64) -> &[u8] {
    &seq[at(start).min(seq.len())..]
}

fn join(head: &[u8], tail: &[u8]) -> Vec<u8> {
    let mut fused = Vec::with_capacity(head.len() + tail.len());
    fused.extend_from_slice(head);
    fused.extend_from_slice(tail);
    fused
}

/// Fused sequence for one alignment, or `None` when the geometry does not fit
/// the junction. `acc` is the alignment query and `next` its subject.
pub fn fuse_sequences(
    acc: &[u8],
    next: &[u8],
    case: JunctionCase,
    record: &AlignmentRecord,
    config: &BridgeConfig,
) -> Option<Vec<u8>> {
    let g = Geometry::new(record, acc.len(), next.len());
    let w = config.limits.anchor_window;
    let m = config.limits.novel_margin;
    let r = config.limits.reach_tolerance;
    let o = config.limits.overhang_tolerance;

    match (case, g.strand) {
        (JunctionCase::LeftExtension, Strand::Forward) => {
            let fits = (g.ss < w || g.qs < w)
                && (g.se - g.slen).abs() > m
                && (g.qlen - g.qe).abs() < r;
            fits.then(|| join(prefix(acc, g.qe), suffix(next, g.se)))
        }
        (JunctionCase::LeftExtension, Strand::Reverse) => {
            let fits = ((g.ss - g.slen).abs() < w || g.qs < w)
                && g.se > m
                && (g.qlen - g.qe).abs() < r;
            fits.then(|| {
                let extension = reverse_complement(prefix(next, g.se - 1));
                join(prefix(acc, g.qe), &extension)
            })
        }
        (JunctionCase::RightExtension, Strand::Forward) => {
            let fits = ((g.se - g.slen).abs() < w || (g.qe - g.qlen).abs() < w)
                && g.ss > m
                && g.qs < o;
            fits.then(|| join(prefix(next, g.se), suffix(acc, g.qe)))
        }
        (JunctionCase::RightExtension, Strand::Reverse) => {
            let fits = (g.ss - g.slen).abs() > m
                && (g.se < w || (g.qe - g.qlen).abs() < w)
                && g.qs < o;
            fits.then(|| {
                let extension = reverse_complement(suffix(next, g.se - 1));
                join(&extension, suffix(acc, g.qe))
            })
        }
        (JunctionCase::Closing, strand) => {
            if strand == Strand::Forward && g.ss < o && (g.qe - g.qlen).abs() < w {
                Some(join(prefix(acc, g.qe), suffix(next, g.se)))
            } else if acc.len() > config.concat_fallback_length() {
                Some(join(acc, next))
            } else {
                None
            }
        }
        (JunctionCase::ContigJoin, _) => join_contigs(acc, next, g, config),
    }
}

/// Fuse two contigs on whichever side the subject overhangs further.
fn join_contigs(acc: &[u8], next: &[u8], g: Geometry, config: &BridgeConfig) -> Option<Vec<u8>> {
    evaluate(RuleSet::ContigPair, g, &config.limits)?;

    // orient the subject along the query
    let (subject, ss, se): (Cow<[u8]>, i64, i64) = match g.strand {
        Strand::Forward => (Cow::Borrowed(next), g.ss, g.se),
        Strand::Reverse => (
            Cow::Owned(reverse_complement(next)),
            g.slen - g.ss + 1,
            g.slen - g.se + 1,
        ),
    };

    if g.slen - se > g.qlen - g.qe {
        Some(join(prefix(acc, g.qe), suffix(&subject, se)))
    } else if ss - 1 > g.qs - 1 {
        Some(join(prefix(&subject, ss - 1), suffix(acc, g.qs - 1)))
    } else {
        None
    }
}

/// Fuse `next` into `acc` using one alignment, applying the length floor.
pub fn fuse(
    acc: &Scaffold,
    next: &Fragment,
    record: &AlignmentRecord,
    config: &BridgeConfig,
) -> Result<Scaffold, BridgeError> {
    let next_tags = FlankTags::of(next.role);
    let case = JunctionCase::select(acc.tags, next_tags);
    let sequence = fuse_sequences(&acc.sequence, &next.sequence, case, record, config)
        .ok_or(BridgeError::NoAlignmentFound)?;

    let minimum = if acc.tags.both() {
        config.min_bridged_length()
    } else {
        config.min_fused_length
    };
    if sequence.len() < minimum {
        return Err(BridgeError::MergeBelowMinimumLength {
            length: sequence.len(),
            minimum,
        });
    }

    Ok(Scaffold {
        description: format!("{}_{}", acc.description, next.id),
        sequence,
        tags: acc.tags.union(next_tags),
    })
}

/// Fuse `next` with the first of `records` that produces an accepted scaffold
pub fn merge_pair(
    acc: &Scaffold,
    next: &Fragment,
    records: &[AlignmentRecord],
    config: &BridgeConfig,
) -> Result<Scaffold, BridgeError> {
    let mut last_error = BridgeError::NoAlignmentFound;
    for record in records {
        match fuse(acc, next, record, config) {
            Ok(scaffold) => return Ok(scaffold),
            Err(e) => {
                debug!(
                    "Candidate q{}-{} s{}-{} rejected for {} + {}: {}",
                    record.query_start,
                    record.query_end,
                    record.subject_start,
                    record.subject_end,
                    acc.description,
                    next.id,
                    e
                );
                last_error = e;
            }
        }
    }
    Err(last_error)
}

/// Merge the fragments of `path` in order into one scaffold.
///
/// Only aligner failures are returned as errors; pairs that do not fuse are
/// logged and leave a gap.
pub fn merge_path(
    path: &[&Fragment],
    aligner: &mut dyn PairwiseAligner,
    config: &BridgeConfig,
) -> Result<Scaffold, BridgeError> {
    let (first, rest) = path
        .split_first()
        .ok_or_else(|| BridgeError::InvalidInput("Cannot merge an empty path".to_string()))?;

    let mut acc = Scaffold::from_fragment(first);
    for next in rest {
        let records = aligner.align(acc.view(), next.view())?;
        if records.is_empty() {
            info!(
                "Two contigs for merging are not aligned: {} and {}",
                acc.description, next.id
            );
            continue;
        }
        match merge_pair(&acc, next, &records, config) {
            Ok(scaffold) => {
                debug!("Merged {} ({} bp)", scaffold.description, scaffold.len());
                acc = scaffold;
            }
            Err(e) => info!(
                "Two contigs are not merged: {} and {} ({})",
                acc.description, next.id, e
            ),
        }
    }
    Ok(acc)
}
