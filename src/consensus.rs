//! Placement of merged scaffolds against the element consensus.
//!
//! The scaffold stretch covered by consensus hits is taken as the inserted
//! element and everything outside it as flank. A single scaffold from a full
//! bridging path is characterized exactly; two independent pieces (left and
//! right extension) only give a best-effort insertion.

use crate::aligner::{BlastnAligner, PairwiseAligner};
use crate::alignment_record::{AlignmentRecord, Strand};
use crate::error::BridgeError;
use crate::fragment::{read_fasta_records, SeqView};
use crate::merger::Scaffold;
use log::{debug, info};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Characterization {
    Full,
    Partial,
    Failed,
}

impl fmt::Display for Characterization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Characterization::Full => "FULL",
            Characterization::Partial => "PARTIAL",
            Characterization::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Insertion extracted from a consensus alignment
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub characterization: Characterization,
    pub insertion: Vec<u8>,
    pub left_flank: Vec<u8>,
    pub right_flank: Vec<u8>,
    /// Orientation of the element relative to the scaffold.
    pub strand: Option<Strand>,
    /// Covered consensus interval, 1-based inclusive.
    pub consensus_span: Option<(usize, usize)>,
}

impl Annotation {
    pub fn failed() -> Self {
        Annotation {
            characterization: Characterization::Failed,
            insertion: Vec::new(),
            left_flank: Vec::new(),
            right_flank: Vec::new(),
            strand: None,
            consensus_span: None,
        }
    }

    pub fn is_fully_characterized(&self) -> bool {
        self.characterization == Characterization::Full
    }

    pub fn is_partially_characterized(&self) -> bool {
        self.characterization == Characterization::Partial
    }

    pub fn insertion_len(&self) -> usize {
        self.insertion.len()
    }
}

pub trait ConsensusAligner {
    /// Align `scaffolds` to the consensus and extract the insertion.
    ///
    /// `full_path` marks a single scaffold produced by a complete bridge.
    fn align_to_consensus(
        &mut self,
        scaffolds: &[Scaffold],
        full_path: bool,
    ) -> Result<Annotation, BridgeError>;
}

/// Query interval covered by all hits, and the covered subject interval
fn covered(hits: &[AlignmentRecord]) -> Option<((usize, usize), (usize, usize))> {
    let query_start = hits.iter().map(|h| h.query_span().0).min()?;
    let query_end = hits.iter().map(|h| h.query_span().1).max()?;
    let subject_start = hits.iter().map(|h| h.subject_span().0).min()?;
    let subject_end = hits.iter().map(|h| h.subject_span().1).max()?;
    Some(((query_start, query_end), (subject_start, subject_end)))
}

fn split_at_span(seq: &[u8], start: usize, end: usize) -> (&[u8], &[u8], &[u8]) {
    let start = start.saturating_sub(1).min(seq.len());
    let end = end.clamp(start, seq.len());
    (&seq[..start], &seq[start..end], &seq[end..])
}

/// Derive the annotation from consensus hits, one hit list per scaffold.
///
/// Full path: the covered stretch of the scaffold is the insertion; it is
/// fully characterized when flank sequence remains on both sides. Otherwise
/// the first scaffold contributes from its first covered base onward and the
/// last scaffold up to its last covered base, and the result is at best
/// partial.
pub fn annotate(scaffolds: &[Scaffold], hits: &[Vec<AlignmentRecord>], full_path: bool) -> Annotation {
    if scaffolds.is_empty() || hits.iter().all(|h| h.is_empty()) {
        return Annotation::failed();
    }
    let strand = hits.iter().flatten().next().map(|h| h.strand());

    if scaffolds.len() == 1 {
        let Some(((qs, qe), consensus_span)) = covered(&hits[0]) else {
            return Annotation::failed();
        };
        let (left, insertion, right) = split_at_span(&scaffolds[0].sequence, qs, qe);
        let characterization = if full_path && !left.is_empty() && !right.is_empty() {
            Characterization::Full
        } else {
            Characterization::Partial
        };
        return Annotation {
            characterization,
            insertion: insertion.to_vec(),
            left_flank: left.to_vec(),
            right_flank: right.to_vec(),
            strand,
            consensus_span: Some(consensus_span),
        };
    }

    let first = &scaffolds[0];
    let last = &scaffolds[scaffolds.len() - 1];
    let mut insertion = Vec::new();
    let mut spans = Vec::new();

    let left_flank = match covered(&hits[0]) {
        Some(((qs, _), span)) => {
            let (flank, inserted, _) = split_at_span(&first.sequence, qs, first.len());
            insertion.extend_from_slice(inserted);
            spans.push(span);
            flank.to_vec()
        }
        None => first.sequence.clone(),
    };
    let right_flank = match covered(&hits[hits.len() - 1]) {
        Some(((_, qe), span)) => {
            let (_, inserted, flank) = split_at_span(&last.sequence, 1, qe);
            insertion.extend_from_slice(inserted);
            spans.push(span);
            flank.to_vec()
        }
        None => last.sequence.clone(),
    };

    let consensus_span = spans
        .iter()
        .map(|s| s.0)
        .min()
        .zip(spans.iter().map(|s| s.1).max());
    Annotation {
        characterization: Characterization::Partial,
        insertion,
        left_flank,
        right_flank,
        strand,
        consensus_span,
    }
}

/// Consensus placement through blastn, scaffolds as query and the element
/// consensus as subject.
#[derive(Debug, Clone)]
pub struct BlastnConsensus {
    aligner: BlastnAligner,
    consensus_id: String,
    consensus: Vec<u8>,
}

impl BlastnConsensus {
    /// Uses the first record of the consensus FASTA
    pub fn new(aligner: BlastnAligner, consensus_fasta: &Path) -> Result<Self, BridgeError> {
        let (consensus_id, consensus) = read_fasta_records(consensus_fasta)?
            .into_iter()
            .next()
            .ok_or_else(|| {
                BridgeError::InvalidInput(format!(
                    "No consensus sequence in '{}'",
                    consensus_fasta.display()
                ))
            })?;
        info!(
            "Loaded consensus {} ({} bp)",
            consensus_id,
            consensus.len()
        );
        Ok(BlastnConsensus::from_sequence(aligner, &consensus_id, &consensus))
    }

    fn from_sequence(aligner: BlastnAligner, consensus_id: &str, consensus: &[u8]) -> Self {
        BlastnConsensus {
            aligner,
            consensus_id: consensus_id.to_string(),
            consensus: consensus.to_ascii_uppercase(),
        }
    }

    /// Same consensus, aligned through `aligner`
    pub fn with_aligner(self, aligner: BlastnAligner) -> Self {
        BlastnConsensus { aligner, ..self }
    }
}

impl ConsensusAligner for BlastnConsensus {
    fn align_to_consensus(
        &mut self,
        scaffolds: &[Scaffold],
        full_path: bool,
    ) -> Result<Annotation, BridgeError> {
        let consensus = SeqView {
            id: &self.consensus_id,
            sequence: &self.consensus,
        };
        let mut hits = Vec::with_capacity(scaffolds.len());
        for scaffold in scaffolds {
            hits.push(self.aligner.align(scaffold.view(), consensus)?);
        }
        let annotation = annotate(scaffolds, &hits, full_path);
        debug!(
            "Consensus placement: {} ({} bp insertion)",
            annotation.characterization,
            annotation.insertion_len()
        );
        Ok(annotation)
    }
}
