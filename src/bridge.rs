//! Bridge assembly for one insertion site.
//!
//! Fragments come ordered left flank first and right flank last. Contigs
//! explained by the flanks are dropped, every remaining pair is aligned and
//! validated into an overlap matrix, and each simple path between the flanks
//! is merged and placed on the consensus until one characterizes the
//! insertion. Without such a path the longest chains grown from either flank
//! are merged independently and placed together.

use crate::aligner::PairwiseAligner;
use crate::config::BridgeConfig;
use crate::consensus::{Annotation, ConsensusAligner};
use crate::error::BridgeError;
use crate::flank_filter::filter_fully_aligned;
use crate::fragment::{Fragment, FlankTags};
use crate::graph::{build_matrix, flank_indices, OverlapGraph};
use crate::matrix::AdjacencyMatrix;
use crate::merger::{merge_path, Scaffold};
use crate::tree::{longest_left_path, longest_right_path};
use crate::validator::{validate, ValidatedOverlap};
use log::{debug, info};
use rustc_hash::FxHashMap;

/// Description given to a scaffold rebuilt from the two fallback pieces
pub const FALLBACK_DESCRIPTION: &str = "left_right";

/// Result of bridging one site
#[derive(Debug, Clone)]
pub struct SiteOutcome {
    /// Sequences to report for the site; one unless the fallback pieces
    /// could not be joined.
    pub scaffolds: Vec<Scaffold>,
    pub annotation: Annotation,
    /// Whether a complete path between the flanks was used.
    pub bridged: bool,
}

impl SiteOutcome {
    pub fn is_characterized(&self) -> bool {
        self.annotation.is_fully_characterized() || self.annotation.is_partially_characterized()
    }

    pub fn description(&self) -> String {
        self.scaffolds
            .iter()
            .map(|s| s.description.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Per-site bridge assembly over pluggable aligners
pub struct BridgeAssembly<'a> {
    config: &'a BridgeConfig,
    aligner: &'a mut dyn PairwiseAligner,
    consensus: &'a mut dyn ConsensusAligner,
}

impl<'a> BridgeAssembly<'a> {
    pub fn new(
        config: &'a BridgeConfig,
        aligner: &'a mut dyn PairwiseAligner,
        consensus: &'a mut dyn ConsensusAligner,
    ) -> Self {
        BridgeAssembly {
            config,
            aligner,
            consensus,
        }
    }

    /// Run the whole site: filter, overlap graph, path merging, fallback
    pub fn assemble(&mut self, mut fragments: Vec<Fragment>) -> Result<SiteOutcome, BridgeError> {
        if flank_indices(&fragments).is_none() {
            return Err(BridgeError::InvalidInput(
                "Site fragments must start with the left flank and end with the right flank"
                    .to_string(),
            ));
        }

        self.remove_flank_contigs(&mut fragments)?;

        let overlaps = self.align_all_pairs(&fragments)?;
        let matrix = build_matrix(&fragments, &overlaps);
        info!(
            "Adjacency matrix for {} fragments ({} overlaps)",
            fragments.len(),
            matrix.edge_count()
        );
        debug!("\n{}", matrix);

        match self.bridge_paths(&fragments, &matrix) {
            Ok(outcome) => Ok(outcome),
            Err(BridgeError::NoBridgingPath) => {
                info!("NO CONTINUOUS path found");
                self.extend_from_flanks(&fragments, &matrix)
            }
            Err(e) => Err(e),
        }
    }

    /// Drop contigs that add nothing beyond the flanks; returns how many
    pub fn remove_flank_contigs(&mut self, fragments: &mut Vec<Fragment>) -> Result<usize, BridgeError> {
        let (left, right) = flank_indices(fragments)
            .ok_or_else(|| BridgeError::InvalidInput("Site has no flank pair".to_string()))?;
        let mut flank_hits = FxHashMap::default();
        for contig in &fragments[left + 1..right] {
            let mut hits = Vec::new();
            for flank in [&fragments[left], &fragments[right]] {
                hits.extend(self.aligner.align(flank.view(), contig.view())?);
            }
            if !hits.is_empty() {
                flank_hits.insert(contig.id.clone(), hits);
            }
        }
        Ok(filter_fully_aligned(
            fragments,
            &flank_hits,
            self.config.limits.flank_filter_leftover,
        ))
    }

    /// Validated overlap for every pair `i < j` except the two flanks
    pub fn align_all_pairs(&mut self, fragments: &[Fragment]) -> Result<Vec<ValidatedOverlap>, BridgeError> {
        let last = fragments.len().saturating_sub(1);
        let mut overlaps = Vec::new();
        for i in 0..fragments.len() {
            for j in (i + 1)..fragments.len() {
                if i == 0 && j == last {
                    continue;
                }
                let (query, subject) = (&fragments[i], &fragments[j]);
                let records = self.aligner.align(query.view(), subject.view())?;
                match validate(&records, query, subject, &self.config.limits) {
                    Some(overlap) => {
                        debug!(
                            "Overlap {} -> {} leftover {}",
                            overlap.fragment_a, overlap.fragment_b, overlap.leftover
                        );
                        overlaps.push(overlap);
                    }
                    None => debug!(
                        "{} for {} and {}",
                        BridgeError::NoAlignmentFound,
                        query.id,
                        subject.id
                    ),
                }
            }
        }
        Ok(overlaps)
    }

    /// Merge each flank-to-flank path until one characterizes the insertion
    pub fn bridge_paths(
        &mut self,
        fragments: &[Fragment],
        matrix: &AdjacencyMatrix,
    ) -> Result<SiteOutcome, BridgeError> {
        let last = fragments.len() - 1;
        let paths = OverlapGraph::from_matrix(matrix).all_simple_paths(0, last);
        if !paths.is_empty() {
            info!("{} path(s) found between the flanks", paths.len());
        }

        for (index, path) in paths.iter().enumerate() {
            let ids: Vec<&str> = path.iter().map(|&i| fragments[i].id.as_str()).collect();
            info!("PATH #{}: {}", index, ids.join(" -> "));

            let members: Vec<&Fragment> = path.iter().map(|&i| &fragments[i]).collect();
            let scaffold = merge_path(&members, &mut *self.aligner, self.config)?;
            if !scaffold.tags.both() {
                info!("PATH #{} NOT merged", index);
                continue;
            }

            let annotation = self
                .consensus
                .align_to_consensus(std::slice::from_ref(&scaffold), true)?;
            if annotation.is_fully_characterized()
                && annotation.insertion_len() >= self.config.min_insertion_length
            {
                info!("PATH #{} aligned SUCCESSFULLY", index);
                return Ok(SiteOutcome {
                    scaffolds: vec![scaffold],
                    annotation,
                    bridged: true,
                });
            }
            info!("PATH #{} NOT aligned", index);
        }
        Err(BridgeError::NoBridgingPath)
    }

    /// Grow the longest chain from each flank and place both pieces together
    pub fn extend_from_flanks(
        &mut self,
        fragments: &[Fragment],
        matrix: &AdjacencyMatrix,
    ) -> Result<SiteOutcome, BridgeError> {
        let last = fragments.len() - 1;
        let left = self.merge_chain(fragments, longest_left_path(matrix), 0, "LEFT")?;
        let right = self.merge_chain(fragments, longest_right_path(matrix), last, "RIGHT")?;
        let pieces = vec![left, right];

        let annotation = self.consensus.align_to_consensus(&pieces, false)?;
        if !(annotation.is_fully_characterized() || annotation.is_partially_characterized()) {
            return Ok(SiteOutcome {
                scaffolds: pieces,
                annotation,
                bridged: false,
            });
        }

        let mut sequence = Vec::with_capacity(
            annotation.left_flank.len() + annotation.insertion.len() + annotation.right_flank.len(),
        );
        sequence.extend_from_slice(&annotation.left_flank);
        sequence.extend_from_slice(&annotation.insertion);
        sequence.extend_from_slice(&annotation.right_flank);
        let joined = Scaffold {
            description: FALLBACK_DESCRIPTION.to_string(),
            sequence,
            tags: FlankTags {
                left: true,
                right: true,
            },
        };
        Ok(SiteOutcome {
            scaffolds: vec![joined],
            annotation,
            bridged: false,
        })
    }

    fn merge_chain(
        &mut self,
        fragments: &[Fragment],
        path: Option<Vec<usize>>,
        flank: usize,
        side: &str,
    ) -> Result<Scaffold, BridgeError> {
        match path {
            Some(path) => {
                let members: Vec<&Fragment> = path.iter().map(|&i| &fragments[i]).collect();
                let ids: Vec<&str> = members.iter().map(|f| f.id.as_str()).collect();
                info!("LONGEST {} path found: {}", side, ids.join(" -> "));
                merge_path(&members, &mut *self.aligner, self.config)
            }
            None => {
                info!("{} ({} side)", BridgeError::NoTreePath, side.to_lowercase());
                Ok(Scaffold::from_fragment(&fragments[flank]))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::AlignmentRecord;
    use crate::consensus::Characterization;
    use crate::fragment::{Role, SeqView};

    /// Returns records only for the pairs listed, in either id order
    struct PairAligner {
        pairs: FxHashMap<(String, String), Vec<AlignmentRecord>>,
    }

    impl PairwiseAligner for PairAligner {
        fn align(
            &mut self,
            query: SeqView<'_>,
            subject: SeqView<'_>,
        ) -> Result<Vec<AlignmentRecord>, BridgeError> {
            Ok(self
                .pairs
                .get(&(query.id.to_string(), subject.id.to_string()))
                .cloned()
                .unwrap_or_default())
        }
    }

    struct FailingAligner;

    impl PairwiseAligner for FailingAligner {
        fn align(&mut self, _: SeqView<'_>, _: SeqView<'_>) -> Result<Vec<AlignmentRecord>, BridgeError> {
            Err(BridgeError::ExternalToolFailure {
                tool: "blastn".to_string(),
                message: "BLAST Database error".to_string(),
            })
        }
    }

    struct FixedConsensus {
        characterization: Characterization,
        calls: Vec<(usize, bool)>,
    }

    impl ConsensusAligner for FixedConsensus {
        fn align_to_consensus(
            &mut self,
            scaffolds: &[Scaffold],
            full_path: bool,
        ) -> Result<Annotation, BridgeError> {
            self.calls.push((scaffolds.len(), full_path));
            Ok(Annotation {
                characterization: self.characterization,
                insertion: vec![b'T'; 250],
                left_flank: b"AAAA".to_vec(),
                right_flank: b"CCCC".to_vec(),
                ..Annotation::failed()
            })
        }
    }

    fn pairs(entries: Vec<(&str, &str, (usize, usize), (usize, usize))>) -> PairAligner {
        let mut map: FxHashMap<(String, String), Vec<AlignmentRecord>> = FxHashMap::default();
        for (q, s, qc, sc) in entries {
            map.entry((q.to_string(), s.to_string()))
                .or_default()
                .push(AlignmentRecord::from_coords(q, s, qc, sc));
        }
        PairAligner { pairs: map }
    }

    fn site() -> Vec<Fragment> {
        vec![
            Fragment::new("left_flank", &[b'A'; 400], Role::LeftFlank),
            Fragment::new("c1", &[b'G'; 300], Role::Contig),
            Fragment::new("c2", &[b'T'; 300], Role::Contig),
            Fragment::new("right_flank", &[b'C'; 400], Role::RightFlank),
        ]
    }

    #[test]
    fn test_all_pairs_skip_flank_pair() {
        let config = BridgeConfig::default();
        let mut aligner = pairs(vec![
            ("left_flank", "right_flank", (301, 400), (1, 100)),
            ("left_flank", "c1", (301, 400), (1, 100)),
            ("c1", "c2", (201, 300), (1, 100)),
        ]);
        let mut consensus = FixedConsensus {
            characterization: Characterization::Failed,
            calls: vec![],
        };
        let mut bridge = BridgeAssembly::new(&config, &mut aligner, &mut consensus);
        let overlaps = bridge.align_all_pairs(&site()).unwrap();
        let named: Vec<(&str, &str, usize)> = overlaps
            .iter()
            .map(|o| (o.fragment_a.as_str(), o.fragment_b.as_str(), o.leftover))
            .collect();
        assert_eq!(named, vec![("left_flank", "c1", 200), ("c1", "c2", 200)]);
    }

    #[test]
    fn test_flank_contig_removed() {
        let config = BridgeConfig::default();
        let mut aligner = pairs(vec![("left_flank", "c2", (1, 300), (1, 295))]);
        let mut consensus = FixedConsensus {
            characterization: Characterization::Failed,
            calls: vec![],
        };
        let mut fragments = site();
        let mut bridge = BridgeAssembly::new(&config, &mut aligner, &mut consensus);
        assert_eq!(bridge.remove_flank_contigs(&mut fragments).unwrap(), 1);
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[1].id, "c1");
    }

    #[test]
    fn test_fallback_rewrites_left_right() {
        let config = BridgeConfig::default();
        // left flank reaches c1 only; nothing reaches the right flank
        let mut aligner = pairs(vec![("left_flank", "c1", (301, 400), (1, 100))]);
        let mut consensus = FixedConsensus {
            characterization: Characterization::Partial,
            calls: vec![],
        };
        let outcome = BridgeAssembly::new(&config, &mut aligner, &mut consensus)
            .assemble(site())
            .unwrap();
        assert!(!outcome.bridged);
        assert!(outcome.is_characterized());
        assert_eq!(outcome.scaffolds.len(), 1);
        assert_eq!(outcome.scaffolds[0].description, FALLBACK_DESCRIPTION);
        assert_eq!(outcome.scaffolds[0].len(), 258);
        assert_eq!(consensus.calls, vec![(2, false)]);
    }

    #[test]
    fn test_failed_fallback_keeps_pieces() {
        let config = BridgeConfig::default();
        let mut aligner = pairs(vec![]);
        let mut consensus = FixedConsensus {
            characterization: Characterization::Failed,
            calls: vec![],
        };
        let outcome = BridgeAssembly::new(&config, &mut aligner, &mut consensus)
            .assemble(site())
            .unwrap();
        assert!(!outcome.is_characterized());
        assert_eq!(outcome.description(), "left_flank,right_flank");
    }

    #[test]
    fn test_tool_failure_propagates() {
        let config = BridgeConfig::default();
        let mut consensus = FixedConsensus {
            characterization: Characterization::Full,
            calls: vec![],
        };
        let mut aligner = FailingAligner;
        let result = BridgeAssembly::new(&config, &mut aligner, &mut consensus).assemble(site());
        assert!(matches!(result, Err(BridgeError::ExternalToolFailure { .. })));
    }

    #[test]
    fn test_unordered_site_is_rejected() {
        let config = BridgeConfig::default();
        let mut aligner = pairs(vec![]);
        let mut consensus = FixedConsensus {
            characterization: Characterization::Full,
            calls: vec![],
        };
        let mut fragments = site();
        fragments.swap(0, 3);
        let result = BridgeAssembly::new(&config, &mut aligner, &mut consensus).assemble(fragments);
        assert!(matches!(result, Err(BridgeError::InvalidInput(_))));
    }
}
