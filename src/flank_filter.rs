use crate::alignment_record::AlignmentRecord;
use crate::fragment::{Fragment, Role};
use log::info;
use rustc_hash::FxHashMap;

/// Largest unaligned end of the subject left by an alignment against a flank
pub fn flank_leftover(record: &AlignmentRecord, subject_len: usize) -> usize {
    let (start, end) = record.subject_span();
    (start - 1).max(subject_len.saturating_sub(end))
}

/// Drop contigs already explained by the reference flanks.
///
/// `flank_hits` maps a contig id to its alignments against the flank sequence(s)
/// (flank as query, contig as subject). A contig is removed as soon as one of
/// its alignments leaves fewer than `min_leftover` bases on both of its ends.
/// Flanks are always kept and the order of the survivors is unchanged.
pub fn filter_fully_aligned(
    fragments: &mut Vec<Fragment>,
    flank_hits: &FxHashMap<String, Vec<AlignmentRecord>>,
    min_leftover: usize,
) -> usize {
    let before = fragments.len();
    fragments.retain(|fragment| {
        if fragment.role != Role::Contig {
            return true;
        }
        let Some(hits) = flank_hits.get(&fragment.id) else {
            return true;
        };
        let explained = hits
            .iter()
            .any(|hit| flank_leftover(hit, fragment.len()) < min_leftover);
        if explained {
            info!("{} fully aligned to the flanking sequence - REMOVED", fragment.id);
        }
        !explained
    });
    before - fragments.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contig(id: &str, len: usize) -> Fragment {
        Fragment::new(id, &vec![b'C'; len], Role::Contig)
    }

    #[test]
    fn test_flank_leftover_takes_larger_end() {
        let forward = AlignmentRecord::from_coords("flank", "c", (1, 100), (11, 180));
        assert_eq!(flank_leftover(&forward, 200), 20);
        let reverse = AlignmentRecord::from_coords("flank", "c", (1, 100), (195, 3));
        assert_eq!(flank_leftover(&reverse, 200), 5);
    }

    #[test]
    fn test_filter_threshold_is_strict() {
        let mut fragments = vec![
            Fragment::new("left_flank", b"ACGT", Role::LeftFlank),
            contig("removed", 200),
            contig("kept", 200),
            contig("unaligned", 200),
            Fragment::new("right_flank", b"ACGT", Role::RightFlank),
        ];
        let mut hits = FxHashMap::default();
        // leftover 9 on the larger end
        hits.insert(
            "removed".to_string(),
            vec![AlignmentRecord::from_coords("flank", "removed", (1, 191), (10, 200))],
        );
        // leftover exactly 10
        hits.insert(
            "kept".to_string(),
            vec![AlignmentRecord::from_coords("flank", "kept", (1, 190), (11, 200))],
        );

        let removed = filter_fully_aligned(&mut fragments, &hits, 10);
        assert_eq!(removed, 1);
        let ids: Vec<&str> = fragments.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["left_flank", "kept", "unaligned", "right_flank"]);
    }
}
