//! Overlap graph over the fragments of one site and enumeration of every
//! simple path between the two flanks.

use crate::fragment::{Fragment, Role};
use crate::matrix::AdjacencyMatrix;
use crate::validator::ValidatedOverlap;
use log::debug;
use rustc_hash::FxHashMap;

/// Fill an adjacency matrix from validated overlaps.
///
/// `fragments` must be ordered left flank first, right flank last. Overlaps
/// with a zero leftover, unknown ids, self-pairs or a direct left-to-right
/// flank connection are not recorded.
pub fn build_matrix(fragments: &[Fragment], overlaps: &[ValidatedOverlap]) -> AdjacencyMatrix {
    let index: FxHashMap<&str, usize> = fragments
        .iter()
        .enumerate()
        .map(|(i, fragment)| (fragment.id.as_str(), i))
        .collect();

    let mut matrix = AdjacencyMatrix::new(fragments.len());
    for overlap in overlaps {
        let (Some(&i), Some(&j)) = (
            index.get(overlap.fragment_a.as_str()),
            index.get(overlap.fragment_b.as_str()),
        ) else {
            debug!(
                "Skipping overlap {} - {}: fragment not in site",
                overlap.fragment_a, overlap.fragment_b
            );
            continue;
        };
        let flank_pair = fragments[i].role.is_flank()
            && fragments[j].role.is_flank()
            && fragments[i].role != fragments[j].role;
        if i == j || flank_pair || overlap.leftover == 0 {
            continue;
        }
        matrix.set(i, j, overlap.leftover);
    }
    matrix
}

/// Undirected overlap graph stored as integer adjacency lists
#[derive(Debug, Clone)]
pub struct OverlapGraph {
    adj: Vec<Vec<usize>>,
}

impl OverlapGraph {
    /// Every positive entry `(i, j)` becomes the undirected edge `i - j`
    pub fn from_matrix(matrix: &AdjacencyMatrix) -> Self {
        let mut adj = vec![Vec::new(); matrix.size()];
        for i in 0..matrix.size() {
            for j in matrix.successors(i) {
                adj[i].push(j);
                adj[j].push(i);
            }
        }
        OverlapGraph { adj }
    }

    /// All simple paths from `from` to `to`, in depth-first discovery order
    pub fn all_simple_paths(&self, from: usize, to: usize) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        if from >= self.adj.len() || to >= self.adj.len() {
            return paths;
        }
        let mut visited = vec![false; self.adj.len()];
        let mut path = Vec::with_capacity(self.adj.len());
        self.collect_paths(from, to, &mut visited, &mut path, &mut paths);
        paths
    }

    fn collect_paths(
        &self,
        current: usize,
        target: usize,
        visited: &mut [bool],
        path: &mut Vec<usize>,
        paths: &mut Vec<Vec<usize>>,
    ) {
        visited[current] = true;
        path.push(current);

        if current == target {
            paths.push(path.clone());
        } else {
            for &next in &self.adj[current] {
                if !visited[next] {
                    self.collect_paths(next, target, visited, path, paths);
                }
            }
        }

        path.pop();
        visited[current] = false;
    }
}

/// Index of the left flank (0) and right flank (last) of an ordered site
pub fn flank_indices(fragments: &[Fragment]) -> Option<(usize, usize)> {
    let last = fragments.len().checked_sub(1)?;
    (fragments[0].role == Role::LeftFlank && fragments[last].role == Role::RightFlank)
        .then_some((0, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment_record::AlignmentRecord;

    fn overlap(a: &str, b: &str, leftover: usize) -> ValidatedOverlap {
        ValidatedOverlap {
            fragment_a: a.to_string(),
            fragment_b: b.to_string(),
            leftover,
            record: AlignmentRecord::from_coords(a, b, (1, 10), (1, 10)),
        }
    }

    fn site(contigs: &[&str]) -> Vec<Fragment> {
        let mut fragments = vec![Fragment::new("L", b"A", Role::LeftFlank)];
        fragments.extend(contigs.iter().map(|id| Fragment::new(id, b"A", Role::Contig)));
        fragments.push(Fragment::new("R", b"A", Role::RightFlank));
        fragments
    }

    fn assert_simple(path: &[usize], from: usize, to: usize) {
        assert_eq!(path.first(), Some(&from));
        assert_eq!(path.last(), Some(&to));
        let mut seen = path.to_vec();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), path.len(), "repeated vertex in {:?}", path);
    }

    #[test]
    fn test_linear_chain_has_single_path() {
        let fragments = site(&["A", "B"]);
        let overlaps = vec![overlap("L", "A", 50), overlap("A", "B", 40), overlap("B", "R", 30)];
        let matrix = build_matrix(&fragments, &overlaps);
        let graph = OverlapGraph::from_matrix(&matrix);
        assert_eq!(graph.all_simple_paths(0, 3), vec![vec![0, 1, 2, 3]]);
    }

    #[test]
    fn test_diamond_enumerates_all_paths() {
        let fragments = site(&["A", "B", "C"]);
        let overlaps = vec![
            overlap("L", "A", 10),
            overlap("L", "B", 10),
            overlap("A", "C", 10),
            overlap("B", "C", 10),
            overlap("A", "B", 10),
            overlap("C", "R", 10),
        ];
        let graph = OverlapGraph::from_matrix(&build_matrix(&fragments, &overlaps));
        let paths = graph.all_simple_paths(0, 4);
        assert_eq!(paths.len(), 4);
        for path in &paths {
            assert_simple(path, 0, 4);
        }
        assert_eq!(paths[0], vec![0, 1, 3, 4]);
    }

    #[test]
    fn test_flank_pair_and_zero_leftover_are_not_edges() {
        let fragments = site(&["A"]);
        let overlaps = vec![overlap("L", "R", 100), overlap("L", "A", 0), overlap("A", "R", 20)];
        let matrix = build_matrix(&fragments, &overlaps);
        assert_eq!(matrix.get(0, 2), 0);
        assert_eq!(matrix.get(0, 1), 0);
        assert_eq!(matrix.get(1, 2), 20);
        let graph = OverlapGraph::from_matrix(&matrix);
        assert!(graph.all_simple_paths(0, 2).is_empty());
    }

    #[test]
    fn test_flank_indices() {
        assert_eq!(flank_indices(&site(&["A", "B"])), Some((0, 3)));
        assert_eq!(flank_indices(&[]), None);
    }
}
