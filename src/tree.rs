//! Fallback search used when no bridging path joins the two flanks.
//!
//! From one flank, every chain of overlapping fragments is unrolled into a
//! tree stored as an index arena, and the longest root-to-leaf chain is kept.
//! The search runs once from the left flank and once from the right flank,
//! each on its own transformed copy of the overlap matrix.

use crate::matrix::AdjacencyMatrix;
use log::debug;

#[derive(Debug, Clone)]
struct TreeNode {
    fragment: usize,
    weight: usize,
    parent: Option<usize>,
    children: Vec<usize>,
}

/// Tree of overlap chains rooted at one fragment
#[derive(Debug, Clone)]
pub struct OverlapTree {
    nodes: Vec<TreeNode>,
}

impl OverlapTree {
    /// Unroll the chains reachable from `root` through positive entries of `matrix`.
    ///
    /// A node is expanded through its fragment's row. Expansion stops at the
    /// last row, at a depth equal to the matrix dimension, and never revisits a
    /// fragment already on the chain from the root.
    pub fn build(matrix: &AdjacencyMatrix, root: usize) -> Self {
        let mut tree = OverlapTree {
            nodes: vec![TreeNode {
                fragment: root,
                weight: 0,
                parent: None,
                children: Vec::new(),
            }],
        };
        if root < matrix.size() {
            tree.expand(matrix, 0, 1);
        }
        tree
    }

    fn expand(&mut self, matrix: &AdjacencyMatrix, node: usize, depth: usize) {
        let row = self.nodes[node].fragment;
        if row + 1 >= matrix.size() || depth >= matrix.size() {
            return;
        }

        let candidates: Vec<usize> = matrix
            .successors(row)
            .filter(|&j| !self.on_chain(node, j))
            .collect();
        for j in candidates {
            let child = self.nodes.len();
            self.nodes.push(TreeNode {
                fragment: j,
                weight: matrix.get(row, j),
                parent: Some(node),
                children: Vec::new(),
            });
            self.nodes[node].children.push(child);
            self.expand(matrix, child, depth + 1);
        }
    }

    fn on_chain(&self, mut node: usize, fragment: usize) -> bool {
        loop {
            if self.nodes[node].fragment == fragment {
                return true;
            }
            match self.nodes[node].parent {
                Some(parent) => node = parent,
                None => return false,
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Fragment indices of the longest root-to-leaf chain.
    ///
    /// Longest means most nodes; ties go to the larger summed overlap weight,
    /// then to the chain found first. `None` when the root has no children.
    pub fn longest_path(&self) -> Option<Vec<usize>> {
        if self.nodes[0].children.is_empty() {
            return None;
        }

        // (leaf, node count, summed weight)
        let mut best: Option<(usize, usize, usize)> = None;
        let mut stack = vec![(0usize, 1usize, 0usize)];
        while let Some((node, count, weight)) = stack.pop() {
            let current = &self.nodes[node];
            if current.children.is_empty() {
                let better = match best {
                    None => true,
                    Some((_, best_count, best_weight)) => {
                        count > best_count || (count == best_count && weight > best_weight)
                    }
                };
                if better {
                    best = Some((node, count, weight));
                }
                continue;
            }
            // reversed so children pop in matrix order
            for &child in current.children.iter().rev() {
                stack.push((child, count + 1, weight + self.nodes[child].weight));
            }
        }

        let (mut node, _, _) = best?;
        let mut path = vec![self.nodes[node].fragment];
        while let Some(parent) = self.nodes[node].parent {
            path.push(self.nodes[parent].fragment);
            node = parent;
        }
        path.reverse();
        Some(path)
    }
}

/// Longest chain grown from the left flank (index 0).
///
/// The right-flank column is cleared on a copy so the chain cannot jump to
/// the far end.
pub fn longest_left_path(matrix: &AdjacencyMatrix) -> Option<Vec<usize>> {
    let size = matrix.size();
    if size < 2 {
        return None;
    }
    let mut left = matrix.clone();
    left.clear_col(size - 1);
    debug!("Adjacency matrix for left extension:\n{}", left);

    let tree = OverlapTree::build(&left, 0);
    debug!("Left overlap tree has {} nodes", tree.node_count());
    tree.longest_path()
}

/// Longest chain grown from the right flank (last index), in original indices.
///
/// Works on a symmetrized copy with the two flanks swapped, so the right
/// flank becomes the root row and the left-flank column is cleared.
pub fn longest_right_path(matrix: &AdjacencyMatrix) -> Option<Vec<usize>> {
    let size = matrix.size();
    if size < 2 {
        return None;
    }
    let last = size - 1;
    let mut right = matrix.clone();
    right.make_symmetric();
    right.swap_rows(0, last);
    right.swap_cols(0, last);
    right.clear_col(last);
    debug!("Reversed adjacency matrix for right extension:\n{}", right);

    let tree = OverlapTree::build(&right, 0);
    debug!("Right overlap tree has {} nodes", tree.node_count());
    let swap_back = |index: usize| match index {
        0 => last,
        i if i == last => 0,
        i => i,
    };
    tree.longest_path()
        .map(|path| path.into_iter().map(swap_back).collect())
}
