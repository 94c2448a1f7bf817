use std::fmt;

/// Square overlap matrix over the fragments of one site.
///
/// Index 0 is the left flank, the last index the right flank. An entry
/// `(i, j) > 0` holds the leftover of the validated overlap from fragment `i`
/// to fragment `j`; zero means no overlap. All transforms work in place, so
/// callers clone the matrix before a transform they need to undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyMatrix {
    size: usize,
    items: Vec<usize>,
}

impl AdjacencyMatrix {
    pub fn new(size: usize) -> Self {
        AdjacencyMatrix {
            size,
            items: vec![0; size * size],
        }
    }

    #[cfg(test)]
    pub fn from_rows(rows: &[Vec<usize>]) -> Self {
        let size = rows.len();
        let mut matrix = AdjacencyMatrix::new(size);
        for (i, row) in rows.iter().enumerate() {
            assert_eq!(row.len(), size, "adjacency matrix rows must be square");
            matrix.items[i * size..(i + 1) * size].copy_from_slice(row);
        }
        matrix
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, row: usize, col: usize) -> usize {
        self.items[row * self.size + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: usize) {
        self.items[row * self.size + col] = value;
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.items[row * self.size..(row + 1) * self.size]
    }

    /// Overwrite this matrix with another of the same size
    pub fn copy_from(&mut self, other: &AdjacencyMatrix) {
        if self.size == other.size {
            self.items.copy_from_slice(&other.items);
        }
    }

    /// Move every upper-triangle overlap to its transpose and zero the diagonal.
    ///
    /// Afterwards no pair `(i, j)`, `(j, i)` is nonzero on both sides; a
    /// lower-triangle entry hit by a mirrored one takes the mirrored value.
    pub fn make_symmetric(&mut self) {
        for i in 0..self.size {
            self.set(i, i, 0);
            for j in (i + 1)..self.size {
                let value = self.get(i, j);
                if value > 0 {
                    self.set(j, i, value);
                    self.set(i, j, 0);
                }
            }
        }
    }

    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for col in 0..self.size {
            self.items.swap(a * self.size + col, b * self.size + col);
        }
    }

    pub fn swap_cols(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for row in 0..self.size {
            self.items.swap(row * self.size + a, row * self.size + b);
        }
    }

    pub fn clear_row(&mut self, row: usize) {
        if row >= self.size {
            return;
        }
        self.items[row * self.size..(row + 1) * self.size].fill(0);
    }

    pub fn clear_col(&mut self, col: usize) {
        if col >= self.size {
            return;
        }
        for row in 0..self.size {
            self.set(row, col, 0);
        }
    }

    /// Indices `j` with a positive entry in `row`
    pub fn successors(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.row(row)
            .iter()
            .enumerate()
            .filter(|(_, &value)| value > 0)
            .map(|(col, _)| col)
    }

    pub fn edge_count(&self) -> usize {
        self.items.iter().filter(|&&value| value > 0).count()
    }
}

impl fmt::Display for AdjacencyMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.size {
            let row: Vec<String> = self.row(i).iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AdjacencyMatrix {
        AdjacencyMatrix::from_rows(&[
            vec![0, 120, 0, 0],
            vec![0, 0, 80, 0],
            vec![0, 0, 0, 45],
            vec![0, 0, 0, 0],
        ])
    }

    #[test]
    fn test_make_symmetric_has_no_two_way_entries() {
        let mut matrix = AdjacencyMatrix::from_rows(&[
            vec![7, 120, 0, 5],
            vec![0, 3, 80, 0],
            vec![9, 0, 0, 45],
            vec![0, 0, 0, 1],
        ]);
        matrix.make_symmetric();
        for i in 0..matrix.size() {
            assert_eq!(matrix.get(i, i), 0);
            for j in 0..matrix.size() {
                assert!(!(matrix.get(i, j) > 0 && matrix.get(j, i) > 0));
            }
        }
        assert_eq!(matrix.get(1, 0), 120);
        assert_eq!(matrix.get(3, 2), 45);
        assert_eq!(matrix.get(0, 1), 0);
    }

    #[test]
    fn test_swap_and_clear() {
        let mut matrix = sample();
        matrix.swap_rows(0, 3);
        matrix.swap_cols(0, 3);
        assert_eq!(matrix.get(3, 1), 120);
        assert_eq!(matrix.get(2, 0), 45);

        matrix.clear_col(0);
        assert_eq!(matrix.get(2, 0), 0);
        matrix.clear_row(3);
        assert_eq!(matrix.successors(3).count(), 0);
        matrix.clear_col(99);
    }

    #[test]
    fn test_clone_is_independent() {
        let original = sample();
        let mut copy = original.clone();
        copy.clear_row(0);
        assert_eq!(original.get(0, 1), 120);
        assert_eq!(copy.get(0, 1), 0);

        copy.copy_from(&original);
        assert_eq!(copy, original);
        assert_eq!(original.edge_count(), 3);
    }

    #[test]
    fn test_display() {
        let matrix = AdjacencyMatrix::from_rows(&[vec![0, 3], vec![0, 0]]);
        assert_eq!(matrix.to_string(), "0 3\n0 0\n");
    }
}
