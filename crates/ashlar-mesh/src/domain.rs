//! Index-space bounds queries for a block's cell grid.

/// Which part of a block's index space a query refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexDomain {
    /// The physical cells owned by the block.
    Interior,
    /// Interior plus ghost zones.
    Entire,
}

/// An inclusive index range along one dimension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct IndexRange {
    /// First index.
    pub s: usize,
    /// Last index (inclusive).
    pub e: usize,
}

impl IndexRange {
    /// Number of indices in the range.
    pub fn len(&self) -> usize {
        self.e - self.s + 1
    }

    /// Inclusive ranges always hold at least one index.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over the indices in the range.
    pub fn iter(&self) -> impl Iterator<Item = usize> {
        self.s..=self.e
    }
}

/// Per-dimension cell counts and ghost width for one block.
///
/// Dimensions with a single interior cell are inactive: they carry no
/// ghost zones and their bounds collapse to `[0, 0]`. Storage is always
/// sized from the [`IndexDomain::Entire`] counts so ghost data lives in
/// the same buffer as interior data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexShape {
    nx: [usize; 3],
    nghost: usize,
}

impl IndexShape {
    /// Build a shape from interior cell counts and ghost width.
    pub fn new(nx1: usize, nx2: usize, nx3: usize, nghost: usize) -> Self {
        Self {
            nx: [nx1.max(1), nx2.max(1), nx3.max(1)],
            nghost,
        }
    }

    /// Ghost width in active dimensions.
    pub fn nghost(&self) -> usize {
        self.nghost
    }

    /// Whether dimension `dim` (0-based) has more than one cell.
    pub fn is_active(&self, dim: usize) -> bool {
        self.nx[dim] > 1
    }

    /// Interior cell count along `dim`.
    pub fn interior_len(&self, dim: usize) -> usize {
        self.nx[dim]
    }

    /// Total cell count along `dim`, including ghosts.
    pub fn entire_len(&self, dim: usize) -> usize {
        if self.is_active(dim) {
            self.nx[dim] + 2 * self.nghost
        } else {
            1
        }
    }

    /// Index bounds along `dim` for the given domain.
    pub fn bounds(&self, dim: usize, domain: IndexDomain) -> IndexRange {
        match domain {
            IndexDomain::Entire => IndexRange {
                s: 0,
                e: self.entire_len(dim) - 1,
            },
            IndexDomain::Interior => {
                if self.is_active(dim) {
                    IndexRange {
                        s: self.nghost,
                        e: self.nghost + self.nx[dim] - 1,
                    }
                } else {
                    IndexRange { s: 0, e: 0 }
                }
            }
        }
    }

    /// Bounds along the first dimension.
    pub fn bounds_i(&self, domain: IndexDomain) -> IndexRange {
        self.bounds(0, domain)
    }

    /// Bounds along the second dimension.
    pub fn bounds_j(&self, domain: IndexDomain) -> IndexRange {
        self.bounds(1, domain)
    }

    /// Bounds along the third dimension.
    pub fn bounds_k(&self, domain: IndexDomain) -> IndexRange {
        self.bounds(2, domain)
    }

    /// Total cell count over the given domain.
    pub fn ncells(&self, domain: IndexDomain) -> usize {
        (0..3).map(|d| self.bounds(d, domain).len()).product()
    }

    /// Flat storage index of cell `(i, j, k)` in an entire-domain buffer.
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        let d1 = self.entire_len(0);
        let d2 = self.entire_len(1);
        (k * d2 + j) * d1 + i
    }

    /// Cell count of a face-centered buffer normal to `dir`: one extra
    /// layer in the normal direction, entire extent elsewhere.
    pub fn face_ncells(&self, dir: usize) -> usize {
        (0..3)
            .map(|d| {
                let n = self.entire_len(d);
                if d == dir {
                    n + 1
                } else {
                    n
                }
            })
            .product()
    }

    /// Flat storage index of face `(i, j, k)` in a face-centered buffer
    /// normal to `dir`.
    pub fn face_index(&self, dir: usize, i: usize, j: usize, k: usize) -> usize {
        let d1 = self.entire_len(0) + usize::from(dir == 0);
        let d2 = self.entire_len(1) + usize::from(dir == 1);
        (k * d2 + j) * d1 + i
    }

    /// The shape at half resolution (refinement ratio 2), used to size
    /// coarse buffers for restriction and prolongation.
    pub fn coarse(&self) -> IndexShape {
        let half = |n: usize| if n > 1 { (n / 2).max(1) } else { 1 };
        Self {
            nx: [half(self.nx[0]), half(self.nx[1]), half(self.nx[2])],
            nghost: self.nghost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interior_bounds_offset_by_ghosts() {
        let shape = IndexShape::new(8, 8, 1, 2);
        assert_eq!(shape.bounds_i(IndexDomain::Interior), IndexRange { s: 2, e: 9 });
        assert_eq!(shape.bounds_i(IndexDomain::Entire), IndexRange { s: 0, e: 11 });
    }

    #[test]
    fn inactive_dims_carry_no_ghosts() {
        let shape = IndexShape::new(8, 1, 1, 2);
        assert_eq!(shape.bounds_j(IndexDomain::Interior), IndexRange { s: 0, e: 0 });
        assert_eq!(shape.bounds_j(IndexDomain::Entire), IndexRange { s: 0, e: 0 });
        assert_eq!(shape.entire_len(1), 1);
    }

    #[test]
    fn ncells_multiplies_active_dims() {
        let shape = IndexShape::new(4, 4, 1, 1);
        assert_eq!(shape.ncells(IndexDomain::Interior), 16);
        assert_eq!(shape.ncells(IndexDomain::Entire), 36);
    }

    #[test]
    fn cell_index_is_row_major() {
        let shape = IndexShape::new(4, 4, 1, 1);
        assert_eq!(shape.cell_index(0, 0, 0), 0);
        assert_eq!(shape.cell_index(1, 0, 0), 1);
        assert_eq!(shape.cell_index(0, 1, 0), 6);
    }

    #[test]
    fn face_buffer_has_one_extra_layer() {
        let shape = IndexShape::new(4, 4, 1, 1);
        // Entire extent 6x6x1; x1-face adds a layer in dim 0.
        assert_eq!(shape.face_ncells(0), 7 * 6);
        assert_eq!(shape.face_ncells(1), 6 * 7);
    }

    #[test]
    fn coarse_halves_active_dims() {
        let shape = IndexShape::new(8, 4, 1, 2);
        let coarse = shape.coarse();
        assert_eq!(coarse.interior_len(0), 4);
        assert_eq!(coarse.interior_len(1), 2);
        assert_eq!(coarse.interior_len(2), 1);
        assert_eq!(coarse.nghost(), 2);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn entire_contains_interior(
                nx1 in 1usize..32, nx2 in 1usize..32, g in 1usize..4,
            ) {
                let shape = IndexShape::new(nx1, nx2, 1, g);
                for d in 0..3 {
                    let int = shape.bounds(d, IndexDomain::Interior);
                    let ent = shape.bounds(d, IndexDomain::Entire);
                    prop_assert!(ent.s <= int.s);
                    prop_assert!(int.e <= ent.e);
                }
            }

            #[test]
            fn cell_index_bijective_over_entire(
                nx1 in 1usize..8, nx2 in 1usize..8, g in 1usize..3,
            ) {
                let shape = IndexShape::new(nx1, nx2, 1, g);
                let mut seen = std::collections::HashSet::new();
                for k in shape.bounds_k(IndexDomain::Entire).iter() {
                    for j in shape.bounds_j(IndexDomain::Entire).iter() {
                        for i in shape.bounds_i(IndexDomain::Entire).iter() {
                            let idx = shape.cell_index(i, j, k);
                            prop_assert!(idx < shape.ncells(IndexDomain::Entire));
                            prop_assert!(seen.insert(idx));
                        }
                    }
                }
            }
        }
    }
}
