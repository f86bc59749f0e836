//! Register store which starts sparse and promotes itself to dense.
//!
//! Promotion is one-directional: it happens as soon as the number of touched
//! registers exceeds `Precision::sparse_max_elements()`, or at construction
//! when that limit is zero (`b <= 7`).

use crate::dense::Dense;
use crate::formula::RegisterSum;
use crate::precision::Precision;
use crate::representation::{Representation, RepresentationTrait};
use crate::sparse::Sparse;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RegisterStore {
    repr: Representation,
}

impl RegisterStore {
    /// Create empty store, sparse unless `precision` is too small for it
    pub(crate) fn new(precision: Precision) -> Self {
        let repr = if precision.sparse_max_elements() == 0 {
            Dense::new(precision).into()
        } else {
            Sparse::new(precision).into()
        };
        Self { repr }
    }

    /// Create store holding `dense` registers
    pub(crate) fn from_dense(dense: Dense) -> Self {
        Self { repr: dense.into() }
    }

    #[inline]
    pub(crate) fn representation(&self) -> &Representation {
        &self.repr
    }

    #[inline]
    pub(crate) fn precision(&self) -> Precision {
        self.repr.precision()
    }

    #[inline]
    pub(crate) fn is_sparse(&self) -> bool {
        matches!(self.repr, Representation::Sparse(_))
    }

    /// Raise register `index` to `rank`, promoting to dense when sparse grows too large
    #[inline]
    pub(crate) fn update(&mut self, index: u16, rank: u8) {
        self.repr.update(index, rank);
        if let Representation::Sparse(sparse) = &self.repr {
            if sparse.len() > self.precision().sparse_max_elements() {
                self.promote();
            }
        }
    }

    /// Convert to dense representation, no-op if already dense
    pub(crate) fn promote(&mut self) {
        if let Representation::Sparse(sparse) = &self.repr {
            let mut dense = Dense::new(sparse.precision());
            for (&index, &rank) in sparse.entries() {
                dense.update(index, rank);
            }
            self.repr = dense.into();
        }
    }

    /// Register-wise maximum with `rhs`, which must have the same precision
    pub(crate) fn merge(&mut self, rhs: &RegisterStore) {
        debug_assert_eq!(self.precision(), rhs.precision());
        match &rhs.repr {
            Representation::Sparse(rhs) => {
                for (&index, &rank) in rhs.entries() {
                    self.update(index, rank);
                }
            }
            Representation::Dense(rhs) => {
                self.promote();
                if let Representation::Dense(lhs) = &mut self.repr {
                    lhs.merge(rhs);
                }
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, index: u16) -> u8 {
        self.repr.get(index)
    }

    /// Snapshot of all `2^b` registers
    pub(crate) fn registers(&self) -> Vec<u8> {
        match &self.repr {
            Representation::Sparse(sparse) => {
                let mut registers = vec![0; self.precision().registers()];
                for (&index, &rank) in sparse.entries() {
                    registers[usize::from(index)] = rank;
                }
                registers
            }
            Representation::Dense(dense) => dense.registers().to_vec(),
        }
    }

    #[inline]
    pub(crate) fn sum(&self) -> RegisterSum {
        self.repr.sum()
    }

    #[inline]
    pub(crate) fn size_of(&self) -> usize {
        self.repr.size_of()
    }
}
