//! ## Sparse representation
//! Holds only the registers which were touched, as an ordered map from
//! register index to rank. Used while the number of touched registers is at
//! most `Precision::sparse_max_elements()`, after which the dense byte array
//! is smaller.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::mem::size_of;

use crate::formula::RegisterSum;
use crate::precision::Precision;
use crate::representation::RepresentationTrait;

/// Approximate heap bytes per map entry, including B-tree node overhead
const ENTRY_SIZE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sparse {
    precision: Precision,
    entries: BTreeMap<u16, u8>,
}

impl Sparse {
    /// Create empty sparse representation
    #[inline]
    pub(crate) fn new(precision: Precision) -> Self {
        Self {
            precision,
            entries: BTreeMap::new(),
        }
    }

    /// Touched registers in ascending index order
    #[inline]
    pub(crate) fn entries(&self) -> &BTreeMap<u16, u8> {
        &self.entries
    }

    /// Number of touched registers
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

impl RepresentationTrait for Sparse {
    #[inline]
    fn update(&mut self, index: u16, rank: u8) {
        // zero rank is the implicit value of absent registers
        if rank == 0 {
            return;
        }
        match self.entries.entry(index) {
            Entry::Vacant(entry) => {
                entry.insert(rank);
            }
            Entry::Occupied(mut entry) => {
                if rank > *entry.get() {
                    entry.insert(rank);
                }
            }
        }
    }

    #[inline]
    fn get(&self, index: u16) -> u8 {
        self.entries.get(&index).copied().unwrap_or(0)
    }

    fn sum(&self) -> RegisterSum {
        let mut sum: RegisterSum = self.entries.values().copied().collect();
        sum.add_zeros(self.precision.registers() - self.entries.len());
        sum
    }

    #[inline]
    fn precision(&self) -> Precision {
        self.precision
    }

    /// Return memory size of `Sparse` representation
    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + self.entries.len() * ENTRY_SIZE
    }
}
