//! ## Dense representation
//! One byte per register, `2^b` bytes in total. Once an estimator is dense it
//! never returns to the sparse representation.

use std::mem::{size_of, size_of_val};

use crate::formula::RegisterSum;
use crate::precision::Precision;
use crate::representation::RepresentationTrait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dense {
    precision: Precision,
    registers: Box<[u8]>,
}

impl Dense {
    /// Create dense representation with all registers set to zero
    #[inline]
    pub(crate) fn new(precision: Precision) -> Self {
        Self {
            precision,
            registers: vec![0; precision.registers()].into_boxed_slice(),
        }
    }

    /// Create dense representation from exactly `2^b` registers
    #[inline]
    pub(crate) fn from_registers(precision: Precision, registers: Box<[u8]>) -> Self {
        debug_assert_eq!(registers.len(), precision.registers());
        Self {
            precision,
            registers,
        }
    }

    #[inline]
    pub(crate) fn registers(&self) -> &[u8] {
        &self.registers
    }

    /// Register-wise maximum with a dense representation of the same precision
    #[inline]
    pub(crate) fn merge(&mut self, rhs: &Dense) {
        for (lhs, &rhs) in self.registers.iter_mut().zip(rhs.registers.iter()) {
            *lhs = (*lhs).max(rhs);
        }
    }
}

impl RepresentationTrait for Dense {
    #[inline]
    fn update(&mut self, index: u16, rank: u8) {
        let register = &mut self.registers[usize::from(index)];
        if rank > *register {
            *register = rank;
        }
    }

    #[inline]
    fn get(&self, index: u16) -> u8 {
        self.registers[usize::from(index)]
    }

    fn sum(&self) -> RegisterSum {
        self.registers.iter().copied().collect()
    }

    #[inline]
    fn precision(&self) -> Precision {
        self.precision
    }

    /// Return memory size of `Dense` representation
    #[inline]
    fn size_of(&self) -> usize {
        size_of::<Self>() + size_of_val(&*self.registers)
    }
}
