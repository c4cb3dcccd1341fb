//! Factorial router: 120 ways to route five inputs to five outputs.
//!
//! Input 6 is a 0-10 V control split into 120 equal intervals. Interval `k`
//! selects the k-th permutation of inputs 1-5 in lexicographic order, decoded
//! from the factorial number system. Interval 0 is the identity routing.

use std::fmt;

use crate::{
    block::Block,
    config::DispatchConfig,
    error::ProcessResult,
    processor::Processor,
};

/// Routed rows
pub const ROUTES: usize = 5;
/// 5!
pub const PERMUTATIONS: usize = 120;
/// Row carrying the selection CV
const CONTROL_ROW: usize = 5;
/// Control voltage span
const CONTROL_RANGE: f32 = 10.0;

/// A permutation of row indices 0-4
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permutation([usize; ROUTES]);

impl Permutation {
    /// Decode the k-th lexicographic permutation (k is clamped to 0-119)
    pub fn nth(k: usize) -> Self {
        let mut k = k.min(PERMUTATIONS - 1);
        let mut remaining: [usize; ROUTES] = [0, 1, 2, 3, 4];
        let mut available = ROUTES;
        let mut perm = [0; ROUTES];
        let mut factorial = PERMUTATIONS;

        for (i, slot) in perm.iter_mut().enumerate() {
            factorial /= ROUTES - i;
            let j = k / factorial;
            k %= factorial;
            *slot = remaining[j];
            remaining.copy_within(j + 1..available, j);
            available -= 1;
        }
        Self(perm)
    }

    /// Map a 0-10 V control voltage to a permutation index
    pub fn index_for_voltage(voltage: f32) -> usize {
        let k = (voltage / CONTROL_RANGE * PERMUTATIONS as f32).floor();
        k.clamp(0.0, (PERMUTATIONS - 1) as f32) as usize
    }

    /// Source row for output row `row`
    pub fn source(&self, row: usize) -> usize {
        self.0[row]
    }
}

/// One-based listing, e.g. `1, 2, 3, 4, 5`
impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, src) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", src + 1)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct FactorialRouter;

impl FactorialRouter {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for FactorialRouter {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        let k = Permutation::index_for_voltage(block.input(CONTROL_ROW));
        let perm = Permutation::nth(k);
        block.display(perm);

        let (inputs, outputs) = block.io_mut();
        for row in 0..ROUTES {
            outputs
                .channel_mut(row)
                .copy_from_slice(inputs.channel(perm.source(row)));
        }
        Ok(())
    }

    fn config(&self) -> DispatchConfig {
        DispatchConfig::default().with_buffer_size(16)
    }

    fn name(&self) -> &str {
        "factorial_router"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_permutations() {
        assert_eq!(Permutation::nth(0), Permutation([0, 1, 2, 3, 4]));
        assert_eq!(Permutation::nth(1), Permutation([0, 1, 2, 4, 3]));
        assert_eq!(Permutation::nth(119), Permutation([4, 3, 2, 1, 0]));
        assert_eq!(Permutation::nth(500), Permutation::nth(119));
    }

    #[test]
    fn every_index_is_a_distinct_permutation() {
        let mut seen = std::collections::HashSet::new();
        for k in 0..PERMUTATIONS {
            let perm = Permutation::nth(k);
            let mut rows = perm.0;
            rows.sort_unstable();
            assert_eq!(rows, [0, 1, 2, 3, 4]);
            assert!(seen.insert(perm.0), "duplicate at {k}");
        }
    }

    #[test]
    fn voltage_mapping_clamps() {
        assert_eq!(Permutation::index_for_voltage(-3.0), 0);
        assert_eq!(Permutation::index_for_voltage(0.0), 0);
        assert_eq!(Permutation::index_for_voltage(0.09), 1);
        assert_eq!(Permutation::index_for_voltage(10.0), 119);
        assert_eq!(Permutation::index_for_voltage(12.0), 119);
    }

    #[test]
    fn displays_one_based() {
        assert_eq!(Permutation::nth(0).to_string(), "1, 2, 3, 4, 5");
        assert_eq!(Permutation::nth(119).to_string(), "5, 4, 3, 2, 1");
    }
}
