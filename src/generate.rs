//! Random operand batches.

use rand::Rng;

use crate::types::Precision;

/// Largest arity a subject may declare.
pub const MAX_ARITY: usize = 6;

/// Bits contributed by one draw from the random source.
const DRAW_BITS: u32 = 16;

/// `count` operand tuples of arity `N`, all ordinary.
///
/// The flat view is indexed by `tuple_index * N + slot`.
#[derive(Debug, Clone, PartialEq)]
pub struct OperandBatch<T, const N: usize> {
    tuples: Vec<[T; N]>,
}

impl<T: Precision, const N: usize> OperandBatch<T, N> {
    pub fn from_tuples(tuples: Vec<[T; N]>) -> Self {
        Self { tuples }
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    pub fn tuples(&self) -> &[[T; N]] {
        &self.tuples
    }

    pub fn as_flat(&self) -> &[T] {
        self.tuples.as_flattened()
    }

    /// Widen every tuple for the reference evaluator.
    pub fn widened(&self) -> impl Iterator<Item = [f64; N]> + '_ {
        self.tuples.iter().map(|&tuple| tuple.map(T::to_f64))
    }
}

/// Assemble `width` random bits from 16-bit draws, most significant first.
pub fn random_bits<R: Rng + ?Sized>(rng: &mut R, width: u32) -> u64 {
    (0..width / DRAW_BITS).fold(0u64, |acc, _| {
        (acc << DRAW_BITS) | u64::from(rng.random::<u16>())
    })
}

/// Draw raw bit patterns until one is an ordinary value.
///
/// The loop has no retry bound. Only NaN, infinities, zeros and the
/// subnormals whose reciprocal overflows are rejected, well under 1% of all
/// patterns, so it only spins forever on a degenerate source that keeps
/// repeating a rejected pattern.
pub fn random_ordinary<T: Precision, R: Rng + ?Sized>(rng: &mut R) -> T {
    loop {
        let value = T::from_bits_u64(random_bits(rng, T::BITS));
        if value.is_ordinary() {
            return value;
        }
    }
}

/// Generate `count` tuples of `N` ordinary operands.
pub fn generate_batch<T, R, const N: usize>(count: usize, rng: &mut R) -> OperandBatch<T, N>
where
    T: Precision,
    R: Rng + ?Sized,
{
    const { assert!(N >= 1 && N <= MAX_ARITY, "arity must be between 1 and 6") };

    let mut tuples = Vec::with_capacity(count);
    for _ in 0..count {
        tuples.push(std::array::from_fn(|_| random_ordinary::<T, R>(rng)));
    }
    OperandBatch { tuples }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn every_generated_value_is_ordinary() {
        let mut rng = SmallRng::seed_from_u64(7);
        let narrow = generate_batch::<f32, _, 3>(5_000, &mut rng);
        let wide = generate_batch::<f64, _, 3>(5_000, &mut rng);
        assert!(narrow.as_flat().iter().all(|x| x.is_ordinary()));
        assert!(wide.as_flat().iter().all(|x| x.is_ordinary()));
    }

    #[test]
    fn flat_view_is_tuple_major() {
        let batch = OperandBatch::from_tuples(vec![[1.0f64, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let flat = batch.as_flat();
        assert_eq!(flat.len(), 6);
        for (i, tuple) in batch.tuples().iter().enumerate() {
            for (slot, value) in tuple.iter().enumerate() {
                assert_eq!(flat[i * 2 + slot], *value);
            }
        }
    }

    #[test]
    fn batch_has_requested_length() {
        let mut rng = SmallRng::seed_from_u64(1);
        let batch = generate_batch::<f64, _, 6>(17, &mut rng);
        assert_eq!(batch.len(), 17);
        assert_eq!(batch.as_flat().len(), 17 * 6);

        let empty = generate_batch::<f32, _, 1>(0, &mut rng);
        assert!(empty.is_empty());
    }

    #[test]
    fn same_seed_gives_same_batch() {
        let a = generate_batch::<f64, _, 2>(100, &mut SmallRng::seed_from_u64(42));
        let b = generate_batch::<f64, _, 2>(100, &mut SmallRng::seed_from_u64(42));
        assert_eq!(a.as_flat().len(), b.as_flat().len());
        assert!(
            a.as_flat()
                .iter()
                .zip(b.as_flat())
                .all(|(x, y)| x.to_bits() == y.to_bits())
        );
    }

    #[test]
    fn random_bits_fit_requested_width() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..1_000 {
            assert!(random_bits(&mut rng, 32) <= u64::from(u32::MAX));
        }
    }

    #[test]
    fn rejected_patterns_are_rare() {
        fn rejected<T: Precision>(rng: &mut SmallRng, draws: usize) -> usize {
            (0..draws)
                .filter(|_| !T::from_bits_u64(random_bits(rng, T::BITS)).is_ordinary())
                .count()
        }

        let mut rng = SmallRng::seed_from_u64(21);
        let narrow = rejected::<f32>(&mut rng, 200_000);
        let wide = rejected::<f64>(&mut rng, 200_000);
        assert!(narrow > 0 && narrow < 2_000, "f32 rejected {narrow}");
        assert!(wide < 400, "f64 rejected {wide}");
    }

    #[test]
    fn widened_preserves_narrow_values() {
        let batch = OperandBatch::from_tuples(vec![[1.5f32, -0.25f32]]);
        let wide: Vec<[f64; 2]> = batch.widened().collect();
        assert_eq!(wide, vec![[1.5, -0.25]]);
    }

    proptest! {
        #[test]
        fn ptest_generated_values_are_ordinary(seed in any::<u64>()) {
            let mut rng = SmallRng::seed_from_u64(seed);
            let batch = generate_batch::<f32, _, 1>(64, &mut rng);
            prop_assert!(batch.as_flat().iter().all(|x| x.is_ordinary()));
        }
    }
}
