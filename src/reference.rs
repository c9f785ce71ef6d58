//! High-precision ground truth.
//!
//! The harness only sees the [`Reference`] contract: a one-time `setup`, then
//! one `eval` per operand tuple with the operands widened to `f64`. The
//! built-in evaluators are double-double arithmetic (always available) and
//! MPFR through `rug` (feature `mpfr`).

use std::ops::Add;

use crate::generate::OperandBatch;
use crate::types::Precision;

/// A high-precision implementation of the function under test.
pub trait Reference<const N: usize> {
    /// Allocate whatever the evaluator needs before the first `eval`.
    fn setup(&mut self) {}

    /// Evaluate one tuple, rounding the exact result to `f64`.
    fn eval(&mut self, args: &[f64; N]) -> f64;
}

/// Adapter that turns a plain function or closure into a [`Reference`].
pub struct FnReference<F>(pub F);

impl<F, const N: usize> Reference<N> for FnReference<F>
where
    F: FnMut(&[f64; N]) -> f64,
{
    fn eval(&mut self, args: &[f64; N]) -> f64 {
        (self.0)(args)
    }
}

/// Ground truth for every tuple of `batch`, rounded into the batch's domain.
pub fn evaluate_reference<T, R, const N: usize>(reference: &mut R, batch: &OperandBatch<T, N>) -> Vec<T>
where
    T: Precision,
    R: Reference<N> + ?Sized,
{
    batch
        .widened()
        .map(|args| T::from_f64(reference.eval(&args)))
        .collect()
}

// ========= double-double =========

/// Error-free sum: `a + b == s + err` exactly.
#[inline(always)]
pub fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    (s, err)
}

/// Error-free product through a fused multiply-add.
#[inline(always)]
pub fn two_prod(a: f64, b: f64) -> (f64, f64) {
    let p = a * b;
    (p, a.mul_add(b, -p))
}

/// Requires `|a| >= |b|`.
#[inline(always)]
fn fast_two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    let err = b - (s - a);
    (s, err)
}

/// Unevaluated sum `hi + lo` carrying about 106 significant bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoubleDouble {
    pub hi: f64,
    pub lo: f64,
}

impl DoubleDouble {
    pub const fn new(hi: f64) -> Self {
        Self { hi, lo: 0.0 }
    }

    pub fn sum(a: f64, b: f64) -> Self {
        let (hi, lo) = two_sum(a, b);
        if !hi.is_finite() {
            return Self::new(hi);
        }
        Self { hi, lo }
    }

    pub fn product(a: f64, b: f64) -> Self {
        let (hi, lo) = two_prod(a, b);
        if !hi.is_finite() {
            return Self::new(hi);
        }
        Self { hi, lo }
    }

    pub fn sqrt(self) -> Self {
        let s = self.hi.sqrt();
        if s == 0.0 || !s.is_finite() {
            return Self::new(s);
        }
        // One Newton step on the exact remainder hi + lo - s*s.
        let rem = (-s).mul_add(s, self.hi) + self.lo;
        let (hi, lo) = fast_two_sum(s, rem / (2.0 * s));
        Self { hi, lo }
    }

    /// `1 / (hi + lo)` rounded to `f64`.
    pub fn recip(self) -> f64 {
        let q = 1.0 / self.hi;
        if q == 0.0 || !q.is_finite() {
            return q;
        }
        let r = (-self.hi).mul_add(q, 1.0) - self.lo * q;
        q.mul_add(r, q)
    }

    /// Multiply by `factor`, exact when it is a power of two and nothing
    /// leaves the normal range.
    pub fn scale(self, factor: f64) -> Self {
        Self {
            hi: self.hi * factor,
            lo: self.lo * factor,
        }
    }

    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }
}

impl Add for DoubleDouble {
    type Output = DoubleDouble;

    fn add(self, other: DoubleDouble) -> DoubleDouble {
        let (s, e) = two_sum(self.hi, other.hi);
        if !s.is_finite() {
            return DoubleDouble::new(s);
        }
        let (hi, lo) = two_sum(s, e + self.lo + other.lo);
        if !hi.is_finite() {
            return DoubleDouble::new(hi);
        }
        DoubleDouble { hi, lo }
    }
}

// ========= MPFR =========

#[cfg(feature = "mpfr")]
pub use mpfr::{MPFR_PREC, MpfrReference};

#[cfg(feature = "mpfr")]
mod mpfr {
    use rug::{Assign, Float};

    use super::Reference;

    /// Enough bits to survive the worst cancellation across the `f64`
    /// exponent range.
    pub const MPFR_PREC: u32 = 2048;

    /// MPFR-backed reference. `setup` allocates one scratch `Float` per
    /// operand slot; `eval` reuses them for every tuple.
    pub struct MpfrReference<const N: usize> {
        precision: u32,
        slots: Option<[Float; N]>,
        expr: fn(&[Float; N]) -> f64,
    }

    impl<const N: usize> MpfrReference<N> {
        pub fn new(expr: fn(&[Float; N]) -> f64) -> Self {
            Self::with_precision(MPFR_PREC, expr)
        }

        pub fn with_precision(precision: u32, expr: fn(&[Float; N]) -> f64) -> Self {
            Self {
                precision,
                slots: None,
                expr,
            }
        }
    }

    impl<const N: usize> Reference<N> for MpfrReference<N> {
        fn setup(&mut self) {
            let precision = self.precision;
            self.slots = Some(std::array::from_fn(|_| Float::new(precision)));
        }

        fn eval(&mut self, args: &[f64; N]) -> f64 {
            let precision = self.precision;
            let slots = self
                .slots
                .get_or_insert_with(|| std::array::from_fn(|_| Float::new(precision)));
            for (slot, &x) in slots.iter_mut().zip(args) {
                slot.assign(x);
            }
            (self.expr)(slots)
        }
    }
}
