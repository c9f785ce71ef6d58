//! Built-in functions under test.
//!
//! Each subject pairs a naive "input" program with a rewritten "output"
//! program, instantiated in both domains, and a high-precision reference.

use crate::harness::{self, Candidates, Report};
use crate::reference::{DoubleDouble, Reference};
use crate::types::{Precision, SubjectName};

pub struct Subject<const N: usize> {
    pub name: SubjectName,
    pub candidates: Candidates<N>,
    /// Double-double evaluator, used unless MPFR is compiled in.
    pub double_double: fn(&[f64; N]) -> f64,
    #[cfg(feature = "mpfr")]
    pub mpfr: fn(&[rug::Float; N]) -> f64,
}

impl<const N: usize> Subject<N> {
    /// The most precise reference available in this build.
    pub fn reference(&self) -> Box<dyn Reference<N>> {
        #[cfg(feature = "mpfr")]
        {
            Box::new(crate::reference::MpfrReference::new(self.mpfr))
        }
        #[cfg(not(feature = "mpfr"))]
        {
            Box::new(crate::reference::FnReference(self.double_double))
        }
    }

    pub fn run(&self, iterations: usize, seed: u64) -> Report {
        let mut reference = self.reference();
        harness::run(self.name.as_str(), &self.candidates, reference.as_mut(), iterations, seed)
    }
}

/// Run the named subject with its own arity.
pub fn run_subject(name: SubjectName, iterations: usize, seed: u64) -> Report {
    match name {
        SubjectName::SqrtDiff => sqrt_diff().run(iterations, seed),
        SubjectName::Hypot => hypot().run(iterations, seed),
        SubjectName::Fma => fma().run(iterations, seed),
    }
}

// ========= sqrt(x + 1) - sqrt(x) =========

fn sqrt_diff_input<T: Precision>(a: &[T; 1]) -> T {
    let x = a[0];
    (x + T::ONE).sqrt() - x.sqrt()
}

fn sqrt_diff_output<T: Precision>(a: &[T; 1]) -> T {
    let x = a[0];
    T::ONE / ((x + T::ONE).sqrt() + x.sqrt())
}

fn sqrt_diff_dd(a: &[f64; 1]) -> f64 {
    let x = a[0];
    let lhs = DoubleDouble::sum(x, 1.0).sqrt();
    let rhs = DoubleDouble::new(x).sqrt();
    (lhs + rhs).recip()
}

pub fn sqrt_diff() -> Subject<1> {
    Subject {
        name: SubjectName::SqrtDiff,
        candidates: Candidates {
            input_f32: sqrt_diff_input::<f32>,
            input_f64: sqrt_diff_input::<f64>,
            output_f32: sqrt_diff_output::<f32>,
            output_f64: sqrt_diff_output::<f64>,
        },
        double_double: sqrt_diff_dd,
        #[cfg(feature = "mpfr")]
        mpfr: mpfr_exprs::sqrt_diff,
    }
}

// ========= sqrt(x*x + y*y) =========

const TWO_P500: f64 = f64::from_bits(0x5f30_0000_0000_0000);
const TWO_M500: f64 = f64::from_bits(0x20b0_0000_0000_0000);
const TWO_P600: f64 = f64::from_bits(0x6570_0000_0000_0000);
const TWO_M600: f64 = f64::from_bits(0x1a70_0000_0000_0000);

fn hypot_input<T: Precision>(a: &[T; 2]) -> T {
    (a[0] * a[0] + a[1] * a[1]).sqrt()
}

fn hypot_output<T: Precision>(a: &[T; 2]) -> T {
    a[0].hypot(a[1])
}

fn hypot_dd(a: &[f64; 2]) -> f64 {
    let (x, y) = (a[0].abs(), a[1].abs());
    if x.is_infinite() || y.is_infinite() {
        return f64::INFINITY;
    }
    if x.is_nan() || y.is_nan() {
        return f64::NAN;
    }
    let big = x.max(y);
    if big == 0.0 {
        return 0.0;
    }

    // Power-of-two scaling keeps both squares in range.
    let (scale, unscale) = if big > TWO_P500 {
        (TWO_M600, TWO_P600)
    } else if big < TWO_M500 {
        (TWO_P600, TWO_M600)
    } else {
        (1.0, 1.0)
    };
    let (x, y) = (x * scale, y * scale);

    let sum = DoubleDouble::product(x, x) + DoubleDouble::product(y, y);
    sum.sqrt().scale(unscale).to_f64()
}

pub fn hypot() -> Subject<2> {
    Subject {
        name: SubjectName::Hypot,
        candidates: Candidates {
            input_f32: hypot_input::<f32>,
            input_f64: hypot_input::<f64>,
            output_f32: hypot_output::<f32>,
            output_f64: hypot_output::<f64>,
        },
        double_double: hypot_dd,
        #[cfg(feature = "mpfr")]
        mpfr: mpfr_exprs::hypot,
    }
}

// ========= x*y + z =========

fn fma_input<T: Precision>(a: &[T; 3]) -> T {
    a[0] * a[1] + a[2]
}

fn fma_output<T: Precision>(a: &[T; 3]) -> T {
    a[0].mul_add(a[1], a[2])
}

const TWO_M800: f64 = f64::from_bits(0x0df0_0000_0000_0000);
const TWO_M900: f64 = f64::from_bits(0x07b0_0000_0000_0000);

fn fma_dd(a: &[f64; 3]) -> f64 {
    let (x, y, z) = (a[0], a[1], a[2]);
    let product = DoubleDouble::product(x, y);

    if product.hi.is_infinite() && x.is_finite() && y.is_finite() && z.is_finite() {
        // Redo the overflowed product 2^600 lower; only a large opposing
        // z can pull the sum back into range.
        let (x, y) = if x.abs() >= y.abs() {
            (x * TWO_M600, y)
        } else {
            (x, y * TWO_M600)
        };
        let sum = DoubleDouble::product(x, y) + DoubleDouble::new(z * TWO_M600);
        return sum.to_f64() * TWO_P600;
    }
    if !product.hi.is_finite() {
        return product.hi + z;
    }
    if product.hi.abs() >= TWO_M900 {
        return (product + DoubleDouble::new(z)).to_f64();
    }
    // The product sits below half an ulp of z.
    if z.abs() >= TWO_M800 {
        return z;
    }

    // Lift factors under 1 so two_prod stays exact, and z with them.
    let mut lifts = 0;
    let mut lift = |v: f64| {
        if v.abs() < 1.0 {
            lifts += 1;
            v * TWO_P600
        } else {
            v
        }
    };
    let (x, y) = (lift(x), lift(y));
    let z = (0..lifts).fold(z, |z, _| z * TWO_P600);
    round_lowered(DoubleDouble::product(x, y) + DoubleDouble::new(z), lifts)
}

/// Round `v * 2^(-600 * lifts)` to `f64` with a single rounding step.
///
/// When the result is subnormal, `v.hi` alone can sit exactly on a tie of
/// the subnormal grid; `v.lo` then decides the direction.
fn round_lowered(v: DoubleDouble, lifts: i32) -> f64 {
    if !v.hi.is_finite() {
        return v.hi;
    }
    if lifts == 2 && !(v.hi * TWO_M600).is_normal() {
        // Below 2^-1622, far under the smallest subnormal.
        return 0.0f64.copysign(v.hi);
    }

    let lower = |t: f64| (0..lifts).fold(t, |t, _| t * TWO_M600);
    let raise = |t: f64| (0..lifts).fold(t, |t, _| t * TWO_P600);

    let rounded = lower(v.hi);
    let rem = v.hi - raise(rounded);
    let half_step = raise(f64::from_bits(1)) * 0.5;
    let tie_broken_away = rem.abs() == half_step
        && v.lo != 0.0
        && v.lo.is_sign_positive() == rem.is_sign_positive();

    if !tie_broken_away {
        rounded
    } else if rem > 0.0 {
        rounded.next_up()
    } else {
        rounded.next_down()
    }
}

pub fn fma() -> Subject<3> {
    Subject {
        name: SubjectName::Fma,
        candidates: Candidates {
            input_f32: fma_input::<f32>,
            input_f64: fma_input::<f64>,
            output_f32: fma_output::<f32>,
            output_f64: fma_output::<f64>,
        },
        double_double: fma_dd,
        #[cfg(feature = "mpfr")]
        mpfr: mpfr_exprs::fma,
    }
}

#[cfg(feature = "mpfr")]
mod mpfr_exprs {
    use rug::Float;

    pub fn sqrt_diff(a: &[Float; 1]) -> f64 {
        let x = &a[0];
        let prec = x.prec();
        let lhs = Float::with_val(prec, x + 1u32).sqrt();
        let rhs = Float::with_val(prec, x.sqrt_ref());
        (lhs - rhs).to_f64()
    }

    pub fn hypot(a: &[Float; 2]) -> f64 {
        Float::with_val(a[0].prec(), a[0].hypot_ref(&a[1])).to_f64()
    }

    pub fn fma(a: &[Float; 3]) -> f64 {
        Float::with_val(a[0].prec(), a[0].mul_add_ref(&a[1], &a[2])).to_f64()
    }
}
