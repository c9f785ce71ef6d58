//! Bit-pattern error metric and the "ordinary value" predicate.

/// Map a float's bit pattern onto the signed integer line so that adjacent
/// representable values always differ by exactly one.
#[inline]
fn ordered_f32(x: f32) -> i32 {
    let bits = x.to_bits() as i32;
    if bits < 0 { i32::MIN.wrapping_sub(bits) } else { bits }
}

#[inline]
fn ordered_f64(x: f64) -> i64 {
    let bits = x.to_bits() as i64;
    if bits < 0 { i64::MIN.wrapping_sub(bits) } else { bits }
}

/// Number of representable `f32` values between `x` and `y`.
///
/// `-0.0` and `+0.0` compare equal, two NaNs are distance 0, and a single
/// NaN saturates to `u32::MAX`.
pub fn ulp_distance_f32(x: f32, y: f32) -> u32 {
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };

    match (x.is_nan(), y.is_nan()) {
        (true, true) => 0,
        (true, false) | (false, true) => u32::MAX,
        (false, false) => ordered_f32(x).abs_diff(ordered_f32(y)),
    }
}

/// Number of representable `f64` values between `x` and `y`.
///
/// Same conventions as [`ulp_distance_f32`], saturating to `u64::MAX`.
pub fn ulp_distance_f64(x: f64, y: f64) -> u64 {
    let x = if x == 0.0 { 0.0 } else { x };
    let y = if y == 0.0 { 0.0 } else { y };

    match (x.is_nan(), y.is_nan()) {
        (true, true) => 0,
        (true, false) | (false, true) => u64::MAX,
        (false, false) => ordered_f64(x).abs_diff(ordered_f64(y)),
    }
}

/// True when `x` is finite and so is its non-zero reciprocal.
///
/// Rejects NaN, both infinities, both zeros and the subnormals whose
/// reciprocal overflows.
pub fn is_ordinary_f32(x: f32) -> bool {
    let r = 1.0 / x;
    x.is_finite() && r.is_finite() && r != 0.0
}

pub fn is_ordinary_f64(x: f64) -> bool {
    let r = 1.0 / x;
    x.is_finite() && r.is_finite() && r != 0.0
}
