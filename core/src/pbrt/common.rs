//! Common

use num_traits::Num;
use std::ops::Neg;

/// Use 64-bit precision for floating point numbers. Lens prescriptions are
/// given in millimetres and calibration subtracts nearly equal lengths.
pub type Float = f64;

/// PI (π)
pub const PI: Float = std::f64::consts::PI;

/// PI/4 (π/4)
pub const PI_OVER_FOUR: Float = PI * 0.25;

/// Machine Epsilon
pub const MACHINE_EPSILON: Float = std::f64::EPSILON * 0.5;

/// Returns the absolute value of a number.
///
/// * `n` - The number.
#[inline(always)]
pub fn abs<T>(n: T) -> T
where
    T: Num + Neg<Output = T> + PartialOrd + Copy,
{
    if n < T::zero() {
        -n
    } else {
        n
    }
}

/// Returns the minimum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn min<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a < b {
        a
    } else {
        b
    }
}

/// Returns the maximum of 2 numbers.
///
/// * `a` - First number.
/// * `b` - Second number.
#[inline(always)]
pub fn max<T>(a: T, b: T) -> T
where
    T: Num + PartialOrd + Copy,
{
    if a > b {
        a
    } else {
        b
    }
}

/// Clamps a value to the range [low, high].
///
/// * `val`  - The value to clamp.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T>(val: T, low: T, high: T) -> T
where
    T: PartialOrd,
{
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Returns +1 or -1 with the sign of `v`. Zero radii never reach the optics
/// code so the sign of zero does not matter.
///
/// * `v` - The value.
#[inline(always)]
pub fn sign(v: Float) -> Float {
    (1.0 as Float).copysign(v)
}

/// Emulates the behavior of `std::upper_bound`. Returns the index of the
/// first element of a non-decreasing slice that is strictly greater than
/// `value`, or `values.len()` if there is none. Runs in O(log n).
///
/// * `values` - Non-decreasing values.
/// * `value`  - The value to search for.
pub fn upper_bound(values: &[Float], value: Float) -> usize {
    let (mut first, mut len) = (0, values.len());

    while len > 0 {
        let half = len >> 1;
        let middle = first + half;

        // Bisect range based on value at `middle`.
        if values[middle] <= value {
            first = middle + 1;
            len -= half + 1;
        } else {
            len = half;
        }
    }

    first
}

/// Return the cosine of an angle.
///
/// * `theta` - The angle in radians.
#[inline(always)]
pub fn cos(theta: Float) -> Float {
    theta.cos()
}

/// Return the sine of an angle.
///
/// * `theta` - The angle in radians.
#[inline(always)]
pub fn sin(theta: Float) -> Float {
    theta.sin()
}

/// Return the tangent of an angle.
///
/// * `theta` - The angle in radians.
#[inline(always)]
pub fn tan(theta: Float) -> Float {
    theta.tan()
}

/// Return the arctangent of a value.
///
/// * `v` - The value.
#[inline(always)]
pub fn atan(v: Float) -> Float {
    v.atan()
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
