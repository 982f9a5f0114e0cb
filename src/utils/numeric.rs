// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains numeric helpers on top of [`Z`],
//! e.g. [`f64`] approximations of fractions whose numerator and denominator
//! exceed the range of an [`f64`].

use crate::error::FEError;
use qfall_math::{integer::Z, traits::Pow};

/// Number of bits kept of numerator and denominator in [`ratio_to_f64`].
const RATIO_PRECISION: u64 = 960;

/// Number of leading bits of a [`Z`] that are converted exactly.
const MANTISSA_BITS: u64 = 62;

/// Returns an [`f64`] approximation of `value` from its leading bits.
fn z_to_f64(value: &Z) -> f64 {
    let bits = value.bits();
    if bits <= MANTISSA_BITS {
        return i64::try_from(value).map_or(f64::NAN, |small| small as f64);
    }

    let shift = bits - MANTISSA_BITS;
    match Z::from(2).pow(shift) {
        Ok(scale) => match i64::try_from(&value.div_floor(&scale)) {
            Ok(mantissa) => mantissa as f64 * 2f64.powi(shift as i32),
            Err(_) => f64::NAN,
        },
        Err(_) => f64::NAN,
    }
}

/// Returns an [`f64`] approximation of `numerator / denominator`, which is
/// accurate even if both values exceed the range of an [`f64`].
///
/// Parameters:
/// - `numerator`: the numerator of the fraction
/// - `denominator`: the denominator of the fraction
///
/// # Examples
/// ```
/// use qfall_fe::utils::numeric::ratio_to_f64;
/// use qfall_math::{integer::Z, traits::Pow};
///
/// let big = Z::from(3).pow(2000).unwrap();
/// let ratio = ratio_to_f64(&(&big * Z::from(5)), &(&big * Z::from(2)));
///
/// assert!((ratio - 2.5).abs() < 1e-9);
/// ```
pub fn ratio_to_f64(numerator: &Z, denominator: &Z) -> f64 {
    let bits = numerator.bits().max(denominator.bits());
    if bits <= RATIO_PRECISION {
        return z_to_f64(numerator) / z_to_f64(denominator);
    }

    // both values are scaled down by the same power of two
    let shift = match Z::from(2).pow(bits - RATIO_PRECISION) {
        Ok(shift) => shift,
        Err(_) => return f64::NAN,
    };
    z_to_f64(&numerator.div_floor(&shift)) / z_to_f64(&denominator.div_floor(&shift))
}

/// Computes `2^exponent`.
///
/// # Examples
/// ```
/// use qfall_fe::utils::numeric::pow2;
/// use qfall_math::integer::Z;
///
/// assert_eq!(Z::from(1024), pow2(10).unwrap());
/// ```
pub fn pow2(exponent: u64) -> Result<Z, FEError> {
    Ok(Z::from(2).pow(exponent)?)
}

/// Lifts a representative `value ∈ [0, modulus)` to `(-modulus/2, modulus/2]`.
///
/// # Examples
/// ```
/// use qfall_fe::utils::numeric::center;
/// use qfall_math::integer::Z;
///
/// assert_eq!(Z::from(-3), center(&Z::from(14), &Z::from(17)));
/// assert_eq!(Z::from(8), center(&Z::from(8), &Z::from(17)));
/// ```
pub fn center(value: &Z, modulus: &Z) -> Z {
    if value > &modulus.div_floor(&Z::from(2)) {
        value - modulus
    } else {
        value.clone()
    }
}

/// Returns the binary representation of a non-negative `value`,
/// least significant bit first and without leading zeros.
///
/// # Examples
/// ```
/// use qfall_fe::utils::numeric::bit_decomposition;
/// use qfall_math::integer::Z;
///
/// assert_eq!(vec![false, true, true], bit_decomposition(&Z::from(6)));
/// assert!(bit_decomposition(&Z::ZERO).is_empty());
/// ```
pub fn bit_decomposition(value: &Z) -> Vec<bool> {
    if let Ok(small) = i64::try_from(value) {
        let small = small.max(0);
        let len = (i64::BITS - small.leading_zeros()) as usize;
        return (0..len).map(|i| (small >> i) & 1 == 1).collect();
    }

    let two = Z::from(2);
    let mut bits = Vec::new();
    let mut rest = value.clone();
    while rest > Z::ZERO {
        let half = rest.div_floor(&two);
        bits.push(&rest - &half * &two == Z::ONE);
        rest = half;
    }
    bits
}

#[cfg(test)]
mod test_conversions {
    use super::{ratio_to_f64, z_to_f64};
    use qfall_math::{integer::Z, traits::Pow};

    /// Checks that large values are approximated correctly.
    #[test]
    fn large_z() {
        let value = Z::from(2).pow(100).unwrap();

        assert_eq!(2f64.powi(100), z_to_f64(&value));
        assert_eq!(-2f64.powi(100), z_to_f64(&(Z::ZERO - value)));
        assert_eq!(-7.0, z_to_f64(&Z::from(-7)));
    }

    /// Ensures fractions of values larger than [`f64::MAX`] are finite.
    #[test]
    fn huge_ratio() {
        let numerator = Z::from(2).pow(3000).unwrap();
        let denominator = Z::from(2).pow(2998).unwrap();

        let ratio = ratio_to_f64(&numerator, &denominator);

        assert!((ratio - 4.0).abs() < 1e-9);
    }

    /// Checks fractions of small values.
    #[test]
    fn small_ratio() {
        assert_eq!(0.25, ratio_to_f64(&Z::ONE, &Z::from(4)));
        assert_eq!(-1.5, ratio_to_f64(&Z::from(-3), &Z::from(2)));
    }
}

#[cfg(test)]
mod test_integer_helpers {
    use super::{bit_decomposition, center, pow2};
    use qfall_math::{integer::Z, traits::Pow};

    /// Checks powers of two beyond the range of [`u64`].
    #[test]
    fn powers_of_two() {
        assert_eq!(Z::ONE, pow2(0).unwrap());
        assert_eq!(Z::from(2).pow(100).unwrap(), pow2(100).unwrap());
    }

    /// Checks centering of representatives.
    #[test]
    fn residues() {
        assert_eq!(Z::from(-1), center(&Z::from(6), &Z::from(7)));
        assert_eq!(Z::from(3), center(&Z::from(3), &Z::from(7)));
        assert_eq!(Z::ZERO, center(&Z::ZERO, &Z::from(7)));
    }

    /// Checks the bit decomposition of a value exceeding 64 bits.
    #[test]
    fn large_bits() {
        let value = Z::from(2).pow(70).unwrap() + Z::from(5);

        let bits = bit_decomposition(&value);

        assert_eq!(71, bits.len());
        assert!(bits[0] && !bits[1] && bits[2] && bits[70]);
        assert_eq!(3, bits.iter().filter(|bit| **bit).count());
    }
}
