// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the generation of (safe) primes and of
//! prime order subgroups of `Z_p^*`, which are the setting of the
//! group-based inner product schemes.

use crate::{error::FEError, utils::numeric::pow2};
use qfall_math::{integer::Z, integer_mod_q::Zq, traits::Pow};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Upper bound on the number of candidates tried per requested bit
/// by [`get_prime`] before giving up.
const PRIME_ATTEMPTS_PER_BIT: u64 = 1000;

/// Upper bound on the number of candidates tried by [`Group::new`]
/// to find a suitable generator.
const GENERATOR_ATTEMPTS: usize = 1000;

/// Samples a random prime `p` with exactly `bits` bits.
/// If `safe` is set, `p = 2q + 1` for a prime `q`.
///
/// Parameters:
/// - `bits`: the bit length of the prime
/// - `safe`: specifies whether a safe prime is required
///
/// Returns a prime of the requested bit length or a [`FEError`]
/// if no such prime was found.
///
/// # Examples
/// ```
/// use qfall_fe::primitive::group::get_prime;
/// use qfall_math::integer::Z;
///
/// let p = get_prime(64, true).unwrap();
/// let q = (&p - Z::ONE).div_floor(&Z::from(2));
///
/// assert!(p.is_prime() && q.is_prime());
/// assert_eq!(64, p.bits());
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
/// if `bits < 2`, or `bits < 3` for safe primes, or if no prime was found
/// within a bounded number of attempts.
pub fn get_prime(bits: u64, safe: bool) -> Result<Z, FEError> {
    if bits < 2 || (safe && bits < 3) {
        return Err(FEError::PrimeGenFailed(format!(
            "there is no {}prime with {bits} bits",
            if safe { "safe " } else { "" }
        )));
    }

    if !safe {
        return Ok(Z::sample_prime_uniform(&pow2(bits - 1)?, &pow2(bits)?)?);
    }

    // p = 2q + 1 has exactly `bits` bits for q ∈ [2^{bits-2}, 2^{bits-1})
    let lower = pow2(bits - 2)?;
    let upper = pow2(bits - 1)?;
    for _ in 0..PRIME_ATTEMPTS_PER_BIT * bits {
        let q = Z::sample_prime_uniform(&lower, &upper)?;
        let p = Z::from(2) * q + Z::ONE;
        if p.is_prime() {
            return Ok(p);
        }
    }

    Err(FEError::PrimeGenFailed(format!(
        "no safe prime with {bits} bits found"
    )))
}

/// Computes `base^exponent mod modulus` for `modulus > 1`.
/// Negative exponents are allowed for invertible `base`.
///
/// # Examples
/// ```
/// use qfall_fe::primitive::group::pow_mod;
/// use qfall_math::integer::Z;
///
/// let res = pow_mod(&Z::from(3), &Z::from(-1), &Z::from(7)).unwrap();
///
/// assert_eq!(Z::from(5), res);
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`Math`](FEError::Math) if
/// `base` is not invertible and the `exponent` is negative.
pub fn pow_mod(base: &Z, exponent: &Z, modulus: &Z) -> Result<Z, FEError> {
    Ok(Zq::from((base, modulus)).pow(exponent)?.get_value())
}

/// A cyclic group `<g>` of prime order `q` in `Z_p^*` for a safe prime
/// `p = 2q + 1`, i.e. the group of quadratic residues mod `p`.
///
/// Attributes:
/// - `p`: the safe prime modulus
/// - `q`: the order of the group, `q = (p - 1) / 2`
/// - `g`: a generator of the group
///
/// # Examples
/// ```
/// use qfall_fe::primitive::group::{Group, pow_mod};
/// use qfall_math::integer::Z;
///
/// let group = Group::new(64).unwrap();
///
/// assert_eq!(Z::ONE, pow_mod(&group.g, &group.q, &group.p).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub p: Z,
    pub q: Z,
    pub g: Z,
}

impl Group {
    /// Generates a group with a safe prime modulus of `modulus_len` bits.
    ///
    /// The generator is the square of a random element, hence it generates
    /// the subgroup of quadratic residues. Generators `g` such that `g` or
    /// `g^{-1}` divide `p - 1` are rejected as they enable
    /// Bleichenbacher's attack on ElGamal signatures.
    ///
    /// Parameters:
    /// - `modulus_len`: the bit length of `p`
    ///
    /// Returns a new [`Group`] or a [`FEError`] if no safe prime or no suitable
    /// generator was found.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::primitive::group::Group;
    ///
    /// let group = Group::new(32).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
    /// if `modulus_len < 3` or no safe prime was found.
    /// - Returns a [`FEError`] of type [`ParamGenFailed`](FEError::ParamGenFailed)
    /// if no suitable generator was found.
    pub fn new(modulus_len: u64) -> Result<Self, FEError> {
        let p = get_prime(modulus_len, true)?;
        let p_minus_one = &p - Z::ONE;
        let q = p_minus_one.div_floor(&Z::from(2));

        for _ in 0..GENERATOR_ATTEMPTS {
            let r = Z::sample_uniform(3, &p)?;
            let g = pow_mod(&r, &Z::from(2), &p)?;
            if g == Z::ONE || divides(&g, &p_minus_one) {
                continue;
            }

            let g_inv = pow_mod(&g, &Z::MINUS_ONE, &p)?;
            if divides(&g_inv, &p_minus_one) {
                continue;
            }

            debug!(bits = modulus_len, "generated group of quadratic residues");
            return Ok(Self { p, q, g });
        }

        Err(FEError::ParamGenFailed(format!(
            "no suitable generator found modulo {p}"
        )))
    }
}

/// Checks whether `divisor` divides `value`.
fn divides(divisor: &Z, value: &Z) -> bool {
    value.div_floor(divisor) * divisor == *value
}

#[cfg(test)]
mod test_get_prime {
    use super::get_prime;
    use crate::error::FEError;
    use qfall_math::integer::Z;

    /// Checks the bit length and primality of regular primes.
    #[test]
    fn regular_prime() {
        for bits in [2, 10, 64, 128] {
            let p = get_prime(bits, false).unwrap();

            assert!(p.is_prime());
            assert_eq!(bits, p.bits());
        }
    }

    /// Checks that safe primes have the form `2q + 1`.
    #[test]
    fn safe_prime() {
        for bits in [3, 16, 128] {
            let p = get_prime(bits, true).unwrap();
            let q = (&p - Z::ONE).div_floor(&Z::from(2));

            assert!(p.is_prime());
            assert!(q.is_prime());
            assert_eq!(bits, p.bits());
        }
    }

    /// Ensures that too small bit lengths are rejected.
    #[test]
    fn too_few_bits() {
        assert!(matches!(get_prime(1, false), Err(FEError::PrimeGenFailed(_))));
        assert!(matches!(get_prime(2, true), Err(FEError::PrimeGenFailed(_))));
    }
}
