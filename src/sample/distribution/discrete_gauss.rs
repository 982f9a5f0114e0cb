// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains samplers for discrete Gaussian distributions over `Z`
//! centered at `0`, i.e. distributions proportional to `exp(-x^2 / (2σ^2))`.
//!
//! - [`NormalCumulative`] precomputes the cumulative distribution for small `σ`.
//! - [`NormalNegative`] applies rejection sampling on `[-σ√n, σ√n]`.
//! - [`NormalConvolution`] samples for `σ = k * σ_0` from a [`NormalCumulative`]
//!   base sampler with `σ_0` followed by a rejection step.
//! - [`NormalCdt`] samples the one-sided distribution for the fixed
//!   `σ_cdt = √(1/(2 ln 2))` from a constant table.
//! - [`NormalConvolutionConstant`] samples for `σ = k * σ_cdt` from [`NormalCdt`].
//!
//! *Note*: The rejection steps branch on secret values and are not
//! hardened against timing side channels.
//! Furthermore, the lazy exponential comparison of [`NormalNegative`] and
//! [`NormalConvolution`] evaluates in [`f64`], i.e. with `53` bits of
//! precision independent of the precision parameter `n`.
//!
//! The main references are listed in the following:
//! - \[1\] Pöppelmann, T., Ducas, L., Güneysu, T. (2014).
//! Enhanced Lattice-Based Signatures on Reconfigurable Hardware.
//! In: Cryptographic Hardware and Embedded Systems – CHES 2014.
//! <https://eprint.iacr.org/2014/254.pdf>
//! - \[2\] Ducas, L., Durmus, A., Lepoint, T., Lyubashevsky, V. (2013).
//! Lattice Signatures and Bimodal Gaussians.
//! In: Advances in Cryptology – CRYPTO 2013.
//! <https://eprint.iacr.org/2013/383.pdf>

mod cdt;
mod convolution;
mod convolution_constant;
mod cumulative;
mod negative;

pub use cdt::{NormalCdt, SIGMA_CDT};
pub use convolution::NormalConvolution;
pub use convolution_constant::NormalConvolutionConstant;
pub use cumulative::NormalCumulative;
pub use negative::NormalNegative;

use crate::{
    error::FEError,
    utils::numeric::{bit_decomposition, pow2, ratio_to_f64},
};
use qfall_math::{
    integer::{MatZ, Z},
    rational::Q,
    traits::SetEntry,
};

/// This trait is implemented by all discrete Gaussian samplers.
/// Vectors and matrices are sampled entrywise and independently.
pub trait DiscreteGaussSampler {
    /// Draws a single sample.
    fn sample(&self) -> Result<Z, FEError>;

    /// Draws a column vector of `len` independent samples.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalCdt};
    /// use qfall_math::traits::GetNumRows;
    ///
    /// let vec = NormalCdt.sample_vec(10).unwrap();
    ///
    /// assert_eq!(10, vec.get_num_rows());
    /// ```
    fn sample_vec(&self, len: usize) -> Result<MatZ, FEError> {
        self.sample_mat(len, 1)
    }

    /// Draws a `rows x columns` matrix of independent samples.
    fn sample_mat(&self, rows: usize, columns: usize) -> Result<MatZ, FEError> {
        let mut out = MatZ::new(rows, columns);
        for i in 0..rows {
            for j in 0..columns {
                out.set_entry(i, j, self.sample()?)?;
            }
        }
        Ok(out)
    }
}

/// Checks that `sigma` is positive and returns its numerator and denominator.
fn sigma_fraction(sigma: &Q) -> Result<(Z, Z), FEError> {
    let (numerator, denominator) = (sigma.get_numerator(), sigma.get_denominator());
    if numerator <= Z::ZERO {
        return Err(FEError::PreconditionFailed(format!(
            "the standard deviation {sigma} has to be positive"
        )));
    }
    Ok((numerator, denominator))
}

/// Computes the tail cut `⌊σ * √n⌋` of a sampler with standard deviation `σ`
/// and precision parameter `n`.
fn tail_cut(sigma: &Q, n: u64) -> Result<Z, FEError> {
    let (numerator, denominator) = sigma_fraction(sigma)?;
    // ⌊√(⌊σ^2 n⌋)⌋ = ⌊√(σ^2 n)⌋
    let square = (&numerator * &numerator * Z::from(n)).div_floor(&(&denominator * &denominator));

    // the square root is approximated, hence the result is corrected
    let mut root = square.sqrt().floor();
    while &root * &root > square {
        root = root - Z::ONE;
    }
    while (&root + Z::ONE) * (&root + Z::ONE) <= square {
        root = root + Z::ONE;
    }
    Ok(root)
}

/// Computes `⌊exp(-x / α) * 2^n⌋` for `x >= 0` and `α = numerator / denominator > 0`.
///
/// The Taylor series of `exp(x / α)` is evaluated in fixed point arithmetic
/// until the terms vanish and the result is inverted afterwards.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::taylor_exp;
/// use qfall_math::integer::Z;
///
/// // exp(-1/2) * 2^10 = 621.08...
/// let value = taylor_exp(&Z::ONE, &Z::from(2), &Z::ONE, 10);
///
/// assert_eq!(Z::from(621), value);
/// ```
pub fn taylor_exp(x: &Z, numerator: &Z, denominator: &Z, n: u64) -> Z {
    let guard_bits = n + 64;
    let one = match pow2(guard_bits) {
        Ok(one) => one,
        Err(_) => return Z::ZERO,
    };

    let mut sum = one.clone();
    let mut term = one;
    let mut k = Z::ONE;
    let step_numerator = x * denominator;
    while term > Z::ZERO {
        term = (term * &step_numerator).div_floor(&(numerator * &k));
        sum = sum + &term;
        k = k + Z::ONE;
    }

    match pow2(guard_bits + n) {
        Ok(scaled_one) => scaled_one.div_floor(&sum),
        Err(_) => Z::ZERO,
    }
}

/// [`ExpTable`] stores `exp(-2^i / (2σ^2))` for `i = 0, ..., 2 * bits(⌊σ√n⌋)`
/// to decide `u > exp(-c / (2σ^2))` with few multiplications.
#[derive(Debug, Clone)]
pub struct ExpTable {
    pre_exp: Vec<f64>,
    two_sigma_sq_numerator: Z,
    two_sigma_sq_denominator: Z,
}

impl ExpTable {
    /// Precomputes the table for standard deviation `sigma` and precision `n`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `sigma <= 0`.
    pub fn new(sigma: &Q, n: u64) -> Result<Self, FEError> {
        let (numerator, denominator) = sigma_fraction(sigma)?;
        let two_sigma_sq_numerator = Z::from(2) * &numerator * &numerator;
        let two_sigma_sq_denominator = &denominator * &denominator;

        let max_bits = 2 * tail_cut(sigma, n)?.bits();
        let mut pre_exp = Vec::with_capacity(max_bits as usize + 1);
        let mut power = Z::ONE;
        for _ in 0..=max_bits {
            let exponent = ratio_to_f64(
                &(&power * &two_sigma_sq_denominator),
                &two_sigma_sq_numerator,
            );
            pre_exp.push((-exponent).exp());
            power = power * Z::from(2);
        }

        Ok(Self {
            pre_exp,
            two_sigma_sq_numerator,
            two_sigma_sq_denominator,
        })
    }

    /// Decides whether `u > exp(-c / (2σ^2))` for `c >= 0`.
    ///
    /// The bits of `c` are processed from the most significant one, while
    /// an upper and a lower bound on the exponential are refined until
    /// `u` lies outside of them.
    /// The comparison is computed in [`f64`] and hence exact up to `53` bits,
    /// independent of the precision `n` of the table.
    pub fn is_exp_greater(&self, u: f64, c: &Z) -> bool {
        let bits = bit_decomposition(c);
        let max_bits = bits.len();
        if max_bits >= self.pre_exp.len() {
            let exponent = ratio_to_f64(
                &(c * &self.two_sigma_sq_denominator),
                &self.two_sigma_sq_numerator,
            );
            return u > (-exponent).exp();
        }

        // exp(-(2^max_bits - 1) / (2σ^2)) is the smallest possible value
        let mut upper = 1.0;
        let mut lower = self.pre_exp[max_bits] / self.pre_exp[0];
        if lower > u {
            return false;
        }

        for i in (0..max_bits).rev() {
            if bits[i] {
                upper *= self.pre_exp[i];
                if u > upper {
                    return true;
                }
            } else {
                lower /= self.pre_exp[i];
                if lower > u {
                    return false;
                }
            }
        }

        false
    }
}

/// Returns the arithmetic mean of `samples`.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::mean;
/// use qfall_math::integer::Z;
///
/// assert_eq!(0.5, mean(&[Z::from(-1), Z::from(2)]));
/// ```
pub fn mean(samples: &[Z]) -> f64 {
    let sum = samples.iter().fold(Z::ZERO, |sum, value| sum + value);
    ratio_to_f64(&sum, &Z::from(samples.len() as u64))
}

/// Returns the mean of the squares of `samples`, i.e. the variance
/// of a distribution centered at `0`.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::variance;
/// use qfall_math::integer::Z;
///
/// assert_eq!(2.5, variance(&[Z::from(-1), Z::from(2)]));
/// ```
pub fn variance(samples: &[Z]) -> f64 {
    let squares = samples
        .iter()
        .fold(Z::ZERO, |sum, value| sum + value * value);
    ratio_to_f64(&squares, &Z::from(samples.len() as u64))
}


#[cfg(test)]
mod test_taylor_exp {
    use super::taylor_exp;
    use qfall_math::integer::Z;

    /// Checks `exp(0) = 1` and precomputed values.
    #[test]
    fn values() {
        assert_eq!(Z::from(1 << 20), taylor_exp(&Z::ZERO, &Z::ONE, &Z::ONE, 20));
        // exp(-2) * 2^30 = 145315153.6...
        assert_eq!(
            Z::from(145315153),
            taylor_exp(&Z::from(4), &Z::from(2), &Z::ONE, 30)
        );
        // exp(-8 * 2 / 9) * 2^40 = 185832105537.9...
        let value = taylor_exp(&Z::from(8), &Z::from(9), &Z::from(2), 40);
        assert!(value >= Z::from(185832105537_i64) && value <= Z::from(185832105538_i64));
    }

    /// Checks that large exponents vanish.
    #[test]
    fn underflow() {
        assert_eq!(Z::ZERO, taylor_exp(&Z::from(200), &Z::ONE, &Z::ONE, 64));
    }
}

#[cfg(test)]
mod test_exp_table {
    use super::ExpTable;
    use qfall_math::{integer::Z, rational::Q};

    /// Compares the lazy comparison with a direct evaluation.
    #[test]
    fn matches_direct_evaluation() {
        let sigma = Q::from(10);
        let table = ExpTable::new(&sigma, 64).unwrap();

        for c in [0_i64, 1, 7, 50, 199, 200, 201, 1000, 6399] {
            let exp = (-(c as f64) / 200.0).exp();
            for u in [0.0, 0.01, 0.3, 0.5, 0.99] {
                if (u - exp).abs() > 1e-9 {
                    assert_eq!(u > exp, table.is_exp_greater(u, &Z::from(c)));
                }
            }
        }
    }

    /// Ensures values beyond the precomputed range are handled.
    #[test]
    fn beyond_table() {
        let table = ExpTable::new(&Q::from(1), 4).unwrap();

        assert!(table.is_exp_greater(0.1, &Z::from(1 << 20)));
        assert!(!table.is_exp_greater(0.0, &Z::from(1 << 20)));
    }

    /// Ensures non-positive standard deviations are rejected.
    #[test]
    fn invalid_sigma() {
        assert!(ExpTable::new(&Q::from(0), 64).is_err());
        assert!(ExpTable::new(&Q::from(-1), 64).is_err());
    }
}
