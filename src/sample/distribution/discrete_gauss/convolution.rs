// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains a discrete Gaussian sampler for large standard
//! deviations, which are integer multiples of a small base deviation,
//! following [\[1\]](<../index.html#:~:text=[1]>).

use super::{sigma_fraction, DiscreteGaussSampler, ExpTable, NormalCumulative};
use crate::error::FEError;
use qfall_math::{integer::Z, rational::Q};
use rand::{thread_rng, Rng};
use tracing::trace;

/// [`NormalConvolution`] samples from the discrete Gaussian distribution with
/// standard deviation `σ = k * σ_0` for an integer `k`.
///
/// Per sample, the following steps are repeated until a value is accepted:
/// 1. `x` is sampled from the one-sided distribution with `σ_0`
/// 2. `y` is sampled uniformly from `[0, 2k)`, where `y >= k` flips the sign
///    and is reduced to `y - k`
/// 3. `sign * (k*x + y)` is accepted with probability `exp(-c / (2σ^2))`
///    for `c = (2*k*x + y) * y`
/// 4. an accepted `0` is only returned on a fair coin flip as it is reachable
///    with both signs
///
/// Attributes:
/// - `k`: the factor between `σ` and `σ_0`
/// - `base`: the one-sided [`NormalCumulative`] sampler with `σ_0`
/// - `exp`: the precomputed exponentials for `σ`
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalConvolution};
///
/// let sampler = NormalConvolution::new(10, 256, 1).unwrap();
///
/// let vec = sampler.sample_vec(5).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NormalConvolution {
    k: Z,
    base: NormalCumulative,
    exp: ExpTable,
}

impl NormalConvolution {
    /// Initializes a sampler with standard deviation `sigma` from a base
    /// sampler with standard deviation `base_sigma`.
    ///
    /// Parameters:
    /// - `sigma`: the standard deviation `σ`
    /// - `n`: the precision parameter of the precomputed tables
    /// - `base_sigma`: the standard deviation `σ_0` of the base sampler
    ///
    /// Returns a new [`NormalConvolution`] sampler or a [`FEError`] if
    /// `sigma` is no integer multiple of `base_sigma`.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::sample::distribution::discrete_gauss::NormalConvolution;
    ///
    /// assert!(NormalConvolution::new(9, 256, 1.5).is_ok());
    /// assert!(NormalConvolution::new(1.5, 256, 1).is_err());
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `sigma / base_sigma` is no integer or a standard deviation is not positive.
    pub fn new(sigma: impl Into<Q>, n: u64, base_sigma: impl Into<Q>) -> Result<Self, FEError> {
        let sigma: Q = sigma.into();
        let base_sigma: Q = base_sigma.into();
        let (sigma_numerator, sigma_denominator) = sigma_fraction(&sigma)?;
        let (base_numerator, base_denominator) = sigma_fraction(&base_sigma)?;

        // k = σ / σ_0 has to be integral
        let k_numerator = sigma_numerator * base_denominator;
        let k_denominator = sigma_denominator * base_numerator;
        let k = k_numerator.div_floor(&k_denominator);
        if &k * &k_denominator != k_numerator {
            return Err(FEError::PreconditionFailed(format!(
                "the standard deviation {sigma} is no integer multiple of {base_sigma}"
            )));
        }

        Ok(Self {
            k,
            base: NormalCumulative::new(base_sigma, n, false)?,
            exp: ExpTable::new(&sigma, n)?,
        })
    }
}

impl DiscreteGaussSampler for NormalConvolution {
    fn sample(&self) -> Result<Z, FEError> {
        let mut rng = thread_rng();
        let twice_k = Z::from(2) * &self.k;

        loop {
            let x = self.base.sample()?;

            let mut y = Z::sample_uniform(0, &twice_k)?;
            let negative = y >= self.k;
            if negative {
                y = y - &self.k;
            }

            let kx = &self.k * &x;
            let c = (Z::from(2) * &kx + &y) * &y;
            let u: f64 = rng.gen();
            if self.exp.is_exp_greater(u, &c) {
                trace!("rejected convolution sample");
                continue;
            }

            let res = kx + y;
            if res == Z::ZERO && !rng.gen::<bool>() {
                continue;
            }
            return Ok(if negative { Z::ZERO - res } else { res });
        }
    }
}
