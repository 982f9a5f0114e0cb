// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains a discrete Gaussian sampler using plain
//! rejection sampling on a symmetric interval.

use super::{tail_cut, DiscreteGaussSampler, ExpTable};
use crate::error::FEError;
use qfall_math::{integer::Z, rational::Q};
use rand::{thread_rng, Rng};

/// [`NormalNegative`] samples `x` uniformly from `[-⌊σ√n⌋, ⌊σ√n⌋]` and
/// accepts it with probability `exp(-x^2 / (2σ^2))`.
///
/// Attributes:
/// - `cut`: the tail cut `⌊σ√n⌋`
/// - `exp`: the precomputed exponentials for the acceptance test
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalNegative};
/// use qfall_math::integer::Z;
///
/// let sampler = NormalNegative::new(10, 256).unwrap();
///
/// let sample = sampler.sample().unwrap();
/// assert!(sample <= Z::from(160) && sample >= Z::from(-160));
/// ```
#[derive(Debug, Clone)]
pub struct NormalNegative {
    cut: Z,
    exp: ExpTable,
}

impl NormalNegative {
    /// Initializes a sampler with standard deviation `sigma` and
    /// precision parameter `n`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `sigma <= 0`.
    pub fn new(sigma: impl Into<Q>, n: u64) -> Result<Self, FEError> {
        let sigma: Q = sigma.into();
        let exp = ExpTable::new(&sigma, n)?;
        let cut = tail_cut(&sigma, n)?;

        Ok(Self { cut, exp })
    }
}

impl DiscreteGaussSampler for NormalNegative {
    fn sample(&self) -> Result<Z, FEError> {
        let mut rng = thread_rng();
        let upper = &self.cut + Z::ONE;
        let lower = Z::ZERO - &self.cut;

        loop {
            let x = Z::sample_uniform(&lower, &upper)?;
            let u: f64 = rng.gen();
            if !self.exp.is_exp_greater(u, &(&x * &x)) {
                return Ok(x);
            }
        }
    }
}

#[cfg(test)]
mod test_normal_negative {
    use super::NormalNegative;
    use crate::sample::distribution::discrete_gauss::{mean, variance, DiscreteGaussSampler};
    use qfall_math::integer::Z;

    /// Checks mean and variance for `σ = 10`.
    #[test]
    fn moments() {
        let sampler = NormalNegative::new(10, 256).unwrap();

        let samples: Vec<Z> = (0..10000).map(|_| sampler.sample().unwrap()).collect();

        let mean = mean(&samples);
        let variance = variance(&samples);
        assert!(mean > -2.0 && mean < 2.0);
        assert!(variance > 90.0 && variance < 110.0);
    }

    /// Ensures a tiny standard deviation almost always yields `0`.
    #[test]
    fn small_sigma() {
        let sampler = NormalNegative::new(0.1, 16).unwrap();

        let zeros = (0..100)
            .filter(|_| sampler.sample().unwrap() == Z::ZERO)
            .count();

        assert!(zeros > 95);
    }
}
