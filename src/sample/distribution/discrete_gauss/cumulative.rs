// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains a discrete Gaussian sampler based on a
//! precomputed cumulative distribution table.

use super::{sigma_fraction, tail_cut, taylor_exp, DiscreteGaussSampler};
use crate::error::FEError;
use qfall_math::{integer::Z, rational::Q};
use tracing::debug;

/// [`NormalCumulative`] samples from the discrete Gaussian distribution
/// with standard deviation `σ` via a table of the cumulative distribution.
///
/// The table stores `T[0] = 0` and `T[i+1] = T[i] + ⌊ρ(i) * 2^n⌋` with
/// `ρ(i) = exp(-i^2 / (2σ^2))` for `0 <= i <= ⌊σ√n⌋`. A uniform value
/// `u ∈ [0, T[last])` is mapped to the number of table entries `T[i] <= u`
/// with `i >= 1`, scanning the whole table for every sample.
/// For a two-sided sampler `ρ(0)` is halved and `u` is sampled from twice
/// the range, where the upper half yields negative samples.
///
/// Attributes:
/// - `table`: the cumulative table `T`
/// - `two_sided`: specifies whether negative values are sampled
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalCumulative};
///
/// let sampler = NormalCumulative::new(10, 256, true).unwrap();
///
/// let sample = sampler.sample().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NormalCumulative {
    table: Vec<Z>,
    two_sided: bool,
}

impl NormalCumulative {
    /// Precomputes the cumulative table for standard deviation `sigma`.
    ///
    /// Parameters:
    /// - `sigma`: the standard deviation
    /// - `n`: the precision in bits of the table entries, which also
    ///   determines the tail cut `⌊σ√n⌋`
    /// - `two_sided`: specifies whether negative values are sampled
    ///
    /// Returns a new [`NormalCumulative`] sampler or a [`FEError`]
    /// if `sigma <= 0`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `sigma <= 0`.
    pub fn new(sigma: impl Into<Q>, n: u64, two_sided: bool) -> Result<Self, FEError> {
        let sigma: Q = sigma.into();
        let (numerator, denominator) = sigma_fraction(&sigma)?;
        let cut = i64::try_from(&(tail_cut(&sigma, n)? + Z::ONE)).map_err(|_| {
            FEError::PreconditionFailed(format!(
                "the standard deviation {sigma} is too large for a cumulative table"
            ))
        })?;

        // ρ(i) = exp(-i^2 / α) with α = 2σ^2
        let alpha_numerator = Z::from(2) * &numerator * &numerator;
        let alpha_denominator = &denominator * &denominator;

        let mut table = Vec::with_capacity(cut as usize + 1);
        table.push(Z::ZERO);
        for i in 0..cut {
            let mut value = taylor_exp(
                &Z::from(i * i),
                &alpha_numerator,
                &alpha_denominator,
                n,
            );
            // 0 is sampled with both signs
            if i == 0 && two_sided {
                value = value.div_floor(&Z::from(2));
            }
            let entry = &table[i as usize] + value;
            table.push(entry);
        }
        debug!(entries = table.len(), "precomputed cumulative table");

        if table[table.len() - 1] == Z::ZERO {
            return Err(FEError::PreconditionFailed(format!(
                "the precision {n} is too small to represent the distribution"
            )));
        }

        Ok(Self { table, two_sided })
    }

    /// Returns the total weight `T[last]` of the table.
    fn total(&self) -> &Z {
        &self.table[self.table.len() - 1]
    }
}

impl DiscreteGaussSampler for NormalCumulative {
    /// Draws a sample, which is non-negative if the sampler is one-sided.
    fn sample(&self) -> Result<Z, FEError> {
        let total = self.total();
        let range = if self.two_sided {
            Z::from(2) * total
        } else {
            total.clone()
        };

        let mut u = Z::sample_uniform(0, &range)?;
        let negative = self.two_sided && &u >= total;
        if negative {
            u = u - total;
        }

        let value = self.table[1..].iter().filter(|entry| *entry <= &u).count();
        let value = Z::from(value as u64);

        Ok(if negative { Z::ZERO - value } else { value })
    }
}

#[cfg(test)]
mod test_normal_cumulative {
    use super::NormalCumulative;
    use crate::{
        sample::distribution::discrete_gauss::{mean, variance, DiscreteGaussSampler},
        utils::numeric::pow2,
    };
    use qfall_math::integer::Z;

    /// Checks mean and variance for `σ = 10` of the two-sided sampler.
    #[test]
    fn moments_two_sided() {
        let sampler = NormalCumulative::new(10, 256, true).unwrap();

        let samples: Vec<Z> = (0..10000).map(|_| sampler.sample().unwrap()).collect();

        let mean = mean(&samples);
        let variance = variance(&samples);
        assert!(mean > -2.0 && mean < 2.0);
        assert!(variance > 90.0 && variance < 110.0);
    }

    /// Ensures the one-sided sampler only yields values within the tail cut.
    #[test]
    fn one_sided_range() {
        let sampler = NormalCumulative::new(1, 64, false).unwrap();

        for _ in 0..1000 {
            let sample = sampler.sample().unwrap();
            assert!(sample >= Z::ZERO);
            assert!(sample <= Z::from(8));
        }
    }

    /// Checks the first table entries for `σ = 1`.
    #[test]
    fn table_entries() {
        let sampler = NormalCumulative::new(1, 64, false).unwrap();
        let two_sided = NormalCumulative::new(1, 64, true).unwrap();

        assert_eq!(10, sampler.table.len());
        assert_eq!(Z::ZERO, sampler.table[0]);
        assert_eq!(pow2(64).unwrap(), sampler.table[1]);
        assert_eq!(pow2(63).unwrap(), two_sided.table[1]);
    }

    /// Ensures non-positive standard deviations are rejected.
    #[test]
    fn invalid_sigma() {
        assert!(NormalCumulative::new(0, 64, true).is_err());
        assert!(NormalCumulative::new(-2.5, 64, true).is_err());
    }
}
