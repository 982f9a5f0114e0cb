// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains a discrete Gaussian sampler for standard deviations
//! `k * σ_cdt` on top of [`NormalCdt`](super::NormalCdt).

use super::{DiscreteGaussSampler, NormalCdt};
use crate::{error::FEError, utils::numeric::ratio_to_f64};
use qfall_math::integer::Z;
use rand::{thread_rng, Rng};

/// [`NormalConvolutionConstant`] samples from the discrete Gaussian
/// distribution with standard deviation `k * σ_cdt` for an integer `k >= 1`
/// and `σ_cdt = √(1/(2 ln 2))`.
///
/// The steps match [`NormalConvolution`](super::NormalConvolution) with a
/// [`NormalCdt`] base sampler. The acceptance probability simplifies to
/// `exp(-c / (2 k^2 σ_cdt^2)) = 2^{-c / k^2}`. A result `0` is only accepted
/// with negative sign, which halves its weight.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::{
///     DiscreteGaussSampler, NormalConvolutionConstant,
/// };
///
/// let sampler = NormalConvolutionConstant::new(100).unwrap();
///
/// let sample = sampler.sample().unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NormalConvolutionConstant {
    k: Z,
}

impl NormalConvolutionConstant {
    /// Initializes a sampler with standard deviation `k * σ_cdt`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `k < 1`.
    pub fn new(k: impl Into<Z>) -> Result<Self, FEError> {
        let k: Z = k.into();
        if k < Z::ONE {
            return Err(FEError::PreconditionFailed(format!(
                "the factor {k} has to be positive"
            )));
        }
        Ok(Self { k })
    }
}

impl DiscreteGaussSampler for NormalConvolutionConstant {
    fn sample(&self) -> Result<Z, FEError> {
        let mut rng = thread_rng();
        let twice_k = Z::from(2) * &self.k;
        let k_squared = &self.k * &self.k;

        loop {
            let x = Z::from(NormalCdt.sample_u64());

            let mut y = Z::sample_uniform(0, &twice_k)?;
            let negative = y >= self.k;
            if negative {
                y = y - &self.k;
            }

            let kx = &self.k * x;
            let c = (Z::from(2) * &kx + &y) * &y;
            let res = kx + y;

            let accept = rng.gen::<f64>() < (-ratio_to_f64(&c, &k_squared)).exp2();
            if accept && (negative || res != Z::ZERO) {
                return Ok(if negative { Z::ZERO - res } else { res });
            }
        }
    }
}
