// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains a table based sampler for the one-sided discrete
//! Gaussian distribution with the fixed standard deviation [`SIGMA_CDT`].

use super::DiscreteGaussSampler;
use crate::error::FEError;
use qfall_math::integer::Z;
use rand::{thread_rng, Rng};

/// The standard deviation `√(1/(2 ln 2))` of [`NormalCdt`].
pub const SIGMA_CDT: f64 = 0.849_321_800_288_019_1;

/// Cumulative distribution table with `126`-bit precision,
/// stored as pairs of `63`-bit words `(low, high)`.
const CDT: [[u64; 2]; 9] = [
    [2200310400551559144, 3327841033070651387],
    [7912151619254726620, 380075531178589176],
    [5167367257772081627, 11604843442081400],
    [5081592746475748971, 90134450315532],
    [6522074513864805092, 175786317361],
    [2579734681240182346, 85801740],
    [8175784047440310133, 10472],
    [2947787991558061753, 0],
    [22489665999543, 0],
];

const CDT_LOW_MASK: u64 = 0x7fff_ffff_ffff_ffff;

/// [`NormalCdt`] samples from the one-sided discrete Gaussian distribution
/// over `{0, 1, 2, ...}` with standard deviation [`SIGMA_CDT`].
///
/// A uniform `126`-bit value is compared against every table entry without
/// branching on the value, such that the table access pattern is fixed.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalCdt};
/// use qfall_math::integer::Z;
///
/// let sample = NormalCdt.sample().unwrap();
///
/// assert!(sample >= Z::ZERO && sample <= Z::from(9));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalCdt;

impl NormalCdt {
    /// Draws a sample as a machine word.
    pub fn sample_u64(&self) -> u64 {
        let mut rng = thread_rng();
        let r1 = rng.gen::<u64>() & CDT_LOW_MASK;
        let r2 = rng.gen::<u64>() & CDT_LOW_MASK;

        // counts the entries with (r2, r1) < (high, low)
        CDT.iter().fold(0, |x, [low, high]| {
            let equal_high = (1 << 63) ^ (r2.wrapping_sub(*high) | high.wrapping_sub(r2));
            x + (((r1.wrapping_sub(*low) & equal_high) | r2.wrapping_sub(*high)) >> 63)
        })
    }
}

impl DiscreteGaussSampler for NormalCdt {
    fn sample(&self) -> Result<Z, FEError> {
        Ok(Z::from(self.sample_u64()))
    }
}
