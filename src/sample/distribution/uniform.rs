// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains functions to sample uniformly at random
//! integers, vectors and matrices from bounded intervals.

use crate::error::FEError;
use qfall_math::integer::{MatZ, Z};
use rand::{thread_rng, Rng};

/// Samples a column vector of length `len` with entries chosen uniformly at
/// random from `[lower, upper)`.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::uniform::sample_uniform_vec;
/// use qfall_math::integer::Z;
///
/// let vec = sample_uniform_vec(3, &Z::from(-1023), &Z::from(1024)).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`Math`](FEError::Math)
/// if `len == 0` or `lower >= upper`.
pub fn sample_uniform_vec(len: usize, lower: &Z, upper: &Z) -> Result<MatZ, FEError> {
    sample_uniform_mat(len, 1, lower, upper)
}

/// Samples a `rows x columns` matrix with entries chosen uniformly at
/// random from `[lower, upper)`.
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`Math`](FEError::Math)
/// if a dimension is `0` or `lower >= upper`.
pub fn sample_uniform_mat(
    rows: usize,
    columns: usize,
    lower: &Z,
    upper: &Z,
) -> Result<MatZ, FEError> {
    Ok(MatZ::sample_uniform(rows, columns, lower, upper)?)
}

/// Samples a column vector of length `len` with entries from `{0, 1}`.
///
/// # Examples
/// ```
/// use qfall_fe::sample::distribution::uniform::sample_bits_vec;
///
/// let bits = sample_bits_vec(128).unwrap();
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`Math`](FEError::Math) if `len == 0`.
pub fn sample_bits_vec(len: usize) -> Result<MatZ, FEError> {
    sample_uniform_vec(len, &Z::ZERO, &Z::from(2))
}

/// Returns a fair coin flip.
pub fn sample_bit() -> bool {
    thread_rng().gen()
}
