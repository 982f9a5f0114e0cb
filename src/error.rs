// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains the error type [`FEError`] returned by every
//! fallible function of this crate.

use qfall_math::error::MathError;
use thiserror::Error;

/// [`FEError`] lists the failures that can occur while setting up, running
/// or sampling for a functional encryption scheme.
///
/// Configuration failures ([`FEError::PrimeGenFailed`], [`FEError::ParamGenFailed`])
/// are returned by constructors and are never retried internally beyond the
/// fixed number of attempts documented by the respective function.
///
/// # Examples
/// ```
/// use qfall_fe::error::FEError;
///
/// let err = FEError::BoundCheckFailed(String::from("x_2 = 1024 exceeds the bound 1024"));
/// assert_eq!("bound check failed: x_2 = 1024 exceeds the bound 1024", err.to_string());
/// ```
#[derive(Debug, Error)]
pub enum FEError {
    /// No prime with the requested properties could be found.
    #[error("prime generation failed: {0}")]
    PrimeGenFailed(String),

    /// The requested parameters cannot yield a correct and decryptable instance.
    #[error("parameter generation failed: {0}")]
    ParamGenFailed(String),

    /// A precondition of a constructor is violated.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// The dimension or shape of an input does not match the instance.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An entry of an input or a decrypted value lies outside the declared bound.
    #[error("bound check failed: {0}")]
    BoundCheckFailed(String),

    /// The discrete logarithm does not exist within the searched range.
    #[error("discrete logarithm not found within the given bound")]
    DlogNotFound,

    /// The discrete logarithm could not be computed for the given query.
    #[error("discrete logarithm calculation failed: {0}")]
    DlogCalcFailed(String),

    /// Key material could not be generated with the required properties.
    #[error("key generation failed: {0}")]
    KeyGenFailed(String),

    #[error(transparent)]
    Math(#[from] MathError),
}

#[cfg(test)]
mod test_fe_error {
    use super::FEError;
    use qfall_math::error::MathError;

    /// Ensures that a [`MathError`] can be propagated with `?`.
    #[test]
    fn from_math_error() {
        fn propagate() -> Result<(), FEError> {
            Err(MathError::InvalidIntegerInput(String::from("test")))?
        }

        assert!(matches!(propagate(), Err(FEError::Math(_))));
    }

    /// Checks that messages carry their context.
    #[test]
    fn display() {
        let err = FEError::ParamGenFailed(String::from("sigma too small"));

        assert_eq!("parameter generation failed: sigma too small", err.to_string());
        assert_eq!(
            "discrete logarithm not found within the given bound",
            FEError::DlogNotFound.to_string()
        );
    }
}
