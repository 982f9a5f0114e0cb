// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module provides the trait a struct should implement if it is an
//! instance of an inner-product functional encryption scheme.
//! Furthermore, it contains schemes implementing the [`InnerProductFE`] trait.
//!
//! A holder of the master secret key derives a functional key for a vector `y`.
//! This key decrypts an encryption of `x` to the inner product `⟨x, y⟩`
//! and reveals nothing else about `x`.
//!
//! The main references are listed in the following:
//! - \[1\] Abdalla, Michel and Bourse, Florian and De Caro, Angelo and Pointcheval, David (2015).
//! Simple Functional Encryption Schemes for Inner Products.
//! In: Public-Key Cryptography - PKC 2015.
//! <https://eprint.iacr.org/2015/017.pdf>
//! - \[2\] Agrawal, Shweta and Libert, Benoît and Stehlé, Damien (2016).
//! Fully Secure Functional Encryption for Inner Products, from Standard Assumptions.
//! In: Advances in Cryptology - CRYPTO 2016.
//! <https://eprint.iacr.org/2015/608.pdf>

mod damgard;
mod ddh;
mod lwe;
mod lwe_fully_secure;
mod paillier;
mod ring_lwe;
pub use damgard::{Damgard, DamgardSecretKey};
pub use ddh::Ddh;
pub use lwe::Lwe;
pub use lwe_fully_secure::LweFullySecure;
pub use paillier::Paillier;
pub use ring_lwe::RingLwe;

use crate::{
    error::FEError,
    primitive::dlog::{baby_step_count, BABY_STEP_GIANT_STEP_MAX_STEPS},
};
use qfall_math::{
    integer::{MatZ, Z},
    integer_mod_q::MatZq,
    traits::{GetEntry, GetNumColumns, GetNumRows, SetEntry},
};

/// This trait is implemented by all inner-product functional encryption schemes.
///
/// All vectors are column vectors of type [`MatZ`].
pub trait InnerProductFE {
    type MasterPublicKey;
    type MasterSecretKey;
    type FunctionalKey;
    type Cipher;

    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError>;
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError>;
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError>;
    fn dec(&self, cipher: &Self::Cipher, key: &Self::FunctionalKey, y: &MatZ)
        -> Result<Z, FEError>;
}

/// Checks whether `vec` is a column vector with `len` entries.
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::check_dimension;
/// use qfall_math::integer::MatZ;
/// use std::str::FromStr;
///
/// let vec = MatZ::from_str("[[1],[2],[3]]").unwrap();
///
/// assert!(check_dimension(&vec, 3).is_ok());
/// assert!(check_dimension(&vec, 2).is_err());
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
/// if `vec` has more than one column or not exactly `len` rows.
pub fn check_dimension(vec: &MatZ, len: usize) -> Result<(), FEError> {
    if vec.get_num_columns() != 1 || vec.get_num_rows() != len as i64 {
        return Err(FEError::MalformedInput(format!(
            "expected a column vector of length {len}, got a {}x{} matrix",
            vec.get_num_rows(),
            vec.get_num_columns()
        )));
    }
    Ok(())
}

/// Checks whether every entry of `vec` lies in `(-bound, bound)`.
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::check_bound;
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let vec = MatZ::from_str("[[9],[-9]]").unwrap();
///
/// assert!(check_bound(&vec, &Z::from(10)).is_ok());
/// assert!(check_bound(&vec, &Z::from(9)).is_err());
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
/// if an entry has absolute value `>= bound`.
pub fn check_bound(vec: &MatZ, bound: &Z) -> Result<(), FEError> {
    let lower = Z::ZERO - bound;
    for entry in entries(vec)? {
        if &entry >= bound || entry <= lower {
            return Err(FEError::BoundCheckFailed(format!(
                "the entry {entry} is not smaller than {bound} in absolute value"
            )));
        }
    }
    Ok(())
}

/// Computes the inner product of two column vectors over the integers.
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::inner_product;
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let x = MatZ::from_str("[[1],[2],[3]]").unwrap();
/// let y = MatZ::from_str("[[4],[-5],[6]]").unwrap();
///
/// assert_eq!(Z::from(12), inner_product(&x, &y).unwrap());
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
/// if the vectors differ in length or are no column vectors.
pub fn inner_product(x: &MatZ, y: &MatZ) -> Result<Z, FEError> {
    check_dimension(y, x.get_num_rows() as usize)?;
    let x = entries(x)?;
    let y = entries(y)?;

    Ok(x.iter().zip(y.iter()).fold(Z::ZERO, |acc, (x_i, y_i)| acc + x_i * y_i))
}

/// Checks whether `mat` is a `rows x columns` matrix.
pub(crate) fn check_matrix(mat: &MatZq, rows: usize, columns: usize) -> Result<(), FEError> {
    if mat.get_num_rows() != rows as i64 || mat.get_num_columns() != columns as i64 {
        return Err(FEError::MalformedInput(format!(
            "expected a {rows}x{columns} matrix, got a {}x{} matrix",
            mat.get_num_rows(),
            mat.get_num_columns()
        )));
    }
    Ok(())
}

/// Checks whether every value in `(-bound, bound)` is recovered uniquely
/// by a discrete logarithm search in a group of order `order`.
///
/// The non-negative and the negative range do not overlap modulo `order`
/// if `2 * bound < order`. Furthermore, the search must not exceed
/// [`BABY_STEP_GIANT_STEP_MAX_STEPS`] baby steps.
pub(crate) fn check_dlog_range(bound: &Z, order: &Z) -> Result<(), FEError> {
    if &(Z::from(2) * bound) >= order {
        return Err(FEError::ParamGenFailed(format!(
            "the range (-{bound}, {bound}) is ambiguous in a group of order {order}"
        )));
    }
    if baby_step_count(bound) > Z::from(BABY_STEP_GIANT_STEP_MAX_STEPS) {
        return Err(FEError::ParamGenFailed(format!(
            "the range (-{bound}, {bound}) requires more than \
            {BABY_STEP_GIANT_STEP_MAX_STEPS} baby steps"
        )));
    }
    Ok(())
}

/// Returns `res` if it lies in `[-bound, bound]`.
pub(crate) fn check_result(res: Z, bound: &Z) -> Result<Z, FEError> {
    if &res > bound || res < Z::ZERO - bound {
        return Err(FEError::BoundCheckFailed(format!(
            "the decrypted value {res} exceeds the maximal inner product {bound}"
        )));
    }
    Ok(res)
}

/// Returns the entries of a column vector.
pub(crate) fn entries(vec: &MatZ) -> Result<Vec<Z>, FEError> {
    if vec.get_num_columns() != 1 {
        return Err(FEError::MalformedInput(format!(
            "expected a column vector, got {} columns",
            vec.get_num_columns()
        )));
    }
    (0..vec.get_num_rows())
        .map(|i| Ok(vec.get_entry(i, 0)?))
        .collect()
}

/// Returns a column vector with the given entries.
pub(crate) fn column_vector(values: &[Z]) -> Result<MatZ, FEError> {
    let mut vec = MatZ::new(values.len(), 1);
    for (i, value) in values.iter().enumerate() {
        vec.set_entry(i, 0, value)?;
    }
    Ok(vec)
}

#[cfg(test)]
mod test_checks {
    use super::{
        check_bound, check_dimension, check_dlog_range, column_vector, entries, inner_product,
    };
    use crate::error::FEError;
    use qfall_math::{
        integer::{MatZ, Z},
        traits::Pow,
    };
    use std::str::FromStr;

    /// Ensures row vectors and matrices are rejected.
    #[test]
    fn dimension_of_matrices() {
        let row = MatZ::from_str("[[1, 2, 3]]").unwrap();
        let mat = MatZ::new(3, 2);

        assert!(matches!(
            check_dimension(&row, 3),
            Err(FEError::MalformedInput(_))
        ));
        assert!(matches!(
            check_dimension(&mat, 3),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Checks that the bound is exclusive on both sides.
    #[test]
    fn bound_is_exclusive() {
        let bound = Z::from(5);

        assert!(check_bound(&MatZ::from_str("[[4],[-4],[0]]").unwrap(), &bound).is_ok());
        assert!(matches!(
            check_bound(&MatZ::from_str("[[5]]").unwrap(), &bound),
            Err(FEError::BoundCheckFailed(_))
        ));
        assert!(matches!(
            check_bound(&MatZ::from_str("[[-5]]").unwrap(), &bound),
            Err(FEError::BoundCheckFailed(_))
        ));
    }

    /// Ensures that ranges overlapping modulo the group order are rejected.
    #[test]
    fn dlog_range_ambiguous() {
        let order = Z::from(1000);

        assert!(check_dlog_range(&Z::from(499), &order).is_ok());
        assert!(matches!(
            check_dlog_range(&Z::from(500), &order),
            Err(FEError::ParamGenFailed(_))
        ));
    }

    /// Ensures that ranges exceeding the discrete logarithm table are rejected.
    #[test]
    fn dlog_range_too_large() {
        let order = Z::from(2).pow(200).unwrap();

        assert!(check_dlog_range(&Z::from(2).pow(48).unwrap(), &order).is_ok());
        assert!(matches!(
            check_dlog_range(&(Z::from(2).pow(48).unwrap() + Z::ONE), &order),
            Err(FEError::ParamGenFailed(_))
        ));
    }

    /// Ensures vectors of different length have no inner product.
    #[test]
    fn inner_product_mismatch() {
        let x = MatZ::from_str("[[1],[2]]").unwrap();
        let y = MatZ::from_str("[[1],[2],[3]]").unwrap();

        assert!(inner_product(&x, &y).is_err());
    }

    /// Checks that entries are read and written in order.
    #[test]
    fn vector_entries() {
        let values = vec![Z::from(-7), Z::ZERO, Z::from(42)];

        let vec = column_vector(&values).unwrap();

        assert_eq!(values, entries(&vec).unwrap());
    }
}
