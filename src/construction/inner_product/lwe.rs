// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the selectively secure
//! inner-product functional encryption scheme based on the
//! learning with errors problem from [\[1\]](<index.html#:~:text=[1]>).

use super::{check_bound, check_dimension, check_matrix, check_result, entries, InnerProductFE};
use crate::{
    error::FEError,
    primitive::group::get_prime,
    sample::distribution::{
        discrete_gauss::{DiscreteGaussSampler, NormalConvolution},
        uniform::sample_bits_vec,
    },
    utils::numeric::center,
};
use qfall_math::{
    integer::{MatZ, Z},
    integer_mod_q::{MatZq, Modulus},
    rational::Q,
    traits::SetEntry,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// This struct manages and stores the public parameters of a [`Lwe`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the length of the encrypted vectors
/// - `n`: the dimension of the LWE secrets
/// - `m`: the number of LWE samples in the master public key
/// - `bound_x`, `bound_y`: the bounds on the entries of `x` and `y`
/// - `p`: the modulus of the message space
/// - `q`: the modulus of the LWE samples
/// - `sigma_q`: the standard deviation of the LWE error
/// - `mat_a`: the uniform random matrix `A ∈ Z_q^{m x n}`
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{InnerProductFE, Lwe};
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let lwe = Lwe::new(2, 8, 10, 10).unwrap();
/// let (mpk, msk) = lwe.gen().unwrap();
///
/// let x = MatZ::from_str("[[9],[-4]]").unwrap();
/// let y = MatZ::from_str("[[-2],[3]]").unwrap();
///
/// let key = lwe.derive_key(&msk, &y).unwrap();
/// let cipher = lwe.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-30), lwe.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lwe {
    l: usize,
    n: usize,
    m: usize,
    bound_x: Z,
    bound_y: Z,
    p: Z,
    q: Modulus,
    sigma_q: Z,
    mat_a: MatZq,
}

impl Lwe {
    /// Generates a new [`Lwe`] instance, i.e. the moduli `p` and `q`,
    /// the number of samples `m`, the error parameter and the public matrix `A`.
    ///
    /// Parameters:
    /// - `l`: the length of the encrypted vectors
    /// - `n`: the dimension of the LWE secrets
    /// - `bound_x`: the bound on the entries of encrypted vectors `x`
    /// - `bound_y`: the bound on the entries of key vectors `y`
    ///
    /// Returns a new [`Lwe`] instance or a [`FEError`] if the resulting error
    /// parameter is too small for the hardness of LWE.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::Lwe;
    ///
    /// let lwe = Lwe::new(4, 16, 100, 100).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`ParamGenFailed`](FEError::ParamGenFailed)
    /// if `l == 0`, `n == 0`, a bound is not positive,
    /// or `σ_q / (bound_x * √l + 1) <= 2√n`.
    /// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
    /// if `p` or `q` could not be generated.
    pub fn new(
        l: usize,
        n: usize,
        bound_x: impl Into<Z>,
        bound_y: impl Into<Z>,
    ) -> Result<Self, FEError> {
        let bound_x: Z = bound_x.into();
        let bound_y: Z = bound_y.into();
        if l == 0 || n == 0 || bound_x < Z::ONE || bound_y < Z::ONE {
            return Err(FEError::ParamGenFailed(format!(
                "l = {l}, n = {n} with bounds {bound_x} and {bound_y} are not supported"
            )));
        }
        let l_z = Z::from(l as u64);
        let n_z = Z::from(n as u64);

        // p has to exceed the inner products of x and y
        let bits_p = bound_x.bits() + bound_y.bits() + l_z.bits() + 2;
        let p = get_prime(bits_p, false)?;

        // x = ((bound_x * √l + 1) * p * bound_y * 8n * √(n + l + 1))^{3/2}
        let val = Q::from(&bound_x) * l_z.sqrt() + Q::from(1);
        let x = &val
            * Q::from(&(&p * &bound_y * Z::from(8 * n as u64)))
            * Z::from((n + l + 1) as u64).sqrt();
        let bits_q = (&x * x.sqrt()).floor().bits() + 1;
        let q = get_prime(bits_q, false)?;

        let m = (n + l + 1) * bits_q as usize + 2 * n + 1;

        // σ_q = ⌈σ * q⌉ with σ = 1 / (2 * √(2lmn) * p * bound_y)
        let two_lmn = Z::from(2 * l as u64) * Z::from(m as u64) * &n_z;
        let sigma = 1 / (two_lmn.sqrt() * Q::from(&(Z::from(2) * &p * &bound_y)));
        let sigma_q = (sigma * Q::from(&q)).ceil();

        if Q::from(&sigma_q) / &val <= 2 * n_z.sqrt() {
            return Err(FEError::ParamGenFailed(format!(
                "the error parameter {sigma_q} is too small for n = {n}"
            )));
        }

        let q = Modulus::from(&q);
        let mat_a = MatZq::sample_uniform(m, n, &q);
        debug!(l, n, m, bits_p, bits_q, %sigma_q, "generated LWE parameters");

        Ok(Self {
            l,
            n,
            m,
            bound_x,
            bound_y,
            p,
            q,
            sigma_q,
            mat_a,
        })
    }

    /// Returns the number of LWE samples `m` of the master public key.
    pub fn get_m(&self) -> usize {
        self.m
    }

    /// Returns the modulus `q`.
    pub fn get_q(&self) -> &Modulus {
        &self.q
    }

    /// Returns the error parameter `σ_q`.
    pub fn get_sigma_q(&self) -> &Z {
        &self.sigma_q
    }

    /// Returns the largest inner product in absolute value, which
    /// can be encrypted.
    fn inner_product_bound(&self) -> Z {
        Z::from(self.l as u64) * &self.bound_x * &self.bound_y
    }
}

impl InnerProductFE for Lwe {
    type MasterPublicKey = MatZq;
    type MasterSecretKey = MatZq;
    type FunctionalKey = MatZq;
    type Cipher = (MatZq, MatZq);

    /// Generates a master key pair by following these steps:
    /// - S <- Z_q^{n x l}
    /// - E <- D_{σ_q}^{m x l}
    /// - PK = A * S + E
    ///
    /// Then, `mpk = PK` and `msk = S` are output.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::{InnerProductFE, Lwe};
    /// let lwe = Lwe::new(2, 8, 10, 10).unwrap();
    ///
    /// let (mpk, msk) = lwe.gen().unwrap();
    /// ```
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let mat_s = MatZq::sample_uniform(self.n, self.l, &self.q);

        let sampler = NormalConvolution::new(Q::from(&self.sigma_q), self.n as u64, 1)
            .map_err(|err| FEError::KeyGenFailed(err.to_string()))?;
        let mat_e = sampler.sample_mat(self.m, self.l)?;

        let mat_pk = &self.mat_a * &mat_s + MatZq::from((&mat_e, &self.q));

        Ok((mat_pk, mat_s))
    }

    /// Derives the functional key `S * y mod q` for `y`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` is no column vector of length `l` or `msk` is no `n x l` matrix.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound_y)?;
        check_matrix(msk, self.n, self.l)?;

        Ok(msk * y)
    }

    /// Encrypts `x` by following these steps:
    /// - r <- {0, 1}^m
    /// - c_0 = A^t * r
    /// - c_1 = PK^t * r + ⌊x * q / p⌋
    ///
    /// Then, `(c_0, c_1)` is output.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `x` is no column vector of length `l` or `mpk` is no `m x l` matrix.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `x` is out of bounds.
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError> {
        check_dimension(x, self.l)?;
        check_bound(x, &self.bound_x)?;
        check_matrix(mpk, self.m, self.l)?;
        let q = Z::from(&self.q);

        let vec_r = sample_bits_vec(self.m)?;
        let c_0 = self.mat_a.transpose() * &vec_r;

        // scale x_i to ⌊x_i * q / p⌋
        let mut vec_t = MatZ::new(self.l, 1);
        for (i, x_i) in entries(x)?.iter().enumerate() {
            vec_t.set_entry(i, 0, (x_i * &q).div_floor(&self.p))?;
        }
        let c_1 = mpk.transpose() * &vec_r + MatZq::from((&vec_t, &self.q));

        Ok((c_0, c_1))
    }

    /// Decrypts `⟨x, y⟩` by following these steps:
    /// - d = ⟨y, c_1⟩ - ⟨c_0, key⟩ mod q, centered around `0`
    /// - res = ⌊(d * p + ⌊q/2⌋) / q⌋
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y`, `key` or `cipher` have the wrong dimensions.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds or the result exceeds
    /// `l * bound_x * bound_y`, i.e. `key` does not belong to `y`.
    fn dec(
        &self,
        cipher: &Self::Cipher,
        key: &Self::FunctionalKey,
        y: &MatZ,
    ) -> Result<Z, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound_y)?;
        check_matrix(key, self.n, 1)?;
        let (c_0, c_1) = cipher;
        check_matrix(c_0, self.n, 1)?;
        check_matrix(c_1, self.l, 1)?;
        let q = Z::from(&self.q);

        let vec_y = MatZq::from((y, &self.q));
        let d = vec_y.dot_product(c_1)? - c_0.dot_product(key)?;
        let d = center(&d.get_value(), &q);

        let res = (d * &self.p + q.div_floor(&Z::from(2))).div_floor(&q);
        check_result(res, &self.inner_product_bound())
    }
}

#[cfg(test)]
mod test_lwe {
    use super::Lwe;
    use crate::{
        construction::inner_product::{inner_product, InnerProductFE},
        error::FEError,
        sample::distribution::uniform::sample_uniform_vec,
    };
    use qfall_math::integer::{MatZ, Z};
    use std::str::FromStr;

    /// Checks the full cycle of gen, derive_key, enc and dec
    /// for random vectors with `n = 16`.
    #[test]
    fn cycle_random_vectors() {
        let bound = Z::from(100);
        let lwe = Lwe::new(4, 16, &bound, &bound).unwrap();
        let (mpk, msk) = lwe.gen().unwrap();

        let lower = Z::ONE - &bound;
        let x = sample_uniform_vec(4, &lower, &bound).unwrap();
        let y = sample_uniform_vec(4, &lower, &bound).unwrap();
        let key = lwe.derive_key(&msk, &y).unwrap();
        let cipher = lwe.enc(&mpk, &x).unwrap();

        let res = lwe.dec(&cipher, &key, &y).unwrap();

        assert_eq!(inner_product(&x, &y).unwrap(), res);
    }

    /// Checks the full cycle for random vectors with `n = 64` and bound `1000`.
    #[test]
    fn cycle_dimension_64() {
        let bound = Z::from(1000);
        let lwe = Lwe::new(4, 64, &bound, &bound).unwrap();
        let (mpk, msk) = lwe.gen().unwrap();

        let lower = Z::ONE - &bound;
        let x = sample_uniform_vec(4, &lower, &bound).unwrap();
        let y = sample_uniform_vec(4, &lower, &bound).unwrap();
        let key = lwe.derive_key(&msk, &y).unwrap();
        let cipher = lwe.enc(&mpk, &x).unwrap();

        let res = lwe.dec(&cipher, &key, &y).unwrap();

        assert_eq!(inner_product(&x, &y).unwrap(), res);
    }

    /// Checks the full cycle for the extreme inner products.
    #[test]
    fn cycle_extreme_values() {
        let lwe = Lwe::new(2, 8, 10, 10).unwrap();
        let (mpk, msk) = lwe.gen().unwrap();

        let x = MatZ::from_str("[[9],[9]]").unwrap();
        let y = MatZ::from_str("[[-9],[-9]]").unwrap();
        let key = lwe.derive_key(&msk, &y).unwrap();
        let cipher = lwe.enc(&mpk, &x).unwrap();

        assert_eq!(Z::from(-162), lwe.dec(&cipher, &key, &y).unwrap());
    }

    /// Checks that the generated parameters satisfy the relations between
    /// `m`, `q` and `σ_q`.
    #[test]
    fn parameter_relations() {
        let lwe = Lwe::new(4, 16, 100, 100).unwrap();

        let bits_q = Z::from(lwe.get_q()).bits() as usize;

        assert_eq!((16 + 4 + 1) * bits_q + 33, lwe.get_m());
        assert!(lwe.get_sigma_q() > &Z::from(8 * 201));
    }

    /// Ensures that entries of `x` out of bounds are rejected during encryption.
    #[test]
    fn enc_out_of_bounds() {
        let lwe = Lwe::new(2, 8, 10, 10).unwrap();
        let (mpk, _) = lwe.gen().unwrap();

        let x = MatZ::from_str("[[10],[0]]").unwrap();

        assert!(matches!(
            lwe.enc(&mpk, &x),
            Err(FEError::BoundCheckFailed(_))
        ));
    }

    /// Ensures that a `y` of wrong length is rejected during key derivation.
    #[test]
    fn derive_key_wrong_dimension() {
        let lwe = Lwe::new(2, 8, 10, 10).unwrap();
        let (_, msk) = lwe.gen().unwrap();

        let y = MatZ::from_str("[[1, 2]]").unwrap();

        assert!(matches!(
            lwe.derive_key(&msk, &y),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Ensures that key material of another instance is rejected.
    #[test]
    fn foreign_public_key() {
        let lwe = Lwe::new(2, 8, 10, 10).unwrap();
        let other = Lwe::new(3, 8, 10, 10).unwrap();
        let (mpk, _) = other.gen().unwrap();

        let x = MatZ::from_str("[[1],[1]]").unwrap();

        assert!(matches!(
            lwe.enc(&mpk, &x),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Checks that the parameters survive serialization including `A`.
    #[test]
    fn serialize_parameters() {
        let lwe = Lwe::new(2, 8, 10, 10).unwrap();
        let (mpk, msk) = lwe.gen().unwrap();

        let json = serde_json::to_string(&lwe).unwrap();
        let lwe_deserialized: Lwe = serde_json::from_str(&json).unwrap();

        let x = MatZ::from_str("[[3],[4]]").unwrap();
        let y = MatZ::from_str("[[5],[6]]").unwrap();
        let key = lwe_deserialized.derive_key(&msk, &y).unwrap();
        let cipher = lwe.enc(&mpk, &x).unwrap();
        assert_eq!(Z::from(39), lwe_deserialized.dec(&cipher, &key, &y).unwrap());
    }
}
