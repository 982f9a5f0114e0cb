// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the adaptively secure
//! inner-product functional encryption scheme based on Paillier's
//! composite residuosity assumption from [\[2\]](<index.html#:~:text=[2]>).
//!
//! Decryption recovers the inner product directly, no discrete logarithm
//! has to be computed.

use super::{
    check_bound, check_dimension, check_result, column_vector, entries, inner_product,
    InnerProductFE,
};
use crate::{
    error::FEError,
    primitive::group::{get_prime, pow_mod},
    sample::distribution::discrete_gauss::{
        DiscreteGaussSampler, NormalConvolutionConstant, SIGMA_CDT,
    },
    utils::numeric::{center, pow2},
};
use qfall_math::{
    integer::{MatZ, Z},
    traits::{Gcd, Pow},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// This struct manages and stores the public parameters of a [`Paillier`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the length of the encrypted vectors
/// - `n`: the product of two safe primes
/// - `n_square`: the modulus `n^2` of all computations
/// - `bound_x`, `bound_y`: the bounds on the entries of `x` and `y`
/// - `g`: a generator of the subgroup of `2n`-th residues in `Z_{n^2}^*`
/// - `k_sigma`: the standard deviation of the master secret key
///   is `k_sigma * σ_cdt`
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{InnerProductFE, Paillier};
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let paillier = Paillier::new(2, 64, 64, 100, 100).unwrap();
/// let (mpk, msk) = paillier.gen().unwrap();
///
/// let x = MatZ::from_str("[[-12],[30]]").unwrap();
/// let y = MatZ::from_str("[[4],[1]]").unwrap();
///
/// let key = paillier.derive_key(&msk, &y).unwrap();
/// let cipher = paillier.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-18), paillier.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paillier {
    l: usize,
    n: Z,
    n_square: Z,
    bound_x: Z,
    bound_y: Z,
    g: Z,
    k_sigma: Z,
}

impl Paillier {
    /// Generates a new [`Paillier`] instance.
    ///
    /// Parameters:
    /// - `l`: the length of the encrypted vectors
    /// - `lambda`: the security parameter
    /// - `bit_len`: the bit length of both safe primes composing `n`
    /// - `bound_x`: the bound on the entries of encrypted vectors `x`
    /// - `bound_y`: the bound on the entries of key vectors `y`
    ///
    /// Returns a new [`Paillier`] instance or a [`FEError`] if `n` is too
    /// small for the given bounds.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::Paillier;
    ///
    /// let paillier = Paillier::new(3, 64, 64, 1 << 10, 1 << 10).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`ParamGenFailed`](FEError::ParamGenFailed)
    /// if `l == 0`, a bound is not positive, `l * bound_x^2 >= n`,
    /// `l * bound_y^2 >= n`, or the sampled generator is not invertible.
    /// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
    /// if no safe prime of `bit_len` bits was found.
    pub fn new(
        l: usize,
        lambda: u64,
        bit_len: u64,
        bound_x: impl Into<Z>,
        bound_y: impl Into<Z>,
    ) -> Result<Self, FEError> {
        let bound_x: Z = bound_x.into();
        let bound_y: Z = bound_y.into();
        if l == 0 || bound_x < Z::ONE || bound_y < Z::ONE {
            return Err(FEError::ParamGenFailed(format!(
                "vectors of length {l} with bounds {bound_x} and {bound_y} are not supported"
            )));
        }

        let p = get_prime(bit_len, true)?;
        let q = get_prime(bit_len, true)?;
        let n = p * q;
        let n_square = &n * &n;

        let l_z = Z::from(l as u64);
        if &l_z * &bound_x * &bound_x >= n || &l_z * &bound_y * &bound_y >= n {
            return Err(FEError::ParamGenFailed(format!(
                "n with {} bits is too small for the given bounds",
                n.bits()
            )));
        }

        // g = (g'^n)^2 generates the 2n-th residues
        let g_prime = Z::sample_uniform(0, &n_square)?;
        let g = pow_mod(&pow_mod(&g_prime, &n, &n_square)?, &Z::from(2), &n_square)?;
        if g.gcd(&n_square) != Z::ONE {
            return Err(FEError::ParamGenFailed(String::from(
                "the sampled generator is not invertible",
            )));
        }

        // σ = √(λ * n^5) + 2, rounded up to a multiple k * σ_cdt
        let sigma = (Z::from(lambda) * n.pow(5)?).sqrt().floor() + Z::from(2);
        let precision = 52;
        let inv_sigma_cdt = Z::from((SIGMA_CDT.recip() * 2f64.powi(precision)) as u64);
        let k_sigma = (sigma * inv_sigma_cdt).div_floor(&pow2(precision as u64)?) + Z::ONE;
        debug!(l, lambda, bit_len, sigma_bits = k_sigma.bits(), "generated Paillier parameters");

        Ok(Self {
            l,
            n,
            n_square,
            bound_x,
            bound_y,
            g,
            k_sigma,
        })
    }

    /// Returns the composite modulus `n`.
    pub fn get_n(&self) -> &Z {
        &self.n
    }

    /// Returns the largest inner product in absolute value, which
    /// can be encrypted.
    fn inner_product_bound(&self) -> Z {
        Z::from(self.l as u64) * &self.bound_x * &self.bound_y
    }
}

impl InnerProductFE for Paillier {
    type MasterPublicKey = MatZ;
    type MasterSecretKey = MatZ;
    type FunctionalKey = Z;
    type Cipher = MatZ;

    /// Generates a master key pair by following these steps:
    /// - s <- D_{k_sigma * σ_cdt}^l
    /// - mpk_i = g^{s_i} mod n^2
    ///
    /// Then, `mpk` and `msk = s` are output.
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let sampler = NormalConvolutionConstant::new(&self.k_sigma)
            .map_err(|err| FEError::KeyGenFailed(err.to_string()))?;
        let msk = sampler.sample_vec(self.l)?;

        let mpk = entries(&msk)?
            .iter()
            .map(|s_i| pow_mod(&self.g, s_i, &self.n_square))
            .collect::<Result<Vec<Z>, FEError>>()?;

        Ok((column_vector(&mpk)?, msk))
    }

    /// Derives the functional key `⟨s, y⟩` for `y`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` or `msk` are no column vectors of length `l`.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound_y)?;
        check_dimension(msk, self.l)?;

        inner_product(msk, y)
    }

    /// Encrypts `x` by following these steps:
    /// - r <- [0, n/4)
    /// - c_0 = g^r
    /// - c_i = (1 + x_i * n) * mpk_i^r mod n^2
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `x` or `mpk` are no column vectors of length `l`.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `x` is out of bounds.
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError> {
        check_dimension(x, self.l)?;
        check_bound(x, &self.bound_x)?;
        check_dimension(mpk, self.l)?;
        let n_square = &self.n_square;

        let r = Z::sample_uniform(0, &self.n.div_floor(&Z::from(4)))?;
        let mut cipher = vec![pow_mod(&self.g, &r, n_square)?];
        for (mpk_i, x_i) in entries(mpk)?.iter().zip(entries(x)?.iter()) {
            let c_i = (Z::ONE + x_i * &self.n) * pow_mod(mpk_i, &r, n_square)?;
            cipher.push(c_i.modulo(n_square));
        }

        column_vector(&cipher)
    }

    /// Decrypts `⟨x, y⟩` by computing `d = c_0^{-key} * Π c_i^{y_i} mod n^2`
    /// and the centered representative of `(d - 1) / n`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` or `cipher` have the wrong dimensions.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds or the result exceeds
    /// `l * bound_x * bound_y`, i.e. `key` does not belong to `y`.
    /// - Returns a [`FEError`] of type [`Math`](FEError::Math)
    /// if `c_0` is not invertible modulo `n^2`.
    fn dec(
        &self,
        cipher: &Self::Cipher,
        key: &Self::FunctionalKey,
        y: &MatZ,
    ) -> Result<Z, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound_y)?;
        check_dimension(cipher, self.l + 1)?;
        let n_square = &self.n_square;
        let cipher = entries(cipher)?;

        let mut d = pow_mod(&cipher[0], &(Z::ZERO - key), n_square)?;
        for (c_i, y_i) in cipher[1..].iter().zip(entries(y)?.iter()) {
            d = (d * pow_mod(c_i, y_i, n_square)?).modulo(n_square);
        }

        let d = (d - Z::ONE).modulo(n_square).div_floor(&self.n);
        check_result(center(&d, &self.n), &self.inner_product_bound())
    }
}
