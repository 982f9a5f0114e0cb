// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the adaptively secure
//! inner-product functional encryption scheme based on the
//! learning with errors problem from [\[2\]](<index.html#:~:text=[2]>).

use super::{check_bound, check_dimension, check_matrix, check_result, entries, InnerProductFE};
use crate::{
    error::FEError,
    primitive::group::get_prime,
    sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalConvolution},
    utils::numeric::center,
};
use qfall_math::{
    integer::{MatZ, Z},
    integer_mod_q::{MatZq, Modulus},
    rational::Q,
    traits::{GetNumColumns, GetNumRows, Pow, SetEntry},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// This struct manages and stores the public parameters of a [`LweFullySecure`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the length of the encrypted vectors
/// - `n`: the dimension of the LWE secrets
/// - `m`: the number of rows of `A`
/// - `bound_x`, `bound_y`: the bounds on the entries of `x` and `y`
/// - `k`: the scaling bound `2 * l * bound_x * bound_y`
/// - `q`: the modulus of the LWE samples
/// - `sigma1`, `sigma2`: the standard deviations of the two halves
///   of the master secret key
/// - `sigma_q`: the standard deviation of the encryption error
/// - `mat_a`: the uniform random matrix `A ∈ Z_q^{m x n}`
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{InnerProductFE, LweFullySecure};
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let lwe = LweFullySecure::new(2, 16, 10, 10).unwrap();
/// let (mpk, msk) = lwe.gen().unwrap();
///
/// let x = MatZ::from_str("[[5],[-6]]").unwrap();
/// let y = MatZ::from_str("[[7],[8]]").unwrap();
///
/// let key = lwe.derive_key(&msk, &y).unwrap();
/// let cipher = lwe.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-13), lwe.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LweFullySecure {
    l: usize,
    n: usize,
    m: usize,
    bound_x: Z,
    bound_y: Z,
    k: Z,
    q: Modulus,
    sigma1: Z,
    sigma2: Z,
    sigma_q: Z,
    mat_a: MatZq,
}

impl LweFullySecure {
    /// Generates a new [`LweFullySecure`] instance.
    ///
    /// The bit length of `q` and the standard deviations depend on each other.
    /// Starting from a guess for the bit length of `q`, the standard deviations
    /// and the resulting bit length are recomputed until the bit length
    /// stops growing.
    ///
    /// Parameters:
    /// - `l`: the length of the encrypted vectors
    /// - `n`: the dimension of the LWE secrets
    /// - `bound_x`: the bound on the entries of encrypted vectors `x`
    /// - `bound_y`: the bound on the entries of key vectors `y`
    ///
    /// Returns a new [`LweFullySecure`] instance or a [`FEError`] if
    /// no suitable parameters were found.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::LweFullySecure;
    ///
    /// let lwe = LweFullySecure::new(4, 64, 1000, 1000).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`ParamGenFailed`](FEError::ParamGenFailed)
    /// if `l == 0`, `n < 2`, a bound is not positive or `q < K`.
    /// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
    /// if `q` could not be generated.
    pub fn new(
        l: usize,
        n: usize,
        bound_x: impl Into<Z>,
        bound_y: impl Into<Z>,
    ) -> Result<Self, FEError> {
        let bound_x: Z = bound_x.into();
        let bound_y: Z = bound_y.into();
        if l == 0 || n < 2 || bound_x < Z::ONE || bound_y < Z::ONE {
            return Err(FEError::ParamGenFailed(format!(
                "l = {l}, n = {n} with bounds {bound_x} and {bound_y} are not supported"
            )));
        }

        let k = Z::from(2 * l as u64) * &bound_x * &bound_y;
        let k_squared = &k * &k;
        let n_z = Z::from(n as u64);
        let log_n = n_z.log(2)?;
        let sqrt_log_n = log_n.sqrt();

        let mut bits_q: u64 = 1;
        let mut candidate: u64 = 1;
        let (sigma1, sigma2, sigma) = loop {
            // assume that q has at most `candidate` bits
            let bound_m = Z::from(n as u64 * candidate);
            let log_m = bound_m.log(2)?;
            let max = if k_squared < bound_m {
                Q::from(&k_squared)
            } else {
                Q::from(&bound_m)
            };

            let sigma1 = ((Q::from(&n_z) * &log_m).sqrt() * max.sqrt()).ceil();
            let sigma2 = (n_z.sqrt()
                * Q::from(&n_z.pow(3)?)
                * log_m.sqrt().pow(5)?
                * bound_m.sqrt()
                * &max)
                .ceil();

            // σ = 1 / (K^2 * (σ_1^2 + σ_2^2) * log n)
            let sigma_sum = Q::from(&(&sigma1 * &sigma1 + &sigma2 * &sigma2));
            let sigma = 1 / (Q::from(&k_squared) * sigma_sum * &log_n);

            // σ' = σ / (K * n^6 * bits(q)^2 * √(log n)^5)
            let sigma_prime = &sigma
                / (Q::from(&(&k * n_z.pow(6)? * Z::from(bits_q * bits_q)))
                    * sqrt_log_n.pow(5)?);
            bits_q = (&sqrt_log_n / sigma_prime).floor().bits() + 1;

            if bits_q < candidate {
                break (sigma1, sigma2, sigma);
            }
            candidate = bits_q + 1;
        };

        let q = get_prime(bits_q, false)?;
        if q < k {
            return Err(FEError::ParamGenFailed(format!(
                "the modulus {q} is smaller than K = {k}"
            )));
        }
        // m = ⌊1.01 * n * bits(q)⌋
        let m = 101 * n * bits_q as usize / 100;
        let sigma_q = (sigma * Q::from(&q)).ceil();

        let q = Modulus::from(&q);
        let mat_a = MatZq::sample_uniform(m, n, &q);
        debug!(l, n, m, bits_q, %sigma_q, "generated fully secure LWE parameters");

        Ok(Self {
            l,
            n,
            m,
            bound_x,
            bound_y,
            k,
            q,
            sigma1,
            sigma2,
            sigma_q,
            mat_a,
        })
    }

    /// Returns the number of rows `m` of `A`.
    pub fn get_m(&self) -> usize {
        self.m
    }

    /// Returns the modulus `q`.
    pub fn get_q(&self) -> &Modulus {
        &self.q
    }
}

impl InnerProductFE for LweFullySecure {
    type MasterPublicKey = MatZq;
    type MasterSecretKey = MatZ;
    type FunctionalKey = MatZq;
    type Cipher = (MatZq, MatZq);

    /// Generates a master key pair by following these steps:
    /// - Z ∈ Z^{l x m}, where the first `m/2` columns are sampled with `σ_1`
    ///   and the others with `σ_2` plus an embedded identity matrix
    /// - U = Z * A mod q
    ///
    /// Then, `mpk = U` and `msk = Z` are output.
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let key_gen_failed = |err: FEError| FEError::KeyGenFailed(err.to_string());
        let sampler1 =
            NormalConvolution::new(Q::from(&self.sigma1), self.n as u64, 1).map_err(key_gen_failed)?;
        let sampler2 =
            NormalConvolution::new(Q::from(&self.sigma2), self.n as u64, 1).map_err(key_gen_failed)?;
        let half = self.m / 2;

        let mut mat_z = MatZ::new(self.l, self.m);
        for i in 0..self.l {
            for j in 0..self.m {
                let entry = if j < half {
                    sampler1.sample()?
                } else if j - half == i {
                    sampler2.sample()? + Z::ONE
                } else {
                    sampler2.sample()?
                };
                mat_z.set_entry(i, j, entry)?;
            }
        }

        let mat_u = MatZq::from((&mat_z, &self.q)) * &self.mat_a;

        Ok((mat_u, mat_z))
    }

    /// Derives the functional key `z_y = Z^t * y mod q` for `y`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` is no column vector of length `l` or `msk` is no `l x m` matrix.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound_y)?;
        if msk.get_num_rows() != self.l as i64 || msk.get_num_columns() != self.m as i64 {
            return Err(FEError::MalformedInput(format!(
                "the master secret key has to be a {}x{} matrix",
                self.l, self.m
            )));
        }

        let z_y = msk.transpose() * y;
        Ok(MatZq::from((&z_y, &self.q)))
    }

    /// Encrypts `x` by following these steps:
    /// - s <- Z_q^n
    /// - e_0 <- D_{σ_q}^m, e_1 <- D_{σ_q}^l
    /// - c_0 = A * s + e_0
    /// - c_1 = U * s + e_1 + ⌊q/K⌋ * x
    ///
    /// Then, `(c_0, c_1)` is output.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `x` is no column vector of length `l` or `mpk` is no `l x n` matrix.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `x` is out of bounds.
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError> {
        check_dimension(x, self.l)?;
        check_bound(x, &self.bound_x)?;
        check_matrix(mpk, self.l, self.n)?;
        let q_div_k = Z::from(&self.q).div_floor(&self.k);

        let sampler = NormalConvolution::new(Q::from(&self.sigma_q), self.n as u64, 1)?;
        let vec_s = MatZq::sample_uniform(self.n, 1, &self.q);
        let vec_e_0 = sampler.sample_vec(self.m)?;
        let vec_e_1 = sampler.sample_vec(self.l)?;

        let mut vec_t = MatZ::new(self.l, 1);
        for (i, x_i) in entries(x)?.iter().enumerate() {
            vec_t.set_entry(i, 0, x_i * &q_div_k)?;
        }

        let c_0 = &self.mat_a * &vec_s + MatZq::from((&vec_e_0, &self.q));
        let c_1 = mpk * &vec_s + MatZq::from((&(vec_e_1 + vec_t), &self.q));

        Ok((c_0, c_1))
    }

    /// Decrypts `⟨x, y⟩` by following these steps:
    /// - μ = ⟨y, c_1⟩ - ⟨z_y, c_0⟩ mod q, centered around `0`
    /// - res = ⌊(μ + ⌊q/(2K)⌋) / ⌊q/K⌋⌋
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
        check_matrix(key, self.m, 1)?;
        let (c_0, c_1) = cipher;
        check_matrix(c_0, self.m, 1)?;
        check_matrix(c_1, self.l, 1)?;
        let q = Z::from(&self.q);

        let vec_y = MatZq::from((y, &self.q));
        let mu = vec_y.dot_product(c_1)? - key.dot_product(c_0)?;
        let mu = center(&mu.get_value(), &q);

        let q_div_k = q.div_floor(&self.k);
        let q_div_2k = q.div_floor(&(Z::from(2) * &self.k));
        let res = (mu + q_div_2k).div_floor(&q_div_k);

        let bound = Z::from(self.l as u64) * &self.bound_x * &self.bound_y;
        check_result(res, &bound)
    }
}

#[cfg(test)]
mod test_lwe_fully_secure {
    use super::LweFullySecure;
    use crate::{
        construction::inner_product::{inner_product, InnerProductFE},
        error::FEError,
        sample::distribution::uniform::sample_uniform_vec,
    };
    use qfall_math::{
        integer::{MatZ, Z},
        traits::{GetNumColumns, GetNumRows},
    };
    use std::str::FromStr;

    /// Checks the full cycle of gen, derive_key, enc and dec
    /// for random vectors with `n = 64`.
    #[test]
    fn cycle_random_vectors() {
        let bound = Z::from(1000);
        let lwe = LweFullySecure::new(4, 64, &bound, &bound).unwrap();
        let (mpk, msk) = lwe.gen().unwrap();

        let lower = Z::ONE - &bound;
        let x = sample_uniform_vec(4, &lower, &bound).unwrap();
        let y = sample_uniform_vec(4, &lower, &bound).unwrap();
        let key = lwe.derive_key(&msk, &y).unwrap();
        let cipher = lwe.enc(&mpk, &x).unwrap();

        let res = lwe.dec(&cipher, &key, &y).unwrap();

        assert_eq!(inner_product(&x, &y).unwrap(), res);
    }

    /// Checks the dimensions of the generated keys.
    #[test]
    fn key_dimensions() {
        let lwe = LweFullySecure::new(2, 16, 10, 10).unwrap();

        let (mpk, msk) = lwe.gen().unwrap();

        assert_eq!(2, msk.get_num_rows());
        assert_eq!(lwe.get_m() as i64, msk.get_num_columns());
        assert_eq!(2, mpk.get_num_rows());
        assert_eq!(16, mpk.get_num_columns());
    }

    /// Checks that the bit length of `q` has stabilized for
    /// the chosen parameters.
    #[test]
    fn modulus_size() {
        let lwe = LweFullySecure::new(4, 64, 1000, 1000).unwrap();

        let bits_q = Z::from(lwe.get_q()).bits();

        assert_eq!(235, bits_q);
        assert_eq!(101 * 64 * 235 / 100, lwe.get_m());
    }

    /// Ensures that entries of `x` out of bounds are rejected during encryption.
    #[test]
    fn enc_out_of_bounds() {
        let lwe = LweFullySecure::new(2, 16, 10, 10).unwrap();
        let (mpk, _) = lwe.gen().unwrap();

        let x = MatZ::from_str("[[0],[-10]]").unwrap();

        assert!(matches!(
            lwe.enc(&mpk, &x),
            Err(FEError::BoundCheckFailed(_))
        ));
    }

    /// Ensures that a `y` of wrong length is rejected during key derivation.
    #[test]
    fn derive_key_wrong_dimension() {
        let lwe = LweFullySecure::new(2, 16, 10, 10).unwrap();
        let (_, msk) = lwe.gen().unwrap();

        let y = MatZ::from_str("[[1],[2],[3]]").unwrap();

        assert!(matches!(
            lwe.derive_key(&msk, &y),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Ensures that too small dimensions are rejected.
    #[test]
    fn invalid_parameters() {
        assert!(LweFullySecure::new(2, 1, 10, 10).is_err());
        assert!(LweFullySecure::new(0, 16, 10, 10).is_err());
        assert!(LweFullySecure::new(2, 16, 0, 10).is_err());
    }
}
