// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the inner-product functional
//! encryption scheme based on the ring learning with errors problem
//! over `R_q = Z_q[X]/(X^n + 1)`.
//!
//! A message is a `l x n` matrix `X`, whose rows are encrypted as
//! polynomials of `R_q`. A key for `y` decrypts to `y^t * X`.
//! Vectors `x` are encrypted as the first column of `X`.

use super::{check_bound, check_dimension, check_result, column_vector, entries, InnerProductFE};
use crate::{
    error::FEError,
    sample::distribution::discrete_gauss::{DiscreteGaussSampler, NormalCumulative},
    utils::numeric::center,
};
use qfall_math::{
    integer::{MatZ, PolyOverZ, Z},
    integer_mod_q::{ModulusPolynomialRingZq, PolyOverZq, PolynomialRingZq},
    rational::Q,
    traits::{GetCoefficient, GetEntry, GetNumColumns, GetNumRows, SetCoefficient, SetEntry},
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// This struct manages and stores the public parameters of a [`RingLwe`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the number of rows of encrypted matrices
/// - `n`: the degree of the ring modulus `X^n + 1`
/// - `bound`: the bound on the entries of `X` and `y`
/// - `p`: the modulus of the message space
/// - `q`: the modulus of the coefficients
/// - `sigma`: the standard deviation of secrets and errors
/// - `modulus`: the ring modulus `X^n + 1 mod q`
/// - `a`: the uniform random polynomial `a ∈ R_q`
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{InnerProductFE, RingLwe};
/// use qfall_math::{integer::{MatZ, Z}, traits::Pow};
/// use std::str::FromStr;
///
/// let q = Z::from(2).pow(80).unwrap();
/// let ring_lwe = RingLwe::new(2, 16, 10, 1 << 20, q, 20).unwrap();
/// let (mpk, msk) = ring_lwe.gen().unwrap();
///
/// let x = MatZ::from_str("[[9],[-4]]").unwrap();
/// let y = MatZ::from_str("[[-2],[3]]").unwrap();
///
/// let key = ring_lwe.derive_key(&msk, &y).unwrap();
/// let cipher = ring_lwe.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-30), ring_lwe.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingLwe {
    l: usize,
    n: usize,
    bound: Z,
    p: Z,
    q: Z,
    sigma: Q,
    modulus: ModulusPolynomialRingZq,
    a: PolynomialRingZq,
}

impl RingLwe {
    /// Instantiates a [`RingLwe`] instance with the given moduli and
    /// samples the public polynomial `a`.
    ///
    /// Parameters:
    /// - `l`: the number of rows of encrypted matrices
    /// - `n`: the degree of the ring modulus, a power of two
    /// - `bound`: the bound on the entries of `X` and `y`
    /// - `p`: the modulus of the message space with `p >= 2 * l * bound^2`
    /// - `q`: the modulus of the coefficients with `q > p`
    /// - `sigma`: the standard deviation of secrets and errors
    ///
    /// Returns a new [`RingLwe`] instance or a [`FEError`] if a
    /// precondition is violated.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::RingLwe;
    /// use qfall_math::{integer::Z, traits::Pow};
    ///
    /// let q = Z::from(2).pow(80).unwrap();
    /// let ring_lwe = RingLwe::new(4, 32, 100, 1 << 20, q, 20).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`PreconditionFailed`](FEError::PreconditionFailed)
    /// if `l == 0`, `n` is no power of two, `bound` is not positive,
    /// `p < 2 * l * bound^2`, `q <= p` or `sigma <= 0`.
    pub fn new(
        l: usize,
        n: usize,
        bound: impl Into<Z>,
        p: impl Into<Z>,
        q: impl Into<Z>,
        sigma: impl Into<Q>,
    ) -> Result<Self, FEError> {
        let bound: Z = bound.into();
        let p: Z = p.into();
        let q: Z = q.into();
        let sigma: Q = sigma.into();

        if l == 0 || !n.is_power_of_two() || bound < Z::ONE {
            return Err(FEError::PreconditionFailed(format!(
                "l = {l}, n = {n} with bound {bound} are not supported"
            )));
        }
        let min_p = Z::from(2 * l as u64) * &bound * &bound;
        if p < min_p {
            return Err(FEError::PreconditionFailed(format!(
                "the message modulus {p} is smaller than 2 * l * bound^2 = {min_p}"
            )));
        }
        if q <= p {
            return Err(FEError::PreconditionFailed(format!(
                "the modulus {q} does not exceed the message modulus {p}"
            )));
        }
        // rejects non-positive standard deviations
        NormalCumulative::new(sigma.clone(), n as u64, true)?;

        // modulus = (X^n + 1) mod q
        let mut modulus = PolyOverZq::from((1, &q));
        modulus.set_coeff(n, 1)?;
        let modulus = ModulusPolynomialRingZq::from(&modulus);

        let a = PolynomialRingZq::sample_uniform(&modulus);
        debug!(l, n, bits_q = q.bits(), %sigma, "instantiated ring LWE parameters");

        Ok(Self {
            l,
            n,
            bound,
            p,
            q,
            sigma,
            modulus,
            a,
        })
    }

    /// Returns the sampler for secrets and errors.
    fn sampler(&self) -> Result<NormalCumulative, FEError> {
        NormalCumulative::new(self.sigma.clone(), self.n as u64, true)
    }

    /// Returns the polynomial of `R_q` with the given coefficients.
    fn to_ring(&self, coefficients: &[Z]) -> Result<PolynomialRingZq, FEError> {
        let mut poly = PolyOverZ::default();
        for (i, coefficient) in coefficients.iter().enumerate() {
            poly.set_coeff(i, coefficient)?;
        }
        Ok(PolynomialRingZq::from((&poly, &self.modulus)))
    }

    /// Returns the polynomial of `R_q` with the coefficients of row `row` of `mat`.
    fn row_to_ring(&self, mat: &MatZ, row: usize) -> Result<PolynomialRingZq, FEError> {
        let coefficients = (0..self.n)
            .map(|j| -> Result<Z, FEError> { Ok(mat.get_entry(row, j)?) })
            .collect::<Result<Vec<Z>, FEError>>()?;
        self.to_ring(&coefficients)
    }

    /// Returns a polynomial of `R_q` with coefficients sampled by `sampler`.
    fn sample_ring(&self, sampler: &NormalCumulative) -> Result<PolynomialRingZq, FEError> {
        let coefficients = entries(&sampler.sample_vec(self.n)?)?;
        self.to_ring(&coefficients)
    }

    /// Returns the `n` coefficients of `poly`.
    fn coefficients(&self, poly: &PolynomialRingZq) -> Result<Vec<Z>, FEError> {
        (0..self.n)
            .map(|j| -> Result<Z, FEError> { Ok(poly.get_coeff(j)?) })
            .collect()
    }

    /// Encrypts the rows of the `l x n` matrix `mat_x` by following these steps:
    /// - r <- χ^n, e <- χ^n, E <- χ^{l x n}
    /// - ct_i = pk_i * r + E_i + ⌊X_i * q / p⌋ for `i < l`
    /// - ct_l = a * r + e
    /// where χ is discrete Gaussian distributed with standard deviation `σ`
    /// and all products are computed in `R_q`.
    ///
    /// Then, `([ct_0, ..., ct_{l-1}], ct_l)` is output.
    ///
    /// Parameters:
    /// - `mpk`: the master public key `[pk_0, ..., pk_{l-1}]`
    /// - `mat_x`: the encrypted matrix
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `mat_x` is no `l x n` matrix or `mpk` has not exactly `l` entries.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `mat_x` is out of bounds.
    pub fn enc_mat(
        &self,
        mpk: &[PolynomialRingZq],
        mat_x: &MatZ,
    ) -> Result<(Vec<PolynomialRingZq>, PolynomialRingZq), FEError> {
        if mat_x.get_num_rows() != self.l as i64 || mat_x.get_num_columns() != self.n as i64 {
            return Err(FEError::MalformedInput(format!(
                "expected a {}x{} message, got a {}x{} matrix",
                self.l,
                self.n,
                mat_x.get_num_rows(),
                mat_x.get_num_columns()
            )));
        }
        for j in 0..self.n {
            check_bound(&mat_x.get_column(j)?, &self.bound)?;
        }
        if mpk.len() != self.l {
            return Err(FEError::MalformedInput(format!(
                "expected a public key of {} polynomials, got {}",
                self.l,
                mpk.len()
            )));
        }
        let sampler = self.sampler()?;
        let r = self.sample_ring(&sampler)?;

        let mut cts = Vec::with_capacity(self.l);
        for (i, pk_i) in mpk.iter().enumerate() {
            // t_i = ⌊X_i * q / p⌋
            let t_i = (0..self.n)
                .map(|j| -> Result<Z, FEError> {
                    let x_ij: Z = mat_x.get_entry(i, j)?;
                    Ok((x_ij * &self.q).div_floor(&self.p))
                })
                .collect::<Result<Vec<Z>, FEError>>()?;

            let ct_i = pk_i * &r + self.sample_ring(&sampler)? + self.to_ring(&t_i)?;
            cts.push(ct_i);
        }
        let ct_last = &self.a * &r + self.sample_ring(&sampler)?;

        Ok((cts, ct_last))
    }

    /// Decrypts `y^t * X` by following these steps:
    /// - d = Σ y_i * ct_i - ct_l * key, coefficientwise centered around `0`
    /// - res_j = ⌊(d_j * p + ⌊q/2⌋) / q⌋
    ///
    /// Parameters:
    /// - `cipher`: an encryption of `X`
    /// - `key`: the functional key for `y`
    /// - `y`: the column vector of length `l`
    ///
    /// Returns `y^t * X` as a column vector of length `n`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` is no column vector of length `l` or `cipher` has not exactly
    /// `l` leading polynomials.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    pub fn dec_mat(
        &self,
        cipher: &(Vec<PolynomialRingZq>, PolynomialRingZq),
        key: &PolynomialRingZq,
        y: &MatZ,
    ) -> Result<MatZ, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound)?;
        let (cts, ct_last) = cipher;
        if cts.len() != self.l {
            return Err(FEError::MalformedInput(format!(
                "expected a cipher of {} polynomials, got {}",
                self.l + 1,
                cts.len() + 1
            )));
        }

        let mut d = self.to_ring(&[])?;
        for (y_i, ct_i) in entries(y)?.iter().zip(cts.iter()) {
            let y_i = self.to_ring(&[y_i.clone()])?;
            d = &d + &(&y_i * ct_i);
        }
        let d = &d - &(ct_last * key);

        let half_q = self.q.div_floor(&Z::from(2));
        let res = self
            .coefficients(&d)?
            .iter()
            .map(|d_j| (center(d_j, &self.q) * &self.p + &half_q).div_floor(&self.q))
            .collect::<Vec<Z>>();
        column_vector(&res)
    }
}

impl InnerProductFE for RingLwe {
    type MasterPublicKey = Vec<PolynomialRingZq>;
    type MasterSecretKey = MatZ;
    type FunctionalKey = PolynomialRingZq;
    type Cipher = (Vec<PolynomialRingZq>, PolynomialRingZq);

    /// Generates a master key pair by following these steps:
    /// - S <- χ^{l x n}, E <- χ^{l x n}
    /// - pk_i = a * s_i + e_i in `R_q`, where `s_i` and `e_i` are the rows
    ///   of `S` and `E` read as polynomials
    ///
    /// Then, `mpk = [pk_0, ..., pk_{l-1}]` and `msk = S` are output.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::{InnerProductFE, RingLwe};
    /// use qfall_math::{integer::Z, traits::Pow};
    ///
    /// let q = Z::from(2).pow(80).unwrap();
    /// let ring_lwe = RingLwe::new(2, 16, 10, 1 << 20, q, 20).unwrap();
    ///
    /// let (mpk, msk) = ring_lwe.gen().unwrap();
    /// ```
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let sampler = self
            .sampler()
            .map_err(|err| FEError::KeyGenFailed(err.to_string()))?;
        let mat_s = sampler.sample_mat(self.l, self.n)?;

        let mut mpk = Vec::with_capacity(self.l);
        for i in 0..self.l {
            let s_i = self.row_to_ring(&mat_s, i)?;
            let pk_i = &self.a * &s_i + self.sample_ring(&sampler)?;
            mpk.push(pk_i);
        }

        Ok((mpk, mat_s))
    }

    /// Derives the functional key `Σ y_i * s_i mod q` for `y`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` is no column vector of length `l` or `msk` is no `l x n` matrix.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound)?;
        if msk.get_num_rows() != self.l as i64 || msk.get_num_columns() != self.n as i64 {
            return Err(FEError::MalformedInput(format!(
                "expected a {}x{} secret key, got a {}x{} matrix",
                self.l,
                self.n,
                msk.get_num_rows(),
                msk.get_num_columns()
            )));
        }

        let key = y.transpose() * msk;
        self.row_to_ring(&key, 0)
    }

    /// Encrypts `x` as the first column of an otherwise zero `l x n` matrix,
    /// see [`RingLwe::enc_mat`].
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `x` is no column vector of length `l` or `mpk` has not exactly `l` entries.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `x` is out of bounds.
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError> {
        check_dimension(x, self.l)?;
        let mut mat_x = MatZ::new(self.l, self.n);
        mat_x.set_column(0, x, 0)?;

        self.enc_mat(mpk, &mat_x)
    }

    /// Decrypts `⟨x, y⟩` as the first entry of `y^t * X`,
    /// see [`RingLwe::dec_mat`].
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` or `cipher` have the wrong dimensions.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds or the result exceeds
    /// `l * bound^2`, i.e. `key` does not belong to `y`.
    fn dec(
        &self,
        cipher: &Self::Cipher,
        key: &Self::FunctionalKey,
        y: &MatZ,
    ) -> Result<Z, FEError> {
        let res = self.dec_mat(cipher, key, y)?;
        let bound = Z::from(self.l as u64) * &self.bound * &self.bound;

        check_result(res.get_entry(0, 0)?, &bound)
    }
}

#[cfg(test)]
mod test_ring_lwe {
    use super::RingLwe;
    use crate::{
        construction::inner_product::{inner_product, InnerProductFE},
        error::FEError,
        sample::distribution::uniform::{sample_uniform_mat, sample_uniform_vec},
    };
    use qfall_math::{
        integer::{MatZ, Z},
        traits::{GetEntry, Pow},
    };
    use std::str::FromStr;

    /// Returns an instance with `p = 10^16` and a `100` bit modulus `q`.
    fn instance(l: usize, n: usize, bound: &Z) -> RingLwe {
        let p = Z::from(10).pow(16).unwrap();
        let q = Z::from_str("903468688179973616387830299599").unwrap();

        RingLwe::new(l, n, bound, p, q, 20).unwrap()
    }

    /// Checks the full cycle for a random `100 x 256` message matrix
    /// with entries bounded by `10^6`.
    #[test]
    fn cycle_random_matrix() {
        let bound = Z::from(1000000);
        let ring_lwe = instance(100, 256, &bound);
        let (mpk, msk) = ring_lwe.gen().unwrap();

        let lower = Z::ONE - &bound;
        let mat_x = sample_uniform_mat(100, 256, &lower, &bound).unwrap();
        let y = sample_uniform_vec(100, &lower, &bound).unwrap();
        let key = ring_lwe.derive_key(&msk, &y).unwrap();
        let cipher = ring_lwe.enc_mat(&mpk, &mat_x).unwrap();

        let res = ring_lwe.dec_mat(&cipher, &key, &y).unwrap();

        assert_eq!((mat_x.transpose() * &y), res);
    }

    /// Checks the full cycle of the vector interface.
    #[test]
    fn cycle_random_vectors() {
        let bound = Z::from(1000);
        let ring_lwe = instance(8, 32, &bound);
        let (mpk, msk) = ring_lwe.gen().unwrap();

        let lower = Z::ONE - &bound;
        let x = sample_uniform_vec(8, &lower, &bound).unwrap();
        let y = sample_uniform_vec(8, &lower, &bound).unwrap();
        let key = ring_lwe.derive_key(&msk, &y).unwrap();
        let cipher = ring_lwe.enc(&mpk, &x).unwrap();

        let res = ring_lwe.dec(&cipher, &key, &y).unwrap();

        assert_eq!(inner_product(&x, &y).unwrap(), res);
    }

    /// Ensures that only the first column is set when encrypting vectors.
    #[test]
    fn vector_in_first_column() {
        let ring_lwe = instance(2, 16, &Z::from(10));
        let (mpk, msk) = ring_lwe.gen().unwrap();

        let x = MatZ::from_str("[[9],[-9]]").unwrap();
        let y = MatZ::from_str("[[-9],[-9]]").unwrap();
        let key = ring_lwe.derive_key(&msk, &y).unwrap();
        let cipher = ring_lwe.enc(&mpk, &x).unwrap();

        let res = ring_lwe.dec_mat(&cipher, &key, &y).unwrap();

        assert_eq!(Z::ZERO, res.get_entry(0, 0).unwrap());
        assert_eq!(MatZ::new(16, 1), res);
    }

    /// Ensures that invalid parameters are rejected.
    #[test]
    fn invalid_parameters() {
        let q = Z::from(2).pow(80).unwrap();

        assert!(matches!(
            RingLwe::new(2, 24, 10, 1 << 20, &q, 20),
            Err(FEError::PreconditionFailed(_))
        ));
        assert!(matches!(
            RingLwe::new(2, 16, 10, 399, &q, 20),
            Err(FEError::PreconditionFailed(_))
        ));
        assert!(matches!(
            RingLwe::new(2, 16, 10, 1 << 20, 1 << 20, 20),
            Err(FEError::PreconditionFailed(_))
        ));
        assert!(matches!(
            RingLwe::new(2, 16, 10, 1 << 20, &q, 0),
            Err(FEError::PreconditionFailed(_))
        ));
        assert!(RingLwe::new(2, 16, 10, 400, &q, 20).is_ok());
    }

    /// Ensures that messages exceeding the bound or dimension are rejected.
    #[test]
    fn enc_malformed() {
        let ring_lwe = instance(2, 16, &Z::from(10));
        let (mpk, _) = ring_lwe.gen().unwrap();

        assert!(matches!(
            ring_lwe.enc(&mpk, &MatZ::from_str("[[10],[0]]").unwrap()),
            Err(FEError::BoundCheckFailed(_))
        ));
        assert!(matches!(
            ring_lwe.enc_mat(&mpk, &MatZ::new(2, 8)),
            Err(FEError::MalformedInput(_))
        ));
        assert!(matches!(
            ring_lwe.enc(&mpk[..1].to_vec(), &MatZ::new(2, 1)),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Ensures that a key derived for another `y` is detected.
    #[test]
    fn key_for_other_y() {
        let ring_lwe = instance(2, 16, &Z::from(10));
        let (mpk, msk) = ring_lwe.gen().unwrap();

        let x = MatZ::from_str("[[3],[-4]]").unwrap();
        let y = MatZ::from_str("[[1],[2]]").unwrap();
        let other = MatZ::from_str("[[2],[1]]").unwrap();
        let key = ring_lwe.derive_key(&msk, &other).unwrap();
        let cipher = ring_lwe.enc(&mpk, &x).unwrap();

        assert!(matches!(
            ring_lwe.dec(&cipher, &key, &y),
            Err(FEError::BoundCheckFailed(_))
        ));
    }

    /// Checks that an instance can be used after serialization.
    #[test]
    fn serialize_parameters() {
        let ring_lwe = instance(2, 16, &Z::from(10));
        let (mpk, msk) = ring_lwe.gen().unwrap();

        let serialized = serde_json::to_string(&ring_lwe).unwrap();
        let ring_lwe: RingLwe = serde_json::from_str(&serialized).unwrap();

        let x = MatZ::from_str("[[5],[6]]").unwrap();
        let y = MatZ::from_str("[[-7],[8]]").unwrap();
        let key = ring_lwe.derive_key(&msk, &y).unwrap();
        let cipher = ring_lwe.enc(&mpk, &x).unwrap();

        assert_eq!(Z::from(13), ring_lwe.dec(&cipher, &key, &y).unwrap());
    }
}
