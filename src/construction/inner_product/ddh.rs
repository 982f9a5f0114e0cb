// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the selectively secure
//! inner-product functional encryption scheme based on the
//! decisional Diffie-Hellman assumption from
//! [\[1\]](<index.html#:~:text=[1]>).

use super::{
    check_bound, check_dimension, check_dlog_range, column_vector, entries, InnerProductFE,
};
use crate::{
    error::FEError,
    primitive::{
        dlog::baby_step_giant_step_with_neg,
        group::{pow_mod, Group},
    },
    sample::distribution::uniform::sample_uniform_vec,
};
use qfall_math::integer::{MatZ, Z};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// This struct manages and stores the public parameters of a [`Ddh`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the length of the encrypted vectors
/// - `bound`: all entries of `x` and `y` lie in `(-bound, bound)`
/// - `group`: the group `Z_p^*` with generator `g` in which the scheme computes
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{Ddh, InnerProductFE};
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let ddh = Ddh::new(3, 64, 100).unwrap();
/// let (mpk, msk) = ddh.gen().unwrap();
///
/// let x = MatZ::from_str("[[1],[-2],[3]]").unwrap();
/// let y = MatZ::from_str("[[4],[5],[-6]]").unwrap();
///
/// let key = ddh.derive_key(&msk, &y).unwrap();
/// let cipher = ddh.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-24), ddh.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ddh {
    l: usize,
    bound: Z,
    group: Group,
}

impl Ddh {
    /// Generates a new [`Ddh`] instance for vectors of length `l`
    /// with entries in `(-bound, bound)` over a group with a safe prime
    /// modulus of `modulus_len` bits.
    ///
    /// Parameters:
    /// - `l`: the length of the encrypted vectors
    /// - `modulus_len`: the bit length of the group modulus `p`
    /// - `bound`: the bound on the entries of `x` and `y`
    ///
    /// Returns a new [`Ddh`] instance or a [`FEError`] if the
    /// inner products can not be recovered in the generated group.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::Ddh;
    ///
    /// let ddh = Ddh::new(5, 128, 1 << 10).unwrap();
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`ParamGenFailed`](FEError::ParamGenFailed)
    /// if `l == 0`, `bound < 1`, `2 * l * bound^2 >= q` for the group order `q`,
    /// or the discrete logarithm search for `l * bound^2` exceeds
    /// [`BABY_STEP_GIANT_STEP_MAX_STEPS`](crate::primitive::dlog::BABY_STEP_GIANT_STEP_MAX_STEPS)
    /// baby steps.
    /// - Returns a [`FEError`] of type [`PrimeGenFailed`](FEError::PrimeGenFailed)
    /// if no group modulus was found.
    pub fn new(l: usize, modulus_len: u64, bound: impl Into<Z>) -> Result<Self, FEError> {
        let bound: Z = bound.into();
        if l == 0 || bound < Z::ONE {
            return Err(FEError::ParamGenFailed(format!(
                "vectors of length {l} with bound {bound} are not supported"
            )));
        }

        let group = Group::new(modulus_len)?;
        check_dlog_range(&(Z::from(l as u64) * &bound * &bound), &group.q)?;
        debug!(l, modulus_len, %bound, "generated DDH parameters");

        Ok(Self { l, bound, group })
    }

    /// Returns the group the scheme operates in.
    pub fn get_group(&self) -> &Group {
        &self.group
    }

    /// Returns the bound on the inner products `l * bound^2`,
    /// which limits the discrete logarithm search.
    fn inner_product_bound(&self) -> Z {
        Z::from(self.l as u64) * &self.bound * &self.bound
    }
}

impl Default for Ddh {
    /// Initializes a [`Ddh`] instance for vectors of length `3` with entries
    /// bounded by `2^10` in a `64` bit group.
    /// This parameter choice is not secure as the group is too small,
    /// but it provides an efficient working example.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::Ddh;
    ///
    /// let ddh = Ddh::default();
    /// ```
    fn default() -> Self {
        let group = Group {
            p: Z::from(18446744073709550147u64),
            q: Z::from(9223372036854775073u64),
            g: Z::from(4),
        };

        Self {
            l: 3,
            bound: Z::from(1 << 10),
            group,
        }
    }
}

impl InnerProductFE for Ddh {
    type MasterPublicKey = MatZ;
    type MasterSecretKey = MatZ;
    type FunctionalKey = Z;
    type Cipher = MatZ;

    /// Generates a master key pair by following these steps:
    /// - s <- [2, p-1)^l
    /// - mpk_i = g^{s_i}
    ///
    /// Then, `mpk` and `msk = s` are output.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::{Ddh, InnerProductFE};
    /// let ddh = Ddh::default();
    ///
    /// let (mpk, msk) = ddh.gen().unwrap();
    /// ```
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let group = &self.group;
        let msk = sample_uniform_vec(self.l, &Z::from(2), &(&group.p - Z::ONE))?;

        let mpk = entries(&msk)?
            .iter()
            .map(|s_i| pow_mod(&group.g, s_i, &group.p))
            .collect::<Result<Vec<Z>, FEError>>()?;

        Ok((column_vector(&mpk)?, msk))
    }

    /// Derives the functional key `⟨s, y⟩ mod (p-1)` for `y`.
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
        check_bound(y, &self.bound)?;
        check_dimension(msk, self.l)?;

        let key = super::inner_product(msk, y)?;
        Ok(key.modulo(&(&self.group.p - Z::ONE)))
    }

    /// Encrypts `x` by following these steps:
    /// - r <- [1, p)
    /// - ct_0 = g^r
    /// - ct_i = mpk_i^r * g^{x_i}
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `x` or `mpk` are no column vectors of length `l`.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `x` is out of bounds.
    fn enc(&self, mpk: &Self::MasterPublicKey, x: &MatZ) -> Result<Self::Cipher, FEError> {
        check_dimension(x, self.l)?;
        check_bound(x, &self.bound)?;
        check_dimension(mpk, self.l)?;
        let (p, g) = (&self.group.p, &self.group.g);

        let r = Z::sample_uniform(1, p)?;
        let mut cipher = vec![pow_mod(g, &r, p)?];
        for (mpk_i, x_i) in entries(mpk)?.iter().zip(entries(x)?.iter()) {
            let ct_i = pow_mod(mpk_i, &r, p)? * pow_mod(g, x_i, p)?;
            cipher.push(ct_i.modulo(p));
        }

        column_vector(&cipher)
    }

    /// Decrypts `⟨x, y⟩` by computing `Π ct_i^{y_i} / ct_0^{key}`
    /// and its discrete logarithm in `(-l * bound^2, l * bound^2)`.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::{Ddh, InnerProductFE};
    /// use qfall_math::integer::{MatZ, Z};
    /// use std::str::FromStr;
    /// let ddh = Ddh::default();
    /// let (mpk, msk) = ddh.gen().unwrap();
    /// let x = MatZ::from_str("[[1000],[0],[-1]]").unwrap();
    /// let y = MatZ::from_str("[[1000],[3],[-1000]]").unwrap();
    /// let key = ddh.derive_key(&msk, &y).unwrap();
    /// let cipher = ddh.enc(&mpk, &x).unwrap();
    ///
    /// let res = ddh.dec(&cipher, &key, &y).unwrap();
    ///
    /// assert_eq!(Z::from(1001000), res);
    /// ```
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` or `cipher` have the wrong dimensions.
    /// - Returns a [`FEError`] of type [`DlogNotFound`](FEError::DlogNotFound)
    /// if the key does not belong to `y` or `cipher` is no valid encryption.
    fn dec(
        &self,
        cipher: &Self::Cipher,
        key: &Self::FunctionalKey,
        y: &MatZ,
    ) -> Result<Z, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound)?;
        check_dimension(cipher, self.l + 1)?;
        let (p, g) = (&self.group.p, &self.group.g);
        let cipher = entries(cipher)?;

        let mut num = Z::ONE;
        for (ct_i, y_i) in cipher[1..].iter().zip(entries(y)?.iter()) {
            num = (num * pow_mod(ct_i, y_i, p)?).modulo(p);
        }
        let denom_inv = pow_mod(&cipher[0], &(Z::ZERO - key), p)?;
        let h = (num * denom_inv).modulo(p);

        let order = p - Z::ONE;
        baby_step_giant_step_with_neg(&h, g, p, Some(&order), Some(&self.inner_product_bound()))
    }
}
