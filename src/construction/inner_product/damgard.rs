// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains an implementation of the adaptively secure
//! inner-product functional encryption scheme from
//! [\[2\]](<index.html#:~:text=[2]>), which instantiates
//! Damgård's variant of ElGamal encryption.

use super::{
    check_bound, check_dimension, check_dlog_range, column_vector, entries, inner_product,
    InnerProductFE,
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

/// This struct manages and stores the public parameters of a [`Damgard`]
/// inner-product functional encryption instance.
///
/// Attributes:
/// - `l`: the length of the encrypted vectors
/// - `bound`: all entries of `x` and `y` lie in `(-bound, bound)`
/// - `group`: the group `Z_p^*` with generator `g`
/// - `h`: a second generator `h = g^t` for a discarded random `t`
///
/// # Examples
/// ```
/// use qfall_fe::construction::inner_product::{Damgard, InnerProductFE};
/// use qfall_math::integer::{MatZ, Z};
/// use std::str::FromStr;
///
/// let damgard = Damgard::new(2, 64, 1 << 10).unwrap();
/// let (mpk, msk) = damgard.gen().unwrap();
///
/// let x = MatZ::from_str("[[7],[-3]]").unwrap();
/// let y = MatZ::from_str("[[2],[5]]").unwrap();
///
/// let key = damgard.derive_key(&msk, &y).unwrap();
/// let cipher = damgard.enc(&mpk, &x).unwrap();
///
/// assert_eq!(Z::from(-1), damgard.dec(&cipher, &key, &y).unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Damgard {
    l: usize,
    bound: Z,
    group: Group,
    h: Z,
}

/// The master secret key `(s, t)` of a [`Damgard`] instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamgardSecretKey {
    pub s: MatZ,
    pub t: MatZ,
}

impl Damgard {
    /// Generates a new [`Damgard`] instance for vectors of length `l`
    /// with entries in `(-bound, bound)` over a group with a safe prime
    /// modulus of `modulus_len` bits.
    ///
    /// Parameters:
    /// - `l`: the length of the encrypted vectors
    /// - `modulus_len`: the bit length of the group modulus `p`
    /// - `bound`: the bound on the entries of `x` and `y`
    ///
    /// Returns a new [`Damgard`] instance or a [`FEError`] if the
    /// inner products can not be recovered in the generated group.
    ///
    /// # Examples
    /// ```
    /// use qfall_fe::construction::inner_product::Damgard;
    ///
    /// let damgard = Damgard::new(3, 64, 1 << 10).unwrap();
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

        let t = Z::sample_uniform(1, &group.p)?;
        let h = pow_mod(&group.g, &t, &group.p)?;
        debug!(l, modulus_len, %bound, "generated Damgard parameters");

        Ok(Self { l, bound, group, h })
    }

    /// Returns the group the scheme operates in.
    pub fn get_group(&self) -> &Group {
        &self.group
    }
}

impl InnerProductFE for Damgard {
    type MasterPublicKey = MatZ;
    type MasterSecretKey = DamgardSecretKey;
    type FunctionalKey = (Z, Z);
    type Cipher = MatZ;

    /// Generates a master key pair by following these steps:
    /// - s, t <- [2, p-1)^l
    /// - mpk_i = g^{s_i} * h^{t_i}
    ///
    /// Then, `mpk` and `msk = (s, t)` are output.
    fn gen(&self) -> Result<(Self::MasterPublicKey, Self::MasterSecretKey), FEError> {
        let p = &self.group.p;
        let upper = p - Z::ONE;
        let s = sample_uniform_vec(self.l, &Z::from(2), &upper)?;
        let t = sample_uniform_vec(self.l, &Z::from(2), &upper)?;

        let mut mpk = Vec::with_capacity(self.l);
        for (s_i, t_i) in entries(&s)?.iter().zip(entries(&t)?.iter()) {
            let mpk_i = pow_mod(&self.group.g, s_i, p)? * pow_mod(&self.h, t_i, p)?;
            mpk.push(mpk_i.modulo(p));
        }

        Ok((column_vector(&mpk)?, DamgardSecretKey { s, t }))
    }

    /// Derives the functional key `(⟨s, y⟩, ⟨t, y⟩) mod (p-1)` for `y`.
    ///
    /// # Errors and Failures
    /// - Returns a [`FEError`] of type [`MalformedInput`](FEError::MalformedInput)
    /// if `y` or a part of `msk` are no column vectors of length `l`.
    /// - Returns a [`FEError`] of type [`BoundCheckFailed`](FEError::BoundCheckFailed)
    /// if an entry of `y` is out of bounds.
    fn derive_key(
        &self,
        msk: &Self::MasterSecretKey,
        y: &MatZ,
    ) -> Result<Self::FunctionalKey, FEError> {
        check_dimension(y, self.l)?;
        check_bound(y, &self.bound)?;
        check_dimension(&msk.s, self.l)?;
        check_dimension(&msk.t, self.l)?;

        let order = &self.group.p - Z::ONE;
        let key_s = inner_product(&msk.s, y)?.modulo(&order);
        let key_t = inner_product(&msk.t, y)?.modulo(&order);

        Ok((key_s, key_t))
    }

    /// Encrypts `x` by following these steps:
    /// - r <- [1, p)
    /// - ct_0 = g^r, ct_1 = h^r
    /// - ct_{i+2} = mpk_i^r * g^{x_i}
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
        let mut cipher = vec![pow_mod(g, &r, p)?, pow_mod(&self.h, &r, p)?];
        for (mpk_i, x_i) in entries(mpk)?.iter().zip(entries(x)?.iter()) {
            let ct_i = pow_mod(mpk_i, &r, p)? * pow_mod(g, x_i, p)?;
            cipher.push(ct_i.modulo(p));
        }

        column_vector(&cipher)
    }

    /// Decrypts `⟨x, y⟩` by computing
    /// `Π ct_{i+2}^{y_i} / (ct_0^{key_s} * ct_1^{key_t})`
    /// and its discrete logarithm in `(-l * bound^2, l * bound^2)`.
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
        check_dimension(cipher, self.l + 2)?;
        let (p, g) = (&self.group.p, &self.group.g);
        let cipher = entries(cipher)?;

        let mut num = Z::ONE;
        for (ct_i, y_i) in cipher[2..].iter().zip(entries(y)?.iter()) {
            num = (num * pow_mod(ct_i, y_i, p)?).modulo(p);
        }
        let denom = pow_mod(&cipher[0], &key.0, p)? * pow_mod(&cipher[1], &key.1, p)?;
        let denom_inv = pow_mod(&denom, &Z::MINUS_ONE, p)?;
        let h = (num * denom_inv).modulo(p);

        let order = p - Z::ONE;
        let bound = Z::from(self.l as u64) * &self.bound * &self.bound;
        baby_step_giant_step_with_neg(&h, g, p, Some(&order), Some(&bound))
    }
}

#[cfg(test)]
mod test_damgard {
    use super::Damgard;
    use crate::{
        construction::inner_product::{inner_product, InnerProductFE},
        error::FEError,
        sample::distribution::uniform::sample_uniform_vec,
    };
    use qfall_math::integer::{MatZ, Z};
    use std::str::FromStr;

    /// Checks the full cycle of gen, derive_key, enc and dec
    /// for random vectors with a 64 bit group.
    #[test]
    fn cycle_random_vectors() {
        let bound = Z::from(1 << 10);
        let damgard = Damgard::new(3, 64, &bound).unwrap();
        let (mpk, msk) = damgard.gen().unwrap();

        let lower = Z::ONE - &bound;
        let x = sample_uniform_vec(3, &lower, &bound).unwrap();
        let y = sample_uniform_vec(3, &lower, &bound).unwrap();
        let key = damgard.derive_key(&msk, &y).unwrap();
        let cipher = damgard.enc(&mpk, &x).unwrap();

        let res = damgard.dec(&cipher, &key, &y).unwrap();

        assert_eq!(inner_product(&x, &y).unwrap(), res);
    }

    /// Ensures that a key for a different `y` does not decrypt to `⟨x, y⟩`.
    #[test]
    fn key_bound_to_y() {
        let damgard = Damgard::new(2, 64, 100).unwrap();
        let (mpk, msk) = damgard.gen().unwrap();

        let x = MatZ::from_str("[[1],[1]]").unwrap();
        let y = MatZ::from_str("[[1],[2]]").unwrap();
        let other_y = MatZ::from_str("[[2],[1]]").unwrap();
        let key = damgard.derive_key(&msk, &other_y).unwrap();
        let cipher = damgard.enc(&mpk, &x).unwrap();

        match damgard.dec(&cipher, &key, &y) {
            Ok(res) => assert_ne!(Z::from(3), res),
            Err(err) => assert!(matches!(err, FEError::DlogNotFound)),
        }
    }

    /// Ensures that entries of `x` out of bounds are rejected during encryption.
    #[test]
    fn enc_out_of_bounds() {
        let damgard = Damgard::new(2, 64, 100).unwrap();
        let (mpk, _) = damgard.gen().unwrap();

        let x = MatZ::from_str("[[-100],[1]]").unwrap();

        assert!(matches!(
            damgard.enc(&mpk, &x),
            Err(FEError::BoundCheckFailed(_))
        ));
    }

    /// Ensures that a `y` of wrong length is rejected during key derivation.
    #[test]
    fn derive_key_wrong_dimension() {
        let damgard = Damgard::new(2, 64, 100).unwrap();
        let (_, msk) = damgard.gen().unwrap();

        let y = MatZ::from_str("[[1],[2],[3]]").unwrap();

        assert!(matches!(
            damgard.derive_key(&msk, &y),
            Err(FEError::MalformedInput(_))
        ));
    }

    /// Ensures that groups, in which positive and negative inner products
    /// share a discrete logarithm, are rejected.
    #[test]
    fn ambiguous_range() {
        assert!(matches!(
            Damgard::new(1, 16, 181),
            Err(FEError::ParamGenFailed(_))
        ));
    }

    /// Ensures that inner products exceeding the discrete logarithm table are rejected.
    #[test]
    fn range_exceeds_dlog_table() {
        assert!(matches!(
            Damgard::new(3, 128, 1_u64 << 40),
            Err(FEError::ParamGenFailed(_))
        ));
    }

    /// Ensures that ciphers of wrong length are rejected during decryption.
    #[test]
    fn dec_wrong_cipher() {
        let damgard = Damgard::new(2, 64, 100).unwrap();
        let (_, msk) = damgard.gen().unwrap();
        let y = MatZ::from_str("[[1],[2]]").unwrap();
        let key = damgard.derive_key(&msk, &y).unwrap();

        let cipher = MatZ::from_str("[[1],[2],[3]]").unwrap();

        assert!(matches!(
            damgard.dec(&cipher, &key, &y),
            Err(FEError::MalformedInput(_))
        ));
    }
}
