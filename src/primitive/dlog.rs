// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains algorithms to compute discrete logarithms `x`
//! with `g^x = h mod p`, which are used to recover bounded inner products
//! from group elements.
//!
//! The main references are listed in the following:
//! - \[1\] Shanks, Daniel (1971).
//! Class number, a theory of factorization, and genera.
//! In: Proc. Symp. Pure Math. 20.
//! - \[2\] Pollard, John M. (1978).
//! Monte Carlo methods for index computation (mod p).
//! In: Mathematics of Computation 32.143.
//! <https://doi.org/10.1090/S0025-5718-1978-0491431-9>

use crate::{error::FEError, primitive::group::pow_mod};
use qfall_math::{
    integer::Z,
    integer_mod_q::Zq,
    traits::{Gcd, Pow},
};
use std::collections::HashMap;
use tracing::{debug, trace};

/// Maximal number of iterations of [`pollard_rho`] before the search is aborted.
pub const POLLARD_RHO_ITERATIONS: u64 = 1 << 32;

/// Maximal number of baby steps stored by [`baby_step_giant_step`],
/// i.e. searched ranges are limited to `[0, 2^48)`.
pub const BABY_STEP_GIANT_STEP_MAX_STEPS: u64 = 1 << 24;

/// Returns the number of baby steps `m = ⌈√bound⌉`, which
/// [`baby_step_giant_step`] uses to search `[0, bound)`.
///
/// # Examples
/// ```
/// use qfall_fe::primitive::dlog::baby_step_count;
/// use qfall_math::integer::Z;
///
/// assert_eq!(Z::from(32), baby_step_count(&Z::from(1000)));
/// assert_eq!(Z::from(32), baby_step_count(&Z::from(1024)));
/// ```
pub fn baby_step_count(bound: &Z) -> Z {
    if bound <= &Z::ZERO {
        return Z::ONE;
    }
    // the square root is approximated, hence the result is corrected
    let mut m = bound.sqrt().floor();
    while &(&m * &m) < bound {
        m = m + Z::ONE;
    }
    while m > Z::ONE && (&m - Z::ONE) * (&m - Z::ONE) >= *bound {
        m = m - Z::ONE;
    }
    m
}

/// Computes the discrete logarithm `x` of `h` to the base `g` modulo `p`
/// with `0 <= x < bound` using the baby-step giant-step algorithm
/// of [\[1\]](<index.html#:~:text=[1]>).
///
/// A table of `m = ⌈√bound⌉` baby steps `g^j` is built, where the
/// smallest `j` is kept for colliding entries. Then the giant steps
/// `h * g^{-i*m}` are compared against the table and the first hit
/// determines `x = i*m + j`, i.e. the smallest solution is returned.
///
/// Parameters:
/// - `h`: the element whose logarithm is computed
/// - `g`: the base of the logarithm
/// - `p`: the modulus
/// - `order`: the order of `g`. If absent, `p` has to be prime and
///   `p - 1` is used.
/// - `bound`: the exclusive upper bound of the searched range. If absent,
///   the whole group is searched, i.e. the bound is `order`.
///
/// Returns the discrete logarithm or a [`FEError`] if it does not exist
/// within the searched range.
///
/// # Examples
/// ```
/// use qfall_fe::primitive::dlog::baby_step_giant_step;
/// use qfall_math::integer::Z;
///
/// let (h, g, p, order) = (Z::from(188), Z::from(212), Z::from(227), Z::from(113));
///
/// let x = baby_step_giant_step(&h, &g, &p, Some(&order), None).unwrap();
///
/// assert_eq!(Z::from(101), x);
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`DlogNotFound`](FEError::DlogNotFound)
/// if no `x` within the range satisfies `g^x = h mod p`.
/// - Returns a [`FEError`] of type [`DlogCalcFailed`](FEError::DlogCalcFailed)
/// if `p <= 1`, the order is absent and `p` is not prime, `g` is not
/// invertible, or `m` exceeds [`BABY_STEP_GIANT_STEP_MAX_STEPS`].
pub fn baby_step_giant_step(
    h: &Z,
    g: &Z,
    p: &Z,
    order: Option<&Z>,
    bound: Option<&Z>,
) -> Result<Z, FEError> {
    if p <= &Z::ONE {
        return Err(FEError::DlogCalcFailed(format!(
            "the modulus {p} is not larger than 1"
        )));
    }
    let order = match order {
        Some(order) => order.clone(),
        None if p.is_prime() => p - Z::ONE,
        None => {
            return Err(FEError::DlogCalcFailed(String::from(
                "the order has to be provided for non-prime moduli",
            )))
        }
    };
    let bound = match bound {
        Some(bound) => bound.clone(),
        None => order,
    };
    if bound <= Z::ZERO {
        return Err(FEError::DlogNotFound);
    }

    let m = baby_step_count(&bound);
    let steps = match i64::try_from(&m) {
        Ok(steps) if steps as u64 <= BABY_STEP_GIANT_STEP_MAX_STEPS => steps as u64,
        _ => {
            return Err(FEError::DlogCalcFailed(format!(
                "the bound {bound} is too large for a table based search"
            )))
        }
    };
    debug!(steps, "baby-step giant-step search");

    let g = Zq::from((g, p));
    let mut table = HashMap::with_capacity(steps as usize);
    let mut baby = Zq::from((Z::ONE, p));
    for j in 0..steps {
        table.entry(baby.get_value()).or_insert(j);
        baby = &baby * &g;
    }

    let giant = g.pow(Z::ZERO - &m).map_err(|_| {
        FEError::DlogCalcFailed(format!("the base {g} is not invertible"))
    })?;
    let mut current = Zq::from((h, p));
    for i in 0..steps {
        if let Some(j) = table.get(&current.get_value()) {
            let x = Z::from(i) * &m + Z::from(*j);
            trace!(giant_steps = i, "baby-step giant-step hit");
            return if x < bound {
                Ok(x)
            } else {
                Err(FEError::DlogNotFound)
            };
        }
        current = &current * &giant;
    }

    Err(FEError::DlogNotFound)
}

/// Computes the discrete logarithm `x` of `h` to the base `g` modulo `p`
/// with `-bound < x < bound`.
///
/// The non-negative range is searched with [`baby_step_giant_step`] first.
/// Afterwards the search is repeated for the base `g^{-1}` and the result
/// is negated.
///
/// Parameters:
/// - `h`: the element whose logarithm is computed
/// - `g`: the base of the logarithm
/// - `p`: the modulus
/// - `order`: the order of `g`, see [`baby_step_giant_step`]
/// - `bound`: the exclusive bound on the absolute value of `x`
///
/// Returns the discrete logarithm or a [`FEError`] if it does not exist
/// within the searched range.
///
/// # Examples
/// ```
/// use qfall_fe::primitive::{dlog::baby_step_giant_step_with_neg, group::pow_mod};
/// use qfall_math::integer::Z;
///
/// let (g, p) = (Z::from(2), Z::from(1019));
/// let h = pow_mod(&g, &Z::from(-17), &p).unwrap();
///
/// let x = baby_step_giant_step_with_neg(&h, &g, &p, None, Some(&Z::from(100))).unwrap();
///
/// assert_eq!(Z::from(-17), x);
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`DlogNotFound`](FEError::DlogNotFound)
/// if no `x` within the range satisfies `g^x = h mod p`.
/// - Returns a [`FEError`] of type [`DlogCalcFailed`](FEError::DlogCalcFailed)
/// for the reasons listed at [`baby_step_giant_step`].
pub fn baby_step_giant_step_with_neg(
    h: &Z,
    g: &Z,
    p: &Z,
    order: Option<&Z>,
    bound: Option<&Z>,
) -> Result<Z, FEError> {
    match baby_step_giant_step(h, g, p, order, bound) {
        Err(FEError::DlogNotFound) => {
            let g_inv = pow_mod(g, &Z::MINUS_ONE, p).map_err(|_| {
                FEError::DlogCalcFailed(format!("the base {g} is not invertible"))
            })?;
            let x = baby_step_giant_step(h, &g_inv, p, order, bound)?;
            Ok(Z::ZERO - x)
        }
        result => result,
    }
}

/// Computes the discrete logarithm `x` of `h` to the base `g` modulo `p`,
/// where `g` has order `n`, using Pollard's rho algorithm
/// [\[2\]](<index.html#:~:text=[2]>).
///
/// The walk `x_{i+1} = f(x_i)` with `x_i = g^{a_i} h^{b_i}` partitions the
/// group by `x_i mod 3` and applies a squaring or a multiplication by `g` or `h`.
/// Collisions are detected by Floyd's cycle finding, i.e. the tortoise
/// performs one step and the hare two steps per iteration. The walk starts
/// at `1`, hence the result is deterministic.
///
/// Parameters:
/// - `h`: the element whose logarithm is computed
/// - `g`: the base of the logarithm
/// - `p`: the modulus
/// - `n`: the order of `g`
///
/// Returns the discrete logarithm in `[0, n)` or a [`FEError`].
///
/// # Examples
/// ```
/// use qfall_fe::primitive::dlog::pollard_rho;
/// use qfall_math::integer::Z;
///
/// let (h, g, p, order) = (Z::from(188), Z::from(212), Z::from(227), Z::from(113));
///
/// let x = pollard_rho(&h, &g, &p, &order).unwrap();
///
/// assert_eq!(Z::from(101), x);
/// ```
///
/// # Errors and Failures
/// - Returns a [`FEError`] of type [`DlogNotFound`](FEError::DlogNotFound)
/// if no collision is found within [`POLLARD_RHO_ITERATIONS`] iterations,
/// or no candidate derived from the collision is a solution.
/// - Returns a [`FEError`] of type [`DlogCalcFailed`](FEError::DlogCalcFailed)
/// if `p <= 1`, `n <= 1`, or the collision is degenerate.
pub fn pollard_rho(h: &Z, g: &Z, p: &Z, n: &Z) -> Result<Z, FEError> {
    if p <= &Z::ONE || n <= &Z::ONE {
        return Err(FEError::DlogCalcFailed(String::from(
            "the modulus and the order have to be larger than 1",
        )));
    }

    let walk = RhoWalk { g, h, p, n };
    let mut tortoise = RhoState::start();
    let mut hare = RhoState::start();

    for iteration in 0..POLLARD_RHO_ITERATIONS {
        tortoise = walk.step(tortoise);
        hare = walk.step(walk.step(hare));

        if tortoise.x == hare.x {
            trace!(iteration, "pollard rho collision");
            return walk.solve_collision(&tortoise, &hare);
        }
    }

    Err(FEError::DlogNotFound)
}

/// An element `x = g^a h^b` of the walk of [`pollard_rho`].
struct RhoState {
    x: Z,
    a: Z,
    b: Z,
}

impl RhoState {
    fn start() -> Self {
        Self {
            x: Z::ONE,
            a: Z::ZERO,
            b: Z::ZERO,
        }
    }
}

struct RhoWalk<'a> {
    g: &'a Z,
    h: &'a Z,
    p: &'a Z,
    n: &'a Z,
}

impl RhoWalk<'_> {
    fn step(&self, state: RhoState) -> RhoState {
        let RhoState { x, a, b } = state;
        let partition = x.modulo(&Z::from(3));
        if partition == Z::ZERO {
            RhoState {
                x: (&x * &x).modulo(self.p),
                a: (Z::from(2) * a).modulo(self.n),
                b: (Z::from(2) * b).modulo(self.n),
            }
        } else if partition == Z::ONE {
            RhoState {
                x: (&x * self.g).modulo(self.p),
                a: (a + Z::ONE).modulo(self.n),
                b,
            }
        } else {
            RhoState {
                x: (&x * self.h).modulo(self.p),
                a,
                b: (b + Z::ONE).modulo(self.n),
            }
        }
    }

    /// Solves `g^{a_1} h^{b_1} = g^{a_2} h^{b_2}` for the logarithm of `h`,
    /// i.e. `(b_2 - b_1) x = a_1 - a_2 mod n`.
    fn solve_collision(&self, first: &RhoState, second: &RhoState) -> Result<Z, FEError> {
        let r = (&second.b - &first.b).modulo(self.n);
        let t = (&first.a - &second.a).modulo(self.n);
        if r == Z::ZERO {
            return Err(FEError::DlogCalcFailed(String::from(
                "degenerate collision in pollard rho",
            )));
        }

        let d = r.gcd(self.n);
        if t.div_floor(&d) * &d != t {
            return Err(FEError::DlogCalcFailed(String::from(
                "the collision does not yield a solution",
            )));
        }

        // x = (r/d)^{-1} (t/d) mod n/d, lifted by multiples of n/d
        let reduced_n = self.n.div_floor(&d);
        let base = if reduced_n == Z::ONE {
            Z::ZERO
        } else {
            let r_inv = pow_mod(&r.div_floor(&d), &Z::MINUS_ONE, &reduced_n)?;
            (r_inv * t.div_floor(&d)).modulo(&reduced_n)
        };

        let mut candidate = base;
        while &candidate < self.n {
            if pow_mod(self.g, &candidate, self.p)? == self.h.modulo(self.p) {
                return Ok(candidate);
            }
            candidate = candidate + &reduced_n;
        }

        Err(FEError::DlogNotFound)
    }
}

#[cfg(test)]
mod test_baby_step_giant_step {
    use super::{baby_step_count, baby_step_giant_step, BABY_STEP_GIANT_STEP_MAX_STEPS};
    use crate::{
        error::FEError,
        primitive::group::{pow_mod, Group},
    };
    use qfall_math::{integer::Z, traits::Pow};

    /// Checks a fixed instance with a given order and no bound.
    #[test]
    fn fixed_instance() {
        let (h, g, p, order) = (Z::from(188), Z::from(212), Z::from(227), Z::from(113));

        let x = baby_step_giant_step(&h, &g, &p, Some(&order), None).unwrap();

        assert_eq!(Z::from(101), x);
    }

    /// Checks a fixed instance where the order is derived from the prime modulus.
    #[test]
    fn order_from_prime() {
        let (h, g, p) = (Z::from(188), Z::from(212), Z::from(227));

        let x = baby_step_giant_step(&h, &g, &p, None, None).unwrap();

        assert_eq!(h, pow_mod(&g, &x, &p).unwrap());
    }

    /// Recovers random exponents below `2^20` in a 128 bit group.
    #[test]
    fn bounded_round_trip() {
        let group = Group::new(128).unwrap();
        let bound = Z::from(1 << 20);

        for _ in 0..3 {
            let x = Z::sample_uniform(0, &bound).unwrap();
            let h = pow_mod(&group.g, &x, &group.p).unwrap();

            let res =
                baby_step_giant_step(&h, &group.g, &group.p, Some(&group.q), Some(&bound)).unwrap();

            assert_eq!(x, res);
        }
    }

    /// Ensures that exponents outside the bound are not found.
    #[test]
    fn outside_bound() {
        let group = Group::new(64).unwrap();
        let x = Z::from(5000);
        let h = pow_mod(&group.g, &x, &group.p).unwrap();

        let res = baby_step_giant_step(&h, &group.g, &group.p, Some(&group.q), Some(&x));

        assert!(matches!(res, Err(FEError::DlogNotFound)));
    }

    /// Ensures that a composite modulus without an order is rejected.
    #[test]
    fn composite_without_order() {
        let res = baby_step_giant_step(&Z::from(4), &Z::from(2), &Z::from(15), None, None);

        assert!(matches!(res, Err(FEError::DlogCalcFailed(_))));
    }

    /// Ensures that ranges requiring more than the maximal number of
    /// baby steps are rejected before the table is built.
    #[test]
    fn range_exceeds_table() {
        let group = Group::new(128).unwrap();
        let bound = Z::from(2).pow(50).unwrap();

        let res = baby_step_giant_step(&group.g, &group.g, &group.p, Some(&group.q), Some(&bound));

        assert!(matches!(res, Err(FEError::DlogCalcFailed(_))));
    }

    /// Checks that the number of baby steps covers the searched range.
    #[test]
    fn step_count_covers_range() {
        for bound in [1_i64, 2, 99, 100, 101, 1 << 40, (1 << 40) + 1] {
            let bound = Z::from(bound);
            let m = baby_step_count(&bound);

            assert!(&m * &m >= bound);
            assert!((&m - Z::ONE) * (&m - Z::ONE) < bound);
        }
        assert_eq!(
            Z::from(BABY_STEP_GIANT_STEP_MAX_STEPS),
            baby_step_count(&Z::from(2).pow(48).unwrap())
        );
    }
}


#[cfg(test)]
mod test_pollard_rho {
    use super::pollard_rho;
    use crate::{
        error::FEError,
        primitive::group::{pow_mod, Group},
    };
    use qfall_math::integer::Z;

    /// Checks a fixed instance.
    #[test]
    fn fixed_instance() {
        let (h, g, p, order) = (Z::from(188), Z::from(212), Z::from(227), Z::from(113));

        assert_eq!(Z::from(101), pollard_rho(&h, &g, &p, &order).unwrap());
    }

    /// Ensures that repeated calls give the same result.
    #[test]
    fn deterministic() {
        let group = Group::new(32).unwrap();
        let x = Z::sample_uniform(0, &group.q).unwrap();
        let h = pow_mod(&group.g, &x, &group.p).unwrap();

        let first = pollard_rho(&h, &group.g, &group.p, &group.q);
        let second = pollard_rho(&h, &group.g, &group.p, &group.q);

        match (first, second) {
            (Ok(first), Ok(second)) => {
                assert_eq!(first, second);
                assert_eq!(x, first);
            }
            (Err(FEError::DlogCalcFailed(_)), Err(FEError::DlogCalcFailed(_))) => {}
            _ => panic!("pollard rho is not deterministic"),
        }
    }

    /// Ensures invalid orders are rejected.
    #[test]
    fn invalid_order() {
        let res = pollard_rho(&Z::from(2), &Z::from(3), &Z::from(7), &Z::ONE);

        assert!(matches!(res, Err(FEError::DlogCalcFailed(_))));
    }
}
