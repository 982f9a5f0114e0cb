// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

use criterion::*;
use qfall_fe::primitive::{
    dlog::{baby_step_giant_step, pollard_rho},
    group::{pow_mod, Group},
};
use qfall_math::integer::Z;

/// Benchmark [baby_step_giant_step] for exponents below `2^20`
/// in a `128` bit group.
///
/// This benchmark can be run with for example:
/// - `cargo criterion BSGS\ bound=2^20`
/// - `cargo bench --bench benchmarks BSGS\ bound=2^20`
/// - `cargo flamegraph --bench benchmarks -- --bench BSGS\ bound=2^20`
fn bench_bsgs(c: &mut Criterion) {
    let group = Group::new(128).unwrap();
    let bound = Z::from(1 << 20);
    let x = Z::sample_uniform(0, &bound).unwrap();
    let h = pow_mod(&group.g, &x, &group.p).unwrap();

    c.bench_function("BSGS bound=2^20", |b| {
        b.iter(|| baby_step_giant_step(&h, &group.g, &group.p, Some(&group.q), Some(&bound)))
    });
}

/// Benchmark [pollard_rho] in the subgroup of quadratic residues
/// with `32` bit order.
///
/// This benchmark can be run with for example:
/// - `cargo criterion Pollard\ rho`
/// - `cargo bench --bench benchmarks Pollard\ rho`
fn bench_pollard_rho(c: &mut Criterion) {
    let group = Group::new(34).unwrap();
    let x = Z::sample_uniform(0, &group.q).unwrap();
    let h = pow_mod(&group.g, &x, &group.p).unwrap();

    c.bench_function("Pollard rho order=2^32", |b| {
        b.iter(|| pollard_rho(&h, &group.g, &group.p, &group.q))
    });
}

criterion_group!(benches, bench_bsgs, bench_pollard_rho);
