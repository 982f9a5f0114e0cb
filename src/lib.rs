// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This crate provides inner-product functional encryption schemes based on
//! the decisional Diffie-Hellman assumption, Paillier's composite residuosity
//! assumption and the learning with errors problem, together with the
//! primitives they are built from, i.e. discrete logarithm algorithms,
//! prime and group generation, and discrete Gaussian samplers.

pub mod construction;
pub mod error;
pub mod primitive;
pub mod sample;
pub mod utils;
