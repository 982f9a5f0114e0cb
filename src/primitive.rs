// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains mathematical primitives that are useful for cryptographic
//! constructions/purposes, but themselves do not provide security guarantees like
//! confidentiality, integrity, ...
//!
//! This includes the generation of (safe) primes and cyclic groups and
//! algorithms to compute discrete logarithms.

pub mod dlog;
pub mod group;
