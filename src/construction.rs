// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains functional encryption constructions.
//! A construction is build the same way:
//!
//! 1. A trait that combines the common feature, e.g.
//! [`inner-product functional encryption`](inner_product::InnerProductFE).
//! 2. Explicit implementations of the trait, e.g.
//! [`Ddh`](inner_product::Ddh).

pub mod inner_product;
