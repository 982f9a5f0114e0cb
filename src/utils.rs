// Copyright © 2024 The qFALL-fe authors
//
// This file is part of qFALL-fe.
//
// qFALL-fe is free software: you can redistribute it and/or modify it under
// the terms of the Mozilla Public License Version 2.0 as published by the
// Mozilla Foundation. See <https://mozilla.org/en-US/MPL/2.0/>.

//! This module contains common functions that are used by sub functions.
//!
//! This includes conversions between arbitrary precision values and [`f64`]
//! approximations as well as small number theoretic helpers.

pub mod numeric;
