// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: Apache-2.0

//! Test harness for the mail bridge.
//!
//! This module provides client generators, abuse patterns and delay metrics
//! for the tarpit simulations.

pub mod attacks;
pub mod generators;
pub mod metrics;
