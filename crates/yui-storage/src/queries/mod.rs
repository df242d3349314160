// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed query modules over the relational store.

pub mod messages;
pub mod profiles;
pub mod sessions;
