// SPDX-FileCopyrightText: 2026 Yui Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Web gateway: HTTP health endpoint plus a WebSocket chat endpoint.
//!
//! Live connections are tracked in an explicit map owned by the gateway
//! state; entries are inserted on upgrade and removed deterministically on
//! disconnect. Each connection owns an independent `ConversationManager`
//! (and thus its own session), so connections are isolated by
//! partitioning.

pub mod server;
pub mod ws;

pub use server::{GatewayState, router, serve};
