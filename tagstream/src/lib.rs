// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

pub mod config;
pub mod context;
pub mod conversation;
pub mod diagnostics;
pub mod hooks;
pub mod message;
pub mod plugin;
pub mod registry;
pub mod render;
pub mod scanner;
pub mod session;
pub mod transport;
