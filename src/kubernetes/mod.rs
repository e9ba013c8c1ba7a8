// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation, server-side apply, API discovery and namespaces.

pub mod apply;
pub mod client;
pub mod crd;
pub mod namespaces;

pub use apply::Applier;
pub use client::create_client;
pub use crd::ensure_served;
pub use namespaces::{build_namespace, delete_namespace};
