// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Resource-synthesis stages, in execution order.

pub mod chart;
pub mod ingress;
pub mod load_balancer;
pub mod namespace;

pub use chart::install_chart;
pub use ingress::{provision_ingress, IngressPlan};
pub use load_balancer::{provision_load_balancers, LoadBalancerPlan};
pub use namespace::create_namespace;
