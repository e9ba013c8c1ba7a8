// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Input specification, output contract and the custom resources applied to the cluster.

pub mod certificate;
pub mod helm;
pub mod istio;
pub mod outputs;
pub mod spec;

pub use outputs::StackOutputs;
pub use spec::{CloudProvider, DeploymentSpec};
