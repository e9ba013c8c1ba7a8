// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use kube::CustomResource;
use serde::{Deserialize, Serialize};

/// Chart install request picked up by the in-cluster helm-controller
#[derive(CustomResource, Serialize, Deserialize, Clone, Debug, PartialEq, schemars::JsonSchema)]
#[kube(group = "helm.cattle.io", version = "v1", kind = "HelmChart")]
#[kube(namespaced)]
#[serde(rename_all = "camelCase")]
pub struct HelmChartSpec {
    pub chart: String,
    pub repo: String,
    pub version: String,
    pub target_namespace: String,
    /// Chart values rendered as a YAML document
    pub values_content: String,
}
