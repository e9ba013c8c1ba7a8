// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

/// Addressable locations reported back to the caller after a run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StackOutputs {
    pub namespace: String,
    pub service: String,
    pub kube_endpoint: String,
    pub kube_port_forward_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_external_hostname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress_internal_hostname: Option<String>,
}
