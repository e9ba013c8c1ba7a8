// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Caller-supplied description of one cache deployment.
//!
//! The specification is trusted to be structurally valid: `metadata.id` is a
//! non-empty DNS label and domains are well formed.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    pub metadata: DeploymentMetadata,
    #[serde(default)]
    pub environment_info: EnvironmentInfo,
    #[serde(default)]
    pub container: ContainerSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingress: Option<IngressSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_balancer: Option<LoadBalancerSpec>,
}

impl DeploymentSpec {
    /// Load a specification from a YAML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read stack input {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse stack input {}", path.display()))
    }

    /// Deployment identity, used verbatim as namespace name and DNS label
    pub fn id(&self) -> &str {
        &self.metadata.id
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentMetadata {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    #[serde(default)]
    pub env_id: String,
    #[serde(default)]
    pub org_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    #[serde(default)]
    pub resources: ContainerResources,
    #[serde(default = "default_replicas")]
    pub replicas: i32,
    #[serde(default = "default_true")]
    pub is_persistence_enabled: bool,
    #[serde(default = "default_disk_size")]
    pub disk_size: String,
}

impl Default for ContainerSpec {
    fn default() -> Self {
        ContainerSpec {
            resources: ContainerResources::default(),
            replicas: default_replicas(),
            is_persistence_enabled: true,
            disk_size: default_disk_size(),
        }
    }
}

/// Requests and limits, serialised in the shape the chart expects
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContainerResources {
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
}

impl Default for ContainerResources {
    fn default() -> Self {
        ContainerResources {
            requests: ResourceQuantities {
                cpu: "50m".to_string(),
                memory: "100Mi".to_string(),
            },
            limits: ResourceQuantities {
                cpu: "1".to_string(),
                memory: "1Gi".to_string(),
            },
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
}

/// Exposure through the service mesh ingress
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IngressSpec {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub endpoint_domain_name: String,
}

/// Direct network-layer exposure through cloud load balancers
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoadBalancerSpec {
    #[serde(default)]
    pub is_enabled: bool,
    #[serde(default)]
    pub provider: CloudProvider,
    #[serde(default)]
    pub endpoint_domain_name: String,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CloudProvider {
    #[default]
    Gcp,
    Aws,
    Azure,
}

impl CloudProvider {
    /// Annotation that keeps a load balancer reachable only from inside the network
    pub fn internal_annotation(&self) -> (&'static str, &'static str) {
        match self {
            CloudProvider::Gcp => ("cloud.google.com/load-balancer-type", "Internal"),
            CloudProvider::Aws => ("service.beta.kubernetes.io/aws-load-balancer-internal", "true"),
            CloudProvider::Azure => {
                ("service.beta.kubernetes.io/azure-load-balancer-internal", "true")
            }
        }
    }
}

fn default_replicas() -> i32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_disk_size() -> String {
    "1Gi".to_string()
}
