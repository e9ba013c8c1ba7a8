// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Values derived once from the deployment specification and shared by every stage.

use crate::constants::{labels, redis};
use crate::types::{DeploymentSpec, StackOutputs};
use std::collections::BTreeMap;

/// External and internal hostnames published for a deployment under a domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hostnames {
    pub external: String,
    pub internal: String,
}

impl Hostnames {
    pub fn new(identity: &str, domain: &str) -> Self {
        Hostnames {
            external: format!("{}.{}", identity, domain),
            internal: format!("{}-internal.{}", identity, domain),
        }
    }

    /// Both hostnames, external first
    pub fn to_vec(&self) -> Vec<String> {
        vec![self.external.clone(), self.internal.clone()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locals {
    pub namespace: String,
    /// Labels stamped on the namespace and every object inside it
    pub labels: BTreeMap<String, String>,
    /// Labels identifying the primary-role pods
    pub selector_labels: BTreeMap<String, String>,
    pub service_name: String,
    pub service_fqdn: String,
    pub port_forward_command: String,
    /// Set only when ingress is enabled with a non-empty domain
    pub ingress: Option<Hostnames>,
}

impl Locals {
    pub fn derive(spec: &DeploymentSpec) -> Self {
        let identity = spec.id();
        let namespace = identity.to_string();

        let labels = BTreeMap::from([
            (labels::ENVIRONMENT.to_string(), spec.environment_info.env_id.clone()),
            (labels::ORGANIZATION.to_string(), spec.environment_info.org_id.clone()),
            (labels::RESOURCE.to_string(), true.to_string()),
            (labels::RESOURCE_ID.to_string(), identity.to_string()),
            (labels::RESOURCE_KIND.to_string(), labels::KIND_REDIS_KUBERNETES.to_string()),
        ]);

        let selector_labels = BTreeMap::from([
            (labels::K8S_COMPONENT.to_string(), redis::MASTER_SUFFIX.to_string()),
            (labels::K8S_INSTANCE.to_string(), identity.to_string()),
            (labels::K8S_NAME.to_string(), redis::APP_NAME.to_string()),
        ]);

        let service_name = format!("{}-{}", identity, redis::MASTER_SUFFIX);
        let service_fqdn = format!("{}.{}.svc.cluster.local", service_name, namespace);
        let port_forward_command = format!(
            "kubectl port-forward -n {} service/{} {}:{}",
            namespace,
            service_name,
            redis::HTTP_PORT,
            redis::HTTP_PORT
        );

        let ingress = spec
            .ingress
            .as_ref()
            .filter(|i| i.is_enabled && !i.endpoint_domain_name.is_empty())
            .map(|i| Hostnames::new(identity, &i.endpoint_domain_name));

        Locals {
            namespace,
            labels,
            selector_labels,
            service_name,
            service_fqdn,
            port_forward_command,
            ingress,
        }
    }

    pub fn outputs(&self) -> StackOutputs {
        StackOutputs {
            namespace: self.namespace.clone(),
            service: self.service_name.clone(),
            kube_endpoint: self.service_fqdn.clone(),
            kube_port_forward_command: self.port_forward_command.clone(),
            ingress_external_hostname: self.ingress.as_ref().map(|h| h.external.clone()),
            ingress_internal_hostname: self.ingress.as_ref().map(|h| h.internal.clone()),
        }
    }
}
