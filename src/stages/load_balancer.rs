// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cloud load balancers exposing the cache client port directly.

use crate::constants::{annotations, labels, load_balancer, redis};
use crate::context::{Exposure, NamespaceHandle, ProvisioningContext, ServiceHandle};
use crate::error::{Operation, Result};
use crate::kubernetes::Applier;
use crate::locals::{Hostnames, Locals};
use crate::types::CloudProvider;
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument};

/// Inputs of the load balancer stage, present only when the stage is scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerPlan {
    pub provider: CloudProvider,
    pub domain: String,
    /// Unset when no domain was given; DNS hints are then left off
    pub hostnames: Option<Hostnames>,
}

/// Pods the load balancers forward to.
///
/// The instance label is fixed to the application name, so it does not
/// follow the deployment identity.
pub fn load_balancer_selector() -> BTreeMap<String, String> {
    BTreeMap::from([
        (labels::K8S_COMPONENT.to_string(), redis::MASTER_SUFFIX.to_string()),
        (labels::K8S_INSTANCE.to_string(), redis::APP_NAME.to_string()),
        (labels::K8S_NAME.to_string(), redis::APP_NAME.to_string()),
    ])
}

fn dns_annotations(plan: &LoadBalancerPlan, hostname: Option<&str>) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    if let Some(hostname) = hostname {
        result.insert(
            annotations::ENDPOINT_DOMAIN_NAME.to_string(),
            plan.domain.clone(),
        );
        result.insert(
            annotations::EXTERNAL_DNS_HOSTNAME.to_string(),
            hostname.to_string(),
        );
    }
    result
}

fn service(
    name: &str,
    namespace: &NamespaceHandle,
    labels: Option<BTreeMap<String, String>>,
    annotations: BTreeMap<String, String>,
) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.name.clone()),
            labels,
            annotations: (!annotations.is_empty()).then_some(annotations),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            selector: Some(load_balancer_selector()),
            ports: Some(vec![ServicePort {
                name: Some(load_balancer::PORT_NAME.to_string()),
                protocol: Some("TCP".to_string()),
                port: redis::CLIENT_PORT,
                target_port: Some(IntOrString::String(redis::CONTAINER_PORT_NAME.to_string())),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn build_external_service(namespace: &NamespaceHandle, plan: &LoadBalancerPlan) -> Service {
    let hostname = plan.hostnames.as_ref().map(|h| h.external.as_str());
    service(
        load_balancer::EXTERNAL_SERVICE_NAME,
        namespace,
        None,
        dns_annotations(plan, hostname),
    )
}

pub fn build_internal_service(
    namespace: &NamespaceHandle,
    plan: &LoadBalancerPlan,
    locals: &Locals,
) -> Service {
    let hostname = plan.hostnames.as_ref().map(|h| h.internal.as_str());
    let mut annotations = dns_annotations(plan, hostname);
    let (key, value) = plan.provider.internal_annotation();
    annotations.insert(key.to_string(), value.to_string());

    service(
        load_balancer::INTERNAL_SERVICE_NAME,
        namespace,
        Some(locals.labels.clone()),
        annotations,
    )
}

/// Create the external then the internal load balancer.
///
/// Handles are recorded only once both services exist; a failure on the
/// external service leaves the internal one unattempted.
///
/// `timeout` bounds each apply call only. Cloud provisioning of the load
/// balancer address continues after the call returns and is not awaited.
#[instrument(skip_all, fields(namespace = %namespace.name, provider = ?plan.provider))]
pub async fn provision_load_balancers(
    applier: &Applier,
    namespace: &NamespaceHandle,
    plan: &LoadBalancerPlan,
    locals: &Locals,
    timeout: Duration,
    ctx: &mut ProvisioningContext,
) -> Result<()> {
    let external = applier
        .apply_namespaced(
            &build_external_service(namespace, plan),
            Operation::CreateExternalLoadBalancer,
            Some(timeout),
        )
        .await?;

    let internal = applier
        .apply_namespaced(
            &build_internal_service(namespace, plan, locals),
            Operation::CreateInternalLoadBalancer,
            Some(timeout),
        )
        .await?;

    ctx.record_load_balancers(
        ServiceHandle::from_resource(&external, namespace, Exposure::External),
        ServiceHandle::from_resource(&internal, namespace, Exposure::Internal),
    );
    info!("Load balancers applied in {}", namespace.name);
    Ok(())
}
