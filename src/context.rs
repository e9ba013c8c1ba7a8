// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Accumulated record of the resources a provisioning run has created.
//!
//! Stages never reach into each other: the orchestrator hands every stage the
//! handles it depends on and records what the stage produced here. Each slot
//! is written once per run; a second write overwrites and logs a warning.

use kube::{Resource, ResourceExt};
use tracing::{debug, warn};

/// Name and namespace of a namespaced object created by a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRef {
    pub name: String,
    pub namespace: String,
}

impl ObjectRef {
    fn from_resource<K: Resource>(resource: &K, fallback_namespace: &str) -> Self {
        ObjectRef {
            name: resource.name_any(),
            namespace: resource
                .namespace()
                .unwrap_or_else(|| fallback_namespace.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceHandle {
    pub name: String,
    pub uid: Option<String>,
}

impl NamespaceHandle {
    pub fn from_resource<K: Resource>(namespace: &K) -> Self {
        NamespaceHandle {
            name: namespace.name_any(),
            uid: namespace.uid(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartHandle(pub ObjectRef);

impl ChartHandle {
    pub fn from_resource<K: Resource>(chart: &K, namespace: &NamespaceHandle) -> Self {
        ChartHandle(ObjectRef::from_resource(chart, &namespace.name))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateHandle {
    pub object: ObjectRef,
    /// Secret the issuer stores the key pair in
    pub secret_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayHandle(pub ObjectRef);

impl GatewayHandle {
    pub fn from_resource<K: Resource>(gateway: &K, namespace: &NamespaceHandle) -> Self {
        GatewayHandle(ObjectRef::from_resource(gateway, &namespace.name))
    }

    /// `namespace/name`, the form routes use to bind to a gateway
    pub fn qualified_name(&self) -> String {
        format!("{}/{}", self.0.namespace, self.0.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualServiceHandle(pub ObjectRef);

impl VirtualServiceHandle {
    pub fn from_resource<K: Resource>(route: &K, namespace: &NamespaceHandle) -> Self {
        VirtualServiceHandle(ObjectRef::from_resource(route, &namespace.name))
    }
}

/// Reachability of a load balancer service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    External,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub object: ObjectRef,
    pub exposure: Exposure,
}

impl ServiceHandle {
    pub fn from_resource<K: Resource>(
        service: &K,
        namespace: &NamespaceHandle,
        exposure: Exposure,
    ) -> Self {
        ServiceHandle {
            object: ObjectRef::from_resource(service, &namespace.name),
            exposure,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddedResources {
    pub namespace: Option<NamespaceHandle>,
    pub chart: Option<ChartHandle>,
    pub certificate: Option<CertificateHandle>,
    pub gateway: Option<GatewayHandle>,
    pub virtual_service: Option<VirtualServiceHandle>,
    pub load_balancer_external_service: Option<ServiceHandle>,
    pub load_balancer_internal_service: Option<ServiceHandle>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisioningContext {
    added: AddedResources,
}

impl ProvisioningContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> &AddedResources {
        &self.added
    }

    pub fn namespace(&self) -> Option<&NamespaceHandle> {
        self.added.namespace.as_ref()
    }

    pub fn certificate(&self) -> Option<&CertificateHandle> {
        self.added.certificate.as_ref()
    }

    pub fn gateway(&self) -> Option<&GatewayHandle> {
        self.added.gateway.as_ref()
    }

    pub fn record_namespace(&mut self, handle: NamespaceHandle) {
        record(&mut self.added.namespace, "namespace", handle);
    }

    pub fn record_chart(&mut self, handle: ChartHandle) {
        record(&mut self.added.chart, "chart", handle);
    }

    pub fn record_certificate(&mut self, handle: CertificateHandle) {
        record(&mut self.added.certificate, "certificate", handle);
    }

    pub fn record_gateway(&mut self, handle: GatewayHandle) {
        record(&mut self.added.gateway, "gateway", handle);
    }

    pub fn record_virtual_service(&mut self, handle: VirtualServiceHandle) {
        record(&mut self.added.virtual_service, "virtual-service", handle);
    }

    pub fn record_load_balancers(&mut self, external: ServiceHandle, internal: ServiceHandle) {
        record(
            &mut self.added.load_balancer_external_service,
            "external load balancer",
            external,
        );
        record(
            &mut self.added.load_balancer_internal_service,
            "internal load balancer",
            internal,
        );
    }
}

fn record<T: std::fmt::Debug>(slot: &mut Option<T>, what: &str, handle: T) {
    if let Some(previous) = slot.as_ref() {
        warn!("{} already recorded as {:?}, replacing with {:?}", what, previous, handle);
    } else {
        debug!("Recorded {}: {:?}", what, handle);
    }
    *slot = Some(handle);
}
