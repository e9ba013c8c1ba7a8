// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! TLS-terminated mesh ingress: certificate, then gateway, then route.
//!
//! Each sub-step takes the handle produced by the previous one, so the
//! certificate always exists before the gateway references its secret and
//! the gateway exists before the route binds to it.

use crate::constants::{mesh, redis};
use crate::context::{
    CertificateHandle, GatewayHandle, NamespaceHandle, ObjectRef, ProvisioningContext,
    VirtualServiceHandle,
};
use crate::error::{Operation, Result};
use crate::kubernetes::Applier;
use crate::locals::{Hostnames, Locals};
use crate::types::certificate::{Certificate, CertificateSpec, IssuerRef};
use crate::types::istio::{
    Destination, Gateway, GatewaySpec, HttpRoute, HttpRouteDestination, PortSelector, Server,
    ServerPort, ServerTls, TlsMode, VirtualService, VirtualServiceSpec,
};
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Inputs of the ingress stage, present only when ingress is scheduled
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressPlan {
    pub identity: String,
    /// Endpoint domain, also the name of the cluster issuer
    pub domain: String,
    pub hostnames: Hostnames,
}

/// Run the three ingress sub-steps, recording each handle as it is created
#[instrument(skip_all, fields(namespace = %namespace.name, domain = %plan.domain))]
pub async fn provision_ingress(
    applier: &Applier,
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
    ctx: &mut ProvisioningContext,
) -> Result<()> {
    let certificate = create_certificate(applier, namespace, plan, locals).await?;
    ctx.record_certificate(certificate.clone());

    let gateway = create_gateway(applier, namespace, plan, locals, &certificate).await?;
    ctx.record_gateway(gateway.clone());

    let route = create_virtual_service(applier, namespace, plan, locals, &gateway).await?;
    ctx.record_virtual_service(route);

    info!("Ingress ready for {}", plan.hostnames.to_vec().join(", "));
    Ok(())
}

fn metadata(name: &str, namespace: &NamespaceHandle, locals: &Locals) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.name.clone()),
        labels: Some(locals.labels.clone()),
        ..Default::default()
    }
}

pub fn certificate_secret_name(identity: &str) -> String {
    format!("{}-tls", identity)
}

pub fn build_certificate(namespace: &NamespaceHandle, plan: &IngressPlan, locals: &Locals) -> Certificate {
    Certificate {
        metadata: metadata(&plan.identity, namespace, locals),
        spec: CertificateSpec {
            secret_name: certificate_secret_name(&plan.identity),
            dns_names: plan.hostnames.to_vec(),
            // The issuer is provisioned with the cluster and named after the domain
            issuer_ref: IssuerRef {
                name: plan.domain.clone(),
                kind: mesh::ISSUER_KIND.to_string(),
                group: None,
            },
        },
    }
}

pub async fn create_certificate(
    applier: &Applier,
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
) -> Result<CertificateHandle> {
    let desired = build_certificate(namespace, plan, locals);
    let applied = applier
        .apply_namespaced(&desired, Operation::CreateCertificate, None)
        .await?;

    Ok(CertificateHandle {
        object: ObjectRef {
            name: plan.identity.clone(),
            namespace: namespace.name.clone(),
        },
        secret_name: applied.spec.secret_name,
    })
}

pub fn build_gateway(
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
    certificate: &CertificateHandle,
) -> Gateway {
    let hosts = plan.hostnames.to_vec();
    let selector: BTreeMap<String, String> = mesh::INGRESS_SELECTOR
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let https = Server {
        name: Some(mesh::HTTPS_SERVER_NAME.to_string()),
        port: ServerPort {
            number: mesh::HTTPS_PORT,
            name: mesh::HTTPS_SERVER_NAME.to_string(),
            protocol: "HTTPS".to_string(),
        },
        hosts: hosts.clone(),
        tls: Some(ServerTls {
            mode: Some(TlsMode::Simple),
            credential_name: Some(certificate.secret_name.clone()),
            https_redirect: None,
        }),
    };

    let http = Server {
        name: Some(mesh::HTTP_SERVER_NAME.to_string()),
        port: ServerPort {
            number: mesh::HTTP_PORT,
            name: mesh::HTTP_SERVER_NAME.to_string(),
            protocol: "HTTP".to_string(),
        },
        hosts,
        tls: Some(ServerTls {
            https_redirect: Some(true),
            ..Default::default()
        }),
    };

    Gateway {
        metadata: metadata(&plan.identity, namespace, locals),
        spec: GatewaySpec {
            selector,
            servers: vec![https, http],
        },
    }
}

pub async fn create_gateway(
    applier: &Applier,
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
    certificate: &CertificateHandle,
) -> Result<GatewayHandle> {
    let desired = build_gateway(namespace, plan, locals, certificate);
    let applied = applier
        .apply_namespaced(&desired, Operation::CreateGateway, None)
        .await?;
    Ok(GatewayHandle::from_resource(&applied, namespace))
}

pub fn build_virtual_service(
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
    gateway: &GatewayHandle,
) -> VirtualService {
    VirtualService {
        metadata: metadata(&plan.identity, namespace, locals),
        spec: VirtualServiceSpec {
            gateways: vec![gateway.qualified_name()],
            hosts: plan.hostnames.to_vec(),
            http: vec![HttpRoute {
                name: plan.identity.clone(),
                route: vec![HttpRouteDestination {
                    destination: Destination {
                        host: locals.service_fqdn.clone(),
                        port: PortSelector {
                            number: redis::HTTP_PORT as u32,
                        },
                    },
                }],
            }],
        },
    }
}

pub async fn create_virtual_service(
    applier: &Applier,
    namespace: &NamespaceHandle,
    plan: &IngressPlan,
    locals: &Locals,
    gateway: &GatewayHandle,
) -> Result<VirtualServiceHandle> {
    let desired = build_virtual_service(namespace, plan, locals, gateway);
    let applied = applier
        .apply_namespaced(&desired, Operation::CreateVirtualService, None)
        .await?;
    Ok(VirtualServiceHandle::from_resource(&applied, namespace))
}
