// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Stage selection and the provisioning run.
//!
//! Which optional stages run is decided once, up front, from the deployment
//! specification. The run then walks the scheduled stages in order, handing
//! each one the handles it needs and recording what it produced in the
//! [`ProvisioningContext`]. The first failing stage aborts the run.

use crate::config::Config;
use crate::context::ProvisioningContext;
use crate::error::Result;
use crate::kubernetes::{delete_namespace, ensure_served, Applier};
use crate::locals::{Hostnames, Locals};
use crate::stages::{
    create_namespace, install_chart, provision_ingress, provision_load_balancers, IngressPlan,
    LoadBalancerPlan,
};
use crate::types::certificate::Certificate;
use crate::types::helm::HelmChart;
use crate::types::istio::{Gateway, VirtualService};
use crate::types::{DeploymentSpec, StackOutputs};
use kube::Client;
use std::fmt;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Namespace,
    ChartInstall,
    Ingress,
    LoadBalancer,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Namespace => "namespace",
            StageKind::ChartInstall => "chart-install",
            StageKind::Ingress => "ingress",
            StageKind::LoadBalancer => "load-balancer",
        };
        f.write_str(name)
    }
}

/// The optional stages scheduled for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    pub ingress: Option<IngressPlan>,
    pub load_balancer: Option<LoadBalancerPlan>,
}

impl StagePlan {
    pub fn select(spec: &DeploymentSpec, locals: &Locals) -> Self {
        let ingress = locals.ingress.as_ref().and_then(|hostnames| {
            spec.ingress.as_ref().map(|i| IngressPlan {
                identity: spec.id().to_string(),
                domain: i.endpoint_domain_name.clone(),
                hostnames: hostnames.clone(),
            })
        });

        let load_balancer = spec
            .load_balancer
            .as_ref()
            .filter(|lb| lb.is_enabled)
            .map(|lb| LoadBalancerPlan {
                provider: lb.provider,
                domain: lb.endpoint_domain_name.clone(),
                hostnames: (!lb.endpoint_domain_name.is_empty())
                    .then(|| Hostnames::new(spec.id(), &lb.endpoint_domain_name)),
            });

        StagePlan {
            ingress,
            load_balancer,
        }
    }

    /// Scheduled stages in execution order
    pub fn stages(&self) -> Vec<StageKind> {
        let mut stages = vec![StageKind::Namespace, StageKind::ChartInstall];
        if self.ingress.is_some() {
            stages.push(StageKind::Ingress);
        }
        if self.load_balancer.is_some() {
            stages.push(StageKind::LoadBalancer);
        }
        stages
    }
}

/// Result of a successful run
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub outputs: StackOutputs,
    pub context: ProvisioningContext,
}

/// Runs the stage pipeline against one cluster
pub struct Provisioner {
    applier: Applier,
    config: Config,
}

impl Provisioner {
    pub fn new(client: Client, config: Config) -> Self {
        Provisioner {
            applier: Applier::new(client, config.dry_run),
            config,
        }
    }

    /// Create or update every object of the deployment
    #[instrument(skip_all, fields(id = %spec.id()))]
    pub async fn up(&self, spec: &DeploymentSpec) -> Result<Provisioned> {
        let locals = Locals::derive(spec);
        let plan = StagePlan::select(spec, &locals);
        let stages: Vec<String> = plan.stages().iter().map(|s| s.to_string()).collect();
        info!("Scheduled stages: {}", stages.join(", "));

        if self.config.verify_apis {
            self.preflight(&plan).await?;
        }

        let mut ctx = ProvisioningContext::new();

        let namespace = create_namespace(&self.applier, &locals).await?;
        ctx.record_namespace(namespace.clone());

        let chart = install_chart(&self.applier, &namespace, spec, &locals, &self.config).await?;
        ctx.record_chart(chart);

        if let Some(ingress) = &plan.ingress {
            provision_ingress(&self.applier, &namespace, ingress, &locals, &mut ctx).await?;
        }

        if let Some(load_balancer) = &plan.load_balancer {
            provision_load_balancers(
                &self.applier,
                &namespace,
                load_balancer,
                &locals,
                self.config.load_balancer_timeout,
                &mut ctx,
            )
            .await?;
        }

        info!("Deployment {} provisioned", spec.id());
        Ok(Provisioned {
            outputs: locals.outputs(),
            context: ctx,
        })
    }

    /// Release the deployment by deleting its namespace
    #[instrument(skip_all, fields(id = %spec.id()))]
    pub async fn destroy(&self, spec: &DeploymentSpec) -> Result<()> {
        let locals = Locals::derive(spec);
        delete_namespace(self.applier.client(), &locals.namespace, self.config.dry_run).await
    }

    async fn preflight(&self, plan: &StagePlan) -> Result<()> {
        let client = self.applier.client();
        ensure_served::<HelmChart>(client).await?;
        if plan.ingress.is_some() {
            ensure_served::<Certificate>(client).await?;
            ensure_served::<Gateway>(client).await?;
            ensure_served::<VirtualService>(client).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Operation, StackError};
    use crate::test_utils::{status_json, MockService};
    use crate::types::spec::{DeploymentMetadata, IngressSpec, LoadBalancerSpec};
    use crate::types::CloudProvider;
    use std::time::Duration;

    const NAMESPACE_PATH: &str = "/api/v1/namespaces/cache1";
    const CHART_PATH: &str = "/apis/helm.cattle.io/v1/namespaces/cache1/helmcharts/cache1";
    const CERTIFICATE_PATH: &str = "/apis/cert-manager.io/v1/namespaces/cache1/certificates/cache1";
    const GATEWAY_PATH: &str = "/apis/networking.istio.io/v1/namespaces/cache1/gateways/cache1";
    const ROUTE_PATH: &str =
        "/apis/networking.istio.io/v1/namespaces/cache1/virtualservices/cache1";
    const EXTERNAL_LB_PATH: &str = "/api/v1/namespaces/cache1/services/ingress-external-lb";
    const INTERNAL_LB_PATH: &str = "/api/v1/namespaces/cache1/services/ingress-internal-lb";

    fn make_spec(domain: Option<&str>, load_balancer: bool) -> DeploymentSpec {
        DeploymentSpec {
            metadata: DeploymentMetadata {
                id: "cache1".to_string(),
                name: "Cache One".to_string(),
            },
            ingress: domain.map(|d| IngressSpec {
                is_enabled: true,
                endpoint_domain_name: d.to_string(),
            }),
            load_balancer: load_balancer.then(|| LoadBalancerSpec {
                is_enabled: true,
                provider: CloudProvider::Aws,
                endpoint_domain_name: "example.com".to_string(),
            }),
            ..Default::default()
        }
    }

    fn test_config() -> Config {
        Config {
            verify_apis: false,
            ..Default::default()
        }
    }

    fn provisioner(mock: &MockService, config: Config) -> Provisioner {
        Provisioner::new(mock.clone().into_client(), config)
    }

    #[test]
    fn test_plan_without_optional_stages() {
        let spec = make_spec(None, false);
        let plan = StagePlan::select(&spec, &Locals::derive(&spec));

        assert_eq!(plan.stages(), vec![StageKind::Namespace, StageKind::ChartInstall]);
    }

    #[test]
    fn test_plan_skips_ingress_with_empty_domain() {
        let spec = make_spec(Some(""), false);
        let plan = StagePlan::select(&spec, &Locals::derive(&spec));

        assert!(plan.ingress.is_none());
        assert!(!plan.stages().contains(&StageKind::Ingress));
    }

    #[test]
    fn test_plan_with_all_stages() {
        let spec = make_spec(Some("example.com"), true);
        let plan = StagePlan::select(&spec, &Locals::derive(&spec));

        assert_eq!(
            plan.stages(),
            vec![
                StageKind::Namespace,
                StageKind::ChartInstall,
                StageKind::Ingress,
                StageKind::LoadBalancer
            ]
        );
        let ingress = plan.ingress.unwrap();
        assert_eq!(ingress.domain, "example.com");
        assert_eq!(ingress.hostnames.external, "cache1.example.com");
        assert_eq!(plan.load_balancer.unwrap().provider, CloudProvider::Aws);
    }

    #[test]
    fn test_plan_disabled_load_balancer() {
        let mut spec = make_spec(None, true);
        if let Some(lb) = spec.load_balancer.as_mut() {
            lb.is_enabled = false;
        }
        let plan = StagePlan::select(&spec, &Locals::derive(&spec));
        assert!(plan.load_balancer.is_none());
    }

    #[test]
    fn test_plan_load_balancer_without_domain_has_no_hostnames() {
        let mut spec = make_spec(None, true);
        if let Some(lb) = spec.load_balancer.as_mut() {
            lb.endpoint_domain_name = String::new();
        }
        let plan = StagePlan::select(&spec, &Locals::derive(&spec));
        assert!(plan.load_balancer.unwrap().hostnames.is_none());
    }

    #[tokio::test]
    async fn test_up_applies_stages_in_order() {
        let mock = MockService::new();
        let provisioned = provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), true))
            .await
            .unwrap();

        assert_eq!(
            mock.applied_paths(),
            vec![
                NAMESPACE_PATH,
                CHART_PATH,
                CERTIFICATE_PATH,
                GATEWAY_PATH,
                ROUTE_PATH,
                EXTERNAL_LB_PATH,
                INTERNAL_LB_PATH
            ]
        );

        let added = provisioned.context.added();
        assert_eq!(added.namespace.as_ref().unwrap().name, "cache1");
        assert!(added.chart.is_some());
        assert_eq!(added.certificate.as_ref().unwrap().secret_name, "cache1-tls");
        assert_eq!(added.gateway.as_ref().unwrap().qualified_name(), "cache1/cache1");
        assert!(added.virtual_service.is_some());
        assert_eq!(
            added.load_balancer_internal_service.as_ref().unwrap().object.name,
            "ingress-internal-lb"
        );

        let outputs = provisioned.outputs;
        assert_eq!(outputs.service, "cache1-master");
        assert_eq!(outputs.ingress_external_hostname.as_deref(), Some("cache1.example.com"));
    }

    #[tokio::test]
    async fn test_gateway_uses_secret_returned_for_certificate() {
        let certificate = serde_json::json!({
            "apiVersion": "cert-manager.io/v1",
            "kind": "Certificate",
            "metadata": { "name": "cache1", "namespace": "cache1" },
            "spec": {
                "secretName": "issued-by-server",
                "dnsNames": ["cache1.example.com", "cache1-internal.example.com"],
                "issuerRef": { "name": "example.com", "kind": "ClusterIssuer" }
            }
        });
        let mock = MockService::new().on_patch(CERTIFICATE_PATH, 200, &certificate.to_string());

        provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), false))
            .await
            .unwrap();

        let gateway = mock.applied_body(GATEWAY_PATH).unwrap();
        assert_eq!(
            gateway["spec"]["servers"][0]["tls"]["credentialName"],
            "issued-by-server"
        );

        let route = mock.applied_body(ROUTE_PATH).unwrap();
        assert_eq!(route["spec"]["gateways"][0], "cache1/cache1");
    }

    #[tokio::test]
    async fn test_up_without_ingress_skips_ingress_objects() {
        let mock = MockService::new();
        let provisioned = provisioner(&mock, test_config())
            .up(&make_spec(None, false))
            .await
            .unwrap();

        assert_eq!(mock.applied_paths(), vec![NAMESPACE_PATH, CHART_PATH]);
        assert!(provisioned.context.certificate().is_none());
        assert!(provisioned.outputs.ingress_external_hostname.is_none());
        assert!(provisioned.outputs.ingress_internal_hostname.is_none());
    }

    #[tokio::test]
    async fn test_external_load_balancer_failure_stops_run() {
        let mock = MockService::new().on_patch(
            EXTERNAL_LB_PATH,
            500,
            &status_json(500, "InternalError", "quota exceeded"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(None, true))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::Stage { .. }));
        assert_eq!(err.operation(), Some(Operation::CreateExternalLoadBalancer));
        assert!(err.to_string().starts_with("failed to create external load balancer"));
        assert!(!mock.applied_paths().contains(&INTERNAL_LB_PATH.to_string()));
    }

    #[tokio::test]
    async fn test_internal_load_balancer_failure_after_external_created() {
        let mock = MockService::new().on_patch(
            INTERNAL_LB_PATH,
            500,
            &status_json(500, "InternalError", "subnet exhausted"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(None, true))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::Stage { .. }));
        assert_eq!(err.operation(), Some(Operation::CreateInternalLoadBalancer));
        assert!(err.to_string().starts_with("failed to create internal load balancer"));
        assert_eq!(
            mock.applied_paths(),
            vec![NAMESPACE_PATH, CHART_PATH, EXTERNAL_LB_PATH, INTERNAL_LB_PATH]
        );
        // no cleanup of the external service
        assert!(!mock.requests().iter().any(|r| r.method == "DELETE"));
    }

    #[tokio::test]
    async fn test_load_balancer_handles_recorded_only_when_both_succeed() {
        let mock = MockService::new().on_patch(
            INTERNAL_LB_PATH,
            500,
            &status_json(500, "InternalError", "subnet exhausted"),
        );
        let provisioner = provisioner(&mock, test_config());
        let spec = make_spec(None, true);
        let locals = Locals::derive(&spec);
        let plan = StagePlan::select(&spec, &locals);
        let namespace = crate::context::NamespaceHandle {
            name: "cache1".to_string(),
            uid: None,
        };
        let mut ctx = ProvisioningContext::new();

        let result = provision_load_balancers(
            &provisioner.applier,
            &namespace,
            plan.load_balancer.as_ref().unwrap(),
            &locals,
            Duration::from_secs(5),
            &mut ctx,
        )
        .await;

        assert!(result.is_err());
        assert!(ctx.added().load_balancer_external_service.is_none());
        assert!(ctx.added().load_balancer_internal_service.is_none());
    }

    #[tokio::test]
    async fn test_certificate_failure_stops_ingress_chain() {
        let mock = MockService::new().on_patch(
            CERTIFICATE_PATH,
            409,
            &status_json(409, "Conflict", "certificates \"cache1\" is being deleted"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), true))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(Operation::CreateCertificate));
        let applied = mock.applied_paths();
        assert_eq!(applied, vec![NAMESPACE_PATH, CHART_PATH, CERTIFICATE_PATH]);
        assert!(!applied.contains(&GATEWAY_PATH.to_string()));
        assert!(!applied.contains(&ROUTE_PATH.to_string()));
    }

    #[tokio::test]
    async fn test_gateway_failure_skips_route() {
        let mock = MockService::new().on_patch(
            GATEWAY_PATH,
            422,
            &status_json(422, "Invalid", "spec.servers: Invalid value"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), false))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(Operation::CreateGateway));
        assert!(!mock.applied_paths().contains(&ROUTE_PATH.to_string()));
    }

    #[tokio::test]
    async fn test_chart_failure_reports_install() {
        let mock = MockService::new().on_patch(
            CHART_PATH,
            500,
            &status_json(500, "InternalError", "webhook unavailable"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), true))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(Operation::InstallChart));
        assert!(err.to_string().starts_with("failed to install helm chart"));
        assert_eq!(mock.applied_paths(), vec![NAMESPACE_PATH, CHART_PATH]);
    }

    #[tokio::test]
    async fn test_namespace_failure_aborts_before_chart() {
        let mock = MockService::new().on_patch(
            NAMESPACE_PATH,
            403,
            &status_json(403, "Forbidden", "namespaces is forbidden"),
        );

        let err = provisioner(&mock, test_config())
            .up(&make_spec(Some("example.com"), true))
            .await
            .unwrap_err();

        assert_eq!(err.operation(), Some(Operation::CreateNamespace));
        assert_eq!(mock.applied_paths(), vec![NAMESPACE_PATH]);
    }

    #[tokio::test]
    async fn test_stuck_load_balancer_times_out() {
        let mock = MockService::new().hang_on_patch(EXTERNAL_LB_PATH);
        let config = Config {
            load_balancer_timeout: Duration::from_millis(50),
            ..test_config()
        };

        let err = provisioner(&mock, config)
            .up(&make_spec(None, true))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::Timeout { .. }));
        assert_eq!(err.operation(), Some(Operation::CreateExternalLoadBalancer));
    }

    #[tokio::test]
    async fn test_preflight_fails_when_api_missing() {
        let mock = MockService::new().on_get(
            "/apis",
            200,
            r#"{"kind":"APIGroupList","apiVersion":"v1","groups":[]}"#,
        );
        let config = Config {
            verify_apis: true,
            ..test_config()
        };

        let err = provisioner(&mock, config)
            .up(&make_spec(None, false))
            .await
            .unwrap_err();

        assert!(matches!(err, StackError::MissingApi(ref api) if api == "helm.cattle.io/v1 HelmChart"));
        assert!(mock.applied_paths().is_empty());
    }

    #[tokio::test]
    async fn test_destroy_deletes_namespace() {
        let mock = MockService::new();
        provisioner(&mock, test_config())
            .destroy(&make_spec(Some("example.com"), true))
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(requests[0].path, NAMESPACE_PATH);
    }
}
