// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Installs the packaged cache application into the deployment namespace.

use crate::config::Config;
use crate::context::{ChartHandle, NamespaceHandle};
use crate::error::{Operation, Result};
use crate::kubernetes::Applier;
use crate::locals::Locals;
use crate::types::helm::{HelmChart, HelmChartSpec};
use crate::types::DeploymentSpec;
use serde_json::{json, Value};
use tracing::{info, instrument};

/// Value tree handed to the chart
pub fn chart_values(spec: &DeploymentSpec, locals: &Locals, config: &Config) -> Value {
    let container = &spec.container;
    let persistence = json!({
        "enabled": container.is_persistence_enabled,
        "size": container.disk_size,
    });

    json!({
        "fullnameOverride": spec.id(),
        "architecture": "standalone",
        "master": {
            "podLabels": locals.labels,
            "resources": container.resources,
            "persistence": persistence,
        },
        "replica": {
            "podLabels": locals.labels,
            "replicaCount": container.replicas,
            "resources": container.resources,
            "persistence": persistence,
        },
        "auth": {
            "existingSecret": config.password_secret_name,
            "existingSecretPasswordKey": config.password_secret_key,
        },
    })
}

pub fn build_helm_chart(
    namespace: &NamespaceHandle,
    spec: &DeploymentSpec,
    locals: &Locals,
    config: &Config,
) -> Result<HelmChart> {
    let values_content = serde_yaml::to_string(&chart_values(spec, locals, config))?;

    let mut chart = HelmChart::new(
        spec.id(),
        HelmChartSpec {
            chart: config.chart.name.clone(),
            repo: config.chart.repo.to_string(),
            version: config.chart.version.clone(),
            target_namespace: namespace.name.clone(),
            values_content,
        },
    );
    chart.metadata.namespace = Some(namespace.name.clone());
    chart.metadata.labels = Some(locals.labels.clone());
    Ok(chart)
}

#[instrument(skip_all, fields(namespace = %namespace.name, chart = %config.chart.name))]
pub async fn install_chart(
    applier: &Applier,
    namespace: &NamespaceHandle,
    spec: &DeploymentSpec,
    locals: &Locals,
    config: &Config,
) -> Result<ChartHandle> {
    let desired = build_helm_chart(namespace, spec, locals, config)?;
    let applied = applier
        .apply_namespaced(&desired, Operation::InstallChart, None)
        .await?;

    info!(
        "Chart {} {} requested for {}",
        config.chart.name, config.chart.version, spec.id()
    );
    Ok(ChartHandle::from_resource(&applied, namespace))
}
