// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use tracing::info;

use cachestack::config::{Config, StackOperation};
use cachestack::kubernetes::create_client;
use cachestack::pipeline::Provisioner;
use cachestack::types::DeploymentSpec;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: operation={:?}, dry_run={}, input={}",
        config.operation,
        config.dry_run,
        config.stack_input.display()
    );

    let spec = DeploymentSpec::from_file(&config.stack_input)?;

    // Create Kubernetes client
    let client = create_client(&config).await?;
    info!("Connected to Kubernetes cluster");

    let operation = config.operation;
    let provisioner = Provisioner::new(client, config);

    match operation {
        StackOperation::Up => {
            let provisioned = provisioner
                .up(&spec)
                .await
                .with_context(|| format!("provisioning {} failed", spec.id()))?;

            let rendered = serde_yaml::to_string(&provisioned.outputs)?;
            info!("Recorded resources: {:?}", provisioned.context.added());
            info!("Stack outputs: {:?}", provisioned.outputs);
            print!("{}", rendered);
        }
        StackOperation::Destroy => {
            provisioner
                .destroy(&spec)
                .await
                .with_context(|| format!("destroying {} failed", spec.id()))?;
            info!("Deployment {} destroyed", spec.id());
        }
    }

    Ok(())
}
