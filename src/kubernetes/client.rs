// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Client creation from an explicit kubeconfig or the ambient environment

use crate::config::Config;
use crate::error::{Result, StackError};
use kube::{
    config::{KubeConfigOptions, Kubeconfig},
    Client,
};
use std::path::Path;
use tracing::{info, instrument};

/// Create a client for the target cluster
#[instrument(skip(config))]
pub async fn create_client(config: &Config) -> Result<Client> {
    match config.kubeconfig_path.as_deref() {
        Some(path) => create_client_from_kubeconfig(path, config.kube_context.clone()).await,
        None => {
            info!("No kubeconfig path configured, inferring client configuration");
            Ok(Client::try_default().await?)
        }
    }
}

/// Create a Kubernetes client from a kubeconfig file
async fn create_client_from_kubeconfig(path: &Path, context: Option<String>) -> Result<Client> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        StackError::KubeconfigError(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let kubeconfig = parse_kubeconfig(&raw)?;

    let options = KubeConfigOptions {
        context,
        ..Default::default()
    };

    let client_config = kube::Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .map_err(|e| StackError::KubeconfigError(format!("Failed to create config: {}", e)))?;

    info!("Using kubeconfig {} for cluster {}", path.display(), client_config.cluster_url);

    Client::try_from(client_config)
        .map_err(|e| StackError::KubeconfigError(format!("Failed to create client: {}", e)))
}

fn parse_kubeconfig(raw: &str) -> Result<Kubeconfig> {
    serde_yaml::from_str(raw)
        .map_err(|e| StackError::KubeconfigError(format!("Failed to parse kubeconfig: {}", e)))
}
