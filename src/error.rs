// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The resource calls a provisioning run can fail on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateNamespace,
    InstallChart,
    CreateCertificate,
    CreateGateway,
    CreateVirtualService,
    CreateExternalLoadBalancer,
    CreateInternalLoadBalancer,
    DeleteNamespace,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Operation::CreateNamespace => "create namespace",
            Operation::InstallChart => "install helm chart",
            Operation::CreateCertificate => "create certificate",
            Operation::CreateGateway => "create gateway",
            Operation::CreateVirtualService => "create virtual-service",
            Operation::CreateExternalLoadBalancer => "create external load balancer",
            Operation::CreateInternalLoadBalancer => "create internal load balancer",
            Operation::DeleteNamespace => "delete namespace",
        };
        f.write_str(message)
    }
}

#[derive(Error, Debug)]
pub enum StackError {
    #[error("failed to {operation}: {source}")]
    Stage {
        operation: Operation,
        #[source]
        source: kube::Error,
    },

    #[error("failed to {operation}: no response within {timeout:?}")]
    Timeout {
        operation: Operation,
        timeout: Duration,
    },

    #[error("failed to render chart values: {0}")]
    Values(#[from] serde_yaml::Error),

    #[error("API not served by the cluster: {0}")]
    MissingApi(String),

    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to parse kubeconfig: {0}")]
    KubeconfigError(String),
}

impl StackError {
    /// The resource call that failed, if the error came from a stage
    pub fn operation(&self) -> Option<Operation> {
        match self {
            StackError::Stage { operation, .. } | StackError::Timeout { operation, .. } => {
                Some(*operation)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StackError>;
