// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace management utilities

use crate::error::{Operation, Result, StackError};
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    api::{DeleteParams, ObjectMeta},
    Api, Client,
};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Desired namespace object carrying the deployment labels
pub fn build_namespace(name: &str, labels: &BTreeMap<String, String>) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Delete a namespace and everything inside it. A missing namespace is not an error.
#[instrument(skip(client))]
pub async fn delete_namespace(client: &Client, namespace: &str, dry_run: bool) -> Result<()> {
    let namespaces: Api<Namespace> = Api::all(client.clone());
    let mut params = DeleteParams::background();
    params.dry_run = dry_run;

    match namespaces.delete(namespace, &params).await {
        Ok(_) => {
            info!("Namespace {} scheduled for deletion", namespace);
            Ok(())
        }
        Err(kube::Error::Api(err)) if err.code == 404 => {
            debug!("Namespace {} does not exist", namespace);
            Ok(())
        }
        Err(source) => Err(StackError::Stage {
            operation: Operation::DeleteNamespace,
            source,
        }),
    }
}
