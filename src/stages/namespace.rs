// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::context::NamespaceHandle;
use crate::error::{Operation, Result};
use crate::kubernetes::{build_namespace, Applier};
use crate::locals::Locals;
use tracing::{info, instrument};

/// Ensure the deployment namespace exists with the derived labels.
///
/// Every object created by later stages lives inside this namespace, so
/// deleting it releases the whole deployment.
#[instrument(skip(applier, locals), fields(namespace = %locals.namespace))]
pub async fn create_namespace(applier: &Applier, locals: &Locals) -> Result<NamespaceHandle> {
    let desired = build_namespace(&locals.namespace, &locals.labels);
    let applied = applier
        .apply_cluster(&desired, Operation::CreateNamespace)
        .await?;

    info!("Namespace {} applied", locals.namespace);
    Ok(NamespaceHandle::from_resource(&applied))
}
