// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! CRD availability checking utilities

use crate::error::{Result, StackError};
use kube::{discovery::Discovery, Client, Resource};
use tracing::{debug, instrument};

/// Fail unless the cluster serves the API of resource `K`.
pub async fn ensure_served<K>(client: &Client) -> Result<()>
where
    K: Resource,
    <K as Resource>::DynamicType: Default,
{
    let dt = K::DynamicType::default();
    ensure_api_served(client, &K::group(&dt), &K::version(&dt), &K::kind(&dt)).await
}

/// Fail unless `group/version` with `kind` is discoverable in the cluster.
#[instrument(skip(client))]
pub async fn ensure_api_served(client: &Client, group: &str, version: &str, kind: &str) -> Result<()> {
    let discovery = Discovery::new(client.clone()).filter(&[group]).run().await?;

    for api_group in discovery.groups() {
        if api_group.name() == group {
            for (ar, _) in api_group.recommended_resources() {
                if ar.kind == kind && ar.version == version {
                    debug!("{}/{} {} is served", group, version, kind);
                    return Ok(());
                }
            }
        }
    }

    Err(StackError::MissingApi(format!("{}/{} {}", group, version, kind)))
}
