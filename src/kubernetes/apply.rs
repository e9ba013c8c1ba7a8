// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Server-side apply of the objects each stage synthesizes

use crate::constants::FIELD_MANAGER;
use crate::error::{Operation, Result, StackError};
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{
    api::{Patch, PatchParams},
    Api, Client, Resource, ResourceExt,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, instrument};

/// Applies desired objects to the cluster and returns what the server stored
#[derive(Clone)]
pub struct Applier {
    client: Client,
    params: PatchParams,
}

impl Applier {
    pub fn new(client: Client, dry_run: bool) -> Self {
        let mut params = PatchParams::apply(FIELD_MANAGER).force();
        params.dry_run = dry_run;
        Self { client, params }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Apply a cluster-scoped object
    #[instrument(skip(self, resource), fields(name = %resource.name_any()))]
    pub async fn apply_cluster<K>(&self, resource: &K, operation: Operation) -> Result<K>
    where
        K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        self.apply(&api, resource, operation, None).await
    }

    /// Apply a namespaced object into the namespace set in its metadata
    #[instrument(skip(self, resource, timeout), fields(name = %resource.name_any()))]
    pub async fn apply_namespaced<K>(
        &self,
        resource: &K,
        operation: Operation,
        timeout: Option<Duration>,
    ) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Serialize + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let namespace = resource.namespace().unwrap_or_else(|| "default".to_string());
        let api: Api<K> = Api::namespaced(self.client.clone(), &namespace);
        self.apply(&api, resource, operation, timeout).await
    }

    async fn apply<K>(
        &self,
        api: &Api<K>,
        resource: &K,
        operation: Operation,
        timeout: Option<Duration>,
    ) -> Result<K>
    where
        K: Resource + Clone + DeserializeOwned + Serialize + Debug,
    {
        let name = resource.name_any();
        debug!("Applying {} ({})", name, operation);

        let patch = Patch::Apply(resource);
        bounded(api.patch(&name, &self.params, &patch), operation, timeout)
            .await?
            .map_err(|source| StackError::Stage { operation, source })
    }
}

/// Await a call, failing with a timeout error once `timeout` elapses
pub async fn bounded<F, T>(call: F, operation: Operation, timeout: Option<Duration>) -> Result<T>
where
    F: Future<Output = T>,
{
    match timeout {
        Some(limit) => tokio::time::timeout(limit, call)
            .await
            .map_err(|_| StackError::Timeout {
                operation,
                timeout: limit,
            }),
        None => Ok(call.await),
    }
}
