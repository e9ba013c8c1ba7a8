// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// The field manager used for server-side apply
pub const FIELD_MANAGER: &str = "cachestack";

/// Label keys stamped on every object created for a deployment
pub mod labels {
    pub const ENVIRONMENT: &str = "cachestack.dev/environment";
    pub const ORGANIZATION: &str = "cachestack.dev/organization";
    pub const RESOURCE: &str = "cachestack.dev/resource";
    pub const RESOURCE_ID: &str = "cachestack.dev/resource-id";
    pub const RESOURCE_KIND: &str = "cachestack.dev/resource-kind";

    /// Value of `RESOURCE_KIND` for cache deployments
    pub const KIND_REDIS_KUBERNETES: &str = "redis_kubernetes";

    pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";
    pub const K8S_INSTANCE: &str = "app.kubernetes.io/instance";
    pub const K8S_NAME: &str = "app.kubernetes.io/name";
}

/// Annotation keys written on network-exposed services
pub mod annotations {
    /// Domain the endpoint is published under
    pub const ENDPOINT_DOMAIN_NAME: &str = "cachestack.dev/endpoint-domain-name";
    /// Hostname hint picked up by external-dns
    pub const EXTERNAL_DNS_HOSTNAME: &str = "external-dns.alpha.kubernetes.io/hostname";
}

/// Names and ports of the packaged cache application
pub mod redis {
    /// Suffix of the primary-role service created by the chart
    pub const MASTER_SUFFIX: &str = "master";
    pub const APP_NAME: &str = "redis";
    /// Port used by the port-forward command and the mesh route
    pub const HTTP_PORT: i32 = 8080;
    /// Well-known client port exposed by the load balancers
    pub const CLIENT_PORT: i32 = 6379;
    /// Named container port the load balancers forward to
    pub const CONTAINER_PORT_NAME: &str = "redis";
}

/// Service mesh ingress settings
pub mod mesh {
    /// Labels selecting the mesh ingress controller pods
    pub const INGRESS_SELECTOR: [(&str, &str); 2] = [("app", "istio-ingress"), ("istio", "ingress")];
    pub const HTTPS_SERVER_NAME: &str = "redis-https";
    pub const HTTP_SERVER_NAME: &str = "redis-http";
    pub const HTTPS_PORT: u32 = 443;
    pub const HTTP_PORT: u32 = 80;
    /// Kind of the pre-existing issuer the certificate references
    pub const ISSUER_KIND: &str = "ClusterIssuer";
}

/// Load balancer services
pub mod load_balancer {
    pub const EXTERNAL_SERVICE_NAME: &str = "ingress-external-lb";
    pub const INTERNAL_SERVICE_NAME: &str = "ingress-internal-lb";
    pub const PORT_NAME: &str = "tcp-redis";
    /// Default bound on a single service apply, in seconds
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
}
