// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use bytes::Bytes;
use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A request the mock received, in arrival order
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: serde_json::Value,
}

#[derive(Clone)]
enum Reply {
    Respond(u16, String),
    Hang,
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// Server-side apply requests (PATCH) without a registered response are
/// answered with their own body, as the API server would for a fresh object.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), Reply>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, reply: Reply) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), reply);
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, Reply::Respond(status, body.to_string()))
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, Reply::Respond(status, body.to_string()))
    }

    /// Add a response for DELETE requests matching the path
    pub fn on_delete(self, path: &str, status: u16, body: &str) -> Self {
        self.on("DELETE", path, Reply::Respond(status, body.to_string()))
    }

    /// Never answer PATCH requests matching the path
    pub fn hang_on_patch(self, path: &str) -> Self {
        self.on("PATCH", path, Reply::Hang)
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Paths of the PATCH requests received so far, in order
    pub fn applied_paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PATCH")
            .map(|r| r.path)
            .collect()
    }

    /// Body of the first PATCH request sent to `path`
    pub fn applied_body(&self, path: &str) -> Option<serde_json::Value> {
        self.requests()
            .into_iter()
            .find(|r| r.method == "PATCH" && r.path == path)
            .map(|r| r.body)
    }

    fn find_response(&self, method: &str, path: &str) -> Option<Reply> {
        let responses = self.responses.lock().unwrap();

        // Try exact match first
        if let Some(reply) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(reply.clone());
        }

        // Fall back to the longest registered prefix
        responses
            .iter()
            .filter(|((m, p), _)| m == method && path.starts_with(p.as_str()))
            .max_by_key(|((_, p), _)| p.len())
            .map(|(_, reply)| reply.clone())
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let reply = self.find_response(&method, &path);
        let requests = self.requests.clone();

        Box::pin(async move {
            let body: Bytes = req.into_body().collect().await?.to_bytes();
            let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);

            requests.lock().unwrap().push(RecordedRequest {
                method: method.clone(),
                path,
                body: json,
            });

            let (status, body) = match reply {
                Some(Reply::Respond(status, body)) => (status, body.into_bytes()),
                Some(Reply::Hang) => std::future::pending().await,
                None if method == "PATCH" => (200, body.to_vec()),
                // Default 404 for unmatched requests
                None => (
                    404,
                    br#"{"kind":"Status","apiVersion":"v1","status":"Failure","message":"not found","reason":"NotFound","code":404}"#
                        .to_vec(),
                ),
            };

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body))?)
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a failure Status response
pub fn status_json(code: u16, reason: &str, message: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": message,
        "reason": reason,
        "code": code
    })
    .to_string()
}
