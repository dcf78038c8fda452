#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{Map, Value};
use tower::ServiceExt;

use pve_portal_api::auth::password::{hash_password_with_params, Argon2Params};
use pve_portal_api::auth::{create_access_token, TokenCodec};
use pve_portal_api::config::AppConfig;
use pve_portal_api::database::models::{NewUser, User};
use pve_portal_api::database::{MemoryStore, Store};
use pve_portal_api::proxmox::{
    Hypervisor, NodeRecord, ProxmoxError, ProxyTicket, ResourceAction, ResourceKind,
    ResourceRecord,
};
use pve_portal_api::{app, AppState};

pub const PREFIX: &str = "/api/v1";
pub const PASSWORD: &str = "password123";

// Keeps the suite fast; production uses the default cost
pub const FAST_HASH: Argon2Params = Argon2Params {
    memory_kib: 64,
    iterations: 1,
    parallelism: 1,
};

pub fn resource(vmid: u32, kind: ResourceKind, node: &str) -> ResourceRecord {
    ResourceRecord {
        vmid,
        kind,
        node: node.to_string(),
        name: Some(format!("guest-{}", vmid)),
        status: Some("running".to_string()),
        extra: Map::new(),
    }
}

/// Inventory of `qemu 100@pve1`, `lxc 101@pve1`, `qemu 200@pve2`
pub fn default_inventory() -> Vec<ResourceRecord> {
    vec![
        resource(100, ResourceKind::Qemu, "pve1"),
        resource(101, ResourceKind::Lxc, "pve1"),
        resource(200, ResourceKind::Qemu, "pve2"),
    ]
}

/// In-process stand-in for the Proxmox API that records every mutation
#[derive(Debug, Default)]
pub struct FakeHypervisor {
    pub resources: Mutex<Vec<ResourceRecord>>,
    pub calls: Mutex<Vec<String>>,
    pub failure: Mutex<Option<String>>,
}

impl FakeHypervisor {
    pub fn with_resources(resources: Vec<ResourceRecord>) -> Self {
        Self {
            resources: Mutex::new(resources),
            ..Default::default()
        }
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), ProxmoxError> {
        match self.failure.lock().unwrap().clone() {
            Some(message) => Err(ProxmoxError::Transport(message)),
            None => Ok(()),
        }
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Hypervisor for FakeHypervisor {
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, ProxmoxError> {
        self.check()?;
        let mut names: Vec<String> = Vec::new();
        for r in self.resources.lock().unwrap().iter() {
            if !names.contains(&r.node) {
                names.push(r.node.clone());
            }
        }
        Ok(names
            .into_iter()
            .map(|node| NodeRecord {
                node,
                status: Some("online".to_string()),
                extra: Map::new(),
            })
            .collect())
    }

    async fn list_vm_resources(&self) -> Result<Vec<ResourceRecord>, ProxmoxError> {
        self.check()?;
        Ok(self.resources.lock().unwrap().clone())
    }

    async fn resource_action(
        &self,
        node: &str,
        kind: ResourceKind,
        vmid: u32,
        action: ResourceAction,
    ) -> Result<Option<String>, ProxmoxError> {
        self.check()?;
        self.record(format!(
            "{} {}/{}/{}",
            action.as_str(),
            node,
            kind.api_segment(),
            vmid
        ));
        Ok(Some(format!("UPID:{}:{}", node, vmid)))
    }

    async fn vnc_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError> {
        self.check()?;
        self.record(format!("vncproxy {}/qemu/{}", node, vmid));
        Ok(ProxyTicket {
            ticket: format!("PVEVNC:{}", vmid),
            port: Some(Value::from(5900)),
            extra: Map::new(),
        })
    }

    async fn term_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError> {
        self.check()?;
        self.record(format!("termproxy {}/lxc/{}", node, vmid));
        Ok(ProxyTicket {
            ticket: format!("PVETERM:{}", vmid),
            port: Some(Value::from("5901")),
            extra: Map::new(),
        })
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn detail(&self) -> &str {
        self.body["detail"].as_str().unwrap_or_default()
    }
}

pub struct TestApp {
    pub router: Router,
    pub config: Arc<AppConfig>,
    pub codec: Arc<TokenCodec>,
    pub store: Arc<MemoryStore>,
    pub hypervisor: Arc<FakeHypervisor>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_inventory(default_inventory())
    }

    pub fn with_inventory(resources: Vec<ResourceRecord>) -> Self {
        let mut config = AppConfig::local();
        config.security.secret_key = "integration-test-secret".to_string();
        Self::with_config(config, resources)
    }

    pub fn with_config(config: AppConfig, resources: Vec<ResourceRecord>) -> Self {
        let config = Arc::new(config);
        let codec = Arc::new(TokenCodec::from_config(&config.security).expect("test codec"));
        let store = Arc::new(MemoryStore::new());
        let hypervisor = Arc::new(FakeHypervisor::with_resources(resources));

        let state = AppState::new(
            config.clone(),
            codec.clone(),
            store.clone(),
            hypervisor.clone(),
        )
        .with_password_params(FAST_HASH);

        Self {
            router: app(state),
            config,
            codec,
            store,
            hypervisor,
        }
    }

    pub async fn create_user(&self, email: &str, superuser: bool) -> Result<User> {
        let user = self
            .store
            .create_user(NewUser {
                email: email.to_string(),
                hashed_password: hash_password_with_params(PASSWORD, FAST_HASH)?,
                full_name: None,
                is_active: true,
                is_superuser: superuser,
            })
            .await?;
        Ok(user)
    }

    pub fn token_for(&self, user: &User) -> String {
        create_access_token(&self.codec, user.id, &self.config.security).expect("sign token")
    }

    /// Create a user and return it with a bearer token
    pub async fn login_as(&self, email: &str, superuser: bool) -> Result<(User, String)> {
        let user = self.create_user(email, superuser).await?;
        let token = self.token_for(&user);
        Ok((user, token))
    }

    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .context("router call failed")?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(TestResponse {
            status,
            headers,
            body,
        })
    }

    fn builder(method: Method, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
        let uri = if uri.starts_with('/') && !uri.starts_with(PREFIX) && uri != "/" && uri != "/health" {
            format!("{}{}", PREFIX, uri)
        } else {
            uri.to_string()
        };
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
    }

    /// Paths are relative to the API prefix except `/` and `/health`
    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Self::builder(Method::GET, uri, token).body(Body::empty())?)
            .await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Self::builder(Method::DELETE, uri, token).body(Body::empty())?)
            .await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>) -> Result<TestResponse> {
        self.send(Self::builder(Method::POST, uri, token).body(Body::empty())?)
            .await
    }

    pub async fn post_json(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.json(Method::POST, uri, token, body).await
    }

    pub async fn put_json(&self, uri: &str, token: Option<&str>, body: Value) -> Result<TestResponse> {
        self.json(Method::PUT, uri, token, body).await
    }

    async fn json(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Value,
    ) -> Result<TestResponse> {
        let request = Self::builder(method, uri, token)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?;
        self.send(request).await
    }

    pub async fn post_raw(
        &self,
        uri: &str,
        token: Option<&str>,
        content_type: &str,
        body: &str,
    ) -> Result<TestResponse> {
        let request = Self::builder(Method::POST, uri, token)
            .header(header::CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))?;
        self.send(request).await
    }

    pub async fn post_form(&self, uri: &str, fields: &[(&str, &str)]) -> Result<TestResponse> {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Self::builder(Method::POST, uri, None)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(encoded))?;
        self.send(request).await
    }
}
