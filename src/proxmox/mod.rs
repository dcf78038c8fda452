//! Proxmox VE integration.
//!
//! Handlers talk to the hypervisor through the `Hypervisor` trait;
//! `ProxmoxClient` is the HTTP implementation used in production.

pub mod client;
pub mod types;

use async_trait::async_trait;
use std::fmt::Debug;
use thiserror::Error;

pub use client::ProxmoxClient;
pub use types::{NodeRecord, ProxyTicket, ResourceAction, ResourceKind, ResourceRecord};

/// Failures talking to the hypervisor API.
///
/// `Display` is the raw remote or transport text; it is forwarded to API
/// clients unchanged.
#[derive(Debug, Error)]
pub enum ProxmoxError {
    #[error("{status}: {body}")]
    Status { status: u16, body: String },

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    InvalidEndpoint(String),
}

impl From<reqwest::Error> for ProxmoxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProxmoxError::Decode(err.to_string())
        } else {
            ProxmoxError::Transport(err.to_string())
        }
    }
}

/// Remote hypervisor operations used by the portal.
///
/// Implementations are shared across request tasks and must be safe for
/// concurrent use. No call caches anything: every inventory read goes to
/// the remote side.
#[async_trait]
pub trait Hypervisor: Send + Sync + Debug {
    /// `GET /nodes`
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, ProxmoxError>;

    /// `GET /cluster/resources?type=vm`, qemu and lxc guests together
    async fn list_vm_resources(&self) -> Result<Vec<ResourceRecord>, ProxmoxError>;

    /// `POST /nodes/{node}/{kind}/{vmid}/status/{action}`. Returns the task
    /// id when the remote side reports one.
    async fn resource_action(
        &self,
        node: &str,
        kind: ResourceKind,
        vmid: u32,
        action: ResourceAction,
    ) -> Result<Option<String>, ProxmoxError>;

    /// `POST /nodes/{node}/qemu/{vmid}/vncproxy` with websocket support
    async fn vnc_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError>;

    /// `POST /nodes/{node}/lxc/{vmid}/termproxy`
    async fn term_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError>;
}
