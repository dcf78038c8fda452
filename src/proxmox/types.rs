use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Guest type as reported by `/cluster/resources`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Qemu,
    Lxc,
    #[serde(other)]
    Other,
}

impl ResourceKind {
    /// Path segment of the per-guest sub-API. Anything that is not a QEMU
    /// VM is driven through the container endpoints.
    pub fn api_segment(self) -> &'static str {
        match self {
            ResourceKind::Qemu => "qemu",
            ResourceKind::Lxc | ResourceKind::Other => "lxc",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Qemu => write!(f, "qemu"),
            ResourceKind::Lxc => write!(f, "lxc"),
            ResourceKind::Other => write!(f, "other"),
        }
    }
}

/// One entry of the cluster inventory.
///
/// Fields the portal does not interpret are kept in `extra` and passed
/// through to clients untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceRecord {
    pub vmid: u32,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of `/nodes`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeRecord {
    pub node: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Result of a `vncproxy` / `termproxy` call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProxyTicket {
    pub ticket: String,
    // PVE reports the port as a string on some versions and a number on others
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Power operations exposed on `/resources/{vmid}/{action}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceAction {
    Start,
    Stop,
    Reboot,
    Shutdown,
    Reset,
}

impl ResourceAction {
    /// Name of the `status/{action}` endpoint
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceAction::Start => "start",
            ResourceAction::Stop => "stop",
            ResourceAction::Reboot => "reboot",
            ResourceAction::Shutdown => "shutdown",
            ResourceAction::Reset => "reset",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            ResourceAction::Start => "started",
            ResourceAction::Stop => "stopped",
            ResourceAction::Reboot => "rebooted",
            ResourceAction::Shutdown => "shutdown",
            ResourceAction::Reset => "reset",
        }
    }
}
