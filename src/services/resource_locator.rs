//! Lookup of a single guest in the cluster inventory.
//!
//! The PVE API has no lookup by id, so every call fetches the full
//! `type=vm` inventory and scans it. The first match in response order wins
//! when the remote side reports duplicate ids.

use thiserror::Error;
use tracing::{error, warn};

use crate::proxmox::{Hypervisor, ResourceKind, ResourceRecord};

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("{what} {vmid} not found")]
    NotFound { vmid: u32, what: &'static str },

    /// Raw remote failure text
    #[error("{0}")]
    Upstream(String),
}

impl ResourceError {
    pub fn vmid(&self) -> Option<u32> {
        match self {
            ResourceError::NotFound { vmid, .. } => Some(*vmid),
            ResourceError::Upstream(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceFilter {
    /// Any guest type
    Any,
    /// Only entries whose type is the given kind
    Kind(ResourceKind),
}

impl ResourceFilter {
    fn matches(self, record: &ResourceRecord) -> bool {
        match self {
            ResourceFilter::Any => true,
            ResourceFilter::Kind(kind) => record.kind == kind,
        }
    }
}

/// Pure scan over an already-fetched inventory
pub fn locate(
    resources: &[ResourceRecord],
    vmid: u32,
    filter: ResourceFilter,
) -> Option<&ResourceRecord> {
    resources
        .iter()
        .find(|r| r.vmid == vmid && filter.matches(r))
}

async fn fetch_and_locate(
    api: &dyn Hypervisor,
    vmid: u32,
    filter: ResourceFilter,
    what: &'static str,
) -> Result<ResourceRecord, ResourceError> {
    let resources = api.list_vm_resources().await.map_err(|e| {
        error!("Failed to fetch inventory while looking up {}: {}", vmid, e);
        ResourceError::Upstream(e.to_string())
    })?;

    match locate(&resources, vmid, filter) {
        Some(record) => Ok(record.clone()),
        None => {
            warn!("{} {} not found", what, vmid);
            Err(ResourceError::NotFound { vmid, what })
        }
    }
}

/// Any guest with this id
pub async fn find_resource(api: &dyn Hypervisor, vmid: u32) -> Result<ResourceRecord, ResourceError> {
    fetch_and_locate(api, vmid, ResourceFilter::Any, "Resource").await
}

/// Same unfiltered scan as `find_resource`; the console handler checks the
/// guest type itself so a container id yields 400 there, not 404.
pub async fn find_vm(api: &dyn Hypervisor, vmid: u32) -> Result<ResourceRecord, ResourceError> {
    fetch_and_locate(api, vmid, ResourceFilter::Any, "VM").await
}

/// Only LXC containers match
pub async fn find_lxc(api: &dyn Hypervisor, vmid: u32) -> Result<ResourceRecord, ResourceError> {
    fetch_and_locate(
        api,
        vmid,
        ResourceFilter::Kind(ResourceKind::Lxc),
        "LXC container",
    )
    .await
}
