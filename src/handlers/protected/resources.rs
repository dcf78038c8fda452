use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::extract::ApiQuery;
use crate::handlers::{parse_vmid, Message};
use crate::proxmox::{NodeRecord, ResourceAction, ResourceRecord};
use crate::services::{find_resource, ResourceError};

#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub node: Option<String>,
}

/// GET /resources/nodes
pub async fn list_nodes(State(state): State<AppState>) -> Result<Json<Vec<NodeRecord>>, ApiError> {
    let nodes = state.hypervisor.list_nodes().await.map_err(|e| {
        error!("Failed to get nodes: {}", e);
        ApiError::internal_server_error(e.to_string())
    })?;
    Ok(Json(nodes))
}

/// GET /resources/?node= - guests across the cluster, optionally one node's
pub async fn list_resources(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ResourceQuery>,
) -> Result<Json<Vec<ResourceRecord>>, ApiError> {
    let resources = state.hypervisor.list_vm_resources().await.map_err(|e| {
        error!("Failed to get resources: {}", e);
        ApiError::internal_server_error(e.to_string())
    })?;

    let resources: Vec<ResourceRecord> = match query.node.as_deref() {
        Some(node) if !node.is_empty() => {
            resources.into_iter().filter(|r| r.node == node).collect()
        }
        _ => resources,
    };
    debug!("Retrieved {} resources from Proxmox", resources.len());
    Ok(Json(resources))
}

/// GET /resources/:vmid
pub async fn get_resource(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
) -> Result<Json<ResourceRecord>, ApiError> {
    let vmid = parse_vmid(&vmid)?;
    let resource = find_resource(state.hypervisor.as_ref(), vmid).await?;
    Ok(Json(resource))
}

/// POST /resources/:vmid/:action - start, stop, reboot, shutdown or reset
pub async fn resource_action(
    State(state): State<AppState>,
    Path((vmid, action)): Path<(String, String)>,
) -> Result<Json<Message>, ApiError> {
    let vmid = parse_vmid(&vmid)?;
    let action: ResourceAction = serde_json::from_value(serde_json::Value::String(action))
        .map_err(|_| ApiError::not_found("Not Found"))?;

    let resource = find_resource(state.hypervisor.as_ref(), vmid).await?;

    let task = state
        .hypervisor
        .resource_action(&resource.node, resource.kind, vmid, action)
        .await
        .map_err(|e| {
            error!("Failed to {} resource {}: {}", action.as_str(), vmid, e);
            ResourceError::Upstream(e.to_string())
        })?;

    let message = format!("Resource {} {}", vmid, action.past_tense());
    info!("{} (task {:?})", message, task);
    Ok(Json(Message::new(message)))
}
