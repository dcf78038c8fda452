use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::parse_vmid;
use crate::proxmox::ResourceKind;
use crate::services::{find_vm, ResourceError};

/// WebSocket handoff for a console or terminal session
#[derive(Debug, Serialize, Deserialize)]
pub struct ConsoleInfo {
    pub vmid: u32,
    pub ws_url: String,
    pub ticket: String,
    pub message: String,
}

/// GET /vm/:vmid/console - VNC ticket for a QEMU guest.
///
/// A container id is found by the lookup but rejected here with 400.
pub async fn vm_console(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
) -> Result<Json<ConsoleInfo>, ApiError> {
    let vmid = parse_vmid(&vmid)?;
    let vm = find_vm(state.hypervisor.as_ref(), vmid).await?;

    if vm.kind != ResourceKind::Qemu {
        return Err(ApiError::bad_request(format!(
            "Resource {} is not a QEMU VM",
            vmid
        )));
    }

    let ticket = state
        .hypervisor
        .vnc_proxy(&vm.node, vmid)
        .await
        .map_err(|e| {
            error!("Failed to get console for VM {}: {}", vmid, e);
            ResourceError::Upstream(e.to_string())
        })?;

    info!("Console URL and ticket generated for VM {}", vmid);
    Ok(Json(ConsoleInfo {
        vmid,
        ws_url: format!("/ws/vnc/{}/", vmid),
        ticket: ticket.ticket,
        message: "Connect to this WebSocket URL to access the VM console".to_string(),
    }))
}
