use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{error, info};

use super::vm::ConsoleInfo;
use crate::app::AppState;
use crate::error::ApiError;
use crate::handlers::parse_vmid;
use crate::services::{find_lxc, ResourceError};

/// GET /lxc/:vmid/terminal - terminal ticket for a container.
///
/// The lookup itself filters on type, so a QEMU id is a 404 here.
pub async fn lxc_terminal(
    State(state): State<AppState>,
    Path(vmid): Path<String>,
) -> Result<Json<ConsoleInfo>, ApiError> {
    let vmid = parse_vmid(&vmid)?;
    let container = find_lxc(state.hypervisor.as_ref(), vmid).await?;

    let ticket = state
        .hypervisor
        .term_proxy(&container.node, vmid)
        .await
        .map_err(|e| {
            error!("Failed to get terminal for LXC {}: {}", vmid, e);
            ResourceError::Upstream(e.to_string())
        })?;

    info!("Terminal URL and ticket generated for LXC {}", vmid);
    Ok(Json(ConsoleInfo {
        vmid,
        ws_url: format!("/ws/terminal/{}/", vmid),
        ticket: ticket.ticket,
        message: "Connect to this WebSocket URL to access the LXC terminal".to_string(),
    }))
}
