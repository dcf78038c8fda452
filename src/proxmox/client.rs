use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::types::{NodeRecord, ProxyTicket, ResourceAction, ResourceKind, ResourceRecord};
use super::{Hypervisor, ProxmoxError};
use crate::config::ProxmoxConfig;

/// Every PVE API response wraps its payload in `{"data": ...}`
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP client for the Proxmox VE API, authenticated with an API token.
///
/// Wraps one connection-pooled `reqwest::Client` and is shared via `Arc`.
pub struct ProxmoxClient {
    client: Client,
    base_url: Url,
    authorization: String,
}

impl std::fmt::Debug for ProxmoxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxmoxClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ProxmoxClient {
    pub fn from_config(config: &ProxmoxConfig) -> Result<Self, ProxmoxError> {
        let base_url = format!("https://{}:{}/api2/json/", config.host, config.port);
        let base_url = Url::parse(&base_url)
            .map_err(|e| ProxmoxError::InvalidEndpoint(format!("{}: {}", base_url, e)))?;
        Self::with_base_url(config, base_url)
    }

    /// Point the client at an explicit API root, e.g. `http://127.0.0.1:9000/api2/json/`
    pub fn with_base_url(config: &ProxmoxConfig, base_url: Url) -> Result<Self, ProxmoxError> {
        if !config.verify_ssl {
            debug!("TLS certificate verification disabled for {}", base_url);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_ssl)
            .build()
            .map_err(|e| ProxmoxError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: ensure_slash(base_url),
            authorization: format!(
                "PVEAPIToken={}!{}={}",
                config.user, config.token_name, config.token_value
            ),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProxmoxError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ProxmoxError::InvalidEndpoint(format!("{}: {}", path, e)))
    }

    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProxmoxError> {
        let url = self.endpoint(path)?;
        self.send(self.client.get(url).query(query), path).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, ProxmoxError> {
        let url = self.endpoint(path)?;
        self.send(self.client.post(url).form(form), path).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        path: &str,
    ) -> Result<T, ProxmoxError> {
        let response = request
            .header("Authorization", &self.authorization)
            .send()
            .await
            .map_err(|e| {
                error!("Proxmox request {} failed: {}", path, e);
                ProxmoxError::from(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Proxmox request {} returned {}: {}", path, status, body);
            return Err(ProxmoxError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let envelope: Envelope<T> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to decode Proxmox response for {}: {}", path, e);
            debug!("Response body was: {}", body);
            ProxmoxError::Decode(format!("error decoding response body: {}", e))
        })?;
        Ok(envelope.data)
    }
}

/// `Url::join` replaces the last segment unless the base ends with a slash
fn ensure_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[async_trait]
impl Hypervisor for ProxmoxClient {
    async fn list_nodes(&self) -> Result<Vec<NodeRecord>, ProxmoxError> {
        let nodes: Vec<NodeRecord> = self.get("nodes", &[]).await?;
        debug!("Retrieved {} nodes from Proxmox", nodes.len());
        Ok(nodes)
    }

    async fn list_vm_resources(&self) -> Result<Vec<ResourceRecord>, ProxmoxError> {
        self.get("cluster/resources", &[("type", "vm")]).await
    }

    async fn resource_action(
        &self,
        node: &str,
        kind: ResourceKind,
        vmid: u32,
        action: ResourceAction,
    ) -> Result<Option<String>, ProxmoxError> {
        let path = format!(
            "nodes/{}/{}/{}/status/{}",
            node,
            kind.api_segment(),
            vmid,
            action.as_str()
        );
        self.post(&path, &[]).await
    }

    async fn vnc_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError> {
        let path = format!("nodes/{}/qemu/{}/vncproxy", node, vmid);
        self.post(&path, &[("websocket", "1")]).await
    }

    async fn term_proxy(&self, node: &str, vmid: u32) -> Result<ProxyTicket, ProxmoxError> {
        let path = format!("nodes/{}/lxc/{}/termproxy", node, vmid);
        self.post(&path, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> ProxmoxConfig {
        ProxmoxConfig {
            host: "pve.example.com".to_string(),
            port: 8006,
            user: "root@pam".to_string(),
            token_name: "portal".to_string(),
            token_value: "secret-uuid".to_string(),
            verify_ssl: true,
            timeout_secs: 5,
        }
    }

    async fn client_for(server: &MockServer) -> ProxmoxClient {
        let base = Url::parse(&format!("{}/api2/json", server.uri())).unwrap();
        ProxmoxClient::with_base_url(&config(), base).unwrap()
    }

    #[test]
    fn base_url_from_config() {
        let client = ProxmoxClient::from_config(&config()).unwrap();
        assert_eq!(client.base_url().as_str(), "https://pve.example.com:8006/api2/json/");
    }

    #[tokio::test]
    async fn lists_vm_resources_with_token_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/cluster/resources"))
            .and(query_param("type", "vm"))
            .and(header("Authorization", "PVEAPIToken=root@pam!portal=secret-uuid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"vmid": 100, "type": "qemu", "node": "pve1", "name": "web"},
                    {"vmid": 101, "type": "lxc", "node": "pve1"}
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let resources = client_for(&server).await.list_vm_resources().await.unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].kind, ResourceKind::Qemu);
        assert_eq!(resources[1].vmid, 101);
    }

    #[tokio::test]
    async fn action_posts_to_guest_type_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api2/json/nodes/pve2/lxc/101/status/shutdown"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"data": "UPID:pve2:0000:vzshutdown:101:root@pam:"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let upid = client_for(&server)
            .await
            .resource_action("pve2", ResourceKind::Lxc, 101, ResourceAction::Shutdown)
            .await
            .unwrap();
        assert!(upid.unwrap().starts_with("UPID:pve2"));
    }

    #[tokio::test]
    async fn vnc_proxy_requests_websocket() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api2/json/nodes/pve1/qemu/100/vncproxy"))
            .and(body_string_contains("websocket=1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"ticket": "PVEVNC:xyz", "port": "5900", "user": "root@pam"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ticket = client_for(&server).await.vnc_proxy("pve1", 100).await.unwrap();
        assert_eq!(ticket.ticket, "PVEVNC:xyz");
        assert_eq!(ticket.extra["user"], "root@pam");
    }

    #[tokio::test]
    async fn remote_error_keeps_raw_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/nodes"))
            .respond_with(ResponseTemplate::new(401).set_body_string("authentication failure"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.list_nodes().await.unwrap_err();
        assert!(matches!(err, ProxmoxError::Status { status: 401, .. }));
        assert_eq!(err.to_string(), "401: authentication failure");
    }

    #[tokio::test]
    async fn malformed_payload_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api2/json/nodes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"nodes": []})))
            .mount(&server)
            .await;

        let err = client_for(&server).await.list_nodes().await.unwrap_err();
        assert!(matches!(err, ProxmoxError::Decode(_)));
    }
}
