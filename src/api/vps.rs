//! VPS operations. List endpoints carry a cache key so their results are
//! written through; single-object reads and all writes are never cached.

use std::time::Duration;

use super::client::ApiClient;
use super::error::ApiError;
use super::models::{
  AttachVirtualNetworkRequest, AttachVirtualNetworkResponse, AttachedNetwork, ChangeFlavourRequest,
  ChangeFlavourResponse, CloudServer, CloudServerFlavour, CloudServerImage, CloudServerOrder,
  CloudServerOrderResponse, DetachVirtualNetworkRequest, DetachVirtualNetworkResponse, Product,
  ResetCloudServerRequest, ServerAction, ServerActionResponse, VirtualNetwork,
};
use crate::cache::CacheKey;

impl ApiClient {
  pub async fn list_cloud_servers(&self) -> Result<Vec<CloudServer>, ApiError> {
    self.get("servers", &CacheKey::CLOUD_SERVERS).await
  }

  /// Server list through the read-through cache.
  ///
  /// Used where slightly stale data is fine, e.g. listing ids to pick from.
  pub async fn cached_cloud_servers(&self, ttl: Duration) -> Result<Vec<CloudServer>, ApiError> {
    let result = self
      .cache()
      .call(&CacheKey::CLOUD_SERVERS, ttl, || self.list_cloud_servers())
      .await?;
    Ok(result.data)
  }

  pub async fn get_virtual_server(&self, server_id: u64) -> Result<CloudServer, ApiError> {
    let path = format!("servers/{}", server_id);
    self.get(&path, &CacheKey::NONE).await
  }

  /// Run a power/lifecycle action. `reset` needs a [`ResetCloudServerRequest`].
  pub async fn execute_server_action(
    &self,
    server_id: u64,
    action: ServerAction,
    reset: Option<&ResetCloudServerRequest>,
  ) -> Result<ServerActionResponse, ApiError> {
    let path = format!("servers/{}/{}", server_id, action);
    match reset {
      Some(body) => self.post(&path, body, &CacheKey::NONE).await,
      None => self
        .fetch(reqwest::Method::POST, &path, None::<&()>, &CacheKey::NONE)
        .await,
    }
  }

  pub async fn order_vps(
    &self,
    order: &CloudServerOrder,
  ) -> Result<CloudServerOrderResponse, ApiError> {
    self.post("servers/order", order, &CacheKey::NONE).await
  }

  pub async fn list_vps_flavours(
    &self,
    server_id: u64,
  ) -> Result<Vec<CloudServerFlavour>, ApiError> {
    let path = format!("servers/{}/possible-flavours", server_id);
    self
      .get(&path, &CacheKey::FLAVOURS.with_arg(server_id))
      .await
  }

  pub async fn change_vps_flavour(
    &self,
    server_id: u64,
    flavour_id: u64,
  ) -> Result<ChangeFlavourResponse, ApiError> {
    let path = format!("servers/{}/change-flavour", server_id);
    let request = ChangeFlavourRequest { flavour_id };
    self.post(&path, &request, &CacheKey::NONE).await
  }

  pub async fn list_vps_products(&self) -> Result<Vec<Product>, ApiError> {
    self.get("products", &CacheKey::VPS_PRODUCTS).await
  }

  pub async fn list_vps_images(&self) -> Result<Vec<CloudServerImage>, ApiError> {
    self.get("images", &CacheKey::VPS_IMAGES).await
  }

  pub async fn get_vps_image(&self, image_id: u64) -> Result<CloudServerImage, ApiError> {
    let path = format!("images/{}", image_id);
    self.get(&path, &CacheKey::NONE).await
  }

  pub async fn list_virtual_networks(&self) -> Result<Vec<VirtualNetwork>, ApiError> {
    self.get("virtual-networks", &CacheKey::VIRTUAL_NETWORKS).await
  }

  pub async fn list_attached_networks(
    &self,
    server_id: u64,
  ) -> Result<Vec<AttachedNetwork>, ApiError> {
    let path = format!("servers/{}/networks", server_id);
    self
      .get(&path, &CacheKey::ATTACHED_NETWORKS.with_arg(server_id))
      .await
  }

  pub async fn attach_virtual_network(
    &self,
    server_id: u64,
    request: &AttachVirtualNetworkRequest,
  ) -> Result<AttachVirtualNetworkResponse, ApiError> {
    let path = format!("servers/{}/attach-network", server_id);
    self.post(&path, request, &CacheKey::NONE).await
  }

  pub async fn detach_virtual_network(
    &self,
    server_id: u64,
    network_id: &str,
  ) -> Result<DetachVirtualNetworkResponse, ApiError> {
    let path = format!("servers/{}/detach-network", server_id);
    let request = DetachVirtualNetworkRequest {
      network_id: network_id.to_string(),
    };
    self.post(&path, &request, &CacheKey::NONE).await
  }
}
