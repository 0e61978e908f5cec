//! Request and response bodies of the VPS API.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::scalars::{null_as_default, Count, Date};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServerFlavour {
  pub id: u64,
  pub name: String,
  pub cores: u32,
  pub ram_size: u64,
  pub storage_type: String,
  pub storage_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServerImage {
  pub id: u64,
  pub os_distro: String,
  pub os_version: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub release_date: Date,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub size: Count,
  #[serde(default, deserialize_with = "null_as_default")]
  pub virtual_size: Count,
  #[serde(rename = "minRAM", default, deserialize_with = "null_as_default")]
  pub min_ram: u64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub min_disk: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServer {
  pub id: u64,
  pub contract_id: u64,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ipv4: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ipv6: String,
  pub status: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub availability_zone: String,
  pub image: CloudServerImage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFlavourRequest {
  pub flavour_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeFlavourResponse {
  pub server_id: u64,
  pub flavour_id: u64,
  pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VmNetwork {
  pub network: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub fixed_ipv4: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub fixed_ipv6: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPlan {
  pub id: u64,
  pub name: String,
  pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
  pub id: u64,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub plans: Vec<ProductPlan>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServerOrder {
  pub product_id: u64,
  pub product_plan_id: u64,
  pub image_id: u64,
  pub password: String,
  pub availability_zone: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ssh_key: String,
  /// Sent as a string by the API
  #[serde(default, deserialize_with = "null_as_default")]
  pub storage_size: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub networks: Vec<VmNetwork>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudServerOrderResponse {
  pub id: u64,
  pub contract_id: u64,
  pub order_id: String,
}

/// Power and lifecycle actions on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ServerAction {
  SoftReboot,
  HardReboot,
  PowerOff,
  PowerOn,
  Reset,
}

impl ServerAction {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SoftReboot => "soft-reboot",
      Self::HardReboot => "hard-reboot",
      Self::PowerOff => "power-off",
      Self::PowerOn => "power-on",
      Self::Reset => "reset",
    }
  }
}

impl fmt::Display for ServerAction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerActionResponse {
  pub id: u64,
  pub message: String,
}

/// Body of the `reset` action: reinstall from an image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetCloudServerRequest {
  pub image_id: u64,
  pub name: String,
  pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPool {
  pub start: String,
  pub end: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
  pub id: String,
  pub name: String,
  pub ip_version: u8,
  pub cidr: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub allocation_pools: Vec<AllocationPool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VirtualNetwork {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedNetwork {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ipv4: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub ipv6: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachVirtualNetworkRequest {
  pub network_id: String,
  pub ipv4: String,
  pub ipv6: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachVirtualNetworkResponse {
  pub server_id: u64,
  pub network_id: String,
  pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachVirtualNetworkRequest {
  pub network_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetachVirtualNetworkResponse {
  pub server_id: u64,
  pub message: String,
}
