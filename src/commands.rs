//! Subcommands and their dispatch.

use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing::info;

use oh::api::models::{
  AttachVirtualNetworkRequest, CloudServer, CloudServerOrder, ResetCloudServerRequest,
  ServerAction,
};
use oh::api::ApiClient;
use oh::cache::{CacheLayer, FileStorage, DEFAULT_TTL};
use oh::config::Config;

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Store your API token in the configuration file
  ///
  /// The token is taken from the argument, or read from stdin when piped.
  Token { token: Option<String> },

  /// Commands to manipulate your virtual servers
  #[command(subcommand)]
  Vps(VpsCommand),
}

#[derive(Subcommand, Debug)]
pub enum VpsCommand {
  /// List all virtual servers
  List,
  /// Show a single virtual server
  Get { server_id: u64 },
  /// List server ids and names, served from the cache when fresh
  Ids {
    /// Only ids starting with this prefix
    prefix: Option<String>,
  },
  /// Run a power or lifecycle action on a server
  Action {
    server_id: u64,
    #[arg(value_enum)]
    action: ServerAction,
    /// Image to reinstall from (reset only)
    #[arg(long)]
    image_id: Option<u64>,
    /// New server name (reset only)
    #[arg(long)]
    name: Option<String>,
    /// New root password (reset only)
    #[arg(long)]
    password: Option<String>,
  },
  /// Order a new server from a JSON order file
  Order { file: PathBuf },
  /// List flavours a server can be changed to
  Flavours { server_id: u64 },
  /// Change the flavour of a server
  ChangeFlavour { server_id: u64, flavour_id: u64 },
  /// List orderable products and their plans
  Products,
  /// List available images
  Images,
  /// Show a single image
  Image { image_id: u64 },
  /// List networks attached to a server
  Networks { server_id: u64 },
  /// List virtual networks
  VirtualNetworks,
  /// Attach a virtual network to a server
  Attach {
    server_id: u64,
    network_id: String,
    #[arg(long, default_value = "")]
    ipv4: String,
    #[arg(long, default_value = "")]
    ipv6: String,
  },
  /// Detach a virtual network from a server
  Detach { server_id: u64, network_id: String },
}

/// Run a command against the given configuration.
pub async fn run(command: Command, config: Config) -> Result<()> {
  match command {
    Command::Token { token } => {
      let stdin = std::io::stdin();
      let piped = !stdin.is_terminal();
      let token = resolve_token(token, stdin.lock(), piped)?;

      let mut config = config;
      config.token = Some(token);
      let path = config.save()?;
      info!(path = %path.display(), "token stored");
      println!("Token stored in {}", path.display());
      Ok(())
    }
    Command::Vps(command) => {
      let cache = CacheLayer::new(FileStorage::open()?, config.no_cache);
      let api = ApiClient::new(config.api_settings(), cache);
      run_vps(&api, command).await
    }
  }
}

async fn run_vps(api: &ApiClient, command: VpsCommand) -> Result<()> {
  match command {
    VpsCommand::List => print_json(&api.list_cloud_servers().await?),
    VpsCommand::Get { server_id } => print_json(&api.get_virtual_server(server_id).await?),
    VpsCommand::Ids { prefix } => {
      let servers = api.cached_cloud_servers(DEFAULT_TTL).await?;
      for line in id_lines(&servers, prefix.as_deref().unwrap_or("")) {
        println!("{}", line);
      }
      Ok(())
    }
    VpsCommand::Action {
      server_id,
      action,
      image_id,
      name,
      password,
    } => {
      let reset = reset_request(action, image_id, name, password)?;
      let response = api
        .execute_server_action(server_id, action, reset.as_ref())
        .await?;
      print_json(&response)
    }
    VpsCommand::Order { file } => {
      let contents = std::fs::read_to_string(&file)
        .map_err(|e| eyre!("Failed to read order file {}: {}", file.display(), e))?;
      let order: CloudServerOrder = serde_json::from_str(&contents)
        .map_err(|e| eyre!("Failed to parse order file {}: {}", file.display(), e))?;
      print_json(&api.order_vps(&order).await?)
    }
    VpsCommand::Flavours { server_id } => print_json(&api.list_vps_flavours(server_id).await?),
    VpsCommand::ChangeFlavour {
      server_id,
      flavour_id,
    } => print_json(&api.change_vps_flavour(server_id, flavour_id).await?),
    VpsCommand::Products => print_json(&api.list_vps_products().await?),
    VpsCommand::Images => print_json(&api.list_vps_images().await?),
    VpsCommand::Image { image_id } => print_json(&api.get_vps_image(image_id).await?),
    VpsCommand::Networks { server_id } => {
      print_json(&api.list_attached_networks(server_id).await?)
    }
    VpsCommand::VirtualNetworks => print_json(&api.list_virtual_networks().await?),
    VpsCommand::Attach {
      server_id,
      network_id,
      ipv4,
      ipv6,
    } => {
      let request = AttachVirtualNetworkRequest {
        network_id,
        ipv4,
        ipv6,
      };
      print_json(&api.attach_virtual_network(server_id, &request).await?)
    }
    VpsCommand::Detach {
      server_id,
      network_id,
    } => print_json(&api.detach_virtual_network(server_id, &network_id).await?),
  }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
  let out =
    serde_json::to_string_pretty(value).map_err(|e| eyre!("Failed to format output: {}", e))?;
  println!("{}", out);
  Ok(())
}

/// Token from the argument, else from piped input.
fn resolve_token(arg: Option<String>, mut input: impl Read, piped: bool) -> Result<String> {
  let token = match arg {
    Some(token) => token.trim().to_string(),
    None if piped => {
      let mut buf = String::new();
      input
        .read_to_string(&mut buf)
        .map_err(|e| eyre!("Failed to read token from stdin: {}", e))?;
      buf.trim().to_string()
    }
    None => String::new(),
  };

  if token.is_empty() {
    return Err(eyre!("No token supplied. Pass it as an argument or pipe it on stdin."));
  }
  Ok(token)
}

/// `<id>\t<name>` for every server whose id starts with `prefix`.
fn id_lines(servers: &[CloudServer], prefix: &str) -> Vec<String> {
  servers
    .iter()
    .map(|s| (s.id.to_string(), &s.name))
    .filter(|(id, _)| id.starts_with(prefix))
    .map(|(id, name)| format!("{}\t{}", id, name))
    .collect()
}

fn reset_request(
  action: ServerAction,
  image_id: Option<u64>,
  name: Option<String>,
  password: Option<String>,
) -> Result<Option<ResetCloudServerRequest>> {
  if action != ServerAction::Reset {
    return Ok(None);
  }

  match (image_id, name, password) {
    (Some(image_id), Some(name), Some(password)) => Ok(Some(ResetCloudServerRequest {
      image_id,
      name,
      password,
    })),
    _ => Err(eyre!("reset requires --image-id, --name and --password")),
  }
}
