use anyhow::Result;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A running container and the networks it is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    pub name: String,
    /// Keyed by network name.
    pub attachments: BTreeMap<String, Attachment>,
}

/// One container interface inside one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub endpoint_id: String,
    pub ipv4_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub name: String,
    pub gateway: Option<String>,
    pub internal: bool,
    /// Keyed by container id.
    pub members: BTreeMap<String, Member>,
}

/// A container as seen from the network side.
///
/// Serializes with the daemon's field names so verbose output matches what
/// `docker network inspect` prints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "EndpointID")]
    pub endpoint_id: String,
    #[serde(rename = "IPv4Address")]
    pub ipv4_address: String,
    #[serde(rename = "IPv6Address")]
    pub ipv6_address: String,
}

/// Snapshot of everything the graph is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Topology {
    pub containers: Vec<Container>,
    /// Sorted by name, names unique.
    pub networks: Vec<Network>,
}

/// Read-only access to a container engine.
#[async_trait]
pub trait TopologySource: Send + Sync {
    async fn list_containers(&self) -> Result<Vec<Container>>;
    async fn list_networks(&self) -> Result<Vec<Network>>;
}

/// Queries `source` once for containers, then once for networks.
pub async fn collect<S>(source: &S) -> Result<Topology>
where
    S: TopologySource + ?Sized,
{
    let containers = source.list_containers().await?;
    info!("Found {} containers", containers.len());
    for container in &containers {
        debug!(
            "Container {} ({}) on {} networks",
            container.name,
            container.id,
            container.attachments.len()
        );
    }

    let networks = normalize_networks(source.list_networks().await?);
    info!("Found {} networks", networks.len());

    Ok(Topology {
        containers,
        networks,
    })
}

fn normalize_networks(mut networks: Vec<Network>) -> Vec<Network> {
    // Stable, so the first network the daemon reported keeps its name.
    networks.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = HashSet::new();
    networks.retain(|network| {
        let first = seen.insert(network.name.clone());
        if !first {
            warn!("Ignoring duplicate network name {}", network.name);
        }
        first
    });

    networks
}
