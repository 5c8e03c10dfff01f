use crate::error::GraphError;
use crate::topology::{Attachment, Container, Member, Network, TopologySource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use bollard::Docker;
use bollard::container::ListContainersOptions;
use bollard::models::{ContainerSummary, Network as DockerNetwork, NetworkContainer};
use bollard::network::{InspectNetworkOptions, ListNetworksOptions};
use log::debug;
use std::collections::BTreeMap;
use strip_prefix_suffix_sane::StripPrefixSuffixSane;

pub const DEFAULT_DOCKER_HOST: &str = "unix:///var/run/docker.sock";

#[derive(Debug, Clone)]
pub struct DockerClientConfig {
    /// `unix://` URI, bare socket path, or `tcp://`/`http://` address.
    pub host: String,
    pub timeout_seconds: u64,
}

impl Default for DockerClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DOCKER_HOST.to_string(),
            timeout_seconds: 120,
        }
    }
}

pub struct DockerClient {
    client: Docker,
}

impl DockerClient {
    /// Creates a new Docker client with the specified configuration
    ///
    /// A missing socket fails here; a daemon that does not answer fails on
    /// the first query.
    pub fn new(config: DockerClientConfig) -> Result<Self> {
        let DockerClientConfig {
            host,
            timeout_seconds,
        } = config;

        let connected = if host.starts_with("tcp://") || host.starts_with("http://") {
            Docker::connect_with_http(&host, timeout_seconds, bollard::API_DEFAULT_VERSION)
        } else {
            Docker::connect_with_socket(&host, timeout_seconds, bollard::API_DEFAULT_VERSION)
        };

        let client = connected.map_err(|source| GraphError::Connect { host, source })?;

        Ok(Self { client })
    }
}

#[async_trait]
impl TopologySource for DockerClient {
    async fn list_containers(&self) -> Result<Vec<Container>> {
        let containers = self
            .client
            .list_containers(None::<ListContainersOptions<String>>)
            .await
            .context("Failed to list containers")?;

        containers.into_iter().map(to_container).collect()
    }

    async fn list_networks(&self) -> Result<Vec<Network>> {
        let networks = self
            .client
            .list_networks(None::<ListNetworksOptions<String>>)
            .await
            .context("Failed to list networks")?;

        let mut result = Vec::with_capacity(networks.len());

        // The list endpoint leaves `Containers` empty on current API versions.
        for listed in networks {
            let id = listed.id.ok_or(GraphError::MissingField {
                object: "network",
                field: "Id",
            })?;

            let detail = self
                .client
                .inspect_network(&id, None::<InspectNetworkOptions<String>>)
                .await
                .with_context(|| format!("Failed to inspect network {id}"))?;

            debug!("Inspected network {id}");
            result.push(to_network(detail)?);
        }

        Ok(result)
    }
}

fn required<T>(value: Option<T>, object: &'static str, field: &'static str) -> Result<T> {
    value.ok_or_else(|| GraphError::MissingField { object, field }.into())
}

fn to_container(summary: ContainerSummary) -> Result<Container> {
    let id = required(summary.id, "container", "Id")?;

    let name = required(
        summary.names.as_ref().and_then(|names| names.first()),
        "container",
        "Names",
    )?
    .strip_prefix_sane("/")
    .to_owned();

    let networks = required(
        summary.network_settings.and_then(|settings| settings.networks),
        "container",
        "NetworkSettings.Networks",
    )?;

    let mut attachments = BTreeMap::new();
    for (network_name, endpoint) in networks {
        let endpoint_id = required(endpoint.endpoint_id, "endpoint", "EndpointID")?;
        attachments.insert(
            network_name,
            Attachment {
                endpoint_id,
                ipv4_address: endpoint.ip_address.unwrap_or_default(),
            },
        );
    }

    Ok(Container {
        id,
        name,
        attachments,
    })
}

fn to_network(network: DockerNetwork) -> Result<Network> {
    let name = required(network.name, "network", "Name")?;

    let gateway = network
        .ipam
        .and_then(|ipam| ipam.config)
        .and_then(|configs| configs.into_iter().next())
        .and_then(|config| config.gateway)
        .filter(|gateway| !gateway.is_empty());

    let mut members = BTreeMap::new();
    for (container_id, container) in network.containers.unwrap_or_default() {
        members.insert(container_id, to_member(container)?);
    }

    Ok(Network {
        name,
        gateway,
        internal: network.internal.unwrap_or(false),
        members,
    })
}

fn to_member(container: NetworkContainer) -> Result<Member> {
    Ok(Member {
        name: required(container.name, "network member", "Name")?,
        endpoint_id: required(container.endpoint_id, "network member", "EndpointID")?,
        ipv4_address: container.ipv4_address.unwrap_or_default(),
        ipv6_address: container.ipv6_address.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerSummaryNetworkSettings, EndpointSettings, Ipam, IpamConfig};
    use std::collections::HashMap;

    fn summary() -> ContainerSummary {
        let endpoint = EndpointSettings {
            endpoint_id: Some("ep1".to_string()),
            ip_address: Some("172.18.0.2".to_string()),
            ..Default::default()
        };

        ContainerSummary {
            id: Some("abc123".to_string()),
            names: Some(vec!["/web".to_string(), "/alias".to_string()]),
            network_settings: Some(ContainerSummaryNetworkSettings {
                networks: Some(HashMap::from([("app_net".to_string(), endpoint)])),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn docker_network(ipam: Option<Ipam>, internal: Option<bool>) -> DockerNetwork {
        DockerNetwork {
            name: Some("app_net".to_string()),
            id: Some("n1".to_string()),
            ipam,
            internal,
            containers: Some(HashMap::from([(
                "abc123".to_string(),
                NetworkContainer {
                    name: Some("web".to_string()),
                    endpoint_id: Some("ep1".to_string()),
                    ipv4_address: Some("172.18.0.2/16".to_string()),
                    ipv6_address: Some(String::new()),
                    ..Default::default()
                },
            )])),
            ..Default::default()
        }
    }

    fn ipam_with_gateway(gateway: &str) -> Ipam {
        Ipam {
            config: Some(vec![IpamConfig {
                subnet: Some("172.18.0.0/16".to_string()),
                gateway: Some(gateway.to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }
    }

    #[test]
    fn default_config_targets_local_socket() {
        let config = DockerClientConfig::default();

        assert_eq!(config.host, "unix:///var/run/docker.sock");
        assert_eq!(config.timeout_seconds, 120);
    }

    #[tokio::test]
    async fn unreachable_daemon_fails_the_query() {
        let client = DockerClient::new(DockerClientConfig {
            host: "tcp://127.0.0.1:1".to_string(),
            ..Default::default()
        })
        .unwrap();

        let err = client.list_containers().await.unwrap_err();

        assert_eq!(err.to_string(), "Failed to list containers");
    }

    #[test]
    fn converts_container_summary() {
        let container = to_container(summary()).unwrap();

        assert_eq!(container.id, "abc123");
        assert_eq!(container.name, "web");
        assert_eq!(
            container.attachments["app_net"],
            Attachment {
                endpoint_id: "ep1".to_string(),
                ipv4_address: "172.18.0.2".to_string(),
            }
        );
    }

    #[test]
    fn rejects_container_without_names() {
        let mut summary = summary();
        summary.names = Some(vec![]);

        let err = to_container(summary).unwrap_err();

        assert!(err.to_string().contains("Names"), "{err}");
    }

    #[test]
    fn reads_gateway_from_first_ipam_block() {
        let network = to_network(docker_network(Some(ipam_with_gateway("172.18.0.1")), Some(false)))
            .unwrap();

        assert_eq!(network.gateway.as_deref(), Some("172.18.0.1"));
        assert!(!network.internal);
        assert_eq!(network.members["abc123"].endpoint_id, "ep1");
    }

    #[test]
    fn empty_ipam_config_means_no_gateway() {
        let ipam = Ipam {
            config: Some(vec![]),
            ..Default::default()
        };

        let network = to_network(docker_network(Some(ipam), Some(true))).unwrap();

        assert_eq!(network.gateway, None);
        assert!(network.internal);
    }

    #[test]
    fn absent_internal_flag_means_not_internal() {
        let network = to_network(docker_network(None, None)).unwrap();

        assert!(!network.internal);
        assert_eq!(network.gateway, None);
    }

    #[test]
    fn rejects_member_without_endpoint() {
        let mut network = docker_network(None, None);
        if let Some(containers) = network.containers.as_mut() {
            for member in containers.values_mut() {
                member.endpoint_id = None;
            }
        }

        let err = to_network(network).unwrap_err();

        assert!(err.to_string().contains("EndpointID"), "{err}");
    }

    #[test]
    fn absent_containers_map_means_no_members() {
        let mut network = docker_network(Some(ipam_with_gateway("")), None);
        network.containers = None;

        let network = to_network(network).unwrap();

        assert!(network.members.is_empty());
        assert_eq!(network.gateway, None);
    }

    #[test]
    fn missing_addresses_become_empty_strings() {
        let mut network = docker_network(None, None);
        if let Some(containers) = network.containers.as_mut() {
            for member in containers.values_mut() {
                member.ipv4_address = None;
                member.ipv6_address = None;
            }
        }

        let network = to_network(network).unwrap();

        let member = &network.members["abc123"];
        assert_eq!(member.ipv4_address, "");
        assert_eq!(member.ipv6_address, "");
    }

    #[test]
    fn missing_container_ip_becomes_empty_string() {
        let mut summary = summary();
        if let Some(networks) = summary
            .network_settings
            .as_mut()
            .and_then(|settings| settings.networks.as_mut())
        {
            for endpoint in networks.values_mut() {
                endpoint.ip_address = None;
            }
        }

        let container = to_container(summary).unwrap();

        assert_eq!(container.attachments["app_net"].ipv4_address, "");
        assert_eq!(container.attachments["app_net"].endpoint_id, "ep1");
    }
}
